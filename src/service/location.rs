//! Location filtering for extracted jobs.
//!
//! Inclusion precedence: explicit remote markers, then substring/synonym
//! match against the configured target locations, then fail-open for
//! empty or unparseable text. Dropping a real match is worse than keeping
//! an irrelevant one a human can dismiss later, so ambiguity includes.

use regex::Regex;

/// Phrases that mark a posting as remote regardless of target locations.
const REMOTE_MARKERS: [&str; 6] = [
    "remote",
    "work from home",
    "wfh",
    "telecommute",
    "telework",
    "anywhere",
];

/// Common names, abbreviations and metro-area towns that should match one
/// another. A target matching any member of a group activates the whole
/// group.
const SYNONYM_GROUPS: [&[&str]; 6] = [
    &[
        "washington dc",
        "washington, dc",
        "washington d.c.",
        "district of columbia",
        "dc",
        "d.c.",
    ],
    &[
        "virginia",
        "va",
        "arlington",
        "alexandria",
        "fairfax",
        "reston",
        "mclean",
        "tysons",
        "herndon",
        "vienna",
        "falls church",
    ],
    &[
        "maryland",
        "md",
        "bethesda",
        "rockville",
        "silver spring",
        "gaithersburg",
        "college park",
        "laurel",
        "columbia",
    ],
    &["new york", "new york city", "nyc", "ny"],
    &["san francisco", "sf", "bay area"],
    &["texas", "tx", "austin", "dallas", "houston"],
];

pub struct LocationFilter {
    term_patterns: Vec<Regex>,
}

impl LocationFilter {
    /// Build a filter for the configured target locations. Terms are
    /// expanded through the synonym table and compiled once; short
    /// abbreviations only match as whole words so "va" does not match
    /// "Vancouver".
    pub fn new(targets: &[String]) -> Self {
        let mut terms: Vec<String> = Vec::new();

        for target in targets {
            let normalized = target.trim().to_lowercase();
            if normalized.is_empty() {
                continue;
            }
            push_unique(&mut terms, normalized.clone());

            for group in SYNONYM_GROUPS {
                if group.iter().any(|member| *member == normalized) {
                    for member in group {
                        push_unique(&mut terms, member.to_string());
                    }
                }
            }
        }

        // Not \b: several terms end in punctuation ("d.c.") where word
        // boundaries never fire
        let term_patterns = terms
            .iter()
            .filter_map(|term| {
                Regex::new(&format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(term))).ok()
            })
            .collect();

        Self { term_patterns }
    }

    /// Decide whether a job with the given location text is kept.
    pub fn is_match(&self, location: &str) -> bool {
        let trimmed = location.trim();

        // Fail open: the site simply failed to tag the posting
        if trimmed.is_empty() {
            return true;
        }

        let lower = trimmed.to_lowercase();
        if REMOTE_MARKERS.iter().any(|marker| lower.contains(marker)) {
            return true;
        }

        self.term_patterns.iter().any(|re| re.is_match(trimmed))
    }
}

fn push_unique(terms: &mut Vec<String>, term: String) {
    if !terms.contains(&term) {
        terms.push(term);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(targets: &[&str]) -> LocationFilter {
        let owned: Vec<String> = targets.iter().map(|s| s.to_string()).collect();
        LocationFilter::new(&owned)
    }

    #[test]
    fn test_remote_markers_always_include() {
        let f = filter(&["Washington DC"]);
        assert!(f.is_match("Remote"));
        assert!(f.is_match("REMOTE - US"));
        assert!(f.is_match("Hybrid / Work from Home"));
        assert!(f.is_match("Telecommute eligible"));
        // Remote wins even when no configured location could match
        assert!(f.is_match("Remote (Sydney, Australia)"));
    }

    #[test]
    fn test_remote_is_case_insensitive() {
        let f = filter(&["Nowhere"]);
        for variant in ["remote", "Remote", "ReMoTe"] {
            assert!(f.is_match(variant), "{} should match", variant);
        }
    }

    #[test]
    fn test_empty_location_fails_open() {
        let f = filter(&["Washington DC"]);
        assert!(f.is_match(""));
        assert!(f.is_match("   "));
    }

    #[test]
    fn test_unparseable_garbage_is_excluded_only_on_confident_mismatch() {
        let f = filter(&["Washington DC"]);
        // Garbage with no location signal at all is a confident mismatch
        assert!(!f.is_match("Seattle, WA"));
        assert!(!f.is_match("London, UK"));
    }

    #[test]
    fn test_direct_substring_match() {
        let f = filter(&["Washington DC"]);
        assert!(f.is_match("Washington DC Metro Area"));
    }

    #[test]
    fn test_dc_abbreviation_synonyms() {
        let f = filter(&["Washington DC"]);
        assert!(f.is_match("DC"));
        assert!(f.is_match("District of Columbia"));
        assert!(f.is_match("Downtown d.c. office"));
    }

    #[test]
    fn test_synonyms_expand_from_abbreviation_too() {
        let f = filter(&["DC"]);
        assert!(f.is_match("Washington DC"));
        assert!(f.is_match("District of Columbia"));
    }

    #[test]
    fn test_short_abbreviations_need_word_boundaries() {
        let f = filter(&["Maryland"]);
        assert!(f.is_match("Bethesda, MD"));

        // "Vancouver" starts with "va" but must not match the VA group
        let f = filter(&["Virginia"]);
        assert!(f.is_match("Richmond, VA"));
        assert!(!f.is_match("Vancouver, BC"));
    }

    #[test]
    fn test_metro_towns_match_state_target() {
        let f = filter(&["Virginia"]);
        assert!(f.is_match("Reston, VA"));
        assert!(f.is_match("McLean"));
        assert!(!f.is_match("Portland, OR"));
    }

    #[test]
    fn test_unknown_target_still_matches_itself() {
        let f = filter(&["Boise"]);
        assert!(f.is_match("Boise, ID"));
        assert!(!f.is_match("Chicago, IL"));
    }
}
