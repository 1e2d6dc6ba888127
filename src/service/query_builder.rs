//! Builds the lazy sequence of search queries from the configuration.
//!
//! Ordering is deterministic (keywords outer, locations inner) so repeated
//! runs are reproducible and a cancelled run can be resumed by position.
//! No network or I/O here.

use url::Url;

use crate::config::SearchConfig;

/// One search request: a (keyword, location) pair plus the restriction
/// fragments it was built with.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub keyword: String,
    pub location: String,
    pub site_filter: Option<String>,
    pub date_filter: Option<&'static str>,
    pub experience_levels: Vec<String>,
    pub min_salary: Option<i64>,
    pub max_results: usize,
}

impl SearchQuery {
    /// Short human-readable form for progress reporting and logs.
    pub fn label(&self) -> String {
        format!("{} / {}", self.keyword, self.location)
    }

    /// The full query string sent to the search engine.
    pub fn search_terms(&self) -> String {
        let mut terms = format!("\"{}\" jobs \"{}\"", self.keyword, self.location);

        if !self.experience_levels.is_empty() {
            let levels = self
                .experience_levels
                .iter()
                .map(|l| format!("\"{}\"", l))
                .collect::<Vec<_>>()
                .join(" OR ");
            terms.push_str(&format!(" ({})", levels));
        }

        if let Some(min) = self.min_salary {
            terms.push_str(&format!(" \"${}\"", min));
        }

        if let Some(sites) = &self.site_filter {
            terms.push(' ');
            terms.push_str(sites);
        }

        terms
    }

    /// Target Google search URL (fetched through the scraping proxy).
    pub fn google_url(&self) -> String {
        let num = self.max_results.min(100).to_string();
        let mut params = vec![("q", self.search_terms()), ("num", num)];
        if let Some(tbs) = self.date_filter {
            params.push(("tbs", tbs.to_string()));
        }

        // Base URL is static, parse cannot fail
        Url::parse_with_params("https://www.google.com/search", params)
            .expect("static base URL")
            .to_string()
    }
}

/// Produce one query per (keyword, location) combination. Blank entries
/// are skipped rather than generating empty searches.
pub fn build_queries(config: &SearchConfig) -> impl Iterator<Item = SearchQuery> + '_ {
    let site_filter = site_filter_fragment(&config.included_sites);
    let date_filter = config.date_range.tbs_code();

    config
        .keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .flat_map(move |keyword| {
            let site_filter = site_filter.clone();
            config
                .locations
                .iter()
                .filter(|l| !l.trim().is_empty())
                .map(move |location| SearchQuery {
                    keyword: keyword.trim().to_string(),
                    location: location.trim().to_string(),
                    site_filter: site_filter.clone(),
                    date_filter,
                    experience_levels: config.experience_levels.clone(),
                    min_salary: config.min_salary,
                    max_results: config.results_per_search,
                })
        })
}

fn site_filter_fragment(included_sites: &[String]) -> Option<String> {
    let sites: Vec<String> = included_sites
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| format!("site:{}", s.trim()))
        .collect();

    match sites.len() {
        0 => None,
        1 => Some(sites.into_iter().next().unwrap()),
        _ => Some(format!("({})", sites.join(" OR "))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DateRange;

    fn config() -> SearchConfig {
        SearchConfig {
            keywords: vec!["data engineer".into(), "cloud architect".into()],
            locations: vec!["Washington DC".into(), "Remote".into()],
            date_range: DateRange::PastWeek,
            included_sites: vec!["jobs.example.com".into(), "careers.other.com".into()],
            min_salary: Some(150000),
            max_salary: None,
            experience_levels: vec!["senior".into()],
            results_per_search: 20,
        }
    }

    #[test]
    fn test_one_query_per_keyword_location_pair() {
        let queries: Vec<_> = build_queries(&config()).collect();
        assert_eq!(queries.len(), 4);
    }

    #[test]
    fn test_ordering_is_keywords_outer_locations_inner() {
        let queries: Vec<_> = build_queries(&config()).collect();
        let labels: Vec<_> = queries.iter().map(|q| q.label()).collect();
        assert_eq!(
            labels,
            vec![
                "data engineer / Washington DC",
                "data engineer / Remote",
                "cloud architect / Washington DC",
                "cloud architect / Remote",
            ]
        );
    }

    #[test]
    fn test_ordering_is_deterministic_across_runs() {
        let first: Vec<_> = build_queries(&config()).map(|q| q.google_url()).collect();
        let second: Vec<_> = build_queries(&config()).map(|q| q.google_url()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_blank_entries_are_skipped() {
        let mut cfg = config();
        cfg.keywords.push("   ".into());
        cfg.locations.push(String::new());
        let queries: Vec<_> = build_queries(&cfg).collect();
        assert_eq!(queries.len(), 4);
    }

    #[test]
    fn test_search_terms_carry_all_fragments() {
        let query = build_queries(&config()).next().unwrap();
        let terms = query.search_terms();
        assert!(terms.contains("\"data engineer\""));
        assert!(terms.contains("\"Washington DC\""));
        assert!(terms.contains("\"senior\""));
        assert!(terms.contains("\"$150000\""));
        assert!(terms.contains("site:jobs.example.com OR site:careers.other.com"));
    }

    #[test]
    fn test_google_url_includes_date_restriction_and_cap() {
        let query = build_queries(&config()).next().unwrap();
        let url = query.google_url();
        assert!(url.starts_with("https://www.google.com/search?"));
        assert!(url.contains("tbs=qdr%3Aw") || url.contains("tbs=qdr:w"));
        assert!(url.contains("num=20"));
    }

    #[test]
    fn test_no_site_filter_when_unrestricted() {
        let mut cfg = config();
        cfg.included_sites.clear();
        let query = build_queries(&cfg).next().unwrap();
        assert!(!query.search_terms().contains("site:"));
    }
}
