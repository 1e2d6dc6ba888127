//! Search result page parsing.
//!
//! Turns a raw Google result payload into candidate job links. Tolerant by
//! design: anchors without an extractable absolute URL are dropped, never
//! propagated as errors, and obvious non-job links (engine navigation,
//! domains outside the configured site restriction) are filtered out.

use std::collections::HashSet;
use std::sync::OnceLock;

use scraper::{Html, Selector};
use url::Url;

/// A candidate search hit: a link plus whatever text surrounded it.
#[derive(Debug, Clone)]
pub struct ResultEntry {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// Hosts that belong to the search engine itself, not to results.
const ENGINE_HOSTS: [&str; 6] = [
    "google.com",
    "googleusercontent.com",
    "gstatic.com",
    "googleapis.com",
    "youtube.com",
    "blogger.com",
];

pub fn parse_results(html: &str, included_sites: &[String]) -> Vec<ResultEntry> {
    static ANCHOR: OnceLock<Selector> = OnceLock::new();
    static HEADING: OnceLock<Selector> = OnceLock::new();
    let anchor = ANCHOR.get_or_init(|| Selector::parse("a[href]").unwrap());
    let heading = HEADING.get_or_init(|| Selector::parse("h3").unwrap());

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for element in document.select(anchor) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let Some(url) = resolve_result_url(href) else {
            continue;
        };

        if !is_candidate(&url, included_sites) {
            continue;
        }

        if !seen.insert(url.to_string()) {
            continue;
        }

        // Organic results carry their title in an h3 inside the anchor;
        // fall back to the anchor text
        let title = element
            .select(heading)
            .next()
            .map(|h| collapse_whitespace(&h.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| collapse_whitespace(&element.text().collect::<String>()));

        entries.push(ResultEntry {
            url: url.to_string(),
            title,
            snippet: String::new(),
        });
    }

    entries
}

/// Resolve an anchor href into an absolute result URL. Google wraps
/// organic links as `/url?q=<target>`; direct absolute links pass through.
fn resolve_result_url(href: &str) -> Option<Url> {
    let href = href.trim();

    if href.starts_with("/url?") {
        let wrapped = Url::parse(&format!("https://www.google.com{}", href)).ok()?;
        let target = wrapped
            .query_pairs()
            .find(|(k, _)| k == "q" || k == "url")
            .map(|(_, v)| v.into_owned())?;
        return Url::parse(&target).ok();
    }

    if href.starts_with("http://") || href.starts_with("https://") {
        return Url::parse(href).ok();
    }

    None
}

fn is_candidate(url: &Url, included_sites: &[String]) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };

    if ENGINE_HOSTS
        .iter()
        .any(|engine| host == *engine || host.ends_with(&format!(".{}", engine)))
    {
        return false;
    }

    if !included_sites.is_empty() {
        return included_sites.iter().any(|site| {
            let site = site.trim();
            !site.is_empty() && (host == site || host.ends_with(&format!(".{}", site)))
        });
    }

    true
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERP: &str = r#"
        <html><body>
            <a href="/url?q=https://jobs.example.com/posting/42&sa=U">
                <h3>Data Engineer - Example Corp</h3>
            </a>
            <a href="https://careers.other.com/role/7"><h3>Cloud Architect</h3></a>
            <a href="https://www.google.com/search?q=next+page">Next</a>
            <a href="https://accounts.google.com/signin">Sign in</a>
            <a href="#top">Back to top</a>
            <a href="/preferences">Settings</a>
            <a href="https://careers.other.com/role/7"><h3>Cloud Architect (dup)</h3></a>
        </body></html>
    "#;

    #[test]
    fn test_extracts_organic_results_and_unwraps_redirects() {
        let entries = parse_results(SERP, &[]);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "https://jobs.example.com/posting/42");
        assert_eq!(entries[0].title, "Data Engineer - Example Corp");
        assert_eq!(entries[1].url, "https://careers.other.com/role/7");
    }

    #[test]
    fn test_engine_navigation_links_are_filtered() {
        let entries = parse_results(SERP, &[]);
        assert!(entries.iter().all(|e| !e.url.contains("google.com")));
    }

    #[test]
    fn test_duplicate_urls_collapse() {
        let entries = parse_results(SERP, &[]);
        let urls: Vec<_> = entries.iter().map(|e| e.url.as_str()).collect();
        let mut deduped = urls.clone();
        deduped.dedup();
        assert_eq!(urls, deduped);
    }

    #[test]
    fn test_site_restriction_filters_other_domains() {
        let entries = parse_results(SERP, &["jobs.example.com".to_string()]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "https://jobs.example.com/posting/42");
    }

    #[test]
    fn test_site_restriction_allows_subdomains() {
        let entries = parse_results(SERP, &["example.com".to_string()]);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].url.starts_with("https://jobs.example.com/"));
    }

    #[test]
    fn test_malformed_markup_yields_no_errors() {
        let entries = parse_results("<a href='", &[]);
        assert!(entries.is_empty());

        let entries = parse_results("<html><a>no href</a><a href=\"%%bad%%\">x</a>", &[]);
        assert!(entries.is_empty());
    }

    #[test]
    fn test_anchor_without_heading_uses_anchor_text() {
        let html = r#"<a href="https://jobs.example.com/p/1">Plain link title</a>"#;
        let entries = parse_results(html, &[]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Plain link title");
    }
}
