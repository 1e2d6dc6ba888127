//! Structured field extraction from job detail pages.
//!
//! Extraction is an ordered chain of strategies, merged first-non-empty
//! wins: structured metadata (JSON-LD JobPosting) first, then CSS selector
//! heuristics, then textual pattern fallbacks, finally the search result
//! entry itself. Missing optional fields stay empty; a record is discarded
//! only when both title and company are unrecoverable, since it is useless
//! for matching or deduplication without them.

use chrono::Utc;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;
use url::Url;

use crate::domain::models::NewJob;
use crate::service::serp::ResultEntry;

/// Longest description kept; job boards routinely pad postings with
/// thousands of words of boilerplate.
const MAX_DESCRIPTION_CHARS: usize = 5000;

#[derive(Debug, Clone)]
pub struct ExtractedJob {
    pub url: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub posted_date: Option<String>,
}

impl ExtractedJob {
    pub fn into_new_job(self) -> NewJob {
        NewJob {
            url: self.url,
            company: self.company,
            title: self.title,
            location: self.location,
            description: self.description,
            posted_date: self.posted_date,
            scraped_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
struct FieldCandidates {
    title: Option<String>,
    company: Option<String>,
    location: Option<String>,
    description: Option<String>,
    posted_date: Option<String>,
}

impl FieldCandidates {
    /// Earlier strategies win; `other` only fills holes.
    fn merge(mut self, other: FieldCandidates) -> Self {
        self.title = self.title.or(other.title);
        self.company = self.company.or(other.company);
        self.location = self.location.or(other.location);
        self.description = self.description.or(other.description);
        self.posted_date = self.posted_date.or(other.posted_date);
        self
    }
}

/// Extract structured fields from a fetched job page.
pub fn extract_job(entry: &ResultEntry, html: &str) -> Option<ExtractedJob> {
    let document = Html::parse_document(html);

    let fields = from_json_ld(&document)
        .merge(from_selectors(&document))
        .merge(from_text_patterns(&page_text(&document)))
        .merge(from_entry(entry));

    let title = fields.title?;
    let company = fields.company?;

    Some(ExtractedJob {
        url: entry.url.clone(),
        title,
        company,
        location: fields.location.unwrap_or_default(),
        description: fields
            .description
            .map(|d| truncate_chars(&d, MAX_DESCRIPTION_CHARS))
            .unwrap_or_default(),
        posted_date: fields.posted_date,
    })
}

// ====== Strategy 1: JSON-LD JobPosting metadata ======

fn from_json_ld(document: &Html) -> FieldCandidates {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector =
        SELECTOR.get_or_init(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

    for script in document.select(selector) {
        let raw = script.text().collect::<String>();
        let Ok(value) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        if let Some(posting) = find_job_posting(&value) {
            return candidates_from_posting(posting);
        }
    }

    FieldCandidates::default()
}

fn find_job_posting(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_job_posting),
        Value::Object(map) => {
            let is_posting = match map.get("@type") {
                Some(Value::String(t)) => t == "JobPosting",
                Some(Value::Array(types)) => {
                    types.iter().any(|t| t.as_str() == Some("JobPosting"))
                }
                _ => false,
            };
            if is_posting {
                Some(value)
            } else {
                map.get("@graph").and_then(find_job_posting)
            }
        }
        _ => None,
    }
}

fn candidates_from_posting(posting: &Value) -> FieldCandidates {
    let title = posting["title"].as_str().and_then(clean_field);

    let company = posting["hiringOrganization"]["name"]
        .as_str()
        .or_else(|| posting["hiringOrganization"].as_str())
        .and_then(clean_field);

    let location = json_ld_location(&posting["jobLocation"]);

    let description = posting["description"]
        .as_str()
        .map(strip_html)
        .filter(|d| !d.is_empty());

    let posted_date = posting["datePosted"].as_str().and_then(clean_field);

    FieldCandidates {
        title,
        company,
        location,
        description,
        posted_date,
    }
}

/// jobLocation may be a string, a Place object, or an array of either.
fn json_ld_location(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => clean_field(s),
        Value::Array(items) => items.iter().find_map(json_ld_location),
        Value::Object(_) => {
            let address = &value["address"];
            if let Some(s) = address.as_str() {
                return clean_field(s);
            }
            let parts: Vec<&str> = ["addressLocality", "addressRegion", "addressCountry"]
                .iter()
                .filter_map(|k| address[k].as_str())
                .filter(|s| !s.trim().is_empty())
                .collect();
            if parts.is_empty() {
                value["name"].as_str().and_then(clean_field)
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    }
}

// ====== Strategy 2: CSS selector heuristics ======

const TITLE_SELECTORS: [&str; 4] = ["h1", ".job-title", ".position-title", "[class*='title']"];
const COMPANY_SELECTORS: [&str; 4] = [
    "[itemprop='hiringOrganization']",
    ".company-name",
    "[class*='company']",
    "[data-company]",
];
const LOCATION_SELECTORS: [&str; 3] = [".location", "[class*='location']", "[class*='Location']"];
const DESCRIPTION_SELECTORS: [&str; 5] = [
    ".job-description",
    ".description",
    "[class*='description']",
    "article",
    "main",
];

fn from_selectors(document: &Html) -> FieldCandidates {
    let description = DESCRIPTION_SELECTORS.iter().find_map(|s| {
        // A real description has some substance to it
        first_text(document, s).filter(|t| t.len() > 50)
    });

    let company = COMPANY_SELECTORS
        .iter()
        .find_map(|s| first_text(document, s))
        .or_else(|| meta_content(document, "meta[property='og:site_name']"));

    FieldCandidates {
        title: TITLE_SELECTORS.iter().find_map(|s| first_text(document, s)),
        company,
        location: LOCATION_SELECTORS
            .iter()
            .find_map(|s| first_text(document, s)),
        description,
        posted_date: None,
    }
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    Selector::parse(selector).ok().and_then(|sel| {
        document
            .select(&sel)
            .next()
            .map(|el| el.text().collect::<Vec<_>>().join(" "))
            .as_deref()
            .and_then(clean_field)
    })
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    Selector::parse(selector).ok().and_then(|sel| {
        document
            .select(&sel)
            .next()
            .and_then(|el| el.value().attr("content"))
            .and_then(clean_field)
    })
}

// ====== Strategy 3: textual pattern fallbacks ======

fn from_text_patterns(text: &str) -> FieldCandidates {
    static COMPANY_RE: OnceLock<Regex> = OnceLock::new();
    static LOCATION_RE: OnceLock<Regex> = OnceLock::new();
    static POSTED_RE: OnceLock<Regex> = OnceLock::new();

    let company_re = COMPANY_RE
        .get_or_init(|| Regex::new(r"(?i)\bcompany:?\s*\n?\s*([^\n]{2,80})").unwrap());
    let location_re = LOCATION_RE
        .get_or_init(|| Regex::new(r"(?i)\blocation:?\s*\n?\s*([^\n]{2,80})").unwrap());
    let posted_re = POSTED_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\bposted(?:\s+on)?:?\s*((?:[A-Za-z]+\s+\d{1,2},?\s+\d{4})|(?:\d{1,2}[/-]\d{1,2}[/-]\d{2,4})|(?:\d+\+?\s+days?\s+ago))",
        )
        .unwrap()
    });

    let capture = |re: &Regex| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| clean_field(m.as_str()))
    };

    FieldCandidates {
        title: None,
        company: capture(company_re),
        location: capture(location_re),
        description: None,
        posted_date: capture(posted_re),
    }
}

// ====== Strategy 4: search result entry fallbacks ======

fn from_entry(entry: &ResultEntry) -> FieldCandidates {
    static AT_SPLIT: OnceLock<Regex> = OnceLock::new();
    let at_split =
        AT_SPLIT.get_or_init(|| Regex::new(r"(?i)^(.{3,}?)\s+(?:at|@)\s+(.{2,}?)$").unwrap());

    // SERP titles often read "Role at Company - board.com"; keep only the
    // part before the board suffix
    let raw_title = entry
        .title
        .split(" | ")
        .next()
        .unwrap_or(&entry.title)
        .to_string();

    let (title, company) = match at_split.captures(raw_title.trim()) {
        Some(caps) => (
            clean_field(caps.get(1).map_or("", |m| m.as_str())),
            clean_field(caps.get(2).map_or("", |m| m.as_str())),
        ),
        None => (clean_field(&raw_title), None),
    };

    FieldCandidates {
        title,
        company: company.or_else(|| company_from_host(&entry.url)),
        location: None,
        description: clean_field(&entry.snippet),
        posted_date: None,
    }
}

/// Last resort for company: the posting host, minus the usual career-site
/// prefixes ("jobs.acme.com" -> "Acme").
fn company_from_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;

    let stripped = ["www.", "jobs.", "careers.", "apply.", "boards."]
        .iter()
        .fold(host, |h, prefix| h.strip_prefix(prefix).unwrap_or(h));

    let label = stripped.split('.').next()?;
    if label.len() < 2 {
        return None;
    }

    let mut chars = label.chars();
    let capitalized = chars
        .next()
        .map(|c| c.to_uppercase().collect::<String>() + chars.as_str())?;
    Some(capitalized)
}

// ====== Shared helpers ======

/// Collapse whitespace and reject junk values (empty, or so long it is
/// clearly not a field).
fn clean_field(raw: &str) -> Option<String> {
    let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.len() < 2 || cleaned.len() > 200 {
        None
    } else {
        Some(cleaned)
    }
}

fn strip_html(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    fragment
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Visible page text with text nodes separated so label/value pairs stay
/// recognizable for the pattern fallbacks.
fn page_text(document: &Html) -> String {
    static BODY: OnceLock<Selector> = OnceLock::new();
    let body = BODY.get_or_init(|| Selector::parse("body").unwrap());
    document
        .select(body)
        .next()
        .map(|b| b.text().collect::<Vec<_>>().join("\n"))
        .unwrap_or_default()
}
