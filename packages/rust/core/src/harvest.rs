//! Evidence harvesting from already-extracted source text.
//!
//! Fetching and HTML extraction happen upstream; this stage only picks
//! quotable passages out of each document's plain text.

use regex::RegexBuilder;
use tracing::{debug, info, instrument};
use url::Url;

use researchdesk_shared::{DefaultsConfig, EvidenceItem, RunId, SourceDocument};

/// Characters kept before a keyword hit.
const EXCERPT_BEFORE: usize = 160;
/// Characters kept from the keyword hit onwards.
const EXCERPT_AFTER: usize = 240;

/// Limits and hints for one harvest.
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    /// Only the first `max_sources` documents are considered.
    pub max_sources: usize,
    /// Quotes taken from a single document.
    pub max_quotes: usize,
    /// Case-insensitive keywords that anchor excerpts.
    pub keywords: Vec<String>,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self::from_config(&DefaultsConfig::default())
    }
}

impl HarvestOptions {
    pub fn from_config(defaults: &DefaultsConfig) -> Self {
        Self {
            max_sources: defaults.max_sources,
            max_quotes: defaults.max_quotes_per_source,
            keywords: defaults.keywords.clone(),
        }
    }
}

/// Extract evidence from a batch of source documents.
#[instrument(skip_all, fields(%run_id, documents = documents.len()))]
pub fn harvest(run_id: &RunId, documents: &[SourceDocument], opts: &HarvestOptions) -> Vec<EvidenceItem> {
    let mut evidence = Vec::new();

    for doc in documents.iter().take(opts.max_sources) {
        if doc.url.trim().is_empty() {
            debug!(title = %doc.title, "skipping document without url");
            continue;
        }

        let publisher = publisher_for(&doc.url);
        let items = evidence_from_text(&doc.url, &doc.title, &doc.text, &opts.keywords, opts.max_quotes);
        debug!(url = %doc.url, quotes = items.len(), "harvested document");
        evidence.extend(items.into_iter().map(|item| {
            if publisher.is_empty() {
                item
            } else {
                item.with_publisher(publisher.clone())
            }
        }));
    }

    info!(items = evidence.len(), "harvest complete");
    evidence
}

/// Pick up to `max_quotes` quotes out of one document's text.
///
/// Each keyword found contributes one excerpt around its first occurrence.
/// Without any keyword hit, the leading sentences are used instead.
pub fn evidence_from_text(
    url: &str,
    title: &str,
    text: &str,
    keywords: &[String],
    max_quotes: usize,
) -> Vec<EvidenceItem> {
    if text.trim().is_empty() || max_quotes == 0 {
        return Vec::new();
    }

    let mut quotes: Vec<String> = Vec::new();
    for keyword in keywords.iter().filter(|k| !k.trim().is_empty()) {
        if let Some(hit) = find_ignore_case(text, keyword) {
            let excerpt = char_window(text, hit, EXCERPT_BEFORE, EXCERPT_AFTER).trim();
            if !excerpt.is_empty() {
                quotes.push(excerpt.to_string());
            }
            if quotes.len() >= max_quotes {
                break;
            }
        }
    }

    if quotes.is_empty() {
        quotes = split_sentences(text, max_quotes);
    }

    quotes
        .into_iter()
        .map(|quote| EvidenceItem::new(url, title, quote))
        .collect()
}

/// Naive sentence split on `". "`, each sentence ending with a period.
pub fn split_sentences(text: &str, limit: usize) -> Vec<String> {
    text.replace('\n', " ")
        .split(". ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(limit)
        .map(|s| {
            if s.ends_with('.') {
                s.to_string()
            } else {
                format!("{s}.")
            }
        })
        .collect()
}

/// Publisher label for a URL: its host without a leading `www.`.
pub fn publisher_for(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .map(|host| host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Char index of the first case-insensitive occurrence of `needle`.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }

    let re = RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .ok()?;
    let hit = re.find(haystack)?;
    Some(haystack[..hit.start()].chars().count())
}

/// Slice `before` chars before and `after` chars from `at`, on char boundaries.
fn char_window(text: &str, at: usize, before: usize, after: usize) -> &str {
    let start_char = at.saturating_sub(before);
    let end_char = at + after;

    let byte_at = |n: usize| {
        text.char_indices()
            .nth(n)
            .map(|(i, _)| i)
            .unwrap_or(text.len())
    };

    &text[byte_at(start_char)..byte_at(end_char)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn keyword_excerpt_is_windowed() {
        let text = format!("{}Flow matters here.{}", "a".repeat(300), "b".repeat(300));
        let items = evidence_from_text("https://example.com", "T", &text, &kw(&["flow"]), 2);
        assert_eq!(items.len(), 1);

        let quote = &items[0].quote;
        assert_eq!(quote.chars().count(), EXCERPT_BEFORE + EXCERPT_AFTER);
        assert!(quote.starts_with(&"a".repeat(160)));
        assert!(quote[160..].starts_with("Flow matters"));
    }

    #[test]
    fn one_excerpt_per_keyword_up_to_limit() {
        let text = "Flow is focus. Productivity rises. Habits stick.";
        let items = evidence_from_text(
            "https://example.com",
            "T",
            text,
            &kw(&["flow", "productivity", "habits"]),
            2,
        );
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn falls_back_to_sentences() {
        let text = "First point. Second point. Third point.";
        let items = evidence_from_text("https://example.com", "T", text, &kw(&["absent"]), 2);
        let quotes: Vec<_> = items.iter().map(|i| i.quote.as_str()).collect();
        assert_eq!(quotes, vec!["First point.", "Second point."]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(evidence_from_text("https://example.com", "T", "  ", &[], 2).is_empty());
    }

    #[test]
    fn quotes_carry_checksums() {
        let items = evidence_from_text("https://example.com", "T", "One. Two.", &[], 1);
        assert_eq!(items[0].checksum.len(), 16);
    }

    #[test]
    fn multibyte_text_is_sliced_safely() {
        let text = format!("{}flow{}", "é".repeat(200), "ü".repeat(300));
        let items = evidence_from_text("https://example.com", "T", &text, &kw(&["FLOW"]), 1);
        assert_eq!(items[0].quote.chars().count(), 400);
    }

    #[test]
    fn case_insensitive_search() {
        assert_eq!(find_ignore_case("Deep WORK", "work"), Some(5));
        assert_eq!(find_ignore_case("Deep", "work"), None);
        assert_eq!(find_ignore_case("ééé Ünïcode", "ünï"), Some(4));
        assert_eq!(find_ignore_case("a+b (c)", "B (C"), Some(2));
    }

    #[test]
    fn sentences_join_lines() {
        assert_eq!(
            split_sentences("One\nline. Two.", 5),
            vec!["One line.", "Two."]
        );
    }

    #[test]
    fn publisher_strips_www() {
        assert_eq!(publisher_for("https://www.nih.gov/x"), "nih.gov");
        assert_eq!(publisher_for("https://example.com"), "example.com");
        assert_eq!(publisher_for("not a url"), "");
    }

    #[test]
    fn harvest_caps_sources_and_skips_missing_urls() {
        let docs = vec![
            SourceDocument {
                url: String::new(),
                title: "no url".into(),
                text: "Ignored.".into(),
            },
            SourceDocument {
                url: "https://www.a.org/1".into(),
                title: "A".into(),
                text: "Alpha. Beta. Gamma.".into(),
            },
            SourceDocument {
                url: "https://b.org/2".into(),
                title: "B".into(),
                text: "Delta.".into(),
            },
        ];
        let opts = HarvestOptions {
            max_sources: 2,
            max_quotes: 2,
            keywords: vec![],
        };

        let evidence = harvest(&RunId::from("run"), &docs, &opts);
        assert_eq!(evidence.len(), 2);
        assert!(evidence.iter().all(|e| e.publisher.as_deref() == Some("a.org")));
    }
}
