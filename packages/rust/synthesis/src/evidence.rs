//! Evidence-derived helpers: bullet citations, source counts, coverage.

use researchdesk_shared::{EvidenceItem, QualityMetrics};

/// Default number of evidence items turned into bullet citations.
pub const DEFAULT_BULLET_LIMIT: usize = 5;

/// Derive bullet citations from the first `limit` evidence items.
///
/// Items with a blank quote are skipped. Positions count emitted bullets
/// only, so the second emitted bullet is always `[2]` regardless of how
/// many blank quotes preceded it.
pub fn evidence_bullets(evidence: &[EvidenceItem], limit: usize) -> Vec<String> {
    evidence
        .iter()
        .take(limit)
        .filter_map(|item| {
            let quote = item.quote.trim();
            (!quote.is_empty()).then_some((quote, item.url.as_str()))
        })
        .enumerate()
        .map(|(i, (quote, url))| format!("- {quote} [{}] ({url})", i + 1))
        .collect()
}

/// Join bullets into a single newline-separated block.
pub fn join_bullets(bullets: &[String]) -> String {
    bullets.join("\n")
}

/// Distinct non-empty source URLs, in first-seen order.
pub fn unique_sources(evidence: &[EvidenceItem]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    evidence
        .iter()
        .map(|item| item.url.as_str())
        .filter(|url| !url.is_empty() && seen.insert(*url))
        .map(str::to_string)
        .collect()
}

/// Evidence items per unique source, rounded to two decimals.
///
/// A redundancy ratio, not a correctness signal.
pub fn coverage(evidence: &[EvidenceItem]) -> f64 {
    let sources = unique_sources(evidence).len().max(1);
    let ratio = evidence.len() as f64 / sources as f64;
    (ratio * 100.0).round() / 100.0
}

pub fn quality_metrics(evidence: &[EvidenceItem]) -> QualityMetrics {
    QualityMetrics {
        coverage: coverage(evidence),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(quote: &str, url: &str) -> EvidenceItem {
        EvidenceItem::new(url, "", quote)
    }

    #[test]
    fn bullets_skip_blank_quotes_and_renumber() {
        let evidence = vec![ev("Q1", "http://a"), ev("", "http://b"), ev("Q2", "http://c")];
        assert_eq!(
            evidence_bullets(&evidence, DEFAULT_BULLET_LIMIT),
            vec!["- Q1 [1] (http://a)", "- Q2 [2] (http://c)"]
        );
    }

    #[test]
    fn bullets_respect_limit_before_skipping() {
        let evidence = vec![
            ev("   ", "http://a"),
            ev("Q2", "http://b"),
            ev("Q3", "http://c"),
        ];
        // The blank quote still occupies one of the two slots.
        assert_eq!(evidence_bullets(&evidence, 2), vec!["- Q2 [1] (http://b)"]);
    }

    #[test]
    fn bullets_trim_quotes() {
        let evidence = vec![ev("  padded quote \n", "http://a")];
        assert_eq!(
            evidence_bullets(&evidence, 5),
            vec!["- padded quote [1] (http://a)"]
        );
    }

    #[test]
    fn bullets_empty_for_no_evidence() {
        assert!(evidence_bullets(&[], 5).is_empty());
    }

    #[test]
    fn unique_sources_first_seen_order() {
        let evidence = vec![
            ev("a", "http://b"),
            ev("b", "http://a"),
            ev("c", "http://b"),
            ev("d", ""),
        ];
        assert_eq!(unique_sources(&evidence), vec!["http://b", "http://a"]);
    }

    #[test]
    fn coverage_rounds_to_two_decimals() {
        let evidence = vec![
            ev("a", "http://a"),
            ev("b", "http://a"),
            ev("c", "http://b"),
            ev("d", "http://c"),
        ];
        // 4 items / 3 sources
        assert_eq!(coverage(&evidence), 1.33);
        assert_eq!(coverage(&[]), 0.0);
    }

    #[test]
    fn coverage_without_urls_divides_by_one() {
        let evidence = vec![ev("a", ""), ev("b", "")];
        assert_eq!(coverage(&evidence), 2.0);
    }
}
