//! Title/abstract generation and heuristic review of a synthesis.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use researchdesk_shared::{
    EntryContent, EvidenceItem, FindingEntry, Review, ReviewIssue, Section, SectionContent,
    Severity, SynthesisResult, TitleAbstract,
};
use researchdesk_synthesis::normalize::title_case;
use researchdesk_synthesis::{EXECUTIVE_SUMMARY, has_key_findings, unique_sources};

const GENERIC_ABSTRACT: &str = "A concise abstract of the research findings.";

/// Derive a report title and abstract.
///
/// The abstract is the first sentence of the Executive Summary, or of the
/// first text section when there is no summary.
pub fn generate_title(topic: &str, sections: &[Section]) -> TitleAbstract {
    let topic = topic.trim();
    let title = if topic.is_empty() {
        "Research Report".to_string()
    } else {
        format!("{}: Evidence Review", title_case(topic))
    };

    let summary = sections
        .iter()
        .find(|s| s.heading.trim().eq_ignore_ascii_case(EXECUTIVE_SUMMARY))
        .and_then(|s| s.content.as_text())
        .filter(|t| !t.trim().is_empty())
        .or_else(|| {
            sections
                .iter()
                .filter_map(|s| s.content.as_text())
                .find(|t| !t.trim().is_empty())
        });

    let abstract_text = summary
        .map(first_sentence)
        .unwrap_or_else(|| GENERIC_ABSTRACT.to_string());

    TitleAbstract {
        title,
        abstract_text,
    }
}

/// Check a synthesis for structural and grounding problems.
pub fn review(synthesis: &SynthesisResult, evidence: &[EvidenceItem]) -> Review {
    let mut issues = Vec::new();

    if evidence.is_empty() {
        issues.push(issue("No evidence was extracted for this run", Severity::Warning));
    }

    if !has_key_findings(&synthesis.sections) {
        issues.push(issue("Report has no Key Findings section", Severity::Error));
    }

    if unique_sources(evidence).len() == 1 {
        issues.push(issue("All evidence comes from a single source", Severity::Warning));
    }

    if !evidence.is_empty() {
        let cited = cited_indexes(&synthesis.sections, evidence.len());
        if cited < evidence.len() {
            issues.push(issue(
                format!(
                    "Check citation coverage ({cited} of {} evidence items cited)",
                    evidence.len()
                ),
                Severity::Info,
            ));
        }
    }

    debug!(issues = issues.len(), "review complete");
    Review { issues }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn issue(message: impl Into<String>, severity: Severity) -> ReviewIssue {
    ReviewIssue {
        message: message.into(),
        severity,
    }
}

fn first_sentence(text: &str) -> String {
    let text = text.trim();
    match text.find(". ") {
        Some(end) => text[..=end].to_string(),
        None => text.to_string(),
    }
}

/// Distinct `[n]` markers with `1 <= n <= total` across all sections.
fn cited_indexes(sections: &[Section], total: usize) -> usize {
    static MARKER_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("valid regex"));

    let mut text = String::new();
    for section in sections {
        collect_text(&section.content, &mut text);
    }

    MARKER_RE
        .captures_iter(&text)
        .filter_map(|caps| caps[1].parse::<usize>().ok())
        .filter(|n| (1..=total).contains(n))
        .collect::<HashSet<_>>()
        .len()
}

fn collect_text(content: &SectionContent, out: &mut String) {
    match content {
        SectionContent::Text(text) => push_line(out, text),
        SectionContent::Entries(entries) => collect_entries(entries, out),
        SectionContent::Raw(value) => push_line(out, &value.to_string()),
    }
}

fn collect_entries(entries: &[FindingEntry], out: &mut String) {
    for entry in entries {
        match &entry.content {
            EntryContent::Text(text) => push_line(out, text),
            EntryContent::Entries(children) => collect_entries(children, out),
        }
    }
}

fn push_line(out: &mut String, text: &str) {
    out.push_str(text);
    out.push('\n');
}
