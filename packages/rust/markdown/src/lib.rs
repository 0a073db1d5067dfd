//! Markdown rendering for synthesized sections and full research reports.
//!
//! Headings render as `##`, text content as a paragraph, finding entries as
//! a bullet list (`- heading: content` or `- content`, nested points
//! indented), and passthrough values as a pretty-printed JSON block.

mod cleanup;

use tracing::{debug, instrument};

use researchdesk_shared::{
    Citation, EntryContent, FindingEntry, ResearchReport, Section, SectionContent,
};

/// Render a list of sections to Markdown.
pub fn render_sections(sections: &[Section]) -> String {
    let mut out = String::new();
    for section in sections {
        push_section(&mut out, section);
    }
    cleanup::run_pipeline(&out)
}

/// Render a complete report: topic, title and abstract, sections, sources.
#[instrument(skip_all, fields(run_id = %report.run_id, sections = report.synthesis.sections.len()))]
pub fn render_report(report: &ResearchReport) -> String {
    let mut out = String::new();

    if !report.topic.trim().is_empty() {
        out.push_str(&format!("# {}\n\n", report.topic.trim()));
    }

    if !report.title.title.trim().is_empty() {
        out.push_str(&format!("## {}\n\n", report.title.title.trim()));
        if !report.title.abstract_text.trim().is_empty() {
            out.push_str(report.title.abstract_text.trim());
            out.push_str("\n\n");
        }
    }

    for section in &report.synthesis.sections {
        push_section(&mut out, section);
    }

    if !report.citations.is_empty() {
        push_sources(&mut out, &report.citations);
    }

    let markdown = cleanup::run_pipeline(&out);
    debug!(len = markdown.len(), "report rendered");
    markdown
}

fn push_section(out: &mut String, section: &Section) {
    let heading = section.heading.trim();
    out.push_str(&format!(
        "## {}\n",
        if heading.is_empty() { "Section" } else { heading }
    ));

    match &section.content {
        SectionContent::Text(text) => {
            out.push_str(&cleanup::demote_body_headings(text.trim()));
            out.push('\n');
        }
        SectionContent::Entries(entries) => push_entries(out, entries, 0),
        SectionContent::Raw(value) => {
            let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            out.push_str("```json\n");
            out.push_str(&pretty);
            out.push_str("\n```\n");
        }
    }

    out.push('\n');
}

fn push_entries(out: &mut String, entries: &[FindingEntry], depth: usize) {
    let indent = "  ".repeat(depth);
    for entry in entries {
        let heading = entry.heading.as_deref().map(str::trim).filter(|h| !h.is_empty());
        match (&entry.content, heading) {
            (EntryContent::Text(text), Some(heading)) => {
                push_bullet(out, &indent, &format!("{heading}: {}", text.trim()));
            }
            (EntryContent::Text(text), None) => push_bullet(out, &indent, text.trim()),
            (EntryContent::Entries(children), Some(heading)) => {
                push_bullet(out, &indent, heading);
                push_entries(out, children, depth + 1);
            }
            (EntryContent::Entries(children), None) => push_entries(out, children, depth),
        }
    }
}

/// One bullet; continuation lines are indented under the marker.
fn push_bullet(out: &mut String, indent: &str, text: &str) {
    let mut lines = text.lines();
    out.push_str(&format!("{indent}- {}\n", lines.next().unwrap_or_default()));
    for line in lines {
        out.push_str(&format!("{indent}  {line}\n"));
    }
}

fn push_sources(out: &mut String, citations: &[Citation]) {
    out.push_str("## Sources\n");
    for citation in citations {
        out.push_str(&format!(
            "- [{}] {} ({}) <{}>\n",
            citation.id, citation.title, citation.publisher, citation.url
        ));
    }
    out.push('\n');
}
