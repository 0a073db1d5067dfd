//! Synthesis normalizer: the root of the coercion stack.
//!
//! Takes whatever a generative backend (or a heuristic) produced, plus the
//! raw reply text and the run's evidence, and returns the ordered section
//! list that rendering and export consume. Every input shape has a defined
//! path; the worst outcome is an empty list.

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use researchdesk_shared::{EvidenceItem, RunId, Section, SectionContent, SynthesisResult};

use crate::content::{is_truthy, non_blank, prepare_content, raw_content};
use crate::evidence::{DEFAULT_BULLET_LIMIT, evidence_bullets, join_bullets, quality_metrics, unique_sources};
use crate::sections::coerce_sections;

pub const EXECUTIVE_SUMMARY: &str = "Executive Summary";
pub const KEY_FINDINGS: &str = "Key Findings";
pub const FINDINGS: &str = "Findings";

/// Top-level keys that may hold a summary paragraph, in priority order.
pub const SUMMARY_KEYS: [&str; 5] = ["executive_summary", "summary", "abstract", "overview", "tl_dr"];

/// Top-level keys that may hold the key findings, in priority order.
pub const FINDINGS_KEYS: [&str; 5] = ["key_findings", "findings", "insights", "highlights", "key_points"];

/// Section normalizer with a configurable evidence bullet limit.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    /// How many evidence items are considered when deriving bullets.
    pub bullet_limit: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            bullet_limit: DEFAULT_BULLET_LIMIT,
        }
    }
}

impl Normalizer {
    pub fn new(bullet_limit: usize) -> Self {
        Self { bullet_limit }
    }

    /// Normalize a backend response into canonical sections.
    ///
    /// 1. A `sections` list (or a top-level list) is coerced section by section
    /// 2. Otherwise a summary key becomes the Executive Summary, and a
    ///    `sections` mapping of heading → content is taken verbatim
    /// 3. With nothing structured, non-blank `raw_text` becomes "Findings"
    /// 4. With nothing at all, evidence bullets become "Key Findings"
    /// 5. A non-empty "Key Findings" section is guaranteed whenever findings
    ///    hints or quoted evidence exist
    #[instrument(skip_all, fields(evidence = evidence.len(), raw_len = raw_text.len()))]
    pub fn normalize(
        &self,
        response: Option<&Value>,
        raw_text: &str,
        evidence: &[EvidenceItem],
    ) -> Vec<Section> {
        let mut sections: Vec<Section> = Vec::new();
        let mut candidate_findings: Option<&Value> = None;

        match response {
            Some(Value::Object(map)) => {
                if let Some(listed) = map.get("sections") {
                    sections = renderable(coerce_sections(listed));
                }

                if sections.is_empty() {
                    if let Some(summary) = find_summary(map) {
                        sections.push(Section::text(EXECUTIVE_SUMMARY, summary));
                    }
                }

                candidate_findings = find_findings(map);

                if sections.is_empty() {
                    if let Some(Value::Object(pairs)) = map.get("sections") {
                        sections.extend(heading_map_sections(pairs));
                    }
                }
            }
            Some(list @ Value::Array(_)) => {
                sections = renderable(coerce_sections(list));
            }
            _ => {}
        }

        if sections.is_empty() {
            if let Some(text) = non_blank(raw_text) {
                debug!("no structured sections, using raw reply text");
                sections.push(Section::text(FINDINGS, text));
            }
        }

        if sections.is_empty() {
            let bullets = evidence_bullets(evidence, self.bullet_limit);
            if !bullets.is_empty() {
                debug!(bullets = bullets.len(), "building sections from evidence only");
                sections.push(Section::text(KEY_FINDINGS, join_bullets(&bullets)));
            }
        }

        self.ensure_key_findings(&mut sections, candidate_findings, evidence);
        dedupe_key_findings(&mut sections);

        debug!(sections = sections.len(), "normalized sections");
        sections
    }

    /// Pure-heuristic synthesis straight from evidence, for runs without a
    /// usable generative backend.
    pub fn fallback(&self, run_id: &RunId, evidence: &[EvidenceItem]) -> SynthesisResult {
        let sources = unique_sources(evidence);
        let bullets = evidence_bullets(evidence, self.bullet_limit);
        let findings = if bullets.is_empty() {
            "- No evidence extracted.".to_string()
        } else {
            join_bullets(&bullets)
        };

        SynthesisResult {
            run_id: run_id.clone(),
            sections: vec![
                Section::text(
                    EXECUTIVE_SUMMARY,
                    format!("Built from {} sources.", sources.len()),
                ),
                Section::text(KEY_FINDINGS, findings),
            ],
            quality_metrics: quality_metrics(evidence),
        }
    }

    /// Append "Key Findings" unless a non-empty one already exists.
    ///
    /// Findings hints from the payload take precedence over evidence bullets.
    fn ensure_key_findings(
        &self,
        sections: &mut Vec<Section>,
        candidate: Option<&Value>,
        evidence: &[EvidenceItem],
    ) {
        if has_key_findings(sections) {
            return;
        }

        let content = candidate.and_then(normalize_findings).or_else(|| {
            let bullets = evidence_bullets(evidence, self.bullet_limit);
            (!bullets.is_empty()).then(|| SectionContent::Text(join_bullets(&bullets)))
        });

        if let Some(content) = content {
            sections.push(Section::new(KEY_FINDINGS, content));
        }
    }
}

/// Normalize with the default bullet limit.
pub fn normalize_sections(
    response: Option<&Value>,
    raw_text: &str,
    evidence: &[EvidenceItem],
) -> Vec<Section> {
    Normalizer::default().normalize(response, raw_text, evidence)
}

/// Heuristic synthesis with the default bullet limit.
pub fn fallback_synthesis(run_id: &RunId, evidence: &[EvidenceItem]) -> SynthesisResult {
    Normalizer::default().fallback(run_id, evidence)
}

/// True when a section headed "key findings" (any case) has content.
pub fn has_key_findings(sections: &[Section]) -> bool {
    sections
        .iter()
        .any(|section| is_key_findings(section) && !section.content.is_empty())
}

fn is_key_findings(section: &Section) -> bool {
    section.heading.trim().eq_ignore_ascii_case(KEY_FINDINGS)
}

/// Keep the first "Key Findings" section, dropping later duplicates.
fn dedupe_key_findings(sections: &mut Vec<Section>) {
    let mut seen = false;
    sections.retain(|section| {
        if !is_key_findings(section) {
            return true;
        }
        let keep = !seen;
        seen = true;
        keep
    });
}

fn renderable(sections: Vec<Section>) -> Vec<Section> {
    sections
        .into_iter()
        .filter(|section| !section.content.is_empty())
        .collect()
}

fn find_summary(map: &Map<String, Value>) -> Option<String> {
    SUMMARY_KEYS
        .iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_str))
        .find_map(non_blank)
}

fn find_findings(map: &Map<String, Value>) -> Option<&Value> {
    FINDINGS_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|value| is_truthy(value))
}

/// Findings hints accept only lists, mappings and strings.
fn normalize_findings(value: &Value) -> Option<SectionContent> {
    match value {
        Value::Array(_) | Value::Object(_) | Value::String(_) => prepare_content(value),
        _ => None,
    }
}

/// Sections from a `{"heading": content}` mapping, headings title-cased.
fn heading_map_sections(pairs: &Map<String, Value>) -> Vec<Section> {
    pairs
        .iter()
        .filter(|(_, content)| is_truthy(content))
        .map(|(heading, content)| Section::new(title_case(heading), raw_content(content)))
        .filter(|section| !section.content.is_empty())
        .collect()
}

/// Capitalize the first letter of every alphabetic run, lowercase the rest.
///
/// `"key_findings"` becomes `"Key_Findings"`, `"next steps"` becomes `"Next Steps"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}
