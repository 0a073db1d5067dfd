//! Core domain types for ResearchDesk runs and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Number of hex characters kept from the evidence fingerprint.
pub const CHECKSUM_LEN: usize = 16;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// Identifier of one end-to-end pipeline execution.
///
/// Generated ids are time-sortable UUID v7 hex strings, but callers may
/// supply any non-empty string (e.g. a run id echoed back by a client).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RunId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// Evidence
// ---------------------------------------------------------------------------

/// A quote extracted from a source document, with its origin and fingerprint.
///
/// Deserialization is lenient: collaborators frequently send only
/// `{url, quote}`, so every field defaults. A missing checksum is derived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawEvidenceItem")]
pub struct EvidenceItem {
    pub url: String,
    pub title: String,
    pub quote: String,
    /// Location of the quote inside the source document, when known.
    pub selector: Option<String>,
    /// First 16 hex chars of SHA-256(url ++ quote).
    pub checksum: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

/// Wire shape of [`EvidenceItem`] before the checksum is filled in.
#[derive(Deserialize)]
struct RawEvidenceItem {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    quote: String,
    #[serde(default)]
    selector: Option<String>,
    #[serde(default)]
    checksum: String,
    #[serde(default)]
    publisher: Option<String>,
}

impl From<RawEvidenceItem> for EvidenceItem {
    fn from(raw: RawEvidenceItem) -> Self {
        let checksum = if raw.checksum.trim().is_empty() {
            evidence_checksum(&raw.url, &raw.quote)
        } else {
            raw.checksum
        };
        Self {
            url: raw.url,
            title: raw.title,
            quote: raw.quote,
            selector: raw.selector,
            checksum,
            publisher: raw.publisher,
        }
    }
}

impl EvidenceItem {
    /// Build an evidence item, deriving its checksum from `url` and `quote`.
    pub fn new(url: impl Into<String>, title: impl Into<String>, quote: impl Into<String>) -> Self {
        let url = url.into();
        let quote = quote.into();
        let checksum = evidence_checksum(&url, &quote);
        Self {
            url,
            title: title.into(),
            quote,
            selector: None,
            checksum,
            publisher: None,
        }
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }
}

/// Content fingerprint of a quote at a URL.
pub fn evidence_checksum(url: &str, quote: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(quote.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(CHECKSUM_LEN);
    hex
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// One named block of a research report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub content: SectionContent,
}

impl Section {
    pub fn new(heading: impl Into<String>, content: SectionContent) -> Self {
        Self {
            heading: heading.into(),
            content,
        }
    }

    /// A section with plain text content.
    pub fn text(heading: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(heading, SectionContent::Text(text.into()))
    }
}

/// The body of a [`Section`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionContent {
    /// A paragraph of text.
    Text(String),
    /// Discrete points, rendered as a bullet list.
    Entries(Vec<FindingEntry>),
    /// A value no normalization path applied to; rendered as a structured dump.
    Raw(serde_json::Value),
}

impl SectionContent {
    /// True when the content carries nothing renderable.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Entries(entries) => entries.is_empty(),
            Self::Raw(value) => match value {
                serde_json::Value::Null => true,
                serde_json::Value::String(s) => s.trim().is_empty(),
                serde_json::Value::Array(items) => items.is_empty(),
                serde_json::Value::Object(map) => map.is_empty(),
                _ => false,
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_entries(&self) -> Option<&[FindingEntry]> {
        match self {
            Self::Entries(entries) => Some(entries),
            _ => None,
        }
    }
}

impl From<EntryContent> for SectionContent {
    fn from(content: EntryContent) -> Self {
        match content {
            EntryContent::Text(text) => Self::Text(text),
            EntryContent::Entries(entries) => Self::Entries(entries),
        }
    }
}

/// A single normalized point inside a list-shaped section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingEntry {
    pub content: EntryContent,
    /// Sub-title, set only when the source item carried a label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
}

impl FindingEntry {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: EntryContent::Text(content.into()),
            heading: None,
        }
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }
}

/// The body of a [`FindingEntry`]: a string, or nested points when the
/// source item's content was itself a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryContent {
    Text(String),
    Entries(Vec<FindingEntry>),
}

impl EntryContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Entries(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Synthesis output
// ---------------------------------------------------------------------------

/// Coarse quality signals attached to a synthesis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Evidence items per unique source, rounded to two decimals.
    pub coverage: f64,
}

/// Result of the synthesize stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub run_id: RunId,
    pub sections: Vec<Section>,
    pub quality_metrics: QualityMetrics,
}

// ---------------------------------------------------------------------------
// Pipeline inputs and intermediate artifacts
// ---------------------------------------------------------------------------

/// Optional search constraints supplied with a topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_end: Option<String>,
}

/// A search result considered for harvesting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub score: f64,
}

/// An already-fetched source document, handed to the harvest stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Extracted plain text of the document.
    #[serde(default)]
    pub text: String,
}

/// One bibliography entry, deduplicated by URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub id: String,
    pub url: String,
    pub title: String,
    pub publisher: String,
}

/// Generated report title and abstract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleAbstract {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

/// Severity of a review finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A single problem raised by the review stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewIssue {
    pub message: String,
    pub severity: Severity,
}

/// Output of the review stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub issues: Vec<ReviewIssue>,
}

/// Everything a finished run produced; the unit of export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchReport {
    pub topic: String,
    pub run_id: RunId,
    #[serde(default)]
    pub optimized_queries: Vec<String>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,
    #[serde(default)]
    pub citations: Vec<Citation>,
    pub synthesis: SynthesisResult,
    pub title: TitleAbstract,
    #[serde(default)]
    pub review: Review,
    pub generated_at: DateTime<Utc>,
}
