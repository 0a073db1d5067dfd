//! Evidence synthesis normalizer.
//!
//! Turns arbitrarily-shaped, LLM- or heuristic-produced section payloads
//! into the canonical [`Section`](researchdesk_shared::Section) list,
//! grounded in the run's evidence. Everything here is pure and total:
//! malformed input degrades to dropped elements or passthrough values,
//! never to an error.
//!
//! Layers, leaf first:
//! - [`evidence`]: bullet citations and source statistics
//! - [`content`]: value → content / finding entries
//! - [`sections`]: `sections` list → `{heading, content}` sections
//! - [`normalize`]: full payload → final ordered sections, plus the
//!   evidence-only fallback
//! - [`reply`]: fence stripping and JSON decoding of raw replies

pub mod content;
pub mod evidence;
pub mod normalize;
pub mod reply;
pub mod sections;

pub use content::{coerce_dict_item, normalize_list_items, prepare_content};
pub use evidence::{
    DEFAULT_BULLET_LIMIT, coverage, evidence_bullets, quality_metrics, unique_sources,
};
pub use normalize::{
    EXECUTIVE_SUMMARY, FINDINGS, KEY_FINDINGS, Normalizer, fallback_synthesis, has_key_findings,
    normalize_sections,
};
pub use reply::{decode_reply, strip_code_fence};
pub use sections::coerce_sections;
