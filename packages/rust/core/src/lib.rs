//! Pipeline stages and orchestration for ResearchDesk.
//!
//! This crate ties together query expansion, evidence harvesting,
//! synthesis (LLM-backed or heuristic), review, and bundle export into the
//! end-to-end [`pipeline::run_research`] workflow.

pub mod citations;
pub mod harvest;
pub mod pipeline;
pub mod query;
pub mod review;
pub mod synthesizer;

pub use citations::build_citations;
pub use harvest::{HarvestOptions, evidence_from_text, harvest, publisher_for, split_sentences};
pub use pipeline::{
    ProgressReporter, ResearchRequest, SilentProgress, export_report, run_research,
};
pub use query::optimize_queries;
pub use review::{generate_title, review};
pub use synthesizer::{
    CompletionBackend, CompletionRequest, OpenAiCompatBackend, SynthesisOptions, build_prompt,
    synthesize,
};
