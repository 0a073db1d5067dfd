//! Shared types, error model, and configuration for ResearchDesk.
//!
//! This crate is the foundation depended on by all other ResearchDesk crates.
//! It provides:
//! - [`ResearchDeskError`]: the unified error type
//! - Domain types ([`EvidenceItem`], [`Section`], [`SectionContent`], [`RunId`], [`ResearchReport`])
//! - Configuration ([`AppConfig`], [`LlmConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, LlmConfig, LlmProvider, config_dir, config_file_path, init_config,
    load_config, load_config_from, resolve_api_key,
};
pub use error::{ResearchDeskError, Result};
pub use types::{
    CHECKSUM_LEN, Candidate, Citation, Constraints, EntryContent, EvidenceItem, FindingEntry,
    QualityMetrics, ResearchReport, Review, ReviewIssue, RunId, Section, SectionContent, Severity,
    SourceDocument, SynthesisResult, TitleAbstract, evidence_checksum,
};
