//! End-to-end research pipeline:
//! topic → queries → harvest → synthesize → title → review → report → bundle.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use tracing::{info, instrument};

use researchdesk_shared::{
    AppConfig, Candidate, Constraints, ResearchDeskError, ResearchReport, Result, RunId,
    SourceDocument,
};
use researchdesk_storage::EvidenceStore;

use crate::citations::build_citations;
use crate::harvest::{HarvestOptions, harvest, publisher_for};
use crate::query::optimize_queries;
use crate::review::{generate_title, review};
use crate::synthesizer::{CompletionBackend, SynthesisOptions, synthesize};

/// Input for one research run.
#[derive(Debug, Clone, Default)]
pub struct ResearchRequest {
    pub topic: String,
    pub constraints: Constraints,
    /// Already-fetched source documents.
    pub documents: Vec<SourceDocument>,
    /// Reuse a run id instead of minting a new one.
    pub run_id: Option<RunId>,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once evidence has been harvested.
    fn evidence_harvested(&self, items: usize, sources: usize);
    /// Called when the report is complete.
    fn done(&self, report: &ResearchReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn evidence_harvested(&self, _items: usize, _sources: usize) {}
    fn done(&self, _report: &ResearchReport) {}
}

/// Run the full pipeline and return the assembled report.
///
/// 1. Optimize queries for the topic
/// 2. Harvest evidence and store it under the run id
/// 3. Synthesize from the stored evidence (LLM or heuristic)
/// 4. Derive title/abstract and citations
/// 5. Review the synthesis
#[instrument(skip_all, fields(topic = %request.topic, documents = request.documents.len()))]
pub async fn run_research<B: CompletionBackend>(
    config: &AppConfig,
    request: &ResearchRequest,
    backend: Option<&B>,
    store: &EvidenceStore,
    progress: &dyn ProgressReporter,
) -> Result<ResearchReport> {
    let start = Instant::now();
    let run_id = request.run_id.clone().unwrap_or_default();

    info!(%run_id, "starting research run");

    // --- Phase 1: Queries ---
    progress.phase("Optimizing queries");
    let optimized_queries = optimize_queries(&request.topic, &request.constraints)?;

    // --- Phase 2: Harvest ---
    progress.phase("Harvesting evidence");
    let candidates = candidates_from(&request.documents);
    let harvested = harvest(&run_id, &request.documents, &HarvestOptions::from_config(&config.defaults));
    let sources = researchdesk_synthesis::unique_sources(&harvested).len();
    progress.evidence_harvested(harvested.len(), sources);
    store.put(&run_id, harvested)?;

    // --- Phase 3: Synthesize ---
    progress.phase("Synthesizing report");
    let evidence = store.get(&run_id);
    let synthesis = synthesize(&run_id, &evidence, backend, &SynthesisOptions::from_config(config)).await;

    // --- Phase 4: Title & citations ---
    progress.phase("Writing title and citations");
    let title = generate_title(&request.topic, &synthesis.sections);
    let citations = build_citations(&evidence);

    // --- Phase 5: Review ---
    progress.phase("Reviewing");
    let review = review(&synthesis, &evidence);

    let report = ResearchReport {
        topic: request.topic.trim().to_string(),
        run_id,
        optimized_queries,
        candidates,
        evidence,
        citations,
        synthesis,
        title,
        review,
        generated_at: Utc::now(),
    };

    info!(
        run_id = %report.run_id,
        evidence = report.evidence.len(),
        sections = report.synthesis.sections.len(),
        issues = report.review.issues.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "research run complete"
    );
    progress.done(&report);

    Ok(report)
}

/// Write the report bundle into `out_dir` and release the run's evidence.
#[instrument(skip_all, fields(run_id = %report.run_id))]
pub fn export_report(report: &ResearchReport, out_dir: &Path, store: &EvidenceStore) -> Result<PathBuf> {
    if report.topic.trim().is_empty() {
        return Err(ResearchDeskError::validation("cannot export a report without a topic"));
    }

    let path = researchdesk_artifacts::write_bundle(out_dir, report)?;
    store.evict(&report.run_id);
    Ok(path)
}

/// Search candidates for the supplied documents.
fn candidates_from(documents: &[SourceDocument]) -> Vec<Candidate> {
    documents
        .iter()
        .filter(|doc| !doc.url.trim().is_empty())
        .map(|doc| Candidate {
            url: doc.url.clone(),
            title: doc.title.clone(),
            publisher: publisher_for(&doc.url),
            ..Default::default()
        })
        .collect()
}
