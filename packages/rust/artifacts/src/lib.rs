//! Export bundle for finished research runs.
//!
//! A bundle is a ZIP archive holding the report in machine- and
//! human-readable form, the raw evidence, and run metadata:
//!
//! ```text
//! research_<topic>.zip
//! ├── report.json
//! ├── report.md
//! ├── evidence.jsonl
//! ├── candidates.json
//! └── metadata.json
//! ```

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, instrument};
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

use researchdesk_shared::{ResearchDeskError, ResearchReport, Result};

pub const REPORT_JSON: &str = "report.json";
pub const REPORT_MD: &str = "report.md";
pub const EVIDENCE_JSONL: &str = "evidence.jsonl";
pub const CANDIDATES_JSON: &str = "candidates.json";
pub const METADATA_JSON: &str = "metadata.json";

/// Run metadata written alongside the report.
#[derive(Debug, Serialize)]
struct BundleMetadata<'a> {
    topic: &'a str,
    run_id: &'a str,
    optimized_queries: &'a [String],
    generated_at: String,
}

/// Build the bundle archive in memory.
#[instrument(skip_all, fields(run_id = %report.run_id))]
pub fn build_bundle(report: &ResearchReport) -> Result<Vec<u8>> {
    let entries = [
        (REPORT_JSON, to_pretty_json(report)?),
        (REPORT_MD, researchdesk_markdown::render_report(report)),
        (EVIDENCE_JSONL, evidence_lines(report)?),
        (CANDIDATES_JSON, to_pretty_json(&report.candidates)?),
        (
            METADATA_JSON,
            to_pretty_json(&BundleMetadata {
                topic: &report.topic,
                run_id: report.run_id.as_str(),
                optimized_queries: &report.optimized_queries,
                generated_at: report.generated_at.to_rfc3339(),
            })?,
        ),
    ];

    let opts = FileOptions::<()>::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let mut zw = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in &entries {
        zw.start_file(*name, opts).map_err(zip_error)?;
        zw.write_all(content.as_bytes())
            .map_err(|e| ResearchDeskError::Export(format!("writing {name}: {e}")))?;
        debug!(file = %name, size = content.len(), "added bundle entry");
    }

    let bytes = zw.finish().map_err(zip_error)?.into_inner();
    debug!(size = bytes.len(), "bundle built");
    Ok(bytes)
}

/// File name for a topic's bundle: `research_<topic>.zip`.
///
/// The topic is lowercased and every run of whitespace or path separators
/// becomes a single `_`.
pub fn bundle_file_name(topic: &str) -> String {
    static SEPARATOR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[\s/\\]+").expect("valid regex"));

    let slug = SEPARATOR_RE
        .replace_all(topic.trim().to_lowercase().as_str(), "_")
        .to_string();
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "research_untitled.zip".to_string()
    } else {
        format!("research_{slug}.zip")
    }
}

/// Write the bundle into `dir`, returning the final path.
///
/// The archive is written to a hidden temp file first and renamed into
/// place, so readers never observe a partial bundle.
#[instrument(skip_all, fields(run_id = %report.run_id, dir = %dir.display()))]
pub fn write_bundle(dir: &Path, report: &ResearchReport) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| ResearchDeskError::io(dir, e))?;

    let bytes = build_bundle(report)?;
    let filename = bundle_file_name(&report.topic);
    let target = dir.join(&filename);
    let temp = dir.join(format!(".{filename}.tmp"));

    std::fs::write(&temp, &bytes).map_err(|e| ResearchDeskError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| ResearchDeskError::io(&target, e))?;

    info!(path = %target.display(), size = bytes.len(), "bundle written");
    Ok(target)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn to_pretty_json<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| ResearchDeskError::Export(format!("JSON serialization failed: {e}")))
}

/// One compact JSON object per evidence item, newline-terminated.
fn evidence_lines(report: &ResearchReport) -> Result<String> {
    let mut out = String::new();
    for item in &report.evidence {
        let line = serde_json::to_string(item)
            .map_err(|e| ResearchDeskError::Export(format!("JSON serialization failed: {e}")))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

fn zip_error(e: zip::result::ZipError) -> ResearchDeskError {
    ResearchDeskError::Export(e.to_string())
}
