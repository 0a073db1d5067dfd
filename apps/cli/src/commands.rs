//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use tracing::info;

use researchdesk_core::{
    OpenAiCompatBackend, ProgressReporter, ResearchRequest, SynthesisOptions, export_report,
    optimize_queries, run_research, synthesize,
};
use researchdesk_shared::{
    AppConfig, Constraints, EvidenceItem, ResearchDeskError, ResearchReport, RunId, Section,
    SourceDocument, init_config, load_config,
};
use researchdesk_storage::EvidenceStore;
use researchdesk_synthesis::{Normalizer, decode_reply};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ResearchDesk: evidence-grounded research reports.
#[derive(Parser)]
#[command(
    name = "researchdesk",
    version,
    about = "Turn harvested evidence into grounded research reports.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Output format for synthesized sections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Json,
    Markdown,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the full pipeline over already-fetched documents and write a bundle.
    Run {
        /// Research topic.
        #[arg(long)]
        topic: String,

        /// JSON file with `[{url, title, text}]` source documents.
        #[arg(long)]
        sources: PathBuf,

        /// Reuse a run id instead of minting one.
        #[arg(long)]
        run_id: Option<String>,

        /// Output directory for the bundle (defaults to `defaults.output_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Only consider sources published on or after this date.
        #[arg(long)]
        date_start: Option<String>,

        /// Only consider sources published on or before this date.
        #[arg(long)]
        date_end: Option<String>,
    },

    /// Synthesize sections from an evidence file.
    Synthesize {
        /// JSON file with `[EvidenceItem]`.
        #[arg(long)]
        evidence: PathBuf,

        #[arg(long)]
        run_id: Option<String>,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Normalize a stored backend reply into sections, offline.
    Normalize {
        /// File holding the raw reply text (JSON, fenced JSON, or prose).
        #[arg(long)]
        reply: PathBuf,

        /// Evidence the reply was generated from.
        #[arg(long)]
        evidence: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Print the search queries derived from a topic.
    Optimize {
        #[arg(long)]
        topic: String,

        #[arg(long)]
        date_start: Option<String>,

        #[arg(long)]
        date_end: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "researchdesk=info",
        1 => "researchdesk=debug",
        _ => "researchdesk=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // stdout carries command output; logs go to stderr.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            topic,
            sources,
            run_id,
            out,
            date_start,
            date_end,
        } => {
            let constraints = Constraints {
                date_start,
                date_end,
            };
            cmd_run(&topic, &sources, run_id, out, constraints).await
        }
        Command::Synthesize {
            evidence,
            run_id,
            format,
        } => cmd_synthesize(&evidence, run_id, format).await,
        Command::Normalize {
            reply,
            evidence,
            format,
        } => cmd_normalize(&reply, evidence.as_deref(), format),
        Command::Optimize {
            topic,
            date_start,
            date_end,
        } => cmd_optimize(
            &topic,
            &Constraints {
                date_start,
                date_end,
            },
        ),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(
    topic: &str,
    sources: &Path,
    run_id: Option<String>,
    out: Option<PathBuf>,
    constraints: Constraints,
) -> Result<()> {
    let config = load_config()?;
    let backend = OpenAiCompatBackend::from_config(&config)?;
    let documents: Vec<SourceDocument> = read_json(sources)?;

    let request = ResearchRequest {
        topic: topic.to_string(),
        constraints,
        documents,
        run_id: run_id.map(RunId::from),
    };

    info!(
        topic,
        documents = request.documents.len(),
        backend = backend.is_some(),
        "starting research run"
    );

    let store = EvidenceStore::new();
    let reporter = CliProgress::new();
    let report = run_research(&config, &request, backend.as_ref(), &store, &reporter).await?;

    let out_dir = out.unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir));
    let bundle = export_report(&report, &out_dir, &store)?;

    println!();
    println!("  Research run complete!");
    println!("  Run:      {}", report.run_id);
    println!("  Title:    {}", report.title.title);
    println!("  Evidence: {}", report.evidence.len());
    println!("  Sections: {}", report.synthesis.sections.len());
    println!("  Issues:   {}", report.review.issues.len());
    println!("  Bundle:   {}", bundle.display());
    println!();

    Ok(())
}

async fn cmd_synthesize(evidence: &Path, run_id: Option<String>, format: OutputFormat) -> Result<()> {
    let config = load_config()?;
    let backend = OpenAiCompatBackend::from_config(&config)?;
    let evidence: Vec<EvidenceItem> = read_json(evidence)?;
    let run_id = run_id.map(RunId::from).unwrap_or_default();

    let result = synthesize(
        &run_id,
        &evidence,
        backend.as_ref(),
        &SynthesisOptions::from_config(&config),
    )
    .await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Markdown => print!("{}", researchdesk_markdown::render_sections(&result.sections)),
    }
    Ok(())
}

fn cmd_normalize(reply: &Path, evidence: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = load_config()?;
    let raw = std::fs::read_to_string(reply)
        .wrap_err_with(|| format!("failed to read reply file {}", reply.display()))?;
    let evidence: Vec<EvidenceItem> = match evidence {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    let (value, text) = decode_reply(&raw);
    let sections = Normalizer::new(config.defaults.evidence_bullet_limit).normalize(
        value.as_ref(),
        &text,
        &evidence,
    );

    print_sections(&sections, format)
}

fn cmd_optimize(topic: &str, constraints: &Constraints) -> Result<()> {
    for query in optimize_queries(topic, constraints)? {
        println!("{query}");
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ResearchDeskError::io(path, e))?;
    let parsed = serde_json::from_str(&content)
        .map_err(|e| ResearchDeskError::parse(format!("invalid JSON in {}: {e}", path.display())))?;
    Ok(parsed)
}

fn print_sections(sections: &[Section], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(sections)?),
        OutputFormat::Markdown => print!("{}", researchdesk_markdown::render_sections(sections)),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn evidence_harvested(&self, items: usize, sources: usize) {
        self.spinner
            .set_message(format!("Harvested {items} quotes from {sources} sources"));
    }

    fn done(&self, report: &ResearchReport) {
        self.spinner
            .finish_with_message(format!("Report ready: {}", report.title.title));
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_command() {
        let cli = Cli::try_parse_from([
            "researchdesk",
            "run",
            "--topic",
            "flow state",
            "--sources",
            "docs.json",
            "--date-start",
            "2020-01-01",
            "-vv",
        ])
        .expect("parse");

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Run {
                topic,
                sources,
                date_start,
                out,
                ..
            } => {
                assert_eq!(topic, "flow state");
                assert_eq!(sources, PathBuf::from("docs.json"));
                assert_eq!(date_start.as_deref(), Some("2020-01-01"));
                assert!(out.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn normalize_defaults_to_json() {
        let cli = Cli::try_parse_from(["researchdesk", "normalize", "--reply", "r.txt"])
            .expect("parse");
        match cli.command {
            Command::Normalize { format, evidence, .. } => {
                assert_eq!(format, OutputFormat::Json);
                assert!(evidence.is_none());
            }
            _ => panic!("expected normalize"),
        }
    }

    #[test]
    fn reads_fixture_evidence() {
        let evidence: Vec<EvidenceItem> =
            read_json(Path::new("../../fixtures/json/evidence.fixture.json")).expect("fixture");
        assert!(!evidence.is_empty());
        assert!(evidence.iter().all(|e| e.checksum.len() == 16));
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        let path = std::env::temp_dir().join(format!("researchdesk-bad-{}.json", RunId::new()));
        std::fs::write(&path, "{not json").expect("write");

        let err = read_json::<Vec<SourceDocument>>(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);

        assert!(matches!(
            err.downcast_ref::<ResearchDeskError>(),
            Some(ResearchDeskError::Parse { .. })
        ));
    }
}
