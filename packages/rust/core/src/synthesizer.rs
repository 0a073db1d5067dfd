//! LLM-backed synthesis with a heuristic fallback.
//!
//! A [`CompletionBackend`] turns a prompt into raw reply text. The reply is
//! decoded and normalized into sections; any backend failure degrades to
//! the evidence-only fallback so a run always produces a report.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use researchdesk_shared::{
    AppConfig, EvidenceItem, ResearchDeskError, Result, RunId, SynthesisResult, resolve_api_key,
};
use researchdesk_synthesis::{Normalizer, decode_reply, quality_metrics};

const USER_AGENT: &str = concat!("researchdesk/", env!("CARGO_PKG_VERSION"));

const SYSTEM_PROMPT: &str = "You are a careful analyst. Only use provided evidence.";

const TASK_PROMPT: &str = "You are a research assistant. Given evidence quotes with sources, \
write a concise Executive Summary and 3-6 Key Findings, each grounded in the evidence \
(no hallucinations). Return JSON with keys: sections=[{heading, content}].";

// ---------------------------------------------------------------------------
// Backend abstraction
// ---------------------------------------------------------------------------

/// One chat-style completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
}

/// Anything that can answer a [`CompletionRequest`] with reply text.
pub trait CompletionBackend: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> impl Future<Output = Result<String>> + Send;
}

/// Settings for the synthesize stage.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    pub model: String,
    pub temperature: f32,
    /// Evidence items included in the prompt.
    pub max_evidence_in_prompt: usize,
    pub normalizer: Normalizer,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl SynthesisOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            max_evidence_in_prompt: config.llm.max_evidence_in_prompt,
            normalizer: Normalizer::new(config.defaults.evidence_bullet_limit),
        }
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible HTTP backend
// ---------------------------------------------------------------------------

/// Chat completions over an OpenAI-compatible HTTP API.
#[derive(Debug, Clone)]
pub struct OpenAiCompatBackend {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatBackend {
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ResearchDeskError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Backend for the configured provider, or `None` when synthesis is
    /// heuristic-only.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        match resolve_api_key(config)? {
            Some(key) => Ok(Some(Self::new(
                &config.llm.base_url,
                key,
                config.llm.timeout_secs,
            )?)),
            None => Ok(None),
        }
    }
}

impl CompletionBackend for OpenAiCompatBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
        };

        debug!(%url, model = %request.model, "sending completion request");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ResearchDeskError::Network(format!("completion request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(200).collect();
            return Err(ResearchDeskError::Synthesis(format!(
                "backend returned {status}: {snippet}"
            )));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| ResearchDeskError::Synthesis(format!("invalid completion response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ResearchDeskError::Synthesis("completion had no content".into()))
    }
}

// ---------------------------------------------------------------------------
// Synthesize stage
// ---------------------------------------------------------------------------

/// Build the user prompt from the leading evidence items.
pub fn build_prompt(evidence: &[EvidenceItem], max_items: usize) -> String {
    let blocks: Vec<String> = evidence
        .iter()
        .take(max_items)
        .enumerate()
        .map(|(i, item)| format!("[{}] {}\nSource: {}", i + 1, item.quote, item.url))
        .collect();

    format!("{TASK_PROMPT}\n\nEvidence:\n{}", blocks.join("\n\n"))
}

/// Synthesize sections for a run.
///
/// Without a backend, or when the backend fails, the heuristic fallback is
/// returned instead. This never fails.
#[instrument(skip_all, fields(%run_id, evidence = evidence.len(), backend = backend.is_some()))]
pub async fn synthesize<B: CompletionBackend>(
    run_id: &RunId,
    evidence: &[EvidenceItem],
    backend: Option<&B>,
    opts: &SynthesisOptions,
) -> SynthesisResult {
    let Some(backend) = backend else {
        debug!("no backend configured, using heuristic synthesis");
        return opts.normalizer.fallback(run_id, evidence);
    };

    let request = CompletionRequest {
        model: opts.model.clone(),
        system: SYSTEM_PROMPT.to_string(),
        prompt: build_prompt(evidence, opts.max_evidence_in_prompt),
        temperature: opts.temperature,
    };

    match backend.complete(&request).await {
        Ok(reply) => {
            let (value, text) = decode_reply(&reply);
            let sections = opts.normalizer.normalize(value.as_ref(), &text, evidence);
            info!(sections = sections.len(), "synthesized from backend reply");
            SynthesisResult {
                run_id: run_id.clone(),
                sections,
                quality_metrics: quality_metrics(evidence),
            }
        }
        Err(e) => {
            warn!(error = %e, "backend synthesis failed, falling back to evidence");
            opts.normalizer.fallback(run_id, evidence)
        }
    }
}
