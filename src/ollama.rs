use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::collaborator::{HeaderClassifier, Summarizer, parse_pattern_reply};
use crate::error::{CollaboratorError, PipelineError};
use crate::model::{HeaderCandidate, HeaderPattern};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

const CLASSIFY_PROMPT: &str = r#"You receive a JSON array of rows taken from the top of tables in a PDF.
Some rows are column headers (descriptive labels such as "NAME" or "HEADS OF ATTACHED DEPARTMENTS"), others are data values that happened to be first on a page.
Return only the header rows, unchanged and in the order given, as a JSON object of the form {"patterns": [["HEADER A", "HEADER B"], ...]}.

Rows:
"#;

const SUMMARIZE_PROMPT: &str = "Rewrite the following record as one coherent paragraph. Keep every value, including serial numbers, in the order given. Reply with the paragraph only.\n\nRecord:\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaConfig {
    pub base_url: Url,
    pub model: String,
    pub timeout: Duration,
}

impl OllamaConfig {
    /// `base_url` is treated as a directory, so a path prefix such as
    /// `http://host/ollama` is kept when endpoints are joined onto it.
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self, PipelineError> {
        let mut base_url = Url::parse(base_url).map_err(|error| {
            PipelineError::InvalidOption(format!("invalid Ollama URL '{base_url}': {error}"))
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            model: model.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        })
    }

    /// Reads `OLLAMA_URL` and `OLLAMA_MODEL`, falling back to local defaults.
    pub fn from_env() -> Result<Self, PipelineError> {
        let base_url =
            std::env::var("OLLAMA_URL").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string());
        let model =
            std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_OLLAMA_MODEL.to_string());
        Self::new(&base_url, model)
    }

    fn generate_url(&self) -> Result<Url, PipelineError> {
        self.base_url.join("api/generate").map_err(|error| {
            PipelineError::InvalidOption(format!("invalid Ollama URL: {error}"))
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Blocking client for a local Ollama server's generate endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    agent: ureq::Agent,
    endpoint: Url,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig) -> Result<Self, PipelineError> {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(config.timeout)
            .timeout_write(config.timeout)
            .build();
        Ok(Self {
            agent,
            endpoint: config.generate_url()?,
            model: config.model.clone(),
        })
    }

    fn generate(&self, prompt: String, format: Option<&str>) -> Result<String, CollaboratorError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format,
            options: GenerateOptions { temperature: 0.0 },
        };

        let response = self
            .agent
            .post(self.endpoint.as_str())
            .send_json(&request)?;
        let body: GenerateResponse = response
            .into_json()
            .map_err(|error| CollaboratorError::MalformedReply(error.to_string()))?;

        let text = body.response.trim();
        if text.is_empty() {
            return Err(CollaboratorError::EmptyReply);
        }
        Ok(text.to_string())
    }
}

impl HeaderClassifier for OllamaClient {
    fn classify(
        &self,
        candidates: &[HeaderCandidate],
    ) -> Result<Vec<HeaderPattern>, CollaboratorError> {
        let rows = serde_json::to_string_pretty(candidates)
            .map_err(|error| CollaboratorError::MalformedReply(error.to_string()))?;
        let reply = self.generate(format!("{CLASSIFY_PROMPT}{rows}"), Some("json"))?;
        tracing::debug!(reply = %reply, "classifier reply");
        parse_pattern_reply(&reply)
    }
}

impl Summarizer for OllamaClient {
    fn summarize(&self, entry_text: &str) -> Result<String, CollaboratorError> {
        if entry_text.trim().is_empty() {
            return Err(CollaboratorError::EmptyInput);
        }
        self.generate(format!("{SUMMARIZE_PROMPT}{entry_text}"), None)
    }
}
