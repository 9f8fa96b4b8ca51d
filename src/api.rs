//! Generation backend clients with exponential backoff retry logic.
//!
//! This module talks to the text-generation service that turns a prompt
//! into outline text. Two backends are supported behind one trait:
//! an Ollama-compatible local host and a hosted chat-completion API.
//!
//! # Architecture
//!
//! - [`GenerateAsync`]: core trait defining async generation
//! - [`OllamaClient`] / [`HostedClient`]: the two backend implementations
//! - [`RetryGenerate`]: decorator that adds retry logic to any
//!   `GenerateAsync` implementation
//!
//! # Retry Strategy
//!
//! - Up to 3 total attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//! - Only transport failures and 5xx responses are retried; a 4xx response
//!   or a malformed body fails immediately, since retrying cannot help

use rand::{Rng, rng};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::utils::truncate_for_log;

/// A failure while obtaining generated text from a backend.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The request never produced an HTTP response (connect failure,
    /// timeout, broken transport).
    #[error("could not reach the generation backend: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("generation backend returned HTTP {0}")]
    Status(StatusCode),

    /// The backend answered 2xx but the body was unparseable or missing
    /// the generated text field.
    #[error("generation backend returned an unusable response: {0}")]
    MalformedResponse(String),
}

impl GenerationError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Network(_) => true,
            GenerationError::Status(status) => status.is_server_error(),
            GenerationError::MalformedResponse(_) => false,
        }
    }
}

/// Trait for async text generation.
///
/// Implementors send a prompt to a backend and return the full generated
/// text. The abstraction exists so the retry decorator and the tests can
/// wrap any backend uniformly.
pub trait GenerateAsync {
    /// Send a prompt and return the complete (non-streamed) response text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Wrapper that adds exponential backoff retry logic to any
/// [`GenerateAsync`] implementation.
///
/// The delay between retries follows:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryGenerate<T> {
    inner: T,
    /// Total attempt budget, including the first call.
    max_attempts: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryGenerate<T>
where
    T: GenerateAsync,
{
    /// Create a new retry wrapper around an existing [`GenerateAsync`]
    /// implementation.
    pub fn new(inner: T, max_attempts: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_attempts,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryGenerate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryGenerate")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> GenerateAsync for RetryGenerate<T>
where
    T: GenerateAsync,
{
    #[instrument(level = "info", skip_all)]
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            let attempt_t0 = Instant::now();
            match self.inner.generate(prompt).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if !e.is_retryable() {
                        error!(
                            attempt,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "generate() failed with a non-retryable error"
                        );
                        return Err(e);
                    }

                    if attempt >= self.max_attempts {
                        error!(
                            attempt,
                            max = self.max_attempts,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "generate() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "generate() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

/// Client for an Ollama-compatible local backend.
///
/// Sends `POST {base}/api/generate` with `{model, prompt, stream: false}`
/// and reads the full response from the `response` field, ignoring the
/// other fields Ollama includes.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(http: reqwest::Client, base_url: String, model: String) -> Self {
        Self {
            http,
            base_url,
            model,
        }
    }
}

impl GenerateAsync for OllamaClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let t0 = Instant::now();
        let resp = self
            .http
            .post(&url)
            .json(&OllamaRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, elapsed_ms = t0.elapsed().as_millis() as u128, "Local backend rejected request");
            return Err(GenerationError::Status(status));
        }

        let body = resp.text().await?;
        let parsed: OllamaResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&body, 300),
                "Local backend returned non-conforming JSON"
            );
            GenerationError::MalformedResponse(e.to_string())
        })?;
        info!(
            elapsed_ms = t0.elapsed().as_millis() as u128,
            bytes = parsed.response.len(),
            "Local backend responded"
        );
        Ok(parsed.response)
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Client for a hosted chat-completion backend.
///
/// Same contract as [`OllamaClient`] with a different endpoint, a bearer
/// token supplied by the operator, and the provider's chat schema.
#[derive(Clone)]
pub struct HostedClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl HostedClient {
    pub fn new(http: reqwest::Client, base_url: String, model: String, api_key: String) -> Self {
        Self {
            http,
            base_url,
            model,
            api_key,
        }
    }
}

// Manual Debug so the API key never reaches the logs.
impl fmt::Debug for HostedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostedClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl GenerateAsync for HostedClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let t0 = Instant::now();
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model: &self.model,
                messages: [ChatMessage {
                    role: "user",
                    content: prompt,
                }],
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, elapsed_ms = t0.elapsed().as_millis() as u128, "Hosted backend rejected request");
            return Err(GenerationError::Status(status));
        }

        let body = resp.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&body, 300),
                "Hosted backend returned non-conforming JSON"
            );
            GenerationError::MalformedResponse(e.to_string())
        })?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                GenerationError::MalformedResponse("response contained no choices".to_string())
            })?;
        info!(
            elapsed_ms = t0.elapsed().as_millis() as u128,
            bytes = content.len(),
            "Hosted backend responded"
        );
        Ok(content)
    }
}

/// High-level entry point: send a prompt with exponential backoff.
///
/// Wraps the given client in [`RetryGenerate`] with the standard budget
/// (3 total attempts, 1 second base delay) and logs the overall outcome.
#[instrument(level = "info", skip_all)]
pub async fn generate_with_backoff<T>(client: T, prompt: &str) -> Result<String, GenerationError>
where
    T: GenerateAsync,
{
    let t0 = Instant::now();
    let api = RetryGenerate::new(client, 3, StdDuration::from_secs(1));
    let res = api.generate(prompt).await;
    let dt = t0.elapsed();

    match &res {
        Ok(_) => info!(
            elapsed_ms_total = dt.as_millis() as u128,
            "generate_with_backoff succeeded"
        ),
        Err(e) => {
            error!(elapsed_ms_total = dt.as_millis() as u128, error = %e, "generate_with_backoff failed")
        }
    }
    res
}
