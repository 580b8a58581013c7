use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::RetryPolicy;
use crate::telemetry::{CallOutcome, ModelCallEvent, TelemetrySink};

use super::domain::ModelKind;
use super::extraction::PageImage;
use super::prompts::ResolvedPrompt;

/// What accompanies the resolved prompt to the provider: extracted text for
/// the text path, rendered pages for the vision path.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelPayload {
    Text(String),
    Pages(Vec<PageImage>),
}

impl ModelPayload {
    /// Short description for telemetry; never the payload itself.
    pub fn summary(&self) -> String {
        match self {
            ModelPayload::Text(text) => format!("text ({} chars)", text.len()),
            ModelPayload::Pages(pages) => format!("pages ({})", pages.len()),
        }
    }
}

/// Token accounting as reported by the provider, when available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Raw provider response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub text: String,
    pub token_usage: Option<TokenUsage>,
}

/// Failure reported by the underlying model provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("model call timed out")]
    Timeout,
    #[error("model provider rate limited the call")]
    RateLimited,
    #[error("model provider returned upstream status {status}")]
    Upstream { status: u16 },
    #[error("malformed model request: {0}")]
    MalformedRequest(String),
    #[error("model provider rejected credentials: {0}")]
    Unauthorized(String),
}

impl ProviderError {
    /// Transient failures are retried; contract violations fail immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout | ProviderError::RateLimited => true,
            ProviderError::Upstream { status } => *status >= 500,
            ProviderError::MalformedRequest(_) | ProviderError::Unauthorized(_) => false,
        }
    }
}

/// Raised once the retry schedule is exhausted or a non-transient failure
/// occurs.
#[derive(Debug, thiserror::Error)]
#[error("model invocation failed after {attempts} attempt(s): {last_error}")]
pub struct ModelInvocationError {
    pub attempts: u32,
    #[source]
    pub last_error: ProviderError,
}

/// Provider seam over the external text/vision model service.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn generate(
        &self,
        kind: ModelKind,
        prompt: &ResolvedPrompt,
        payload: &ModelPayload,
    ) -> Result<ModelResponse, ProviderError>;
}

/// Invokes the correct model capability through one uniform contract, with a
/// shared retry policy and per-attempt telemetry.
pub struct AnalysisModelRouter<P> {
    provider: Arc<P>,
    telemetry: Arc<dyn TelemetrySink>,
    policy: RetryPolicy,
}

impl<P> AnalysisModelRouter<P>
where
    P: ModelProvider,
{
    pub fn new(provider: Arc<P>, telemetry: Arc<dyn TelemetrySink>, policy: RetryPolicy) -> Self {
        Self {
            provider,
            telemetry,
            policy,
        }
    }

    /// Calls the provider, retrying transient failures with exponential
    /// backoff. Every attempt emits a telemetry record; telemetry failures
    /// are logged and swallowed.
    pub async fn invoke(
        &self,
        kind: ModelKind,
        prompt: &ResolvedPrompt,
        payload: &ModelPayload,
    ) -> Result<ModelResponse, ModelInvocationError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let started = Instant::now();
            let result = self.provider.generate(kind, prompt, payload).await;
            self.emit(kind, prompt, payload, attempt, started, &result)
                .await;

            match result {
                Ok(response) => return Ok(response),
                Err(error) if error.is_transient() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "transient model failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    return Err(ModelInvocationError {
                        attempts: attempt,
                        last_error: error,
                    })
                }
            }
        }
    }

    async fn emit(
        &self,
        kind: ModelKind,
        prompt: &ResolvedPrompt,
        payload: &ModelPayload,
        attempt: u32,
        started: Instant,
        result: &Result<ModelResponse, ProviderError>,
    ) {
        let outcome = match result {
            Ok(_) => CallOutcome::Success,
            Err(error) => CallOutcome::Failure {
                error: error.to_string(),
                transient: error.is_transient(),
            },
        };
        let usage = result.as_ref().ok().and_then(|response| response.token_usage);
        let event = ModelCallEvent {
            model: kind,
            prompt_type: prompt.prompt_type,
            attempt,
            payload_summary: payload.summary(),
            latency_ms: started.elapsed().as_millis() as u64,
            input_tokens: usage.map(|usage| usage.input_tokens),
            output_tokens: usage.map(|usage| usage.output_tokens),
            outcome,
        };

        if let Err(err) = self.telemetry.record_model_call(event).await {
            tracing::warn!(%err, "failed to emit model call telemetry");
        }
    }
}
