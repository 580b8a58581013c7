use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;
use crate::workflows::screening::domain::ModelKind;
use crate::workflows::screening::prompts::PromptType;

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(
                    f,
                    "invalid log level/filter '{}': unable to build EnvFilter",
                    value
                )
            }
            TelemetryError::Subscriber(err) => write!(f, "telemetry error: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::EnvFilter {
                value: config.log_level.clone(),
                source,
            })?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

/// Structured record of a single model provider attempt. Emitted for every
/// attempt, successful or not.
#[derive(Debug, Clone, Serialize)]
pub struct ModelCallEvent {
    pub model: ModelKind,
    pub prompt_type: PromptType,
    pub attempt: u32,
    pub payload_summary: String,
    pub latency_ms: u64,
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub outcome: CallOutcome,
}

impl ModelCallEvent {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// Outcome tag for a model call attempt.
#[derive(Debug, Clone, Serialize)]
pub enum CallOutcome {
    Success,
    Failure { error: String, transient: bool },
}

/// Error raised by a telemetry collector. Callers swallow it: observability
/// must never fail the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("telemetry collector unavailable: {0}")]
    Unavailable(String),
}

/// Boundary to an external telemetry collector. Best-effort by contract.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn record_model_call(&self, event: ModelCallEvent) -> Result<(), SinkError>;
}

/// Default sink that forwards events to the tracing subscriber.
#[derive(Debug, Default)]
pub struct TracingSink;

#[async_trait]
impl TelemetrySink for TracingSink {
    async fn record_model_call(&self, event: ModelCallEvent) -> Result<(), SinkError> {
        match &event.outcome {
            CallOutcome::Success => tracing::info!(
                model = ?event.model,
                prompt_type = ?event.prompt_type,
                attempt = event.attempt,
                latency_ms = event.latency_ms,
                input_tokens = event.input_tokens,
                output_tokens = event.output_tokens,
                "model call succeeded"
            ),
            CallOutcome::Failure { error, transient } => tracing::warn!(
                model = ?event.model,
                prompt_type = ?event.prompt_type,
                attempt = event.attempt,
                latency_ms = event.latency_ms,
                transient,
                %error,
                "model call failed"
            ),
        }
        Ok(())
    }
}
