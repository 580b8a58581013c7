use crate::workflows::screening::domain::BatchErrorKind;
use crate::workflows::screening::extraction::DocumentError;
use crate::workflows::screening::model::ModelInvocationError;
use crate::workflows::screening::parse::AnalysisParseError;
use crate::workflows::screening::prompts::PromptError;

/// Caller-contract violation on one of the scoring entry points.
#[derive(Debug, thiserror::Error)]
pub enum InvalidInputError {
    #[error("no scorable questions: the weighted question set is empty or weightless")]
    NoScorableQuestions,
    #[error("{field} {value} lies outside [0, 100]")]
    ScoreOutOfRange { field: &'static str, value: f64 },
}

/// Error raised by a single pipeline invocation. Failures propagate to the
/// immediate caller; only the batch orchestrator converts them into data.
#[derive(Debug, thiserror::Error)]
pub enum ScreeningError {
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Model(#[from] ModelInvocationError),
    #[error(transparent)]
    Parse(#[from] AnalysisParseError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
}

impl ScreeningError {
    /// Error-kind tag recorded when the batch orchestrator isolates this
    /// failure instead of propagating it.
    pub fn batch_kind(&self) -> BatchErrorKind {
        match self {
            ScreeningError::Prompt(_) => BatchErrorKind::Prompt,
            ScreeningError::Model(_) => BatchErrorKind::Model,
            ScreeningError::Parse(_) => BatchErrorKind::Parse,
            ScreeningError::Document(_) => BatchErrorKind::Document,
            ScreeningError::InvalidInput(_) => BatchErrorKind::InvalidInput,
        }
    }
}
