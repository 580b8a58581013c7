use crate::config::AggregationWeights;
use crate::error::InvalidInputError;

use super::domain::{AnalysisRecord, QAAssessment};

/// Combines the resume analysis score with the interview Q&A score into the
/// candidate's overall matching score.
///
/// Without a Q&A assessment the model-reported analysis score passes through
/// unchanged. With one, the configured weights (0.6 analysis / 0.4 Q&A by
/// default) apply. Out-of-range inputs are a contract violation and raise
/// instead of clamping.
pub fn aggregate(
    weights: &AggregationWeights,
    analysis: &AnalysisRecord,
    qa: Option<&QAAssessment>,
) -> Result<f64, InvalidInputError> {
    check_score("analysis overall_score", analysis.overall_score)?;

    match qa {
        None => Ok(analysis.overall_score),
        Some(qa) => {
            check_score("qa overall_score", qa.overall_score)?;
            Ok(weights.analysis() * analysis.overall_score + weights.qa() * qa.overall_score)
        }
    }
}

fn check_score(field: &'static str, value: f64) -> Result<(), InvalidInputError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(InvalidInputError::ScoreOutOfRange { field, value });
    }
    Ok(())
}
