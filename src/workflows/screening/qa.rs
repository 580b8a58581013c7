use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{InvalidInputError, ScreeningError};

use super::domain::{CustomerId, ModelKind, QAAssessment, QAResult};
use super::model::{AnalysisModelRouter, ModelPayload, ModelProvider};
use super::parse;
use super::prompts::{PromptResolver, PromptStore, PromptType};

/// One interview question with the transcript answer to score against the
/// hiring team's ideal answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
    pub ideal_answer: String,
    pub weight: f64,
}

/// Scores free-form interview answers against ideal answers, producing a
/// weighted overall readiness score. Runs post-interview, independently of
/// resume analysis.
pub struct QAReadinessScorer<P, S> {
    router: AnalysisModelRouter<P>,
    prompts: PromptResolver<S>,
    customer: Option<CustomerId>,
}

impl<P, S> QAReadinessScorer<P, S>
where
    P: ModelProvider,
    S: PromptStore,
{
    pub fn new(router: AnalysisModelRouter<P>, prompts: PromptResolver<S>) -> Self {
        Self {
            router,
            prompts,
            customer: None,
        }
    }

    /// Scopes prompt resolution to a customer so its template overrides win.
    pub fn for_customer(mut self, customer: CustomerId) -> Self {
        self.customer = Some(customer);
        self
    }

    /// Scores every pair and combines them as `Σ(score·weight) / Σ(weight)`.
    /// An empty or weightless question set is a caller error, never a zero.
    pub async fn score(&self, pairs: &[QaPair]) -> Result<QAAssessment, ScreeningError> {
        let total_weight: f64 = pairs.iter().map(|pair| pair.weight).sum();
        if pairs.is_empty() || total_weight <= 0.0 {
            return Err(InvalidInputError::NoScorableQuestions.into());
        }

        let mut results = Vec::with_capacity(pairs.len());
        let mut weighted_sum = 0.0;
        for pair in pairs {
            let mut variables = BTreeMap::new();
            variables.insert("question".to_string(), pair.question.clone());
            variables.insert("answer".to_string(), pair.answer.clone());
            variables.insert("ideal_answer".to_string(), pair.ideal_answer.clone());

            let prompt = self
                .prompts
                .resolve(PromptType::QaAssessment, self.customer.as_ref(), &variables)
                .await?;
            let payload = ModelPayload::Text(pair.answer.clone());
            let response = self.router.invoke(ModelKind::Text, &prompt, &payload).await?;
            let (score, rationale) = parse::parse_qa_score(&response.text)?;

            weighted_sum += score * pair.weight;
            results.push(QAResult {
                question: pair.question.clone(),
                answer: pair.answer.clone(),
                ideal_answer: pair.ideal_answer.clone(),
                score,
                rationale,
            });
        }

        let overall_score = weighted_sum / total_weight;
        tracing::info!(
            questions = results.len(),
            overall_score,
            "interview readiness scored"
        );

        Ok(QAAssessment {
            results,
            overall_score,
        })
    }
}
