use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;

use crate::error::ScreeningError;

use super::domain::{
    AnalysisRecord, CustomerId, DocumentRef, ExtractionResult, JobContext, ModelKind,
};
use super::extraction::{self, AnalysisRoute, DocumentStore, TextExtractor};
use super::model::{AnalysisModelRouter, ModelPayload, ModelProvider};
use super::parse;
use super::prompts::{PromptResolver, PromptStore, PromptType};
use crate::config::GateConfig;

/// Drives one candidate document through quality gating, prompt resolution,
/// model invocation, structured parsing, and job-context scoring.
pub struct ResumeAnalyzer<P, S, D, E> {
    router: AnalysisModelRouter<P>,
    prompts: PromptResolver<S>,
    documents: Arc<D>,
    extractor: Arc<E>,
    gate: GateConfig,
    customer: Option<CustomerId>,
}

impl<P, S, D, E> ResumeAnalyzer<P, S, D, E>
where
    P: ModelProvider,
    S: PromptStore,
    D: DocumentStore,
    E: TextExtractor,
{
    pub fn new(
        router: AnalysisModelRouter<P>,
        prompts: PromptResolver<S>,
        documents: Arc<D>,
        extractor: Arc<E>,
        gate: GateConfig,
    ) -> Self {
        Self {
            router,
            prompts,
            documents,
            extractor,
            gate,
            customer: None,
        }
    }

    /// Scopes prompt resolution to a customer so its template overrides win.
    pub fn for_customer(mut self, customer: CustomerId) -> Self {
        self.customer = Some(customer);
        self
    }

    /// Analyzes an already-extracted document. Re-analysis with identical
    /// inputs and an identical model response scores identically.
    pub async fn analyze(
        &self,
        extraction: &ExtractionResult,
        document: &DocumentRef,
        job: Option<&JobContext>,
    ) -> Result<AnalysisRecord, ScreeningError> {
        let route = extraction::decide(extraction, &self.gate);
        let (prompt_type, kind) = match route {
            AnalysisRoute::Text => (PromptType::TextAnalysis, ModelKind::Text),
            AnalysisRoute::Vision => (PromptType::VisionAnalysis, ModelKind::Vision),
        };
        tracing::info!(
            document = %document.0,
            route = ?route,
            confidence = extraction.confidence,
            "routing resume analysis"
        );

        let variables = analysis_variables(route, extraction, job);
        let prompt = self
            .prompts
            .resolve(prompt_type, self.customer.as_ref(), &variables)
            .await?;

        let payload = match route {
            AnalysisRoute::Text => ModelPayload::Text(extraction.text.clone()),
            AnalysisRoute::Vision => {
                ModelPayload::Pages(self.documents.page_images(document).await?)
            }
        };

        let response = self.router.invoke(kind, &prompt, &payload).await?;
        let (parsed, overall_score, confidence) = parse::parse_analysis(&response.text)?;

        let skills = parsed.skills();
        let skill_match_percentage =
            job.map(|job| skill_match_percentage(&skills, &job.required_skills));

        Ok(AnalysisRecord {
            skills,
            experience_years: parsed.experience(),
            experience_level: parsed.experience_level.clone().into(),
            education: parsed.education_profile(),
            overall_score,
            confidence,
            model_used: kind,
            skill_match_percentage,
            raw_model_output: response.text,
            analyzed_at: Utc::now(),
        })
    }

    /// Convenience entry point covering the full upload flow: runs the
    /// external text extraction first, then the analysis itself.
    pub async fn analyze_document(
        &self,
        document: &DocumentRef,
        job: Option<&JobContext>,
    ) -> Result<AnalysisRecord, ScreeningError> {
        let extraction = self.extractor.extract(document).await?;
        self.analyze(&extraction, document, job).await
    }
}

/// Bindings handed to the prompt resolver. With job context the templates
/// see the job title and required skills; without it they stay job-agnostic.
fn analysis_variables(
    route: AnalysisRoute,
    extraction: &ExtractionResult,
    job: Option<&JobContext>,
) -> BTreeMap<String, String> {
    let mut variables = BTreeMap::new();
    if route == AnalysisRoute::Text {
        variables.insert("resume_text".to_string(), extraction.text.clone());
    }
    if let Some(job) = job {
        variables.insert("job_title".to_string(), job.title.clone());
        variables.insert(
            "required_skills".to_string(),
            job.required_skills
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        );
    }
    variables
}

/// Share of required skills the candidate covers, case-insensitively, as a
/// percentage. An empty requirement set yields zero rather than dividing by
/// zero.
fn skill_match_percentage(skills: &BTreeSet<String>, required: &BTreeSet<String>) -> f64 {
    let candidate: BTreeSet<String> = skills
        .iter()
        .map(|skill| skill.trim().to_lowercase())
        .collect();
    let matched = required
        .iter()
        .filter(|skill| candidate.contains(&skill.trim().to_lowercase()))
        .count();
    matched as f64 / required.len().max(1) as f64 * 100.0
}
