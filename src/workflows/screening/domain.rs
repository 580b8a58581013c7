use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for candidates moving through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

/// Identifier wrapper for the customer (tenant) owning a job posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

/// Identifier wrapper for job postings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Opaque reference into the document store (storage key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef(pub String);

/// How the extraction service obtained the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionMethod {
    Direct,
    Ocr,
}

/// Output of the external text-extraction service for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub text: String,
    /// Extraction service's self-reported fidelity estimate in [0, 1].
    pub confidence: f64,
    pub method: ExtractionMethod,
    pub page_count: u32,
}

/// A weighted interview question with the answer the hiring team expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobQuestion {
    pub text: String,
    pub ideal_answer: String,
    pub weight: f64,
}

/// Read-only job context supplied by the caller; never mutated by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobContext {
    pub job_id: JobId,
    pub title: String,
    pub required_skills: BTreeSet<String>,
    pub questions: Vec<JobQuestion>,
}

/// A field the model may or may not have determined. Distinct from a zero or
/// empty value: `Unknown` means "not extracted", never "extracted and empty".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Extracted<T> {
    Known(T),
    Unknown,
}

impl<T> Extracted<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Extracted::Known(value) => Some(value),
            Extracted::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Extracted::Known(_))
    }
}

impl<T> From<Option<T>> for Extracted<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => Extracted::Known(inner),
            None => Extracted::Unknown,
        }
    }
}

/// Education details the model extracted, field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationProfile {
    pub degree: Extracted<String>,
    pub institution: Extracted<String>,
    pub graduation_year: Extracted<i32>,
}

impl EducationProfile {
    pub fn unknown() -> Self {
        Self {
            degree: Extracted::Unknown,
            institution: Extracted::Unknown,
            graduation_year: Extracted::Unknown,
        }
    }
}

/// Which provider capability produced an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    Text,
    Vision,
}

/// Structured result of one resume analysis invocation. Created once and
/// never mutated; re-analysis produces a fresh record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub skills: BTreeSet<String>,
    pub experience_years: Extracted<f64>,
    pub experience_level: Extracted<String>,
    pub education: EducationProfile,
    /// Model-reported quality score in [0, 100].
    pub overall_score: f64,
    /// Model-reported confidence in its own analysis, in [0, 1].
    pub confidence: f64,
    pub model_used: ModelKind,
    /// Present only when a job context was supplied at analysis time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_match_percentage: Option<f64>,
    pub raw_model_output: String,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisRecord {
    /// Field-wise equality ignoring the creation timestamp; used to confirm
    /// re-analysis with identical inputs scores identically.
    pub fn scored_fields_eq(&self, other: &Self) -> bool {
        self.skills == other.skills
            && self.experience_years == other.experience_years
            && self.experience_level == other.experience_level
            && self.education == other.education
            && self.overall_score == other.overall_score
            && self.confidence == other.confidence
            && self.model_used == other.model_used
            && self.skill_match_percentage == other.skill_match_percentage
    }
}

/// Scored answer for a single interview question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QAResult {
    pub question: String,
    pub answer: String,
    pub ideal_answer: String,
    /// Per-question match score in [0, 100].
    pub score: f64,
    pub rationale: String,
}

/// Weighted readiness assessment over one interview transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QAAssessment {
    pub results: Vec<QAResult>,
    /// Weighted mean of per-question scores, in [0, 100].
    pub overall_score: f64,
}

/// Error-kind tag recorded for a failed batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchErrorKind {
    Prompt,
    Model,
    Parse,
    Document,
    InvalidInput,
    Cancelled,
}

/// Outcome of one batch run. Transient: exists only for the duration of the
/// call; persistence is the caller's concern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub succeeded: Vec<(CandidateId, AnalysisRecord)>,
    pub failed: Vec<(CandidateId, BatchErrorKind)>,
    pub success_rate: f64,
}

impl BatchOutcome {
    /// An empty batch is trivially successful.
    pub fn empty() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            success_rate: 1.0,
        }
    }
}
