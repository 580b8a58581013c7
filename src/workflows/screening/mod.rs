//! Resume analysis and interview-readiness scoring pipeline.
//!
//! The flow for one candidate: extraction quality gating decides between
//! text and vision analysis, the prompt resolver supplies the customer's (or
//! default) template, the model router invokes the provider with retries,
//! and the response is parsed into an [`AnalysisRecord`]. The batch
//! orchestrator fans that flow out over many candidates; the Q&A scorer
//! independently rates interview transcripts against ideal answers.

pub mod analyzer;
pub mod batch;
pub mod domain;
pub mod extraction;
pub mod model;
pub mod parse;
pub mod prompts;
pub mod qa;
pub mod scoring;

pub use analyzer::ResumeAnalyzer;
pub use batch::{BatchItem, BatchOrchestrator, CancellationFlag};
pub use domain::{
    AnalysisRecord, BatchErrorKind, BatchOutcome, CandidateId, CustomerId, DocumentRef,
    EducationProfile, Extracted, ExtractionMethod, ExtractionResult, JobContext, JobId,
    JobQuestion, ModelKind, QAAssessment, QAResult,
};
pub use extraction::{AnalysisRoute, DocumentStore, PageImage, TextExtractor};
pub use model::{
    AnalysisModelRouter, ModelInvocationError, ModelPayload, ModelProvider, ModelResponse,
    ProviderError, TokenUsage,
};
pub use parse::AnalysisParseError;
pub use prompts::{
    PromptError, PromptResolver, PromptStore, PromptTemplate, PromptType, ResolvedPrompt,
};
pub use qa::{QAReadinessScorer, QaPair};
pub use scoring::aggregate;
