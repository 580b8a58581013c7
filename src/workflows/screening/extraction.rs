use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GateConfig;

use super::domain::{DocumentRef, ExtractionMethod, ExtractionResult};

/// Which analysis path the quality gate selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisRoute {
    Text,
    Vision,
}

/// Decides whether the extracted text is trustworthy enough for text-only
/// analysis or whether the original document must go to a vision model.
///
/// Pure function: OCR extractions are held to the stricter threshold, every
/// extraction below the direct threshold goes to vision.
pub fn decide(extraction: &ExtractionResult, config: &GateConfig) -> AnalysisRoute {
    if extraction.confidence < config.min_direct_confidence {
        return AnalysisRoute::Vision;
    }
    if extraction.method == ExtractionMethod::Ocr
        && extraction.confidence < config.min_ocr_confidence
    {
        return AnalysisRoute::Vision;
    }
    AnalysisRoute::Text
}

/// One rendered page of the original document, for vision analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    pub page_number: u32,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Collaborator failure while fetching or extracting a document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document '{0}' unavailable: {1}")]
    Unavailable(String, String),
}

/// Document-store seam: resolves a reference to page images for vision
/// analysis. The storage layout itself is outside this core.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn page_images(&self, document: &DocumentRef) -> Result<Vec<PageImage>, DocumentError>;
}

/// Text-extraction seam. The OCR/layout work happens behind it; the core
/// only consumes the `(text, confidence, method)` triple it produces.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, document: &DocumentRef) -> Result<ExtractionResult, DocumentError>;
}
