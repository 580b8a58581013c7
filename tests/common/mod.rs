//! In-memory fakes for exercising the screening pipeline end to end without
//! reaching external collaborators.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use talent_ai::config::GateConfig;
use talent_ai::telemetry::{ModelCallEvent, SinkError, TelemetrySink};
use talent_ai::workflows::screening::{
    AnalysisModelRouter, CustomerId, DocumentRef, ExtractionMethod, ExtractionResult, ModelKind,
    ModelPayload, ModelProvider, ModelResponse, PageImage, PromptResolver, PromptStore,
    PromptTemplate, PromptType, ProviderError, ResolvedPrompt, ResumeAnalyzer,
};
use talent_ai::workflows::screening::extraction::{DocumentError, DocumentStore, TextExtractor};
use talent_ai::workflows::screening::prompts::PromptStoreError;

pub type ResponseFn = Box<
    dyn Fn(ModelKind, &ResolvedPrompt, &ModelPayload) -> Result<ModelResponse, ProviderError>
        + Send
        + Sync,
>;

/// Scripted model provider instrumented to observe concurrency and calls.
pub struct ScriptedProvider {
    response_fn: ResponseFn,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    pub seen: Mutex<Vec<(ModelKind, String)>>,
}

impl ScriptedProvider {
    pub fn new(response_fn: ResponseFn) -> Self {
        Self {
            response_fn,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Returns the same response for every call.
    pub fn always(response: &str) -> Self {
        let text = response.to_string();
        Self::new(Box::new(move |_, _, _| {
            Ok(ModelResponse {
                text: text.clone(),
                token_usage: None,
            })
        }))
    }

    /// Pops queued responses in order; used by per-question scoring tests.
    pub fn queued(responses: Vec<Result<ModelResponse, ProviderError>>) -> Self {
        let queue = Mutex::new(responses.into_iter());
        Self::new(Box::new(move |_, _, _| {
            queue
                .lock()
                .expect("queue mutex poisoned")
                .next()
                .unwrap_or(Err(ProviderError::Timeout))
        }))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn generate(
        &self,
        kind: ModelKind,
        prompt: &ResolvedPrompt,
        payload: &ModelPayload,
    ) -> Result<ModelResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.seen
            .lock()
            .expect("seen mutex poisoned")
            .push((kind, prompt.text.clone()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = (self.response_fn)(kind, prompt, payload);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Configuration-store fake with usage counting and optional write failures.
#[derive(Default)]
pub struct InMemoryPromptStore {
    templates: Vec<PromptTemplate>,
    pub usage: Mutex<BTreeMap<String, u32>>,
    fail_usage_writes: bool,
}

impl InMemoryPromptStore {
    pub fn with_templates(templates: Vec<PromptTemplate>) -> Self {
        Self {
            templates,
            usage: Mutex::new(BTreeMap::new()),
            fail_usage_writes: false,
        }
    }

    pub fn failing_usage_writes(mut self) -> Self {
        self.fail_usage_writes = true;
        self
    }

    pub fn usage_count(&self, template_name: &str) -> u32 {
        self.usage
            .lock()
            .expect("usage mutex poisoned")
            .get(template_name)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl PromptStore for InMemoryPromptStore {
    async fn active_template(
        &self,
        prompt_type: PromptType,
        owner: Option<&CustomerId>,
    ) -> Result<Option<PromptTemplate>, PromptStoreError> {
        Ok(self
            .templates
            .iter()
            .find(|template| {
                template.is_active
                    && template.prompt_type == prompt_type
                    && template.owner.as_ref() == owner
            })
            .cloned())
    }

    async fn record_usage(
        &self,
        template_name: &str,
        _owner: Option<&CustomerId>,
    ) -> Result<(), PromptStoreError> {
        if self.fail_usage_writes {
            return Err(PromptStoreError::Unavailable("usage writer down".to_string()));
        }
        *self
            .usage
            .lock()
            .expect("usage mutex poisoned")
            .entry(template_name.to_string())
            .or_insert(0) += 1;
        Ok(())
    }
}

/// Document-store fake serving one-page renders for every reference.
#[derive(Default)]
pub struct StaticDocumentStore {
    pub fail: bool,
    pub fetches: AtomicUsize,
}

#[async_trait]
impl DocumentStore for StaticDocumentStore {
    async fn page_images(&self, document: &DocumentRef) -> Result<Vec<PageImage>, DocumentError> {
        if self.fail {
            return Err(DocumentError::Unavailable(
                document.0.clone(),
                "object store timeout".to_string(),
            ));
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(vec![PageImage {
            page_number: 1,
            mime_type: "image/png".to_string(),
            bytes: vec![0u8; 16],
        }])
    }
}

/// Extraction fake returning a fixed result for `analyze_document`.
pub struct StaticExtractor {
    pub result: ExtractionResult,
}

#[async_trait]
impl TextExtractor for StaticExtractor {
    async fn extract(&self, _document: &DocumentRef) -> Result<ExtractionResult, DocumentError> {
        Ok(self.result.clone())
    }
}

/// Telemetry sink that records every event, optionally failing each write.
#[derive(Default)]
pub struct CollectingSink {
    pub events: Mutex<Vec<ModelCallEvent>>,
    pub fail: bool,
}

#[async_trait]
impl TelemetrySink for CollectingSink {
    async fn record_model_call(&self, event: ModelCallEvent) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Unavailable("collector offline".to_string()));
        }
        self.events
            .lock()
            .expect("events mutex poisoned")
            .push(event);
        Ok(())
    }
}

pub fn template(
    name: &str,
    prompt_type: PromptType,
    owner: Option<&str>,
    content: &str,
    variables: &[&str],
) -> PromptTemplate {
    PromptTemplate {
        name: name.to_string(),
        prompt_type,
        owner: owner.map(|id| CustomerId(id.to_string())),
        content: content.to_string(),
        variables: variables.iter().map(|v| v.to_string()).collect(),
        version: "1.0".to_string(),
        is_active: true,
    }
}

/// Platform-default templates covering the three pipeline prompt types.
pub fn default_templates() -> Vec<PromptTemplate> {
    vec![
        template(
            "default_text_analysis",
            PromptType::TextAnalysis,
            None,
            "Assess this resume and answer in JSON.\n\n{resume_text}",
            &["resume_text"],
        ),
        template(
            "default_vision_analysis",
            PromptType::VisionAnalysis,
            None,
            "Assess the attached resume pages and answer in JSON.",
            &[],
        ),
        template(
            "default_qa_assessment",
            PromptType::QaAssessment,
            None,
            "Question: {question}\nIdeal answer: {ideal_answer}\nCandidate answer: {answer}\nScore the answer in JSON.",
            &["question", "answer", "ideal_answer"],
        ),
    ]
}

pub fn extraction(confidence: f64, method: ExtractionMethod, text: &str) -> ExtractionResult {
    ExtractionResult {
        text: text.to_string(),
        confidence,
        method,
        page_count: 1,
    }
}

/// A full, well-formed analysis response the way the prompt contract asks
/// for it.
pub fn analysis_response() -> String {
    serde_json::json!({
        "overall_score": 88.0,
        "confidence_score": 0.9,
        "skills_extracted": ["Rust", "Tokio", "PostgreSQL"],
        "experience_years": 6.5,
        "experience_level": "senior",
        "education": {
            "degree": "BSc Computer Science",
            "university": "Iowa State University",
            "graduation_year": 2017
        }
    })
    .to_string()
}

pub fn qa_response(score: f64) -> String {
    serde_json::json!({
        "score": score,
        "rationale": "answer covers the ideal answer's key points"
    })
    .to_string()
}

/// Wires an analyzer over the supplied fakes with an immediate retry
/// schedule so tests never sleep through real backoff.
pub fn analyzer(
    provider: Arc<ScriptedProvider>,
    store: Arc<InMemoryPromptStore>,
    documents: Arc<StaticDocumentStore>,
    extractor: Arc<StaticExtractor>,
    sink: Arc<CollectingSink>,
) -> ResumeAnalyzer<ScriptedProvider, InMemoryPromptStore, StaticDocumentStore, StaticExtractor> {
    use talent_ai::config::RetryPolicy;

    let router = AnalysisModelRouter::new(provider, sink, RetryPolicy::immediate(3));
    let prompts = PromptResolver::new(store);
    ResumeAnalyzer::new(router, prompts, documents, extractor, GateConfig::default())
}
