use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::CustomerId;

/// The kinds of prompt the pipeline resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromptType {
    TextAnalysis,
    VisionAnalysis,
    QaAssessment,
    Interview,
    FirstMessage,
}

impl PromptType {
    pub fn label(&self) -> &'static str {
        match self {
            PromptType::TextAnalysis => "text_analysis",
            PromptType::VisionAnalysis => "vision_analysis",
            PromptType::QaAssessment => "qa_assessment",
            PromptType::Interview => "interview",
            PromptType::FirstMessage => "first_message",
        }
    }
}

/// Parameterized instruction text owned either by a customer or by the
/// platform default (`owner: None`). Managed externally; read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub name: String,
    pub prompt_type: PromptType,
    pub owner: Option<CustomerId>,
    pub content: String,
    /// Placeholder names the template declares. Every declared name must be
    /// bound at resolution time.
    pub variables: BTreeSet<String>,
    pub version: String,
    pub is_active: bool,
}

/// A template with its placeholders substituted, ready to send to a model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPrompt {
    pub prompt_type: PromptType,
    pub template_name: String,
    pub version: String,
    pub text: String,
}

/// Failure inside the configuration store backing prompt templates.
#[derive(Debug, thiserror::Error)]
pub enum PromptStoreError {
    #[error("prompt store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration-store seam supplying templates and persisting usage counts.
/// Usage increments only need at-least-once semantics under concurrency.
#[async_trait]
pub trait PromptStore: Send + Sync {
    /// The single active template of the given type for the given owner
    /// (`None` selects platform defaults), if one exists.
    async fn active_template(
        &self,
        prompt_type: PromptType,
        owner: Option<&CustomerId>,
    ) -> Result<Option<PromptTemplate>, PromptStoreError>;

    async fn record_usage(
        &self,
        template_name: &str,
        owner: Option<&CustomerId>,
    ) -> Result<(), PromptStoreError>;
}

/// Error raised while resolving a prompt.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("no active prompt template available for type '{}'", prompt_type.label())]
    NoTemplateAvailable { prompt_type: PromptType },
    #[error("template '{template_name}' declares variable '{name}' but no binding was supplied")]
    MissingVariable { template_name: String, name: String },
    #[error(transparent)]
    Store(#[from] PromptStoreError),
}

/// Resolves a prompt template for a (customer, type) pair and substitutes the
/// caller-supplied variable bindings into it.
pub struct PromptResolver<S> {
    store: Arc<S>,
}

impl<S> PromptResolver<S>
where
    S: PromptStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Resolution order: active customer-owned template, else active default
    /// template, else `NoTemplateAvailable`. Every variable the selected
    /// template declares must appear in `variables`; extras are ignored.
    pub async fn resolve(
        &self,
        prompt_type: PromptType,
        customer_id: Option<&CustomerId>,
        variables: &BTreeMap<String, String>,
    ) -> Result<ResolvedPrompt, PromptError> {
        let template = self.select_template(prompt_type, customer_id).await?;
        let text = substitute(&template, variables)?;

        // Usage counting is bookkeeping: log and move on if it fails.
        if let Err(err) = self
            .store
            .record_usage(&template.name, template.owner.as_ref())
            .await
        {
            tracing::warn!(
                template = %template.name,
                %err,
                "failed to record prompt usage"
            );
        }

        Ok(ResolvedPrompt {
            prompt_type,
            template_name: template.name,
            version: template.version,
            text,
        })
    }

    async fn select_template(
        &self,
        prompt_type: PromptType,
        customer_id: Option<&CustomerId>,
    ) -> Result<PromptTemplate, PromptError> {
        if let Some(customer) = customer_id {
            if let Some(template) = self
                .store
                .active_template(prompt_type, Some(customer))
                .await?
            {
                return Ok(template);
            }
        }

        self.store
            .active_template(prompt_type, None)
            .await?
            .ok_or(PromptError::NoTemplateAvailable { prompt_type })
    }
}

/// Substitutes `{name}` occurrences for declared variables only. Braces that
/// do not name a declared variable pass through untouched.
fn substitute(
    template: &PromptTemplate,
    variables: &BTreeMap<String, String>,
) -> Result<String, PromptError> {
    let mut rendered = template.content.clone();
    for name in &template.variables {
        let value = variables
            .get(name)
            .ok_or_else(|| PromptError::MissingVariable {
                template_name: template.name.clone(),
                name: name.clone(),
            })?;
        rendered = rendered.replace(&format!("{{{name}}}"), value);
    }
    Ok(rendered)
}
