//! Weighted interview-readiness scoring over scripted per-question model
//! responses.

mod common;

use std::sync::Arc;

use common::*;
use talent_ai::config::RetryPolicy;
use talent_ai::error::{InvalidInputError, ScreeningError};
use talent_ai::workflows::screening::{
    AnalysisModelRouter, CustomerId, ModelResponse, PromptResolver, PromptType, QAReadinessScorer,
    QaPair,
};

fn pair(question: &str, answer: &str, ideal: &str, weight: f64) -> QaPair {
    QaPair {
        question: question.to_string(),
        answer: answer.to_string(),
        ideal_answer: ideal.to_string(),
        weight,
    }
}

fn scorer(
    provider: Arc<ScriptedProvider>,
    store: Arc<InMemoryPromptStore>,
) -> QAReadinessScorer<ScriptedProvider, InMemoryPromptStore> {
    let sink = Arc::new(CollectingSink::default());
    let router = AnalysisModelRouter::new(provider, sink, RetryPolicy::immediate(3));
    QAReadinessScorer::new(router, PromptResolver::new(store))
}

fn queued_scores(scores: &[f64]) -> Arc<ScriptedProvider> {
    Arc::new(ScriptedProvider::queued(
        scores
            .iter()
            .map(|score| {
                Ok(ModelResponse {
                    text: qa_response(*score),
                    token_usage: None,
                })
            })
            .collect(),
    ))
}

#[tokio::test]
async fn equal_weights_average_the_scores() {
    let provider = queued_scores(&[80.0, 100.0]);
    let store = Arc::new(InMemoryPromptStore::with_templates(default_templates()));
    let scorer = scorer(Arc::clone(&provider), store);

    let assessment = scorer
        .score(&[
            pair("Why Rust?", "Memory safety without GC.", "Safety and performance.", 1.0),
            pair("Describe a failure.", "Shipped a race, learned to test.", "Owns mistakes.", 1.0),
        ])
        .await
        .expect("scoring succeeds");

    assert_eq!(assessment.overall_score, 90.0);
    assert_eq!(assessment.results.len(), 2);
    assert_eq!(assessment.results[0].score, 80.0);
    assert_eq!(assessment.results[1].score, 100.0);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn weights_tilt_the_overall_score() {
    let provider = queued_scores(&[80.0, 100.0]);
    let store = Arc::new(InMemoryPromptStore::with_templates(default_templates()));
    let scorer = scorer(provider, store);

    // (80*1 + 100*3) / 4 = 95
    let assessment = scorer
        .score(&[
            pair("Warm-up", "ok", "ok", 1.0),
            pair("Core competency", "great", "great", 3.0),
        ])
        .await
        .expect("scoring succeeds");

    assert_eq!(assessment.overall_score, 95.0);
}

#[tokio::test]
async fn empty_question_set_is_a_caller_error() {
    let provider = queued_scores(&[]);
    let store = Arc::new(InMemoryPromptStore::with_templates(default_templates()));
    let scorer = scorer(Arc::clone(&provider), store);

    let err = scorer.score(&[]).await.expect_err("nothing to score");
    assert!(matches!(
        err,
        ScreeningError::InvalidInput(InvalidInputError::NoScorableQuestions)
    ));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn all_zero_weights_are_a_caller_error() {
    let provider = queued_scores(&[80.0]);
    let store = Arc::new(InMemoryPromptStore::with_templates(default_templates()));
    let scorer = scorer(Arc::clone(&provider), store);

    let err = scorer
        .score(&[pair("Unweighted", "answer", "ideal", 0.0)])
        .await
        .expect_err("weightless sets cannot be combined");
    assert!(matches!(
        err,
        ScreeningError::InvalidInput(InvalidInputError::NoScorableQuestions)
    ));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn out_of_range_model_score_fails_the_question() {
    let provider = queued_scores(&[120.0]);
    let store = Arc::new(InMemoryPromptStore::with_templates(default_templates()));
    let scorer = scorer(provider, store);

    let err = scorer
        .score(&[pair("Q", "A", "I", 1.0)])
        .await
        .expect_err("scores above 100 are rejected, never clamped");
    assert!(matches!(err, ScreeningError::Parse(_)));
}

#[tokio::test]
async fn prompts_carry_question_answer_and_ideal() {
    let provider = queued_scores(&[75.0]);
    let store = Arc::new(InMemoryPromptStore::with_templates(default_templates()));
    let scorer = scorer(Arc::clone(&provider), Arc::clone(&store));

    let assessment = scorer
        .score(&[pair(
            "How do you handle backpressure?",
            "Bounded channels.",
            "Bounded queues and load shedding.",
            1.0,
        )])
        .await
        .expect("scoring succeeds");

    assert_eq!(
        assessment.results[0].rationale,
        "answer covers the ideal answer's key points"
    );
    let seen = provider.seen.lock().expect("seen mutex poisoned");
    assert!(seen[0].1.contains("How do you handle backpressure?"));
    assert!(seen[0].1.contains("Bounded channels."));
    assert!(seen[0].1.contains("Bounded queues and load shedding."));
    assert_eq!(store.usage_count("default_qa_assessment"), 1);
}

#[tokio::test]
async fn customer_template_scopes_qa_prompts() {
    let mut templates = default_templates();
    templates.push(template(
        "acme_qa_assessment",
        PromptType::QaAssessment,
        Some("acme"),
        "ACME RUBRIC. {question} / {answer} / {ideal_answer}",
        &["question", "answer", "ideal_answer"],
    ));
    let provider = queued_scores(&[60.0]);
    let store = Arc::new(InMemoryPromptStore::with_templates(templates));
    let scorer = scorer(Arc::clone(&provider), Arc::clone(&store))
        .for_customer(CustomerId("acme".to_string()));

    scorer
        .score(&[pair("Q", "A", "I", 2.0)])
        .await
        .expect("scoring succeeds");

    let seen = provider.seen.lock().expect("seen mutex poisoned");
    assert!(seen[0].1.starts_with("ACME RUBRIC."));
    assert_eq!(store.usage_count("acme_qa_assessment"), 1);
}
