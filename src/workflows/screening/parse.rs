use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;

use super::domain::{EducationProfile, Extracted};

/// Raised when a model response cannot be interpreted as the expected
/// structure after both parse passes. Nothing is fabricated in that case.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisParseError {
    #[error("model response contains no parseable JSON object: {detail}")]
    Unparseable { detail: String },
    #[error("model response JSON does not match the expected shape: {detail}")]
    Shape { detail: String },
    #[error("model response omits required field '{field}'")]
    MissingField { field: &'static str },
    #[error("model-reported {field} {value} lies outside [{min}, {max}]")]
    ValueOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Strict-then-lenient two-pass parse. The strict pass runs against the
/// fence-stripped response; on failure, the first balanced `{...}` object
/// substring is parsed once more.
pub fn parse_json_lenient(raw: &str) -> Result<Value, AnalysisParseError> {
    let stripped = strip_code_fences(raw);
    match serde_json::from_str::<Value>(stripped) {
        Ok(Value::Object(map)) => return Ok(Value::Object(map)),
        Ok(_) | Err(_) => {}
    }

    let candidate =
        extract_balanced_object(raw).ok_or_else(|| AnalysisParseError::Unparseable {
            detail: "no balanced JSON object found".to_string(),
        })?;

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(Value::Object(map)),
        Ok(_) => Err(AnalysisParseError::Unparseable {
            detail: "embedded JSON is not an object".to_string(),
        }),
        Err(err) => Err(AnalysisParseError::Unparseable {
            detail: err.to_string(),
        }),
    }
}

/// Models routinely wrap JSON in markdown code fences despite instructions.
fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    for prefix in ["```json", "```"] {
        if let Some(rest) = text.strip_prefix(prefix) {
            text = rest;
            break;
        }
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// First balanced top-level `{...}` substring, honoring strings and escapes.
fn extract_balanced_object(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Typed shape of a resume analysis response. Fields the model may fail to
/// determine are optional and map to `Extracted::Unknown` downstream.
#[derive(Debug, Deserialize)]
pub struct AnalysisPayload {
    pub overall_score: Option<f64>,
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub skills_extracted: Vec<String>,
    pub experience_years: Option<f64>,
    pub experience_level: Option<String>,
    pub education: Option<EducationPayload>,
}

#[derive(Debug, Deserialize)]
pub struct EducationPayload {
    pub degree: Option<String>,
    pub university: Option<String>,
    pub graduation_year: Option<i32>,
}

impl AnalysisPayload {
    pub fn skills(&self) -> BTreeSet<String> {
        self.skills_extracted
            .iter()
            .map(|skill| skill.trim().to_string())
            .filter(|skill| !skill.is_empty())
            .collect()
    }

    /// Negative years are the upstream "not determined" sentinel.
    pub fn experience(&self) -> Extracted<f64> {
        match self.experience_years {
            Some(years) if years >= 0.0 => Extracted::Known(years),
            _ => Extracted::Unknown,
        }
    }

    pub fn education_profile(&self) -> EducationProfile {
        match &self.education {
            Some(education) => EducationProfile {
                degree: education.degree.clone().into(),
                institution: education.university.clone().into(),
                graduation_year: education.graduation_year.into(),
            },
            None => EducationProfile::unknown(),
        }
    }
}

/// Parses and validates a resume analysis response.
pub fn parse_analysis(raw: &str) -> Result<(AnalysisPayload, f64, f64), AnalysisParseError> {
    let value = parse_json_lenient(raw)?;
    let payload: AnalysisPayload =
        serde_json::from_value(value).map_err(|err| AnalysisParseError::Shape {
            detail: err.to_string(),
        })?;

    let overall_score = payload
        .overall_score
        .ok_or(AnalysisParseError::MissingField {
            field: "overall_score",
        })?;
    check_range("overall_score", overall_score, 0.0, 100.0)?;

    let confidence = payload
        .confidence_score
        .ok_or(AnalysisParseError::MissingField {
            field: "confidence_score",
        })?;
    check_range("confidence_score", confidence, 0.0, 1.0)?;

    Ok((payload, overall_score, confidence))
}

/// Typed shape of a per-question readiness response.
#[derive(Debug, Deserialize)]
pub struct QaScorePayload {
    pub score: Option<f64>,
    #[serde(default)]
    pub rationale: String,
}

/// Parses and validates a Q&A scoring response.
pub fn parse_qa_score(raw: &str) -> Result<(f64, String), AnalysisParseError> {
    let value = parse_json_lenient(raw)?;
    let payload: QaScorePayload =
        serde_json::from_value(value).map_err(|err| AnalysisParseError::Shape {
            detail: err.to_string(),
        })?;

    let score = payload
        .score
        .ok_or(AnalysisParseError::MissingField { field: "score" })?;
    check_range("score", score, 0.0, 100.0)?;

    Ok((score, payload.rationale))
}

fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), AnalysisParseError> {
    if !(min..=max).contains(&value) {
        return Err(AnalysisParseError::ValueOutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
