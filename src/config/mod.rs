use std::env;
use std::fmt;
use std::time::Duration;

/// Top-level configuration for the screening pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub gate: GateConfig,
    pub retry: RetryPolicy,
    pub aggregation: AggregationWeights,
    pub max_concurrency: usize,
    pub telemetry: TelemetryConfig,
}

impl PipelineConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let gate = GateConfig {
            min_direct_confidence: parse_fraction(
                "SCREENING_MIN_DIRECT_CONFIDENCE",
                GateConfig::DEFAULT_MIN_DIRECT_CONFIDENCE,
            )?,
            min_ocr_confidence: parse_fraction(
                "SCREENING_MIN_OCR_CONFIDENCE",
                GateConfig::DEFAULT_MIN_OCR_CONFIDENCE,
            )?,
        };

        let retry = RetryPolicy {
            max_attempts: parse_positive_u32(
                "SCREENING_RETRY_MAX_ATTEMPTS",
                RetryPolicy::DEFAULT_MAX_ATTEMPTS,
            )?,
            base_delay: Duration::from_millis(u64::from(parse_positive_u32(
                "SCREENING_RETRY_BASE_DELAY_MS",
                RetryPolicy::DEFAULT_BASE_DELAY_MS,
            )?)),
            factor: RetryPolicy::DEFAULT_FACTOR,
        };

        let aggregation = AggregationWeights::new(
            parse_fraction(
                "SCREENING_ANALYSIS_WEIGHT",
                AggregationWeights::DEFAULT_ANALYSIS_WEIGHT,
            )?,
            parse_fraction("SCREENING_QA_WEIGHT", AggregationWeights::DEFAULT_QA_WEIGHT)?,
        )?;

        let max_concurrency =
            parse_positive_u32("SCREENING_MAX_CONCURRENCY", Self::DEFAULT_MAX_CONCURRENCY)? as usize;

        let log_level = env::var("SCREENING_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            gate,
            retry,
            aggregation,
            max_concurrency,
            telemetry: TelemetryConfig { log_level },
        })
    }

    const DEFAULT_MAX_CONCURRENCY: u32 = 3;
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gate: GateConfig::default(),
            retry: RetryPolicy::default(),
            aggregation: AggregationWeights::default(),
            max_concurrency: Self::DEFAULT_MAX_CONCURRENCY as usize,
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

/// Extraction-quality thresholds driving the text/vision routing decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateConfig {
    /// Below this confidence any extraction routes to vision analysis.
    pub min_direct_confidence: f64,
    /// OCR extractions additionally route to vision below this confidence.
    pub min_ocr_confidence: f64,
}

impl GateConfig {
    pub const DEFAULT_MIN_DIRECT_CONFIDENCE: f64 = 0.7;
    pub const DEFAULT_MIN_OCR_CONFIDENCE: f64 = 0.8;
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_direct_confidence: Self::DEFAULT_MIN_DIRECT_CONFIDENCE,
            min_ocr_confidence: Self::DEFAULT_MIN_OCR_CONFIDENCE,
        }
    }
}

/// Retry schedule for model provider calls: exponential backoff applied to
/// transient failures only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub factor: u32,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BASE_DELAY_MS: u32 = 1_000;
    pub const DEFAULT_FACTOR: u32 = 2;

    /// Delay before re-attempting after the given 1-based failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        self.base_delay * self.factor.saturating_pow(exponent)
    }

    /// Schedule used by tests to avoid real sleeps.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            factor: 1,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(u64::from(Self::DEFAULT_BASE_DELAY_MS)),
            factor: Self::DEFAULT_FACTOR,
        }
    }
}

/// Weights combining resume analysis and interview Q&A into one score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregationWeights {
    analysis: f64,
    qa: f64,
}

impl AggregationWeights {
    pub const DEFAULT_ANALYSIS_WEIGHT: f64 = 0.6;
    pub const DEFAULT_QA_WEIGHT: f64 = 0.4;
    const SUM_EPSILON: f64 = 1e-6;

    pub fn new(analysis: f64, qa: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&analysis)
            || !(0.0..=1.0).contains(&qa)
            || (analysis + qa - 1.0).abs() > Self::SUM_EPSILON
        {
            return Err(ConfigError::InvalidWeights { analysis, qa });
        }
        Ok(Self { analysis, qa })
    }

    pub fn analysis(&self) -> f64 {
        self.analysis
    }

    pub fn qa(&self) -> f64 {
        self.qa
    }
}

impl Default for AggregationWeights {
    fn default() -> Self {
        Self {
            analysis: Self::DEFAULT_ANALYSIS_WEIGHT,
            qa: Self::DEFAULT_QA_WEIGHT,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

fn parse_fraction(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(key) {
        Ok(raw) => {
            let value: f64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::NotANumber { key })?;
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { key, value });
            }
            Ok(value)
        }
        Err(_) => Ok(default),
    }
}

fn parse_positive_u32(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(key) {
        Ok(raw) => {
            let value: u32 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::NotANumber { key })?;
            if value == 0 {
                return Err(ConfigError::MustBePositive { key });
            }
            Ok(value)
        }
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    NotANumber { key: &'static str },
    OutOfRange { key: &'static str, value: f64 },
    MustBePositive { key: &'static str },
    InvalidWeights { analysis: f64, qa: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotANumber { key } => write!(f, "{key} must be numeric"),
            ConfigError::OutOfRange { key, value } => {
                write!(f, "{key} must lie in [0, 1], got {value}")
            }
            ConfigError::MustBePositive { key } => write!(f, "{key} must be greater than zero"),
            ConfigError::InvalidWeights { analysis, qa } => write!(
                f,
                "aggregation weights must be non-negative and sum to 1.0, got {analysis} and {qa}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
