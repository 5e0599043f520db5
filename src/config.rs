// src/config.rs

use std::env;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

use crate::error::ExamError;

/// Questions requested per kind.
pub const MCQ_QUESTION_COUNT: usize = 5;
pub const CODING_QUESTION_COUNT: usize = 2;
pub const SUBJECTIVE_QUESTION_COUNT: usize = 2;

/// Sampling temperatures.
pub const GENERATION_TEMPERATURE: f32 = 0.7;
pub const GRADING_TEMPERATURE: f32 = 0.2;

/// An open-ended answer passes strictly above this score.
pub const PASSING_SCORE: u8 = 60;

pub const DEFAULT_KEYWORDS: &str = "Python";
pub const DEFAULT_EXPERIENCE: &str = "2 years";

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub jwt_secret: String,
    pub session_ttl_secs: u64,
    /// Remote scorer. Submission is skipped when unset.
    pub score_endpoint: Option<String>,
    pub llm_timeout: Duration,
    pub llm_max_attempts: u32,
    pub llm_retry_base: Duration,
    pub grading_concurrency: usize,
    pub bind_addr: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ExamError> {
        dotenv().ok();

        let gemini_api_key = required("GEMINI_API_KEY")?;
        let jwt_secret = required("JWT_SECRET")?;

        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());

        let gemini_base_url = env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());

        let score_endpoint = env::var("SCORE_ENDPOINT")
            .ok()
            .filter(|s| !s.trim().is_empty());

        if let Some(endpoint) = &score_endpoint {
            url::Url::parse(endpoint).map_err(|e| {
                ExamError::Config(format!("SCORE_ENDPOINT is not a valid URL: {}", e))
            })?;
        }

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            jwt_secret,
            session_ttl_secs: parsed("SESSION_TTL_SECS", 7200)?,
            score_endpoint,
            llm_timeout: Duration::from_secs(parsed("LLM_TIMEOUT_SECS", 60)?),
            llm_max_attempts: parsed("LLM_MAX_RETRIES", 3)?,
            llm_retry_base: Duration::from_millis(parsed("LLM_RETRY_BASE_MS", 1000)?),
            grading_concurrency: parsed("GRADING_CONCURRENCY", 4)?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            rust_log,
        })
    }
}

fn required(key: &str) -> Result<String, ExamError> {
    env::var(key).map_err(|_| ExamError::Config(format!("{} must be set", key)))
}

fn parsed<T: FromStr>(key: &str, default: T) -> Result<T, ExamError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ExamError::Config(format!("{} has an invalid value: {:?}", key, raw))),
        Err(_) => Ok(default),
    }
}
