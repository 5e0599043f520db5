// src/utils/submit.rs

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::ExamError;

/// The aggregate scores of one finished session.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSubmission {
    pub email: String,
    pub test_id: String,
    pub mcq_score: f64,
    pub subjective_score: f64,
    pub coding_score: f64,
}

/// Remote collaborator that receives final scores.
#[async_trait]
pub trait ScoreSubmitter: Send + Sync {
    async fn submit(&self, submission: &ScoreSubmission) -> Result<(), ExamError>;
}

/// Sends scores as query parameters of a single GET request.
pub struct HttpScoreSubmitter {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpScoreSubmitter {
    pub fn new(endpoint: &str) -> Result<Self, ExamError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ExamError::Config(format!("Invalid score endpoint: {}", e)))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ExamError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, endpoint })
    }

    /// Endpoint with the submission appended as query parameters.
    pub fn url_for(&self, s: &ScoreSubmission) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("email", &s.email)
            .append_pair("test_id", &s.test_id)
            .append_pair("mcq_score", &s.mcq_score.to_string())
            .append_pair("subjective_score", &s.subjective_score.to_string())
            .append_pair("coding_score", &s.coding_score.to_string());
        url
    }
}

#[async_trait]
impl ScoreSubmitter for HttpScoreSubmitter {
    async fn submit(&self, submission: &ScoreSubmission) -> Result<(), ExamError> {
        let url = self.url_for(submission);
        tracing::info!(
            "Submitting scores for test {} to {}",
            submission.test_id,
            self.endpoint
        );

        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ExamError::Submission(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ExamError::Submission(format!("HTTP {}: {}", status, body)));
        }
        Ok(())
    }
}
