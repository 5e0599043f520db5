// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use exam_online::{
    ai::client::LanguageModel,
    config::Config,
    error::ExamError,
    routes,
    state::AppState,
    utils::{
        store::SessionStore,
        submit::{ScoreSubmission, ScoreSubmitter},
    },
};

pub const MCQ_REPLY: &str = r#"```json
[
  {"question": "Which keyword starts a goroutine?", "options": ["go", "async", "spawn", "thread"], "answer": "go"},
  {"question": "Zero value of an int?", "options": ["nil", "0", "undefined", "-1"], "answer": "0"},
  {"question": "Which type is a reference type?", "options": ["int", "struct", "map", "array"], "answer": "map"},
  {"question": "How do you declare a constant?", "options": ["let", "const", "final", "static"], "answer": "const"},
  {"question": "Which tool formats code?", "options": ["gofmt", "golint", "govet", "gobuild"], "answer": "gofmt"},
]
```"#;

pub const CODING_REPLY: &str =
    r#"[{"question": "Write a function that reverses a slice."}, {"question": "Implement a worker pool."}]"#;

pub const SUBJECTIVE_REPLY: &str =
    r#"[{"question": "Explain goroutines."}, {"question": "Explain interfaces."}]"#;

/// Answers prompts by recognizing which template produced them.
///
/// Grading replies depend on the answer text: "GARBAGE" yields an unparseable
/// reply, "excellent" scores 90, anything else 40.
#[derive(Default)]
pub struct ScriptedModel {
    pub generation_calls: AtomicUsize,
    pub grading_calls: AtomicUsize,
    /// Number of upcoming coding generations that return junk.
    pub broken_coding: AtomicUsize,
    pub graded_answers: Mutex<Vec<String>>,
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, ExamError> {
        if prompt.contains("exam evaluator") {
            self.grading_calls.fetch_add(1, Ordering::SeqCst);
            let answer = prompt
                .split("Student Answer: ")
                .nth(1)
                .and_then(|rest| rest.lines().next())
                .unwrap_or_default()
                .to_string();
            self.graded_answers.lock().unwrap().push(answer.clone());

            if answer.contains("GARBAGE") {
                return Ok("I would rate this fairly highly.".to_string());
            }
            let score = if answer.contains("excellent") { 90 } else { 40 };
            return Ok(format!(
                "```json\n{{\"score\": {}, \"feedback\": \"Scripted.\", \"result\": \"{}\"}}\n```",
                score,
                if score > 60 { "pass" } else { "fail" }
            ));
        }

        self.generation_calls.fetch_add(1, Ordering::SeqCst);
        if prompt.contains("MCQ") {
            Ok(MCQ_REPLY.to_string())
        } else if prompt.contains("coding questions") {
            let broken = self
                .broken_coding
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if broken {
                Ok("Sure! Here are two coding questions: 1) ... 2) ...".to_string())
            } else {
                Ok(CODING_REPLY.to_string())
            }
        } else {
            Ok(SUBJECTIVE_REPLY.to_string())
        }
    }
}

/// Records every submission; optionally fails them.
#[derive(Default)]
pub struct RecordingSubmitter {
    pub fail: bool,
    pub received: Mutex<Vec<ScoreSubmission>>,
}

#[async_trait]
impl ScoreSubmitter for RecordingSubmitter {
    async fn submit(&self, submission: &ScoreSubmission) -> Result<(), ExamError> {
        self.received.lock().unwrap().push(submission.clone());
        if self.fail {
            return Err(ExamError::Submission("HTTP 500: scorer down".to_string()));
        }
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        gemini_api_key: "unused".to_string(),
        gemini_model: "scripted".to_string(),
        gemini_base_url: "http://127.0.0.1:9".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        session_ttl_secs: 600,
        score_endpoint: None,
        llm_timeout: Duration::from_secs(5),
        llm_max_attempts: 1,
        llm_retry_base: Duration::from_millis(1),
        grading_concurrency: 2,
        bind_addr: "127.0.0.1:0".to_string(),
        rust_log: "error".to_string(),
    }
}

/// Spawns the app on a random port and returns its base URL.
pub async fn spawn_app(
    model: Arc<ScriptedModel>,
    submitter: Option<Arc<RecordingSubmitter>>,
) -> String {
    let state = AppState {
        config: test_config(),
        sessions: SessionStore::new(),
        model,
        submitter: submitter.map(|s| s as Arc<dyn ScoreSubmitter>),
    };

    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Opens a session and returns its bearer token.
pub async fn open_session(
    client: &reqwest::Client,
    address: &str,
    body: serde_json::Value,
) -> String {
    let resp = client
        .post(format!("{}/api/sessions", address))
        .json(&body)
        .send()
        .await
        .expect("Failed to create session");
    assert_eq!(resp.status().as_u16(), 201);

    let json: serde_json::Value = resp.json().await.unwrap();
    json["token"].as_str().expect("Token not found").to_string()
}

/// The correct answer of every scripted MCQ, keyed by index.
pub fn correct_mcq_answers() -> serde_json::Value {
    serde_json::json!({"0": "go", "1": "0", "2": "map", "3": "const", "4": "gofmt"})
}

/// Builds the router without binding a socket.
pub fn test_router(model: Arc<ScriptedModel>) -> axum::Router {
    routes::create_router(AppState {
        config: test_config(),
        sessions: SessionStore::new(),
        model,
        submitter: None,
    })
}
