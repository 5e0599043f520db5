use std::sync::Arc;

use crate::ai::client::LanguageModel;
use crate::config::Config;
use crate::utils::{store::SessionStore, submit::ScoreSubmitter};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub model: Arc<dyn LanguageModel>,
    /// `None` when no scoring endpoint is configured.
    pub submitter: Option<Arc<dyn ScoreSubmitter>>,
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
