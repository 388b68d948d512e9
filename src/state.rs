//! Shared application state: the store, the quiz generator, and the
//! identity/extraction collaborators.
//!
//! All durable state lives behind the `Store` trait; nothing here is mutable
//! in-process, so handlers can run fully concurrently.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::auth::{IdentityService, TokenBankIdentity};
use crate::config::{load_config_from_env, Settings};
use crate::extract::{FsTextExtractor, TextExtractor};
use crate::generator::QuizGenerator;
use crate::llm::ChatModel;
use crate::store::{MemStore, Store};

#[derive(Clone)]
pub struct AppState {
  pub settings: Settings,
  pub store: Arc<dyn Store>,
  pub identity: Arc<dyn IdentityService>,
  pub extractor: Arc<dyn TextExtractor>,
  pub generator: QuizGenerator,
}

impl AppState {
  /// Build state from env: settings, TOML config (prompts + token bank),
  /// the LLM client if a key is present, and the reference collaborators.
  #[instrument(level = "info", skip_all)]
  pub fn from_env() -> Self {
    let settings = Settings::from_env();
    let cfg = load_config_from_env().unwrap_or_default();

    let model = ChatModel::from_env();
    match &model {
      Some(m) => {
        info!(target: "lms_backend", base_url = %m.base_url, model = %m.model, "LLM generation enabled")
      }
      None => {
        info!(target: "lms_backend", "LLM disabled (no LLM_API_KEY); quizzes fall back to stock content")
      }
    }

    if cfg.users.is_empty() {
      warn!(target: "lms_backend", "identity token bank is empty; every request will be unauthorized");
    } else {
      info!(target: "lms_backend", users = cfg.users.len(), "identity token bank loaded");
    }

    Self {
      store: Arc::new(MemStore::new()),
      identity: Arc::new(TokenBankIdentity::new(cfg.users)),
      extractor: Arc::new(FsTextExtractor::new(&settings.upload_dir)),
      generator: QuizGenerator::new(model, cfg.prompts),
      settings,
    }
  }
}
