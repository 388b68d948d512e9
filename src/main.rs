//! LMS Backend · Reading Assignments & Auto-Generated Quizzes
//!
//! - Axum HTTP API (admin + learner surfaces)
//! - Optional LLM quiz generation (Groq/OpenAI-compatible, via env)
//! - Deterministic stock-quiz fallback when generation is unavailable
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   LLM_API_KEY         : enables LLM quiz generation if present
//!   LLM_BASE_URL        : default "https://api.groq.com/openai/v1"
//!   LLM_MODEL           : default "llama3-70b-8192"
//!   UPLOAD_DIR          : directory of stored document text (default ./uploads)
//!   QUIZ_QUESTION_COUNT : questions per generated quiz (default 5)
//!   LMS_CONFIG_PATH     : path to TOML config (prompts + token bank)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod seeds;
mod llm;
mod generator;
mod store;
mod auth;
mod extract;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (store, generator, collaborators).
  let state = Arc::new(AppState::from_env());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "lms_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
