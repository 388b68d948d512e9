//! Service configuration: environment settings plus an optional TOML file
//! (prompt overrides and a static bearer-token identity bank).
//!
//! See `LmsConfig` and `Prompts` for the expected TOML schema.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Role;

/// Plain environment-driven settings.
#[derive(Clone, Debug)]
pub struct Settings {
  pub port: u16,
  pub upload_dir: String,
  /// Questions requested per generated quiz (>= 1).
  pub question_count: usize,
}

impl Settings {
  pub fn from_env() -> Self {
    let port = std::env::var("PORT")
      .ok()
      .and_then(|p| p.parse::<u16>().ok())
      .unwrap_or(3000);
    let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".into());
    let question_count = std::env::var("QUIZ_QUESTION_COUNT")
      .ok()
      .and_then(|n| n.parse::<usize>().ok())
      .filter(|n| *n >= 1)
      .unwrap_or(5);
    Self { port, upload_dir, question_count }
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct LmsConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub users: Vec<UserCfg>,
}

/// Identity-bank entry accepted in TOML configuration. The token is the
/// bearer credential a client presents; id/role are the claims it maps to.
#[derive(Clone, Debug, Deserialize)]
pub struct UserCfg {
  pub token: String,
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub email: String,
  pub role: Role,
}

/// Prompts used by the quiz generator. Defaults produce the JSON-array
/// question format the parser expects; override in TOML to tune tone only,
/// not the output shape.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub quiz_system: String,
  pub quiz_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      quiz_system: "You are an educational quiz generator. Respond ONLY with a strict JSON array.".into(),
      quiz_user_template: "Based on the following text, generate {count} multiple choice questions. \
Each question must have exactly 4 options with only one correct answer.\n\n\
Text: {text}\n\n\
Return the questions as a JSON array in this exact format:\n\
[\n  {\"question\": \"Question text here?\", \"options\": [\"Option A\", \"Option B\", \"Option C\", \"Option D\"], \"answer\": \"Option A\"}\n]\n\n\
Make sure the questions are relevant to the content and the correct answer is one of the options. \
Be concise and focus on key concepts from the text.".into(),
    }
  }
}

/// Attempt to load `LmsConfig` from LMS_CONFIG_PATH. On any parsing/IO error,
/// returns None; startup continues with defaults.
pub fn load_config_from_env() -> Option<LmsConfig> {
  let path = std::env::var("LMS_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<LmsConfig>(&s) {
      Ok(cfg) => {
        info!(target: "lms_backend", %path, users = cfg.users.len(), "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "lms_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "lms_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
