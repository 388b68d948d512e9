//! Identity seam: a bearer credential becomes a verified `AuthUser` once at
//! the request boundary; core logic only ever sees the verified value.
//!
//! The reference implementation is a static token bank loaded from TOML
//! config. A real deployment slots a token-validating service behind the
//! same trait.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::Serialize;

use crate::config::UserCfg;
use crate::domain::{AuthUser, Role};
use crate::error::ApiError;

/// Public user record exposed by roster and progress views.
#[derive(Clone, Debug, Serialize)]
pub struct UserInfo {
  pub id: String,
  pub name: String,
  pub email: String,
}

#[async_trait]
pub trait IdentityService: Send + Sync {
  /// Resolve a bearer token to a verified identity.
  async fn authenticate(&self, token: &str) -> Result<AuthUser, ApiError>;
  /// Roster of employee-role users, for admin views.
  async fn learners(&self) -> Vec<UserInfo>;
  /// Public record for one user id, if known.
  async fn user_info(&self, id: &str) -> Option<UserInfo>;
}

/// Static token bank fed from the TOML config's `[[users]]` entries.
pub struct TokenBankIdentity {
  users: Vec<UserCfg>,
}

impl TokenBankIdentity {
  pub fn new(users: Vec<UserCfg>) -> Self {
    Self { users }
  }
}

#[async_trait]
impl IdentityService for TokenBankIdentity {
  async fn authenticate(&self, token: &str) -> Result<AuthUser, ApiError> {
    self
      .users
      .iter()
      .find(|u| u.token == token)
      .map(|u| AuthUser { id: u.id.clone(), role: u.role })
      .ok_or(ApiError::Unauthorized)
  }

  async fn learners(&self) -> Vec<UserInfo> {
    self
      .users
      .iter()
      .filter(|u| u.role == Role::Employee)
      .map(|u| UserInfo { id: u.id.clone(), name: u.name.clone(), email: u.email.clone() })
      .collect()
  }

  async fn user_info(&self, id: &str) -> Option<UserInfo> {
    self
      .users
      .iter()
      .find(|u| u.id == id)
      .map(|u| UserInfo { id: u.id.clone(), name: u.name.clone(), email: u.email.clone() })
  }
}

/// Pull the bearer token out of the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .ok_or(ApiError::Unauthorized)
}

/// Admin gate for assignment/ingestion operations. Learner operations accept
/// any authenticated role and need no gate.
pub fn require_admin(user: &AuthUser) -> Result<(), ApiError> {
  if user.role == Role::Admin {
    Ok(())
  } else {
    Err(ApiError::Forbidden)
  }
}
