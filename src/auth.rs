//! Authentication as an explicit value.
//!
//! Handlers and sessions receive an [`AuthSession`] instead of looking up a
//! global "current user". Tokens are opaque random strings issued at login and
//! presented as `Authorization: Bearer <token>` (or `?token=` on the socket).

use std::sync::Arc;

use axum::{
  async_trait,
  extract::FromRequestParts,
  http::{header::AUTHORIZATION, request::Parts},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::domain::User;
use crate::state::AppState;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthSession {
  user: Option<User>,
  token: Option<String>,
}

impl AuthSession {
  pub fn anonymous() -> Self {
    Self::default()
  }

  pub fn signed_in(user: User, token: impl Into<String>) -> Self {
    Self { user: Some(user), token: Some(token.into()) }
  }

  pub fn is_authenticated(&self) -> bool {
    self.user.is_some()
  }

  pub fn current_user(&self) -> Option<&User> {
    self.user.as_ref()
  }

  pub fn user_id(&self) -> Option<u64> {
    self.user.as_ref().map(|u| u.id)
  }

  pub fn token(&self) -> Option<&str> {
    self.token.as_deref()
  }

  /// Resolve a presented token against the store. Unknown tokens yield an
  /// anonymous session rather than an error.
  pub async fn resolve(state: &AppState, token: Option<&str>) -> Self {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
      return Self::anonymous();
    };
    match state.store.session_user(token).await {
      Some(user) => Self::signed_in(user, token),
      None => Self::anonymous(),
    }
  }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
  #[error("Username and password are required")]
  MissingCredentials,
  #[error("Username already exists")]
  UsernameTaken,
  #[error("Invalid username or password")]
  InvalidCredentials,
}

/// Extract the bearer token from a header value.
pub fn bearer_token(value: &str) -> Option<&str> {
  let (scheme, token) = value.trim().split_once(' ')?;
  scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}

/// 32 random bytes, URL-safe base64.
pub fn new_token() -> String {
  let mut bytes = [0u8; 32];
  rand::thread_rng().fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

pub fn hash_password(salt: &str, password: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(salt.as_bytes());
  hasher.update(b":");
  hasher.update(password.as_bytes());
  format!("{:x}", hasher.finalize())
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthSession {
  type Rejection = std::convert::Infallible;

  async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
    let token = parts
      .headers
      .get(AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .and_then(bearer_token);
    Ok(AuthSession::resolve(state, token).await)
  }
}
