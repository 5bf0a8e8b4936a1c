//! Save gateway: the persistence boundary for editor content.
//!
//! Two implementations share one trait. [`StoreGateway`] writes straight into
//! the in-process [`Store`]; [`HttpSaveGateway`] talks to a running server over
//! the `/api/saved-work` endpoints and maps HTTP statuses back to [`SaveError`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::auth::AuthSession;
use crate::domain::SavedWork;
use crate::store::{NewSavedWork, Store};
use crate::util::trunc_for_log;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SaveError {
  #[error("Please enter a title for your project.")]
  EmptyTitle,
  #[error("Please log in to save your work.")]
  AuthRequired,
  #[error("You don't have permission to access this item")]
  Forbidden,
  #[error("Saved work not found")]
  NotFound,
  #[error("Save service unavailable: {0}")]
  Unavailable(String),
}

/// Where saved work goes. Every call carries the caller's [`AuthSession`].
pub trait SaveGateway: Send + Sync {
  fn save(
    &self,
    auth: &AuthSession,
    title: &str,
    code: &str,
    is_public: bool,
  ) -> impl Future<Output = Result<SavedWork, SaveError>> + Send;

  fn list(&self, auth: &AuthSession) -> impl Future<Output = Result<Vec<SavedWork>, SaveError>> + Send;

  fn delete(&self, auth: &AuthSession, id: u64) -> impl Future<Output = Result<(), SaveError>> + Send;
}

// ---------- in-process ----------

#[derive(Clone, Debug)]
pub struct StoreGateway {
  store: Arc<Store>,
}

impl StoreGateway {
  pub fn new(store: Arc<Store>) -> Self {
    Self { store }
  }

  /// Public items are readable by anyone; private ones only by their owner.
  pub async fn fetch(&self, auth: &AuthSession, id: u64) -> Result<SavedWork, SaveError> {
    let work = self.store.saved_work(id).await.ok_or(SaveError::NotFound)?;
    if work.is_public || auth.user_id() == Some(work.user_id) {
      Ok(work)
    } else {
      Err(SaveError::Forbidden)
    }
  }
}

impl SaveGateway for StoreGateway {
  #[instrument(level = "info", skip(self, auth, code), fields(user_id = ?auth.user_id(), code_len = code.len()))]
  async fn save(&self, auth: &AuthSession, title: &str, code: &str, is_public: bool) -> Result<SavedWork, SaveError> {
    let user_id = auth.user_id().ok_or(SaveError::AuthRequired)?;
    let title = title.trim();
    if title.is_empty() {
      return Err(SaveError::EmptyTitle);
    }
    let work = self
      .store
      .create_saved_work(NewSavedWork { user_id, title: title.to_string(), code: code.to_string(), is_public })
      .await;
    info!(target: "htmlpractice", id = work.id, user_id, "Work saved");
    Ok(work)
  }

  async fn list(&self, auth: &AuthSession) -> Result<Vec<SavedWork>, SaveError> {
    let user_id = auth.user_id().ok_or(SaveError::AuthRequired)?;
    Ok(self.store.saved_work_by_user(user_id).await)
  }

  #[instrument(level = "info", skip(self, auth), fields(user_id = ?auth.user_id()))]
  async fn delete(&self, auth: &AuthSession, id: u64) -> Result<(), SaveError> {
    let user_id = auth.user_id().ok_or(SaveError::AuthRequired)?;
    let work = self.store.saved_work(id).await.ok_or(SaveError::NotFound)?;
    if work.user_id != user_id {
      warn!(target: "htmlpractice", id, user_id, owner = work.user_id, "Delete refused: not the owner");
      return Err(SaveError::Forbidden);
    }
    self.store.delete_saved_work(id).await;
    info!(target: "htmlpractice", id, user_id, "Saved work deleted");
    Ok(())
  }
}

// ---------- remote ----------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveBody<'a> {
  title: &'a str,
  code: &'a str,
  is_public: bool,
}

/// Client for a remote server's saved-work API.
#[derive(Clone, Debug)]
pub struct HttpSaveGateway {
  client: reqwest::Client,
  base_url: String,
}

impl HttpSaveGateway {
  pub fn new(base_url: impl Into<String>) -> Result<Self, SaveError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .map_err(|e| SaveError::Unavailable(e.to_string()))?;
    Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string() })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  fn authorized(&self, req: reqwest::RequestBuilder, auth: &AuthSession) -> Result<reqwest::RequestBuilder, SaveError> {
    let token = auth.token().ok_or(SaveError::AuthRequired)?;
    Ok(req.bearer_auth(token))
  }

  async fn send(req: reqwest::RequestBuilder) -> Result<reqwest::Response, SaveError> {
    let res = req.send().await.map_err(|e| {
      error!(target: "htmlpractice", error = %e, "Save gateway request failed");
      SaveError::Unavailable(e.to_string())
    })?;
    let status = res.status();
    if status.is_success() {
      return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    let preview = trunc_for_log(&body, 200);
    warn!(target: "htmlpractice", %status, body = %preview, "Save gateway returned an error status");
    Err(status_to_error(status, &body))
  }
}

/// Map a failed response back onto the error taxonomy. A 400 is only a
/// missing title when the server says so; other rejections stay opaque.
pub fn status_to_error(status: reqwest::StatusCode, body: &str) -> SaveError {
  let message = message_of(body);
  match status.as_u16() {
    400 if message == SaveError::EmptyTitle.to_string() => SaveError::EmptyTitle,
    401 => SaveError::AuthRequired,
    403 => SaveError::Forbidden,
    404 => SaveError::NotFound,
    _ => SaveError::Unavailable(format!("HTTP {}: {}", status, message)),
  }
}

fn message_of(body: &str) -> String {
  serde_json::from_str::<serde_json::Value>(body)
    .ok()
    .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
    .unwrap_or_else(|| body.to_string())
}

impl SaveGateway for HttpSaveGateway {
  #[instrument(level = "info", skip(self, auth, code), fields(base_url = %self.base_url, code_len = code.len()))]
  async fn save(&self, auth: &AuthSession, title: &str, code: &str, is_public: bool) -> Result<SavedWork, SaveError> {
    let req = self.authorized(self.client.post(self.url("/api/saved-work")), auth)?;
    let res = Self::send(req.json(&SaveBody { title, code, is_public })).await?;
    res.json::<SavedWork>().await.map_err(|e| SaveError::Unavailable(e.to_string()))
  }

  async fn list(&self, auth: &AuthSession) -> Result<Vec<SavedWork>, SaveError> {
    let req = self.authorized(self.client.get(self.url("/api/user/saved-work")), auth)?;
    let res = Self::send(req).await?;
    res.json::<Vec<SavedWork>>().await.map_err(|e| SaveError::Unavailable(e.to_string()))
  }

  #[instrument(level = "info", skip(self, auth), fields(base_url = %self.base_url))]
  async fn delete(&self, auth: &AuthSession, id: u64) -> Result<(), SaveError> {
    let req = self.authorized(self.client.delete(self.url(&format!("/api/saved-work/{id}"))), auth)?;
    Self::send(req).await.map(|_| ())
  }
}

// ---------- selection ----------

/// What practice sessions save through: the local store, or a remote server
/// when one is configured.
#[derive(Clone, Debug)]
pub enum SessionGateway {
  Local(StoreGateway),
  Remote(HttpSaveGateway),
}

impl SessionGateway {
  /// Remote when `url` is set and the client builds; local otherwise.
  pub fn select(local: StoreGateway, url: Option<&str>) -> Self {
    let Some(url) = url else {
      return Self::Local(local);
    };
    match HttpSaveGateway::new(url) {
      Ok(remote) => {
        info!(target: "htmlpractice", base_url = %remote.base_url, "Practice sessions save to a remote server");
        Self::Remote(remote)
      }
      Err(e) => {
        error!(target: "htmlpractice", %url, error = %e, "Remote save gateway unavailable; saving locally");
        Self::Local(local)
      }
    }
  }
}

impl SaveGateway for SessionGateway {
  async fn save(&self, auth: &AuthSession, title: &str, code: &str, is_public: bool) -> Result<SavedWork, SaveError> {
    match self {
      Self::Local(g) => g.save(auth, title, code, is_public).await,
      Self::Remote(g) => g.save(auth, title, code, is_public).await,
    }
  }

  async fn list(&self, auth: &AuthSession) -> Result<Vec<SavedWork>, SaveError> {
    match self {
      Self::Local(g) => g.list(auth).await,
      Self::Remote(g) => g.list(auth).await,
    }
  }

  async fn delete(&self, auth: &AuthSession, id: u64) -> Result<(), SaveError> {
    match self {
      Self::Local(g) => g.delete(auth, id).await,
      Self::Remote(g) => g.delete(auth, id).await,
    }
  }
}
