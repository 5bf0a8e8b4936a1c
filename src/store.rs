//! In-memory storage: users, login sessions, the example catalog and saved work.
//!
//! Everything lives behind `tokio::sync::RwLock` maps; ids come from atomic
//! counters starting at 1. Nothing survives a restart. Login tokens expire a
//! week after they were issued and are pruned whenever someone logs in.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::auth::{hash_password, new_token, AuthError};
use crate::domain::{HtmlExample, SavedWork, User};

#[derive(Clone, Debug)]
struct UserRecord {
  user: User,
  salt: String,
  password_digest: String,
}

/// How long a login token stays valid.
fn session_ttl() -> Duration {
  Duration::days(7)
}

#[derive(Clone, Debug)]
struct LoginSession {
  user_id: u64,
  issued_at: DateTime<Utc>,
}

impl LoginSession {
  fn is_live(&self, now: DateTime<Utc>) -> bool {
    now - self.issued_at < session_ttl()
  }
}

/// Fields of a saved work before it gets an id.
#[derive(Clone, Debug)]
pub struct NewSavedWork {
  pub user_id: u64,
  pub title: String,
  pub code: String,
  pub is_public: bool,
}

#[derive(Debug)]
pub struct Store {
  users: RwLock<HashMap<u64, UserRecord>>,
  sessions: RwLock<HashMap<String, LoginSession>>,
  examples: RwLock<BTreeMap<u64, HtmlExample>>,
  saved: RwLock<BTreeMap<u64, SavedWork>>,
  next_user_id: AtomicU64,
  next_saved_id: AtomicU64,
}

impl Default for Store {
  fn default() -> Self {
    Self {
      users: RwLock::new(HashMap::new()),
      sessions: RwLock::new(HashMap::new()),
      examples: RwLock::new(BTreeMap::new()),
      saved: RwLock::new(BTreeMap::new()),
      next_user_id: AtomicU64::new(1),
      next_saved_id: AtomicU64::new(1),
    }
  }
}

impl Store {
  pub fn with_examples(examples: impl IntoIterator<Item = HtmlExample>) -> Self {
    let map: BTreeMap<u64, HtmlExample> = examples.into_iter().map(|e| (e.id, e)).collect();
    Self { examples: RwLock::new(map), ..Self::default() }
  }

  // --- users & sessions ---

  #[instrument(level = "info", skip(self, password))]
  pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
      return Err(AuthError::MissingCredentials);
    }
    let mut users = self.users.write().await;
    if users.values().any(|r| r.user.username == username) {
      return Err(AuthError::UsernameTaken);
    }
    let id = self.next_user_id.fetch_add(1, Ordering::Relaxed);
    let salt = Uuid::new_v4().to_string();
    let user = User { id, username: username.to_string() };
    users.insert(
      id,
      UserRecord { user: user.clone(), password_digest: hash_password(&salt, password), salt },
    );
    info!(target: "htmlpractice", user_id = id, "User registered");
    Ok(user)
  }

  /// Check credentials and open a session. Returns the user and a fresh token.
  #[instrument(level = "info", skip(self, password))]
  pub async fn login(&self, username: &str, password: &str) -> Result<(User, String), AuthError> {
    let user = {
      let users = self.users.read().await;
      users
        .values()
        .find(|r| r.user.username == username.trim())
        .filter(|r| r.password_digest == hash_password(&r.salt, password))
        .map(|r| r.user.clone())
        .ok_or(AuthError::InvalidCredentials)?
    };
    let token = new_token();
    let now = Utc::now();
    let mut sessions = self.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, s| s.is_live(now));
    if sessions.len() < before {
      debug!(target: "htmlpractice", pruned = before - sessions.len(), "Expired login sessions pruned");
    }
    sessions.insert(token.clone(), LoginSession { user_id: user.id, issued_at: now });
    drop(sessions);
    info!(target: "htmlpractice", user_id = user.id, "User logged in");
    Ok((user, token))
  }

  /// Returns whether the token was live.
  pub async fn logout(&self, token: &str) -> bool {
    self.sessions.write().await.remove(token).is_some()
  }

  /// The user behind a live token. Expired tokens resolve to nobody.
  pub async fn session_user(&self, token: &str) -> Option<User> {
    let user_id = self
      .sessions
      .read()
      .await
      .get(token)
      .filter(|s| s.is_live(Utc::now()))
      .map(|s| s.user_id)?;
    self.user(user_id).await
  }

  pub async fn user(&self, id: u64) -> Option<User> {
    self.users.read().await.get(&id).map(|r| r.user.clone())
  }

  // --- examples ---

  pub async fn examples(&self, category: Option<&str>) -> Vec<HtmlExample> {
    self
      .examples
      .read()
      .await
      .values()
      .filter(|e| category.map_or(true, |c| e.category == c))
      .cloned()
      .collect()
  }

  pub async fn example(&self, id: u64) -> Option<HtmlExample> {
    self.examples.read().await.get(&id).cloned()
  }

  // --- saved work ---

  #[instrument(level = "debug", skip(self, new), fields(user_id = new.user_id, title = %new.title))]
  pub async fn create_saved_work(&self, new: NewSavedWork) -> SavedWork {
    let id = self.next_saved_id.fetch_add(1, Ordering::Relaxed);
    let work = SavedWork {
      id,
      user_id: new.user_id,
      title: new.title,
      code: new.code,
      created_at: chrono::Utc::now().to_rfc3339(),
      is_public: new.is_public,
    };
    self.saved.write().await.insert(id, work.clone());
    debug!(target: "htmlpractice", id, "Saved work stored");
    work
  }

  pub async fn saved_work(&self, id: u64) -> Option<SavedWork> {
    self.saved.read().await.get(&id).cloned()
  }

  pub async fn saved_work_by_user(&self, user_id: u64) -> Vec<SavedWork> {
    self.saved.read().await.values().filter(|w| w.user_id == user_id).cloned().collect()
  }

  pub async fn delete_saved_work(&self, id: u64) -> Option<SavedWork> {
    self.saved.write().await.remove(&id)
  }
}
