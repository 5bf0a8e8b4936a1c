//! Application state shared by every handler and practice session.
//!
//! This module owns:
//!   - the in-memory store (users, login sessions, examples, saved work)
//!   - the read-only challenge catalog
//!   - the template and snippet catalogs
//!   - the local save gateway behind the HTTP API
//!   - the gateway practice sessions save through (local or remote)
//!
//! Built once at startup from built-in seeds plus the optional TOML config.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::catalog::{ChallengeCatalog, StaticCatalog};
use crate::config::{load_app_config_from_env, save_gateway_url_from_env, AppConfig};
use crate::domain::{Snippet, Template};
use crate::gateway::{SessionGateway, StoreGateway};
use crate::seeds::{seed_examples, snippets, templates};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<Store>,
  pub catalog: Arc<dyn ChallengeCatalog>,
  pub templates: Arc<Vec<Template>>,
  pub snippets: Arc<Vec<Snippet>>,
  pub gateway: StoreGateway,
  pub session_gateway: SessionGateway,
}

impl AppState {
  /// Build state from env: load config, seed catalogs and the example store.
  #[instrument(level = "info", skip_all)]
  pub fn new() -> Self {
    let cfg = load_app_config_from_env();
    Self::from_config(cfg.as_ref()).with_session_saves_to(save_gateway_url_from_env().as_deref())
  }

  pub fn from_config(cfg: Option<&AppConfig>) -> Self {
    let catalog = StaticCatalog::build(cfg);

    // Config examples first; built-in seeds never overwrite an existing id.
    let mut examples = cfg.map(|c| c.examples.clone()).unwrap_or_default();
    for seed in seed_examples() {
      if examples.iter().any(|e| e.id == seed.id) {
        warn!(target: "htmlpractice", id = seed.id, "Config example shadows a built-in example");
        continue;
      }
      examples.push(seed);
    }
    let store = Arc::new(Store::with_examples(examples));

    let gateway = StoreGateway::new(store.clone());
    let state = Self {
      session_gateway: SessionGateway::Local(gateway.clone()),
      gateway,
      store,
      catalog: Arc::new(catalog),
      templates: Arc::new(templates()),
      snippets: Arc::new(snippets()),
    };
    info!(
      target: "htmlpractice",
      templates = state.templates.len(),
      snippets = state.snippets.len(),
      "Application state ready"
    );
    state
  }

  /// Point practice-session saves at a remote server. `None` keeps them local.
  pub fn with_session_saves_to(mut self, url: Option<&str>) -> Self {
    self.session_gateway = SessionGateway::select(self.gateway.clone(), url);
    self
  }

  /// Seeds only, no environment lookups.
  #[cfg(test)]
  pub fn for_tests() -> Self {
    Self::from_config(None)
  }

  /// Case-insensitive substring match on the snippet name. An empty query
  /// returns everything.
  pub fn search_snippets(&self, query: &str) -> Vec<Snippet> {
    let needle = query.trim().to_lowercase();
    self
      .snippets
      .iter()
      .filter(|s| needle.is_empty() || s.name.to_lowercase().contains(&needle))
      .cloned()
      .collect()
  }
}
