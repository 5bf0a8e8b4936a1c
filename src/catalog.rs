//! Read-only challenge catalog.
//!
//! The engine and handlers see challenges only through [`ChallengeCatalog`];
//! where they come from (built-in seeds, TOML bank) is decided at startup.

use std::collections::HashMap;

use tracing::{error, info, instrument};

use crate::config::AppConfig;
use crate::domain::{Challenge, Difficulty};
use crate::seeds::seed_challenges;

pub trait ChallengeCatalog: Send + Sync {
  /// All challenges, optionally filtered by difficulty, in catalog order.
  fn list(&self, difficulty: Option<Difficulty>) -> Vec<Challenge>;

  fn get(&self, id: &str) -> Option<Challenge>;
}

/// Immutable in-memory catalog.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
  order: Vec<String>,
  by_id: HashMap<String, Challenge>,
}

impl StaticCatalog {
  /// Insert in order; the first entry for an id wins.
  pub fn from_challenges(challenges: impl IntoIterator<Item = Challenge>) -> Self {
    let mut catalog = Self::default();
    for c in challenges {
      if catalog.by_id.contains_key(&c.id) {
        continue;
      }
      catalog.order.push(c.id.clone());
      catalog.by_id.insert(c.id.clone(), c);
    }
    catalog
  }

  /// Config bank first, then the built-in seeds. Seeds never overwrite a
  /// configured id.
  #[instrument(level = "info", skip_all)]
  pub fn build(cfg: Option<&AppConfig>) -> Self {
    let mut bank = Vec::new();
    if let Some(cfg) = cfg {
      for cc in &cfg.challenges {
        match cc.clone().into_challenge() {
          Ok(c) => bank.push(c),
          Err(reason) => {
            error!(target: "challenge", id = ?cc.id, %reason, "Skipping bank challenge");
          }
        }
      }
    }
    let from_bank = bank.len();
    let catalog = Self::from_challenges(bank.into_iter().chain(seed_challenges()));

    let mut count_by_diff: HashMap<Difficulty, usize> = HashMap::new();
    for c in catalog.by_id.values() {
      *count_by_diff.entry(c.difficulty).or_default() += 1;
    }
    for (diff, count) in count_by_diff {
      info!(target: "challenge", %diff, count, "Startup challenge inventory");
    }
    info!(target: "challenge", total = catalog.len(), from_bank, "Challenge catalog ready");
    catalog
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }
}

impl ChallengeCatalog for StaticCatalog {
  fn list(&self, difficulty: Option<Difficulty>) -> Vec<Challenge> {
    self
      .order
      .iter()
      .filter_map(|id| self.by_id.get(id))
      .filter(|c| difficulty.map_or(true, |d| c.difficulty == d))
      .cloned()
      .collect()
  }

  fn get(&self, id: &str) -> Option<Challenge> {
    self.by_id.get(id).cloned()
  }
}
