//! Loading optional app configuration (extra challenges + examples) from TOML.
//!
//! ```toml
//! [[challenges]]
//! id = "tables-1"
//! title = "Build a table"
//! description = "A table with a header row"
//! difficulty = "intermediate"
//! time_limit_seconds = 300
//! required_substrings = ["<table", "<th", "</table>"]
//! hint = "Use <th> inside the first <tr>."
//!
//! [[examples]]
//! id = 100
//! title = "Blockquote"
//! description = "Quoting a source"
//! category = "text"
//! code = "<blockquote>...</blockquote>"
//! ```

use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{Challenge, Difficulty, HtmlExample};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub challenges: Vec<ChallengeCfg>,
  #[serde(default)]
  pub examples: Vec<HtmlExample>,
}

/// Challenge entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ChallengeCfg {
  #[serde(default)] pub id: Option<String>,
  pub title: String,
  #[serde(default)] pub description: String,
  pub difficulty: String,
  pub time_limit_seconds: u32,
  #[serde(default)] pub starting_code: String,
  #[serde(default)] pub required_substrings: Vec<String>,
  #[serde(default)] pub hint: String,
}

impl ChallengeCfg {
  /// Validate and convert. Entries without an id get a random one.
  pub fn into_challenge(self) -> Result<Challenge, String> {
    let difficulty: Difficulty = self.difficulty.parse()?;
    if self.time_limit_seconds == 0 {
      return Err("time_limit_seconds must be positive".into());
    }
    let required_substrings: Vec<String> =
      self.required_substrings.into_iter().filter(|s| !s.is_empty()).collect();
    if required_substrings.is_empty() {
      return Err("required_substrings must not be empty".into());
    }
    Ok(Challenge {
      id: self.id.filter(|s| !s.trim().is_empty()).unwrap_or_else(|| Uuid::new_v4().to_string()),
      title: self.title,
      description: self.description,
      difficulty,
      time_limit_seconds: self.time_limit_seconds,
      starting_code: self.starting_code,
      required_substrings,
      hint: self.hint,
    })
  }
}

pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

/// Attempt to load `AppConfig` from APP_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("APP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "htmlpractice", %path, challenges = cfg.challenges.len(), examples = cfg.examples.len(), "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "htmlpractice", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "htmlpractice", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

/// Directory served as the SPA frontend (STATIC_DIR, default `./static`).
pub fn static_dir_from_env() -> String {
  std::env::var("STATIC_DIR").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "./static".into())
}

/// Base URL of a remote server that practice sessions save to
/// (SAVE_GATEWAY_URL). Unset or blank keeps saves in-process.
pub fn save_gateway_url_from_env() -> Option<String> {
  std::env::var("SAVE_GATEWAY_URL").ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = r#"
[[challenges]]
id = "tables-1"
title = "Build a table"
difficulty = "Intermediate"
time_limit_seconds = 300
required_substrings = ["<table", "<th", "</table>"]
hint = "Use <th> inside the first <tr>."

[[challenges]]
title = "No id"
difficulty = "beginner"
time_limit_seconds = 60
required_substrings = ["<p"]

[[examples]]
id = 100
title = "Blockquote"
description = "Quoting a source"
category = "text"
code = "<blockquote>hi</blockquote>"
"#;

  #[test]
  fn parses_challenges_and_examples() {
    let cfg = parse_config(SAMPLE).unwrap();
    assert_eq!(cfg.challenges.len(), 2);
    assert_eq!(cfg.examples.len(), 1);
    assert_eq!(cfg.examples[0].level, "beginner");

    let c = cfg.challenges[0].clone().into_challenge().unwrap();
    assert_eq!(c.id, "tables-1");
    assert_eq!(c.difficulty, Difficulty::Intermediate);
    assert_eq!(c.required_substrings.len(), 3);

    let generated = cfg.challenges[1].clone().into_challenge().unwrap();
    assert!(Uuid::parse_str(&generated.id).is_ok());
  }

  #[test]
  fn rejects_unplayable_entries() {
    let mut cc = parse_config(SAMPLE).unwrap().challenges.remove(0);
    cc.required_substrings = vec![String::new()];
    assert!(cc.clone().into_challenge().is_err());
    cc.required_substrings = vec!["<p".into()];
    cc.time_limit_seconds = 0;
    assert!(cc.clone().into_challenge().is_err());
    cc.time_limit_seconds = 10;
    cc.difficulty = "expert".into();
    assert!(cc.into_challenge().is_err());
  }

  #[test]
  fn malformed_toml_is_an_error() {
    assert!(parse_config("[[challenges]]\ntitle = 3").is_err());
  }
}
