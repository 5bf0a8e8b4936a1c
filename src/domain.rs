//! Domain models: challenges, catalog entries (templates, snippets, examples),
//! users and saved work.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How hard is a challenge?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Beginner,
  Intermediate,
  Advanced,
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Difficulty::Beginner => "beginner",
      Difficulty::Intermediate => "intermediate",
      Difficulty::Advanced => "advanced",
    })
  }
}

impl FromStr for Difficulty {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "beginner" => Ok(Difficulty::Beginner),
      "intermediate" => Ok(Difficulty::Intermediate),
      "advanced" => Ok(Difficulty::Advanced),
      other => Err(format!("unknown difficulty '{other}'")),
    }
  }
}

/// Static definition of a timed exercise.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Challenge {
  pub id: String,
  pub title: String,
  pub description: String,
  pub difficulty: Difficulty,
  pub time_limit_seconds: u32,
  pub starting_code: String,
  /// Literal, case-sensitive fragments that must all appear in a passing solution.
  pub required_substrings: Vec<String>,
  pub hint: String,
}

/// A whole-document starting point. Applying one replaces the editor text.
#[derive(Clone, Debug, Serialize)]
pub struct Template {
  pub id: &'static str,
  pub name: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<&'static str>,
  pub code: &'static str,
}

/// A fragment spliced in at the cursor.
#[derive(Clone, Debug, Serialize)]
pub struct Snippet {
  pub id: &'static str,
  pub name: &'static str,
  pub code: &'static str,
}

/// Read-only example shown in the examples browser and loadable into the editor.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HtmlExample {
  pub id: u64,
  pub title: String,
  pub description: String,
  pub category: String,
  pub code: String,
  #[serde(default = "default_level")]
  pub level: String,
}

fn default_level() -> String {
  "beginner".into()
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct User {
  pub id: u64,
  pub username: String,
}

/// Editor content persisted under a title.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedWork {
  pub id: u64,
  pub user_id: u64,
  pub title: String,
  pub code: String,
  pub created_at: String,
  pub is_public: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn difficulty_parses_case_insensitively() {
    assert_eq!("Beginner".parse::<Difficulty>(), Ok(Difficulty::Beginner));
    assert_eq!(" advanced ".parse::<Difficulty>(), Ok(Difficulty::Advanced));
    assert!("expert".parse::<Difficulty>().is_err());
  }

  #[test]
  fn saved_work_uses_camel_case_on_the_wire() {
    let w = SavedWork {
      id: 1,
      user_id: 7,
      title: "t".into(),
      code: "<p>".into(),
      created_at: "2024-01-01T00:00:00Z".into(),
      is_public: false,
    };
    let v = serde_json::to_value(&w).unwrap();
    assert_eq!(v["userId"], 7);
    assert_eq!(v["isPublic"], false);
    assert_eq!(v["createdAt"], "2024-01-01T00:00:00Z");
  }
}
