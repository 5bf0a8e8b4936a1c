//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Challenge, Difficulty, SavedWork};
use crate::editor::{Document, DocumentStats, Download, Selection, LANGUAGE};
use crate::engine::{ChallengeAttempt, Outcome, Phase, Verdict, EndReason};
use crate::preview::{RenderedFrame, Viewport};
use crate::validator::ValidationIssue;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
  Ping,
  SetText {
    text: String,
  },
  /// Move the caret or select a range; `null` clears it.
  Select {
    #[serde(default)]
    selection: Option<Selection>,
  },
  InsertAtCursor {
    text: String,
  },
  ApplyTemplate {
    #[serde(rename = "templateId")]
    template_id: String,
  },
  InsertSnippet {
    #[serde(rename = "snippetId")]
    snippet_id: String,
  },
  Format,
  Clear,
  Copy,
  Download,
  Save {
    title: String,
  },
  Run,
  SetViewport {
    viewport: Viewport,
  },
  StartChallenge {
    #[serde(rename = "challengeId")]
    challenge_id: String,
  },
  ChallengeEdit {
    text: String,
  },
  ChallengeRun,
  Submit,
  ResetChallenge,
  ChooseNew,
  Hint,
}

/// Which document a render shows.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RenderTarget {
  Editor,
  Challenge,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
  Info,
  Success,
  Warning,
}

/// Messages the server sends over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
  Pong,
  Document {
    text: String,
    cursor: Option<Selection>,
    language: &'static str,
    stats: DocumentStats,
  },
  Validation {
    valid: bool,
    errors: Vec<ValidationIssue>,
  },
  Rendered {
    target: RenderTarget,
    #[serde(flatten)]
    frame: RenderedFrame,
  },
  Clipboard {
    text: String,
  },
  Download {
    #[serde(flatten)]
    file: Download,
  },
  Saved {
    work: SavedWork,
  },
  Challenge {
    phase: Phase,
    attempt: AttemptOut,
  },
  Tick {
    attempt: u64,
    #[serde(rename = "secondsRemaining")]
    seconds_remaining: u32,
  },
  Verdict {
    attempt: u64,
    #[serde(rename = "challengeId")]
    challenge_id: String,
    verdict: Verdict,
    missing: Vec<String>,
    reason: EndReason,
    title: &'static str,
    message: &'static str,
  },
  Hint {
    text: String,
  },
  Idle,
  Notice {
    level: NoticeLevel,
    message: String,
  },
  Error {
    message: String,
  },
}

impl ServerWsMessage {
  pub fn document(doc: &Document, stats: DocumentStats) -> Self {
    ServerWsMessage::Document { text: doc.text.clone(), cursor: doc.cursor, language: LANGUAGE, stats }
  }

  pub fn validation(errors: Vec<ValidationIssue>) -> Self {
    ServerWsMessage::Validation { valid: errors.is_empty(), errors }
  }

  pub fn verdict(o: Outcome) -> Self {
    ServerWsMessage::Verdict {
      attempt: o.attempt,
      challenge_id: o.challenge_id,
      verdict: o.verdict,
      missing: o.missing,
      reason: o.reason,
      title: o.notification.title,
      message: o.notification.message,
    }
  }

  pub fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
    ServerWsMessage::Notice { level, message: message.into() }
  }

  pub fn error(message: impl Into<String>) -> Self {
    ServerWsMessage::Error { message: message.into() }
  }
}

/// DTO used by both WS and HTTP for challenge delivery. Never carries the
/// required substrings or the hint.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeOut {
  pub id: String,
  pub title: String,
  pub description: String,
  pub difficulty: Difficulty,
  pub time_limit_seconds: u32,
  pub starting_code: String,
  pub requirement_count: usize,
}

/// Convert full `Challenge` (internal) to the public DTO.
pub fn to_out(c: &Challenge) -> ChallengeOut {
  ChallengeOut {
    id: c.id.clone(),
    title: c.title.clone(),
    description: c.description.clone(),
    difficulty: c.difficulty,
    time_limit_seconds: c.time_limit_seconds,
    starting_code: c.starting_code.clone(),
    requirement_count: c.required_substrings.len(),
  }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOut {
  pub id: u64,
  pub challenge: ChallengeOut,
  pub candidate_text: String,
  pub seconds_remaining: u32,
  pub timer_running: bool,
  pub verdict: Verdict,
}

pub fn attempt_out(a: &ChallengeAttempt) -> AttemptOut {
  AttemptOut {
    id: a.id,
    challenge: to_out(&a.challenge),
    candidate_text: a.candidate_text.clone(),
    seconds_remaining: a.seconds_remaining,
    timer_running: a.timer_running,
    verdict: a.verdict,
  }
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}

#[derive(Serialize)]
pub struct MessageOut {
  pub message: String,
}

#[derive(Deserialize)]
pub struct ValidateIn {
  pub html: String,
}
#[derive(Serialize)]
pub struct ValidateOut {
  pub valid: bool,
  pub errors: Vec<ValidationIssue>,
}

#[derive(Deserialize)]
pub struct PreviewIn {
  pub html: String,
  #[serde(default)]
  pub viewport: Viewport,
}
#[derive(Serialize)]
pub struct PreviewOut {
  pub frame: String,
  pub viewport: Viewport,
  pub width: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ExamplesQuery {
  pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SnippetQuery {
  pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChallengeQuery {
  pub difficulty: Option<String>,
}

#[derive(Deserialize)]
pub struct CheckIn {
  pub code: String,
}
#[derive(Serialize)]
pub struct CheckOut {
  pub verdict: Verdict,
  pub missing: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveWorkIn {
  pub title: String,
  pub code: String,
  #[serde(default)]
  pub is_public: bool,
}

#[derive(Deserialize)]
pub struct CredentialsIn {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub password: String,
}

#[derive(Serialize)]
pub struct UserOut {
  pub id: u64,
  pub username: String,
}

#[derive(Serialize)]
pub struct LoginOut {
  pub id: u64,
  pub username: String,
  pub token: String,
}

/// Query string of the practice-session socket.
#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
  pub token: Option<String>,
  pub example: Option<u64>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::seeds::seed_challenges;

  #[test]
  fn client_messages_parse_from_tagged_json() {
    let m: ClientWsMessage = serde_json::from_str(r#"{"type":"insert_snippet","snippetId":"table"}"#).unwrap();
    assert!(matches!(m, ClientWsMessage::InsertSnippet { snippet_id } if snippet_id == "table"));

    let m: ClientWsMessage =
      serde_json::from_str(r#"{"type":"select","selection":{"start":{"line":1,"column":2},"end":{"line":1,"column":2}}}"#)
        .unwrap();
    assert!(matches!(m, ClientWsMessage::Select { selection: Some(_) }));

    let m: ClientWsMessage = serde_json::from_str(r#"{"type":"set_viewport","viewport":"mobile"}"#).unwrap();
    assert!(matches!(m, ClientWsMessage::SetViewport { viewport: Viewport::Mobile }));

    assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"launch_missiles"}"#).is_err());
  }

  #[test]
  fn challenge_out_hides_answers() {
    let c = &seed_challenges()[0];
    let v = serde_json::to_value(to_out(c)).unwrap();
    assert_eq!(v["id"], c.id.as_str());
    assert_eq!(v["timeLimitSeconds"], c.time_limit_seconds);
    assert_eq!(v["requirementCount"], c.required_substrings.len());
    assert!(v.get("requiredSubstrings").is_none());
    assert!(v.get("hint").is_none());
  }

  #[test]
  fn server_messages_are_tagged() {
    let v = serde_json::to_value(ServerWsMessage::validation(Vec::new())).unwrap();
    assert_eq!(v["type"], "validation");
    assert_eq!(v["valid"], true);

    let v = serde_json::to_value(ServerWsMessage::Tick { attempt: 2, seconds_remaining: 9 }).unwrap();
    assert_eq!(v["type"], "tick");
    assert_eq!(v["secondsRemaining"], 9);

    let frame = crate::preview::render_once("<p>x</p>", Viewport::Tablet);
    let v = serde_json::to_value(ServerWsMessage::Rendered { target: RenderTarget::Editor, frame }).unwrap();
    assert_eq!(v["type"], "rendered");
    assert_eq!(v["target"], "editor");
    assert_eq!(v["width"], "768px");
  }
}
