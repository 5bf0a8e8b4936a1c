//! Editor surface: the mutable HTML document of a practice session.
//!
//! The surface owns its [`Document`] exclusively. Every mutation (typing,
//! template application, snippet insertion, format, clear) notifies the
//! registered change listeners, in the order the edits happen, with the full
//! new text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::auth::AuthSession;
use crate::domain::{SavedWork, Snippet, Template};
use crate::gateway::{SaveError, SaveGateway};

pub const LANGUAGE: &str = "html";
pub const DOWNLOAD_FILE_NAME: &str = "index.html";
pub const DOWNLOAD_MIME: &str = "text/html";

const INDENT: &str = "  ";
const VOID_ELEMENTS: &[&str] = &[
  "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

static TAG: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9-]*)[^>]*?(/?)>").expect("valid tag regex"));

/// 1-based line and column; columns count characters, not bytes.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
  pub line: u32,
  pub column: u32,
}

impl Position {
  pub fn new(line: u32, column: u32) -> Self {
    Self { line, column }
  }
}

/// A cursor (`start == end`) or a selected range.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Selection {
  pub start: Position,
  pub end: Position,
}

impl Selection {
  pub fn caret(at: Position) -> Self {
    Self { start: at, end: at }
  }
}

/// The text currently held by the editor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
  pub text: String,
  pub cursor: Option<Selection>,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct DocumentStats {
  pub lines: usize,
  pub bytes: usize,
  pub size: String,
}

/// File handed to the client for a download.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Download {
  pub file_name: &'static str,
  pub mime: &'static str,
  pub content: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

/// Somewhere copied text can go.
pub trait Clipboard {
  fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

pub type ChangeListener = Box<dyn FnMut(&str) + Send + Sync>;

pub struct EditorSurface {
  doc: Document,
  listeners: Vec<ChangeListener>,
}

impl std::fmt::Debug for EditorSurface {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("EditorSurface")
      .field("doc", &self.doc)
      .field("listeners", &self.listeners.len())
      .finish()
  }
}

impl EditorSurface {
  /// Mount an editor with an initial value. Mounting does not notify.
  pub fn new(initial: impl Into<String>) -> Self {
    Self { doc: Document { text: initial.into(), cursor: None }, listeners: Vec::new() }
  }

  pub fn text(&self) -> &str {
    &self.doc.text
  }

  pub fn cursor(&self) -> Option<Selection> {
    self.doc.cursor
  }

  pub fn document(&self) -> &Document {
    &self.doc
  }

  /// Register a listener fired after every mutation with the full new text.
  pub fn on_change<F>(&mut self, listener: F)
  where
    F: FnMut(&str) + Send + Sync + 'static,
  {
    self.listeners.push(Box::new(listener));
  }

  /// Move the cursor or select a range. `None` clears it.
  pub fn select(&mut self, selection: Option<Selection>) {
    self.doc.cursor = selection;
  }

  /// Total replace. The cursor is cleared.
  pub fn set_text(&mut self, text: impl Into<String>) {
    self.doc.text = text.into();
    self.doc.cursor = None;
    self.notify();
  }

  /// Splice `s` at the cursor, replacing any selected range. Without a cursor
  /// the text is appended. The cursor ends up right after the inserted text.
  pub fn insert_at_cursor(&mut self, s: &str) {
    let (from, to) = match self.doc.cursor {
      Some(sel) => {
        let a = offset_of(&self.doc.text, sel.start);
        let b = offset_of(&self.doc.text, sel.end);
        (a.min(b), a.max(b))
      }
      None => (self.doc.text.len(), self.doc.text.len()),
    };
    self.doc.text.replace_range(from..to, s);
    let caret = position_at(&self.doc.text, from + s.len());
    self.doc.cursor = Some(Selection::caret(caret));
    self.notify();
  }

  pub fn apply_template(&mut self, template: &Template) {
    debug!(target: "editor", template = template.id, "Applying template");
    self.set_text(template.code);
  }

  pub fn insert_snippet(&mut self, snippet: &Snippet) {
    debug!(target: "editor", snippet = snippet.id, "Inserting snippet");
    self.insert_at_cursor(snippet.code);
  }

  /// Normalize indentation. Returns whether anything changed; only a change
  /// notifies listeners.
  pub fn format(&mut self) -> bool {
    let formatted = format_html(&self.doc.text);
    if formatted == self.doc.text {
      return false;
    }
    self.doc.text = formatted;
    self.doc.cursor = None;
    self.notify();
    true
  }

  pub fn clear(&mut self) {
    self.set_text(String::new());
  }

  pub fn copy_to(&self, clipboard: &mut impl Clipboard) -> Result<(), ClipboardError> {
    clipboard.write_text(&self.doc.text)
  }

  pub fn download(&self) -> Download {
    Download { file_name: DOWNLOAD_FILE_NAME, mime: DOWNLOAD_MIME, content: self.doc.text.clone() }
  }

  pub fn stats(&self) -> DocumentStats {
    let bytes = self.doc.text.len();
    DocumentStats { lines: self.doc.text.split('\n').count(), bytes, size: human_size(bytes) }
  }

  /// Start saving the current text under `title`. The request is detached
  /// from the surface, so editing can continue while it runs, and the document
  /// is left untouched whatever the outcome.
  pub fn save_request(&self, title: &str) -> SaveRequest {
    SaveRequest { title: title.to_string(), text: self.doc.text.clone() }
  }

  fn notify(&mut self) {
    let text = self.doc.text.as_str();
    for listener in self.listeners.iter_mut() {
      listener(text);
    }
  }
}

/// A pending save: the title as typed and the text at the moment it was asked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveRequest {
  title: String,
  text: String,
}

impl SaveRequest {
  /// Auth is checked before the title; private by default.
  #[instrument(level = "info", skip_all)]
  pub async fn submit<G: SaveGateway>(self, auth: &AuthSession, gateway: &G) -> Result<SavedWork, SaveError> {
    if !auth.is_authenticated() {
      return Err(SaveError::AuthRequired);
    }
    let title = self.title.trim();
    if title.is_empty() {
      return Err(SaveError::EmptyTitle);
    }
    gateway.save(auth, title, &self.text, false).await
  }
}

/// Byte offset of a position, clamped to the document.
pub fn offset_of(text: &str, pos: Position) -> usize {
  let line = pos.line.max(1) as usize;
  let column = pos.column.max(1) as usize;

  let mut line_start = 0usize;
  for _ in 1..line {
    match text[line_start..].find('\n') {
      Some(i) => line_start += i + 1,
      None => return text.len(),
    }
  }
  let line_end = text[line_start..].find('\n').map(|i| line_start + i).unwrap_or(text.len());
  let line_text = &text[line_start..line_end];
  line_text
    .char_indices()
    .nth(column - 1)
    .map(|(i, _)| line_start + i)
    .unwrap_or(line_end)
}

/// Position of a byte offset (which must sit on a char boundary).
pub fn position_at(text: &str, offset: usize) -> Position {
  let before = &text[..offset.min(text.len())];
  let line = before.matches('\n').count() + 1;
  let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
  let column = before[line_start..].chars().count() + 1;
  Position::new(line as u32, column as u32)
}

fn human_size(bytes: usize) -> String {
  if bytes < 1024 {
    format!("{bytes} B")
  } else if bytes < 1_048_576 {
    format!("{:.1} KB", bytes as f64 / 1024.0)
  } else {
    format!("{:.1} MB", bytes as f64 / 1_048_576.0)
  }
}

/// Re-indent by element nesting, two spaces per level. Inside `<style>` and
/// `<script>` braces nest as well. Runs of blank lines collapse to one and
/// trailing whitespace is dropped.
pub fn format_html(text: &str) -> String {
  let mut out: Vec<String> = Vec::new();
  let mut depth: i64 = 0;
  let mut in_raw = false;

  for raw_line in text.lines() {
    let line = raw_line.trim();
    if line.is_empty() {
      if out.last().is_some_and(|l| !l.is_empty()) {
        out.push(String::new());
      }
      continue;
    }

    let leading_close = line.starts_with("</") || (in_raw && line.starts_with('}'));
    if leading_close {
      depth = (depth - 1).max(0);
    }
    out.push(format!("{}{}", INDENT.repeat(depth as usize), line));

    let mut net = tag_delta(line);
    if in_raw {
      net += line.matches('{').count() as i64 - line.matches('}').count() as i64;
    }
    if leading_close {
      net += 1;
    }
    depth = (depth + net).max(0);

    let lower = line.to_ascii_lowercase();
    if lower.contains("</style") || lower.contains("</script") {
      in_raw = false;
    } else if lower.contains("<style") || lower.contains("<script") {
      in_raw = true;
    }
  }

  while out.last().is_some_and(|l| l.is_empty()) {
    out.pop();
  }
  let mut formatted = out.join("\n");
  if text.ends_with('\n') && !formatted.is_empty() {
    formatted.push('\n');
  }
  formatted
}

fn tag_delta(line: &str) -> i64 {
  TAG
    .captures_iter(line)
    .map(|cap| {
      let closing = !cap[1].is_empty();
      let self_closing = !cap[3].is_empty();
      let name = cap[2].to_ascii_lowercase();
      if closing {
        -1
      } else if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
        0
      } else {
        1
      }
    })
    .sum()
}
