//! Practice session: one editor, two preview surfaces and one challenge engine
//! driven by a single client.
//!
//! A session is owned by exactly one task. It never writes to the socket
//! itself; everything it has to say goes into an outbox channel, which keeps
//! the change listener, the countdown and the command handlers on the same
//! ordered stream. Saves run on their own task and report back through the
//! same outbox, so a slow gateway never holds up edits or the countdown.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::auth::AuthSession;
use crate::catalog::ChallengeCatalog;
use crate::domain::{SavedWork, Snippet, Template};
use crate::editor::{Clipboard, ClipboardError, EditorSurface};
use crate::engine::{ChallengeEngine, Tick, TickResult};
use crate::gateway::{SaveError, SaveGateway};
use crate::preview::PreviewSurface;
use crate::protocol::{attempt_out, ClientWsMessage, NoticeLevel, RenderTarget, ServerWsMessage};
use crate::validator::validate;

pub type Outbox = UnboundedSender<ServerWsMessage>;

/// Read-only catalogs a session draws from.
#[derive(Clone)]
pub struct SessionCatalogs {
  pub challenges: Arc<dyn ChallengeCatalog>,
  pub templates: Arc<Vec<Template>>,
  pub snippets: Arc<Vec<Snippet>>,
}

/// Copy target that hands the text to the client.
struct OutboxClipboard<'a>(&'a Outbox);

impl Clipboard for OutboxClipboard<'_> {
  fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
    self
      .0
      .send(ServerWsMessage::Clipboard { text: text.to_string() })
      .map_err(|_| ClipboardError("client went away".into()))
  }
}

pub struct PracticeSession<G: SaveGateway + Clone + 'static> {
  id: Uuid,
  auth: AuthSession,
  editor: EditorSurface,
  preview: PreviewSurface,
  challenge_preview: PreviewSurface,
  engine: ChallengeEngine,
  catalogs: SessionCatalogs,
  gateway: G,
  outbox: Outbox,
}

impl<G: SaveGateway + Clone + 'static> PracticeSession<G> {
  /// `ticks` feeds the engine's countdowns; the owner reads the other end and
  /// calls [`on_tick`](Self::on_tick).
  pub fn new(
    auth: AuthSession,
    initial_text: String,
    catalogs: SessionCatalogs,
    gateway: G,
    ticks: UnboundedSender<Tick>,
    outbox: Outbox,
  ) -> Self {
    let mut editor = EditorSurface::new(initial_text);
    let listener_outbox = outbox.clone();
    editor.on_change(move |text| {
      let _ = listener_outbox.send(ServerWsMessage::validation(validate(text)));
    });
    let id = Uuid::new_v4();
    info!(target: "session", %id, user_id = ?auth.user_id(), "Practice session created");
    Self {
      id,
      auth,
      editor,
      preview: PreviewSurface::new(),
      challenge_preview: PreviewSurface::new(),
      engine: ChallengeEngine::new(ticks),
      catalogs,
      gateway,
      outbox,
    }
  }

  pub fn id(&self) -> Uuid {
    self.id
  }

  #[cfg(test)]
  pub fn editor(&self) -> &EditorSurface {
    &self.editor
  }

  #[cfg(test)]
  pub fn engine(&self) -> &ChallengeEngine {
    &self.engine
  }

  /// Initial state for a freshly connected client: document, validation and
  /// the mount render.
  pub fn mount(&mut self) {
    self.push_document();
    self.send(ServerWsMessage::validation(validate(self.editor.text())));
    self.render_editor();
  }

  #[instrument(level = "debug", skip(self, msg), fields(session = %self.id))]
  pub fn handle(&mut self, msg: ClientWsMessage) {
    match msg {
      ClientWsMessage::Ping => self.send(ServerWsMessage::Pong),

      // --- editor ---
      ClientWsMessage::SetText { text } => {
        self.editor.set_text(text);
        self.push_document();
      }
      ClientWsMessage::Select { selection } => {
        self.editor.select(selection);
        self.push_document();
      }
      ClientWsMessage::InsertAtCursor { text } => {
        self.editor.insert_at_cursor(&text);
        self.push_document();
      }
      ClientWsMessage::ApplyTemplate { template_id } => {
        match self.catalogs.templates.iter().find(|t| t.id == template_id) {
          Some(t) => {
            self.editor.apply_template(t);
            self.push_document();
          }
          None => self.send(ServerWsMessage::error(format!("Unknown template '{template_id}'"))),
        }
      }
      ClientWsMessage::InsertSnippet { snippet_id } => {
        match self.catalogs.snippets.iter().find(|s| s.id == snippet_id) {
          Some(s) => {
            self.editor.insert_snippet(s);
            self.push_document();
          }
          None => self.send(ServerWsMessage::error(format!("Unknown snippet '{snippet_id}'"))),
        }
      }
      ClientWsMessage::Format => {
        if self.editor.format() {
          self.push_document();
        } else {
          self.send(ServerWsMessage::notice(NoticeLevel::Info, "Code is already formatted."));
        }
      }
      ClientWsMessage::Clear => {
        self.editor.clear();
        self.push_document();
      }
      ClientWsMessage::Copy => {
        let result = self.editor.copy_to(&mut OutboxClipboard(&self.outbox));
        match result {
          Ok(()) => self.send(ServerWsMessage::notice(NoticeLevel::Success, "Code copied to clipboard!")),
          Err(e) => warn!(target: "session", session = %self.id, error = %e, "Copy failed"),
        }
      }
      ClientWsMessage::Download => {
        let file = self.editor.download();
        self.send(ServerWsMessage::Download { file });
      }
      ClientWsMessage::Save { title } => self.save(&title),
      ClientWsMessage::Run => self.render_editor(),
      ClientWsMessage::SetViewport { viewport } => {
        self.preview.set_viewport(viewport);
        self.challenge_preview.set_viewport(viewport);
        if let Some(frame) = self.preview.snapshot() {
          self.send(ServerWsMessage::Rendered { target: RenderTarget::Editor, frame });
        }
        if self.engine.attempt().is_some() {
          if let Some(frame) = self.challenge_preview.snapshot() {
            self.send(ServerWsMessage::Rendered { target: RenderTarget::Challenge, frame });
          }
        }
      }

      // --- challenge ---
      ClientWsMessage::StartChallenge { challenge_id } => match self.catalogs.challenges.get(&challenge_id) {
        Some(challenge) => {
          self.engine.start(challenge);
          self.challenge_preview = fresh_preview(&self.challenge_preview);
          self.push_challenge();
        }
        None => self.send(ServerWsMessage::error(format!("Unknown challenge '{challenge_id}'"))),
      },
      ClientWsMessage::ChallengeEdit { text } => {
        if let Err(e) = self.engine.edit(text) {
          self.send(ServerWsMessage::notice(NoticeLevel::Warning, e.to_string()));
        }
      }
      ClientWsMessage::ChallengeRun => {
        let candidate = self.engine.attempt().map(|a| a.candidate_text.clone());
        match candidate {
          Some(text) => {
            let frame = self.challenge_preview.render(&text);
            self.send(ServerWsMessage::Rendered { target: RenderTarget::Challenge, frame });
          }
          None => self.send(ServerWsMessage::notice(NoticeLevel::Warning, "Select a challenge first.")),
        }
      }
      ClientWsMessage::Submit => match self.engine.submit() {
        Ok(outcome) => {
          self.send(ServerWsMessage::verdict(outcome));
          self.push_challenge();
        }
        Err(e) => self.send(ServerWsMessage::notice(NoticeLevel::Warning, e.to_string())),
      },
      ClientWsMessage::ResetChallenge => match self.engine.reset() {
        Ok(_) => {
          self.challenge_preview = fresh_preview(&self.challenge_preview);
          self.push_challenge();
        }
        Err(e) => self.send(ServerWsMessage::notice(NoticeLevel::Warning, e.to_string())),
      },
      ClientWsMessage::ChooseNew => {
        self.engine.choose_new();
        self.challenge_preview = fresh_preview(&self.challenge_preview);
        self.send(ServerWsMessage::Idle);
      }
      ClientWsMessage::Hint => match self.engine.hint() {
        Some(text) => self.send(ServerWsMessage::Hint { text: text.to_string() }),
        None => self.send(ServerWsMessage::notice(NoticeLevel::Info, "Hints are available after a failed attempt.")),
      },
    }
  }

  /// Feed one countdown tick through the engine.
  pub fn on_tick(&mut self, tick: Tick) {
    match self.engine.on_tick(tick) {
      TickResult::Ignored => {}
      TickResult::Counted { seconds_remaining } => {
        self.send(ServerWsMessage::Tick { attempt: tick.attempt, seconds_remaining });
      }
      TickResult::Ended(outcome) => {
        self.send(ServerWsMessage::verdict(outcome));
        self.push_challenge();
      }
    }
  }

  /// Snapshot the document and hand it to the gateway on a separate task.
  fn save(&self, title: &str) {
    let request = self.editor.save_request(title);
    let auth = self.auth.clone();
    let gateway = self.gateway.clone();
    let outbox = self.outbox.clone();
    let session = self.id;
    tokio::spawn(async move {
      let result = request.submit(&auth, &gateway).await;
      for msg in save_replies(session, result) {
        if outbox.send(msg).is_err() {
          debug!(target: "session", %session, "Outbox closed before the save finished");
          break;
        }
      }
    });
  }

  fn render_editor(&mut self) {
    let frame = self.preview.render(self.editor.text());
    self.send(ServerWsMessage::Rendered { target: RenderTarget::Editor, frame });
  }

  fn push_document(&self) {
    self.send(ServerWsMessage::document(self.editor.document(), self.editor.stats()));
  }

  fn push_challenge(&self) {
    if let Some(attempt) = self.engine.attempt() {
      self.send(ServerWsMessage::Challenge { phase: self.engine.phase(), attempt: attempt_out(attempt) });
    }
  }

  fn send(&self, msg: ServerWsMessage) {
    if self.outbox.send(msg).is_err() {
      debug!(target: "session", session = %self.id, "Outbox closed; dropping message");
    }
  }
}

impl<G: SaveGateway + Clone + 'static> Drop for PracticeSession<G> {
  fn drop(&mut self) {
    info!(target: "session", id = %self.id, "Practice session closed");
  }
}

fn save_replies(session: Uuid, result: Result<SavedWork, SaveError>) -> Vec<ServerWsMessage> {
  match result {
    Ok(work) => {
      info!(target: "session", %session, id = work.id, "Work saved from session");
      vec![
        ServerWsMessage::Saved { work },
        ServerWsMessage::notice(NoticeLevel::Success, "Your work has been saved successfully!"),
      ]
    }
    Err(e @ (SaveError::EmptyTitle | SaveError::AuthRequired)) => {
      vec![ServerWsMessage::notice(NoticeLevel::Warning, e.to_string())]
    }
    Err(e) => {
      warn!(target: "session", %session, error = %e, "Save failed");
      vec![ServerWsMessage::error(format!("Failed to save your work: {e}"))]
    }
  }
}

fn fresh_preview(old: &PreviewSurface) -> PreviewSurface {
  let mut surface = PreviewSurface::new();
  surface.set_viewport(old.viewport());
  surface
}
