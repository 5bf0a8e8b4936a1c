//! Preview renderer: turns raw HTML into an isolated frame.
//!
//! The rendered document is embedded as the `srcdoc` of a sandboxed iframe, so
//! its scripts and styles run in their own browsing context and never touch the
//! host page. Every render replaces the frame wholesale; nothing is patched.
//!
//! Renders are issued as tickets. A ticket carries a monotonically increasing
//! generation, and committing a ticket older than the newest one is a no-op, so
//! a slow render can never overwrite a later one.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Presentational width constraint on the frame. Never alters the content.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Viewport {
  #[default]
  Desktop,
  Tablet,
  Mobile,
}

impl Viewport {
  /// CSS width of the frame.
  pub fn css_width(self) -> &'static str {
    match self {
      Viewport::Desktop => "100%",
      Viewport::Tablet => "768px",
      Viewport::Mobile => "375px",
    }
  }
}

/// Snapshot of what the surface currently shows.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct RenderedFrame {
  pub generation: u64,
  pub viewport: Viewport,
  pub width: &'static str,
  /// Complete `<iframe>` element to drop into the host page.
  pub frame: String,
}

/// Handle for a render in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTicket {
  generation: u64,
}

/// Exclusively owned render surface.
#[derive(Debug, Default)]
pub struct PreviewSurface {
  viewport: Viewport,
  issued: u64,
  // Generation and escaped document of the last committed render.
  current: Option<(u64, String)>,
}

impl PreviewSurface {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn viewport(&self) -> Viewport {
    self.viewport
  }

  /// Change the width constraint; the rendered document stays as is.
  pub fn set_viewport(&mut self, viewport: Viewport) {
    self.viewport = viewport;
  }

  /// Synchronous render: issue and commit in one step.
  #[instrument(level = "debug", skip(self, html), fields(html_len = html.len()))]
  pub fn render(&mut self, html: &str) -> RenderedFrame {
    let ticket = self.begin();
    self.commit(ticket, html);
    // The ticket just issued is the newest, so the commit cannot be stale.
    self.snapshot().unwrap_or_else(|| self.blank())
  }

  /// Reserve a slot for a render. Later tickets supersede earlier ones.
  pub fn begin(&mut self) -> RenderTicket {
    self.issued += 1;
    RenderTicket { generation: self.issued }
  }

  /// Install `html` as the whole surface content if `ticket` is still the
  /// newest render. Returns false when the result was stale and discarded.
  pub fn commit(&mut self, ticket: RenderTicket, html: &str) -> bool {
    if ticket.generation != self.issued {
      debug!(target: "preview", stale = ticket.generation, newest = self.issued, "Discarding stale render");
      return false;
    }
    self.current = Some((ticket.generation, escape_attr(html)));
    true
  }

  /// Current frame, if anything has been rendered yet.
  pub fn snapshot(&self) -> Option<RenderedFrame> {
    self.current.as_ref().map(|(generation, srcdoc)| RenderedFrame {
      generation: *generation,
      viewport: self.viewport,
      width: self.viewport.css_width(),
      frame: frame_markup(srcdoc, self.viewport),
    })
  }

  fn blank(&self) -> RenderedFrame {
    RenderedFrame {
      generation: 0,
      viewport: self.viewport,
      width: self.viewport.css_width(),
      frame: frame_markup("", self.viewport),
    }
  }
}

/// Stateless one-shot render used by the HTTP preview endpoint.
pub fn render_once(html: &str, viewport: Viewport) -> RenderedFrame {
  let mut surface = PreviewSurface::new();
  surface.set_viewport(viewport);
  surface.render(html)
}

fn frame_markup(srcdoc: &str, viewport: Viewport) -> String {
  format!(
    "<iframe title=\"HTML Preview\" sandbox=\"allow-same-origin\" referrerpolicy=\"no-referrer\" style=\"border:0;height:100%;width:{}\" srcdoc=\"{}\"></iframe>",
    viewport.css_width(),
    srcdoc
  )
}

/// Escape text for use inside a double-quoted HTML attribute.
pub fn escape_attr(s: &str) -> String {
  let mut out = String::with_capacity(s.len() + s.len() / 8);
  for ch in s.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '"' => out.push_str("&quot;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      _ => out.push(ch),
    }
  }
  out
}
