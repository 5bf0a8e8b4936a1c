//! Timed challenge state machine.
//!
//! ```text
//!   Idle --start--> Running --submit / timeout--> Ended
//!    ^                 |                            |
//!    +---choose_new----+----------choose_new--------+
//!                      ^                            |
//!                      +-----------reset------------+
//! ```
//!
//! The engine never sleeps. A [`Countdown`] task pushes one [`Tick`] per second
//! into the owner's channel and the owner feeds them back through
//! [`ChallengeEngine::on_tick`]. Only one countdown exists at a time: it is
//! aborted on every terminal transition, on restart and when the engine is
//! dropped. Ticks that were already queued for an older attempt are ignored.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info};

use crate::domain::Challenge;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

pub type AttemptId = u64;

/// One elapsed second for a given attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
  pub attempt: AttemptId,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
  Pending,
  Success,
  Failed,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Idle,
  Running,
  Ended,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
  Submitted,
  TimedOut,
}

/// Runtime state of one user working one challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeAttempt {
  pub id: AttemptId,
  pub challenge: Challenge,
  pub candidate_text: String,
  pub seconds_remaining: u32,
  pub timer_running: bool,
  pub verdict: Verdict,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
  pub verdict: Verdict,
  /// Required fragments absent from the candidate, in catalog order.
  pub missing: Vec<String>,
}

/// User-facing message emitted when an attempt ends.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct Notification {
  pub title: &'static str,
  pub message: &'static str,
}

impl Notification {
  pub fn for_verdict(verdict: Verdict) -> Self {
    match verdict {
      Verdict::Success => Notification {
        title: "Challenge Completed!",
        message: "Great job! You've successfully completed the challenge.",
      },
      _ => Notification {
        title: "Challenge Failed",
        message: "Your solution doesn't meet all the requirements. Try again?",
      },
    }
  }
}

/// Result of a terminal transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
  pub attempt: AttemptId,
  pub challenge_id: String,
  pub verdict: Verdict,
  pub missing: Vec<String>,
  pub reason: EndReason,
  pub notification: Notification,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickResult {
  /// Stale tick or no running attempt.
  Ignored,
  Counted { seconds_remaining: u32 },
  Ended(Outcome),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
  #[error("no challenge selected")]
  NoActiveChallenge,
  #[error("the challenge is not running")]
  NotRunning,
  #[error("the challenge has not ended yet")]
  NotEnded,
}

/// Judges a candidate against a challenge.
pub type Evaluator = fn(&Challenge, &str) -> Evaluation;

/// Literal, case-sensitive, order-independent containment check.
pub fn evaluate(challenge: &Challenge, candidate: &str) -> Evaluation {
  let missing: Vec<String> = challenge
    .required_substrings
    .iter()
    .filter(|needle| !candidate.contains(needle.as_str()))
    .cloned()
    .collect();
  let verdict = if missing.is_empty() { Verdict::Success } else { Verdict::Failed };
  Evaluation { verdict, missing }
}

/// Handle to a running one-second ticker. Dropping it aborts the task.
#[derive(Debug)]
pub struct Countdown {
  attempt: AttemptId,
  task: JoinHandle<()>,
}

impl Countdown {
  /// Spawn a ticker on the current tokio runtime. The first tick arrives one
  /// `period` after the call.
  pub fn start(attempt: AttemptId, period: Duration, ticks: mpsc::UnboundedSender<Tick>) -> Self {
    let task = tokio::spawn(async move {
      let mut interval = interval_at(Instant::now() + period, period);
      loop {
        interval.tick().await;
        if ticks.send(Tick { attempt }).is_err() {
          break;
        }
      }
    });
    Self { attempt, task }
  }

  pub fn attempt(&self) -> AttemptId {
    self.attempt
  }

  pub fn cancel(self) {
    self.task.abort();
  }
}

impl Drop for Countdown {
  fn drop(&mut self) {
    self.task.abort();
  }
}

pub struct ChallengeEngine {
  attempt: Option<ChallengeAttempt>,
  countdown: Option<Countdown>,
  ticks: mpsc::UnboundedSender<Tick>,
  next_id: AttemptId,
  evaluator: Evaluator,
}

impl ChallengeEngine {
  /// `ticks` is where countdowns deliver their ticks; the owner reads the
  /// other end and calls [`on_tick`](Self::on_tick).
  pub fn new(ticks: mpsc::UnboundedSender<Tick>) -> Self {
    Self { attempt: None, countdown: None, ticks, next_id: 0, evaluator: evaluate }
  }

  /// Swap the evaluation function. Defaults to [`evaluate`].
  #[cfg(test)]
  pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
    self.evaluator = evaluator;
    self
  }

  pub fn phase(&self) -> Phase {
    match &self.attempt {
      None => Phase::Idle,
      Some(a) if a.timer_running => Phase::Running,
      Some(_) => Phase::Ended,
    }
  }

  pub fn attempt(&self) -> Option<&ChallengeAttempt> {
    self.attempt.as_ref()
  }

  /// Attempt id of the live countdown, if any.
  #[cfg(test)]
  pub fn countdown_attempt(&self) -> Option<AttemptId> {
    self.countdown.as_ref().map(Countdown::attempt)
  }

  /// Begin a fresh attempt. Any previous attempt is discarded and its
  /// countdown aborted first. Must be called inside a tokio runtime.
  pub fn start(&mut self, challenge: Challenge) -> &ChallengeAttempt {
    debug_assert!(challenge.time_limit_seconds > 0, "challenge {} has no time limit", challenge.id);
    self.stop_countdown();
    if let Some(old) = self.attempt.take() {
      debug!(target: "challenge", attempt = old.id, "Discarding previous attempt");
    }

    self.next_id += 1;
    let id = self.next_id;
    info!(target: "challenge", attempt = id, challenge = %challenge.id, limit = challenge.time_limit_seconds, "Challenge started");
    self.countdown = Some(Countdown::start(id, TICK_PERIOD, self.ticks.clone()));
    self.attempt.insert(ChallengeAttempt {
      id,
      candidate_text: challenge.starting_code.clone(),
      seconds_remaining: challenge.time_limit_seconds,
      timer_running: true,
      verdict: Verdict::Pending,
      challenge,
    })
  }

  /// Replace the candidate text. Allowed while an attempt exists; an ended
  /// attempt keeps its verdict.
  pub fn edit(&mut self, text: impl Into<String>) -> Result<(), EngineError> {
    let attempt = self.attempt.as_mut().ok_or(EngineError::NoActiveChallenge)?;
    attempt.candidate_text = text.into();
    Ok(())
  }

  pub fn on_tick(&mut self, tick: Tick) -> TickResult {
    let Some(attempt) = self.attempt.as_mut() else {
      return TickResult::Ignored;
    };
    if attempt.id != tick.attempt || !attempt.timer_running {
      debug!(target: "challenge", tick = tick.attempt, "Ignoring stale tick");
      return TickResult::Ignored;
    }

    attempt.seconds_remaining = attempt.seconds_remaining.saturating_sub(1);
    if attempt.seconds_remaining > 0 {
      return TickResult::Counted { seconds_remaining: attempt.seconds_remaining };
    }
    match self.finish(EndReason::TimedOut) {
      Some(outcome) => TickResult::Ended(outcome),
      None => TickResult::Ignored,
    }
  }

  /// Evaluate now, bypassing the remaining time.
  pub fn submit(&mut self) -> Result<Outcome, EngineError> {
    match self.phase() {
      Phase::Idle => Err(EngineError::NoActiveChallenge),
      Phase::Ended => Err(EngineError::NotRunning),
      Phase::Running => self.finish(EndReason::Submitted).ok_or(EngineError::NotRunning),
    }
  }

  /// Re-run the same challenge from scratch after it ended.
  pub fn reset(&mut self) -> Result<&ChallengeAttempt, EngineError> {
    match self.phase() {
      Phase::Idle => Err(EngineError::NoActiveChallenge),
      Phase::Running => Err(EngineError::NotEnded),
      Phase::Ended => {
        let challenge = match self.attempt.take() {
          Some(a) => a.challenge,
          None => return Err(EngineError::NoActiveChallenge),
        };
        Ok(self.start(challenge))
      }
    }
  }

  /// Back to the challenge list. Returns whether an attempt was discarded.
  pub fn choose_new(&mut self) -> bool {
    self.stop_countdown();
    let discarded = self.attempt.take();
    if let Some(a) = &discarded {
      info!(target: "challenge", attempt = a.id, "Attempt discarded");
    }
    discarded.is_some()
  }

  /// The hint is disclosed only after a failed attempt.
  pub fn hint(&self) -> Option<&str> {
    self
      .attempt
      .as_ref()
      .filter(|a| a.verdict == Verdict::Failed)
      .map(|a| a.challenge.hint.as_str())
  }

  fn stop_countdown(&mut self) {
    if let Some(c) = self.countdown.take() {
      debug!(target: "challenge", attempt = c.attempt(), "Countdown cancelled");
      c.cancel();
    }
  }

  fn finish(&mut self, reason: EndReason) -> Option<Outcome> {
    self.stop_countdown();
    let evaluator = self.evaluator;
    let attempt = self.attempt.as_mut()?;

    // A panicking evaluation must not leave the attempt stuck in Running.
    let evaluation = panic::catch_unwind(AssertUnwindSafe(|| evaluator(&attempt.challenge, &attempt.candidate_text)))
      .unwrap_or_else(|_| {
        error!(target: "challenge", attempt = attempt.id, "Evaluation panicked; marking attempt as failed");
        Evaluation { verdict: Verdict::Failed, missing: Vec::new() }
      });

    attempt.timer_running = false;
    attempt.verdict = evaluation.verdict;
    info!(
      target: "challenge",
      attempt = attempt.id,
      challenge = %attempt.challenge.id,
      verdict = ?evaluation.verdict,
      reason = ?reason,
      seconds_remaining = attempt.seconds_remaining,
      "Challenge ended"
    );
    Some(Outcome {
      attempt: attempt.id,
      challenge_id: attempt.challenge.id.clone(),
      verdict: evaluation.verdict,
      missing: evaluation.missing,
      reason,
      notification: Notification::for_verdict(evaluation.verdict),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Difficulty;
  use tokio::sync::mpsc::error::TryRecvError;

  fn nav_challenge(limit: u32) -> Challenge {
    Challenge {
      id: "nav".into(),
      title: "Navigation Menu".into(),
      description: "Build a nav".into(),
      difficulty: Difficulty::Intermediate,
      time_limit_seconds: limit,
      starting_code: "<!-- start -->".into(),
      required_substrings: vec!["<nav".into(), "<ul".into(), "<li".into(), "</nav>".into()],
      hint: "Use nav > ul > li".into(),
    }
  }

  fn other_challenge(limit: u32) -> Challenge {
    Challenge {
      id: "other".into(),
      required_substrings: vec!["<p".into()],
      ..nav_challenge(limit)
    }
  }

  fn engine() -> (ChallengeEngine, mpsc::UnboundedReceiver<Tick>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChallengeEngine::new(tx), rx)
  }

  #[test]
  fn evaluation_requires_every_fragment() {
    let c = nav_challenge(60);
    let ok = evaluate(&c, "<nav><ul><li>Home</li></ul></nav>");
    assert_eq!(ok.verdict, Verdict::Success);
    assert!(ok.missing.is_empty());

    let bad = evaluate(&c, "<ul><li>Home</li></ul>");
    assert_eq!(bad.verdict, Verdict::Failed);
    assert_eq!(bad.missing, vec!["<nav".to_string(), "</nav>".to_string()]);
  }

  #[test]
  fn evaluation_is_case_sensitive_and_literal() {
    let c = nav_challenge(60);
    assert_eq!(evaluate(&c, "<NAV><UL><LI></LI></UL></NAV>").verdict, Verdict::Failed);
    let mut dotted = nav_challenge(60);
    dotted.required_substrings = vec!["a.c".into()];
    assert_eq!(evaluate(&dotted, "abc").verdict, Verdict::Failed);
    assert_eq!(evaluate(&dotted, "xa.cx").verdict, Verdict::Success);
  }

  #[test]
  fn evaluation_ignores_order() {
    let c = nav_challenge(60);
    assert_eq!(evaluate(&c, "</nav><li><ul><nav").verdict, Verdict::Success);
  }

  #[tokio::test(start_paused = true)]
  async fn start_initializes_attempt() {
    let (mut e, _rx) = engine();
    assert_eq!(e.phase(), Phase::Idle);
    let a = e.start(nav_challenge(420)).clone();
    assert_eq!(a.candidate_text, "<!-- start -->");
    assert_eq!(a.seconds_remaining, 420);
    assert!(a.timer_running);
    assert_eq!(a.verdict, Verdict::Pending);
    assert_eq!(e.phase(), Phase::Running);
    assert_eq!(e.countdown_attempt(), Some(a.id));
  }

  #[tokio::test(start_paused = true)]
  async fn submit_passes_with_all_fragments() {
    let (mut e, _rx) = engine();
    e.start(nav_challenge(420));
    e.edit("<nav><ul><li>Home</li></ul></nav>").unwrap();
    let outcome = e.submit().unwrap();
    assert_eq!(outcome.verdict, Verdict::Success);
    assert_eq!(outcome.reason, EndReason::Submitted);
    assert_eq!(outcome.notification.title, "Challenge Completed!");
    assert_eq!(e.phase(), Phase::Ended);
    assert_eq!(e.countdown_attempt(), None);
    assert_eq!(e.hint(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn failed_submit_discloses_hint() {
    let (mut e, _rx) = engine();
    e.start(nav_challenge(420));
    e.edit("<ul><li>Home</li></ul>").unwrap();
    let outcome = e.submit().unwrap();
    assert_eq!(outcome.verdict, Verdict::Failed);
    assert_eq!(outcome.notification.title, "Challenge Failed");
    assert_eq!(e.hint(), Some("Use nav > ul > li"));
  }

  #[tokio::test(start_paused = true)]
  async fn timeout_auto_evaluates() {
    let (mut e, mut rx) = engine();
    let id = e.start(nav_challenge(1)).id;
    e.edit("<nav><ul><li>x</li></ul></nav>").unwrap();

    // The paused clock auto-advances to the first tick.
    let tick = rx.recv().await.expect("tick");
    assert_eq!(tick, Tick { attempt: id });
    match e.on_tick(tick) {
      TickResult::Ended(o) => {
        assert_eq!(o.reason, EndReason::TimedOut);
        assert_eq!(o.verdict, Verdict::Success);
      }
      other => panic!("expected end, got {other:?}"),
    }
    assert_eq!(e.phase(), Phase::Ended);
    let a = e.attempt().unwrap();
    assert_eq!(a.seconds_remaining, 0);
    assert!(!a.timer_running);
  }

  #[tokio::test(start_paused = true)]
  async fn countdown_decrements_once_per_second() {
    let (mut e, mut rx) = engine();
    e.start(nav_challenge(3));
    let t1 = rx.recv().await.unwrap();
    assert_eq!(e.on_tick(t1), TickResult::Counted { seconds_remaining: 2 });
    let t2 = rx.recv().await.unwrap();
    assert_eq!(e.on_tick(t2), TickResult::Counted { seconds_remaining: 1 });
    let t3 = rx.recv().await.unwrap();
    assert!(matches!(e.on_tick(t3), TickResult::Ended(_)));
  }

  #[tokio::test(start_paused = true)]
  async fn restart_leaves_exactly_one_countdown() {
    let (mut e, mut rx) = engine();
    let a = e.start(nav_challenge(5)).id;
    tokio::time::advance(Duration::from_millis(500)).await;
    let b = e.start(other_challenge(5)).id;
    assert_ne!(a, b);
    assert_eq!(e.countdown_attempt(), Some(b));

    for _ in 0..3 {
      let tick = rx.recv().await.unwrap();
      assert_eq!(tick.attempt, b, "a cancelled countdown kept ticking");
      assert!(matches!(e.on_tick(tick), TickResult::Counted { .. }));
    }
    // A stale tick for the first attempt changes nothing.
    let before = e.attempt().unwrap().seconds_remaining;
    assert_eq!(e.on_tick(Tick { attempt: a }), TickResult::Ignored);
    assert_eq!(e.attempt().unwrap().seconds_remaining, before);
    assert_eq!(e.attempt().unwrap().challenge.id, "other");
  }

  #[tokio::test(start_paused = true)]
  async fn cancelled_countdown_stops_ticking() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let countdown = Countdown::start(7, TICK_PERIOD, tx.clone());
    countdown.cancel();
    tokio::time::advance(Duration::from_secs(5)).await;
    tokio::task::yield_now().await;
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    drop(tx);
  }

  #[tokio::test(start_paused = true)]
  async fn dropping_the_engine_cancels_its_countdown() {
    let (mut e, mut rx) = engine();
    e.start(nav_challenge(10));
    drop(e);
    tokio::time::advance(Duration::from_secs(3)).await;
    tokio::task::yield_now().await;
    // The only sender lived in the engine and the aborted task.
    assert_eq!(rx.recv().await, None);
  }

  #[tokio::test(start_paused = true)]
  async fn submit_stops_the_countdown() {
    let (mut e, mut rx) = engine();
    let id = e.start(nav_challenge(10)).id;
    e.submit().unwrap();
    tokio::time::advance(Duration::from_secs(3)).await;
    tokio::task::yield_now().await;
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(e.on_tick(Tick { attempt: id }), TickResult::Ignored);
  }

  #[tokio::test(start_paused = true)]
  async fn reset_only_from_ended() {
    let (mut e, _rx) = engine();
    assert_eq!(e.reset().err(), Some(EngineError::NoActiveChallenge));
    let first = e.start(nav_challenge(30)).id;
    assert_eq!(e.reset().err(), Some(EngineError::NotEnded));

    e.edit("changed").unwrap();
    e.submit().unwrap();
    let again = e.reset().unwrap().clone();
    assert_ne!(again.id, first);
    assert_eq!(again.candidate_text, "<!-- start -->");
    assert_eq!(again.seconds_remaining, 30);
    assert_eq!(again.verdict, Verdict::Pending);
    assert_eq!(e.phase(), Phase::Running);
  }

  #[tokio::test(start_paused = true)]
  async fn submit_outside_running_is_rejected() {
    let (mut e, _rx) = engine();
    assert_eq!(e.submit().err(), Some(EngineError::NoActiveChallenge));
    e.start(nav_challenge(30));
    e.submit().unwrap();
    assert_eq!(e.submit().err(), Some(EngineError::NotRunning));
  }

  fn exploding(_: &Challenge, _: &str) -> Evaluation {
    panic!("evaluator blew up")
  }

  #[tokio::test(start_paused = true)]
  async fn panicking_evaluation_fails_the_attempt() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut e = ChallengeEngine::new(tx).with_evaluator(exploding);

    e.start(nav_challenge(30));
    e.edit("<nav><ul><li>x</li></ul></nav>").unwrap();
    let outcome = e.submit().unwrap();
    assert_eq!(outcome.verdict, Verdict::Failed);
    assert_eq!(outcome.reason, EndReason::Submitted);
    assert_eq!(e.phase(), Phase::Ended);
    assert_eq!(e.countdown_attempt(), None);

    let id = e.start(nav_challenge(1)).id;
    let tick = rx.recv().await.unwrap();
    assert_eq!(tick.attempt, id);
    match e.on_tick(tick) {
      TickResult::Ended(o) => {
        assert_eq!(o.verdict, Verdict::Failed);
        assert_eq!(o.reason, EndReason::TimedOut);
      }
      other => panic!("expected end, got {other:?}"),
    }
    assert_eq!(e.phase(), Phase::Ended);
    assert_eq!(e.attempt().unwrap().verdict, Verdict::Failed);
    assert_eq!(e.hint(), Some("Use nav > ul > li"));
  }

  #[tokio::test(start_paused = true)]
  async fn choose_new_returns_to_idle() {
    let (mut e, _rx) = engine();
    assert!(!e.choose_new());
    e.start(nav_challenge(30));
    assert!(e.choose_new());
    assert_eq!(e.phase(), Phase::Idle);
    assert_eq!(e.countdown_attempt(), None);
    assert_eq!(e.edit("x").err(), Some(EngineError::NoActiveChallenge));
  }
}
