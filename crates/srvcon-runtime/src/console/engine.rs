//! Console assembly engine.
//!
//! Turns queued fragments from independent writers into one ordered
//! transcript without ever splicing two sources into the same line.
//!
//! # Ordering
//!
//! At most one line is open at any time and it belongs to one source. A
//! fragment from a different source never joins it. Instead the engine looks
//! ahead in the queue for the owner's continuation and merges it first:
//!
//! ```text
//! queue:  [stdout "partial"] [admin "cmd\n"] [stdout " rest\n"]
//!                                 │               ▲
//!                                 └─ lookahead ───┘
//! output: partial rest
//!         [     alice] cmd
//! ```
//!
//! When no continuation is queued the fragment is deferred to a later cycle.
//! Once it has waited longer than the holdoff, the open line is cut with a
//! visible break glyph and the fragment starts its own line.

use std::time::{Duration, Instant};

use srvcon_core::{ConsoleFlush, DEFAULT_HOLDOFF_MS, Fragment, LineType, SourceKey};
use tracing::{trace, warn};

use super::marker::MarkerClock;
use super::render::{OutputBuffers, Segment, emit_text};

/// Ownership and completion state of the most recent line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastLineState {
    pub source_key: Option<SourceKey>,
    pub line_type: Option<LineType>,
    pub context: Option<String>,
    pub terminated: bool,
}

impl LastLineState {
    /// State before any output: no owner, nothing open.
    pub const fn closed() -> Self {
        Self {
            source_key: None,
            line_type: None,
            context: None,
            terminated: true,
        }
    }

    fn started_by(fragment: &Fragment) -> Self {
        Self {
            source_key: Some(fragment.source_key.clone()),
            line_type: Some(fragment.line_type),
            context: fragment.context.clone(),
            terminated: fragment.ends_line(),
        }
    }

    pub const fn is_open(&self) -> bool {
        !self.terminated
    }

    pub fn is_owned_by(&self, key: &SourceKey) -> bool {
        self.source_key.as_ref() == Some(key)
    }
}

impl Default for LastLineState {
    fn default() -> Self {
        Self::closed()
    }
}

/// Result of one assembly cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Output to dispatch, `None` when every buffer stayed empty.
    pub flush: Option<ConsoleFlush>,
    /// Fragments carried over to the next cycle.
    pub deferred: usize,
    /// Lines cut short by the holdoff this cycle.
    pub forced_breaks: usize,
    /// Whether a timestamp marker was spliced into the web buffer.
    pub marker_inserted: bool,
}

/// Single-writer assembly state for one logical console.
#[derive(Debug)]
pub struct AssemblyEngine {
    holdoff: Duration,
    line: LastLineState,
    marker: MarkerClock,
    pending: Vec<Fragment>,
    out: OutputBuffers,
}

impl AssemblyEngine {
    pub fn new(holdoff: Duration) -> Self {
        Self {
            holdoff,
            line: LastLineState::closed(),
            marker: MarkerClock::new(),
            pending: Vec::new(),
            out: OutputBuffers::default(),
        }
    }

    /// Run one flush cycle over the carried-over fragments followed by
    /// `incoming`, in arrival order.
    pub fn assemble(
        &mut self,
        incoming: Vec<Fragment>,
        now: Instant,
        unix_seconds: u64,
    ) -> CycleOutcome {
        let mut outcome = CycleOutcome::default();
        self.marker.begin_cycle(unix_seconds);

        // Consumed entries are tombstoned so indices stay stable while the
        // lookahead splits or removes fragments further down the queue.
        let mut slots: Vec<Option<Fragment>> = std::mem::take(&mut self.pending)
            .into_iter()
            .chain(incoming)
            .map(Some)
            .collect();

        for i in 0..slots.len() {
            let Some(mut fragment) = slots[i].take() else {
                continue;
            };
            if fragment.is_empty() {
                continue;
            }

            if self.line.is_open() && !self.line.is_owned_by(&fragment.source_key) {
                // A bare terminator closes the open line whoever sends it.
                if fragment.text == "\n" {
                    self.out.push(Segment::LineEnd);
                    self.line.terminated = true;
                    continue;
                }
                if fragment.is_stale(now, self.holdoff) {
                    self.force_break(&fragment);
                    outcome.forced_breaks += 1;
                } else {
                    self.merge_ahead(&mut slots[i + 1..]);
                    if self.line.is_open() {
                        trace!(source = %fragment.source_key, "Deferring fragment behind open line");
                        fragment.pending_since.get_or_insert(now);
                        self.pending.push(fragment);
                        continue;
                    }
                }
            }

            if self.line.is_open() {
                self.continue_line(&fragment.text);
            } else {
                self.start_line(&fragment);
            }
        }

        outcome.marker_inserted = self.marker.finish_cycle(&mut self.out.web);
        outcome.deferred = self.pending.len();
        if !self.out.is_empty() {
            outcome.flush = Some(self.out.take());
        }
        outcome
    }

    /// Merge queued continuations of the open line until it terminates or
    /// the owner has nothing more queued.
    fn merge_ahead(&mut self, ahead: &mut [Option<Fragment>]) {
        let Some(owner) = self.line.source_key.clone() else {
            return;
        };

        let mut from = 0;
        while self.line.is_open() {
            let Some(idx) = ahead[from..]
                .iter()
                .position(|slot| slot.as_ref().is_some_and(|f| f.source_key == owner))
                .map(|pos| pos + from)
            else {
                break;
            };

            // Only the part up to the first line break joins the open line;
            // the remainder keeps its place in the queue.
            let split_at = ahead[idx].as_ref().and_then(|f| {
                f.text
                    .find('\n')
                    .filter(|&pos| pos + 1 < f.text.len())
            });
            let head = match split_at {
                Some(pos) => match ahead[idx].as_mut() {
                    Some(f) => f.text.drain(..=pos).collect::<String>(),
                    None => break,
                },
                None => match ahead[idx].take() {
                    Some(f) => f.text,
                    None => break,
                },
            };
            self.continue_line(&head);
            from = idx;
        }
    }

    fn start_line(&mut self, fragment: &Fragment) {
        self.marker.claim(self.out.web.len());

        // A bare terminator never opens a styled segment.
        if fragment.text == "\n" {
            self.out.push(Segment::LineEnd);
        } else {
            emit_text(
                &mut self.out,
                fragment.line_type,
                fragment.context.as_deref(),
                &fragment.text,
                true,
            );
        }
        self.line = LastLineState::started_by(fragment);
    }

    fn continue_line(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let Some(line_type) = self.line.line_type else {
            return;
        };
        self.line.terminated = emit_text(
            &mut self.out,
            line_type,
            self.line.context.as_deref(),
            text,
            false,
        );
    }

    fn force_break(&mut self, waiting: &Fragment) {
        warn!(
            owner = ?self.line.source_key.as_ref().map(SourceKey::as_str),
            waiting = %waiting.source_key,
            holdoff = ?self.holdoff,
            "Holdoff expired, forcing console line break"
        );
        self.out.push(Segment::ForcedBreak);
        self.line.terminated = true;
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn line_state(&self) -> &LastLineState {
        &self.line
    }

    pub fn holdoff(&self) -> Duration {
        self.holdoff
    }

    /// Drop carried-over fragments. Used on shutdown.
    pub fn discard_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }
}

impl Default for AssemblyEngine {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_HOLDOFF_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::marker::marker_token;

    const T0: u64 = 1_700_000_000;

    fn frag(line_type: LineType, text: &str, context: Option<&str>, at: Instant) -> Fragment {
        Fragment::new(line_type, text, context.map(str::to_string), at)
    }

    #[test]
    fn test_same_source_chunks_join_one_line() {
        let mut engine = AssemblyEngine::default();
        let now = Instant::now();
        let outcome = engine.assemble(
            vec![
                frag(LineType::StdOut, "A", None, now),
                frag(LineType::StdOut, "B\n", None, now),
                frag(LineType::StdErr, "E\n", None, now),
            ],
            now,
            T0,
        );

        let flush = outcome.flush.unwrap();
        assert_eq!(flush.file, "AB\n[    STDERR] E\n");
        assert_eq!(outcome.deferred, 0);
        assert!(!engine.has_pending());
    }

    #[test]
    fn test_lookahead_merges_owner_before_other_source() {
        let mut engine = AssemblyEngine::default();
        let now = Instant::now();
        let outcome = engine.assemble(
            vec![
                frag(LineType::StdOut, "partial", None, now),
                frag(LineType::AdminCmd, "cmd\n", Some("alice"), now),
                frag(LineType::StdOut, " rest\n", None, now),
            ],
            now,
            T0,
        );

        assert_eq!(outcome.flush.unwrap().file, "partial rest\n[     alice] cmd\n");
    }

    #[test]
    fn test_lookahead_splits_at_first_line_break() {
        let mut engine = AssemblyEngine::default();
        let now = Instant::now();
        let outcome = engine.assemble(
            vec![
                frag(LineType::StdOut, "one", None, now),
                frag(LineType::SystemCmd, "sys\n", None, now),
                frag(LineType::StdOut, " two\nthree\n", None, now),
            ],
            now,
            T0,
        );

        assert_eq!(
            outcome.flush.unwrap().file,
            "one two\n[    SYSTEM] sys\nthree\n"
        );
    }

    #[test]
    fn test_unmatched_fragment_is_deferred_then_merged() {
        let mut engine = AssemblyEngine::default();
        let now = Instant::now();

        let first = engine.assemble(
            vec![
                frag(LineType::StdOut, "partial", None, now),
                frag(LineType::AdminCmd, "cmd\n", Some("alice"), now),
            ],
            now,
            T0,
        );
        assert_eq!(first.flush.unwrap().file, "partial");
        assert_eq!(first.deferred, 1);
        assert!(engine.line_state().is_open());

        let later = now + Duration::from_millis(250);
        let second = engine.assemble(
            vec![frag(LineType::StdOut, " rest\n", None, later)],
            later,
            T0,
        );
        assert_eq!(second.flush.unwrap().file, " rest\n[     alice] cmd\n");
        assert_eq!(second.deferred, 0);
    }

    #[test]
    fn test_holdoff_forces_break() {
        let mut engine = AssemblyEngine::new(Duration::from_millis(2500));
        let now = Instant::now();

        engine.assemble(
            vec![
                frag(LineType::StdOut, "stuck", None, now),
                frag(LineType::StdErr, "late\n", None, now),
            ],
            now,
            T0,
        );

        // Not yet stale.
        let at_limit = now + Duration::from_millis(2500);
        let waiting = engine.assemble(Vec::new(), at_limit, T0 + 2);
        assert!(waiting.flush.is_none());
        assert_eq!(waiting.deferred, 1);

        let after = now + Duration::from_millis(2600);
        let outcome = engine.assemble(Vec::new(), after, T0 + 2);
        assert_eq!(outcome.forced_breaks, 1);
        let flush = outcome.flush.unwrap();
        assert_eq!(flush.file, "\u{23ce}\n[    STDERR] late\n");
        assert!(flush.web.contains('\u{23ce}'));
        assert!(flush.terminal.contains('\u{23ce}'));
        assert!(!engine.has_pending());
    }

    #[test]
    fn test_deferred_fragments_keep_arrival_order() {
        let mut engine = AssemblyEngine::default();
        let now = Instant::now();
        engine.assemble(
            vec![
                frag(LineType::StdOut, "open", None, now),
                frag(LineType::AdminCmd, "first\n", Some("a"), now),
                frag(LineType::AdminCmd, "second\n", Some("b"), now),
            ],
            now,
            T0,
        );
        assert_eq!(engine.pending_len(), 2);

        let outcome = engine.assemble(
            vec![frag(LineType::StdOut, "\n", None, now)],
            now,
            T0,
        );
        assert_eq!(
            outcome.flush.unwrap().file,
            "\n[         a] first\n[         b] second\n"
        );
    }

    #[test]
    fn test_empty_fragments_are_noops() {
        let mut engine = AssemblyEngine::default();
        let now = Instant::now();
        let outcome = engine.assemble(vec![frag(LineType::StdOut, "", None, now)], now, T0);
        assert!(outcome.flush.is_none());
        assert!(!engine.line_state().is_open());
    }

    #[test]
    fn test_bare_terminator_has_no_prefix() {
        let mut engine = AssemblyEngine::default();
        let now = Instant::now();
        let outcome = engine.assemble(vec![frag(LineType::StdErr, "\n", None, now)], now, T0);
        assert_eq!(outcome.flush.unwrap().file, "\n");
    }

    #[test]
    fn test_bare_terminator_closes_own_open_line() {
        let mut engine = AssemblyEngine::default();
        let now = Instant::now();
        let outcome = engine.assemble(
            vec![
                frag(LineType::StdErr, "oops", None, now),
                frag(LineType::StdErr, "\n", None, now),
            ],
            now,
            T0,
        );
        assert_eq!(outcome.flush.unwrap().file, "[    STDERR] oops\n");
        assert!(!engine.line_state().is_open());
    }

    #[test]
    fn test_bare_terminator_from_other_source_closes_line() {
        let mut engine = AssemblyEngine::default();
        let now = Instant::now();
        let outcome = engine.assemble(
            vec![
                frag(LineType::StdOut, "prompt> ", None, now),
                frag(LineType::StdErr, "\n", None, now),
            ],
            now,
            T0,
        );

        assert_eq!(outcome.flush.unwrap().file, "prompt> \n");
        assert_eq!(outcome.deferred, 0);
        assert_eq!(outcome.forced_breaks, 0);
        assert!(!engine.has_pending());
        assert!(!engine.line_state().is_open());

        // The next fragment starts a fresh line of its own.
        let later = now + Duration::from_millis(2600);
        let outcome = engine.assemble(
            vec![frag(LineType::StdErr, "late\n", None, later)],
            later,
            T0 + 2,
        );
        assert_eq!(outcome.flush.unwrap().file, "[    STDERR] late\n");
    }

    #[test]
    fn test_marker_precedes_first_new_line() {
        let mut engine = AssemblyEngine::default();
        let now = Instant::now();
        let outcome = engine.assemble(
            vec![
                frag(LineType::StdOut, "a\n", None, now),
                frag(LineType::StdOut, "b\n", None, now),
            ],
            now,
            T0,
        );
        assert!(outcome.marker_inserted);
        let flush = outcome.flush.unwrap();
        assert_eq!(flush.web, format!("{}a\nb\n", marker_token(T0)));
        assert_eq!(flush.file, "a\nb\n");
    }

    #[test]
    fn test_marker_deferred_until_a_line_starts() {
        let mut engine = AssemblyEngine::default();
        let now = Instant::now();
        engine.assemble(vec![frag(LineType::StdOut, "open", None, now)], now, T0);

        // New second, but only a continuation arrives.
        let cont = engine.assemble(vec![frag(LineType::StdOut, " more", None, now)], now, T0 + 1);
        assert!(!cont.marker_inserted);
        assert_eq!(cont.flush.unwrap().web, " more");

        let next = engine.assemble(
            vec![
                frag(LineType::StdOut, "\n", None, now),
                frag(LineType::StdOut, "fresh\n", None, now),
            ],
            now,
            T0 + 1,
        );
        assert!(next.marker_inserted);
        assert_eq!(next.flush.unwrap().web, format!("\n{}fresh\n", marker_token(T0 + 1)));
    }
}
