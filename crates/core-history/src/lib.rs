//! Undo/redo ledger over document snapshots.
//!
//! The history is a stack of `(text, pasted ranges, selection)` snapshots
//! plus a cursor index. Entries behind the cursor are undo steps, entries
//! past it are redo steps; recording after a rewind prunes the redo branch
//! (no branching history). Rapid small edits coalesce into the tip entry so
//! a typing burst undoes as one step.
//!
//! Restoring an entry is the caller's job: `undo`/`redo` only move the
//! cursor and hand back the snapshot. Callers must apply it through a path
//! that does not re-record (an explicit apply-from-history mode), or every
//! undo would immediately push itself back onto the stack.
//!
//! Timestamps are injected by the caller, never sampled here, so coalescing
//! is deterministic under test.

use core_edit::Selection;
use core_ranges::PastedRangeSet;
use std::time::{Duration, Instant};
use tracing::trace;

/// Maximum number of snapshots retained; pushing beyond evicts the oldest.
pub const HISTORY_MAX: usize = 200;

/// Default window inside which consecutive small edits coalesce.
pub const DEFAULT_COALESCE_WINDOW: Duration = Duration::from_millis(1000);

/// One restorable document state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub text: String,
    /// Snapshot copy; the live set keeps evolving after the record.
    pub pasted: PastedRangeSet,
    pub selection: Selection,
}

#[derive(Debug)]
pub struct EditHistory {
    entries: Vec<HistoryEntry>,
    /// Index of the current entry; meaningful only while `entries` is
    /// non-empty (the empty vector is the "no history" state).
    cursor: usize,
    last_record_at: Option<Instant>,
    coalesce_window: Duration,
    max_depth: usize,
    coalesced: u64,
    dedupe_skipped: u64,
}

impl EditHistory {
    pub fn new(coalesce_window: Duration, max_depth: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            last_record_at: None,
            coalesce_window,
            max_depth: max_depth.max(1),
            coalesced: 0,
            dedupe_skipped: 0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_COALESCE_WINDOW, HISTORY_MAX)
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.cursor + 1 < self.entries.len()
    }

    /// Entry the document currently reflects, if any.
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    /// Number of records absorbed into an existing tip entry.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    /// Number of records skipped because they matched the tip exactly.
    pub fn dedupe_skipped(&self) -> u64 {
        self.dedupe_skipped
    }

    /// Record a new state.
    ///
    /// Coalesces (overwrites the tip in place) when all of: the cursor is at
    /// the tip, a previous entry exists beneath it, `now` falls within the
    /// coalesce window of the last record, and the char-count delta between
    /// the new text and the tip's text is at most 1. Otherwise any redo
    /// branch past the cursor is discarded and the entry is pushed; the
    /// stack is trimmed from the bottom past `max_depth`.
    pub fn record(&mut self, entry: HistoryEntry, now: Instant) {
        if self.entries.is_empty() {
            self.entries.push(entry);
            self.cursor = 0;
            self.last_record_at = Some(now);
            trace!(target: "history", depth = 1, "record_seed");
            return;
        }

        let at_tip = self.cursor == self.entries.len() - 1;

        if at_tip && self.entries[self.cursor] == entry {
            self.dedupe_skipped += 1;
            trace!(target: "history", cursor = self.cursor, "record_dedupe_skip");
            return;
        }

        let within_window = self
            .last_record_at
            .is_some_and(|t| now.duration_since(t) < self.coalesce_window);
        let small_delta =
            char_count_delta(&self.entries[self.cursor].text, &entry.text) <= 1;

        if at_tip && self.cursor > 0 && within_window && small_delta {
            self.entries[self.cursor] = entry;
            self.coalesced += 1;
            self.last_record_at = Some(now);
            trace!(target: "history", cursor = self.cursor, "record_coalesce");
            return;
        }

        if !at_tip {
            let dropped = self.entries.len() - (self.cursor + 1);
            self.entries.truncate(self.cursor + 1);
            trace!(target: "history", dropped, "redo_branch_pruned");
        }
        self.entries.push(entry);
        self.cursor = self.entries.len() - 1;
        if self.entries.len() > self.max_depth {
            self.entries.remove(0);
            self.cursor -= 1;
            trace!(target: "history", "oldest_entry_evicted");
        }
        self.last_record_at = Some(now);
        trace!(target: "history", depth = self.entries.len(), cursor = self.cursor, "record_push");
    }

    /// Step back and return the snapshot to restore; `None` at the bottom.
    /// Resets the coalescing clock so a burst after navigation starts a
    /// fresh undo step.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.last_record_at = None;
        trace!(target: "history", cursor = self.cursor, "undo");
        Some(&self.entries[self.cursor])
    }

    /// Step forward and return the snapshot to restore; `None` at the tip.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.last_record_at = None;
        trace!(target: "history", cursor = self.cursor, "redo");
        Some(&self.entries[self.cursor])
    }
}

fn char_count_delta(a: &str, b: &str) -> usize {
    let ca = a.chars().count();
    let cb = b.chars().count();
    ca.abs_diff(cb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_ranges::{PastedRangeSet, Range};

    fn entry(text: &str, caret: usize) -> HistoryEntry {
        HistoryEntry {
            text: text.to_string(),
            pasted: PastedRangeSet::new(),
            selection: Selection::caret(caret),
        }
    }

    fn history() -> EditHistory {
        EditHistory::new(Duration::from_millis(500), HISTORY_MAX)
    }

    #[test]
    fn rapid_single_char_burst_is_one_undo_step() {
        let mut h = history();
        let t0 = Instant::now();
        h.record(entry("", 0), t0);
        let mut text = String::new();
        for (i, ch) in ['h', 'e', 'l', 'l', 'o'].into_iter().enumerate() {
            text.push(ch);
            h.record(
                entry(&text, text.len()),
                t0 + Duration::from_millis(50 * (i as u64 + 1)),
            );
        }
        // Seed plus one coalesced burst entry.
        assert_eq!(h.depth(), 2);
        assert_eq!(h.coalesced(), 4);
        let restored = h.undo().unwrap();
        assert_eq!(restored.text, "");
        assert_eq!(restored.selection, Selection::caret(0));
        assert!(h.undo().is_none());
    }

    #[test]
    fn slow_edits_do_not_coalesce() {
        let mut h = history();
        let t0 = Instant::now();
        h.record(entry("", 0), t0);
        h.record(entry("a", 1), t0 + Duration::from_millis(100));
        h.record(entry("ab", 2), t0 + Duration::from_secs(10));
        assert_eq!(h.depth(), 3);
    }

    #[test]
    fn large_delta_does_not_coalesce() {
        let mut h = history();
        let t0 = Instant::now();
        h.record(entry("", 0), t0);
        h.record(entry("a", 1), t0 + Duration::from_millis(50));
        // A paste-sized jump breaks the burst even inside the window.
        h.record(entry("a pasted block", 14), t0 + Duration::from_millis(100));
        assert_eq!(h.depth(), 3);
    }

    #[test]
    fn multibyte_char_still_coalesces() {
        let mut h = history();
        let t0 = Instant::now();
        h.record(entry("", 0), t0);
        h.record(entry("é", 2), t0 + Duration::from_millis(50));
        h.record(entry("éé", 4), t0 + Duration::from_millis(100));
        assert_eq!(h.depth(), 2);
    }

    #[test]
    fn edit_after_undo_prunes_redo_branch() {
        let mut h = history();
        let t0 = Instant::now();
        h.record(entry("", 0), t0);
        h.record(entry("one", 3), t0 + Duration::from_secs(2));
        h.record(entry("two", 3), t0 + Duration::from_secs(4));
        assert!(h.undo().is_some());
        assert!(h.can_redo());
        h.record(entry("three", 5), t0 + Duration::from_secs(6));
        assert!(!h.can_redo());
        assert!(h.redo().is_none());
        assert_eq!(h.current().unwrap().text, "three");
    }

    #[test]
    fn undo_then_redo_round_trips() {
        let mut h = history();
        let t0 = Instant::now();
        h.record(entry("", 0), t0);
        h.record(entry("abc", 3), t0 + Duration::from_secs(2));
        assert_eq!(h.undo().unwrap().text, "");
        assert_eq!(h.redo().unwrap().text, "abc");
        assert!(h.redo().is_none());
    }

    #[test]
    fn selection_restored_exactly_not_text_end() {
        let mut h = history();
        let t0 = Instant::now();
        h.record(
            HistoryEntry {
                text: "hello world".into(),
                pasted: PastedRangeSet::new(),
                selection: Selection::new(2, 7),
            },
            t0,
        );
        h.record(entry("hello", 5), t0 + Duration::from_secs(2));
        let restored = h.undo().unwrap();
        assert_eq!(restored.selection, Selection::new(2, 7));
    }

    #[test]
    fn pasted_ranges_snapshot_travels_with_entry() {
        let mut h = history();
        let t0 = Instant::now();
        let pasted =
            PastedRangeSet::from_ranges(vec![Range { start: 0, end: 5 }]);
        h.record(
            HistoryEntry {
                text: "paste".into(),
                pasted: pasted.clone(),
                selection: Selection::caret(5),
            },
            t0,
        );
        h.record(entry("", 0), t0 + Duration::from_secs(2));
        assert_eq!(h.undo().unwrap().pasted, pasted);
    }

    #[test]
    fn identical_record_is_skipped() {
        let mut h = history();
        let t0 = Instant::now();
        h.record(entry("same", 4), t0);
        h.record(entry("same", 4), t0 + Duration::from_secs(5));
        assert_eq!(h.depth(), 1);
        assert_eq!(h.dedupe_skipped(), 1);
    }

    #[test]
    fn depth_cap_evicts_oldest() {
        let mut h = EditHistory::new(Duration::from_millis(1), 5);
        let t0 = Instant::now();
        for i in 0..10 {
            h.record(entry(&"x".repeat(i * 3), 0), t0 + Duration::from_secs(i as u64));
        }
        assert_eq!(h.depth(), 5);
        // Walk to the bottom: the earliest surviving entry is i == 5.
        let mut last_text_len = 0;
        while let Some(e) = h.undo() {
            last_text_len = e.text.len();
        }
        assert_eq!(last_text_len, 15);
    }

    #[test]
    fn undo_redo_noops_on_empty_history() {
        let mut h = history();
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
    }

    #[test]
    fn burst_after_undo_starts_fresh_step() {
        let mut h = history();
        let t0 = Instant::now();
        h.record(entry("", 0), t0);
        h.record(entry("a", 1), t0 + Duration::from_secs(2));
        h.undo();
        // Rapid edit right after the undo must not coalesce into the
        // restored entry.
        h.record(entry("b", 1), t0 + Duration::from_millis(2050));
        assert_eq!(h.depth(), 2);
        assert_eq!(h.current().unwrap().text, "b");
        assert_eq!(h.undo().unwrap().text, "");
    }
}
