//! Editing-session orchestration.
//!
//! A `Session` owns the mutable state of one open document: the current
//! text, the selection baseline, the pasted-range set, and the undo
//! history. The input surface drives it through the `on_*` entry points and
//! polls `tick` from its event loop; everything runs on that single logical
//! thread, so there is no locking anywhere.
//!
//! Two operations are deferred behind cancelable debounce deadlines: the
//! snapshot write to the persistence handle, and the cursor-proximity scan
//! that feeds the suggestion panel. A new edit before either deadline
//! re-arms it from zero; `close` cancels both so nothing acts on stale
//! state after teardown.
//!
//! Logging policy: events carry offsets and lengths, never document
//! content.

mod debounce;
mod store;

pub use debounce::DebounceTimer;
pub use store::{DocumentSnapshot, JsonFileStore, SnapshotStore, StoreError};

use core_config::Config;
use core_edit::boundary;
use core_edit::newline::normalize_newlines;
use core_edit::paragraph::{LineSpan, focused_line_span};
use core_edit::{EditDelta, Selection, infer_edit};
use core_history::{EditHistory, HistoryEntry};
use core_ranges::PastedRangeSet;
use core_rules::{Match, best_match_near, rules};
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Who is applying a state change. History restorations must not re-record
/// themselves, so the distinction is an explicit parameter on the commit
/// path rather than a hidden flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplySource {
    UserEdit,
    History,
}

/// Plain counters; the session is single-threaded, so no atomics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionMetrics {
    pub edits_inferred: u64,
    pub pastes: u64,
    pub tag_clears: u64,
    pub scans_scheduled: u64,
    pub scans_cancelled: u64,
    pub scans_run: u64,
    pub persists_run: u64,
    pub persist_failures: u64,
}

pub struct Session {
    text: String,
    /// Selection as last reported by the input surface; the baseline the
    /// next raw-change inference runs against. Updated together with `text`
    /// in one step, never separately.
    selection: Selection,
    pasted: PastedRangeSet,
    history: EditHistory,
    suggestion: Option<Match<'static>>,
    scan_timer: DebounceTimer,
    persist_timer: DebounceTimer,
    store: Option<Box<dyn SnapshotStore>>,
    config: Config,
    /// Persistence failures notify once, then degrade silently to
    /// memory-only for the rest of the session.
    persist_failure_reported: bool,
    notification: Option<String>,
    metrics: SessionMetrics,
}

impl Session {
    /// Empty session; the empty document is the first history entry.
    pub fn new(config: Config, now: Instant) -> Self {
        let mut session = Self {
            text: String::new(),
            selection: Selection::caret(0),
            pasted: PastedRangeSet::new(),
            history: EditHistory::new(
                config.coalesce_window(),
                config.file.history.max_depth,
            ),
            suggestion: None,
            scan_timer: DebounceTimer::new(config.suggest_delay()),
            persist_timer: DebounceTimer::new(config.persist_delay()),
            store: None,
            config,
            persist_failure_reported: false,
            notification: None,
            metrics: SessionMetrics::default(),
        };
        let seed = session.snapshot_entry();
        session.history.record(seed, now);
        session
    }

    /// Session seeded from raw content (normalized to LF line endings).
    pub fn open(config: Config, content: &str, now: Instant) -> Self {
        let mut session = Self::new(config, now);
        session.seed(content, now);
        session
    }

    /// Session seeded from a persisted snapshot: text plus paste
    /// provenance. Malformed persisted ranges degrade to a smaller valid
    /// set.
    pub fn from_snapshot(config: Config, snapshot: DocumentSnapshot, now: Instant) -> Self {
        let mut session = Self::new(config, now);
        session.seed(&snapshot.text, now);
        session.pasted =
            PastedRangeSet::from_ranges(snapshot.pasted_ranges.iter().copied());
        session
    }

    fn seed(&mut self, content: &str, now: Instant) {
        let normalized = normalize_newlines(content);
        self.text = normalized.text;
        self.selection = Selection::caret(0);
        self.pasted = PastedRangeSet::new();
        self.history = EditHistory::new(
            self.config.coalesce_window(),
            self.config.file.history.max_depth,
        );
        let seed = self.snapshot_entry();
        self.history.record(seed, now);
        debug!(target: "session", text_len = self.text.len(), "session_seeded");
    }

    /// Attach the persistence handle owned by the storage collaborator.
    pub fn attach_store(&mut self, store: Box<dyn SnapshotStore>) {
        self.store = Some(store);
    }

    // ------------------------------------------------------------------
    // Input-surface entry points
    // ------------------------------------------------------------------

    /// The surface observed a new full text and collapsed caret. Infers the
    /// structural edit against the captured baseline, maps the pasted
    /// ranges across it, and records history (possibly coalescing).
    pub fn on_raw_change(&mut self, new_text: &str, new_caret: usize, now: Instant) {
        let new_caret = boundary::snap(new_text, new_caret);
        let delta = infer_edit(self.selection, &self.text, new_text, new_caret);
        if delta.is_noop() && new_text == self.text {
            // Caret-only report routed through the raw-change path.
            self.selection = Selection::caret(new_caret);
            self.reschedule(now);
            return;
        }
        self.apply_delta_to_ranges(&delta);
        // Text and the next inference baseline move together.
        self.text = new_text.to_string();
        self.selection = Selection::caret(new_caret);
        self.suggestion = None;
        self.metrics.edits_inferred += 1;
        trace!(
            target: "session.edit",
            change_start = delta.change_start,
            deleted = delta.deleted_len,
            inserted = delta.inserted_len,
            text_len = self.text.len(),
            "raw_change"
        );
        self.commit(ApplySource::UserEdit, now);
    }

    /// A paste replacing `[sel_start, sel_end)` with `pasted_text`. The
    /// payload bounds are known exactly, so this bypasses inference and
    /// tags the pasted span directly.
    pub fn on_paste_event(
        &mut self,
        pasted_text: &str,
        sel_start: usize,
        sel_end: usize,
        now: Instant,
    ) {
        let sel = self.sanitize_selection(sel_start, sel_end);
        let payload = normalize_newlines(pasted_text).text;
        self.pasted = self
            .pasted
            .apply_paste_replacement(sel.start, sel.end, payload.len());
        self.text.replace_range(sel.start..sel.end, &payload);
        self.selection = Selection::caret(sel.start + payload.len());
        self.suggestion = None;
        self.metrics.pastes += 1;
        trace!(
            target: "session.edit",
            at = sel.start,
            replaced = sel.len(),
            pasted = payload.len(),
            "paste"
        );
        self.commit(ApplySource::UserEdit, now);
    }

    /// The surface reported a selection change. Establishes the baseline
    /// for the next raw change and gates the proximity scan: a real
    /// selection suppresses suggestions entirely.
    pub fn on_selection_change(&mut self, sel_start: usize, sel_end: usize, now: Instant) {
        self.selection = self.sanitize_selection(sel_start, sel_end);
        self.reschedule(now);
    }

    /// Remove paste provenance from `[sel_start, sel_end)`. Recorded as a
    /// history step so it can be undone.
    pub fn request_clear_tag(&mut self, sel_start: usize, sel_end: usize, now: Instant) {
        let sel = self.sanitize_selection(sel_start, sel_end);
        self.pasted = self.pasted.clear_tag(sel.start, sel.end);
        self.metrics.tag_clears += 1;
        trace!(target: "session.edit", from = sel.start, to = sel.end, "clear_tag");
        self.commit(ApplySource::UserEdit, now);
    }

    /// Step the history back and restore that snapshot. Returns false at
    /// the bottom of the stack.
    ///
    /// The surface must intercept native platform undo gestures and route
    /// them here; letting the platform mutate the text directly would
    /// desynchronize the pasted ranges from the text.
    pub fn undo(&mut self, now: Instant) -> bool {
        let Some(entry) = self.history.undo() else {
            return false;
        };
        let entry = entry.clone();
        self.restore_entry(entry, now);
        true
    }

    /// Step the history forward; see `undo`.
    pub fn redo(&mut self, now: Instant) -> bool {
        let Some(entry) = self.history.redo() else {
            return false;
        };
        let entry = entry.clone();
        self.restore_entry(entry, now);
        true
    }

    /// Run deferred actions whose deadline has passed. The driving event
    /// loop calls this on its tick.
    pub fn tick(&mut self, now: Instant) {
        if self.scan_timer.fire_due(now) {
            self.run_proximity_scan();
        }
        if self.persist_timer.fire_due(now) {
            self.persist_now();
        }
    }

    /// Cancel pending deferred actions. Call on teardown; afterwards the
    /// session is inert until driven again.
    pub fn close(&mut self) {
        self.scan_timer.cancel();
        self.persist_timer.cancel();
        debug!(target: "session", "session_closed");
    }

    // ------------------------------------------------------------------
    // Render-time query surface (pure over current state)
    // ------------------------------------------------------------------

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Non-overlapping style annotations over the current text.
    pub fn annotated_spans(&self) -> Vec<Match<'static>> {
        core_rules::annotate(&self.text, rules())
    }

    pub fn pasted_spans(&self) -> &PastedRangeSet {
        &self.pasted
    }

    /// Latest debounced proximity pick, if any.
    pub fn active_suggestion(&self) -> Option<&Match<'static>> {
        self.suggestion.as_ref()
    }

    /// Enclosing-line span for focus dimming.
    pub fn focused_paragraph(&self, caret: usize) -> LineSpan {
        focused_line_span(&self.text, caret)
    }

    /// One-shot user-visible message (persistence failure); `None` once
    /// taken.
    pub fn take_notification(&mut self) -> Option<String> {
        self.notification.take()
    }

    pub fn metrics(&self) -> SessionMetrics {
        self.metrics
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// History depth, for diagnostics and tests.
    pub fn history_depth(&self) -> usize {
        self.history.depth()
    }

    pub fn history_coalesced(&self) -> u64 {
        self.history.coalesced()
    }

    /// Current snapshot in the shape handed to the persistence handle.
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            text: self.text.clone(),
            pasted_ranges: self.pasted.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn sanitize_selection(&self, a: usize, b: usize) -> Selection {
        Selection::new(
            boundary::snap(&self.text, a),
            boundary::snap(&self.text, b),
        )
    }

    fn apply_delta_to_ranges(&mut self, delta: &EditDelta) {
        if delta.deleted_len > 0 {
            self.pasted = self
                .pasted
                .apply_deletion(delta.change_start, delta.deleted_len);
        }
        if delta.inserted_len > 0 {
            self.pasted = self
                .pasted
                .apply_insertion(delta.change_start, delta.inserted_len);
        }
    }

    fn snapshot_entry(&self) -> HistoryEntry {
        HistoryEntry {
            text: self.text.clone(),
            pasted: self.pasted.clone(),
            selection: self.selection,
        }
    }

    /// Single funnel for state changes. User edits record history; history
    /// restorations must not, or every undo would push itself straight
    /// back.
    fn commit(&mut self, source: ApplySource, now: Instant) {
        if source == ApplySource::UserEdit {
            let entry = self.snapshot_entry();
            self.history.record(entry, now);
        }
        self.reschedule(now);
    }

    fn restore_entry(&mut self, entry: HistoryEntry, now: Instant) {
        self.text = entry.text;
        self.pasted = entry.pasted;
        // Caret lands exactly where the snapshot left it, not at text end.
        self.selection = entry.selection;
        self.suggestion = None;
        trace!(
            target: "session.edit",
            text_len = self.text.len(),
            caret = self.selection.start,
            "history_restore"
        );
        self.commit(ApplySource::History, now);
    }

    fn reschedule(&mut self, now: Instant) {
        if self.selection.is_collapsed() {
            if self.scan_timer.is_pending() {
                self.metrics.scans_cancelled += 1;
            }
            self.scan_timer.trigger(now);
            self.metrics.scans_scheduled += 1;
        } else {
            // A real selection suppresses suggestions entirely.
            self.scan_timer.cancel();
            self.suggestion = None;
        }
        self.persist_timer.trigger(now);
    }

    fn run_proximity_scan(&mut self) {
        if !self.selection.is_collapsed() {
            self.suggestion = None;
            return;
        }
        self.suggestion = best_match_near(
            &self.text,
            self.selection.start,
            self.config.file.suggest.radius,
            rules(),
        );
        self.metrics.scans_run += 1;
        trace!(
            target: "session.scan",
            caret = self.selection.start,
            found = self.suggestion.is_some(),
            "proximity_scan"
        );
    }

    fn persist_now(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        let snapshot = DocumentSnapshot {
            text: self.text.clone(),
            pasted_ranges: self.pasted.clone(),
        };
        match store.save(&snapshot) {
            Ok(()) => {
                self.metrics.persists_run += 1;
                trace!(target: "session.persist", text_len = snapshot.text.len(), "snapshot_saved");
            }
            Err(e) => {
                self.metrics.persist_failures += 1;
                if !self.persist_failure_reported {
                    self.persist_failure_reported = true;
                    self.notification = Some(format!(
                        "Could not save changes ({e}); edits are kept in memory for this session."
                    ));
                    warn!(target: "session.persist", error = %e, "persist_failed");
                } else {
                    debug!(target: "session.persist", error = %e, "persist_failed_suppressed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn t0() -> Instant {
        Instant::now()
    }

    #[test]
    fn typing_updates_baseline_and_ranges() {
        let mut s = Session::open(Config::default(), "hello", t0());
        s.on_selection_change(5, 5, t0());
        s.on_raw_change("helloa", 6, t0());
        assert_eq!(s.text(), "helloa");
        assert_eq!(s.selection(), Selection::caret(6));
        assert!(s.pasted_spans().is_empty());
        assert_eq!(s.metrics().edits_inferred, 1);
    }

    #[test]
    fn caret_only_report_does_not_record_history() {
        let mut s = Session::open(Config::default(), "hello", t0());
        let depth = s.history_depth();
        s.on_raw_change("hello", 3, t0());
        assert_eq!(s.history_depth(), depth);
        assert_eq!(s.selection(), Selection::caret(3));
    }

    #[test]
    fn paste_tags_span_and_typing_inside_splits_it() {
        let now = t0();
        let mut s = Session::open(Config::default(), "ab", now);
        s.on_selection_change(1, 1, now);
        s.on_paste_event("PASTE", 1, 1, now);
        assert_eq!(s.text(), "aPASTEb");
        assert_eq!(
            s.pasted_spans().as_slice()[0],
            core_ranges::Range { start: 1, end: 6 }
        );
        // Type one char in the middle of the pasted span.
        s.on_selection_change(3, 3, now);
        s.on_raw_change("aPAxSTEb", 4, now + Duration::from_secs(5));
        let spans: Vec<(usize, usize)> = s
            .pasted_spans()
            .iter()
            .map(|r| (r.start, r.end))
            .collect();
        assert_eq!(spans, vec![(1, 3), (4, 7)]);
    }

    #[test]
    fn clear_tag_is_undoable() {
        let now = t0();
        let mut s = Session::open(Config::default(), "", now);
        s.on_paste_event("PASTE", 0, 0, now);
        assert_eq!(s.pasted_spans().len(), 1);
        s.request_clear_tag(0, 5, now + Duration::from_secs(2));
        assert!(s.pasted_spans().is_empty());
        assert!(s.undo(now + Duration::from_secs(3)));
        assert_eq!(s.pasted_spans().len(), 1);
    }

    #[test]
    fn snapshot_shape_matches_store_contract() {
        let now = t0();
        let mut s = Session::open(Config::default(), "", now);
        s.on_paste_event("hi", 0, 0, now);
        let json = serde_json::to_string(&s.snapshot()).unwrap();
        assert_eq!(json, r#"{"text":"hi","pasted_ranges":[{"start":0,"end":2}]}"#);
    }

    #[test]
    fn from_snapshot_sanitizes_ranges() {
        let snap = DocumentSnapshot {
            text: "abcdef".into(),
            pasted_ranges: PastedRangeSet::from_ranges(vec![core_ranges::Range {
                start: 1,
                end: 4,
            }]),
        };
        let s = Session::from_snapshot(Config::default(), snap, t0());
        assert_eq!(s.text(), "abcdef");
        assert_eq!(s.pasted_spans().len(), 1);
    }

    #[test]
    fn open_normalizes_line_endings() {
        let s = Session::open(Config::default(), "a\r\nb", t0());
        assert_eq!(s.text(), "a\nb");
    }
}
