//! Paste-provenance interval set.
//!
//! A `PastedRangeSet` is an ordered collection of disjoint half-open byte
//! ranges `[start, end)` marking document spans that were introduced by paste
//! operations. Every structural edit of the document maps to one of the
//! transform operations below; each consumes the current set and returns a
//! new one, so callers can snapshot a set (undo history) without aliasing.
//!
//! Invariants after every operation:
//! * ranges sorted by `start` ascending
//! * mutually disjoint
//! * no zero-length members (a computed range with `end <= start` is dropped,
//!   never emitted)
//!
//! Ranges are never merged: each input range maps independently to at most
//! two output ranges (split) or none (consumed).

use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)`. `start < end` always; zero-length
/// ranges are invalid and are dropped at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    /// Construct a range, rejecting the degenerate `end <= start` case.
    pub fn new(start: usize, end: usize) -> Option<Self> {
        if end > start {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True if `pos` falls inside the half-open span.
    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Half-open intersection test.
    pub fn overlaps(&self, other: &Range) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Sorted, disjoint set of pasted ranges.
///
/// Serializes as a plain JSON array of `{start, end}` objects, the shape the
/// persistence collaborator stores alongside the document text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PastedRangeSet {
    ranges: Vec<Range>,
}

impl PastedRangeSet {
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Build a set from untrusted input (e.g. a persisted snapshot): sorts,
    /// then drops zero-length members and any range overlapping its
    /// predecessor. Malformed input degrades to a smaller valid set.
    pub fn from_ranges<I: IntoIterator<Item = Range>>(ranges: I) -> Self {
        let mut sorted: Vec<Range> = ranges.into_iter().filter(|r| !r.is_empty()).collect();
        sorted.sort_by_key(|r| r.start);
        let mut out: Vec<Range> = Vec::with_capacity(sorted.len());
        for r in sorted {
            match out.last() {
                Some(prev) if r.start < prev.end => {}
                _ => out.push(r),
            }
        }
        Self { ranges: out }
    }

    pub fn as_slice(&self) -> &[Range] {
        &self.ranges
    }

    pub fn iter(&self) -> impl Iterator<Item = &Range> {
        self.ranges.iter()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Transform the set across a deletion of `del_len` bytes at `del_start`.
    ///
    /// Endpoint mapping: positions at/before the deletion keep their offset,
    /// positions inside the deleted span clip to `del_start`, positions
    /// at/after its end shift left by `del_len`. A range whose mapped
    /// endpoints collapse is dropped.
    pub fn apply_deletion(&self, del_start: usize, del_len: usize) -> Self {
        if del_len == 0 {
            return self.clone();
        }
        let del_end = del_start + del_len;
        let map = |pos: usize| -> usize {
            if pos <= del_start {
                pos
            } else if pos >= del_end {
                pos - del_len
            } else {
                del_start
            }
        };
        let mut out = Vec::with_capacity(self.ranges.len());
        for r in &self.ranges {
            if let Some(mapped) = Range::new(map(r.start), map(r.end)) {
                out.push(mapped);
            }
        }
        Self { ranges: out }
    }

    /// Transform the set across an insertion of `ins_len` bytes at
    /// `ins_start`.
    ///
    /// A range strictly containing the insertion point splits in two: text
    /// typed inside a pasted span breaks its provenance there. Insertion
    /// exactly at a range's start shifts the whole range right; new text at
    /// the left edge is not retroactively pasted. Insertion at a range's end
    /// leaves it unchanged.
    pub fn apply_insertion(&self, ins_start: usize, ins_len: usize) -> Self {
        if ins_len == 0 {
            return self.clone();
        }
        let mut out = Vec::with_capacity(self.ranges.len() + 1);
        for r in &self.ranges {
            if r.end <= ins_start {
                out.push(*r);
            } else if r.start >= ins_start {
                out.push(Range {
                    start: r.start + ins_len,
                    end: r.end + ins_len,
                });
            } else {
                // r.start < ins_start < r.end: split around the inserted gap.
                if let Some(left) = Range::new(r.start, ins_start) {
                    out.push(left);
                }
                if let Some(right) = Range::new(ins_start + ins_len, r.end + ins_len) {
                    out.push(right);
                }
            }
        }
        Self { ranges: out }
    }

    /// Transform the set across a paste that replaces the selection
    /// `[sel_start, sel_end)` with `pasted_len` bytes of pasted text, and tag
    /// the freshly pasted span.
    ///
    /// Composed as deletion of the selection, insertion of the payload, then
    /// appending the new tagged range `[sel_start, sel_start + pasted_len)`
    /// and re-sorting. Pre-existing ranges end up shifted/split around the
    /// new one, never merged with it.
    pub fn apply_paste_replacement(
        &self,
        sel_start: usize,
        sel_end: usize,
        pasted_len: usize,
    ) -> Self {
        let sel_len = sel_end.saturating_sub(sel_start);
        let mut next = self
            .apply_deletion(sel_start, sel_len)
            .apply_insertion(sel_start, pasted_len);
        if let Some(pasted) = Range::new(sel_start, sel_start + pasted_len) {
            next.ranges.push(pasted);
            next.ranges.sort_by_key(|r| r.start);
        }
        next
    }

    /// Remove the pasted tag from every sub-span intersecting
    /// `[clear_start, clear_end)`. A straddled range survives as up to two
    /// pieces (the parts outside the cleared window). Idempotent.
    pub fn clear_tag(&self, clear_start: usize, clear_end: usize) -> Self {
        if clear_end <= clear_start {
            return self.clone();
        }
        let window = Range {
            start: clear_start,
            end: clear_end,
        };
        let mut out = Vec::with_capacity(self.ranges.len());
        for r in &self.ranges {
            if !r.overlaps(&window) {
                out.push(*r);
                continue;
            }
            if let Some(left) = Range::new(r.start, r.end.min(clear_start)) {
                out.push(left);
            }
            if let Some(right) = Range::new(r.start.max(clear_end), r.end) {
                out.push(right);
            }
        }
        Self { ranges: out }
    }

    /// Debug check of the set invariants. Test helper; production paths
    /// preserve these by construction.
    pub fn check_invariants(&self) -> bool {
        self.ranges.windows(2).all(|w| w[0].end <= w[1].start)
            && self.ranges.iter().all(|r| !r.is_empty())
    }
}

impl FromIterator<Range> for PastedRangeSet {
    fn from_iter<I: IntoIterator<Item = Range>>(iter: I) -> Self {
        Self::from_ranges(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ranges: &[(usize, usize)]) -> PastedRangeSet {
        PastedRangeSet::from_ranges(ranges.iter().map(|&(s, e)| Range { start: s, end: e }))
    }

    fn spans(s: &PastedRangeSet) -> Vec<(usize, usize)> {
        s.iter().map(|r| (r.start, r.end)).collect()
    }

    #[test]
    fn deletion_before_range_shifts_left() {
        let s = set(&[(10, 20)]).apply_deletion(0, 4);
        assert_eq!(spans(&s), vec![(6, 16)]);
    }

    #[test]
    fn deletion_after_range_is_noop() {
        let s = set(&[(10, 20)]).apply_deletion(25, 5);
        assert_eq!(spans(&s), vec![(10, 20)]);
    }

    #[test]
    fn deletion_straddling_left_boundary_clips() {
        // Range [10,20), delete [5,15): survivor is [5,10).
        let s = set(&[(10, 20)]).apply_deletion(5, 10);
        assert_eq!(spans(&s), vec![(5, 10)]);
        assert!(s.check_invariants());
    }

    #[test]
    fn deletion_straddling_right_boundary_clips() {
        let s = set(&[(10, 20)]).apply_deletion(15, 10);
        assert_eq!(spans(&s), vec![(10, 15)]);
    }

    #[test]
    fn deletion_containing_range_drops_it() {
        let s = set(&[(10, 20)]).apply_deletion(5, 20);
        assert!(s.is_empty());
    }

    #[test]
    fn deletion_inside_range_shrinks_it() {
        let s = set(&[(10, 20)]).apply_deletion(12, 3);
        assert_eq!(spans(&s), vec![(10, 17)]);
    }

    #[test]
    fn insertion_inside_range_splits() {
        let s = set(&[(10, 20)]).apply_insertion(14, 5);
        assert_eq!(spans(&s), vec![(10, 14), (19, 25)]);
        assert!(s.check_invariants());
    }

    #[test]
    fn insertion_at_start_boundary_shifts_whole_range() {
        // New text at the left edge is not retroactively pasted.
        let s = set(&[(10, 20)]).apply_insertion(10, 3);
        assert_eq!(spans(&s), vec![(13, 23)]);
    }

    #[test]
    fn insertion_at_end_boundary_leaves_range() {
        let s = set(&[(10, 20)]).apply_insertion(20, 3);
        assert_eq!(spans(&s), vec![(10, 20)]);
    }

    #[test]
    fn split_pieces_reassemble_to_original() {
        let original = Range { start: 10, end: 20 };
        let s = set(&[(10, 20)]).apply_insertion(13, 4);
        let total: usize = s.iter().map(Range::len).sum();
        assert_eq!(total, original.len());
    }

    #[test]
    fn paste_replacement_over_two_ranges() {
        // Selection [12,26) covers the tail of [10,15) and head of [22,30).
        let s = set(&[(10, 15), (22, 30)]).apply_paste_replacement(12, 26, 6);
        // Left survivor [10,12), new pasted [12,18), right survivor shifted.
        assert_eq!(spans(&s), vec![(10, 12), (12, 18), (18, 22)]);
        assert!(s.check_invariants());
    }

    #[test]
    fn paste_replacement_collapsed_selection() {
        let s = set(&[(0, 4)]).apply_paste_replacement(2, 2, 3);
        assert_eq!(spans(&s), vec![(0, 2), (2, 5), (5, 7)]);
    }

    #[test]
    fn paste_of_empty_payload_adds_nothing() {
        let s = set(&[(0, 4)]).apply_paste_replacement(1, 3, 0);
        assert_eq!(spans(&s), vec![(0, 2)]);
    }

    #[test]
    fn clear_tag_splits_straddled_range() {
        let s = set(&[(10, 30)]).clear_tag(15, 20);
        assert_eq!(spans(&s), vec![(10, 15), (20, 30)]);
    }

    #[test]
    fn clear_tag_is_idempotent() {
        let once = set(&[(0, 10), (15, 25)]).clear_tag(5, 20);
        let twice = once.clear_tag(5, 20);
        assert_eq!(once, twice);
    }

    #[test]
    fn clear_tag_drops_contained_range() {
        let s = set(&[(10, 14)]).clear_tag(8, 20);
        assert!(s.is_empty());
    }

    #[test]
    fn from_ranges_sanitizes_untrusted_input() {
        let s = PastedRangeSet::from_ranges(vec![
            Range { start: 5, end: 5 },
            Range { start: 8, end: 12 },
            Range { start: 0, end: 3 },
            Range { start: 10, end: 20 },
        ]);
        assert_eq!(spans(&s), vec![(0, 3), (8, 12)]);
        assert!(s.check_invariants());
    }

    #[test]
    fn serializes_as_plain_array() {
        let s = set(&[(0, 3), (7, 9)]);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"[{"start":0,"end":3},{"start":7,"end":9}]"#);
        let back: PastedRangeSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
