//! Overlap resolution: many raw matches in, one flat annotation layer out.

use crate::{Match, Rule};

/// Scan `text` with every rule and resolve overlaps into a left-to-right,
/// non-overlapping annotation list; uncovered text is implicitly plain.
///
/// Acceptance order is priority descending, ties by earliest start (the
/// sort is stable, so equal (priority, start) candidates keep rule-table
/// order). A candidate intersecting any already-accepted span is rejected
/// outright: priority strictly dominates span length and position, and even
/// a one-character overlap drops the lower-priority match. That asymmetry is
/// deliberate, long-standing behavior; renderers depend on it.
pub fn annotate<'r>(text: &str, rules: &'r [Rule]) -> Vec<Match<'r>> {
    let mut candidates: Vec<Match<'r>> = Vec::new();
    for rule in rules {
        for (start, end) in rule.scan(text) {
            if end > start {
                candidates.push(Match { start, end, rule });
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.rule
            .priority
            .cmp(&a.rule.priority)
            .then(a.start.cmp(&b.start))
    });

    let mut accepted: Vec<Match<'r>> = Vec::new();
    'next: for cand in candidates {
        for acc in &accepted {
            if cand.start < acc.end && cand.end > acc.start {
                continue 'next;
            }
        }
        accepted.push(cand);
    }

    accepted.sort_by_key(|m| m.start);
    accepted
}
