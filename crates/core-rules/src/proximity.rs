//! Windowed best-match pick for the live suggestion panel.

use crate::{Match, Rule};

/// Scan only `[caret - radius, caret + radius)` (clamped to the document,
/// widened to char boundaries) and return the single highest-priority match
/// whose span covers the caret (`start <= caret <= end`). Ties keep the
/// first rule seen in table order, so the pick is stable across runs.
///
/// Suppression while a real selection is active, and debouncing of the scan
/// itself, are the caller's responsibility; this function is pure.
pub fn best_match_near<'r>(
    text: &str,
    caret: usize,
    radius: usize,
    rules: &'r [Rule],
) -> Option<Match<'r>> {
    let caret = caret.min(text.len());
    let mut win_start = caret.saturating_sub(radius);
    while !text.is_char_boundary(win_start) {
        win_start -= 1;
    }
    let mut win_end = caret.saturating_add(radius).min(text.len());
    while !text.is_char_boundary(win_end) {
        win_end += 1;
    }
    let window = &text[win_start..win_end];

    let mut best: Option<Match<'r>> = None;
    for rule in rules {
        for (s, e) in rule.scan(window) {
            let (start, end) = (s + win_start, e + win_start);
            if start <= caret && caret <= end {
                let better = match &best {
                    None => true,
                    Some(b) => rule.priority > b.rule.priority,
                };
                if better {
                    best = Some(Match { start, end, rule });
                }
            }
        }
    }
    best
}
