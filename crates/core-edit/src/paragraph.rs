//! Enclosing-line resolution for focus dimming.

/// The `[start, end)` span of the line enclosing a caret. Unlike a pasted
/// range, this span may be empty (caret on a blank line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Span of the line/paragraph enclosing `caret`: from one past the nearest
/// newline strictly before the caret (0 if none) to the nearest newline at
/// or after it (`text.len()` if none). Pure; render-time only.
///
/// Scans bytes rather than chars: `\n` is a single byte that never occurs
/// inside a multi-byte UTF-8 sequence, so the result is always on a char
/// boundary even for an unsnapped caret.
pub fn focused_line_span(text: &str, caret: usize) -> LineSpan {
    let bytes = text.as_bytes();
    let caret = caret.min(bytes.len());
    let start = bytes[..caret]
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let end = bytes[caret..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|i| caret + i)
        .unwrap_or(bytes.len());
    LineSpan { start, end }
}
