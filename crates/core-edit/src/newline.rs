//! Line-ending normalization to an LF-only internal representation.
//!
//! Sessions are seeded from externally stored content which may carry CRLF
//! or bare-CR endings. The core, its offsets, and the paragraph resolver all
//! assume LF, so content is normalized once at the seam and the detected
//! style retained for the persistence collaborator.

/// Line ending style detected in source content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    Cr,
    Crlf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
            LineEnding::Crlf => "\r\n",
        }
    }
}

/// Result of normalizing line endings.
#[derive(Debug, Clone)]
pub struct Normalized {
    /// LF-only content.
    pub text: String,
    /// Majority style observed (ties resolved CRLF > LF > CR).
    pub original: LineEnding,
    pub had_trailing_newline: bool,
    /// More than one style observed.
    pub mixed: bool,
}

/// Normalize `input` to LF-only, counting CRLF, LF, and solitary CR to
/// detect the majority style. Only slices at `\r` boundaries so multi-byte
/// UTF-8 sequences stay intact.
pub fn normalize_newlines(input: &str) -> Normalized {
    let bytes = input.as_bytes();
    let (mut crlf, mut lf, mut cr) = (0usize, 0usize, 0usize);
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                if bytes.get(i + 1) == Some(&b'\n') {
                    crlf += 1;
                    i += 2;
                } else {
                    cr += 1;
                    i += 1;
                }
            }
            b'\n' => {
                lf += 1;
                i += 1;
            }
            _ => i += 1,
        }
    }

    let had_trailing_newline =
        input.ends_with('\n') || input.ends_with('\r');

    let mut original = LineEnding::Lf;
    let mut max = 0usize;
    for (style, count) in [
        (LineEnding::Crlf, crlf),
        (LineEnding::Lf, lf),
        (LineEnding::Cr, cr),
    ] {
        if count > max {
            max = count;
            original = style;
        }
    }
    let mixed = [crlf, lf, cr].iter().filter(|&&c| c > 0).count() > 1;

    if crlf == 0 && cr == 0 {
        return Normalized {
            text: input.to_string(),
            original,
            had_trailing_newline,
            mixed,
        };
    }

    let mut out = String::with_capacity(input.len());
    let mut seg_start = 0usize;
    let mut j = 0usize;
    while j < bytes.len() {
        if bytes[j] == b'\r' {
            if seg_start < j {
                out.push_str(&input[seg_start..j]);
            }
            out.push('\n');
            j += if bytes.get(j + 1) == Some(&b'\n') { 2 } else { 1 };
            seg_start = j;
        } else {
            j += 1;
        }
    }
    if seg_start < input.len() {
        out.push_str(&input[seg_start..]);
    }
    debug_assert!(!out.contains('\r'));
    Normalized {
        text: out,
        original,
        had_trailing_newline,
        mixed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lf_only_passes_through() {
        let n = normalize_newlines("a\nb\n");
        assert_eq!(n.text, "a\nb\n");
        assert_eq!(n.original, LineEnding::Lf);
        assert!(n.had_trailing_newline);
        assert!(!n.mixed);
    }

    #[test]
    fn crlf_rewrites_and_detects() {
        let n = normalize_newlines("a\r\nb\r\n");
        assert_eq!(n.text, "a\nb\n");
        assert_eq!(n.original, LineEnding::Crlf);
        assert!(!n.mixed);
    }

    #[test]
    fn bare_cr_rewrites() {
        let n = normalize_newlines("a\rb");
        assert_eq!(n.text, "a\nb");
        assert_eq!(n.original, LineEnding::Cr);
    }

    #[test]
    fn mixed_styles_flagged_with_majority() {
        let n = normalize_newlines("a\r\nb\r\nc\nd");
        assert_eq!(n.text, "a\nb\nc\nd");
        assert_eq!(n.original, LineEnding::Crlf);
        assert!(n.mixed);
        assert!(!n.had_trailing_newline);
    }

    #[test]
    fn multibyte_content_survives_rewrite() {
        let n = normalize_newlines("héllo\r\nwörld\r");
        assert_eq!(n.text, "héllo\nwörld\n");
    }

    #[test]
    fn empty_input() {
        let n = normalize_newlines("");
        assert_eq!(n.text, "");
        assert!(!n.had_trailing_newline);
    }
}
