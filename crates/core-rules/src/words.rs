//! Word-sequence matchers.
//!
//! Token-level scanning for rules regex cannot express: adjacent duplicate
//! words (the `regex` engine has no backreferences) and word/phrase lists.
//! Words are runs of alphanumerics and apostrophes; a phrase only matches
//! when its words are separated by whitespace alone, so punctuation breaks
//! a sequence. Comparison is ASCII-case-insensitive, which keeps byte
//! offsets aligned with the source text.

use crate::Matcher;

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\''
}

/// Half-open byte spans of every word in `text`, left to right.
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        if is_word_char(c) {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            out.push((s, i));
        }
    }
    if let Some(s) = start {
        out.push((s, text.len()));
    }
    out
}

fn whitespace_between(text: &str, from: usize, to: usize) -> bool {
    text[from..to].chars().all(char::is_whitespace)
}

/// Matches any of a fixed set of words or multi-word phrases.
pub struct WordSeqMatcher {
    /// Each entry is a lowercased word sequence; single-word entries are
    /// plain word-list lookups.
    sequences: Vec<Vec<String>>,
}

impl WordSeqMatcher {
    pub fn words(words: &[&str]) -> Self {
        Self {
            sequences: words.iter().map(|w| vec![w.to_ascii_lowercase()]).collect(),
        }
    }

    pub fn phrases(phrases: &[&str]) -> Self {
        Self {
            sequences: phrases
                .iter()
                .map(|p| {
                    p.split_whitespace()
                        .map(|w| w.to_ascii_lowercase())
                        .collect()
                })
                .collect(),
        }
    }
}

impl Matcher for WordSeqMatcher {
    fn scan(&self, text: &str) -> Vec<(usize, usize)> {
        let tokens = word_spans(text);
        let mut out = Vec::new();
        for (i, &(first_start, _)) in tokens.iter().enumerate() {
            for seq in &self.sequences {
                if i + seq.len() > tokens.len() {
                    continue;
                }
                let mut ok = true;
                for (k, want) in seq.iter().enumerate() {
                    let (s, e) = tokens[i + k];
                    if !text[s..e].eq_ignore_ascii_case(want) {
                        ok = false;
                        break;
                    }
                    if k > 0 && !whitespace_between(text, tokens[i + k - 1].1, s) {
                        ok = false;
                        break;
                    }
                }
                if ok {
                    out.push((first_start, tokens[i + seq.len() - 1].1));
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// Matches a word immediately repeated ("the the"), whitespace-separated.
pub struct RepeatedWordMatcher;

impl RepeatedWordMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RepeatedWordMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Matcher for RepeatedWordMatcher {
    fn scan(&self, text: &str) -> Vec<(usize, usize)> {
        let tokens = word_spans(text);
        let mut out = Vec::new();
        for pair in tokens.windows(2) {
            let (s1, e1) = pair[0];
            let (s2, e2) = pair[1];
            if text[s1..e1].eq_ignore_ascii_case(&text[s2..e2])
                && whitespace_between(text, e1, s2)
            {
                out.push((s1, e2));
            }
        }
        out
    }
}
