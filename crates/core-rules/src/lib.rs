//! Lexical style-analysis rules.
//!
//! A `Rule` pairs a priority and rendering metadata with a `Matcher`, the
//! pattern-scanning capability. Matching is surface-level and heuristic by
//! design; there is no grammar. The built-in table targets prose style
//! (repeated words, passive constructions, filler, clichés, stray
//! whitespace) and is process-wide read-only data, initialized once.
//!
//! The `Matcher` seam exists so the rule engine is not married to one
//! pattern facility: regex covers the surface patterns, while the
//! repeated-word rule needs a hand-rolled scanner (no backreferences in the
//! `regex` engine) and word/phrase lists scan faster without a compiled
//! alternation.

mod annotate;
mod proximity;
mod words;

pub use annotate::annotate;
pub use proximity::best_match_near;
pub use words::{RepeatedWordMatcher, WordSeqMatcher};

use regex::Regex;
use std::sync::OnceLock;

/// Pattern-scanning capability: all non-empty match spans over `text`, as
/// half-open byte ranges in left-to-right order.
pub trait Matcher: Send + Sync {
    fn scan(&self, text: &str) -> Vec<(usize, usize)>;
}

/// Regex-backed matcher.
pub struct RegexMatcher {
    re: Regex,
}

impl RegexMatcher {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            re: Regex::new(pattern)?,
        })
    }
}

impl Matcher for RegexMatcher {
    fn scan(&self, text: &str) -> Vec<(usize, usize)> {
        // With a capture group the reported span is group 1, so a pattern can
        // anchor on context without annotating it.
        if self.re.captures_len() > 1 {
            self.re
                .captures_iter(text)
                .filter_map(|c| c.get(1))
                .filter(|m| m.end() > m.start())
                .map(|m| (m.start(), m.end()))
                .collect()
        } else {
            self.re
                .find_iter(text)
                .filter(|m| m.end() > m.start())
                .map(|m| (m.start(), m.end()))
                .collect()
        }
    }
}

/// Rendering class attached to an annotation span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleTag {
    Repetition,
    Passive,
    Cliche,
    Filler,
    Whitespace,
}

impl StyleTag {
    /// Stable class name for the rendering collaborator.
    pub fn class_name(self) -> &'static str {
        match self {
            StyleTag::Repetition => "repetition",
            StyleTag::Passive => "passive",
            StyleTag::Cliche => "cliche",
            StyleTag::Filler => "filler",
            StyleTag::Whitespace => "whitespace",
        }
    }
}

/// One style rule: identity, acceptance priority, rendering metadata, and
/// the matcher that produces its spans. Immutable for the process lifetime.
pub struct Rule {
    pub id: &'static str,
    /// Higher wins during overlap resolution; ties break by earliest start.
    pub priority: u8,
    pub label: &'static str,
    pub description: &'static str,
    pub style: StyleTag,
    matcher: Box<dyn Matcher>,
}

impl Rule {
    pub fn new(
        id: &'static str,
        priority: u8,
        label: &'static str,
        description: &'static str,
        style: StyleTag,
        matcher: Box<dyn Matcher>,
    ) -> Self {
        Self {
            id,
            priority,
            label,
            description,
            style,
            matcher,
        }
    }

    pub fn scan(&self, text: &str) -> Vec<(usize, usize)> {
        self.matcher.scan(text)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .finish()
    }
}

/// A matched span attributed to a rule. Transient: produced per scan, never
/// stored across edits.
#[derive(Debug, Clone, Copy)]
pub struct Match<'r> {
    pub start: usize,
    pub end: usize,
    pub rule: &'r Rule,
}

impl<'r> Match<'r> {
    /// Half-open intersection test against another span.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

fn regex_rule(
    id: &'static str,
    priority: u8,
    label: &'static str,
    description: &'static str,
    style: StyleTag,
    pattern: &str,
) -> Rule {
    // Built-in patterns are literals; a failure here is a programming error
    // caught by the rule-table tests.
    let matcher = RegexMatcher::new(pattern).unwrap_or_else(|e| {
        panic!("built-in rule {id}: invalid pattern: {e}");
    });
    Rule::new(id, priority, label, description, style, Box::new(matcher))
}

fn builtin_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "repeated-word",
            90,
            "Repeated word",
            "The same word appears twice in a row.",
            StyleTag::Repetition,
            Box::new(RepeatedWordMatcher::new()),
        ),
        regex_rule(
            "passive-voice",
            70,
            "Passive voice",
            "A form of 'to be' followed by a past participle.",
            StyleTag::Passive,
            r"(?i)\b(?:am|is|are|was|were|be|been|being)\s+\w+ed\b",
        ),
        Rule::new(
            "cliche",
            60,
            "Cliché",
            "A worn-out stock phrase.",
            StyleTag::Cliche,
            Box::new(WordSeqMatcher::phrases(&[
                "at the end of the day",
                "in a nutshell",
                "low hanging fruit",
                "think outside the box",
                "the fact of the matter",
                "last but not least",
            ])),
        ),
        Rule::new(
            "filler-word",
            50,
            "Filler word",
            "A hedge or intensifier that rarely adds meaning.",
            StyleTag::Filler,
            Box::new(WordSeqMatcher::words(&[
                "very",
                "really",
                "quite",
                "basically",
                "actually",
                "literally",
                "somewhat",
                "arguably",
            ])),
        ),
        regex_rule(
            "multiple-spaces",
            40,
            "Multiple spaces",
            "Two or more consecutive spaces between words.",
            StyleTag::Whitespace,
            r"\S(  +)\S",
        ),
        regex_rule(
            "trailing-whitespace",
            30,
            "Trailing whitespace",
            "Spaces or tabs at the end of a line.",
            StyleTag::Whitespace,
            r"(?m)[ \t]+$",
        ),
    ]
}

/// The process-wide rule table, built on first use.
pub fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        let table = builtin_rules();
        tracing::debug!(target: "rules", count = table.len(), "rule_table_initialized");
        table
    })
}
