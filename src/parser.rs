//! Free-text order-line parser.
//!
//! Turns pasted or scanned text (one product per line) into
//! `{name, quantity, unit}` suggestions. Each line is tried against a fixed
//! list of patterns; the first match wins. Lines that match nothing still
//! become a single-piece entry unless they are too short to be a product.
//!
//! The result is a heuristic: callers should let the user confirm or edit it.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

pub const DEFAULT_QUANTITY: &str = "1";
pub const DEFAULT_UNIT: &str = "pezzi";

// Digits and unit words are ASCII only: `2 unità` is not a quantity and unit.

/// Lines this short (in characters, after trimming) are dropped when no
/// pattern matches them.
const MIN_FALLBACK_LEN: usize = 3;

static COUNT_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^((?-u:\d)+)\s*x?\s*(.+)$").unwrap());

static DASHED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s*[-–]\s*((?-u:\d)+(?:[.,](?-u:\d)+)?)\s*((?-u:\w)+)$").unwrap());

static SPACED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s+((?-u:\d)+(?:[.,](?-u:\d)+)?)\s*((?-u:\w)+)$").unwrap());

static JOINED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s*((?-u:\d)+(?:[.,](?-u:\d)+)?)((?-u:\w)+)$").unwrap());

/// A single product suggestion extracted from one input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLine {
    pub name: String,
    pub quantity: String,
    pub unit: String,
}

impl ParsedLine {
    pub fn new(
        name: impl Into<String>,
        quantity: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            unit: unit.into(),
        }
    }

    fn fallback(line: &str) -> Self {
        Self::new(strip_bullet(line), DEFAULT_QUANTITY, DEFAULT_UNIT)
    }
}

impl fmt::Display for ParsedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.name, self.quantity, self.unit)
    }
}

/// Recognised line shapes, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// `3x Mozzarella`, `3 Mozzarella`
    CountPrefix,
    /// `Limoni - 2 kg`
    Dashed,
    /// `Pollo intero 2 pezzi`
    Spaced,
    /// `Insalata mista 5kg`
    Joined,
}

impl PatternKind {
    pub const ALL: [PatternKind; 4] = [
        PatternKind::CountPrefix,
        PatternKind::Dashed,
        PatternKind::Spaced,
        PatternKind::Joined,
    ];

    fn regex(self) -> &'static Regex {
        match self {
            PatternKind::CountPrefix => &COUNT_PREFIX_REGEX,
            PatternKind::Dashed => &DASHED_REGEX,
            PatternKind::Spaced => &SPACED_REGEX,
            PatternKind::Joined => &JOINED_REGEX,
        }
    }

    /// Try this pattern on an already trimmed line.
    pub fn extract(self, line: &str) -> Option<ParsedLine> {
        let caps = self.regex().captures(line)?;
        let parsed = match self {
            PatternKind::CountPrefix => {
                ParsedLine::new(strip_bullet(&caps[2]), &caps[1], DEFAULT_UNIT)
            }
            PatternKind::Dashed | PatternKind::Spaced | PatternKind::Joined => {
                let unit = caps
                    .get(3)
                    .map(|m| m.as_str())
                    .filter(|u| !u.is_empty())
                    .unwrap_or(DEFAULT_UNIT);
                ParsedLine::new(
                    strip_bullet(&caps[1]),
                    normalize_quantity(&caps[2]),
                    unit.to_lowercase(),
                )
            }
        };
        Some(parsed)
    }
}

/// Remove one leading list marker (`-`, `*`, `•`) and surrounding whitespace.
pub fn strip_bullet(text: &str) -> &str {
    let text = text.trim_start();
    text.strip_prefix(['-', '*', '•']).unwrap_or(text).trim()
}

fn normalize_quantity(raw: &str) -> String {
    raw.replacen(',', ".", 1)
}

/// Parse a single line. Returns `None` when the line is blank, or matches no
/// pattern and is too short to be a product name.
pub fn parse_line(line: &str) -> Option<ParsedLine> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    for kind in PatternKind::ALL {
        if let Some(parsed) = kind.extract(line) {
            trace!(?line, ?kind, ?parsed, "Matched order line");
            return Some(parsed);
        }
    }

    if line.chars().count() >= MIN_FALLBACK_LEN {
        let parsed = ParsedLine::fallback(line);
        trace!(?line, ?parsed, "No pattern matched, using fallback");
        Some(parsed)
    } else {
        trace!(?line, "Dropping short unmatched line");
        None
    }
}

/// Parse a block of text, one product per line, preserving input order.
pub fn parse_order_text(text: &str) -> Vec<ParsedLine> {
    text.split('\n').filter_map(parse_line).collect()
}
