//! Response Interpreter: best-effort decoding of a marker-formatted model reply.
//!
//! Expected reply shape (see `JOB_ANALYZER_SYSTEM`):
//! ```text
//! SKILLS: Rust, SQL
//! KEYWORDS: backend, data
//! RATING: 72%
//! free-form analysis...
//! ```
//! Interpretation is a total function: absent or malformed markers yield empty lists
//! and a zero rating.

use serde::{Deserialize, Serialize};

const SKILLS_MARKER: &str = "SKILLS:";
const KEYWORDS_MARKER: &str = "KEYWORDS:";
const RATING_MARKER: &str = "RATING:";
const LIST_SEPARATOR: &str = ", ";
const MAX_RATING: u8 = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub skills: Vec<String>,
    pub keywords: Vec<String>,
    /// 0–100.
    pub rating: u8,
    /// The interpreted text, unchanged.
    pub full_response: String,
}

/// Swappable decoder from reply text to `AnalysisResult`.
pub trait ResponseInterpreter: Send + Sync {
    fn interpret(&self, text: &str) -> AnalysisResult;
}

/// Reads the `SKILLS:` / `KEYWORDS:` / `RATING:` marker lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerInterpreter;

impl ResponseInterpreter for MarkerInterpreter {
    fn interpret(&self, text: &str) -> AnalysisResult {
        AnalysisResult {
            skills: marker_line(text, SKILLS_MARKER).map(split_list).unwrap_or_default(),
            keywords: marker_line(text, KEYWORDS_MARKER)
                .map(split_list)
                .unwrap_or_default(),
            rating: marker_line(text, RATING_MARKER)
                .map(parse_rating)
                .unwrap_or_default(),
            full_response: text.to_string(),
        }
    }
}

/// Remainder of the first line that starts with `marker`, ignoring leading whitespace.
fn marker_line<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    text.lines()
        .find_map(|line| line.trim_start().strip_prefix(marker))
}

fn split_list(rest: &str) -> Vec<String> {
    rest.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Leading decimal digits, clamped to 0–100. Anything else reads as 0.
fn parse_rating(rest: &str) -> u8 {
    let rest = rest.trim();
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let value = rest[..digits_end]
        .bytes()
        .fold(0u32, |acc, digit| {
            acc.saturating_mul(10)
                .saturating_add(u32::from(digit - b'0'))
        });
    // `min` keeps the value within u8 range before the cast.
    value.min(u32::from(MAX_RATING)) as u8
}
