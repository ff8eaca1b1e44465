//! Keyword scan for the method bracketing a line range.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::core::errors::{ExtractError, Result};
use crate::core::pipeline::MethodKind;

use super::locator::LineRange;

static METHOD_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*def\b").expect("method opening pattern is valid"));
static BLOCK_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*end\b").expect("block closing pattern is valid"));

const STATIC_MARKER: &str = "def self.";

/// Lines of the enclosing method as found by the keyword scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMethodContext {
    /// From the `def` line to the closing `end` line
    pub range: LineRange,
    /// Binding, from the `def self.` marker
    pub kind: MethodKind,
    /// Leading whitespace of the `def` line
    pub indentation: String,
}

/// Keyword scan over the raw lines of a file.
pub struct LineContextScanner;

impl LineContextScanner {
    /// Nearest `def` at or above the fragment's first line and nearest
    /// `end` below its last line.
    pub fn scan(lines: &[String], fragment: LineRange) -> Result<LineMethodContext> {
        let not_found = || ExtractError::enclosing_method_not_found(fragment.start);

        let start = (0..fragment.start.min(lines.len()))
            .rev()
            .find(|&index| METHOD_OPEN.is_match(&lines[index]))
            .ok_or_else(not_found)?;

        let end = (fragment.end..lines.len())
            .find(|&index| BLOCK_CLOSE.is_match(&lines[index]))
            .ok_or_else(not_found)?;

        let opening = &lines[start];
        let kind = if opening.contains(STATIC_MARKER) {
            MethodKind::Static
        } else {
            MethodKind::Instance
        };
        let indentation: String = opening
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();

        let range = LineRange::new(start + 1, end + 1);
        debug!(method_lines = %range, kind = %kind, "Found enclosing method by keyword scan");

        Ok(LineMethodContext {
            range,
            kind,
            indentation,
        })
    }
}
