//! Line-window search for a snippet.

use std::fmt;

/// 1-based inclusive line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    /// First line
    pub start: usize,
    /// Last line
    pub end: usize,
}

impl LineRange {
    /// Range from `start` to `end`, both included.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of lines covered.
    pub fn line_count(&self) -> usize {
        self.end + 1 - self.start
    }

    /// 0-based indices into a line array.
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.start - 1..self.end
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Split a snippet into lines with surrounding blank lines dropped, the
/// common indentation stripped and trailing whitespace removed.
pub fn normalize_snippet(snippet: &str) -> Vec<String> {
    let lines: Vec<&str> = snippet.lines().collect();
    let first = lines.iter().position(|line| !line.trim().is_empty());
    let last = lines.iter().rposition(|line| !line.trim().is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return Vec::new();
    };

    let body = &lines[first..=last];
    let common = common_indent(body.iter().copied());

    body.iter()
        .map(|line| {
            let strip = leading_whitespace(line).min(common);
            line.get(strip..).unwrap_or_default().trim_end().to_string()
        })
        .collect()
}

/// Smallest leading-whitespace width over the non-blank lines.
pub fn common_indent<'a>(lines: impl Iterator<Item = &'a str>) -> usize {
    lines
        .filter(|line| !line.trim().is_empty())
        .map(leading_whitespace)
        .min()
        .unwrap_or(0)
}

/// Width of the run of spaces and tabs starting `line`.
pub fn leading_whitespace(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// Finds a snippet whose first line starts within `radius` lines of a hint.
#[derive(Debug, Clone, Copy)]
pub struct LineLocator {
    radius: usize,
}

impl LineLocator {
    /// Locator searching `radius` lines either side of the hint.
    pub fn new(radius: usize) -> Self {
        Self { radius }
    }

    /// First candidate line in `[hint - radius, hint + radius]` (1-based,
    /// clamped) where every snippet line is contained in the corresponding
    /// file line.
    pub fn locate(&self, lines: &[String], snippet: &[String], hint_line: usize) -> Option<LineRange> {
        let first_snippet_line = snippet.first()?;
        if lines.is_empty() {
            return None;
        }

        let low = hint_line.saturating_sub(self.radius).max(1);
        let high = hint_line.saturating_add(self.radius).min(lines.len());

        (low..=high).find_map(|start| {
            let index = start - 1;
            if !lines[index].contains(first_snippet_line.as_str()) {
                return None;
            }

            let fits = snippet.iter().enumerate().skip(1).all(|(offset, expected)| {
                lines
                    .get(index + offset)
                    .is_some_and(|line| line.contains(expected.as_str()))
            });

            fits.then(|| LineRange::new(start, start + snippet.len() - 1))
        })
    }
}
