//! Line-oriented extraction.
//!
//! Works on the raw line array without parsing: a windowed substring search
//! finds the fragment, a keyword scan finds the enclosing method, and the
//! rewrite is a splice of the line array. There is no singleton-block
//! detection here; a method inside `class << self` is treated as an
//! instance method.

pub mod context;
pub mod locator;
pub mod transform;

use tracing::debug;

use crate::core::config::ExtractConfig;
use crate::core::errors::{ExtractError, Result};
use crate::core::naming::{resolve_method_name, MethodNameProvider};
use crate::core::pipeline::{ExtractionStage, ExtractionStrategy, FragmentTarget, Rewrite};

pub use context::{LineContextScanner, LineMethodContext};
pub use locator::{normalize_snippet, LineLocator, LineRange};
pub use transform::{join_lines, LineTransformer};

/// Line-based strategy. Never parses the file.
pub struct TextStrategy {
    locator: LineLocator,
    transformer: LineTransformer,
}

impl TextStrategy {
    /// Strategy using the search radius and indent width from `config`.
    pub fn new(config: &ExtractConfig) -> Self {
        Self {
            locator: LineLocator::new(config.search_radius),
            transformer: LineTransformer::new(config.indent_unit()),
        }
    }
}

impl ExtractionStrategy for TextStrategy {
    type Document = Vec<String>;
    type Fragment = LineRange;
    type Context = LineMethodContext;

    fn name(&self) -> &'static str {
        "text"
    }

    fn load(&mut self, source: &str) -> Result<Vec<String>> {
        Ok(source.lines().map(str::to_string).collect())
    }

    fn locate(&self, lines: &Vec<String>, target: &FragmentTarget) -> Result<LineRange> {
        let snippet = normalize_snippet(&target.snippet);
        let found = self.locator.locate(lines, &snippet, target.line);
        debug!(hint = target.line, found = ?found, "Searched line window");
        found.ok_or_else(|| {
            ExtractError::fragment_not_located(target.line, target.column, &target.snippet)
        })
    }

    fn classify_context(&self, lines: &Vec<String>, fragment: &LineRange) -> Result<LineMethodContext> {
        LineContextScanner::scan(lines, *fragment)
    }

    fn rewrite(
        &mut self,
        lines: Vec<String>,
        fragment: LineRange,
        context: LineMethodContext,
        names: &mut dyn MethodNameProvider,
    ) -> Result<Rewrite> {
        let method_name = resolve_method_name(None, names)?;
        let rewritten = self.transformer.rewrite(&lines, fragment, &context, &method_name);

        Ok(Rewrite {
            source: join_lines(&rewritten),
            method_name,
            kind: context.kind,
            stage: ExtractionStage::Rewritten,
        })
    }
}
