//! Layout-preserving Ruby printer.
//!
//! Parsed nodes are reproduced by copying their original text and splicing
//! re-rendered children into the byte slots those children occupied.
//! Synthesized nodes (the replacement call, the new method, wrapping
//! statement sequences) are rendered from scratch at the indentation of the
//! place they land in.

use std::ops::Range;
use std::sync::Arc;

use super::common::{NodeKind, SourcePrinter, SourceSpan, SyntaxNode, SyntaxTree};
use crate::core::errors::{ExtractError, Result};

/// Printer for trees produced by [`super::ruby::RubyAdapter`].
#[derive(Debug, Clone)]
pub struct RubyPrinter {
    indent_unit: String,
}

impl Default for RubyPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl RubyPrinter {
    /// Printer indenting with two spaces.
    pub fn new() -> Self {
        Self::with_indent_unit("  ")
    }

    /// Printer indenting synthesized bodies by `unit`.
    pub fn with_indent_unit(unit: impl Into<String>) -> Self {
        Self {
            indent_unit: unit.into(),
        }
    }

    fn render(&self, node: &Arc<SyntaxNode>, indent: &str, out: &mut String) -> Result<()> {
        match node.span() {
            Some(span) => self.render_spliced(node, span, out),
            None => self.render_synthesized(node, indent, out),
        }
    }

    fn render_spliced(&self, node: &SyntaxNode, span: &SourceSpan, out: &mut String) -> Result<()> {
        let source = span.source();
        let mut cursor = span.bytes.start;
        let mut previous: Option<Range<usize>> = None;

        for (index, (child, slot)) in node.children().iter().zip(node.slots()).enumerate() {
            match slot {
                Some(range) => {
                    self.copy_own_text(node, source, cursor..range.start, out)?;
                    let child_indent = line_indent(source, range.start);
                    self.render(child, &child_indent, out)?;
                    cursor = range.end;
                    previous = Some(range.clone());
                }
                None => match &previous {
                    Some(sibling) if node.kind().body_index() != Some(index) => {
                        let sibling_indent = line_indent(source, sibling.start);
                        out.push_str("\n\n");
                        out.push_str(&sibling_indent);
                        self.render(child, &sibling_indent, out)?;
                    }
                    _ => {
                        // body-less container: open a body before the closing keyword
                        let closing = closing_keyword_start(span);
                        let head = slice(source, cursor..closing)?.trim_end();
                        self.copy_own_text(node, source, cursor..cursor + head.len(), out)?;

                        let outer_indent = line_indent(source, span.bytes.start);
                        let body_indent = format!("{outer_indent}{}", self.indent_unit);
                        out.push('\n');
                        out.push_str(&body_indent);
                        self.render(child, &body_indent, out)?;
                        out.push('\n');
                        out.push_str(&outer_indent);
                        cursor = closing;
                    }
                },
            }
        }

        self.copy_own_text(node, source, cursor..span.bytes.end, out)
    }

    /// Copy text that belongs to `node` itself, substituting a changed name
    /// inside the name token.
    fn copy_own_text(
        &self,
        node: &SyntaxNode,
        source: &str,
        range: Range<usize>,
        out: &mut String,
    ) -> Result<()> {
        let name_bytes = node.span().and_then(|span| span.name_bytes.clone());
        match (name_bytes, node.name()) {
            (Some(name_range), Some(name))
                if range.start <= name_range.start && name_range.end <= range.end =>
            {
                out.push_str(slice(source, range.start..name_range.start)?);
                out.push_str(name);
                out.push_str(slice(source, name_range.end..range.end)?);
            }
            _ => out.push_str(slice(source, range)?),
        }
        Ok(())
    }

    fn render_synthesized(&self, node: &SyntaxNode, indent: &str, out: &mut String) -> Result<()> {
        match node.kind() {
            NodeKind::Statements => {
                let children = node.children();
                for (index, child) in children.iter().enumerate() {
                    if index > 0 {
                        let spaced = child.kind().is_definition()
                            || children[index - 1].kind().is_definition();
                        out.push_str(if spaced { "\n\n" } else { "\n" });
                        out.push_str(indent);
                    }
                    self.render(child, indent, out)?;
                }
                Ok(())
            }
            NodeKind::MethodDef | NodeKind::SingletonMethodDef => {
                self.render_definition(node, indent, out)
            }
            NodeKind::Call => {
                let name = node
                    .name()
                    .ok_or_else(|| ExtractError::internal("synthesized call has no name"))?;
                out.push_str(name);
                Ok(())
            }
            NodeKind::SelfRef => {
                out.push_str("self");
                Ok(())
            }
            other => Err(ExtractError::internal(format!(
                "cannot render synthesized {other:?} node"
            ))),
        }
    }

    fn render_definition(&self, node: &SyntaxNode, indent: &str, out: &mut String) -> Result<()> {
        let name = node
            .name()
            .ok_or_else(|| ExtractError::internal("synthesized method has no name"))?;

        out.push_str("def ");
        if node.kind() == NodeKind::SingletonMethodDef {
            match node.children().first() {
                Some(receiver) => self.render(receiver, indent, out)?,
                None => out.push_str("self"),
            }
            out.push('.');
        }
        out.push_str(name);

        let body_indent = format!("{indent}{}", self.indent_unit);
        if let Some(body) = node.body() {
            let mut rendered = String::new();
            self.render(body, &body_indent, &mut rendered)?;

            let original_indent = body
                .span()
                .map_or(0, |span| line_indent(span.source(), span.bytes.start).len());

            out.push('\n');
            out.push_str(&body_indent);
            out.push_str(&reindent(&rendered, original_indent, &body_indent));
        }

        out.push('\n');
        out.push_str(indent);
        out.push_str("end");
        Ok(())
    }
}

impl SourcePrinter for RubyPrinter {
    fn print(&self, tree: &SyntaxTree) -> Result<String> {
        let source = tree.source();
        let range = tree.root_range();

        let mut out = String::with_capacity(source.len() + 128);
        out.push_str(slice(source, 0..range.start)?);
        let indent = line_indent(source, range.start);
        self.render(tree.root(), &indent, &mut out)?;
        out.push_str(slice(source, range.end..source.len())?);
        Ok(out)
    }
}

fn slice(source: &str, range: Range<usize>) -> Result<&str> {
    source.get(range.clone()).ok_or_else(|| {
        ExtractError::internal(format!("byte range {range:?} is outside the source text"))
    })
}

/// Leading whitespace of the line containing byte `at`.
fn line_indent(source: &str, at: usize) -> String {
    let line_start = source
        .get(..at)
        .and_then(|prefix| prefix.rfind('\n'))
        .map_or(0, |newline| newline + 1);

    source
        .get(line_start..)
        .unwrap_or_default()
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

/// Start of a trailing `end` keyword, or the end of the span.
fn closing_keyword_start(span: &SourceSpan) -> usize {
    if span.text().ends_with("end") {
        span.bytes.end - "end".len()
    } else {
        span.bytes.end
    }
}

/// Shift every line after the first from `strip` columns of leading
/// whitespace to `indent`. Blank lines stay empty.
fn reindent(text: &str, strip: usize, indent: &str) -> String {
    let mut lines = text.split('\n');
    let mut result = lines.next().unwrap_or_default().to_string();

    for line in lines {
        result.push('\n');
        if line.trim().is_empty() {
            continue;
        }
        let leading = line
            .chars()
            .take(strip)
            .take_while(|c| *c == ' ' || *c == '\t')
            .count();
        result.push_str(indent);
        result.push_str(&line[leading..]);
    }

    result
}
