//! Line-array rewrite for the text strategy.

use crate::core::naming::MethodName;
use crate::core::pipeline::MethodKind;

use super::context::LineMethodContext;
use super::locator::{common_indent, leading_whitespace, LineRange};

/// Splices the call line and the new method into a line array.
pub struct LineTransformer {
    indent_unit: String,
}

impl LineTransformer {
    /// Transformer indenting method bodies by `indent_unit`.
    pub fn new(indent_unit: impl Into<String>) -> Self {
        Self {
            indent_unit: indent_unit.into(),
        }
    }

    /// `def [self.]name` block for `body`, indented under `def_indent`,
    /// preceded by a blank separator line.
    pub fn definition_lines(
        &self,
        name: &MethodName,
        kind: MethodKind,
        body: &[String],
        def_indent: &str,
    ) -> Vec<String> {
        let prefix = if kind.is_type_level() { "def self." } else { "def " };
        let strip = common_indent(body.iter().map(String::as_str));

        let mut lines = Vec::with_capacity(body.len() + 3);
        lines.push(String::new());
        lines.push(format!("{def_indent}{prefix}{name}"));
        for line in body {
            if line.trim().is_empty() {
                lines.push(String::new());
            } else {
                let cut = leading_whitespace(line).min(strip);
                lines.push(format!("{def_indent}{}{}", self.indent_unit, &line[cut..]));
            }
        }
        lines.push(format!("{def_indent}end"));
        lines
    }

    /// Replace `fragment` with a call to `name` and insert the new method
    /// after the enclosing method's closing line.
    pub fn rewrite(
        &self,
        lines: &[String],
        fragment: LineRange,
        context: &LineMethodContext,
        name: &MethodName,
    ) -> Vec<String> {
        let body = &lines[fragment.indices()];
        let call_indent: String = lines[fragment.start - 1]
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();

        let mut result = Vec::with_capacity(lines.len() + body.len() + 3);
        result.extend_from_slice(&lines[..fragment.start - 1]);
        result.push(format!("{call_indent}{name}"));
        result.extend_from_slice(&lines[fragment.end..]);

        // the method's closing line moved up by the lines the call replaced
        let closing = context.range.end - (fragment.line_count() - 1);
        let definition = self.definition_lines(name, context.kind, body, &context.indentation);
        result.splice(closing..closing, definition);
        result
    }
}

/// File contents for a line array: joined with `\n`, one trailing newline.
pub fn join_lines(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
