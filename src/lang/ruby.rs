//! Ruby language adapter with tree-sitter integration.
//!
//! The concrete tree-sitter tree is lowered into the engine's own
//! [`SyntaxTree`]. Only named, non-comment nodes survive; definitions,
//! singleton blocks and calls get dedicated kinds, everything else keeps
//! the grammar's kind name.

use std::ops::Range;
use std::sync::Arc;

use tree_sitter::{Node, Parser};
use tracing::debug;

use super::common::{
    NodeId, NodeIdAllocator, NodeKind, SourceParser, SourceSpan, SyntaxNode, SyntaxTree,
};
use crate::core::errors::{ExtractError, Result};

const LANGUAGE_KEY: &str = "ruby";

/// Grammar nodes that never become statements.
const IGNORED_KINDS: &[&str] = &["comment", "empty_statement", "heredoc_body", "heredoc_end"];

/// Ruby parser producing [`SyntaxTree`]s.
pub struct RubyAdapter {
    parser: Parser,
}

impl RubyAdapter {
    /// Create a new Ruby adapter
    pub fn new() -> Result<Self> {
        let language = tree_sitter_ruby::LANGUAGE.into();
        let mut parser = Parser::new();
        parser.set_language(&language).map_err(|e| {
            ExtractError::parse(LANGUAGE_KEY, format!("Failed to set Ruby language: {:?}", e))
        })?;

        Ok(Self { parser })
    }
}

impl SourceParser for RubyAdapter {
    fn language(&self) -> &'static str {
        LANGUAGE_KEY
    }

    fn parse(&mut self, source: &str) -> Result<SyntaxTree> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ExtractError::parse(LANGUAGE_KEY, "Failed to parse Ruby source code"))?;

        let program = tree.root_node();
        if program.has_error() {
            let (line, column) = first_error_position(program);
            return Err(ExtractError::parse_at(
                LANGUAGE_KEY,
                format!("syntax error near line {line}, column {column}"),
                line,
                column,
            ));
        }

        let mut lowering = Lowering {
            source: Arc::from(source),
            ids: NodeIdAllocator::default(),
            heredocs: heredoc_pairs(program, source),
        };

        let statements = lowering.named_children(program, &[]);
        let root = match lowering.sequence(statements) {
            Some(root) => root,
            None => {
                let span = lowering.span_of(program, None);
                Arc::new(SyntaxNode::parsed(
                    lowering.ids.allocate(),
                    NodeKind::Statements,
                    None,
                    Vec::new(),
                    span,
                ))
            }
        };

        let root_range = root
            .span()
            .map(|span| span.bytes.clone())
            .unwrap_or(0..source.len());

        debug!(
            nodes = lowering.ids.peek(),
            "Lowered Ruby source into syntax tree"
        );

        Ok(SyntaxTree::new(
            root,
            lowering.source,
            root_range,
            lowering.ids.peek(),
        ))
    }
}

/// 1-based line and 0-based column of the innermost error. Inside an
/// `ERROR` node without erroring children, the last child is where the
/// parser gave up.
fn first_error_position(node: Node) -> (usize, usize) {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();

    if let Some(child) = children
        .iter()
        .find(|child| child.is_missing() || child.is_error() || child.has_error())
    {
        return first_error_position(*child);
    }

    let position = match children.last() {
        Some(last) if node.is_error() => last.start_position(),
        _ => node.start_position(),
    };
    (position.row + 1, position.column)
}

/// Byte ranges of heredoc openers paired with the end of their bodies,
/// in document order.
fn heredoc_pairs(program: Node, source: &str) -> Vec<(Range<usize>, usize)> {
    let mut openers = Vec::new();
    let mut bodies = Vec::new();
    let mut stack = vec![program];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "heredoc_beginning" => openers.push(node.byte_range()),
            "heredoc_body" => {
                let text = source.get(node.byte_range()).unwrap_or_default();
                bodies.push(node.start_byte() + text.trim_end().len());
            }
            _ => {}
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }

    openers.sort_by_key(|range| range.start);
    bodies.sort_unstable();
    openers.into_iter().zip(bodies).collect()
}

struct Lowering {
    source: Arc<str>,
    ids: NodeIdAllocator,
    heredocs: Vec<(Range<usize>, usize)>,
}

impl Lowering {
    fn lower(&mut self, node: Node) -> Arc<SyntaxNode> {
        let id = self.ids.allocate();

        let (kind, name_node, children) = match node.kind() {
            "method" => {
                let body = self.body(node, &["name", "parameters"]);
                (NodeKind::MethodDef, node.child_by_field_name("name"), body.into_iter().collect())
            }
            "singleton_method" => {
                let mut children = Vec::with_capacity(2);
                match node.child_by_field_name("object") {
                    Some(receiver) => children.push(self.lower(receiver)),
                    None => return self.lower_generic(id, node),
                }
                children.extend(self.body(node, &["name", "parameters", "object"]));
                (NodeKind::SingletonMethodDef, node.child_by_field_name("name"), children)
            }
            "singleton_class" => {
                let mut children = Vec::with_capacity(2);
                match node.child_by_field_name("value") {
                    Some(value) => children.push(self.lower(value)),
                    None => return self.lower_generic(id, node),
                }
                children.extend(self.body(node, &["value"]));
                (NodeKind::SingletonClass, None, children)
            }
            "class" | "module" => {
                let body = self.body(node, &["name", "superclass"]);
                (NodeKind::TypeDef, node.child_by_field_name("name"), body.into_iter().collect())
            }
            "call" | "method_call" => {
                let children = self.named_children(node, &["method"]);
                (NodeKind::Call, node.child_by_field_name("method"), children)
            }
            "self" => (NodeKind::SelfRef, None, Vec::new()),
            _ => return self.lower_generic(id, node),
        };

        let name = name_node.map(|n| self.text(n.byte_range()).to_string());
        let span = self.span_of(node, name_node.map(|n| n.byte_range()));
        Arc::new(SyntaxNode::parsed(id, kind, name, children, span))
    }

    fn lower_generic(&mut self, id: NodeId, node: Node) -> Arc<SyntaxNode> {
        let children = self.named_children(node, &[]);
        let span = self.span_of(node, None);
        Arc::new(SyntaxNode::parsed(
            id,
            NodeKind::Other(node.kind()),
            None,
            children,
            span,
        ))
    }

    /// Lowered named children, skipping the given fields, comments and any
    /// child that would break left-to-right byte order.
    fn named_children(&mut self, node: Node, skipped_fields: &[&str]) -> Vec<Arc<SyntaxNode>> {
        let mut selected = Vec::new();
        let mut cursor = node.walk();
        if cursor.goto_first_child() {
            loop {
                let child = cursor.node();
                let skipped = cursor
                    .field_name()
                    .is_some_and(|field| skipped_fields.contains(&field));
                if child.is_named() && !skipped && !IGNORED_KINDS.contains(&child.kind()) {
                    selected.push(child);
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }

        self.lower_ordered(selected)
    }

    /// Statements making up the body of a definition or block.
    fn body(&mut self, node: Node, skipped_fields: &[&str]) -> Option<Arc<SyntaxNode>> {
        let statements = match node.child_by_field_name("body") {
            Some(body) if body.kind() == "body_statement" => self.named_children(body, &[]),
            // endless method: `def area = width * height`
            Some(body) => vec![self.lower(body)],
            None => {
                let mut cursor = node.walk();
                let unfielded = node
                    .named_children(&mut cursor)
                    .find(|child| child.kind() == "body_statement");
                match unfielded {
                    Some(body) => self.named_children(body, &[]),
                    None => self.named_children(node, skipped_fields),
                }
            }
        };
        self.sequence(statements)
    }

    fn lower_ordered(&mut self, nodes: Vec<Node>) -> Vec<Arc<SyntaxNode>> {
        let mut lowered = Vec::with_capacity(nodes.len());
        let mut last_end = 0;
        for node in nodes {
            if node.start_byte() < last_end {
                debug!(kind = node.kind(), "Skipping out-of-order child");
                continue;
            }
            last_end = self.extended_end(node);
            lowered.push(self.lower(node));
        }
        lowered
    }

    /// Zero statements is no body, one is the statement itself, more are
    /// wrapped in a statement sequence spanning all of them.
    fn sequence(&mut self, mut statements: Vec<Arc<SyntaxNode>>) -> Option<Arc<SyntaxNode>> {
        match statements.len() {
            0 => None,
            1 => statements.pop(),
            _ => {
                let first = statements.first()?.span()?.clone();
                let last = statements.last()?.span()?.clone();
                Some(Arc::new(SyntaxNode::parsed(
                    self.ids.allocate(),
                    NodeKind::Statements,
                    None,
                    statements,
                    SourceSpan::covering(&first, &last),
                )))
            }
        }
    }

    fn span_of(&self, node: Node, name_bytes: Option<Range<usize>>) -> SourceSpan {
        let start = node.start_position();
        let end = node.end_position();
        let span = SourceSpan::new(
            Arc::clone(&self.source),
            node.byte_range(),
            (
                start.row + 1,
                self.char_column(node.start_byte(), start.column),
            ),
            (end.row + 1, self.char_column(node.end_byte(), end.column)),
        )
        .with_name_bytes(name_bytes);

        let end = self.extended_end(node);
        if end > node.end_byte() {
            span.extended_to(end, self.position_of(end))
        } else {
            span
        }
    }

    /// End of `node` including the bodies of heredocs it opens. Bodies
    /// follow the line of their opener, outside the opener's own node.
    fn extended_end(&self, node: Node) -> usize {
        let range = node.byte_range();
        self.heredocs
            .iter()
            .filter(|(opener, _)| range.start <= opener.start && opener.end <= range.end)
            .map(|(_, body_end)| *body_end)
            .fold(range.end, usize::max)
    }

    /// 1-based line and character column of byte `at`.
    fn position_of(&self, at: usize) -> (usize, usize) {
        let prefix = self.source.get(..at).unwrap_or_default();
        let line_start = prefix.rfind('\n').map_or(0, |newline| newline + 1);
        (
            prefix.matches('\n').count() + 1,
            prefix[line_start..].chars().count(),
        )
    }

    /// Tree-sitter columns count bytes; spans count characters.
    fn char_column(&self, byte: usize, byte_column: usize) -> usize {
        let line_start = byte.saturating_sub(byte_column);
        self.source
            .get(line_start..byte)
            .map_or(byte_column, |prefix| prefix.chars().count())
    }

    fn text(&self, range: Range<usize>) -> &str {
        self.source.get(range).unwrap_or_default()
    }
}
