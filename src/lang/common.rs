//! Common syntax-tree abstractions shared by the parser, printer and the
//! structural extraction pipeline.
//!
//! Nodes are immutable and reference counted so a rewrite can rebuild the
//! spine of the tree while sharing every untouched subtree. Identity is the
//! [`NodeId`] assigned when a node is created: a rebuilt node keeps its id,
//! a synthesized node receives a fresh one from a [`NodeIdAllocator`].

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::core::errors::Result;

/// Stable identity of a syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Raw numeric value.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out node ids that are unique within one tree.
#[derive(Debug, Default, Clone)]
pub struct NodeIdAllocator {
    next: u32,
}

impl NodeIdAllocator {
    /// Allocator whose first id is `next`.
    pub fn starting_at(next: u32) -> Self {
        Self { next }
    }

    /// Next unused id.
    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// First id that has not been handed out yet
    pub fn peek(&self) -> u32 {
        self.next
    }
}

/// Node kinds the extraction engine reasons about. Everything else keeps
/// the parser's own kind name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Ordered sequence of statements
    Statements,
    /// `def name ... end`
    MethodDef,
    /// `def self.name ... end` (any explicit receiver)
    SingletonMethodDef,
    /// `class << expr ... end`
    SingletonClass,
    /// `class` or `module` definition
    TypeDef,
    /// Method call
    Call,
    /// `self`
    SelfRef,
    /// Any other construct, tagged with the parser's kind name
    Other(&'static str),
}

impl NodeKind {
    /// `def name` or `def self.name`.
    pub fn is_method_definition(self) -> bool {
        matches!(self, Self::MethodDef | Self::SingletonMethodDef)
    }

    /// Definitions that deserve a blank line around them when rendered.
    pub fn is_definition(self) -> bool {
        matches!(
            self,
            Self::MethodDef | Self::SingletonMethodDef | Self::SingletonClass | Self::TypeDef
        )
    }

    /// Position of the body in the child list, for kinds that own a body.
    ///
    /// `MethodDef` and `TypeDef` children are `[body?]`; `SingletonMethodDef`
    /// and `SingletonClass` children are `[receiver, body?]`.
    pub fn body_index(self) -> Option<usize> {
        match self {
            Self::MethodDef | Self::TypeDef => Some(0),
            Self::SingletonMethodDef | Self::SingletonClass => Some(1),
            _ => None,
        }
    }
}

/// Where a parsed node came from.
#[derive(Clone)]
pub struct SourceSpan {
    /// 1-based first line
    pub start_line: usize,
    /// 0-based character column of the first character
    pub start_column: usize,
    /// 1-based last line
    pub end_line: usize,
    /// 0-based character column just past the last character
    pub end_column: usize,
    /// Byte range in the source text
    pub bytes: Range<usize>,
    /// Byte range of the name token, for definitions and calls
    pub name_bytes: Option<Range<usize>>,
    /// End of the node's own tokens. Differs from `bytes.end` only when
    /// the span was stretched over trailing heredoc bodies.
    pub head_end: usize,
    source: Arc<str>,
}

impl SourceSpan {
    /// Span over `bytes` of `source`. Positions are (1-based line, 0-based character column).
    pub fn new(
        source: Arc<str>,
        bytes: Range<usize>,
        start: (usize, usize),
        end: (usize, usize),
    ) -> Self {
        Self {
            start_line: start.0,
            start_column: start.1,
            end_line: end.0,
            end_column: end.1,
            head_end: bytes.end,
            bytes,
            name_bytes: None,
            source,
        }
    }

    /// Stretch the span to `end` (byte) ending at `position`, keeping
    /// `head_end` where it was.
    pub fn extended_to(mut self, end: usize, position: (usize, usize)) -> Self {
        if end > self.bytes.end {
            self.bytes.end = end;
            self.end_line = position.0;
            self.end_column = position.1;
        }
        self
    }

    /// Attach the byte range of the name token.
    pub fn with_name_bytes(mut self, name_bytes: Option<Range<usize>>) -> Self {
        self.name_bytes = name_bytes;
        self
    }

    /// Exact source text covered by this span.
    pub fn text(&self) -> &str {
        self.source.get(self.bytes.clone()).unwrap_or_default()
    }

    /// Source text up to `head_end`, without any trailing heredoc bodies.
    pub fn head_text(&self) -> &str {
        self.source
            .get(self.bytes.start..self.head_end)
            .unwrap_or_default()
    }

    /// The whole source text this span points into.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Span covering `first` through `last` (both from the same source).
    pub fn covering(first: &SourceSpan, last: &SourceSpan) -> Self {
        let mut span = Self::new(
            Arc::clone(&first.source),
            first.bytes.start..last.bytes.end,
            (first.start_line, first.start_column),
            (last.end_line, last.end_column),
        );
        span.head_end = last.head_end;
        span
    }

    /// Line-wise containment: `other` starts no earlier and ends no later.
    pub fn contains_lines(&self, other: &SourceSpan) -> bool {
        other.start_line >= self.start_line && other.end_line <= self.end_line
    }
}

impl fmt::Debug for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSpan")
            .field("start", &(self.start_line, self.start_column))
            .field("end", &(self.end_line, self.end_column))
            .field("bytes", &self.bytes)
            .finish()
    }
}

/// Immutable syntax node.
///
/// `slots` runs parallel to `children` and records, for every child, the
/// byte range that child occupied in the parsed source. Replacing a child
/// keeps its slot so the printer can splice the new rendering into the old
/// layout; inserted children have no slot.
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    id: NodeId,
    kind: NodeKind,
    name: Option<String>,
    children: Vec<Arc<SyntaxNode>>,
    slots: Vec<Option<Range<usize>>>,
    span: Option<SourceSpan>,
}

impl SyntaxNode {
    /// Node produced by a parser; child slots are taken from child spans.
    pub fn parsed(
        id: NodeId,
        kind: NodeKind,
        name: Option<String>,
        children: Vec<Arc<SyntaxNode>>,
        span: SourceSpan,
    ) -> Self {
        let slots = children
            .iter()
            .map(|child| child.span.as_ref().map(|s| s.bytes.clone()))
            .collect();

        Self {
            id,
            kind,
            name,
            children,
            slots,
            span: Some(span),
        }
    }

    /// Node created by a rewrite, with no source location.
    pub fn synthesized(
        id: NodeId,
        kind: NodeKind,
        name: Option<String>,
        children: Vec<Arc<SyntaxNode>>,
    ) -> Self {
        let slots = vec![None; children.len()];
        Self {
            id,
            kind,
            name,
            children,
            slots,
            span: None,
        }
    }

    /// Identity of this node, unique within its tree.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// What construct this node is.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Method name for definitions and calls, type name for type definitions.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Children in source order.
    pub fn children(&self) -> &[Arc<SyntaxNode>] {
        &self.children
    }

    pub(crate) fn slots(&self) -> &[Option<Range<usize>>] {
        &self.slots
    }

    /// Position in the original source; `None` for synthesized nodes.
    pub fn span(&self) -> Option<&SourceSpan> {
        self.span.as_ref()
    }

    /// Built by a rewrite rather than parsed.
    pub fn is_synthesized(&self) -> bool {
        self.span.is_none()
    }

    /// Original source text, for parsed nodes.
    pub fn text(&self) -> Option<&str> {
        self.span.as_ref().map(SourceSpan::text)
    }

    /// Body child, for kinds that own one.
    pub fn body(&self) -> Option<&Arc<SyntaxNode>> {
        self.kind
            .body_index()
            .and_then(|index| self.children.get(index))
    }

    /// `class << self`
    pub fn is_self_singleton_class(&self) -> bool {
        self.kind == NodeKind::SingletonClass
            && self
                .children
                .first()
                .is_some_and(|target| target.kind == NodeKind::SelfRef)
    }

    /// Same node with `children[index]` swapped; the layout slot is kept.
    pub fn with_child_replaced(&self, index: usize, child: Arc<SyntaxNode>) -> Self {
        let mut updated = self.clone();
        if let Some(existing) = updated.children.get_mut(index) {
            *existing = child;
        }
        updated
    }

    /// Same node with `child` inserted at `index` (clamped to the end).
    pub fn with_child_inserted(&self, index: usize, child: Arc<SyntaxNode>) -> Self {
        let mut updated = self.clone();
        let index = index.min(updated.children.len());
        updated.children.insert(index, child);
        updated.slots.insert(index, None);
        updated
    }

    /// Same node with a child list of identical shape.
    pub(crate) fn with_children(&self, children: Vec<Arc<SyntaxNode>>) -> Self {
        let mut updated = self.clone();
        updated.slots.resize(children.len(), None);
        updated.children = children;
        updated
    }

    /// Same node carrying `name`.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let mut updated = self.clone();
        updated.name = Some(name.into());
        updated
    }
}

/// Pre-order, depth-first traversal.
pub struct Preorder {
    stack: Vec<Arc<SyntaxNode>>,
}

impl Preorder {
    /// Traversal starting at `root`.
    pub fn new(root: &Arc<SyntaxNode>) -> Self {
        Self {
            stack: vec![Arc::clone(root)],
        }
    }
}

impl Iterator for Preorder {
    type Item = Arc<SyntaxNode>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev().cloned());
        Some(node)
    }
}

/// A parsed file: the root node plus what the printer needs to reproduce
/// the text around it.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    root: Arc<SyntaxNode>,
    source: Arc<str>,
    root_range: Range<usize>,
    next_id: u32,
}

impl SyntaxTree {
    /// Tree over `source`. `next_id` is the first id not used by any node.
    pub fn new(
        root: Arc<SyntaxNode>,
        source: Arc<str>,
        root_range: Range<usize>,
        next_id: u32,
    ) -> Self {
        Self {
            root,
            source,
            root_range,
            next_id,
        }
    }

    /// Top-level node.
    pub fn root(&self) -> &Arc<SyntaxNode> {
        &self.root
    }

    /// Full text of the parsed file.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Byte range of the parsed root; text outside it is carried verbatim.
    pub fn root_range(&self) -> Range<usize> {
        self.root_range.clone()
    }

    /// Allocator continuing after every id already present in this tree.
    pub fn id_allocator(&self) -> NodeIdAllocator {
        NodeIdAllocator::starting_at(self.next_id)
    }

    /// Same source and layout, new root.
    pub fn with_root(&self, root: Arc<SyntaxNode>, ids: &NodeIdAllocator) -> Self {
        Self {
            root,
            source: Arc::clone(&self.source),
            root_range: self.root_range.clone(),
            next_id: ids.peek().max(self.next_id),
        }
    }

    /// Every node, parents before children.
    pub fn preorder(&self) -> Preorder {
        Preorder::new(&self.root)
    }

    /// Node with identity `id`, if still present.
    pub fn find(&self, id: NodeId) -> Option<Arc<SyntaxNode>> {
        self.preorder().find(|node| node.id == id)
    }

    /// Number of nodes reachable from the root.
    pub fn node_count(&self) -> usize {
        self.preorder().count()
    }
}

/// Turns source text into a [`SyntaxTree`].
pub trait SourceParser {
    /// Language key, e.g. `"ruby"`
    fn language(&self) -> &'static str;

    /// Parse `source`; fails on syntax errors.
    fn parse(&mut self, source: &str) -> Result<SyntaxTree>;
}

/// Turns a (possibly rewritten) [`SyntaxTree`] back into source text.
pub trait SourcePrinter {
    /// Render `tree` as source text.
    fn print(&self, tree: &SyntaxTree) -> Result<String>;
}
