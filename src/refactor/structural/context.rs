//! Classifies the method that encloses a located fragment.

use std::sync::Arc;

use tracing::debug;

use crate::core::errors::{ExtractError, Result};
use crate::core::pipeline::MethodKind;
use crate::lang::common::{NodeId, NodeKind, SourceSpan, SyntaxNode, SyntaxTree};

/// Where the fragment lives and where its new method should go.
#[derive(Debug, Clone)]
pub struct MethodContext {
    /// Innermost method definition enclosing the fragment
    pub method: Option<Arc<SyntaxNode>>,
    /// Binding the new method inherits
    pub kind: MethodKind,
    /// Nearest class or module around `method`
    pub type_def: Option<Arc<SyntaxNode>>,
    /// Nearest `class << self` around `method`, inside `type_def`
    pub singleton_block: Option<Arc<SyntaxNode>>,
}

impl MethodContext {
    fn top_level() -> Self {
        Self {
            method: None,
            kind: MethodKind::Instance,
            type_def: None,
            singleton_block: None,
        }
    }

    /// The fragment is not inside any method.
    pub fn is_top_level(&self) -> bool {
        self.method.is_none()
    }

    /// Body container that receives a type-level method, preferring the
    /// singleton block over the type itself.
    pub fn type_level_container(&self) -> Option<&Arc<SyntaxNode>> {
        self.singleton_block.as_ref().or(self.type_def.as_ref())
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Scope {
    in_singleton_block: bool,
}

/// Stateless analyzer; all traversal state is passed down explicitly.
pub struct ContextAnalyzer;

impl ContextAnalyzer {
    /// Classify the method around `fragment` and find where its extraction goes.
    pub fn analyze(tree: &SyntaxTree, fragment: &SyntaxNode) -> Result<MethodContext> {
        let target = fragment.span().ok_or_else(|| {
            ExtractError::internal("located fragment has no source position")
                .with_context("context analysis")
        })?;

        let mut innermost = None;
        find_enclosing(tree.root(), fragment.id(), target, Scope::default(), &mut innermost);

        let Some((method, kind)) = innermost else {
            debug!(line = target.start_line, "Fragment is outside any method");
            return Ok(MethodContext::top_level());
        };

        let (type_def, singleton_block) =
            insertion_scope(tree.root(), method.id(), None, None).unwrap_or((None, None));

        debug!(
            method = method.name().unwrap_or("<anonymous>"),
            kind = %kind,
            in_type = type_def.is_some(),
            in_singleton_block = singleton_block.is_some(),
            "Resolved enclosing method"
        );

        Ok(MethodContext {
            method: Some(method),
            kind,
            type_def,
            singleton_block,
        })
    }
}

/// Pre-order walk; a later (deeper) enclosing definition overwrites an
/// earlier one, so the innermost wins.
fn find_enclosing(
    node: &Arc<SyntaxNode>,
    fragment: NodeId,
    target: &SourceSpan,
    scope: Scope,
    innermost: &mut Option<(Arc<SyntaxNode>, MethodKind)>,
) {
    // definitions inside the fragment move with it
    if node.id() == fragment {
        return;
    }

    let scope = match node.kind() {
        NodeKind::TypeDef => Scope {
            in_singleton_block: false,
        },
        NodeKind::SingletonClass if node.is_self_singleton_class() => Scope {
            in_singleton_block: true,
        },
        _ => scope,
    };

    if node.kind().is_method_definition() {
        let encloses = node.span().is_some_and(|span| span.contains_lines(target));
        if encloses {
            let kind = match node.kind() {
                NodeKind::SingletonMethodDef => MethodKind::Static,
                _ if scope.in_singleton_block => MethodKind::SingletonContext,
                _ => MethodKind::Instance,
            };
            *innermost = Some((Arc::clone(node), kind));
        }
    }

    for child in node.children() {
        find_enclosing(child, fragment, target, scope, innermost);
    }
}

type InsertionScope = (Option<Arc<SyntaxNode>>, Option<Arc<SyntaxNode>>);

/// Nearest type definition and singleton block on the path to `method`.
fn insertion_scope(
    node: &Arc<SyntaxNode>,
    method: NodeId,
    type_def: Option<&Arc<SyntaxNode>>,
    singleton_block: Option<&Arc<SyntaxNode>>,
) -> Option<InsertionScope> {
    if node.id() == method {
        return Some((type_def.cloned(), singleton_block.cloned()));
    }

    let (type_def, singleton_block) = match node.kind() {
        NodeKind::TypeDef => (Some(node), None),
        NodeKind::SingletonClass if node.is_self_singleton_class() => (type_def, Some(node)),
        _ => (type_def, singleton_block),
    };

    node.children()
        .iter()
        .find_map(|child| insertion_scope(child, method, type_def, singleton_block))
}
