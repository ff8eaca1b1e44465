//! Tree rewriting: swap the fragment for a call and insert the new method.
//!
//! Every rewrite returns a new tree. Only the spine from the root to each
//! edited node is rebuilt; untouched subtrees are shared with the input.

use std::sync::Arc;

use tracing::debug;

use crate::core::errors::{ExtractError, Result};
use crate::core::pipeline::MethodKind;
use crate::lang::common::{NodeId, NodeIdAllocator, NodeKind, SyntaxNode, SyntaxTree};

use super::context::MethodContext;

/// Where the synthesized method is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPoint {
    /// Immediately after this node in its statement sequence
    After(NodeId),
    /// At the end of this container's body
    EndOfBody(NodeId),
    /// At the end of the file
    EndOfFile,
}

impl InsertionPoint {
    /// Placement rule for a method of `kind` extracted within `context`.
    pub fn for_context(context: &MethodContext) -> Self {
        let Some(method) = &context.method else {
            return Self::EndOfFile;
        };

        if context.kind.is_type_level() {
            if let Some(container) = context.type_level_container() {
                return Self::EndOfBody(container.id());
            }
        }

        Self::After(method.id())
    }
}

/// Builds the replacement call and the new method, then splices both into the tree.
pub struct TreeTransformer {
    ids: NodeIdAllocator,
}

impl TreeTransformer {
    /// Transformer allocating ids that do not clash with `tree`.
    pub fn for_tree(tree: &SyntaxTree) -> Self {
        Self {
            ids: tree.id_allocator(),
        }
    }

    /// Bare call to `name`.
    pub fn build_call(&mut self, name: &str) -> Arc<SyntaxNode> {
        Arc::new(SyntaxNode::synthesized(
            self.ids.allocate(),
            NodeKind::Call,
            Some(name.to_string()),
            Vec::new(),
        ))
    }

    /// Method definition named `name` whose body is `body`.
    pub fn build_method(
        &mut self,
        name: &str,
        body: Arc<SyntaxNode>,
        kind: MethodKind,
    ) -> Arc<SyntaxNode> {
        let id = self.ids.allocate();
        let node = if kind.is_type_level() {
            let receiver = Arc::new(SyntaxNode::synthesized(
                self.ids.allocate(),
                NodeKind::SelfRef,
                None,
                Vec::new(),
            ));
            SyntaxNode::synthesized(
                id,
                NodeKind::SingletonMethodDef,
                Some(name.to_string()),
                vec![receiver, body],
            )
        } else {
            SyntaxNode::synthesized(id, NodeKind::MethodDef, Some(name.to_string()), vec![body])
        };
        Arc::new(node)
    }

    /// Replace `fragment` with a call to `placeholder` and insert a method
    /// named `placeholder` whose body is the fragment.
    pub fn transform(
        &mut self,
        tree: &SyntaxTree,
        fragment: &Arc<SyntaxNode>,
        context: &MethodContext,
        placeholder: &str,
    ) -> Result<SyntaxTree> {
        let call = self.build_call(placeholder);
        let method = self.build_method(placeholder, Arc::clone(fragment), context.kind);

        let (root, replaced) = replace_node(tree.root(), fragment.id(), &call);
        if replaced != 1 {
            return Err(ExtractError::internal(format!(
                "expected exactly one replacement of the fragment, made {replaced}"
            ))
            .with_context("tree transform"));
        }

        let point = InsertionPoint::for_context(context);
        let root = self.insert(&root, point, &method).ok_or_else(|| {
            ExtractError::internal(format!("insertion point {point:?} not found in tree"))
                .with_context("tree transform")
        })?;

        debug!(?point, kind = %context.kind, "Inserted extracted method");
        Ok(tree.with_root(root, &self.ids))
    }

    fn insert(
        &mut self,
        root: &Arc<SyntaxNode>,
        point: InsertionPoint,
        method: &Arc<SyntaxNode>,
    ) -> Option<Arc<SyntaxNode>> {
        match point {
            InsertionPoint::After(anchor) if root.id() == anchor => {
                Some(self.sequence(vec![Arc::clone(root), Arc::clone(method)]))
            }
            InsertionPoint::After(anchor) => self.insert_after(root, anchor, method),
            InsertionPoint::EndOfBody(container) => self.append_to_body(root, container, method),
            InsertionPoint::EndOfFile => Some(self.append_to_sequence(root, method)),
        }
    }

    fn insert_after(
        &mut self,
        node: &Arc<SyntaxNode>,
        anchor: NodeId,
        method: &Arc<SyntaxNode>,
    ) -> Option<Arc<SyntaxNode>> {
        if let Some(index) = node.children().iter().position(|child| child.id() == anchor) {
            let updated = if node.kind() == NodeKind::Statements {
                node.with_child_inserted(index + 1, Arc::clone(method))
            } else {
                let pair = self.sequence(vec![Arc::clone(&node.children()[index]), Arc::clone(method)]);
                node.with_child_replaced(index, pair)
            };
            return Some(Arc::new(updated));
        }

        for (index, child) in node.children().iter().enumerate() {
            if let Some(rebuilt) = self.insert_after(child, anchor, method) {
                return Some(Arc::new(node.with_child_replaced(index, rebuilt)));
            }
        }
        None
    }

    fn append_to_body(
        &mut self,
        node: &Arc<SyntaxNode>,
        container: NodeId,
        method: &Arc<SyntaxNode>,
    ) -> Option<Arc<SyntaxNode>> {
        if node.id() == container {
            let body_index = node.kind().body_index()?;
            let updated = match node.children().get(body_index) {
                None if node.children().len() == body_index => {
                    let body = self.sequence(vec![Arc::clone(method)]);
                    node.with_child_inserted(body_index, body)
                }
                None => return None,
                Some(body) => {
                    let body = self.append_to_sequence(body, method);
                    node.with_child_replaced(body_index, body)
                }
            };
            return Some(Arc::new(updated));
        }

        for (index, child) in node.children().iter().enumerate() {
            if let Some(rebuilt) = self.append_to_body(child, container, method) {
                return Some(Arc::new(node.with_child_replaced(index, rebuilt)));
            }
        }
        None
    }

    /// Append to a statement sequence, or pair a single statement with the
    /// new method.
    fn append_to_sequence(&mut self, node: &Arc<SyntaxNode>, method: &Arc<SyntaxNode>) -> Arc<SyntaxNode> {
        if node.kind() == NodeKind::Statements {
            Arc::new(node.with_child_inserted(node.children().len(), Arc::clone(method)))
        } else {
            self.sequence(vec![Arc::clone(node), Arc::clone(method)])
        }
    }

    fn sequence(&mut self, statements: Vec<Arc<SyntaxNode>>) -> Arc<SyntaxNode> {
        Arc::new(SyntaxNode::synthesized(
            self.ids.allocate(),
            NodeKind::Statements,
            None,
            statements,
        ))
    }
}

/// Rebuild `node` with every node identified by `target` swapped for
/// `replacement`. Returns the new subtree and the number of swaps made;
/// unchanged subtrees are returned as the same allocation.
pub fn replace_node(
    node: &Arc<SyntaxNode>,
    target: NodeId,
    replacement: &Arc<SyntaxNode>,
) -> (Arc<SyntaxNode>, usize) {
    if node.id() == target {
        return (Arc::clone(replacement), 1);
    }

    let mut replaced = 0;
    let children: Vec<_> = node
        .children()
        .iter()
        .map(|child| {
            let (rebuilt, count) = replace_node(child, target, replacement);
            replaced += count;
            rebuilt
        })
        .collect();

    if replaced == 0 {
        return (Arc::clone(node), 0);
    }

    (Arc::new(node.with_children(children)), replaced)
}
