//! Finds the syntax node a fragment request points at.

use std::sync::Arc;

use tracing::debug;

use crate::core::pipeline::FragmentTarget;
use crate::lang::common::{SyntaxNode, SyntaxTree};

/// First node, in pre-order, that starts exactly at the target position and
/// whose trimmed source text equals the trimmed snippet. A statement opening
/// heredocs also matches on its text without the heredoc bodies.
pub fn locate(tree: &SyntaxTree, target: &FragmentTarget) -> Option<Arc<SyntaxNode>> {
    let wanted = target.snippet.trim();
    if wanted.is_empty() {
        return None;
    }

    let found = tree.preorder().find(|node| {
        node.span().is_some_and(|span| {
            span.start_line == target.line
                && span.start_column == target.column
                && (span.text().trim() == wanted || span.head_text().trim() == wanted)
        })
    });

    if found.is_none() {
        let starting_here: Vec<String> = candidates_at(tree, target.line, target.column)
            .iter()
            .map(|node| format!("{:?}", node.kind()))
            .collect();
        debug!(
            line = target.line,
            column = target.column,
            candidates = ?starting_here,
            "No node matches the requested snippet"
        );
    }

    found
}

/// Every node starting at `line`/`column`, outermost first.
pub fn candidates_at(tree: &SyntaxTree, line: usize, column: usize) -> Vec<Arc<SyntaxNode>> {
    tree.preorder()
        .filter(|node| {
            node.span()
                .is_some_and(|span| span.start_line == line && span.start_column == column)
        })
        .collect()
}
