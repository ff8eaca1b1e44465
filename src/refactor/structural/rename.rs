//! Renames the placeholder method and its call sites.

use std::sync::Arc;

use crate::lang::common::{NodeKind, SyntaxNode, SyntaxTree};

/// Rewrites every definition (either form) and every call named `from`
/// to `to`. Other nodes are left alone.
pub struct Renamer<'a> {
    from: &'a str,
    to: &'a str,
}

impl<'a> Renamer<'a> {
    /// Renamer from `from` to `to`.
    pub fn new(from: &'a str, to: &'a str) -> Self {
        Self { from, to }
    }

    /// Rename throughout `tree`, keeping its source and layout.
    pub fn rename_tree(&self, tree: &SyntaxTree) -> SyntaxTree {
        let root = self.rename(tree.root());
        tree.with_root(root, &tree.id_allocator())
    }

    /// Rename inside `node`. Untouched subtrees are shared, not copied.
    pub fn rename(&self, node: &Arc<SyntaxNode>) -> Arc<SyntaxNode> {
        let mut changed = false;
        let children: Vec<_> = node
            .children()
            .iter()
            .map(|child| {
                let renamed = self.rename(child);
                changed |= !Arc::ptr_eq(&renamed, child);
                renamed
            })
            .collect();

        let matches = is_renameable(node.kind()) && node.name() == Some(self.from);
        match (matches, changed) {
            (false, false) => Arc::clone(node),
            (false, true) => Arc::new(node.with_children(children)),
            (true, _) => Arc::new(node.with_children(children).renamed(self.to)),
        }
    }
}

fn is_renameable(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::MethodDef | NodeKind::SingletonMethodDef | NodeKind::Call
    )
}

/// Number of definitions and calls named `name`.
pub fn count_references(tree: &SyntaxTree, name: &str) -> usize {
    tree.preorder()
        .filter(|node| is_renameable(node.kind()) && node.name() == Some(name))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::common::{SourceParser, SourcePrinter};
    use crate::lang::printer::RubyPrinter;
    use crate::lang::ruby::RubyAdapter;

    const SOURCE: &str = "def tmp\n  1\nend\n\ndef self.tmp\n  2\nend\n\ntmp\nobj.tmp(3)\ntmp_value = 4\n";

    #[test]
    fn test_renames_definitions_and_calls() {
        let tree = RubyAdapter::new().unwrap().parse(SOURCE).unwrap();
        assert_eq!(count_references(&tree, "tmp"), 3);

        let renamed = Renamer::new("tmp", "total").rename_tree(&tree);
        assert_eq!(count_references(&renamed, "tmp"), 0);
        assert_eq!(count_references(&renamed, "total"), 3);

        let printed = RubyPrinter::new().print(&renamed).unwrap();
        assert_eq!(
            printed,
            "def total\n  1\nend\n\ndef self.total\n  2\nend\n\ntmp\nobj.total(3)\ntmp_value = 4\n"
        );
    }

    #[test]
    fn test_rename_is_idempotent() {
        let tree = RubyAdapter::new().unwrap().parse(SOURCE).unwrap();
        let renamer = Renamer::new("tmp", "total");
        let once = renamer.rename_tree(&tree);
        let twice = renamer.rename_tree(&once);

        let printer = RubyPrinter::new();
        assert_eq!(printer.print(&once).unwrap(), printer.print(&twice).unwrap());
    }

    #[test]
    fn test_untouched_tree_is_shared() {
        let tree = RubyAdapter::new().unwrap().parse("a\nb\n").unwrap();
        let renamed = Renamer::new("zzz", "yyy").rename_tree(&tree);
        assert!(Arc::ptr_eq(renamed.root(), tree.root()));
    }
}
