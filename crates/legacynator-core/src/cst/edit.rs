//! Path-copying edits on green trees
//!
//! Replacing a node rebuilds only the green nodes on the path from the edit
//! root down to the replaced node. Every sibling subtree is shared with the
//! original tree.

use rowan::{GreenNode, GreenNodeData, NodeOrToken};

use super::CsSyntaxNode;

/// Child indices (counting tokens) leading from `ancestor` down to `target`
///
/// Returns `None` when `target` is not inside `ancestor`; an empty path means
/// they are the same node.
pub fn path_to(ancestor: &CsSyntaxNode, target: &CsSyntaxNode) -> Option<Vec<usize>> {
    let mut path = Vec::new();
    let mut current = target.clone();

    while current != *ancestor {
        path.push(current.index());
        current = current.parent()?;
    }

    path.reverse();
    Some(path)
}

/// Replace the node at `path` below `root`
///
/// Returns `None` if the path does not lead to a node.
pub fn replace_at_path(
    root: &GreenNodeData,
    path: &[usize],
    replacement: GreenNode,
) -> Option<GreenNode> {
    let Some((&index, rest)) = path.split_first() else {
        return Some(replacement);
    };

    let child = root.children().nth(index)?.into_node()?;
    let new_child = replace_at_path(child, rest, replacement)?;
    Some(root.replace_child(index, NodeOrToken::Node(new_child)))
}

/// Green node for `ancestor` with `target` swapped for `replacement`
///
/// Falls back to the unchanged `ancestor` when `target` lies outside it.
pub fn replace_descendant(
    ancestor: &CsSyntaxNode,
    target: &CsSyntaxNode,
    replacement: GreenNode,
) -> GreenNode {
    let green = ancestor.green();
    path_to(ancestor, target)
        .and_then(|path| replace_at_path(&green, &path, replacement))
        .unwrap_or_else(|| green.into_owned())
}
