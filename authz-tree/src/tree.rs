// SPDX-License-Identifier: MIT OR Apache-2.0

//! Path tree storage.
//!
//! Every tree is an arena of nodes addressed by [`NodeId`] handles. Children are owned through
//! the arena and indexed by name under their parent, the parent link is a plain handle.

use std::collections::BTreeMap;
use std::fmt::Display;

use crate::principal::Principal;
use crate::rule::AccessRule;

/// Reserved name of every root node.
pub const ROOT_NODE_NAME: &str = "/";

/// Handle of one path tree inside an [`Authz`](crate::Authz) model.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct TreeId(pub(crate) u64);

impl Display for TreeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tree#{}", self.0)
    }
}

/// Handle of a node, valid for the tree it was created in.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct NodeId {
    tree: TreeId,
    index: usize,
}

impl NodeId {
    pub(crate) fn new(tree: TreeId, index: usize) -> Self {
        Self { tree, index }
    }

    /// Tree this node belongs to.
    pub fn tree(&self) -> TreeId {
        self.tree
    }

    /// Return true if this handle points at the root slot of its tree.
    pub fn is_root(&self) -> bool {
        self.index == PathTree::ROOT_INDEX
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.tree, self.index)
    }
}

/// A named node in a path tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: BTreeMap<String, NodeId>,
    pub(crate) access_rules: BTreeMap<Principal, AccessRule>,
}

impl TreeNode {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_owned(),
            parent,
            children: BTreeMap::new(),
            access_rules: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent of this node, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Direct children indexed by name.
    pub fn children(&self) -> &BTreeMap<String, NodeId> {
        &self.children
    }

    /// Handle of the direct child with the given name.
    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.children.get(name).copied()
    }

    /// Rules attached directly to this node, ordered by principal.
    pub fn access_rules(&self) -> impl ExactSizeIterator<Item = &AccessRule> {
        self.access_rules.values()
    }

    /// Rule attached to this node for the given principal.
    pub fn access_rule(&self, principal: &Principal) -> Option<&AccessRule> {
        self.access_rules.get(principal)
    }

    pub fn has_access_rules(&self) -> bool {
        !self.access_rules.is_empty()
    }
}

impl Display for TreeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[TreeNode: name={}, root={}]", self.name, self.is_root())
    }
}

/// Arena holding the nodes of one tree. Slots of detached nodes are left empty.
#[derive(Debug)]
pub(crate) struct PathTree {
    id: TreeId,
    nodes: Vec<Option<TreeNode>>,
}

impl PathTree {
    pub(crate) const ROOT_INDEX: usize = 0;

    pub(crate) fn new(id: TreeId) -> Self {
        Self {
            id,
            nodes: vec![Some(TreeNode::new(ROOT_NODE_NAME, None))],
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        NodeId::new(self.id, Self::ROOT_INDEX)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&TreeNode> {
        if id.tree != self.id {
            return None;
        }
        self.nodes.get(id.index).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        if id.tree != self.id {
            return None;
        }
        self.nodes.get_mut(id.index).and_then(Option::as_mut)
    }

    /// Append a child under `parent`. Caller has checked that `parent` exists and that the name
    /// is valid and free.
    pub(crate) fn insert_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = NodeId::new(self.id, self.nodes.len());
        self.nodes.push(Some(TreeNode::new(name, Some(parent))));
        if let Some(parent) = self.get_mut(parent) {
            parent.children.insert(name.to_owned(), id);
        }
        id
    }

    /// All nodes of the subtree starting at `from` (inclusive), depth-first pre-order.
    pub(crate) fn subtree(&self, from: NodeId) -> Vec<NodeId> {
        let mut visited = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            visited.push(id);
            // Reverse so siblings are visited in name order.
            stack.extend(node.children.values().rev().copied());
        }
        visited
    }

    /// Segments leading from `ancestor` down to `id`, `None` if `id` is not inside the subtree
    /// of `ancestor`.
    pub(crate) fn relative_segments(&self, ancestor: NodeId, id: NodeId) -> Option<Vec<&str>> {
        let mut segments = Vec::new();
        let mut current = id;
        while current != ancestor {
            let node = self.get(current)?;
            segments.push(node.name.as_str());
            current = node.parent?;
        }
        segments.reverse();
        Some(segments)
    }

    /// Unlink `id` from its parent and free the slots of its whole subtree. Returns the removed
    /// nodes.
    pub(crate) fn detach(&mut self, id: NodeId) -> Vec<(NodeId, TreeNode)> {
        let parent = self.get(id).and_then(|node| node.parent);
        let name = self.get(id).map(|node| node.name.clone());
        if let (Some(parent), Some(name)) = (parent, name) {
            if let Some(parent) = self.get_mut(parent) {
                parent.children.remove(&name);
            }
        }

        self.subtree(id)
            .into_iter()
            .filter_map(|removed| {
                self.nodes
                    .get_mut(removed.index)
                    .and_then(Option::take)
                    .map(|node| (removed, node))
            })
            .collect()
    }

    /// Drain all nodes of this tree.
    pub(crate) fn into_nodes(self) -> impl Iterator<Item = (NodeId, TreeNode)> {
        let tree = self.id;
        self.nodes
            .into_iter()
            .enumerate()
            .filter_map(move |(index, node)| node.map(|node| (NodeId::new(tree, index), node)))
    }
}

#[cfg(test)]
mod tests {
    use super::{PathTree, ROOT_NODE_NAME, TreeId};

    #[test]
    fn fresh_tree_has_only_root() {
        let tree = PathTree::new(TreeId(0));
        let root = tree.get(tree.root()).unwrap();

        assert_eq!(root.name(), ROOT_NODE_NAME);
        assert!(root.is_root());
        assert!(root.children().is_empty());
        assert_eq!(root.access_rules().len(), 0);
        assert_eq!(tree.subtree(tree.root()), vec![tree.root()]);
    }

    #[test]
    fn handles_from_other_trees_resolve_to_nothing() {
        let tree = PathTree::new(TreeId(0));
        let other = PathTree::new(TreeId(1));
        assert!(tree.get(other.root()).is_none());
    }

    #[test]
    fn subtree_and_detach() {
        let mut tree = PathTree::new(TreeId(0));
        let root = tree.root();
        let trunk = tree.insert_child(root, "trunk");
        let src = tree.insert_child(trunk, "src");
        let docs = tree.insert_child(trunk, "docs");
        let tags = tree.insert_child(root, "tags");

        assert_eq!(tree.get(src).unwrap().parent(), Some(trunk));
        assert_eq!(tree.get(trunk).unwrap().child("docs"), Some(docs));
        assert_eq!(tree.subtree(root), vec![root, tags, trunk, docs, src]);
        assert_eq!(
            tree.relative_segments(root, src),
            Some(vec!["trunk", "src"])
        );
        assert_eq!(tree.relative_segments(trunk, trunk), Some(vec![]));
        assert_eq!(tree.relative_segments(tags, src), None);

        let removed = tree.detach(trunk);
        assert_eq!(removed.len(), 3);
        assert!(tree.get(trunk).is_none());
        assert!(tree.get(src).is_none());
        assert_eq!(tree.get(root).unwrap().children().len(), 1);
        assert_eq!(tree.into_nodes().count(), 2);
    }
}
