use crate::models::MindNode;
use crate::tree::{find, modify, remove};

/// All root-level trees of one garden, in display order.
///
/// Node edits address a tree by index plus a node id; deleting a whole tree
/// goes through [`Forest::remove_tree`] rather than the node path.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Forest {
    trees: Vec<MindNode>,
}

impl Forest {
    pub fn new(trees: Vec<MindNode>) -> Self {
        Self { trees }
    }

    pub fn trees(&self) -> &[MindNode] {
        &self.trees
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Index of the tree containing `id`.
    pub fn locate(&self, id: &str) -> Option<usize> {
        self.trees.iter().position(|t| find(t, id).is_some())
    }

    pub fn find(&self, id: &str) -> Option<&MindNode> {
        self.trees.iter().find_map(|t| find(t, id))
    }

    pub fn is_root(&self, id: &str) -> bool {
        self.trees.iter().any(|t| t.id == id)
    }

    /// Replace node `id` in tree `tree` with `f(node)`.
    ///
    /// Returns `false` when the tree index is out of range or the node is not
    /// in that tree.
    pub fn update_node<F>(&mut self, tree: usize, id: &str, f: F) -> bool
    where
        F: Fn(&MindNode) -> MindNode,
    {
        let Some(slot) = self.trees.get_mut(tree) else {
            return false;
        };
        if find(slot, id).is_none() {
            return false;
        }
        *slot = modify(slot, id, f);
        true
    }

    /// Remove a non-root node (and its subtree) from tree `tree`.
    ///
    /// Refuses to remove the tree's root; use [`Forest::remove_tree`].
    pub fn remove_node(&mut self, tree: usize, id: &str) -> bool {
        let Some(slot) = self.trees.get_mut(tree) else {
            return false;
        };
        if slot.id == id || find(slot, id).is_none() {
            return false;
        }
        match remove(slot, id) {
            Some(next) => {
                *slot = next;
                true
            }
            None => false,
        }
    }

    pub fn remove_tree(&mut self, tree: usize) -> Option<MindNode> {
        if tree < self.trees.len() {
            Some(self.trees.remove(tree))
        } else {
            None
        }
    }
}
