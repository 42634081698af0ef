//! Local copy of one open garden and the edits applied to it.
//!
//! Edits to existing rows and deletes are applied here first and hand back a
//! [`Rollback`]; the caller sends the remote request and restores it if
//! the request fails. Inserts are applied only after the database has
//! returned the new row.

use crate::models::{Garden, MindNode, NewNode, NodePatch, NodeRow, Point, ViewState};
use crate::tree::{build_forest, subtree_ids_post_order, Forest};
use std::collections::HashSet;

/// Horizontal/vertical gap between a parent and a newly created child.
const CHILD_OFFSET: Point = Point::new(240.0, 0.0);
const SIBLING_SPACING: f64 = 90.0;

/// Undo step for one optimistic edit of an open garden.
///
/// Restoring touches only what the edit changed, and only while that still
/// holds the value the edit wrote. Rows confirmed or saved in the meantime
/// are left alone.
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub(crate) enum Rollback {
    Content {
        id: String,
        previous: String,
        applied: String,
    },
    Expanded {
        id: String,
        previous: Option<bool>,
        applied: bool,
    },
    /// Rows taken out by a delete, with their former index in the row list.
    Removed(Vec<(usize, NodeRow)>),
    View {
        previous: ViewState,
        previous_saved: Option<ViewState>,
        applied: ViewState,
    },
    Name {
        previous: String,
        applied: String,
    },
}

impl Rollback {
    pub fn restore(self, state: &mut GardenState) {
        match self {
            Rollback::Content {
                id,
                previous,
                applied,
            } => {
                let Some(row) = state
                    .rows
                    .iter_mut()
                    .find(|r| r.id == id && r.content == applied)
                else {
                    return;
                };
                row.content = previous;
            }
            Rollback::Expanded {
                id,
                previous,
                applied,
            } => {
                let Some(row) = state
                    .rows
                    .iter_mut()
                    .find(|r| r.id == id && r.is_expanded == Some(applied))
                else {
                    return;
                };
                row.is_expanded = previous;
            }
            Rollback::Removed(removed) => {
                for (idx, row) in removed {
                    if state.row(&row.id).is_none() {
                        let at = idx.min(state.rows.len());
                        state.rows.insert(at, row);
                    }
                }
            }
            Rollback::View {
                previous,
                previous_saved,
                applied,
            } => {
                if state.view == applied {
                    state.view = previous;
                    state.garden.view_state = previous_saved;
                }
                return;
            }
            Rollback::Name { previous, applied } => {
                if state.garden.name == applied {
                    state.garden.name = previous;
                }
                return;
            }
        }
        state.rebuild();
    }
}

/// Undo step for an optimistic edit of the garden list.
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub(crate) enum ListRollback {
    Name {
        id: String,
        previous: String,
        applied: String,
    },
    View {
        id: String,
        previous: Option<ViewState>,
        applied: ViewState,
    },
    Removed(Vec<(usize, Garden)>),
}

impl ListRollback {
    pub fn restore(self, gardens: &mut Vec<Garden>) {
        match self {
            ListRollback::Name {
                id,
                previous,
                applied,
            } => {
                if let Some(g) = gardens.iter_mut().find(|g| g.id == id && g.name == applied) {
                    g.name = previous;
                }
            }
            ListRollback::View {
                id,
                previous,
                applied,
            } => {
                if let Some(g) = gardens
                    .iter_mut()
                    .find(|g| g.id == id && g.view_state == Some(applied))
                {
                    g.view_state = previous;
                }
            }
            ListRollback::Removed(removed) => {
                for (idx, garden) in removed {
                    if !gardens.iter().any(|g| g.id == garden.id) {
                        let at = idx.min(gardens.len());
                        gardens.insert(at, garden);
                    }
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GardenState {
    pub garden: Garden,
    rows: Vec<NodeRow>,
    forest: Forest,
    orphans: Vec<NodeRow>,
    pub view: ViewState,
}

impl GardenState {
    pub fn new(garden: Garden, rows: Vec<NodeRow>) -> Self {
        let view = garden.view_state.unwrap_or_default();
        let mut s = Self {
            garden,
            rows,
            forest: Forest::default(),
            orphans: vec![],
            view,
        };
        s.rebuild();
        s
    }

    fn rebuild(&mut self) {
        let built = build_forest(&self.rows);
        self.forest = built.forest;
        self.orphans = built.orphans;
    }

    pub fn rows(&self) -> &[NodeRow] {
        &self.rows
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn orphans(&self) -> &[NodeRow] {
        &self.orphans
    }

    pub fn row(&self, id: &str) -> Option<&NodeRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Apply `patch` to row `id` and the matching tree node.
    fn apply_patch(&mut self, id: &str, patch: &NodePatch) -> Option<()> {
        let idx = self.rows.iter().position(|r| r.id == id)?;
        patch.apply_to(&mut self.rows[idx]);

        match self.forest.locate(id) {
            Some(tree) => {
                self.forest.update_node(tree, id, |n| {
                    let mut next = n.clone();
                    if let Some(content) = &patch.content {
                        next.content = content.clone();
                        next.title = crate::tree::first_line(content).to_string();
                    }
                    if let Some(expanded) = patch.is_expanded {
                        next.is_expanded = expanded;
                    }
                    next
                });
            }
            None => {
                if let Some(o) = self.orphans.iter_mut().find(|o| o.id == id) {
                    patch.apply_to(o);
                }
            }
        }
        Some(())
    }

    pub fn edit_content(&mut self, id: &str, content: &str) -> Option<Rollback> {
        let previous = self.row(id)?.content.clone();
        if previous == content {
            return None;
        }
        self.apply_patch(id, &NodePatch::content(content))?;
        Some(Rollback::Content {
            id: id.to_string(),
            previous,
            applied: content.to_string(),
        })
    }

    /// Flip expansion of a tree node. Returns the new flag.
    pub fn toggle_expanded(&mut self, id: &str) -> Option<(bool, Rollback)> {
        let next = !self.forest.find(id)?.is_expanded;
        let previous = self.row(id)?.is_expanded;
        self.apply_patch(id, &NodePatch::expanded(next))?;
        let rollback = Rollback::Expanded {
            id: id.to_string(),
            previous,
            applied: next,
        };
        Some((next, rollback))
    }

    /// Take rows out of the row list, keeping their indices for a rollback.
    fn take_rows(&mut self, ids: &HashSet<String>) -> Vec<(usize, NodeRow)> {
        let mut removed = vec![];
        let mut kept = Vec::with_capacity(self.rows.len());
        for (idx, row) in std::mem::take(&mut self.rows).into_iter().enumerate() {
            if ids.contains(&row.id) {
                removed.push((idx, row));
            } else {
                kept.push(row);
            }
        }
        self.rows = kept;
        removed
    }

    /// Remove `id` and its descendants locally.
    ///
    /// Returns the removed subtree so the caller can delete it remotely.
    pub fn remove_subtree(&mut self, id: &str) -> Option<(MindNode, Rollback)> {
        let tree = self.forest.locate(id)?;
        let node = self.forest.find(id)?.clone();

        let removed = if self.forest.is_root(id) {
            self.forest.remove_tree(tree).is_some()
        } else {
            self.forest.remove_node(tree, id)
        };
        if !removed {
            return None;
        }

        let ids: HashSet<String> = subtree_ids_post_order(&node).into_iter().collect();
        let rows = self.take_rows(&ids);

        Some((node, Rollback::Removed(rows)))
    }

    /// Remove an unreachable row locally.
    pub fn remove_orphan(&mut self, id: &str) -> Option<(NodeRow, Rollback)> {
        let idx = self.orphans.iter().position(|o| o.id == id)?;
        let row = self.orphans.remove(idx);
        let rows = self.take_rows(&HashSet::from([id.to_string()]));
        Some((row, Rollback::Removed(rows)))
    }

    pub fn set_view(&mut self, view: ViewState) -> Rollback {
        let rollback = Rollback::View {
            previous: self.view,
            previous_saved: self.garden.view_state,
            applied: view,
        };
        self.view = view;
        self.garden.view_state = Some(view);
        rollback
    }

    pub fn rename(&mut self, name: &str) -> Rollback {
        let previous = std::mem::replace(&mut self.garden.name, name.to_string());
        Rollback::Name {
            previous,
            applied: name.to_string(),
        }
    }

    /// Add a row confirmed by the database.
    pub fn insert_confirmed(&mut self, row: NodeRow) {
        if row.garden_id != self.garden.id || self.row(&row.id).is_some() {
            tracing::warn!(id = %row.id, "ignoring row for another garden or duplicate");
            return;
        }
        self.rows.push(row);
        self.rebuild();
    }

    /// Insert payload for a new root note at `position` (world coordinates).
    pub fn new_root(&self, content: &str, position: Point) -> NewNode {
        NewNode {
            garden_id: self.garden.id.clone(),
            parent_id: None,
            content: content.to_string(),
            position_x: position.x,
            position_y: position.y,
            is_expanded: Some(true),
        }
    }

    /// Insert payload for a new child of `parent_id`, placed right of the
    /// parent below its existing children.
    pub fn new_child(&self, parent_id: &str, content: &str) -> Option<NewNode> {
        let parent = self.row(parent_id)?;
        let siblings = self
            .rows
            .iter()
            .filter(|r| r.parent_id.as_deref() == Some(parent_id))
            .count();

        Some(NewNode {
            garden_id: self.garden.id.clone(),
            parent_id: Some(parent_id.to_string()),
            content: content.to_string(),
            position_x: parent.position_x + CHILD_OFFSET.x,
            position_y: parent.position_y + CHILD_OFFSET.y + siblings as f64 * SIBLING_SPACING,
            is_expanded: Some(true),
        })
    }
}

/// Rename a garden in a list in place.
pub(crate) fn rename_garden(gardens: &mut [Garden], id: &str, name: &str) -> Option<ListRollback> {
    let g = gardens.iter_mut().find(|g| g.id == id)?;
    let previous = std::mem::replace(&mut g.name, name.to_string());
    Some(ListRollback::Name {
        id: id.to_string(),
        previous,
        applied: name.to_string(),
    })
}

/// Record a saved view on a garden in a list.
pub(crate) fn set_garden_view(
    gardens: &mut [Garden],
    id: &str,
    view: ViewState,
) -> Option<ListRollback> {
    let g = gardens.iter_mut().find(|g| g.id == id)?;
    let previous = g.view_state.replace(view);
    Some(ListRollback::View {
        id: id.to_string(),
        previous,
        applied: view,
    })
}

/// Drop gardens from a list in place.
pub(crate) fn remove_gardens(gardens: &mut Vec<Garden>, ids: &[String]) -> ListRollback {
    let mut removed = vec![];
    let mut kept = Vec::with_capacity(gardens.len());
    for (idx, g) in std::mem::take(gardens).into_iter().enumerate() {
        if ids.contains(&g.id) {
            removed.push((idx, g));
        } else {
            kept.push(g);
        }
    }
    *gardens = kept;
    ListRollback::Removed(removed)
}
