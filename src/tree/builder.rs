use crate::models::{MindNode, NodeRow};
use crate::tree::Forest;
use std::collections::{HashMap, HashSet};

/// Result of turning one garden's rows into trees.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct BuiltForest {
    pub forest: Forest,

    /// Rows not reachable from any root: a dangling `parent_id`, a descendant
    /// of such a row, or a member of a parent cycle. Kept in input order.
    pub orphans: Vec<NodeRow>,
}

/// Display title of a note: its first line.
pub(crate) fn first_line(content: &str) -> &str {
    content.lines().next().unwrap_or_default()
}

/// Build the forest for one garden.
///
/// Roots are the rows with no `parent_id`, in input order. Children keep the
/// relative order they have in `rows`.
pub(crate) fn build_forest(rows: &[NodeRow]) -> BuiltForest {
    // parent id -> indices of its children in `rows`
    let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut roots: Vec<usize> = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        match row.parent_id.as_deref() {
            None => roots.push(i),
            Some(parent) => children.entry(parent).or_default().push(i),
        }
    }

    let mut reached: HashSet<usize> = HashSet::with_capacity(rows.len());
    let trees = roots
        .into_iter()
        .map(|i| build_node(rows, &children, i, &mut reached))
        .collect::<Vec<_>>();

    let orphans = rows
        .iter()
        .enumerate()
        .filter(|(i, _)| !reached.contains(i))
        .map(|(_, row)| row.clone())
        .collect::<Vec<_>>();

    if !orphans.is_empty() {
        tracing::warn!(count = orphans.len(), "rows unreachable from any root");
    }

    BuiltForest {
        forest: Forest::new(trees),
        orphans,
    }
}

fn build_node(
    rows: &[NodeRow],
    children: &HashMap<&str, Vec<usize>>,
    idx: usize,
    reached: &mut HashSet<usize>,
) -> MindNode {
    reached.insert(idx);
    let row = &rows[idx];

    let kids = match children.get(row.id.as_str()) {
        Some(ids) => ids
            .iter()
            .map(|&c| build_node(rows, children, c, reached))
            .collect(),
        None => Vec::new(),
    };

    MindNode {
        id: row.id.clone(),
        title: first_line(&row.content).to_string(),
        content: row.content.clone(),
        children: kids,
        is_expanded: row.is_expanded.unwrap_or(true),
    }
}
