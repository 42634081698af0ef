use crate::models::MindNode;

/// Depth-first search, children visited in order. Returns the first match.
pub(crate) fn find<'a>(root: &'a MindNode, id: &str) -> Option<&'a MindNode> {
    if root.id == id {
        return Some(root);
    }
    root.children.iter().find_map(|c| find(c, id))
}

/// Return a copy of `root` with the node `id` replaced by `f(node)`.
///
/// The input is left untouched. When `id` is absent the result is equal to
/// `root`.
pub(crate) fn modify<F>(root: &MindNode, id: &str, f: F) -> MindNode
where
    F: Fn(&MindNode) -> MindNode,
{
    modify_with(root, id, &f)
}

fn modify_with(root: &MindNode, id: &str, f: &dyn Fn(&MindNode) -> MindNode) -> MindNode {
    if root.id == id {
        return f(root);
    }
    MindNode {
        id: root.id.clone(),
        title: root.title.clone(),
        content: root.content.clone(),
        children: root
            .children
            .iter()
            .map(|c| modify_with(c, id, f))
            .collect(),
        is_expanded: root.is_expanded,
    }
}

/// Return a copy of `root` without the node `id` (and its subtree).
///
/// `None` means `root` itself was the target; the caller owns the slot the
/// root lived in and has to drop it there.
pub(crate) fn remove(root: &MindNode, id: &str) -> Option<MindNode> {
    if root.id == id {
        return None;
    }
    Some(MindNode {
        id: root.id.clone(),
        title: root.title.clone(),
        content: root.content.clone(),
        children: root
            .children
            .iter()
            .filter_map(|c| remove(c, id))
            .collect(),
        is_expanded: root.is_expanded,
    })
}

/// Ids of `node`'s subtree, every descendant before its ancestor and `node`
/// last. This is the order remote deletes are issued in.
pub(crate) fn subtree_ids_post_order(node: &MindNode) -> Vec<String> {
    let mut out = Vec::with_capacity(node.node_count());
    collect_post_order(node, &mut out);
    out
}

fn collect_post_order(node: &MindNode, out: &mut Vec<String>) {
    for c in &node.children {
        collect_post_order(c, out);
    }
    out.push(node.id.clone());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, children: Vec<MindNode>) -> MindNode {
        MindNode {
            id: id.to_string(),
            title: id.to_uppercase(),
            content: id.to_uppercase(),
            children,
            is_expanded: true,
        }
    }

    fn sample() -> MindNode {
        node(
            "a",
            vec![
                node("b", vec![node("d", vec![]), node("e", vec![])]),
                node("c", vec![node("f", vec![])]),
            ],
        )
    }

    #[test]
    fn test_find_visits_children_in_order() {
        let t = sample();
        assert_eq!(find(&t, "e").map(|n| n.title.as_str()), Some("E"));
        assert_eq!(find(&t, "a").map(|n| n.id.as_str()), Some("a"));
        assert!(find(&t, "zz").is_none());
    }

    #[test]
    fn test_find_returns_first_match_for_duplicate_ids() {
        let mut first = node("dup", vec![]);
        first.title = "first".to_string();
        let mut second = node("dup", vec![]);
        second.title = "second".to_string();
        let t = node("r", vec![node("x", vec![first]), second]);
        assert_eq!(find(&t, "dup").map(|n| n.title.as_str()), Some("first"));
    }

    #[test]
    fn test_modify_identity_is_structurally_equal() {
        let t = sample();
        let out = modify(&t, "d", |n| n.clone());
        assert_eq!(out, t);
    }

    #[test]
    fn test_modify_replaces_target_and_keeps_input() {
        let t = sample();
        let out = modify(&t, "f", |n| MindNode {
            title: "changed".to_string(),
            ..n.clone()
        });
        assert_eq!(find(&out, "f").map(|n| n.title.as_str()), Some("changed"));
        assert_eq!(find(&t, "f").map(|n| n.title.as_str()), Some("F"));
    }

    #[test]
    fn test_modify_root() {
        let t = sample();
        let out = modify(&t, "a", |n| MindNode {
            is_expanded: false,
            ..n.clone()
        });
        assert!(!out.is_expanded);
        assert_eq!(out.children, t.children);
    }

    #[test]
    fn test_remove_then_find_is_none() {
        let t = sample();
        let out = remove(&t, "b").expect("root survives");
        assert!(find(&out, "b").is_none());
        assert!(find(&out, "d").is_none());
        assert!(find(&out, "c").is_some());
        // input intact
        assert!(find(&t, "b").is_some());
    }

    #[test]
    fn test_remove_root_yields_none() {
        assert!(remove(&sample(), "a").is_none());
    }

    #[test]
    fn test_remove_missing_id_is_equal() {
        let t = sample();
        assert_eq!(remove(&t, "nope"), Some(t));
    }

    #[test]
    fn test_post_order_lists_descendants_first() {
        let ids = subtree_ids_post_order(&sample());
        assert_eq!(ids, vec!["d", "e", "b", "f", "c", "a"]);
    }
}
