use super::{ImportError, ImportMode};
use crate::api::{ApiError, ApiResult};
use crate::models::{Garden, NewGarden, NewNode, NodeRow};
use crate::sync::NoteStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub(crate) const EXPORT_VERSION: &str = "1.0";

/// Full backup of the user's gardens.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct ExportDocument {
    #[serde(default)]
    pub version: String,
    #[serde(rename = "exportedAt", default)]
    pub exported_at: String,
    pub gardens: Vec<Garden>,
    pub nodes: Vec<NodeRow>,
}

pub(crate) fn build_export(
    gardens: Vec<Garden>,
    nodes: Vec<NodeRow>,
    exported_at: &str,
) -> ExportDocument {
    ExportDocument {
        version: EXPORT_VERSION.to_string(),
        exported_at: exported_at.to_string(),
        gardens,
        nodes,
    }
}

/// Fetch everything visible to the user and serialize it.
pub(crate) async fn export_json<S: NoteStore>(store: &S, exported_at: &str) -> ApiResult<String> {
    let gardens = store.list_gardens().await?;
    let ids: Vec<String> = gardens.iter().map(|g| g.id.clone()).collect();
    let nodes = store.list_nodes(&ids).await?;

    tracing::info!(gardens = gardens.len(), nodes = nodes.len(), "exporting");

    let doc = build_export(gardens, nodes, exported_at);
    serde_json::to_string_pretty(&doc).map_err(ApiError::parse)
}

/// Validate the top-level shape, then decode. Nothing is written on error.
pub(crate) fn parse_import(text: &str) -> Result<ExportDocument, ImportError> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    let Some(obj) = value.as_object() else {
        return Err(ImportError::Malformed("expected a JSON object".to_string()));
    };
    for key in ["gardens", "nodes"] {
        if !obj.get(key).is_some_and(|v| v.is_array()) {
            return Err(ImportError::Malformed(format!("missing `{key}` list")));
        }
    }

    Ok(serde_json::from_value(value)?)
}

/// One garden and its importable nodes, parents before children.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GardenPlan {
    pub garden: Garden,
    pub nodes: Vec<NodeRow>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ImportPlan {
    pub gardens: Vec<GardenPlan>,
    /// Nodes with an unknown garden, a parent outside their own garden, or
    /// a parent cycle.
    pub skipped: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ImportReport {
    pub gardens: usize,
    pub nodes: usize,
    pub skipped: usize,
}

#[derive(Clone, Copy)]
enum Depth {
    Visiting,
    Known(usize),
    Unresolvable,
}

/// Depth of `id` inside one garden's nodes; `None` when its ancestry leaves
/// the garden or loops.
fn depth_of(
    id: &str,
    by_id: &HashMap<&str, &NodeRow>,
    memo: &mut HashMap<String, Depth>,
) -> Option<usize> {
    match memo.get(id) {
        Some(Depth::Known(d)) => return Some(*d),
        Some(Depth::Visiting) | Some(Depth::Unresolvable) => return None,
        None => {}
    }

    let row = by_id.get(id)?;
    memo.insert(id.to_string(), Depth::Visiting);

    let depth = match row.parent_id.as_deref() {
        None => Some(0),
        Some(parent) => depth_of(parent, by_id, memo).map(|d| d + 1),
    };

    memo.insert(
        id.to_string(),
        depth.map(Depth::Known).unwrap_or(Depth::Unresolvable),
    );
    depth
}

/// Group nodes by garden and order each group by depth.
pub(crate) fn plan_import(doc: &ExportDocument) -> ImportPlan {
    let mut plan = ImportPlan::default();

    let known = doc
        .gardens
        .iter()
        .map(|g| g.id.as_str())
        .collect::<std::collections::HashSet<_>>();
    plan.skipped += doc
        .nodes
        .iter()
        .filter(|n| !known.contains(n.garden_id.as_str()))
        .count();

    for garden in &doc.gardens {
        let rows: Vec<&NodeRow> = doc
            .nodes
            .iter()
            .filter(|n| n.garden_id == garden.id)
            .collect();
        let by_id: HashMap<&str, &NodeRow> = rows.iter().map(|r| (r.id.as_str(), *r)).collect();
        let mut memo = HashMap::new();

        let mut ordered: Vec<(usize, usize, NodeRow)> = vec![];
        for (idx, row) in rows.iter().enumerate() {
            match depth_of(&row.id, &by_id, &mut memo) {
                Some(depth) => ordered.push((depth, idx, (*row).clone())),
                None => {
                    tracing::warn!(id = %row.id, garden = %garden.id, "skipping unresolvable node");
                    plan.skipped += 1;
                }
            }
        }
        ordered.sort_by_key(|(depth, idx, _)| (*depth, *idx));

        plan.gardens.push(GardenPlan {
            garden: garden.clone(),
            nodes: ordered.into_iter().map(|(_, _, row)| row).collect(),
        });
    }

    plan
}

/// Write an import document through `store`, assigning fresh ids.
///
/// Stops at the first failed request; rows written before it stay.
pub(crate) async fn run_import<S: NoteStore>(
    store: &S,
    doc: &ExportDocument,
    mode: ImportMode,
    user_id: Option<String>,
) -> Result<ImportReport, ImportError> {
    let plan = plan_import(doc);

    if mode == ImportMode::Replace {
        let existing: Vec<String> = store
            .list_gardens()
            .await?
            .into_iter()
            .map(|g| g.id)
            .collect();
        crate::sync::delete_gardens_with_nodes(store, &existing).await?;
        tracing::info!(removed = existing.len(), "cleared gardens before import");
    }

    let mut report = ImportReport {
        skipped: plan.skipped,
        ..Default::default()
    };

    for GardenPlan { garden, nodes } in &plan.gardens {
        let created = store
            .insert_garden(&NewGarden {
                name: garden.name.clone(),
                user_id: user_id.clone(),
                view_state: garden.view_state,
            })
            .await?;
        report.gardens += 1;

        let mut id_map: HashMap<&str, String> = HashMap::new();
        for node in nodes {
            let parent_id = match node.parent_id.as_deref() {
                None => None,
                Some(old) => match id_map.get(old) {
                    Some(new) => Some(new.clone()),
                    None => {
                        report.skipped += 1;
                        continue;
                    }
                },
            };

            let row = store
                .insert_node(&NewNode {
                    garden_id: created.id.clone(),
                    parent_id,
                    content: node.content.clone(),
                    position_x: node.position_x,
                    position_y: node.position_y,
                    is_expanded: node.is_expanded,
                })
                .await?;
            id_map.insert(node.id.as_str(), row.id);
            report.nodes += 1;
        }
    }

    tracing::info!(?report, %mode, "import finished");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::memory::MemoryStore;
    use futures::executor::block_on;

    fn garden(id: &str, name: &str) -> Garden {
        Garden {
            id: id.to_string(),
            name: name.to_string(),
            user_id: None,
            view_state: None,
            created_at: String::new(),
        }
    }

    fn node(id: &str, garden: &str, parent: Option<&str>) -> NodeRow {
        NodeRow {
            id: id.to_string(),
            garden_id: garden.to_string(),
            parent_id: parent.map(str::to_string),
            content: id.to_string(),
            position_x: 1.0,
            position_y: 2.0,
            created_at: String::new(),
            updated_at: None,
            is_expanded: Some(true),
        }
    }

    #[test]
    fn test_parse_import_rejects_missing_lists() {
        let err = parse_import(r#"{"gardens": []}"#).expect_err("nodes missing");
        assert!(matches!(err, ImportError::Malformed(_)));

        let err = parse_import(r#"[1,2]"#).expect_err("not an object");
        assert!(matches!(err, ImportError::Malformed(_)));

        let err = parse_import("{nope").expect_err("not json");
        assert!(matches!(err, ImportError::Parse(_)));
    }

    #[test]
    fn test_parse_import_accepts_export_shape() {
        let text = r#"{
            "version": "1.0",
            "exportedAt": "2024-05-01T10:00:00.000Z",
            "gardens": [{"id": "g1", "name": "Work", "created_at": ""}],
            "nodes": [{"id": "n1", "garden_id": "g1", "parent_id": null, "content": "Root"}]
        }"#;
        let doc = parse_import(text).expect("valid document");
        assert_eq!(doc.exported_at, "2024-05-01T10:00:00.000Z");
        assert_eq!(doc.nodes[0].content, "Root");
    }

    #[test]
    fn test_export_serializes_camel_case_timestamp() {
        let doc = build_export(vec![garden("g", "G")], vec![], "2024-01-01T00:00:00Z");
        let v = serde_json::to_value(&doc).expect("serializes");
        assert_eq!(v["version"], "1.0");
        assert_eq!(v["exportedAt"], "2024-01-01T00:00:00Z");
        assert!(v["gardens"].is_array());
        assert!(v["nodes"].is_array());
    }

    #[test]
    fn test_plan_orders_parents_first() {
        // child listed before its parent
        let doc = build_export(
            vec![garden("g", "G")],
            vec![
                node("c", "g", Some("b")),
                node("b", "g", Some("a")),
                node("a", "g", None),
            ],
            "",
        );
        let plan = plan_import(&doc);
        let ids: Vec<&str> = plan.gardens[0].nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(plan.skipped, 0);
    }

    #[test]
    fn test_plan_skips_cross_garden_and_cycles() {
        let doc = build_export(
            vec![garden("g1", "One"), garden("g2", "Two")],
            vec![
                node("a", "g1", None),
                node("x", "g2", Some("a")),
                node("y", "g2", Some("x")),
                node("p", "g2", Some("q")),
                node("q", "g2", Some("p")),
                node("z", "missing", None),
            ],
            "",
        );
        let plan = plan_import(&doc);
        assert_eq!(plan.gardens[0].nodes.len(), 1);
        assert!(plan.gardens[1].nodes.is_empty());
        assert_eq!(plan.skipped, 5);
    }

    #[test]
    fn test_import_remaps_ids() {
        let store = MemoryStore::new();
        let doc = build_export(
            vec![garden("old-g", "Work")],
            vec![node("old-a", "old-g", None), node("old-b", "old-g", Some("old-a"))],
            "",
        );

        let report = block_on(run_import(&store, &doc, ImportMode::Append, Some("u1".into())))
            .expect("import succeeds");
        assert_eq!(
            report,
            ImportReport {
                gardens: 1,
                nodes: 2,
                skipped: 0
            }
        );

        let gardens = store.gardens();
        assert_eq!(gardens[0].name, "Work");
        assert_eq!(gardens[0].user_id.as_deref(), Some("u1"));

        let nodes = store.nodes();
        let a = nodes.iter().find(|n| n.content == "old-a").expect("a inserted");
        let b = nodes.iter().find(|n| n.content == "old-b").expect("b inserted");
        assert_ne!(a.id, "old-a");
        assert_eq!(a.garden_id, gardens[0].id);
        assert_eq!(b.parent_id.as_deref(), Some(a.id.as_str()));
    }

    #[test]
    fn test_import_cross_garden_reference_not_inserted() {
        let store = MemoryStore::new();
        let doc = build_export(
            vec![garden("g1", "One"), garden("g2", "Two")],
            vec![node("a", "g1", None), node("b", "g2", Some("a"))],
            "",
        );

        let report =
            block_on(run_import(&store, &doc, ImportMode::Append, None)).expect("import succeeds");
        assert_eq!(report.nodes, 1);
        assert_eq!(report.skipped, 1);
        assert!(store.nodes().iter().all(|n| n.content != "b"));
    }

    #[test]
    fn test_replace_clears_existing_first() {
        let store = MemoryStore::new();
        let old = store.seed_garden("Old");
        store.seed_node(&old, None, "old note");

        let doc = build_export(vec![garden("g", "New")], vec![node("a", "g", None)], "");
        block_on(run_import(&store, &doc, ImportMode::Replace, None)).expect("import succeeds");

        assert_eq!(store.gardens().len(), 1);
        assert_eq!(store.gardens()[0].name, "New");
        assert_eq!(store.nodes().len(), 1);

        let calls = store.calls();
        let cleared = calls
            .iter()
            .position(|c| c.starts_with("delete_gardens"))
            .expect("gardens deleted");
        let inserted = calls
            .iter()
            .position(|c| c.starts_with("insert_garden"))
            .expect("garden inserted");
        assert!(cleared < inserted);
    }

    #[test]
    fn test_malformed_file_makes_no_calls() {
        let store = MemoryStore::new();
        let result = parse_import(r#"{"nodes": []}"#)
            .map(|doc| block_on(run_import(&store, &doc, ImportMode::Replace, None)));
        assert!(result.is_err());
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_export_then_import_round_trip() {
        let source = MemoryStore::new();
        let g = source.seed_garden("Work");
        let a = source.seed_node(&g, None, "Root");
        source.seed_node(&g, Some(&a), "Child");

        let text = block_on(export_json(&source, "2024-01-01T00:00:00Z")).expect("export");
        let doc = parse_import(&text).expect("parses");

        let target = MemoryStore::new();
        let report =
            block_on(run_import(&target, &doc, ImportMode::Append, None)).expect("import");
        assert_eq!(report.gardens, 1);
        assert_eq!(report.nodes, 2);
    }
}
