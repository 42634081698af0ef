//! In-memory [`NoteStore`] that records every call.

use super::NoteStore;
use crate::api::{ApiError, ApiResult};
use crate::models::{Garden, NewGarden, NewNode, NodePatch, NodeRow, ViewState};
use std::cell::{Cell, RefCell};

#[derive(Default)]
pub(crate) struct MemoryStore {
    gardens: RefCell<Vec<Garden>>,
    nodes: RefCell<Vec<NodeRow>>,
    calls: RefCell<Vec<String>>,
    failing: RefCell<Vec<String>>,
    next_id: Cell<u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn id(&self, prefix: &str) -> String {
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        format!("{prefix}-{n}")
    }

    fn stamp(&self) -> String {
        format!("2024-01-01T00:00:{:02}Z", self.next_id.get() % 60)
    }

    /// Make the call recorded as `call` fail with an HTTP error.
    pub fn fail_on(&self, call: &str) {
        self.failing.borrow_mut().push(call.to_string());
    }

    fn record(&self, call: String) -> ApiResult<()> {
        let fails = self.failing.borrow().contains(&call);
        self.calls.borrow_mut().push(call.clone());
        if fails {
            Err(ApiError::http(
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                String::new(),
                &call,
            ))
        } else {
            Ok(())
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn gardens(&self) -> Vec<Garden> {
        self.gardens.borrow().clone()
    }

    pub fn nodes(&self) -> Vec<NodeRow> {
        self.nodes.borrow().clone()
    }

    pub fn seed_garden(&self, name: &str) -> String {
        let id = self.id("g");
        self.gardens.borrow_mut().push(Garden {
            id: id.clone(),
            name: name.to_string(),
            user_id: Some("user-1".to_string()),
            view_state: None,
            created_at: self.stamp(),
        });
        id
    }

    pub fn seed_node(&self, garden_id: &str, parent_id: Option<&str>, content: &str) -> String {
        let id = self.id("n");
        self.nodes.borrow_mut().push(NodeRow {
            id: id.clone(),
            garden_id: garden_id.to_string(),
            parent_id: parent_id.map(str::to_string),
            content: content.to_string(),
            position_x: 0.0,
            position_y: 0.0,
            created_at: self.stamp(),
            updated_at: None,
            is_expanded: Some(true),
        });
        id
    }
}

impl NoteStore for MemoryStore {
    async fn list_gardens(&self) -> ApiResult<Vec<Garden>> {
        self.record("list_gardens".to_string())?;
        Ok(self.gardens())
    }

    async fn insert_garden(&self, garden: &NewGarden) -> ApiResult<Garden> {
        self.record(format!("insert_garden:{}", garden.name))?;
        let row = Garden {
            id: self.id("g"),
            name: garden.name.clone(),
            user_id: garden.user_id.clone(),
            view_state: garden.view_state,
            created_at: self.stamp(),
        };
        self.gardens.borrow_mut().push(row.clone());
        Ok(row)
    }

    async fn rename_garden(&self, id: &str, name: &str) -> ApiResult<()> {
        self.record(format!("rename_garden:{id}"))?;
        if let Some(g) = self.gardens.borrow_mut().iter_mut().find(|g| g.id == id) {
            g.name = name.to_string();
        }
        Ok(())
    }

    async fn save_view_state(&self, id: &str, view: ViewState) -> ApiResult<()> {
        self.record(format!("save_view_state:{id}"))?;
        if let Some(g) = self.gardens.borrow_mut().iter_mut().find(|g| g.id == id) {
            g.view_state = Some(view);
        }
        Ok(())
    }

    async fn delete_gardens(&self, ids: &[String]) -> ApiResult<()> {
        self.record(format!("delete_gardens:{}", ids.join(",")))?;
        self.gardens.borrow_mut().retain(|g| !ids.contains(&g.id));
        Ok(())
    }

    async fn list_nodes(&self, garden_ids: &[String]) -> ApiResult<Vec<NodeRow>> {
        self.record(format!("list_nodes:{}", garden_ids.join(",")))?;
        Ok(self
            .nodes
            .borrow()
            .iter()
            .filter(|n| garden_ids.contains(&n.garden_id))
            .cloned()
            .collect())
    }

    async fn insert_node(&self, node: &NewNode) -> ApiResult<NodeRow> {
        self.record(format!("insert_node:{}", node.content))?;
        let row = NodeRow {
            id: self.id("n"),
            garden_id: node.garden_id.clone(),
            parent_id: node.parent_id.clone(),
            content: node.content.clone(),
            position_x: node.position_x,
            position_y: node.position_y,
            created_at: self.stamp(),
            updated_at: None,
            is_expanded: node.is_expanded,
        };
        self.nodes.borrow_mut().push(row.clone());
        Ok(row)
    }

    async fn update_node(&self, id: &str, patch: &NodePatch) -> ApiResult<()> {
        self.record(format!("update_node:{id}"))?;
        if let Some(n) = self.nodes.borrow_mut().iter_mut().find(|n| n.id == id) {
            patch.apply_to(n);
        }
        Ok(())
    }

    async fn delete_node(&self, id: &str) -> ApiResult<()> {
        self.record(format!("delete_node:{id}"))?;
        self.nodes.borrow_mut().retain(|n| n.id != id);
        Ok(())
    }

    async fn delete_nodes_in_gardens(&self, garden_ids: &[String]) -> ApiResult<()> {
        self.record(format!("delete_nodes_in_gardens:{}", garden_ids.join(",")))?;
        self.nodes
            .borrow_mut()
            .retain(|n| !garden_ids.contains(&n.garden_id));
        Ok(())
    }
}
