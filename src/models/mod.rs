use serde::{Deserialize, Serialize};

/// Authenticated user session as returned by the auth endpoint.
///
/// Only the fields the client needs are kept; everything else in the
/// auth payload is ignored.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub(crate) struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Pan/zoom transform of the canvas content layer.
///
/// Persisted per garden in the `view_state` column so the canvas reopens
/// where the user left it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub(crate) struct ViewState {
    pub scale: f64,
    pub offset: Point,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Point::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Garden {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub view_state: Option<ViewState>,
    #[serde(default)]
    pub created_at: String,
}

/// A note as persisted in the `nodes` table.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct NodeRow {
    pub id: String,
    pub garden_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub position_x: f64,
    #[serde(default)]
    pub position_y: f64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub is_expanded: Option<bool>,
}

/// Insert payload for a node. The database assigns `id` and timestamps.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct NewNode {
    pub garden_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub position_x: f64,
    pub position_y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_expanded: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct NewGarden {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_state: Option<ViewState>,
}

/// Partial update for a node row; `None` fields are left untouched.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub(crate) struct NodePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_expanded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f64>,
}

impl NodePatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn expanded(is_expanded: bool) -> Self {
        Self {
            is_expanded: Some(is_expanded),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, row: &mut NodeRow) {
        if let Some(content) = &self.content {
            row.content = content.clone();
        }
        if let Some(expanded) = self.is_expanded {
            row.is_expanded = Some(expanded);
        }
        if let Some(x) = self.position_x {
            row.position_x = x;
        }
        if let Some(y) = self.position_y {
            row.position_y = y;
        }
    }
}

/// In-memory tree view of a node and its descendants.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct MindNode {
    pub id: String,
    pub title: String,
    pub content: String,
    pub children: Vec<MindNode>,
    pub is_expanded: bool,
}

impl MindNode {
    pub fn body(&self) -> &str {
        self.content
            .split_once('\n')
            .map(|(_, rest)| rest)
            .unwrap_or_default()
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(MindNode::node_count).sum::<usize>()
    }
}
