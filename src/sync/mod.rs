//! Persistence seam and the multi-step remote operations built on it.

use crate::api::{ApiError, ApiResult};
use crate::models::{Garden, MindNode, NewGarden, NewNode, NodePatch, NodeRow, ViewState};
use crate::tree::subtree_ids_post_order;

#[cfg(test)]
pub(crate) mod memory;

/// Remote storage for gardens and nodes.
///
/// Implemented by [`crate::api::SupabaseClient`]; tests drive the same
/// logic against an in-memory store.
pub(crate) trait NoteStore {
    async fn list_gardens(&self) -> ApiResult<Vec<Garden>>;
    async fn insert_garden(&self, garden: &NewGarden) -> ApiResult<Garden>;
    async fn rename_garden(&self, id: &str, name: &str) -> ApiResult<()>;
    async fn save_view_state(&self, id: &str, view: ViewState) -> ApiResult<()>;
    async fn delete_gardens(&self, ids: &[String]) -> ApiResult<()>;

    /// Rows of the given gardens, oldest first.
    async fn list_nodes(&self, garden_ids: &[String]) -> ApiResult<Vec<NodeRow>>;
    async fn insert_node(&self, node: &NewNode) -> ApiResult<NodeRow>;
    async fn update_node(&self, id: &str, patch: &NodePatch) -> ApiResult<()>;
    async fn delete_node(&self, id: &str) -> ApiResult<()>;
    async fn delete_nodes_in_gardens(&self, garden_ids: &[String]) -> ApiResult<()>;
}

/// A cascade stopped part-way. Rows already deleted stay deleted.
#[derive(Clone, Debug, thiserror::Error)]
#[error("delete stopped after {deleted} of {total} notes: {source}")]
pub(crate) struct CascadeError {
    pub deleted: usize,
    pub total: usize,
    #[source]
    pub source: ApiError,
}

/// Delete `node` and every descendant, deepest first, one request at a time.
///
/// Returns the number of rows deleted.
pub(crate) async fn cascade_delete<S: NoteStore>(
    store: &S,
    node: &MindNode,
) -> Result<usize, CascadeError> {
    let ids = subtree_ids_post_order(node);
    let total = ids.len();

    for (deleted, id) in ids.iter().enumerate() {
        if let Err(source) = store.delete_node(id).await {
            tracing::error!(%id, deleted, total, error = %source, "cascade delete failed");
            return Err(CascadeError {
                deleted,
                total,
                source,
            });
        }
    }

    tracing::info!(root = %node.id, total, "deleted subtree");
    Ok(total)
}

/// Remove gardens together with their notes.
pub(crate) async fn delete_gardens_with_nodes<S: NoteStore>(
    store: &S,
    garden_ids: &[String],
) -> ApiResult<()> {
    store.delete_nodes_in_gardens(garden_ids).await?;
    store.delete_gardens(garden_ids).await
}
