//! Remote-backed actions shared by the pages.
//!
//! Each action updates the local signals and issues the matching request.
//! Errors come back as display strings after [`AppState::handle_api_error`]
//! has logged them (and signed out on a rejected session).

use super::garden::{remove_gardens, rename_garden, set_garden_view, GardenState, Rollback};
use super::AppState;
use crate::models::{Garden, NewGarden, NodeRow, Point, ViewState};
use crate::storage::{prune_recent_gardens, write_recent_garden};
use crate::sync::{cascade_delete, delete_gardens_with_nodes, CascadeError, NoteStore};
use leptos::prelude::*;

pub(crate) type ActionResult<T> = Result<T, String>;

/// Undo an optimistic edit unless another garden was opened meanwhile.
fn restore_open(open: &mut Option<GardenState>, garden_id: &str, rollback: Rollback) -> bool {
    match open.as_mut().filter(|g| g.garden.id == garden_id) {
        Some(g) => {
            rollback.restore(g);
            true
        }
        None => false,
    }
}

fn restore_garden(app: AppState, garden_id: &str, rollback: Rollback) {
    app.garden.update(|g| {
        restore_open(g, garden_id, rollback);
    });
}

/// What to do locally after a cascade delete failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Recovery {
    /// Nothing was deleted remotely; put the rows back.
    Restore,
    /// Some rows are gone; reload to show what is left.
    Reload,
}

fn recovery_for(e: &CascadeError) -> Recovery {
    if e.deleted == 0 {
        Recovery::Restore
    } else {
        Recovery::Reload
    }
}

pub(crate) async fn load_gardens(app: AppState) -> ActionResult<()> {
    let client = app.api_client.get_untracked();
    app.gardens_loading.set(true);
    app.gardens_error.set(None);

    let result = client.list_gardens().await;
    app.gardens_loading.set(false);

    match result {
        Ok(gardens) => {
            let ids: Vec<String> = gardens.iter().map(|g| g.id.clone()).collect();
            prune_recent_gardens(&ids);
            tracing::debug!(count = gardens.len(), "gardens loaded");
            app.gardens.set(gardens);
            Ok(())
        }
        Err(e) => {
            let msg = app.handle_api_error(&e, "Could not load gardens");
            app.gardens_error.set(Some(msg.clone()));
            Err(msg)
        }
    }
}

/// Create a garden; it appears in the list once the database confirms it.
pub(crate) async fn create_garden(app: AppState, name: String) -> ActionResult<Option<Garden>> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Ok(None);
    }

    let client = app.api_client.get_untracked();
    let req = NewGarden {
        name,
        user_id: client.user_id(),
        view_state: None,
    };

    match client.insert_garden(&req).await {
        Ok(garden) => {
            tracing::info!(id = %garden.id, "garden created");
            app.gardens.update(|list| list.push(garden.clone()));
            Ok(Some(garden))
        }
        Err(e) => Err(app.handle_api_error(&e, "Could not create garden")),
    }
}

pub(crate) async fn rename_garden_remote(
    app: AppState,
    id: String,
    name: String,
) -> ActionResult<()> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Ok(());
    }

    let Some(rollback) = app.gardens.try_update(|list| rename_garden(list, &id, &name)).flatten()
    else {
        return Ok(());
    };
    let open_rollback = app
        .garden
        .try_update(|g| g.as_mut().filter(|g| g.garden.id == id).map(|g| g.rename(&name)))
        .flatten();

    let client = app.api_client.get_untracked();
    match client.rename_garden(&id, &name).await {
        Ok(()) => Ok(()),
        Err(e) => {
            app.gardens.update(|list| rollback.restore(list));
            if let Some(rb) = open_rollback {
                restore_garden(app, &id, rb);
            }
            Err(app.handle_api_error(&e, "Could not rename garden"))
        }
    }
}

pub(crate) async fn delete_garden(app: AppState, id: String) -> ActionResult<()> {
    let ids = vec![id.clone()];
    let Some(rollback) = app.gardens.try_update(|list| remove_gardens(list, &ids)) else {
        return Ok(());
    };
    if app.current_garden_id.get_untracked().as_deref() == Some(id.as_str()) {
        app.set_current_garden(None);
        app.garden.set(None);
    }

    let client = app.api_client.get_untracked();
    match delete_gardens_with_nodes(&client, &ids).await {
        Ok(()) => {
            tracing::info!(%id, "garden deleted");
            Ok(())
        }
        Err(e) => {
            app.gardens.update(|list| rollback.restore(list));
            Err(app.handle_api_error(&e, "Could not delete garden"))
        }
    }
}

/// Load a garden and its notes into [`AppState::garden`].
pub(crate) async fn open_garden(app: AppState, id: String) -> ActionResult<()> {
    let request_id = app.garden_request_id.get_untracked().wrapping_add(1);
    app.garden_request_id.set(request_id);
    app.garden_loading.set(true);
    app.garden_error.set(None);
    app.set_current_garden(Some(id.clone()));

    let client = app.api_client.get_untracked();

    let garden = match app
        .gardens
        .get_untracked()
        .into_iter()
        .find(|g| g.id == id)
    {
        Some(g) => Ok(g),
        None => client.list_gardens().await.and_then(|all| {
            app.gardens.set(all.clone());
            all.into_iter().find(|g| g.id == id).ok_or_else(|| {
                crate::api::ApiError::http(
                    reqwest::StatusCode::NOT_FOUND,
                    String::new(),
                    "Garden not found",
                )
            })
        }),
    };

    let result = match garden {
        Ok(g) => client
            .list_nodes(std::slice::from_ref(&g.id))
            .await
            .map(|rows| (g, rows)),
        Err(e) => Err(e),
    };

    if app.garden_request_id.get_untracked() != request_id {
        return Ok(());
    }
    app.garden_loading.set(false);

    match result {
        Ok((garden, rows)) => {
            write_recent_garden(&garden.id, &garden.name);
            let state = GardenState::new(garden, rows);
            if !state.orphans().is_empty() {
                tracing::warn!(count = state.orphans().len(), "garden has orphaned notes");
            }
            app.garden.set(Some(state));
            Ok(())
        }
        Err(e) => {
            let msg = app.handle_api_error(&e, "Could not open garden");
            app.garden_error.set(Some(msg.clone()));
            Err(msg)
        }
    }
}

async fn insert_node(app: AppState, req: crate::models::NewNode) -> ActionResult<NodeRow> {
    let client = app.api_client.get_untracked();
    match client.insert_node(&req).await {
        Ok(row) => {
            app.garden.update(|g| {
                if let Some(g) = g.as_mut() {
                    g.insert_confirmed(row.clone());
                }
            });
            Ok(row)
        }
        Err(e) => Err(app.handle_api_error(&e, "Could not create note")),
    }
}

pub(crate) async fn create_root(
    app: AppState,
    content: String,
    position: Point,
) -> ActionResult<Option<NodeRow>> {
    if content.trim().is_empty() {
        return Ok(None);
    }
    let Some(req) = app
        .garden
        .with_untracked(|g| g.as_ref().map(|g| g.new_root(&content, position)))
    else {
        return Ok(None);
    };
    insert_node(app, req).await.map(Some)
}

pub(crate) async fn create_child(
    app: AppState,
    parent_id: String,
    content: String,
) -> ActionResult<Option<NodeRow>> {
    let Some(req) = app
        .garden
        .with_untracked(|g| g.as_ref().and_then(|g| g.new_child(&parent_id, &content)))
    else {
        return Ok(None);
    };
    insert_node(app, req).await.map(Some)
}

pub(crate) async fn save_content(app: AppState, id: String, content: String) -> ActionResult<()> {
    let Some((garden_id, rollback)) = app
        .garden
        .try_update(|g| {
            g.as_mut()
                .and_then(|g| Some((g.garden.id.clone(), g.edit_content(&id, &content)?)))
        })
        .flatten()
    else {
        return Ok(());
    };

    let client = app.api_client.get_untracked();
    match client
        .update_node(&id, &crate::models::NodePatch::content(content))
        .await
    {
        Ok(()) => {
            tracing::debug!(%id, "note saved");
            Ok(())
        }
        Err(e) => {
            restore_garden(app, &garden_id, rollback);
            Err(app.handle_api_error(&e, "Could not save note"))
        }
    }
}

pub(crate) async fn toggle_node(app: AppState, id: String) -> ActionResult<()> {
    let Some((garden_id, expanded, rollback)) = app
        .garden
        .try_update(|g| {
            let g = g.as_mut()?;
            let (expanded, rb) = g.toggle_expanded(&id)?;
            Some((g.garden.id.clone(), expanded, rb))
        })
        .flatten()
    else {
        return Ok(());
    };

    let client = app.api_client.get_untracked();
    match client
        .update_node(&id, &crate::models::NodePatch::expanded(expanded))
        .await
    {
        Ok(()) => Ok(()),
        Err(e) => {
            restore_garden(app, &garden_id, rollback);
            Err(app.handle_api_error(&e, "Could not update note"))
        }
    }
}

/// Delete a note and its descendants.
///
/// A cascade that fails part-way reloads the garden so the canvas shows
/// what is actually left.
pub(crate) async fn delete_node(app: AppState, id: String) -> ActionResult<()> {
    let Some((garden_id, node, rollback)) = app
        .garden
        .try_update(|g| {
            let g = g.as_mut()?;
            let (node, rb) = g.remove_subtree(&id)?;
            Some((g.garden.id.clone(), node, rb))
        })
        .flatten()
    else {
        return Ok(());
    };

    let client = app.api_client.get_untracked();
    match cascade_delete(&client, &node).await {
        Ok(_) => Ok(()),
        Err(e) => match recovery_for(&e) {
            Recovery::Restore => {
                restore_garden(app, &garden_id, rollback);
                Err(app.handle_api_error(&e.source, "Could not delete note"))
            }
            Recovery::Reload => {
                let msg = app.handle_api_error(&e.source, "Delete stopped part-way");
                let _ = open_garden(app, garden_id).await;
                Err(format!("{msg} ({} of {} notes deleted)", e.deleted, e.total))
            }
        },
    }
}

pub(crate) async fn delete_orphan(app: AppState, id: String) -> ActionResult<()> {
    let Some((garden_id, rollback)) = app
        .garden
        .try_update(|g| {
            let g = g.as_mut()?;
            let (_, rb) = g.remove_orphan(&id)?;
            Some((g.garden.id.clone(), rb))
        })
        .flatten()
    else {
        return Ok(());
    };

    let client = app.api_client.get_untracked();
    match client.delete_node(&id).await {
        Ok(()) => Ok(()),
        Err(e) => {
            restore_garden(app, &garden_id, rollback);
            Err(app.handle_api_error(&e, "Could not delete note"))
        }
    }
}

pub(crate) async fn save_view(app: AppState, view: ViewState) -> ActionResult<()> {
    let Some((garden_id, rollback)) = app
        .garden
        .try_update(|g| {
            let g = g.as_mut()?;
            if g.view == view {
                return None;
            }
            Some((g.garden.id.clone(), g.set_view(view)))
        })
        .flatten()
    else {
        return Ok(());
    };

    let list_rollback = app
        .gardens
        .try_update(|list| set_garden_view(list, &garden_id, view))
        .flatten();

    let client = app.api_client.get_untracked();
    match client.save_view_state(&garden_id, view).await {
        Ok(()) => Ok(()),
        Err(e) => {
            restore_garden(app, &garden_id, rollback);
            if let Some(rb) = list_rollback {
                app.gardens.update(|list| rb.restore(list));
            }
            Err(app.handle_api_error(&e, "Could not save view"))
        }
    }
}
