use crate::components::ui::{Button, ButtonSize, ButtonVariant, ErrorAlert, Label, Spinner, Textarea};
use crate::models::MindNode;
use crate::state::{actions, AppContext, Autosave};
use crate::tree::first_line;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Per-garden UI state shared by the canvas, the tree nodes and the editor.
#[derive(Clone, Copy)]
pub(crate) struct GardenUi {
    pub selected: RwSignal<Option<String>>,
    pub error: RwSignal<Option<String>>,
}

impl GardenUi {
    pub fn new() -> Self {
        Self {
            selected: RwSignal::new(None),
            error: RwSignal::new(None),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SaveStatus {
    Saved,
    Pending,
    Saving,
    Failed,
}

impl SaveStatus {
    fn label(self) -> &'static str {
        match self {
            SaveStatus::Saved => "Saved",
            SaveStatus::Pending => "Unsaved changes",
            SaveStatus::Saving => "Saving...",
            SaveStatus::Failed => "Not saved",
        }
    }
}

fn stop(ev: web_sys::MouseEvent) {
    ev.stop_propagation();
}

#[component]
pub(crate) fn MindTreeNode(node: MindNode) -> impl IntoView {
    let app = expect_context::<AppContext>().0;
    let ui = expect_context::<GardenUi>();

    let id = StoredValue::new(node.id.clone());
    let has_kids = !node.children.is_empty();
    let expanded = node.is_expanded;
    let hidden = node.node_count() - 1;
    let is_selected = move || id.with_value(|id| ui.selected.get().as_deref() == Some(id.as_str()));

    let on_toggle = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        let id = id.get_value();
        spawn_local(async move {
            if let Err(e) = actions::toggle_node(app, id).await {
                ui.error.set(Some(e));
            }
        });
    };

    let on_add_child = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        let parent = id.get_value();
        spawn_local(async move {
            match actions::create_child(app, parent, "New note".to_string()).await {
                Ok(Some(row)) => ui.selected.set(Some(row.id)),
                Ok(None) => {}
                Err(e) => ui.error.set(Some(e)),
            }
        });
    };

    let (bullet, bullet_class) = if has_kids {
        (
            if expanded { "▾" } else { "▸" },
            "h-5 w-5 text-base leading-none text-muted-foreground cursor-pointer hover:text-foreground/80",
        )
    } else {
        ("•", "h-5 w-5 text-base leading-none text-muted-foreground")
    };

    let body = node.body().trim().to_string();

    let children_view = if expanded && has_kids {
        view! {
            <div class="ml-5 flex flex-col gap-1.5 border-l border-emerald-800/20 pl-3">
                {node
                    .children
                    .into_iter()
                    .map(|child| view! { <MindTreeNode node=child /> })
                    .collect_view()}
            </div>
        }
        .into_any()
    } else {
        ().into_view().into_any()
    };

    view! {
        <div class="flex flex-col gap-1.5">
            <div
                class=move || {
                    if is_selected() {
                        "group rounded-lg border border-emerald-600 bg-white px-3 py-2 shadow-md ring-2 ring-emerald-600/30 min-w-[180px] max-w-[320px] cursor-pointer"
                    } else {
                        "group rounded-lg border bg-white/95 px-3 py-2 shadow-sm min-w-[180px] max-w-[320px] cursor-pointer hover:border-emerald-600/50"
                    }
                }
                on:mousedown=stop
                on:dblclick=stop
                on:click=move |ev: web_sys::MouseEvent| {
                    ev.stop_propagation();
                    ui.selected.set(Some(id.get_value()));
                }
            >
                <div class="flex items-start gap-1">
                    <button
                        type="button"
                        class=bullet_class
                        disabled=!has_kids
                        on:click=on_toggle
                    >
                        {bullet}
                    </button>
                    <div class="min-w-0 flex-1">
                        <div class="truncate text-sm font-medium">
                            {if node.title.trim().is_empty() { "Untitled".to_string() } else { node.title.clone() }}
                        </div>
                        <Show when={
                            let empty = body.is_empty();
                            move || !empty
                        }>
                            <div class="mt-0.5 line-clamp-3 whitespace-pre-wrap text-xs text-muted-foreground">
                                {body.clone()}
                            </div>
                        </Show>
                        <Show when=move || has_kids && !expanded>
                            <div class="mt-1 text-[11px] text-muted-foreground">
                                {format!("{hidden} hidden")}
                            </div>
                        </Show>
                    </div>
                    <button
                        type="button"
                        class="invisible h-5 w-5 rounded text-sm leading-none text-muted-foreground hover:bg-accent group-hover:visible"
                        title="Add child"
                        on:click=on_add_child
                    >
                        "+"
                    </button>
                </div>
            </div>
            {children_view}
        </div>
    }
    .into_any()
}

#[component]
pub fn NodeEditor(id: String) -> impl IntoView {
    let app = expect_context::<AppContext>().0;
    let ui = expect_context::<GardenUi>();

    let initial = app
        .garden
        .with_untracked(|g| g.as_ref().and_then(|g| g.row(&id)).map(|r| r.content.clone()))
        .unwrap_or_default();
    let content = RwSignal::new(initial);
    let status = RwSignal::new(SaveStatus::Saved);
    let spell_loading = RwSignal::new(false);
    let spell_error: RwSignal<Option<String>> = RwSignal::new(None);
    let id = StoredValue::new(id);

    let save_now = move || {
        let text = content.get_untracked();
        status.set(SaveStatus::Saving);
        spawn_local(async move {
            match actions::save_content(app, id.get_value(), text).await {
                Ok(()) => {
                    let _ = status.try_set(SaveStatus::Saved);
                }
                Err(e) => {
                    let _ = status.try_set(SaveStatus::Failed);
                    let _ = ui.error.try_set(Some(e));
                }
            }
        });
    };

    let autosave = Autosave::new(app.autosave_ms());

    let on_change = Callback::new({
        let autosave = autosave.clone();
        move |_text: String| {
            status.set(SaveStatus::Pending);
            autosave.schedule(save_now);
        }
    });

    {
        // Closing the editor saves whatever is still waiting on the timer.
        let autosave = autosave.clone();
        on_cleanup(move || {
            if !autosave.is_pending() {
                return;
            }
            autosave.cancel();
            let (Some(text), Some(node_id)) = (content.try_get_untracked(), id.try_get_value())
            else {
                return;
            };
            spawn_local(async move {
                if let Err(e) = actions::save_content(app, node_id, text).await {
                    let _ = ui.error.try_set(Some(e));
                }
            });
        });
    }

    let on_spellcheck = {
        let autosave = autosave.clone();
        move |_| {
            let text = content.get_untracked();
            if text.trim().is_empty() {
                return;
            }
            let client = app.api_client.get_untracked();
            let autosave = autosave.clone();
            spell_loading.set(true);
            spell_error.set(None);
            spawn_local(async move {
                match client.spellcheck(&text).await {
                    Ok(corrected) => {
                        if corrected != text {
                            content.set(corrected);
                            status.set(SaveStatus::Pending);
                            autosave.schedule(save_now);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "spellcheck failed");
                        spell_error.set(Some(e.to_string()));
                    }
                }
                spell_loading.set(false);
            });
        }
    };

    let on_delete = move |_| {
        let node_id = id.get_value();
        ui.selected.set(None);
        spawn_local(async move {
            if let Err(e) = actions::delete_node(app, node_id).await {
                ui.error.set(Some(e));
            }
        });
    };

    let on_add_child = move |_| {
        let parent = id.get_value();
        spawn_local(async move {
            match actions::create_child(app, parent, "New note".to_string()).await {
                Ok(Some(row)) => ui.selected.set(Some(row.id)),
                Ok(None) => {}
                Err(e) => ui.error.set(Some(e)),
            }
        });
    };

    let child_count = move || {
        app.garden.with(|g| {
            g.as_ref()
                .and_then(|g| id.with_value(|id| g.forest().find(id).map(|n| n.node_count() - 1)))
                .unwrap_or(0)
        })
    };

    view! {
        <div class="flex h-full flex-col gap-3 p-4">
            <div class="flex items-center justify-between gap-2">
                <div class="min-w-0 truncate text-sm font-semibold">
                    {move || {
                        let t = content.with(|c| first_line(c).trim().to_string());
                        if t.is_empty() { "Untitled".to_string() } else { t }
                    }}
                </div>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Xs
                    on:click=move |_| ui.selected.set(None)
                >
                    "Close"
                </Button>
            </div>

            <Label html_for="node-content" class="text-xs text-muted-foreground">
                "First line is the title"
            </Label>
            <Textarea
                id="node-content"
                class="flex-1"
                bind_value=content
                on_change=on_change
            />

            <div class="flex items-center justify-between text-xs text-muted-foreground">
                <span>{move || status.get().label()}</span>
                <span>{move || format!("{} notes below", child_count())}</span>
            </div>

            <ErrorAlert error=spell_error />

            <div class="flex flex-wrap items-center gap-2">
                <Button size=ButtonSize::Sm on:click=move |_| save_now()>
                    "Save"
                </Button>
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    attr:disabled=move || spell_loading.get()
                    on:click=on_spellcheck
                >
                    <Show when=move || spell_loading.get()>
                        <Spinner />
                    </Show>
                    "Spellcheck"
                </Button>
                <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=on_add_child>
                    "Add child"
                </Button>
                <Button variant=ButtonVariant::Destructive size=ButtonSize::Sm on:click=on_delete>
                    {move || {
                        let n = child_count();
                        if n == 0 { "Delete".to_string() } else { format!("Delete with {n} below") }
                    }}
                </Button>
            </div>
        </div>
    }
}

/// Notes whose parent is missing from the garden.
#[component]
pub fn OrphanList() -> impl IntoView {
    let app = expect_context::<AppContext>().0;
    let ui = expect_context::<GardenUi>();

    let orphans = move || {
        app.garden
            .with(|g| g.as_ref().map(|g| g.orphans().to_vec()).unwrap_or_default())
    };

    view! {
        <Show when=move || !orphans().is_empty()>
            <div class="flex flex-col gap-2 border-t p-4">
                <div class="text-xs font-semibold text-amber-700">"Orphaned notes"</div>
                <div class="text-[11px] text-muted-foreground">
                    "These notes point to a parent that no longer exists."
                </div>
                {move || {
                    orphans()
                        .into_iter()
                        .map(|row| {
                            let id = row.id.clone();
                            let title = first_line(&row.content).to_string();
                            view! {
                                <div class="flex items-center justify-between gap-2 rounded border px-2 py-1 text-xs">
                                    <span class="min-w-0 truncate">{title}</span>
                                    <Button
                                        variant=ButtonVariant::Ghost
                                        size=ButtonSize::Xs
                                        on:click=move |_| {
                                            let id = id.clone();
                                            spawn_local(async move {
                                                if let Err(e) = actions::delete_orphan(app, id).await {
                                                    ui.error.set(Some(e));
                                                }
                                            });
                                        }
                                    >
                                        "Delete"
                                    </Button>
                                </div>
                            }
                        })
                        .collect_view()
                }}
            </div>
        </Show>
    }
}
