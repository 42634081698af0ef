use crate::canvas::GardenCanvas;
use crate::components::ui::{
    Button, ButtonSize, ButtonVariant, Card, CardContent, CardDescription, CardHeader, CardTitle,
    ErrorAlert, Input, Label, NoticeAlert, Spinner,
};
use crate::editor::{GardenUi, NodeEditor, OrphanList};
use crate::models::{Garden, Point};
use crate::search::{search_nodes, SearchHit};
use crate::state::{actions, AppContext};
use crate::storage::load_recent_gardens;
use crate::sync::NoteStore;
use crate::transfer::{
    export_json, parse_import, render_html, render_print_html, run_import, ExportFormat,
    ImportMode,
};
use crate::util::{date_stamp, download_text, file_slug, now_iso, open_html_window, read_file_text};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::{use_navigate, use_query_map};
use leptos_router::params::Params;
use strum::IntoEnumIterator;
use wasm_bindgen::JsCast;

const APP_NAME: &str = "Not Bahçesi";
const MIN_PASSWORD_LEN: usize = 6;

fn confirm(message: &str) -> bool {
    window().confirm_with_message(message).unwrap_or(false)
}

#[component]
fn AuthShell(title: &'static str, description: &'static str, children: Children) -> impl IntoView {
    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <a href="/" class="text-sm font-medium text-foreground">{APP_NAME}</a>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">{title}</CardTitle>
                        <CardDescription class="text-xs">{description}</CardDescription>
                    </CardHeader>
                    <CardContent>{children()}</CardContent>
                </Card>
            </div>
        </div>
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let email_val = email.get().trim().to_string();
        let password_val = password.get();
        if email_val.is_empty() || password_val.is_empty() {
            return;
        }
        let mut api_client = app_state.0.api_client.get_untracked();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.sign_in(&email_val, &password_val).await {
                Ok(session) => {
                    tracing::info!(user = %session.user_id, "signed in");
                    api_client.set_session(session);
                    app_state.0.api_client.set(api_client);
                    let _ = window().location().set_href("/");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "sign in failed");
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <AuthShell title="Log in" description="Use your email and password to open your gardens.">
            <form class="flex flex-col gap-3" on:submit=on_submit>
                <div class="flex flex-col gap-1.5">
                    <Label html_for="email" class="text-xs">"Email"</Label>
                    <Input
                        id="email"
                        r#type="email"
                        placeholder="you@example.com"
                        bind_value=email
                        required=true
                        class="h-8 text-sm"
                    />
                </div>

                <div class="flex flex-col gap-1.5">
                    <Label html_for="password" class="text-xs">"Password"</Label>
                    <Input
                        id="password"
                        r#type="password"
                        placeholder="••••••••"
                        bind_value=password
                        required=true
                        class="h-8 text-sm"
                    />
                </div>

                <ErrorAlert error=error />

                <Button class="w-full" size=ButtonSize::Sm attr:disabled=move || loading.get()>
                    <span class="inline-flex items-center gap-2">
                        <Show when=move || loading.get()>
                            <Spinner />
                        </Show>
                        {move || if loading.get() { "Signing in..." } else { "Continue" }}
                    </span>
                </Button>

                <div class="pt-1 text-xs text-muted-foreground">
                    "No account? "
                    <a class="text-primary underline underline-offset-4" href="/signup">"Sign up"</a>
                </div>
            </form>
        </AuthShell>
    }
}

#[component]
pub fn RegistrationPage() -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let confirm_password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let awaiting_confirmation: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let email_val = email.get().trim().to_string();
        let password_val = password.get();

        if password_val != confirm_password.get() {
            error.set(Some("Passwords do not match".to_string()));
            return;
        }
        if password_val.chars().count() < MIN_PASSWORD_LEN {
            error.set(Some(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
            return;
        }

        let mut api_client = app_state.0.api_client.get_untracked();
        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.sign_up(&email_val, &password_val).await {
                Ok(Some(session)) => {
                    api_client.set_session(session);
                    app_state.0.api_client.set(api_client);
                    let _ = window().location().set_href("/");
                }
                Ok(None) => awaiting_confirmation.set(true),
                Err(e) => error.set(Some(e.to_string())),
            }
            loading.set(false);
        });
    };

    view! {
        <AuthShell title="Create account" description="Start a new garden of notes.">
            <Show
                when=move || !awaiting_confirmation.get()
                fallback=move || view! {
                    <NoticeAlert message=Signal::derive(|| Some(
                        "Check your inbox to confirm your email, then log in.".to_string()
                    )) />
                    <a class="mt-3 inline-block text-xs text-primary underline underline-offset-4" href="/login">"Log in"</a>
                }
            >
                <form class="flex flex-col gap-3" on:submit=on_submit>
                    <div class="flex flex-col gap-1.5">
                        <Label html_for="email" class="text-xs">"Email"</Label>
                        <Input
                            id="email"
                            r#type="email"
                            placeholder="you@example.com"
                            bind_value=email
                            required=true
                            class="h-8 text-sm"
                        />
                    </div>

                    <div class="flex flex-col gap-1.5">
                        <Label html_for="password" class="text-xs">"Password"</Label>
                        <Input
                            id="password"
                            r#type="password"
                            placeholder="••••••••"
                            bind_value=password
                            required=true
                            class="h-8 text-sm"
                        />
                    </div>

                    <div class="flex flex-col gap-1.5">
                        <Label html_for="confirm_password" class="text-xs">"Confirm password"</Label>
                        <Input
                            id="confirm_password"
                            r#type="password"
                            placeholder="••••••••"
                            bind_value=confirm_password
                            required=true
                            class="h-8 text-sm"
                        />
                    </div>

                    <ErrorAlert error=error />

                    <Button class="w-full" size=ButtonSize::Sm attr:disabled=move || loading.get()>
                        <span class="inline-flex items-center gap-2">
                            <Show when=move || loading.get()>
                                <Spinner />
                            </Show>
                            {move || if loading.get() { "Creating..." } else { "Continue" }}
                        </span>
                    </Button>

                    <div class="pt-1 text-xs text-muted-foreground">
                        "Already have an account? "
                        <a class="text-primary underline underline-offset-4" href="/login">"Log in"</a>
                    </div>
                </form>
            </Show>
        </AuthShell>
    }
}

#[component]
pub fn AppLayout(children: Children) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let email = move || {
        app_state
            .0
            .api_client
            .with(|c| c.session().and_then(|s| s.email.clone()))
            .unwrap_or_default()
    };

    view! {
        <div class="flex h-screen flex-col bg-background">
            <header class="flex h-12 shrink-0 items-center justify-between border-b px-4">
                <a href="/" class="text-sm font-semibold text-emerald-800">{APP_NAME}</a>
                <div class="flex items-center gap-3 text-xs text-muted-foreground">
                    <span>{email}</span>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Xs
                        on:click=move |_| {
                            app_state.0.logout();
                            let _ = window().location().set_href("/login");
                        }
                    >
                        "Log out"
                    </Button>
                </div>
            </header>
            <main class="min-h-0 flex-1">{children()}</main>
        </div>
    }
}

#[component]
pub fn RootAuthed(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let is_authenticated = move || app_state.0.api_client.with(|c| c.is_authenticated());

    // Store children so the view macro sees an `Fn` (not an `FnOnce`).
    let children = StoredValue::new(children);

    view! {
        <Show when=is_authenticated fallback=move || view! { <LoginPage /> }>
            <AppLayout>
                {move || children.with_value(|c| c())}
            </AppLayout>
        </Show>
    }
}

#[component]
fn GardenRow(garden: Garden, busy: RwSignal<bool>, error: RwSignal<Option<String>>) -> impl IntoView {
    let app = expect_context::<AppContext>().0;
    let id = StoredValue::new(garden.id.clone());
    let editing = RwSignal::new(false);
    let draft = RwSignal::new(garden.name.clone());
    let name = garden.name.clone();

    let on_rename = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        editing.set(false);
        let name = draft.get_untracked();
        spawn_local(async move {
            if let Err(e) = actions::rename_garden_remote(app, id.get_value(), name).await {
                error.set(Some(e));
            }
        });
    };

    let on_delete = {
        let name = name.clone();
        move |_| {
            if !confirm(&format!("Delete \"{name}\" and all of its notes?")) {
                return;
            }
            busy.set(true);
            spawn_local(async move {
                if let Err(e) = actions::delete_garden(app, id.get_value()).await {
                    error.set(Some(e));
                }
                busy.set(false);
            });
        }
    };

    view! {
        <li class="flex items-center justify-between gap-3 rounded-lg border px-3 py-2">
            <Show
                when=move || editing.get()
                fallback=move || {
                    let href = format!("/garden/{}", id.get_value());
                    view! {
                        <a class="min-w-0 flex-1 truncate text-sm font-medium hover:underline" href=href>
                            {name.clone()}
                        </a>
                    }
                }
            >
                <form class="flex flex-1 items-center gap-2" on:submit=on_rename>
                    <Input bind_value=draft class="h-8 text-sm" autofocus=true />
                    <Button size=ButtonSize::Xs>"Save"</Button>
                </form>
            </Show>
            <div class="flex items-center gap-1">
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Xs
                    on:click=move |_| editing.update(|e| *e = !*e)
                >
                    {move || if editing.get() { "Cancel" } else { "Rename" }}
                </Button>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Xs
                    class="text-destructive"
                    attr:disabled=move || busy.get()
                    on:click=on_delete
                >
                    "Delete"
                </Button>
            </div>
        </li>
    }
}

#[component]
pub fn GardensPage() -> impl IntoView {
    let app = expect_context::<AppContext>().0;

    let new_name: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let notice: RwSignal<Option<String>> = RwSignal::new(None);
    let busy: RwSignal<bool> = RwSignal::new(false);
    let import_mode: RwSignal<ImportMode> = RwSignal::new(ImportMode::default());
    let hits: RwSignal<Vec<SearchHit>> = RwSignal::new(vec![]);
    let searching: RwSignal<bool> = RwSignal::new(false);
    let recents = RwSignal::new(load_recent_gardens());

    spawn_local(async move {
        let _ = actions::load_gardens(app).await;
        recents.set(load_recent_gardens());
    });

    let on_create = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let name = new_name.get_untracked();
        if name.trim().is_empty() {
            return;
        }
        busy.set(true);
        error.set(None);
        spawn_local(async move {
            match actions::create_garden(app, name).await {
                Ok(_) => new_name.set(String::new()),
                Err(e) => error.set(Some(e)),
            }
            busy.set(false);
        });
    };

    let on_export = move |_| {
        let client = app.api_client.get_untracked();
        busy.set(true);
        error.set(None);
        spawn_local(async move {
            let stamp = now_iso();
            match export_json(&client, &stamp).await {
                Ok(text) => {
                    let file = ExportFormat::Json.file_name("not-bahcesi", date_stamp(&stamp));
                    if let Err(e) = download_text(&file, ExportFormat::Json.mime(), &text) {
                        error.set(Some(e));
                    }
                }
                Err(e) => error.set(Some(app.handle_api_error(&e, "Export failed"))),
            }
            busy.set(false);
        });
    };

    let on_import_file = move |ev: web_sys::Event| {
        let Some(input) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        else {
            return;
        };
        let Some(file) = input.files().and_then(|files| files.get(0)) else {
            return;
        };
        input.set_value("");

        let mode = import_mode.get_untracked();
        let client = app.api_client.get_untracked();
        error.set(None);
        notice.set(None);

        spawn_local(async move {
            let text = match read_file_text(file).await {
                Ok(text) => text,
                Err(e) => {
                    error.set(Some(e));
                    return;
                }
            };
            let doc = match parse_import(&text) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(error = %e, "rejected import file");
                    error.set(Some(e.to_string()));
                    return;
                }
            };
            if mode == ImportMode::Replace
                && !confirm("Replace all of your gardens with the imported file?")
            {
                return;
            }

            busy.set(true);
            match run_import(&client, &doc, mode, client.user_id()).await {
                Ok(report) => {
                    let mut msg = format!(
                        "Imported {} gardens and {} notes.",
                        report.gardens, report.nodes
                    );
                    if report.skipped > 0 {
                        msg.push_str(&format!(" Skipped {} notes with a broken parent.", report.skipped));
                    }
                    notice.set(Some(msg));
                }
                Err(e) => error.set(Some(format!("Import failed: {e}"))),
            }
            let _ = actions::load_gardens(app).await;
            busy.set(false);
        });
    };

    let on_search = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let query = app.search_query.get_untracked();
        if query.trim().is_empty() {
            hits.set(vec![]);
            return;
        }
        let client = app.api_client.get_untracked();
        let ids: Vec<String> = app
            .gardens
            .with_untracked(|gs| gs.iter().map(|g| g.id.clone()).collect());
        searching.set(true);
        spawn_local(async move {
            match client.list_nodes(&ids).await {
                Ok(rows) => hits.set(search_nodes(&rows, &query)),
                Err(e) => error.set(Some(app.handle_api_error(&e, "Search failed"))),
            }
            searching.set(false);
        });
    };

    let garden_name = move |id: &str| {
        app.gardens.with(|gs| {
            gs.iter()
                .find(|g| g.id == id)
                .map(|g| g.name.clone())
                .unwrap_or_default()
        })
    };

    view! {
        <div class="mx-auto flex h-full w-full max-w-3xl flex-col gap-6 overflow-y-auto px-4 py-8">
            <section class="flex flex-col gap-3">
                <h1 class="text-lg font-semibold">"Gardens"</h1>

                <form class="flex items-center gap-2" on:submit=on_create>
                    <Input bind_value=new_name placeholder="New garden name" class="h-8 text-sm" />
                    <Button size=ButtonSize::Sm attr:disabled=move || busy.get()>"Create"</Button>
                </form>

                <ErrorAlert error=error />
                <ErrorAlert error=app.gardens_error />
                <NoticeAlert message=notice />

                <Show when=move || app.gardens_loading.get()>
                    <div class="flex items-center gap-2 text-xs text-muted-foreground">
                        <Spinner />
                        "Loading gardens..."
                    </div>
                </Show>

                <Show when=move || !recents.get().is_empty()>
                    <div class="flex flex-wrap items-center gap-2 text-xs text-muted-foreground">
                        "Recent:"
                        {move || {
                            recents
                                .get()
                                .into_iter()
                                .map(|r| {
                                    let href = format!("/garden/{}", r.id);
                                    view! {
                                        <a class="rounded border px-2 py-0.5 hover:bg-accent" href=href>
                                            {r.name}
                                        </a>
                                    }
                                })
                                .collect_view()
                        }}
                    </div>
                </Show>

                <ul class="flex flex-col gap-2">
                    {move || {
                        let gardens = app.gardens.get();
                        if gardens.is_empty() && !app.gardens_loading.get() {
                            return view! {
                                <li class="text-xs text-muted-foreground">"No gardens yet. Create one above."</li>
                            }
                            .into_any();
                        }
                        gardens
                            .into_iter()
                            .map(|g| view! { <GardenRow garden=g busy=busy error=error /> })
                            .collect_view()
                            .into_any()
                    }}
                </ul>
            </section>

            <section class="flex flex-col gap-3">
                <h2 class="text-sm font-semibold">"Search notes"</h2>
                <form class="flex items-center gap-2" on:submit=on_search>
                    <Input bind_value=app.search_query placeholder="Search all gardens" class="h-8 text-sm" />
                    <Button variant=ButtonVariant::Outline size=ButtonSize::Sm attr:disabled=move || searching.get()>
                        "Search"
                    </Button>
                </form>
                <ul class="flex flex-col gap-1">
                    {move || {
                        hits.get()
                            .into_iter()
                            .map(|hit| {
                                let href = format!("/garden/{}?node={}", hit.garden_id, hit.node_id);
                                let garden = garden_name(&hit.garden_id);
                                view! {
                                    <li class="rounded border px-3 py-2">
                                        <a class="text-sm font-medium hover:underline" href=href>{hit.title}</a>
                                        <div class="text-[11px] text-muted-foreground">{garden}</div>
                                        <div class="text-xs text-muted-foreground">{hit.snippet}</div>
                                    </li>
                                }
                            })
                            .collect_view()
                    }}
                </ul>
            </section>

            <section class="flex flex-col gap-3">
                <h2 class="text-sm font-semibold">"Backup"</h2>
                <div class="flex flex-wrap items-center gap-2">
                    <Button variant=ButtonVariant::Outline size=ButtonSize::Sm attr:disabled=move || busy.get() on:click=on_export>
                        "Export JSON"
                    </Button>
                    <label class="inline-flex h-8 cursor-pointer items-center rounded-md border px-3 text-sm hover:bg-accent">
                        "Import JSON"
                        <input type="file" accept="application/json,.json" class="hidden" on:change=on_import_file />
                    </label>
                </div>
                <div class="flex flex-col gap-1">
                    {ImportMode::iter()
                        .map(|mode| {
                            view! {
                                <label class="flex items-center gap-2 text-xs">
                                    <input
                                        type="radio"
                                        name="import-mode"
                                        value=mode.to_string()
                                        prop:checked=move || import_mode.get() == mode
                                        on:change=move |_| import_mode.set(mode)
                                    />
                                    {mode.label()}
                                </label>
                            }
                        })
                        .collect_view()}
                </div>
            </section>
        </div>
    }
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct GardenRouteParams {
    pub garden_id: Option<String>,
}

#[component]
pub fn GardenPage() -> impl IntoView {
    let app = expect_context::<AppContext>().0;
    let params = leptos_router::hooks::use_params::<GardenRouteParams>();
    let query = use_query_map();
    let navigate = StoredValue::new(use_navigate());

    let ui = GardenUi::new();
    provide_context(ui);

    let garden_id = move || params.get().ok().and_then(|p| p.garden_id).unwrap_or_default();

    Effect::new(move |_| {
        let id = garden_id();
        if id.trim().is_empty() {
            return;
        }
        ui.selected.set(None);
        spawn_local(async move {
            if actions::open_garden(app, id).await.is_ok() {
                if let Some(node) = query.with_untracked(|q| q.get("node")) {
                    ui.selected.set(Some(node));
                }
            }
        });
    });

    let open_id = Memo::new(move |_| {
        app.garden
            .with(|g| g.as_ref().map(|g| g.garden.id.clone()))
    });

    let title = move || {
        app.garden
            .with(|g| g.as_ref().map(|g| g.garden.name.clone()))
            .unwrap_or_default()
    };

    let export_html = move |print: bool| {
        let Some((name, trees)) = app.garden.with_untracked(|g| {
            g.as_ref()
                .map(|g| (g.garden.name.clone(), g.forest().trees().to_vec()))
        }) else {
            return;
        };
        let stamp = now_iso();
        let result = if print {
            open_html_window(&render_print_html(&name, &stamp, &trees))
        } else {
            let file = ExportFormat::Html.file_name(&file_slug(&name), date_stamp(&stamp));
            download_text(
                &file,
                ExportFormat::Html.mime(),
                &render_html(&name, &stamp, &trees),
            )
        };
        if let Err(e) = result {
            ui.error.set(Some(e));
        }
    };

    let on_new_tree = move |_| {
        let count = app
            .garden
            .with_untracked(|g| g.as_ref().map(|g| g.forest().len()).unwrap_or(0));
        let pos = Point::new(40.0, 40.0 + count as f64 * 160.0);
        spawn_local(async move {
            match actions::create_root(app, "New note".to_string(), pos).await {
                Ok(Some(row)) => ui.selected.set(Some(row.id)),
                Ok(None) => {}
                Err(e) => ui.error.set(Some(e)),
            }
        });
    };

    view! {
        <div class="flex h-full flex-col">
            <div class="flex h-11 shrink-0 items-center justify-between gap-2 border-b px-4">
                <div class="flex min-w-0 items-center gap-2">
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Xs
                        on:click=move |_| navigate.with_value(|nav| nav("/", Default::default()))
                    >
                        "← Gardens"
                    </Button>
                    <span class="truncate text-sm font-semibold">{title}</span>
                    <Show when=move || app.garden_loading.get()>
                        <Spinner />
                    </Show>
                </div>
                <div class="flex items-center gap-1">
                    <Button variant=ButtonVariant::Outline size=ButtonSize::Xs on:click=on_new_tree>
                        "New tree"
                    </Button>
                    <Button variant=ButtonVariant::Ghost size=ButtonSize::Xs on:click=move |_| export_html(false)>
                        "HTML"
                    </Button>
                    <Button variant=ButtonVariant::Ghost size=ButtonSize::Xs on:click=move |_| export_html(true)>
                        "Print / PDF"
                    </Button>
                </div>
            </div>

            <div class="px-4 empty:hidden">
                <ErrorAlert error=app.garden_error />
                <ErrorAlert error=ui.error />
            </div>

            <div class="flex min-h-0 flex-1">
                <div class="min-w-0 flex-1">
                    // Re-mount the canvas per garden so its viewport starts from
                    // that garden's saved view.
                    {move || open_id.get().map(|_| view! { <GardenCanvas /> })}
                </div>
                <aside class="flex w-80 shrink-0 flex-col overflow-y-auto border-l">
                    {move || {
                        ui.selected
                            .get()
                            .map(|id| view! { <NodeEditor id=id /> }.into_any())
                            .unwrap_or_else(|| {
                                view! {
                                    <div class="p-4 text-xs text-muted-foreground">
                                        "Select a note to edit it."
                                    </div>
                                }
                                .into_any()
                            })
                    }}
                    <OrphanList />
                </aside>
            </div>
        </div>
    }
}
