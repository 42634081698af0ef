use crate::config::EnvConfig;
use crate::pages::{GardenPage, GardensPage, LoginPage, RegistrationPage, RootAuthed};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub(crate) fn App(config: EnvConfig) -> impl IntoView {
    provide_context(AppContext(AppState::new(config)));

    // Router hooks (params, query, navigate) need the <Router> context.
    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("login") view=LoginPage />
                <Route path=path!("signup") view=RegistrationPage />
                <Route path=path!("garden/:garden_id") view=move || view! {
                    <RootAuthed>
                        <GardenPage />
                    </RootAuthed>
                } />
                <Route path=path!("") view=move || view! {
                    <RootAuthed>
                        <GardensPage />
                    </RootAuthed>
                } />
            </Routes>
        </Router>
    }
}
