pub(crate) mod actions;
pub(crate) mod autosave;
pub(crate) mod garden;

pub(crate) use autosave::Autosave;
pub(crate) use garden::GardenState;

use crate::api::{ApiError, SupabaseClient};
use crate::config::EnvConfig;
use crate::models::Garden;
use crate::storage::{load_current_garden_id, save_current_garden_id};
use leptos::prelude::*;

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub config: StoredValue<EnvConfig>,
    pub api_client: RwSignal<SupabaseClient>,

    /// Loaded from backend.
    pub gardens: RwSignal<Vec<Garden>>,
    pub gardens_loading: RwSignal<bool>,
    pub gardens_error: RwSignal<Option<String>>,

    /// Currently open garden (drives the canvas page).
    pub current_garden_id: RwSignal<Option<String>>,
    pub garden: RwSignal<Option<GardenState>>,
    pub garden_loading: RwSignal<bool>,
    pub garden_error: RwSignal<Option<String>>,

    /// Ignore responses from superseded garden loads.
    pub garden_request_id: RwSignal<u64>,

    pub search_query: RwSignal<String>,
}

impl AppState {
    pub fn new(config: EnvConfig) -> Self {
        let client = SupabaseClient::load_from_storage(&config);
        let current_garden_id = load_current_garden_id();

        Self {
            config: StoredValue::new(config),
            api_client: RwSignal::new(client),
            gardens: RwSignal::new(vec![]),
            gardens_loading: RwSignal::new(false),
            gardens_error: RwSignal::new(None),
            current_garden_id: RwSignal::new(current_garden_id),
            garden: RwSignal::new(None),
            garden_loading: RwSignal::new(false),
            garden_error: RwSignal::new(None),
            garden_request_id: RwSignal::new(0),
            search_query: RwSignal::new(String::new()),
        }
    }

    pub fn autosave_ms(&self) -> u32 {
        self.config.with_value(|c| c.autosave_ms)
    }

    pub fn set_current_garden(&self, id: Option<String>) {
        save_current_garden_id(id.as_deref());
        self.current_garden_id.set(id);
    }

    pub fn logout(&self) {
        self.api_client.update(|c| c.logout());
        self.gardens.set(vec![]);
        self.garden.set(None);
        self.current_garden_id.set(None);
        tracing::info!("signed out");
    }

    /// Turn a failed remote call into a user-facing message.
    ///
    /// An expired or rejected session signs the user out and goes back to
    /// the login page.
    pub fn handle_api_error(&self, e: &ApiError, ctx: &str) -> String {
        if e.is_unauthorized() {
            tracing::warn!(ctx, "session rejected; signing out");
            self.logout();
            let _ = window().location().set_href("/login");
        } else {
            tracing::error!(ctx, error = %e, kind = ?e.kind, "remote call failed");
        }
        format!("{ctx}: {e}")
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);
