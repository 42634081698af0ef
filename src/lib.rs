mod api;
mod app;
mod canvas;
mod components;
mod config;
mod editor;
mod logging;
mod models;
mod pages;
mod search;
mod state;
mod storage;
mod sync;
mod transfer;
mod tree;
mod util;
mod viewport;

use crate::app::App;
use crate::config::EnvConfig;
use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::models::Session;
    use crate::state::AppState;
    use crate::storage::{clear_session, save_session};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_app_state_starts_signed_out_without_stored_session() {
        clear_session();
        let state = AppState::new(EnvConfig::default());
        assert!(!state.api_client.get_untracked().is_authenticated());
        assert!(state.garden.get_untracked().is_none());
    }

    #[wasm_bindgen_test]
    fn test_app_state_restores_stored_session() {
        save_session(&Session {
            access_token: "jwt".to_string(),
            refresh_token: None,
            user_id: "u1".to_string(),
            email: Some("u@example.com".to_string()),
        });
        let state = AppState::new(EnvConfig::default());
        assert_eq!(state.api_client.get_untracked().user_id().as_deref(), Some("u1"));

        state.logout();
        assert!(!state.api_client.get_untracked().is_authenticated());
        clear_session();
    }
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    let config = EnvConfig::new();
    logging::init(&config.log_level);
    tracing::info!(url = %config.supabase_url, "starting");
    mount_to_body(move || view! { <App config=config /> });
}
