use serde::{Deserialize, Serialize};

const DEFAULT_SUPABASE_URL: &str = "http://localhost:54321";
const DEFAULT_AUTOSAVE_MS: u32 = 1500;
const MIN_AUTOSAVE_MS: u32 = 100;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime configuration, injected by the hosting page as `window.ENV`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct EnvConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub spellcheck_url: Option<String>,
    pub autosave_ms: u32,
    pub log_level: String,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl EnvConfig {
    pub fn new() -> Self {
        let env = web_sys::window()
            .and_then(|w| w.get("ENV"))
            .filter(|env| !env.is_undefined() && env.is_object());

        let Some(env) = env else {
            return Self::default();
        };

        Self::from_lookup(|key| {
            js_sys::Reflect::get(&env, &key.into())
                .ok()
                .and_then(|v| v.as_string().or_else(|| v.as_f64().map(|n| n.to_string())))
        })
    }

    /// Build from a key lookup. Upper-case keys (`SUPABASE_URL`) win over
    /// their lower-case spelling (`supabase_url`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .or_else(|| lookup(&key.to_lowercase()))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let autosave_ms = get("AUTOSAVE_MS")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| (v as u32).max(MIN_AUTOSAVE_MS))
            .unwrap_or(DEFAULT_AUTOSAVE_MS);

        Self {
            supabase_url: get("SUPABASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_SUPABASE_URL.to_string()),
            supabase_anon_key: get("SUPABASE_ANON_KEY").unwrap_or_default(),
            spellcheck_url: get("SPELLCHECK_URL"),
            autosave_ms,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}
