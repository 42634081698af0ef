use crate::models::Session;
use crate::util::now_ms;
use serde::{Deserialize, Serialize};

pub(crate) const SESSION_KEY: &str = "not_bahcesi_session";
pub(crate) const CURRENT_GARDEN_KEY: &str = "not_bahcesi_current_garden_id";
pub(crate) const RECENT_GARDENS_KEY: &str = "not_bahcesi_recent_gardens";

const MAX_RECENT_GARDENS: usize = 5;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct RecentGarden {
    pub id: String,
    pub name: String,
    pub last_opened_ms: i64,
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let json = local_storage()?.get_item(key).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(key, &json);
        }
    }
}

fn remove_from_storage(key: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.remove_item(key);
    }
}

pub(crate) fn save_session(session: &Session) {
    save_json_to_storage(SESSION_KEY, session);
}

pub(crate) fn load_session() -> Option<Session> {
    load_json_from_storage(SESSION_KEY)
}

pub(crate) fn clear_session() {
    remove_from_storage(SESSION_KEY);
    remove_from_storage(CURRENT_GARDEN_KEY);
}

pub(crate) fn load_current_garden_id() -> Option<String> {
    local_storage()?
        .get_item(CURRENT_GARDEN_KEY)
        .ok()
        .flatten()
        .filter(|id| !id.trim().is_empty())
}

pub(crate) fn save_current_garden_id(id: Option<&str>) {
    let Some(storage) = local_storage() else {
        return;
    };
    let _ = match id {
        Some(id) => storage.set_item(CURRENT_GARDEN_KEY, id),
        None => storage.remove_item(CURRENT_GARDEN_KEY),
    };
}

pub(crate) fn upsert_lru_by_key<T: Clone>(
    mut items: Vec<T>,
    item: T,
    same_key: impl Fn(&T, &T) -> bool,
    max: usize,
) -> Vec<T> {
    items.retain(|x| !same_key(x, &item));
    items.insert(0, item);
    if items.len() > max {
        items.truncate(max);
    }
    items
}

pub(crate) fn load_recent_gardens() -> Vec<RecentGarden> {
    load_json_from_storage::<Vec<RecentGarden>>(RECENT_GARDENS_KEY).unwrap_or_default()
}

pub(crate) fn write_recent_garden(id: &str, name: &str) {
    if id.trim().is_empty() {
        return;
    }

    let item = RecentGarden {
        id: id.to_string(),
        name: name.to_string(),
        last_opened_ms: now_ms(),
    };

    let next = upsert_lru_by_key(
        load_recent_gardens(),
        item,
        |a, b| a.id == b.id,
        MAX_RECENT_GARDENS,
    );
    save_json_to_storage(RECENT_GARDENS_KEY, &next);
}

/// Drop recents whose garden no longer exists.
pub(crate) fn prune_recent_gardens(existing_ids: &[String]) {
    let recents = load_recent_gardens();
    let kept: Vec<_> = recents
        .iter()
        .filter(|r| existing_ids.contains(&r.id))
        .cloned()
        .collect();
    if kept.len() != recents.len() {
        save_json_to_storage(RECENT_GARDENS_KEY, &kept);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_lru_moves_existing_to_front() {
        let items = vec![1, 2, 3];
        let next = upsert_lru_by_key(items, 3, |a, b| a == b, 10);
        assert_eq!(next, vec![3, 1, 2]);
    }

    #[test]
    fn test_upsert_lru_truncates() {
        let items = vec![1, 2, 3];
        let next = upsert_lru_by_key(items, 4, |a, b| a == b, 3);
        assert_eq!(next, vec![4, 1, 2]);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_session_round_trip_and_clear() {
        let s = Session {
            access_token: "t".to_string(),
            refresh_token: None,
            user_id: "u".to_string(),
            email: Some("u@example.com".to_string()),
        };
        save_session(&s);
        save_current_garden_id(Some("g1"));
        assert_eq!(load_session(), Some(s));
        assert_eq!(load_current_garden_id().as_deref(), Some("g1"));

        clear_session();
        assert!(load_session().is_none());
        assert!(load_current_garden_id().is_none());
    }

    #[wasm_bindgen_test]
    fn test_recent_gardens_prune() {
        write_recent_garden("g1", "One");
        write_recent_garden("g2", "Two");
        assert_eq!(load_recent_gardens()[0].id, "g2");

        prune_recent_gardens(&["g1".to_string()]);
        let recents = load_recent_gardens();
        assert_eq!(recents.len(), 1);
        assert_eq!(recents[0].id, "g1");
    }
}
