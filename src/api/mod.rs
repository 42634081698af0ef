use crate::config::EnvConfig;
use crate::models::{Garden, NewGarden, NewNode, NodePatch, NodeRow, Session, ViewState};
use crate::storage::{clear_session, load_session, save_session};
use crate::sync::NoteStore;
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
    Config,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    pub(crate) fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }

    fn config(message: &str) -> Self {
        Self {
            kind: ApiErrorKind::Config,
            message: message.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct PasswordCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct SpellcheckRequest {
    pub text: String,
}

#[derive(Serialize)]
struct RenameGarden<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct GardenViewUpdate {
    view_state: ViewState,
}

/// `eq.<value>` filter operand.
pub(crate) fn eq_filter(value: &str) -> String {
    format!("eq.{}", urlencoding::encode(value))
}

/// `in.(a,b,c)` filter operand.
pub(crate) fn in_filter(values: &[String]) -> String {
    let joined = values
        .iter()
        .map(|v| urlencoding::encode(v).into_owned())
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({joined})")
}

/// REST client for the hosted database: auth endpoints plus the `gardens`
/// and `nodes` tables. Row-level security scopes every query to the
/// signed-in user.
#[derive(Clone, Debug)]
pub(crate) struct SupabaseClient {
    pub(crate) base_url: String,
    pub(crate) anon_key: String,
    pub(crate) spellcheck_url: Option<String>,
    pub(crate) session: Option<Session>,
}

impl SupabaseClient {
    pub fn new(config: &EnvConfig) -> Self {
        Self {
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
            spellcheck_url: config.spellcheck_url.clone(),
            session: None,
        }
    }

    pub fn load_from_storage(config: &EnvConfig) -> Self {
        let mut client = Self::new(config);
        client.session = load_session();
        client
    }

    pub fn set_session(&mut self, session: Session) {
        save_session(&session);
        self.session = Some(session);
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn user_id(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.user_id.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn logout(&mut self) {
        self.session = None;
        clear_session();
    }

    fn bearer(&self) -> String {
        let token = self
            .session
            .as_ref()
            .map(|s| s.access_token.as_str())
            .unwrap_or(self.anon_key.as_str());
        format!("Bearer {token}")
    }

    fn with_auth_headers(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.anon_key)
            .header("Authorization", self.bearer())
    }

    async fn send(
        &self,
        method: Method,
        url: String,
        body: Option<&(impl Serialize + ?Sized)>,
        prefer: Option<&str>,
        ctx: &str,
    ) -> ApiResult<reqwest::Response> {
        tracing::debug!(%method, %url, "request");

        let client = reqwest::Client::new();
        let mut req = self.with_auth_headers(client.request(method, url));
        if let Some(p) = prefer {
            req = req.header("Prefer", p);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            Ok(res)
        } else if res.status().as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, ctx))
        }
    }

    fn rest_url(&self, table: &str, query: &[(&str, String)]) -> String {
        let qs = query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        if qs.is_empty() {
            format!("{}/rest/v1/{}", self.base_url, table)
        } else {
            format!("{}/rest/v1/{}?{}", self.base_url, table, qs)
        }
    }

    async fn select<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> ApiResult<Vec<T>> {
        let mut query = vec![("select", "*".to_string())];
        query.extend(filters.iter().cloned());
        query.push(("order", "created_at.asc".to_string()));

        let url = self.rest_url(table, &query);
        let res = self
            .send(Method::GET, url, None::<&()>, None, "Select failed")
            .await?;
        res.json().await.map_err(ApiError::parse)
    }

    async fn insert<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        body: &impl Serialize,
    ) -> ApiResult<T> {
        let url = self.rest_url(table, &[]);
        let res = self
            .send(
                Method::POST,
                url,
                Some(body),
                Some("return=representation"),
                "Insert failed",
            )
            .await?;
        let rows: Vec<T> = res.json().await.map_err(ApiError::parse)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ApiError::parse(format!("insert into {table} returned no row")))
    }

    async fn update(
        &self,
        table: &str,
        filters: &[(&str, String)],
        body: &impl Serialize,
    ) -> ApiResult<()> {
        let url = self.rest_url(table, filters);
        self.send(
            Method::PATCH,
            url,
            Some(body),
            Some("return=minimal"),
            "Update failed",
        )
        .await
        .map(|_| ())
    }

    async fn delete(&self, table: &str, filters: &[(&str, String)]) -> ApiResult<()> {
        let url = self.rest_url(table, filters);
        self.send(Method::DELETE, url, None::<&()>, None, "Delete failed")
            .await
            .map(|_| ())
    }

    // --- auth ---

    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<Session> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let res = self
            .send(
                Method::POST,
                url,
                Some(&PasswordCredentials {
                    email: email.to_string(),
                    password: password.to_string(),
                }),
                None,
                "Sign in failed",
            )
            .await?;
        let data: serde_json::Value = res.json().await.map_err(ApiError::parse)?;
        Self::parse_session(&data)
            .ok_or_else(|| ApiError::parse(format!("sign-in response missing session: {data}")))
    }

    /// Returns a session when the project does not require email
    /// confirmation; `None` means the user must confirm first.
    pub async fn sign_up(&self, email: &str, password: &str) -> ApiResult<Option<Session>> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        let res = self
            .send(
                Method::POST,
                url,
                Some(&PasswordCredentials {
                    email: email.to_string(),
                    password: password.to_string(),
                }),
                None,
                "Sign up failed",
            )
            .await?;
        let data: serde_json::Value = res.json().await.map_err(ApiError::parse)?;
        Ok(Self::parse_session(&data))
    }

    pub(crate) fn parse_session(data: &serde_json::Value) -> Option<Session> {
        // Sign-up nests the session under `session`; token responses are flat.
        let root = data.get("session").filter(|s| s.is_object()).unwrap_or(data);

        let access_token = root.get("access_token")?.as_str()?.to_string();
        let user = root.get("user").or_else(|| data.get("user"))?;
        let user_id = user.get("id")?.as_str()?.to_string();

        if access_token.trim().is_empty() || user_id.trim().is_empty() {
            return None;
        }

        Some(Session {
            access_token,
            refresh_token: root
                .get("refresh_token")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            user_id,
            email: user.get("email").and_then(|v| v.as_str()).map(str::to_string),
        })
    }

    // --- spellcheck ---

    pub async fn spellcheck(&self, text: &str) -> ApiResult<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }
        let Some(url) = self.spellcheck_url.clone() else {
            return Err(ApiError::config("Spellcheck is not configured"));
        };

        let res = self
            .send(
                Method::POST,
                url,
                Some(&SpellcheckRequest {
                    text: text.to_string(),
                }),
                None,
                "Spellcheck failed",
            )
            .await?;
        let data: serde_json::Value = res.json().await.map_err(ApiError::parse)?;
        Self::parse_spellcheck_response(&data)
            .ok_or_else(|| ApiError::parse(format!("unexpected spellcheck response: {data}")))
    }

    pub(crate) fn parse_spellcheck_response(data: &serde_json::Value) -> Option<String> {
        data.get("corrected")
            .or_else(|| data.get("text"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

impl NoteStore for SupabaseClient {
    async fn list_gardens(&self) -> ApiResult<Vec<Garden>> {
        self.select("gardens", &[]).await
    }

    async fn insert_garden(&self, garden: &NewGarden) -> ApiResult<Garden> {
        self.insert("gardens", garden).await
    }

    async fn rename_garden(&self, id: &str, name: &str) -> ApiResult<()> {
        self.update("gardens", &[("id", eq_filter(id))], &RenameGarden { name })
            .await
    }

    async fn save_view_state(&self, id: &str, view: ViewState) -> ApiResult<()> {
        self.update(
            "gardens",
            &[("id", eq_filter(id))],
            &GardenViewUpdate { view_state: view },
        )
        .await
    }

    async fn delete_gardens(&self, ids: &[String]) -> ApiResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.delete("gardens", &[("id", in_filter(ids))]).await
    }

    async fn list_nodes(&self, garden_ids: &[String]) -> ApiResult<Vec<NodeRow>> {
        if garden_ids.is_empty() {
            return Ok(vec![]);
        }
        let filter = match garden_ids {
            [one] => eq_filter(one),
            many => in_filter(many),
        };
        self.select("nodes", &[("garden_id", filter)]).await
    }

    async fn insert_node(&self, node: &NewNode) -> ApiResult<NodeRow> {
        self.insert("nodes", node).await
    }

    async fn update_node(&self, id: &str, patch: &NodePatch) -> ApiResult<()> {
        self.update("nodes", &[("id", eq_filter(id))], patch).await
    }

    async fn delete_node(&self, id: &str) -> ApiResult<()> {
        self.delete("nodes", &[("id", eq_filter(id))]).await
    }

    async fn delete_nodes_in_gardens(&self, garden_ids: &[String]) -> ApiResult<()> {
        if garden_ids.is_empty() {
            return Ok(());
        }
        self.delete("nodes", &[("garden_id", in_filter(garden_ids))])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SupabaseClient {
        SupabaseClient::new(&EnvConfig::from_lookup(|k| match k {
            "SUPABASE_URL" => Some("https://proj.supabase.co".to_string()),
            "SUPABASE_ANON_KEY" => Some("anon-key".to_string()),
            _ => None,
        }))
    }

    #[test]
    fn test_client_new_has_no_session() {
        let c = client();
        assert_eq!(c.base_url, "https://proj.supabase.co");
        assert!(!c.is_authenticated());
        assert!(c.user_id().is_none());
    }

    #[test]
    fn test_bearer_falls_back_to_anon_key() {
        let mut c = client();
        assert_eq!(c.bearer(), "Bearer anon-key");
        c.session = Some(Session {
            access_token: "jwt".to_string(),
            refresh_token: None,
            user_id: "u1".to_string(),
            email: None,
        });
        assert_eq!(c.bearer(), "Bearer jwt");
        assert!(c.is_authenticated());
    }

    #[test]
    fn test_rest_url_with_filters() {
        let c = client();
        let url = c.rest_url(
            "nodes",
            &[
                ("select", "*".to_string()),
                ("garden_id", eq_filter("g-1")),
                ("order", "created_at.asc".to_string()),
            ],
        );
        assert_eq!(
            url,
            "https://proj.supabase.co/rest/v1/nodes?select=*&garden_id=eq.g-1&order=created_at.asc"
        );
        assert_eq!(c.rest_url("gardens", &[]), "https://proj.supabase.co/rest/v1/gardens");
    }

    #[test]
    fn test_filters_encode_values() {
        assert_eq!(eq_filter("a b"), "eq.a%20b");
        assert_eq!(
            in_filter(&["x".to_string(), "y,z".to_string()]),
            "in.(x,y%2Cz)"
        );
    }

    #[test]
    fn test_parse_token_response() {
        let data = serde_json::json!({
            "access_token": "jwt-token",
            "token_type": "bearer",
            "refresh_token": "r1",
            "user": { "id": "user-1", "email": "u@example.com" }
        });
        let s = SupabaseClient::parse_session(&data).expect("session should parse");
        assert_eq!(s.access_token, "jwt-token");
        assert_eq!(s.refresh_token.as_deref(), Some("r1"));
        assert_eq!(s.user_id, "user-1");
        assert_eq!(s.email.as_deref(), Some("u@example.com"));
    }

    #[test]
    fn test_parse_signup_nested_session() {
        let data = serde_json::json!({
            "user": { "id": "user-2" },
            "session": { "access_token": "t", "user": { "id": "user-2" } }
        });
        let s = SupabaseClient::parse_session(&data).expect("session should parse");
        assert_eq!(s.user_id, "user-2");
    }

    #[test]
    fn test_parse_signup_without_session_requires_confirmation() {
        let data = serde_json::json!({ "id": "user-3", "email": "x@example.com" });
        assert!(SupabaseClient::parse_session(&data).is_none());
    }

    #[test]
    fn test_parse_spellcheck_response() {
        let v = serde_json::json!({ "corrected": "Merhaba dünya" });
        assert_eq!(
            SupabaseClient::parse_spellcheck_response(&v).as_deref(),
            Some("Merhaba dünya")
        );
        assert!(SupabaseClient::parse_spellcheck_response(&serde_json::json!({})).is_none());
    }

    #[test]
    fn test_api_error_display_and_kind() {
        let e = ApiError::http(reqwest::StatusCode::BAD_REQUEST, "bad".to_string(), "Insert failed");
        assert_eq!(e.to_string(), "Insert failed (400 Bad Request): bad");
        assert!(!e.is_unauthorized());
        assert!(ApiError::unauthorized().is_unauthorized());
    }
}
