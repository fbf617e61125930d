//! Hosted backend: GoTrue for sessions, PostgREST for the schedule tables.

use crate::capability::{AuthEvent, AuthProvider, Backend, Connection, DataStore, Filter, Select};
use crate::error::{AppError, AppResult};
use crate::models::{Session, User};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 16;

/// Shares one HTTP connection pool between every browser's client.
#[derive(Clone)]
pub struct SupabaseBackend {
    http: reqwest::Client,
    url: String,
    anon_key: String,
}

impl SupabaseBackend {
    pub fn new(url: &str, anon_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }
}

impl SupabaseBackend {
    fn client(&self) -> SupabaseClient {
        SupabaseClient {
            http: self.http.clone(),
            url: self.url.clone(),
            anon_key: self.anon_key.clone(),
            session: RwLock::new(None),
            events: broadcast::channel(EVENT_CAPACITY).0,
        }
    }
}

impl Backend for SupabaseBackend {
    fn connect(&self) -> Connection {
        let client = Arc::new(self.client());
        Connection {
            auth: client.clone(),
            data: client,
        }
    }
}

/// One signed-in (or anonymous) client. Data requests carry the session's
/// access token so the row-level policies apply to the right user.
pub struct SupabaseClient {
    http: reqwest::Client,
    url: String,
    anon_key: String,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
    user: User,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        Session {
            user: self.user,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: now + Duration::seconds(self.expires_in),
        }
    }
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// GoTrue and PostgREST disagree on where the message goes.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.msg.or(b.message).or(b.error_description).or(b.error))
        .unwrap_or_else(|| format!("HTTP {status}"))
}

async fn ensure_success(resp: reqwest::Response) -> AppResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), %body, "supabase request rejected");
    Err(AppError::Remote(error_message(status, &body)))
}

fn filter_param(filter: &Filter) -> (String, String) {
    (filter.column.to_string(), format!("eq.{}", filter.value))
}

fn select_params(query: &Select) -> Vec<(String, String)> {
    let direction = if query.order.ascending { "asc" } else { "desc" };
    vec![
        ("select".to_string(), query.columns.to_string()),
        filter_param(&query.filter),
        (
            "order".to_string(),
            format!("{}.{}", query.order.column, direction),
        ),
    ]
}

impl SupabaseClient {
    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    async fn rest(&self, method: Method, table: &str) -> RequestBuilder {
        let token = match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.anon_key.clone(),
        };
        self.http
            .request(method, self.rest_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    async fn token(&self, grant_type: &str, body: Value) -> AppResult<Session> {
        let resp = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;
        let token: TokenResponse = ensure_success(resp).await?.json().await?;
        let session = token.into_session(Utc::now());
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn clear_session(&self) {
        *self.session.write().await = None;
        // No subscribers is fine.
        let _ = self.events.send(AuthEvent::SignedOut);
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn get_session(&self) -> AppResult<Option<Session>> {
        let current = self.session.read().await.clone();
        let Some(session) = current else {
            return Ok(None);
        };
        if session.is_valid(Utc::now()) {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token else {
            debug!(user = %session.user.id, "session expired");
            self.clear_session().await;
            return Ok(None);
        };
        match self
            .token("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
        {
            Ok(session) => {
                debug!(user = %session.user.id, "session refreshed");
                let _ = self.events.send(AuthEvent::TokenRefreshed);
                Ok(Some(session))
            }
            Err(err) => {
                warn!(%err, "session refresh failed");
                self.clear_session().await;
                Ok(None)
            }
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<User> {
        let session = self
            .token("password", json!({ "email": email, "password": password }))
            .await?;
        info!(user = %session.user.id, "password sign-in accepted");
        let _ = self.events.send(AuthEvent::SignedIn);
        Ok(session.user)
    }

    async fn get_current_user(&self) -> AppResult<Option<User>> {
        let Some(session) = self.get_session().await? else {
            return Ok(None);
        };
        let resp = self
            .http
            .get(self.auth_url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            debug!("access token rejected");
            return Ok(None);
        }
        let user: User = ensure_success(resp).await?.json().await?;
        Ok(Some(user))
    }

    async fn sign_out(&self) -> AppResult<()> {
        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone());
        let result = match token {
            Some(token) => {
                let sent = self
                    .http
                    .post(self.auth_url("logout"))
                    .header("apikey", &self.anon_key)
                    .bearer_auth(token)
                    .send()
                    .await;
                match sent {
                    Ok(resp) => ensure_success(resp).await.map(|_| ()),
                    Err(err) => Err(err.into()),
                }
            }
            None => Ok(()),
        };
        self.clear_session().await;
        result
    }

    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl DataStore for SupabaseClient {
    async fn select(&self, query: Select) -> AppResult<Vec<Value>> {
        let resp = self
            .rest(Method::GET, query.table)
            .await
            .query(&select_params(&query))
            .send()
            .await?;
        let rows: Vec<Value> = ensure_success(resp).await?.json().await?;
        Ok(rows)
    }

    async fn insert(&self, table: &'static str, rows: Vec<Value>) -> AppResult<()> {
        let resp = self
            .rest(Method::POST, table)
            .await
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    async fn update(&self, table: &'static str, fields: Value, filter: Filter) -> AppResult<()> {
        let resp = self
            .rest(Method::PATCH, table)
            .await
            .query(&[filter_param(&filter)])
            .json(&fields)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    async fn delete(&self, table: &'static str, filter: Filter) -> AppResult<()> {
        let resp = self
            .rest(Method::DELETE, table)
            .await
            .query(&[filter_param(&filter)])
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Order;
    use axum::{
        Json, Router,
        extract::Query,
        response::IntoResponse,
        routing::post,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn picks_message_from_either_service() {
        let gotrue = r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#;
        let legacy = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        let postgrest = r#"{"code":"42501","details":null,"hint":null,"message":"permission denied"}"#;

        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, gotrue),
            "Invalid login credentials"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, legacy),
            "Invalid login credentials"
        );
        assert_eq!(
            error_message(StatusCode::FORBIDDEN, postgrest),
            "permission denied"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "<html>"),
            "HTTP 502 Bad Gateway"
        );
    }

    #[test]
    fn select_is_owner_filtered_and_ordered() {
        let params = select_params(&Select {
            table: "horarios_regulares",
            columns: "*",
            filter: Filter::eq("user_id", "abc"),
            order: Order {
                column: "dia_semana",
                ascending: true,
            },
        });
        assert_eq!(
            params,
            vec![
                ("select".to_string(), "*".to_string()),
                ("user_id".to_string(), "eq.abc".to_string()),
                ("order".to_string(), "dia_semana.asc".to_string()),
            ]
        );
    }

    #[test]
    fn token_response_becomes_session() {
        let token: TokenResponse = serde_json::from_value(json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r1",
            "user": { "id": "u-1", "email": "ana@example.com", "aud": "authenticated" }
        }))
        .unwrap();
        let now = Utc::now();
        let session = token.into_session(now);
        assert_eq!(session.user.id, "u-1");
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));
        assert_eq!(session.expires_at, now + Duration::seconds(3600));
    }

    #[test]
    fn backend_urls_drop_trailing_slash() {
        let backend = SupabaseBackend::new("https://demo.supabase.co/", "anon");
        assert_eq!(backend.url, "https://demo.supabase.co");
    }

    /// Serves `/auth/v1/token` for the refresh grant only. `good` is the one
    /// refresh token it accepts; every call is counted.
    async fn token_endpoint(good: &'static str) -> (String, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let app = Router::new().route(
            "/auth/v1/token",
            post(
                move |Query(query): Query<HashMap<String, String>>, Json(body): Json<Value>| {
                    let calls = Arc::clone(&counted);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        let accepted = query.get("grant_type").map(String::as_str)
                            == Some("refresh_token")
                            && body["refresh_token"] == good;
                        if accepted {
                            Json(json!({
                                "access_token": "fresh-jwt",
                                "token_type": "bearer",
                                "expires_in": 3600,
                                "refresh_token": "r2",
                                "user": { "id": "u-1", "email": "ana@example.com" }
                            }))
                            .into_response()
                        } else {
                            (
                                StatusCode::BAD_REQUEST,
                                Json(json!({
                                    "error": "invalid_grant",
                                    "error_description": "Invalid Refresh Token: Refresh Token Not Found"
                                })),
                            )
                                .into_response()
                        }
                    }
                },
            ),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), calls)
    }

    async fn expired_client(url: &str, refresh_token: Option<&str>) -> SupabaseClient {
        let client = SupabaseBackend::new(url, "anon").client();
        *client.session.write().await = Some(Session {
            user: User {
                id: "u-1".into(),
                email: Some("ana@example.com".into()),
            },
            access_token: "stale-jwt".into(),
            refresh_token: refresh_token.map(str::to_string),
            expires_at: Utc::now() - Duration::seconds(1),
        });
        client
    }

    #[tokio::test]
    async fn expired_session_is_refreshed() {
        let (url, calls) = token_endpoint("r1").await;
        let client = expired_client(&url, Some("r1")).await;
        let mut events = client.on_auth_state_change();

        let session = client.get_session().await.unwrap().unwrap();

        assert_eq!(session.access_token, "fresh-jwt");
        assert_eq!(session.refresh_token.as_deref(), Some("r2"));
        assert!(session.is_valid(Utc::now()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(events.try_recv().unwrap(), AuthEvent::TokenRefreshed);
        let stored = client.session.read().await.clone().unwrap();
        assert_eq!(stored.access_token, "fresh-jwt");
    }

    #[tokio::test]
    async fn rejected_refresh_signs_out() {
        let (url, calls) = token_endpoint("r1").await;
        let client = expired_client(&url, Some("revoked")).await;
        let mut events = client.on_auth_state_change();

        assert!(client.get_session().await.unwrap().is_none());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(events.try_recv().unwrap(), AuthEvent::SignedOut);
        assert!(client.session.read().await.is_none());
    }

    #[tokio::test]
    async fn expired_session_without_refresh_token_signs_out_offline() {
        let (url, calls) = token_endpoint("r1").await;
        let client = expired_client(&url, None).await;
        let mut events = client.on_auth_state_change();

        assert!(client.get_session().await.unwrap().is_none());

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(events.try_recv().unwrap(), AuthEvent::SignedOut);
        assert!(client.session.read().await.is_none());
    }

    #[tokio::test]
    async fn anonymous_client_has_no_session() {
        let backend = SupabaseBackend::new("http://127.0.0.1:9", "anon");
        let connection = backend.connect();
        assert!(connection.auth.get_session().await.unwrap().is_none());
        assert!(connection.auth.get_current_user().await.unwrap().is_none());
    }
}
