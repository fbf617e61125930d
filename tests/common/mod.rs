#![allow(dead_code)]
//! In-memory auth provider and data store used by the integration tests.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use horarios::capability::{
    AuthEvent, AuthProvider, Backend, Confirm, Connection, DataStore, Filter, Select,
};
use horarios::error::{AppError, AppResult};
use horarios::models::{Session, User};
use horarios::view::{RegularDraft, SpecialDraft};
use serde_json::{Value, json};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

pub const PASSWORD: &str = "secret";

pub fn ana() -> User {
    User {
        id: "user-ana".into(),
        email: Some("ana@example.com".into()),
    }
}

pub fn bruno() -> User {
    User {
        id: "user-bruno".into(),
        email: Some("bruno@example.com".into()),
    }
}

pub struct MemoryAuth {
    accounts: Vec<User>,
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    pub sign_in_calls: AtomicUsize,
}

impl MemoryAuth {
    pub fn anonymous() -> Arc<Self> {
        Arc::new(Self {
            accounts: vec![ana(), bruno()],
            session: Mutex::new(None),
            events: broadcast::channel(16).0,
            sign_in_calls: AtomicUsize::new(0),
        })
    }

    pub fn signed_in(user: User) -> Arc<Self> {
        let auth = Self::anonymous();
        *auth.session.lock().unwrap() = Some(session_for(user));
        auth
    }

    /// Drops the session as if it was ended elsewhere (another tab, expiry).
    pub fn end_session_remotely(&self) {
        *self.session.lock().unwrap() = None;
        let _ = self.events.send(AuthEvent::SignedOut);
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(AtomicOrdering::SeqCst)
    }
}

fn session_for(user: User) -> Session {
    Session {
        user,
        access_token: "token".into(),
        refresh_token: None,
        expires_at: Utc::now() + ChronoDuration::hours(1),
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn get_session(&self) -> AppResult<Option<Session>> {
        Ok(self.session.lock().unwrap().clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<User> {
        self.sign_in_calls.fetch_add(1, AtomicOrdering::SeqCst);
        let user = self
            .accounts
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .filter(|_| password == PASSWORD)
            .cloned()
            .ok_or_else(|| AppError::Remote("Invalid login credentials".into()))?;
        *self.session.lock().unwrap() = Some(session_for(user.clone()));
        let _ = self.events.send(AuthEvent::SignedIn);
        Ok(user)
    }

    async fn get_current_user(&self) -> AppResult<Option<User>> {
        Ok(self.session.lock().unwrap().as_ref().map(|s| s.user.clone()))
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.end_session_remotely();
        Ok(())
    }

    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<&'static str, Vec<Value>>>,
    next_id: AtomicU64,
    failure: Mutex<Option<(Option<&'static str>, String)>>,
    delays: Mutex<HashMap<&'static str, Duration>>,
    calls: AtomicUsize,
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => text(a).cmp(&text(b)),
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    row.get(filter.column).map(text).as_deref() == Some(filter.value.as_str())
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            ..Self::default()
        })
    }

    /// Inserts a row directly, bypassing the store's bookkeeping. Returns its id.
    pub fn seed(&self, table: &'static str, mut row: Value) -> u64 {
        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
        row["id"] = json!(id);
        self.tables.lock().unwrap().entry(table).or_default().push(row);
        id
    }

    pub fn rows(&self, table: &'static str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Every call fails with `message`; `table = None` fails all tables.
    pub fn fail(&self, table: Option<&'static str>, message: &str) {
        *self.failure.lock().unwrap() = Some((table, message.to_string()));
    }

    pub fn delay(&self, table: &'static str, by: Duration) {
        self.delays.lock().unwrap().insert(table, by);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    async fn enter(&self, table: &'static str) -> AppResult<()> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        let delay = self.delays.lock().unwrap().get(table).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.failure.lock().unwrap().clone();
        match failure {
            Some((None, message)) => Err(AppError::Remote(message)),
            Some((Some(failing), message)) if failing == table => Err(AppError::Remote(message)),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, query: Select) -> AppResult<Vec<Value>> {
        self.enter(query.table).await?;
        let mut rows: Vec<Value> = self
            .rows(query.table)
            .into_iter()
            .filter(|row| matches(row, &query.filter))
            .collect();
        rows.sort_by(|a, b| {
            let ord = compare(&a[query.order.column], &b[query.order.column]);
            if query.order.ascending { ord } else { ord.reverse() }
        });
        Ok(rows)
    }

    async fn insert(&self, table: &'static str, rows: Vec<Value>) -> AppResult<()> {
        self.enter(table).await?;
        for row in rows {
            self.seed(table, row);
        }
        Ok(())
    }

    async fn update(&self, table: &'static str, fields: Value, filter: Filter) -> AppResult<()> {
        self.enter(table).await?;
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table).or_default();
        for row in rows.iter_mut().filter(|row| matches(row, &filter)) {
            if let (Some(row), Some(fields)) = (row.as_object_mut(), fields.as_object()) {
                for (key, value) in fields {
                    row.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, table: &'static str, filter: Filter) -> AppResult<()> {
        self.enter(table).await?;
        let mut tables = self.tables.lock().unwrap();
        tables.entry(table).or_default().retain(|row| !matches(row, &filter));
        Ok(())
    }
}

/// Each browser gets a fresh anonymous auth client over one shared store.
pub struct MemoryBackend {
    pub store: Arc<MemoryStore>,
}

impl Backend for MemoryBackend {
    fn connect(&self) -> Connection {
        Connection {
            auth: MemoryAuth::anonymous(),
            data: self.store.clone(),
        }
    }
}

pub fn connection(auth: &Arc<MemoryAuth>, store: &Arc<MemoryStore>) -> Connection {
    Connection {
        auth: auth.clone(),
        data: store.clone(),
    }
}

pub struct Answer(pub bool);

#[async_trait]
impl Confirm for Answer {
    async fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}

pub fn regular_row(user: &User, day: u8, ranges: &str) -> Value {
    json!({ "user_id": user.id, "dia_semana": day, "horarios": ranges, "activo": true })
}

pub fn special_row(user: &User, date: &str, description: Option<&str>) -> Value {
    json!({
        "user_id": user.id,
        "fecha": date,
        "descripcion": description,
        "horarios": "10:00-14:00",
        "activo": true
    })
}

pub fn regular_draft(day: &str, ranges: &str) -> RegularDraft {
    RegularDraft {
        day_of_week: day.into(),
        time_ranges: ranges.into(),
        active: true,
    }
}

pub fn special_draft(date: &str, description: &str) -> SpecialDraft {
    SpecialDraft {
        date: date.into(),
        description: description.into(),
        time_ranges: String::new(),
        active: true,
    }
}
