//! Interfaces of the collaborators the dashboard depends on.

use crate::error::AppResult;
use crate::models::{Session, User};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The stored session, if one is still usable.
    async fn get_session(&self) -> AppResult<Option<Session>>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<User>;

    async fn get_current_user(&self) -> AppResult<Option<User>>;

    async fn sign_out(&self) -> AppResult<()>;

    /// Subscribes to session transitions. At least `SignedOut` is broadcast.
    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Equality filter, `column = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<String>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: &'static str,
    pub ascending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: &'static str,
    pub columns: &'static str,
    pub filter: Filter,
    pub order: Order,
}

/// Row-level access to the hosted tables. Rows travel as JSON objects.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(&self, query: Select) -> AppResult<Vec<Value>>;

    async fn insert(&self, table: &'static str, rows: Vec<Value>) -> AppResult<()>;

    /// Matching zero rows is not an error.
    async fn update(&self, table: &'static str, fields: Value, filter: Filter) -> AppResult<()>;

    /// Matching zero rows is not an error.
    async fn delete(&self, table: &'static str, filter: Filter) -> AppResult<()>;
}

/// Asks the user to confirm a destructive action.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// Collaborators for one dashboard: each browser gets its own auth state.
pub struct Connection {
    pub auth: Arc<dyn AuthProvider>,
    pub data: Arc<dyn DataStore>,
}

pub trait Backend: Send + Sync {
    fn connect(&self) -> Connection;
}
