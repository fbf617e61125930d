use crate::capability::Backend;
use crate::error::{AppError, AppResult};
use crate::locale::Locale;
use crate::session::SessionController;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use tower_sessions::Session;
use tracing::{debug, info};

/// Name of the browser-session cookie.
pub const COOKIE: &str = "horarios_sid";

/// Set on first visit so the browser session is stored and gets an id.
const OPENED_KEY: &str = "opened";

/// One browser's dashboard. The lock makes its handlers run one at a time.
pub type Dashboard = Arc<Mutex<SessionController>>;

struct Entry {
    dashboard: Dashboard,
    last_seen: Instant,
}

#[derive(Clone)]
pub struct AppState {
    backend: Arc<dyn Backend>,
    locale: Locale,
    idle_for: Duration,
    dashboards: Arc<Mutex<HashMap<String, Entry>>>,
}

impl AppState {
    /// Dashboards unused for `idle_for` are dropped; the browser-session
    /// cookie expires after the same inactivity.
    pub fn new(backend: Arc<dyn Backend>, locale: Locale, idle_for: Duration) -> Self {
        Self {
            backend,
            locale,
            idle_for,
            dashboards: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn idle_for(&self) -> Duration {
        self.idle_for
    }

    pub async fn dashboard_count(&self) -> usize {
        self.dashboards.lock().await.len()
    }

    /// Finds the browser's dashboard, creating and starting one on its first
    /// visit, and locks it with pending auth events applied.
    pub async fn attach(&self, session: &Session) -> AppResult<OwnedMutexGuard<SessionController>> {
        if session.get::<bool>(OPENED_KEY).await?.is_none() {
            session.insert(OPENED_KEY, true).await?;
            session.save().await?;
        }
        let key = session
            .id()
            .map(|id| id.to_string())
            .ok_or_else(|| AppError::Session("saved session has no id".into()))?;

        let dashboard = match self.known(&key).await {
            Some(dashboard) => dashboard,
            None => self.open(key).await,
        };
        let mut guard = dashboard.lock_owned().await;
        guard.sync_auth_events();
        Ok(guard)
    }

    async fn known(&self, key: &str) -> Option<Dashboard> {
        let mut dashboards = self.dashboards.lock().await;
        let now = Instant::now();
        let before = dashboards.len();
        dashboards.retain(|_, entry| now.duration_since(entry.last_seen) < self.idle_for);
        if dashboards.len() < before {
            debug!(dropped = before - dashboards.len(), "idle dashboards dropped");
        }

        let entry = dashboards.get_mut(key)?;
        entry.last_seen = now;
        Some(Arc::clone(&entry.dashboard))
    }

    async fn open(&self, key: String) -> Dashboard {
        let mut controller = SessionController::new(self.backend.connect(), self.locale);
        controller.start().await;
        let opened = Arc::new(Mutex::new(controller));

        let mut dashboards = self.dashboards.lock().await;
        let entry = dashboards.entry(key.clone()).or_insert_with(|| {
            info!(session = %key, "dashboard opened");
            Entry {
                dashboard: opened,
                last_seen: Instant::now(),
            }
        });
        Arc::clone(&entry.dashboard)
    }
}
