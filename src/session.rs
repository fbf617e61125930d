use crate::capability::{AuthEvent, AuthProvider, Connection};
use crate::locale::Locale;
use crate::models::User;
use crate::notifier::{Notifier, Severity};
use crate::view::ViewController;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBadge {
    pub initial: char,
    pub label: String,
}

impl UserBadge {
    fn for_user(user: &User, locale: Locale) -> Self {
        let email = user.email.as_deref().filter(|e| !e.is_empty());
        Self {
            initial: email
                .and_then(|e| e.chars().next())
                .map(|c| c.to_uppercase().next().unwrap_or(c))
                .unwrap_or('U'),
            label: email.unwrap_or(locale.default_user()).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Surface {
    Login,
    Shell(UserBadge),
}

/// Gates the dashboard behind an authenticated session.
pub struct SessionController {
    auth: Arc<dyn AuthProvider>,
    events: broadcast::Receiver<AuthEvent>,
    surface: Surface,
    notifier: Notifier,
    locale: Locale,
    view: ViewController,
}

impl SessionController {
    pub fn new(connection: Connection, locale: Locale) -> Self {
        let Connection { auth, data } = connection;
        let notifier = Notifier::new();
        Self {
            events: auth.on_auth_state_change(),
            view: ViewController::new(Arc::clone(&auth), data, notifier.clone(), locale),
            auth,
            surface: Surface::Login,
            notifier,
            locale,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.surface, Surface::Shell(_))
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn view(&self) -> &ViewController {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewController {
        &mut self.view
    }

    /// Restores an existing session, or shows the login surface.
    pub async fn start(&mut self) {
        match self.auth.get_session().await {
            Ok(Some(session)) => {
                info!(user = %session.user.id, "session restored");
                self.enter(&session.user).await;
            }
            Ok(None) => self.surface = Surface::Login,
            Err(err) => {
                warn!(%err, "could not read session");
                self.surface = Surface::Login;
            }
        }
    }

    pub async fn submit_login(&mut self, email: &str, password: &str) {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            self.notifier
                .notify(self.locale.fill_both_fields(), Severity::Error);
            return;
        }

        match self.auth.sign_in_with_password(email, password).await {
            Ok(user) => {
                info!(user = %user.id, "signed in");
                self.enter(&user).await;
            }
            Err(err) => {
                warn!(%err, "sign-in failed");
                self.notifier
                    .notify(self.locale.login_failed(&err), Severity::Error);
            }
        }
    }

    pub async fn sign_out(&mut self) {
        if let Err(err) = self.auth.sign_out().await {
            warn!(%err, "sign-out failed");
            self.notifier
                .notify(self.locale.sign_out_failed(&err), Severity::Error);
        }
        self.sync_auth_events();
    }

    /// Applies every auth event broadcast since the last call.
    pub fn sync_auth_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.handle_auth_event(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "auth events lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    /// A sign-out always returns to the login surface, whatever is open.
    /// Unsaved drafts and the previous user's rows are dropped with it.
    pub fn handle_auth_event(&mut self, event: AuthEvent) {
        if event == AuthEvent::SignedOut {
            info!("signed out");
            self.surface = Surface::Login;
            self.view.clear();
        }
    }

    async fn enter(&mut self, user: &User) {
        self.surface = Surface::Shell(UserBadge::for_user(user, self.locale));
        self.view.load_all().await;
    }
}
