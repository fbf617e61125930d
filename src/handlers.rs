use crate::{
    capability::Confirm,
    error::AppResult,
    models::RecordId,
    render,
    state::{AppState, COOKIE},
    view::{RegularDraft, SpecialDraft},
};
use async_trait::async_trait;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use serde::Deserialize;
use std::path::Path as FsPath;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{
    Expiry, MemoryStore, Session, SessionManagerLayer,
    cookie::{SameSite, time},
};

#[derive(Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub struct RegularPayload {
    #[serde(default)]
    dia_semana: String,
    #[serde(default)]
    horarios: String,
    activo: Option<String>,
}

impl From<RegularPayload> for RegularDraft {
    fn from(payload: RegularPayload) -> Self {
        Self {
            day_of_week: payload.dia_semana,
            time_ranges: payload.horarios,
            active: payload.activo.is_some(),
        }
    }
}

#[derive(Deserialize)]
pub struct SpecialPayload {
    #[serde(default)]
    fecha: String,
    #[serde(default)]
    descripcion: String,
    #[serde(default)]
    horarios: String,
    activo: Option<String>,
}

impl From<SpecialPayload> for SpecialDraft {
    fn from(payload: SpecialPayload) -> Self {
        Self {
            date: payload.fecha,
            description: payload.descripcion,
            time_ranges: payload.horarios,
            active: payload.activo.is_some(),
        }
    }
}

#[derive(Deserialize)]
pub struct DeletePayload {
    #[serde(default)]
    confirmed: String,
}

/// The answer the browser's confirm dialog gave before the form was posted.
pub struct BrowserAnswer(bool);

impl From<&DeletePayload> for BrowserAnswer {
    fn from(payload: &DeletePayload) -> Self {
        BrowserAnswer(payload.confirmed == "true")
    }
}

#[async_trait]
impl Confirm for BrowserAnswer {
    async fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}

fn back_home() -> Redirect {
    Redirect::to("/")
}

pub async fn index(State(app_state): State<AppState>, session: Session) -> AppResult<Html<String>> {
    let dashboard = app_state.attach(&session).await?;
    Ok(Html(render::page(&dashboard)?))
}

pub async fn login(
    State(app_state): State<AppState>,
    session: Session,
    Form(payload): Form<LoginPayload>,
) -> AppResult<Redirect> {
    let mut dashboard = app_state.attach(&session).await?;
    dashboard
        .submit_login(&payload.email, &payload.password)
        .await;
    Ok(back_home())
}

pub async fn logout(State(app_state): State<AppState>, session: Session) -> AppResult<Redirect> {
    let mut dashboard = app_state.attach(&session).await?;
    dashboard.sign_out().await;
    Ok(back_home())
}

pub async fn open_regular(State(app_state): State<AppState>, session: Session) -> AppResult<Redirect> {
    let mut dashboard = app_state.attach(&session).await?;
    if dashboard.is_authenticated() {
        dashboard.view_mut().open_regular_create();
    }
    Ok(back_home())
}

pub async fn cancel_regular(State(app_state): State<AppState>, session: Session) -> AppResult<Redirect> {
    let mut dashboard = app_state.attach(&session).await?;
    dashboard.view_mut().cancel_regular();
    Ok(back_home())
}

pub async fn submit_regular(
    State(app_state): State<AppState>,
    session: Session,
    Form(payload): Form<RegularPayload>,
) -> AppResult<Redirect> {
    let mut dashboard = app_state.attach(&session).await?;
    if dashboard.is_authenticated() {
        dashboard.view_mut().submit_regular(payload.into()).await;
    }
    Ok(back_home())
}

pub async fn edit_regular(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    let mut dashboard = app_state.attach(&session).await?;
    if dashboard.is_authenticated() {
        dashboard.view_mut().edit_regular(&RecordId(id));
    }
    Ok(back_home())
}

pub async fn delete_regular(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(payload): Form<DeletePayload>,
) -> AppResult<Redirect> {
    let mut dashboard = app_state.attach(&session).await?;
    if dashboard.is_authenticated() {
        let answer = BrowserAnswer::from(&payload);
        dashboard
            .view_mut()
            .delete_regular(&RecordId(id), &answer)
            .await;
    }
    Ok(back_home())
}

pub async fn open_special(State(app_state): State<AppState>, session: Session) -> AppResult<Redirect> {
    let mut dashboard = app_state.attach(&session).await?;
    if dashboard.is_authenticated() {
        dashboard.view_mut().open_special_create();
    }
    Ok(back_home())
}

pub async fn cancel_special(State(app_state): State<AppState>, session: Session) -> AppResult<Redirect> {
    let mut dashboard = app_state.attach(&session).await?;
    dashboard.view_mut().cancel_special();
    Ok(back_home())
}

pub async fn submit_special(
    State(app_state): State<AppState>,
    session: Session,
    Form(payload): Form<SpecialPayload>,
) -> AppResult<Redirect> {
    let mut dashboard = app_state.attach(&session).await?;
    if dashboard.is_authenticated() {
        dashboard.view_mut().submit_special(payload.into()).await;
    }
    Ok(back_home())
}

pub async fn edit_special(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    let mut dashboard = app_state.attach(&session).await?;
    if dashboard.is_authenticated() {
        dashboard.view_mut().edit_special(&RecordId(id));
    }
    Ok(back_home())
}

pub async fn delete_special(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(payload): Form<DeletePayload>,
) -> AppResult<Redirect> {
    let mut dashboard = app_state.attach(&session).await?;
    if dashboard.is_authenticated() {
        let answer = BrowserAnswer::from(&payload);
        dashboard
            .view_mut()
            .delete_special(&RecordId(id), &answer)
            .await;
    }
    Ok(back_home())
}

/// Browser sessions live in memory and expire after the dashboards' idle
/// window, so an abandoned browser's cookie and dashboard go together.
pub fn router(app_state: AppState, assets_dir: &FsPath) -> Router {
    let idle_secs = i64::try_from(app_state.idle_for().as_secs()).unwrap_or(i64::MAX);
    let sessions = SessionManagerLayer::new(MemoryStore::default())
        .with_name(COOKIE)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(idle_secs)));

    Router::new()
        .route("/", get(index))
        .nest_service("/assets", ServeDir::new(assets_dir))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/regular", post(submit_regular))
        .route("/regular/new", post(open_regular))
        .route("/regular/cancel", post(cancel_regular))
        .route("/regular/{id}/edit", post(edit_regular))
        .route("/regular/{id}/delete", post(delete_regular))
        .route("/special", post(submit_special))
        .route("/special/new", post(open_special))
        .route("/special/cancel", post(cancel_special))
        .route("/special/{id}/edit", post(edit_special))
        .route("/special/{id}/delete", post(delete_special))
        .layer(sessions)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
