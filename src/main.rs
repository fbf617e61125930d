use horarios::{config::Config, handlers, state::AppState, supabase::SupabaseBackend};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "horarios=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    let backend = SupabaseBackend::new(&config.supabase_url, &config.supabase_anon_key);
    let app_state = AppState::new(Arc::new(backend), config.locale, config.idle_for);
    let app = handlers::router(app_state, &config.assets_dir);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, project = %config.supabase_url, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
