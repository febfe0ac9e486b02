use std::sync::Arc;

use anyhow::Context;
use api::db::PgStore;
use api::qr::{PngQrEncoder, QrEncoder};
use api::{AccountManager, SecretVault};
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::EnvFilter;

use routes::AppState;
use settings::Settings;

mod routes;
mod settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::new().context("Failed to load settings")?;

    let pool = api::db::connect(&settings.database.url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("../api/migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    // Session store
    let session_store = PostgresStore::new(pool.clone());
    session_store
        .migrate()
        .await
        .context("Failed to create session table")?;

    let store = PgStore::new(pool);
    let qr: Arc<dyn QrEncoder> = Arc::new(PngQrEncoder::new(
        &settings.qr.directory,
        settings.qr.public_prefix.as_str(),
    ));
    let accounts = AccountManager::new(store.clone()).with_qr_encoder(qr.clone());

    if let Some(password) = &settings.admin.password {
        accounts
            .ensure_admin(&settings.admin.username, &settings.admin.email, password)
            .await
            .context("Failed to create admin account")?;
    }

    let vault =
        SecretVault::new(store, settings.server.public_url.as_str()).with_qr_encoder(qr);

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(settings.session.secure)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::days(
            settings.session.lifetime_days,
        )));

    let router = routes::router(AppState::new(accounts, vault)).layer(session_layer);

    let listener = tokio::net::TcpListener::bind(&settings.server.address)
        .await
        .with_context(|| format!("Failed to bind {}", settings.server.address))?;
    tracing::info!("Server listening on {}", settings.server.address);

    axum::serve(listener, router).await?;
    Ok(())
}
