use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use innkeep_api::{app, notify::Dispatcher, notify::LogMailer, session::Sessions, AppState};
use innkeep_core::session::SessionStore;
use innkeep_store::app_config::{Config, SessionBackend};
use innkeep_store::{DbClient, MemorySessionStore, PgStore, RedisSessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "innkeep_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("failed to load config")?;
    tracing::info!("Starting Innkeep on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .context("failed to connect to database")?;
    db.migrate().await.context("failed to run migrations")?;

    let session_store: Arc<dyn SessionStore> = match config.session.backend {
        SessionBackend::Redis => {
            let url = config
                .session
                .redis_url
                .as_deref()
                .context("session.backend is redis but session.redis_url is unset")?;
            Arc::new(RedisSessionStore::new(url).context("failed to open redis client")?)
        }
        SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
    };
    let sessions = Sessions::new(session_store, Duration::from_secs(config.session.ttl_seconds));

    let mail = Dispatcher::start(
        config.mail.queue_capacity,
        config.mail.overflow_policy,
        Duration::from_millis(config.mail.enqueue_timeout_ms),
        Arc::new(LogMailer),
    );

    let state = AppState {
        store: Arc::new(PgStore::new(db.pool.clone())),
        sessions,
        mail,
        mail_from: config.mail.from_address.clone(),
        owner_address: config.mail.owner_address.clone(),
        cookie_secure: config.server.in_production,
    };

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
