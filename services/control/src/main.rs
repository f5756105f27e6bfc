use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod action;
mod config;
mod controller;
mod error;
mod models;
mod repositories;
mod routes;
mod session;
mod state;
mod verifier;
mod view;

use common::{
    cache::RedisPool,
    database::{health_check, init_pool},
};

use crate::{
    config::{AppConfig, CredentialBackend, SessionBackend},
    controller::FrontController,
    repositories::UserRepository,
    session::{InMemorySessionStore, RedisSessionStore, SessionManager, SessionStore},
    state::AppState,
    verifier::{CredentialVerifier, InMemoryCredentialVerifier},
    view::ViewRenderer,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting control service");

    let session_store = build_session_store(&config)?;
    let sessions = SessionManager::new(session_store, config.session.cookie_name.clone());
    let verifier = build_verifier(&config).await?;

    let app_state = AppState {
        controller: FrontController::new(verifier),
        sessions: sessions.clone(),
        views: Arc::new(ViewRenderer::new()?),
    };

    spawn_session_pruning(sessions, config.session.prune_interval_seconds);

    // Start the web server
    let app = routes::create_router(app_state);

    let addr = config.socket_addr().map_err(anyhow::Error::msg)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Control service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn build_session_store(config: &AppConfig) -> Result<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match config.session.backend {
        SessionBackend::Memory => {
            info!("Using in-memory session store");
            Arc::new(InMemorySessionStore::new(chrono::Duration::seconds(
                i64::try_from(config.session.ttl_seconds)?,
            )))
        }
        SessionBackend::Redis => {
            info!("Using Redis session store");
            let redis_pool = RedisPool::new(&config.redis)?;
            Arc::new(RedisSessionStore::new(
                redis_pool,
                config.session.ttl_seconds,
            ))
        }
    };
    Ok(store)
}

async fn build_verifier(config: &AppConfig) -> Result<Arc<dyn CredentialVerifier>> {
    let users = &config.credentials.users;

    match config.credentials.backend {
        CredentialBackend::Memory => {
            let mut verifier = InMemoryCredentialVerifier::new();
            for user in users {
                verifier =
                    verifier.with_user(&user.user_id, user.user_name.as_deref(), &user.password)?;
            }
            if verifier.is_empty() {
                warn!("No users configured; every login will be rejected");
            } else {
                info!("Loaded {} users into memory", verifier.len());
            }
            Ok(Arc::new(verifier))
        }
        CredentialBackend::Postgres => {
            let pool = init_pool(&config.database_config()?)?;
            if health_check(&pool).await? {
                info!("Database connection successful");
            }

            let repository = UserRepository::new(pool);
            repository.ensure_schema().await?;
            for user in users {
                repository
                    .upsert(&user.user_id, user.user_name.as_deref(), &user.password)
                    .await?;
            }
            Ok(Arc::new(repository))
        }
    }
}

fn spawn_session_pruning(sessions: SessionManager, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds.max(1)));
        loop {
            interval.tick().await;
            if let Err(e) = sessions.cleanup_expired_sessions().await {
                error!("Failed to prune sessions: {}", e);
            }
        }
    });
}
