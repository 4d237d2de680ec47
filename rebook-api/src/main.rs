//! # Rebook API Server
//!
//! Serves the Rebook HTTP API: customers, visits, templates, campaigns and
//! WhatsApp reminder dispatch.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p rebook-api
//! ```

use rebook_api::{app, config::Config};
use rebook_shared::auth::identity::FirebaseIdentity;
use rebook_shared::auth::session::AuthEvent;
use rebook_shared::db::{migrations, pool};
use rebook_shared::store::PgStore;
use rebook_shared::whatsapp::client::WhatsAppClient;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rebook_api=debug,rebook_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Rebook API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let db = pool::create_pool(config.pool_config()).await?;
    migrations::run_migrations(&db).await?;

    let store = Arc::new(PgStore::new(db.clone()));
    let messenger = Arc::new(WhatsAppClient::new(config.whatsapp_client_config())?);
    let identity = Arc::new(FirebaseIdentity::new(config.firebase_config())?);

    let bind_address = config.bind_address();
    let state = app::AppState::new(store, messenger, identity, config);

    let mut auth_events = state.auth_events().subscribe();
    tokio::spawn(async move {
        loop {
            match auth_events.recv().await {
                Ok(AuthEvent::SignedUp { user_id, salon_id }) => {
                    tracing::info!(%user_id, %salon_id, "Auth state: signed up")
                }
                Ok(AuthEvent::SignedIn { user_id, salon_id }) => {
                    tracing::info!(%user_id, %salon_id, "Auth state: signed in")
                }
                Ok(AuthEvent::SignedOut { user_id }) => {
                    tracing::info!(%user_id, "Auth state: signed out")
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Auth event listener lagged")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let router = app::build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool::close_pool(db).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
