use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sommelier::{auth, broadcast, state::AppState, ws};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sommelier=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Sommelier...");

    // Initialize a default game; the host reconfigures it over the wire
    let state = Arc::new(AppState::new());
    {
        let game = state.snapshot().await;
        tracing::info!(
            "Default game {} ready for {} players ({} bottles over {} rounds)",
            game.id,
            game.config.players,
            game.config.total_bottles,
            game.config.rounds
        );
        if !game.pin.is_empty() {
            tracing::info!("Join reference: {}", auth::join_reference(&game.id, &game.pin));
        }
    }

    // Spawn the server-side countdown completion task
    broadcast::spawn_countdown_watcher(state.clone());

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // 9463 spells "WINE" on a phone keypad
    let addr = SocketAddr::from(([0, 0, 0, 0], 9463));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
