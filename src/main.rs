use std::str::FromStr;

use dotenv::dotenv;
use escape_room_platform::{
    common::{app_state::AppState, router::app_router},
    config::config::CONFIG,
};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    // Initialize .env
    dotenv().ok();

    // Initialize logging
    let level = LevelFilter::from_str(&CONFIG.log_level).unwrap_or(LevelFilter::DEBUG);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set global tracing");

    // Initialize state
    let state = AppState::from_optional_connection_string(CONFIG.database_url.as_deref())
        .await
        .unwrap_or_else(|e| panic!("{}", e));

    // Initialize routes
    let app = app_router(state);

    // Initialize webserver
    let listener = tokio::net::TcpListener::bind(CONFIG.listen_address())
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {}: {}", CONFIG.listen_address(), e));

    info!(
        "Server listening on address: {}",
        listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| CONFIG.listen_address())
    );
    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| panic!("Server stopped: {}", e));
}
