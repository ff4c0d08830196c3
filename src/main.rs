/**
 * corechat Server Entry Point
 *
 * Loads configuration from the environment (and a .env file when
 * present), initializes tracing, builds the application, and serves it.
 * A missing JWT_SECRET aborts startup here rather than running with a
 * default signing secret.
 */

use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = corechat::server::config::AppConfig::from_env()?;
    let port = config.port;

    let app = corechat::server::init::create_app(config).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
