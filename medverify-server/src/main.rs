//! Medverify Server - REST API for pharmaceutical product verification
//!
//! Exposes the medverify-core pipeline via HTTP endpoints:
//! - POST /verify - Full verification pipeline for a packaging photo
//! - POST /process-image - Extraction stage only
//! - POST /validate - Registry matching stage only

use medverify_server::{build_state, create_router_with_config, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    let state = build_state(&config).await;
    let app = create_router_with_config(&config, state);

    let addr = config.socket_addr();
    tracing::info!("medverify-server listening on http://{}", addr);
    tracing::info!("endpoints: POST /verify, POST /process-image, POST /validate, GET /health");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    axum::serve(listener, app).await.expect("server error");
}
