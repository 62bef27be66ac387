//! Axum server example.
//!
//! Run with:
//! ```bash
//! cargo run --example axum_server --features axum-integration
//! ```
//!
//! Then:
//! ```bash
//! curl -s -X POST http://localhost:3000/render \
//!   -d '{"html":"<h1>Hello</h1>"}' | jq -r .data | base64 -d > hello.pdf
//! ```

use std::sync::Arc;

use html2pdf_render::integrations::axum::router;
use html2pdf_render::{ChromeLauncher, RenderService};
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("Shutting down...");
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = html2pdf_render::from_env().expect("Invalid configuration");

    let mut builder = RenderService::builder().launcher(ChromeLauncher::from_config(&config));
    if config.bucket.is_some() {
        builder = builder.store(html2pdf_render::S3ObjectStore::from_env().await);
    }
    let service = builder.config(config).build().expect("Failed to build service");

    let app = router(Arc::new(service));

    log::info!("Starting server on http://localhost:3000");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000")
        .await
        .expect("Failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}
