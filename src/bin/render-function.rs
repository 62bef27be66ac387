//! Function runtime entry point.
//!
//! Configuration, the Chrome launcher and the S3 client are built once per
//! cold start; each invocation event goes through
//! [`RenderService::handle_event`].
//!
//! ```text
//! RUST_LOG=info PDF_BUCKET_NAME=rendered-pdfs render-function
//! ```

use std::sync::Arc;

use html2pdf_render::{ChromeLauncher, RenderService, S3ObjectStore};
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let config = html2pdf_render::from_env()?;
    log::info!("🔧 Render function starting: {:?}", config);

    let store = S3ObjectStore::from_env().await;
    let service = RenderService::builder()
        .launcher(ChromeLauncher::from_config(&config))
        .store(store)
        .config(config)
        .build()?;
    let service = Arc::new(service);

    run(service_fn(move |event: LambdaEvent<Value>| {
        let service = Arc::clone(&service);
        async move {
            let request_id = event.context.request_id.clone();
            log::debug!("Invocation {} started", request_id);

            service.handle_event(event.payload).await.map_err(|e| {
                log::error!("❌ Invocation {} failed: {}", request_id, e);
                Error::from(e)
            })
        }
    }))
    .await
}
