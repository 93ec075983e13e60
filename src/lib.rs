pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod markup;
pub mod naming;
pub mod render;
pub mod request;
pub mod response;
pub mod telemetry;

pub use error::Error;

use anyhow::Context;
use config::Config;
use engine::Wkhtmltopdf;
use std::sync::Arc;
use tracing::info;

/// Mount point, relative to the server root, of the output directory.
pub const STATIC_MOUNT: &str = "static";

pub async fn serve(config: Config) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create output directory {}",
                config.output_dir.display()
            )
        })?;

    let engine = Arc::new(Wkhtmltopdf::new(&config.engine_path));
    let app = http::router(&config, http::AppState::new(&config, engine));

    let server = axum::Server::try_bind(&config.listen)
        .with_context(|| format!("failed to bind {}", config.listen))?;

    info!(
        listen = %config.listen,
        public_url = %config.public_url,
        output_dir = %config.output_dir.display(),
        engine = %config.engine_path.display(),
        "Listening"
    );

    server
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down");
}
