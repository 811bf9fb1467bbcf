mod app;
mod config;
mod error;
mod status;
mod upload;
mod utils;

use app::{TagDropApp, UploadSession};
use config::AppConfig;
use eframe::CreationContext;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;
use upload::{HttpBackend, SimulatedObserver};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tagdrop=info")),
        )
        .init();

    let config = AppConfig::load()?;
    info!("Using backend {}", config.backend_url);

    let runtime = Runtime::new()?;
    let backend = Arc::new(HttpBackend::new(&config.backend_url, config.request_timeout())?);
    let observer = Arc::new(SimulatedObserver::new(config.stages.clone()));
    let session = UploadSession::new(runtime.handle().clone(), backend, observer, config);

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([960.0, 720.0])
            .with_min_inner_size([640.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "TagDrop",
        options,
        Box::new(|cc: &CreationContext| Box::new(TagDropApp::new(cc, session))),
    )?;

    Ok(())
}
