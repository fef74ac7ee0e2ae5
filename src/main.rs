mod adapters;
mod application;
mod config;
mod domain;

use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::adapters::{
    http::{router, state::HttpState},
    media::heif::HeifNormalizer,
    yolov5::{detector::Yolov5Detector, runtime_probe::TorchProbe, weights_catalog::FsWeightsCatalog},
};
use crate::application::services::{DetectionService, InfoService, UploadService};
use crate::config::{AppConfig, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logs (RUST_LOG=info por defecto)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // 2. Configuración inmutable, compartida por todos los manejadores
    let config = Arc::new(AppConfig::from(Cli::parse()));
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tokio::fs::create_dir_all(&config.results_dir).await?;

    // 3. Adaptadores de infraestructura
    let detector = Arc::new(Yolov5Detector::new(config.clone()));
    let weights = Arc::new(FsWeightsCatalog::new(config.clone()));
    let normalizer = Arc::new(HeifNormalizer::new());
    let probe = Arc::new(TorchProbe::new(config.clone()));

    // 4. Servicios (casos de uso)
    let state = HttpState {
        upload: Arc::new(UploadService::new(config.clone(), normalizer)),
        detection: Arc::new(DetectionService::new(config.clone(), detector, weights.clone())),
        info: Arc::new(InfoService::new(weights, probe)),
        config: config.clone(),
    };

    let app = router(state);

    // 5. En desarrollo, si el puerto está ocupado se usa uno libre
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) if config.development => {
            tracing::warn!("⚠️  Puerto {} ocupado ({e}), buscando uno libre", config.port);
            TcpListener::bind("0.0.0.0:0").await?
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!("🎣 IKAN fish detection web interface");
    tracing::info!("📁 Uploads: {}", config.upload_dir.display());
    tracing::info!("📁 Results: {}", config.results_dir.display());
    tracing::info!("🚀 Servidor iniciado en http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
