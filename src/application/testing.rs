//! Dobles de los puertos para los tests de servicios y rutas.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::application::locator::RUN_NAME;
use crate::application::ports::{
    DetectorPort, MediaNormalizerPort, RuntimeInfo, RuntimeProbePort, WeightsCatalogPort,
};
use crate::config::AppConfig;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::media::stem;
use crate::domain::model::{DetectionJob, WeightsDescriptor};

/// Imita a `detect.py`: copia la fuente como `<stem>.jpg` y escribe las etiquetas.
#[derive(Default)]
pub struct FakeDetector {
    labels: Option<String>,
    flat: bool,
    silent: bool,
    error: Mutex<Option<DomainError>>,
}

impl FakeDetector {
    pub fn with_labels(labels: &str) -> Self {
        Self { labels: Some(labels.to_string()), ..Default::default() }
    }

    /// Sin subdirectorio `result/`.
    pub fn flat() -> Self {
        Self { flat: true, ..Default::default() }
    }

    /// Termina bien pero no escribe nada.
    pub fn silent() -> Self {
        Self { silent: true, ..Default::default() }
    }

    pub fn failing(error: DomainError) -> Self {
        Self { error: Mutex::new(Some(error)), ..Default::default() }
    }
}

#[async_trait]
impl DetectorPort for FakeDetector {
    async fn run(&self, job: &DetectionJob) -> DomainResult<()> {
        if let Some(err) = self.error.lock().unwrap().take() {
            return Err(err);
        }
        if self.silent {
            return Ok(());
        }

        let dir = if self.flat { job.output_dir.clone() } else { job.output_dir.join(RUN_NAME) };
        let name = job.source.file_name().unwrap().to_string_lossy().into_owned();
        let base = stem(&name);
        std::fs::create_dir_all(dir.join("labels"))?;
        std::fs::copy(&job.source, dir.join(format!("{base}.jpg")))?;
        if let Some(labels) = &self.labels {
            std::fs::write(dir.join("labels").join(format!("{base}.txt")), labels)?;
        }
        Ok(())
    }
}

pub struct NoopNormalizer;

#[async_trait]
impl MediaNormalizerPort for NoopNormalizer {
    async fn normalize(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

pub struct StaticCatalog {
    weights: Vec<WeightsDescriptor>,
}

impl StaticCatalog {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            weights: vec![WeightsDescriptor {
                name: "YOLOv5s (Pre-trained)".into(),
                path: cfg.base_dir.join("yolov5s.pt").to_string_lossy().into_owned(),
            }],
        }
    }
}

#[async_trait]
impl WeightsCatalogPort for StaticCatalog {
    async fn list_weights(&self) -> DomainResult<Vec<WeightsDescriptor>> {
        Ok(self.weights.clone())
    }

    async fn resolve(&self, requested: &str) -> String {
        requested.to_string()
    }
}

pub struct FakeProbe;

#[async_trait]
impl RuntimeProbePort for FakeProbe {
    async fn probe(&self) -> RuntimeInfo {
        RuntimeInfo { runtime_version: Some("2.1.0".into()), gpu_available: false }
    }
}
