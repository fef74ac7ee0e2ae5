use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::{
    errors::DomainResult,
    model::{DetectionJob, WeightsDescriptor},
};

/// Ejecuta el detector externo; al volver, el resultado está en `job.output_dir`.
#[async_trait]
pub trait DetectorPort: Send + Sync {
    async fn run(&self, job: &DetectionJob) -> DomainResult<()>;
}

#[async_trait]
pub trait WeightsCatalogPort: Send + Sync {
    async fn list_weights(&self) -> DomainResult<Vec<WeightsDescriptor>>;
    /// Convierte la ruta que envía el cliente en la que recibirá `--weights`.
    async fn resolve(&self, requested: &str) -> String;
}

/// Normalización best-effort de ficheros subidos (HEIF/HEIC -> PNG).
/// Nunca falla: si no puede convertir devuelve la ruta original.
#[async_trait]
pub trait MediaNormalizerPort: Send + Sync {
    async fn normalize(&self, path: &Path) -> PathBuf;
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeInfo {
    pub runtime_version: Option<String>,
    pub gpu_available: bool,
}

#[async_trait]
pub trait RuntimeProbePort: Send + Sync {
    async fn probe(&self) -> RuntimeInfo;
}
