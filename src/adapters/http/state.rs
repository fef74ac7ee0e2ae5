use std::sync::Arc;

use crate::application::services::{DetectionService, InfoService, UploadService};
use crate::config::AppConfig;

/// Estado compartido para los manejadores HTTP de Axum.
/// Contiene la configuración inmutable y los servicios (casos de uso).
#[derive(Clone)]
pub struct HttpState {
    pub config: Arc<AppConfig>,
    /// Staging de ficheros subidos.
    pub upload: Arc<UploadService>,
    /// Ejecución del detector y lectura de resultados.
    pub detection: Arc<DetectionService>,
    /// Pesos disponibles y estado del entorno.
    pub info: Arc<InfoService>,
}
