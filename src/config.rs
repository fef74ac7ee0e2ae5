use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::media::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};

/// Opciones de línea de comandos / entorno.
#[derive(Debug, Parser)]
#[command(name = "ikan-detect", version, about = "IKAN fish detection web interface")]
pub struct Cli {
    /// Puerto HTTP.
    #[arg(long, env = "PORT", default_value_t = 5001)]
    pub port: u16,

    /// `development` activa la búsqueda de un puerto libre.
    #[arg(long = "env", env = "FLASK_ENV", default_value = "development")]
    pub environment: String,

    /// Raíz de la instalación (uploads/, results/, static/, yolov5/).
    #[arg(long, env = "IKAN_BASE_DIR", default_value = ".")]
    pub base_dir: PathBuf,

    /// Directorio del repositorio de YOLOv5 (por defecto `<base_dir>/yolov5`).
    #[arg(long, env = "IKAN_DETECTOR_DIR")]
    pub detector_dir: Option<PathBuf>,

    /// Intérprete con el que se lanza `detect.py`.
    #[arg(long, env = "IKAN_PYTHON", default_value = "python3")]
    pub interpreter: String,

    /// Límite de tiempo por detección, en segundos.
    #[arg(long, env = "IKAN_DETECT_TIMEOUT", default_value_t = 300)]
    pub detect_timeout_secs: u64,
}

/// Configuración inmutable compartida por todos los manejadores.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub development: bool,
    pub base_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub results_dir: PathBuf,
    pub static_dir: PathBuf,
    pub detector_dir: PathBuf,
    pub interpreter: String,
    pub detect_timeout: Duration,
    pub max_upload_bytes: usize,
    pub allowed_extensions: Vec<String>,
    /// Subcadenas de la ruta de pesos que identifican el modelo COCO genérico.
    pub generic_model_markers: Vec<String>,
}

impl AppConfig {
    pub fn from_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            port: 5001,
            development: true,
            upload_dir: base_dir.join("uploads"),
            results_dir: base_dir.join("results"),
            static_dir: base_dir.join("static"),
            detector_dir: base_dir.join("yolov5"),
            base_dir,
            interpreter: "python3".into(),
            detect_timeout: Duration::from_secs(300),
            max_upload_bytes: 100 * 1024 * 1024,
            allowed_extensions: IMAGE_EXTENSIONS
                .iter()
                .chain(VIDEO_EXTENSIONS.iter())
                .map(|s| s.to_string())
                .collect(),
            generic_model_markers: vec!["yolov5s.pt".into(), "yolov5".into()],
        }
    }

    /// `data.yaml` opcional de dos clases; se pasa con `--data` si existe.
    pub fn data_yaml(&self) -> PathBuf {
        self.base_dir.join("data_fish_notfish.yaml")
    }

    pub fn detect_script(&self) -> PathBuf {
        self.detector_dir.join("detect.py")
    }
}

/// El detector se lanza con `current_dir = detector_dir`; cualquier ruta
/// relativa que reciba dejaría de apuntar al sitio correcto.
pub fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

impl From<Cli> for AppConfig {
    fn from(cli: Cli) -> Self {
        let mut cfg = AppConfig::from_base_dir(absolute(&cli.base_dir));
        cfg.port = cli.port;
        cfg.development = cli.environment == "development";
        if let Some(dir) = cli.detector_dir {
            cfg.detector_dir = absolute(&dir);
        }
        cfg.interpreter = cli.interpreter;
        cfg.detect_timeout = Duration::from_secs(cli.detect_timeout_secs);
        cfg
    }
}
