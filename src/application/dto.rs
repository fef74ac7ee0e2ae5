use serde::{Deserialize, Serialize};

use crate::domain::{
    detection::Detection,
    media::{MediaKind, UploadedFile},
    model::{ModelType, WeightsDescriptor},
};

pub const DEFAULT_CONF_THRES: f32 = 0.4;
pub const DEFAULT_WEIGHTS: &str = "yolov5s.pt";
pub const DEFAULT_IMGSZ: u32 = 640;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub filepath: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
}

impl From<UploadedFile> for UploadResponse {
    fn from(f: UploadedFile) -> Self {
        Self {
            success: true,
            filename: f.stored_name,
            filepath: f.path.to_string_lossy().into_owned(),
            kind: f.kind,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectRequest {
    pub filename: Option<String>,
    pub conf_thres: Option<f32>,
    pub weights: Option<String>,
    pub imgsz: Option<u32>,
}

impl DetectRequest {
    pub fn conf_thres(&self) -> f32 {
        self.conf_thres.unwrap_or(DEFAULT_CONF_THRES)
    }

    pub fn weights(&self) -> &str {
        self.weights.as_deref().filter(|w| !w.is_empty()).unwrap_or(DEFAULT_WEIGHTS)
    }

    pub fn imgsz(&self) -> u32 {
        self.imgsz.unwrap_or(DEFAULT_IMGSZ)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    pub success: bool,
    pub result_file: String,
    /// Relativa a la carpeta de resultados, para `/api/results/<path>`.
    pub result_path: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub detections: Vec<Detection>,
    pub detection_count: usize,
    pub model_type: ModelType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsResponse {
    pub weights: Vec<WeightsDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub runtime_version: Option<String>,
    pub gpu_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
