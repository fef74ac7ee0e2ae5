use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pesos disponibles para el detector externo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightsDescriptor {
    pub name: String,
    pub path: String,
}

/// Parámetros de una ejecución de `detect.py`.
#[derive(Debug, Clone)]
pub struct DetectionJob {
    pub source: PathBuf,
    /// Ruta de pesos ya resuelta.
    pub weights: String,
    pub conf_thres: f32,
    pub imgsz: u32,
    /// Directorio `--project`; el detector escribe en `<output_dir>/result`.
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Coco,
    Fish,
}

impl ModelType {
    /// Heurística por subcadena sobre la ruta de pesos resuelta.
    pub fn from_weights(weights: &str, generic_markers: &[String]) -> Self {
        let lower = weights.to_lowercase();
        if generic_markers.iter().any(|m| lower.contains(&m.to_lowercase())) {
            ModelType::Coco
        } else {
            ModelType::Fish
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<String> {
        vec!["yolov5s.pt".into(), "yolov5".into()]
    }

    #[test]
    fn generic_weights_are_detected_case_insensitively() {
        assert_eq!(ModelType::from_weights("/opt/ikan/YOLOv5s.pt", &markers()), ModelType::Coco);
        assert_eq!(ModelType::from_weights("/opt/ikan/yolov5/runs/train/exp/weights/best.pt", &markers()), ModelType::Coco);
    }

    #[test]
    fn other_weights_are_fish_models() {
        assert_eq!(ModelType::from_weights("/models/fish_best.pt", &markers()), ModelType::Fish);
    }
}
