use serde::{Deserialize, Serialize};

/// Caja normalizada `[x_center, y_center, width, height]`, valores en 0..1.
pub type NormalizedBox = [f32; 4];

/// Una línea del fichero de etiquetas, antes de remapear la clase.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLabel {
    pub class_id: u32,
    pub bbox: NormalizedBox,
    pub confidence: f32,
}

/// Detección tal y como se devuelve al cliente.
/// Los nombres serializados se mantienen para el frontend existente.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "class")]
    pub class_id: u32,
    pub class_name: String,
    pub confidence: f32,
    pub bbox: NormalizedBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_detection: Option<String>,
    #[serde(default, rename = "original_coco_id", skip_serializing_if = "Option::is_none")]
    pub original_class_id: Option<u32>,
    pub is_coco: bool,
}
