use super::detection::{Detection, RawLabel};
use super::model::ModelType;

/// Taxonomía fija de dos clases del modelo de peces.
pub const FISH_CLASSES: [&str; 2] = ["Fish", "notFish"];

/// Clases COCO del modelo genérico preentrenado.
pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

pub fn coco_name(class_id: u32) -> String {
    COCO_CLASSES
        .get(class_id as usize)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("class_{class_id}"))
}

pub fn fish_name(class_id: u32) -> String {
    FISH_CLASSES
        .get(class_id as usize)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Class_{class_id}"))
}

/// Convierte una etiqueta cruda en la detección que ve el cliente.
/// Punto de reemplazo para un clasificador de peces real.
pub trait ClassRemapper: Send + Sync {
    fn remap(&self, raw: &RawLabel) -> Detection;
}

/// Solución provisional: con el modelo COCO todo objeto se trata como
/// pez potencial, conservando la clase original para mostrarla.
pub struct GenericModelRemapper;

impl ClassRemapper for GenericModelRemapper {
    fn remap(&self, raw: &RawLabel) -> Detection {
        Detection {
            class_id: 0,
            class_name: FISH_CLASSES[0].to_string(),
            confidence: raw.confidence,
            bbox: raw.bbox,
            original_detection: Some(coco_name(raw.class_id)),
            original_class_id: Some(raw.class_id),
            is_coco: true,
        }
    }
}

pub struct FishModelRemapper;

impl ClassRemapper for FishModelRemapper {
    fn remap(&self, raw: &RawLabel) -> Detection {
        Detection {
            class_id: raw.class_id,
            class_name: fish_name(raw.class_id),
            confidence: raw.confidence,
            bbox: raw.bbox,
            original_detection: None,
            original_class_id: None,
            is_coco: false,
        }
    }
}

pub fn remapper_for(model: ModelType) -> Box<dyn ClassRemapper> {
    match model {
        ModelType::Coco => Box::new(GenericModelRemapper),
        ModelType::Fish => Box::new(FishModelRemapper),
    }
}
