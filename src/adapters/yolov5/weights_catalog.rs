use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::ports::WeightsCatalogPort;
use crate::config::AppConfig;
use crate::domain::errors::DomainResult;
use crate::domain::model::WeightsDescriptor;

/// Pesos en disco: el `yolov5s.pt` preentrenado y los `best.pt` de
/// `yolov5/runs/train/<exp>/weights/`.
pub struct FsWeightsCatalog {
    config: Arc<AppConfig>,
}

impl FsWeightsCatalog {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }

    fn scan(&self) -> Vec<WeightsDescriptor> {
        let mut weights = Vec::new();

        let pretrained = self.config.base_dir.join("yolov5s.pt");
        if pretrained.is_file() {
            weights.push(WeightsDescriptor {
                name: "YOLOv5s (Pre-trained)".into(),
                path: display(&pretrained),
            });
        }

        let train_dir = self.config.detector_dir.join("runs").join("train");
        if let Ok(read_dir) = std::fs::read_dir(&train_dir) {
            let mut experiments: Vec<PathBuf> = read_dir.flatten().map(|e| e.path()).collect();
            experiments.sort();
            for exp in experiments {
                let best = exp.join("weights").join("best.pt");
                if best.is_file() {
                    let exp_name = exp.file_name().unwrap_or_default().to_string_lossy();
                    weights.push(WeightsDescriptor {
                        name: format!("Custom Model ({exp_name})"),
                        path: display(&best),
                    });
                }
            }
        }

        if weights.is_empty() {
            weights.push(WeightsDescriptor {
                name: "YOLOv5s (Default)".into(),
                path: "yolov5s.pt".into(),
            });
        }
        weights
    }

    /// Absoluta, relativa al cwd, relativa a la instalación o, en último
    /// caso, dentro del directorio del detector (que descargará los pesos).
    pub fn resolve_sync(&self, requested: &str) -> String {
        let path = Path::new(requested);
        if path.is_absolute() {
            return requested.to_string();
        }
        if path.exists() {
            if let Ok(abs) = path.canonicalize() {
                return display(&abs);
            }
        }
        let under_base = self.config.base_dir.join(path);
        if under_base.exists() {
            if let Ok(abs) = under_base.canonicalize() {
                return display(&abs);
            }
        }
        display(&self.config.detector_dir.join(path))
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[async_trait]
impl WeightsCatalogPort for FsWeightsCatalog {
    async fn list_weights(&self) -> DomainResult<Vec<WeightsDescriptor>> {
        Ok(self.scan())
    }

    async fn resolve(&self, requested: &str) -> String {
        self.resolve_sync(requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(dir: &Path) -> FsWeightsCatalog {
        FsWeightsCatalog::new(Arc::new(AppConfig::from_base_dir(dir)))
    }

    #[tokio::test]
    async fn empty_install_offers_the_default() {
        let dir = tempfile::tempdir().unwrap();
        let weights = catalog(dir.path()).list_weights().await.unwrap();
        assert_eq!(weights, vec![WeightsDescriptor {
            name: "YOLOv5s (Default)".into(),
            path: "yolov5s.pt".into(),
        }]);
    }

    #[tokio::test]
    async fn pretrained_and_custom_runs_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("yolov5s.pt"), b"w").unwrap();
        for exp in ["exp2", "exp"] {
            let w = dir.path().join("yolov5/runs/train").join(exp).join("weights");
            std::fs::create_dir_all(&w).unwrap();
            std::fs::write(w.join("best.pt"), b"w").unwrap();
        }
        std::fs::create_dir_all(dir.path().join("yolov5/runs/train/empty")).unwrap();

        let names: Vec<String> = catalog(dir.path())
            .list_weights()
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, ["YOLOv5s (Pre-trained)", "Custom Model (exp)", "Custom Model (exp2)"]);
    }

    #[test]
    fn resolution_order() {
        let dir = tempfile::tempdir().unwrap();
        let cat = catalog(dir.path());

        assert_eq!(cat.resolve_sync("/abs/best.pt"), "/abs/best.pt");
        assert_eq!(
            PathBuf::from(cat.resolve_sync("missing-weights.pt")),
            dir.path().join("yolov5").join("missing-weights.pt")
        );

        std::fs::write(dir.path().join("fish.pt"), b"w").unwrap();
        let resolved = PathBuf::from(cat.resolve_sync("fish.pt"));
        assert_eq!(resolved, dir.path().join("fish.pt").canonicalize().unwrap());
    }
}
