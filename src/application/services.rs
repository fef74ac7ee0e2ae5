use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::{
    application::{
        dto::{DetectRequest, DetectResponse, HealthResponse},
        locator::{self, LocateRequest},
        ports::{DetectorPort, MediaNormalizerPort, RuntimeProbePort, WeightsCatalogPort},
    },
    config::AppConfig,
    domain::{
        errors::{DomainError, DomainResult},
        labels::parse_label_file,
        media::{sanitize_filename, stamped_name, validate_upload_name, MediaKind, UploadedFile},
        model::{DetectionJob, ModelType, WeightsDescriptor},
        taxonomy::remapper_for,
    },
};

/// Marca de tiempo local con resolución de segundos, `YYYYmmdd_HHMMSS`.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Guarda las subidas en la carpeta de staging.
#[derive(Clone)]
pub struct UploadService {
    config: Arc<AppConfig>,
    normalizer: Arc<dyn MediaNormalizerPort>,
}

impl UploadService {
    pub fn new(config: Arc<AppConfig>, normalizer: Arc<dyn MediaNormalizerPort>) -> Self {
        Self { config, normalizer }
    }

    pub async fn store(&self, original_name: &str, data: &[u8]) -> DomainResult<UploadedFile> {
        if original_name.is_empty() {
            return Err(DomainError::BadRequest("No file selected".into()));
        }
        validate_upload_name(original_name, &self.config.allowed_extensions)?;

        // Tras sanear, el nombre tiene que seguir teniendo una extensión válida.
        let sanitized = sanitize_filename(original_name);
        validate_upload_name(&sanitized, &self.config.allowed_extensions)?;

        tokio::fs::create_dir_all(&self.config.upload_dir).await?;
        let stamp = timestamp();
        let mut attempt = 0;
        let (mut path, mut file) = loop {
            let candidate = self.config.upload_dir.join(stamped_name(&sanitized, &stamp, attempt));
            match tokio::fs::OpenOptions::new().write(true).create_new(true).open(&candidate).await {
                Ok(f) => break (candidate, f),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        };
        file.write_all(data).await?;
        file.flush().await?;
        drop(file);

        if MediaKind::from_filename(&file_name(&path)) == Some(MediaKind::Image) {
            path = self.normalizer.normalize(&path).await;
        }

        let stored_name = file_name(&path);
        let kind = MediaKind::from_filename(&stored_name).unwrap_or(MediaKind::Video);
        info!(original = original_name, stored = %stored_name, bytes = data.len(), ?kind, "fichero subido");

        Ok(UploadedFile {
            original_name: original_name.to_string(),
            stored_name,
            kind,
            path,
        })
    }
}

/// Orquesta una detección: staging -> detector -> localizar -> parsear.
#[derive(Clone)]
pub struct DetectionService {
    config: Arc<AppConfig>,
    detector: Arc<dyn DetectorPort>,
    weights: Arc<dyn WeightsCatalogPort>,
}

impl DetectionService {
    pub fn new(
        config: Arc<AppConfig>,
        detector: Arc<dyn DetectorPort>,
        weights: Arc<dyn WeightsCatalogPort>,
    ) -> Self {
        Self { config, detector, weights }
    }

    pub async fn detect(&self, req: DetectRequest) -> DomainResult<DetectResponse> {
        let filename = req
            .filename
            .as_deref()
            .filter(|f| !f.is_empty())
            .ok_or_else(|| DomainError::BadRequest("No filename provided".into()))?;

        let source = self.upload_path(filename)?;
        if !tokio::fs::metadata(&source).await.map(|m| m.is_file()).unwrap_or(false) {
            return Err(DomainError::NotFound("File not found".into()));
        }
        let kind = MediaKind::from_filename(filename).unwrap_or(MediaKind::Video);

        let output_dir = create_job_dir(&self.config.results_dir).await?;
        let weights = self.weights.resolve(req.weights()).await;
        let job = DetectionJob {
            source: source.clone(),
            weights,
            conf_thres: req.conf_thres(),
            imgsz: req.imgsz(),
            output_dir,
        };

        info!(
            source = %job.source.display(),
            weights = %job.weights,
            conf = job.conf_thres,
            imgsz = job.imgsz,
            output = %job.output_dir.display(),
            "lanzando detección"
        );
        self.detector.run(&job).await?;

        let root = job.output_dir.clone();
        let source_name = file_name(&source);
        let uploaded_name = filename.to_string();
        let (result_file, label_file) = tokio::task::spawn_blocking(move || {
            let request = LocateRequest {
                root: &root,
                source_name: &source_name,
                uploaded_name: &uploaded_name,
                kind,
            };
            let result = locator::locate_result(&request);
            (result, locator::locate_labels(&request))
        })
        .await
        .map_err(|e| anyhow::Error::new(e).context("locating detector output"))?;

        let result_file = result_file.map_err(|e| {
            warn!(error = %e, "el detector no dejó ningún fichero de resultado");
            DomainError::ResultMissing
        })?;

        let model_type = ModelType::from_weights(&job.weights, &self.config.generic_model_markers);
        let remapper = remapper_for(model_type);
        let detections = parse_label_file(label_file.as_deref(), remapper.as_ref()).await?;

        let result_path = relative_url_path(&self.config.results_dir, &result_file)?;
        info!(result = %result_path, detections = detections.len(), ?model_type, "detección completada");

        Ok(DetectResponse {
            success: true,
            result_file: file_name(&result_file),
            result_path,
            kind,
            detection_count: detections.len(),
            detections,
            model_type,
        })
    }

    /// Solo nombres planos dentro de la carpeta de subidas.
    fn upload_path(&self, filename: &str) -> DomainResult<PathBuf> {
        let plain = Path::new(filename)
            .file_name()
            .map(|n| n == std::ffi::OsStr::new(filename))
            .unwrap_or(false);
        if !plain {
            return Err(DomainError::NotFound("File not found".into()));
        }
        Ok(self.config.upload_dir.join(filename))
    }
}

/// Catálogo de pesos y estado del entorno del detector.
#[derive(Clone)]
pub struct InfoService {
    weights: Arc<dyn WeightsCatalogPort>,
    probe: Arc<dyn RuntimeProbePort>,
}

impl InfoService {
    pub fn new(weights: Arc<dyn WeightsCatalogPort>, probe: Arc<dyn RuntimeProbePort>) -> Self {
        Self { weights, probe }
    }

    pub async fn list_weights(&self) -> DomainResult<Vec<WeightsDescriptor>> {
        self.weights.list_weights().await
    }

    pub async fn health(&self) -> HealthResponse {
        let runtime = self.probe.probe().await;
        HealthResponse {
            status: "healthy".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            runtime_version: runtime.runtime_version,
            gpu_available: runtime.gpu_available,
        }
    }
}

/// Crea `detect_<stamp>` en exclusiva; si ya existe prueba `detect_<stamp>_<n>`.
async fn create_job_dir(results_dir: &Path) -> DomainResult<PathBuf> {
    tokio::fs::create_dir_all(results_dir).await?;
    let stamp = timestamp();
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("detect_{stamp}")
        } else {
            format!("detect_{stamp}_{attempt}")
        };
        let dir = results_dir.join(name);
        match tokio::fs::create_dir(&dir).await {
            Ok(()) => return Ok(dir),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn relative_url_path(root: &Path, file: &Path) -> DomainResult<String> {
    let rel = file
        .strip_prefix(root)
        .map_err(|_| anyhow::anyhow!("{} is outside the results folder", file.display()))?;
    Ok(rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{FakeDetector, NoopNormalizer, StaticCatalog};

    fn config(dir: &Path) -> Arc<AppConfig> {
        Arc::new(AppConfig::from_base_dir(dir))
    }

    fn detection_service(cfg: Arc<AppConfig>, detector: FakeDetector) -> DetectionService {
        DetectionService::new(cfg.clone(), Arc::new(detector), Arc::new(StaticCatalog::new(&cfg)))
    }

    #[tokio::test]
    async fn upload_is_stamped_and_typed() {
        let dir = tempfile::tempdir().unwrap();
        let svc = UploadService::new(config(dir.path()), Arc::new(NoopNormalizer));

        let stored = svc.store("photo.JPG", b"jpeg").await.unwrap();
        assert_eq!(stored.kind, MediaKind::Image);
        assert!(stored.stored_name.starts_with("photo_"));
        assert!(stored.stored_name.ends_with(".JPG"));
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"jpeg");

        let video = svc.store("dive.mp4", b"mp4").await.unwrap();
        assert_eq!(video.kind, MediaKind::Video);
    }

    #[tokio::test]
    async fn same_second_uploads_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let svc = UploadService::new(config(dir.path()), Arc::new(NoopNormalizer));

        let a = svc.store("fish.jpg", b"a").await.unwrap();
        let b = svc.store("fish.jpg", b"b").await.unwrap();
        assert_ne!(a.path, b.path);
        assert_eq!(std::fs::read(&a.path).unwrap(), b"a");
    }

    #[tokio::test]
    async fn upload_rejects_bad_names() {
        let dir = tempfile::tempdir().unwrap();
        let svc = UploadService::new(config(dir.path()), Arc::new(NoopNormalizer));

        assert!(matches!(svc.store("payload.exe", b"x").await, Err(DomainError::BadRequest(_))));
        assert!(matches!(svc.store("", b"x").await, Err(DomainError::BadRequest(_))));
    }

    #[tokio::test]
    async fn detect_requires_filename_and_existing_upload() {
        let dir = tempfile::tempdir().unwrap();
        let svc = detection_service(config(dir.path()), FakeDetector::default());

        let err = svc.detect(DetectRequest::default()).await.unwrap_err();
        assert!(matches!(err, DomainError::BadRequest(_)));

        let req = DetectRequest { filename: Some("missing.jpg".into()), ..Default::default() };
        assert!(matches!(svc.detect(req).await, Err(DomainError::NotFound(_))));

        let req = DetectRequest { filename: Some("../secret.jpg".into()), ..Default::default() };
        assert!(matches!(svc.detect(req).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn detect_with_generic_weights_reports_fish() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        std::fs::create_dir_all(&cfg.upload_dir).unwrap();
        std::fs::write(cfg.upload_dir.join("fish_20240101_120000.jpg"), b"img").unwrap();

        let svc = detection_service(cfg.clone(), FakeDetector::with_labels("0 0.5 0.5 0.2 0.2 0.9\n"));
        let req = DetectRequest {
            filename: Some("fish_20240101_120000.jpg".into()),
            weights: Some("yolov5s.pt".into()),
            ..Default::default()
        };
        let res = svc.detect(req).await.unwrap();

        assert!(res.success);
        assert_eq!(res.kind, MediaKind::Image);
        assert_eq!(res.model_type, ModelType::Coco);
        assert_eq!(res.detection_count, 1);
        assert_eq!(res.result_file, "fish_20240101_120000.jpg");
        assert!(res.result_path.starts_with("detect_"));
        assert!(res.result_path.ends_with("/result/fish_20240101_120000.jpg"));

        let det = &res.detections[0];
        assert_eq!(det.class_name, "Fish");
        assert_eq!(det.confidence, 0.9);
        assert_eq!(det.bbox, [0.5, 0.5, 0.2, 0.2]);
        assert_eq!(det.original_detection.as_deref(), Some("person"));
    }

    #[tokio::test]
    async fn flat_layout_is_reported_relative_to_results() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        std::fs::create_dir_all(&cfg.upload_dir).unwrap();
        std::fs::write(cfg.upload_dir.join("reef.png"), b"img").unwrap();

        let svc = detection_service(cfg, FakeDetector::flat());
        let req = DetectRequest {
            filename: Some("reef.png".into()),
            weights: Some("/models/fish_best.pt".into()),
            ..Default::default()
        };
        let res = svc.detect(req).await.unwrap();
        assert_eq!(res.model_type, ModelType::Fish);
        assert!(res.detections.is_empty());
        assert!(!res.result_path.contains("/result/"));
        assert!(res.result_path.ends_with("/reef.jpg"));
    }

    #[tokio::test]
    async fn detector_errors_propagate_and_missing_output_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        std::fs::create_dir_all(&cfg.upload_dir).unwrap();
        std::fs::write(cfg.upload_dir.join("a.jpg"), b"img").unwrap();
        let req = DetectRequest { filename: Some("a.jpg".into()), ..Default::default() };

        let svc = detection_service(cfg.clone(), FakeDetector::failing(DomainError::DetectionTimeout));
        assert!(matches!(svc.detect(req.clone()).await, Err(DomainError::DetectionTimeout)));

        let svc = detection_service(cfg, FakeDetector::silent());
        assert!(matches!(svc.detect(req).await, Err(DomainError::ResultMissing)));
    }

    #[tokio::test]
    async fn job_dirs_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let a = create_job_dir(dir.path()).await.unwrap();
        let b = create_job_dir(dir.path()).await.unwrap();
        assert_ne!(a, b);
        assert!(a.is_dir() && b.is_dir());
    }
}
