use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{error, info};

use crate::application::locator::RUN_NAME;
use crate::application::ports::DetectorPort;
use crate::config::{absolute, AppConfig};
use crate::domain::{
    errors::{DomainError, DomainResult},
    model::DetectionJob,
};

/// Lanza `detect.py` de YOLOv5 como subproceso.
pub struct Yolov5Detector {
    config: Arc<AppConfig>,
}

impl Yolov5Detector {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }

    /// Argumentos tras el intérprete. Todas las rutas van absolutas porque
    /// el proceso arranca dentro de `detector_dir`.
    pub fn args(&self, job: &DetectionJob) -> Vec<String> {
        let path_arg = |p: &Path| absolute(p).to_string_lossy().into_owned();
        let weights = Path::new(&job.weights);
        let weights = if weights.is_relative() && weights.exists() {
            path_arg(weights)
        } else {
            job.weights.clone()
        };

        let mut args = vec![
            path_arg(&self.config.detect_script()),
            "--weights".into(),
            weights,
            "--source".into(),
            path_arg(&job.source),
            "--img".into(),
            job.imgsz.to_string(),
            "--conf".into(),
            job.conf_thres.to_string(),
            "--project".into(),
            path_arg(&job.output_dir),
            "--name".into(),
            RUN_NAME.into(),
            "--exist-ok".into(),
            "--save-conf".into(),
            "--save-txt".into(),
            // Las clases COCO no se pintan; el cliente muestra Fish/notFish.
            "--hide-labels".into(),
        ];
        let data_yaml = self.config.data_yaml();
        if data_yaml.is_file() {
            args.push("--data".into());
            args.push(path_arg(&data_yaml));
        }
        args
    }
}

#[async_trait]
impl DetectorPort for Yolov5Detector {
    async fn run(&self, job: &DetectionJob) -> DomainResult<()> {
        let args = self.args(job);
        let mut cmd = Command::new(&self.config.interpreter);
        cmd.args(&args)
            .current_dir(absolute(&self.config.detector_dir))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let started = std::time::Instant::now();
        let output = match tokio::time::timeout(self.config.detect_timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                error!("No se pudo lanzar el detector: {e}");
                return Err(DomainError::DetectionFailed(e.to_string()));
            }
            Err(_) => {
                error!(timeout = ?self.config.detect_timeout, "detector cancelado por tiempo");
                return Err(DomainError::DetectionTimeout);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&output.stdout).into_owned()
            } else {
                stderr.into_owned()
            };
            error!(status = ?output.status.code(), "el detector terminó con error");
            return Err(classify_failure(&message));
        }

        info!(elapsed_ms = started.elapsed().as_millis() as u64, "detector terminado");
        Ok(())
    }
}

fn classify_failure(message: &str) -> DomainError {
    if message.contains("Image Not Found") {
        DomainError::ImageUnreadable(truncate_chars(message, 300))
    } else {
        DomainError::DetectionFailed(truncate_chars(message, 500))
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
