use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::warn;

use crate::application::ports::{RuntimeInfo, RuntimeProbePort};
use crate::config::AppConfig;

const PROBE_SCRIPT: &str =
    "import torch; print(torch.__version__); print(torch.cuda.is_available())";
const PROBE_TIMEOUT: Duration = Duration::from_secs(20);

/// Pregunta al intérprete del detector por la versión de torch y CUDA.
pub struct TorchProbe {
    config: Arc<AppConfig>,
}

impl TorchProbe {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RuntimeProbePort for TorchProbe {
    async fn probe(&self) -> RuntimeInfo {
        let mut cmd = Command::new(&self.config.interpreter);
        cmd.args(["-c", PROBE_SCRIPT]).kill_on_drop(true);

        match tokio::time::timeout(PROBE_TIMEOUT, cmd.output()).await {
            Ok(Ok(out)) if out.status.success() => parse_probe_output(&String::from_utf8_lossy(&out.stdout)),
            Ok(Ok(out)) => {
                warn!(status = ?out.status.code(), "sonda de torch fallida");
                RuntimeInfo::default()
            }
            Ok(Err(e)) => {
                warn!("No se pudo lanzar {}: {e}", self.config.interpreter);
                RuntimeInfo::default()
            }
            Err(_) => {
                warn!("sonda de torch sin respuesta");
                RuntimeInfo::default()
            }
        }
    }
}

fn parse_probe_output(stdout: &str) -> RuntimeInfo {
    let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
    RuntimeInfo {
        runtime_version: lines.next().map(str::to_string),
        gpu_available: lines.next() == Some("True"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_version_and_cuda_flag() {
        let info = parse_probe_output("2.1.0+cu118\nTrue\n");
        assert_eq!(info.runtime_version.as_deref(), Some("2.1.0+cu118"));
        assert!(info.gpu_available);

        let info = parse_probe_output("2.1.0\nFalse\n");
        assert!(!info.gpu_available);

        let info = parse_probe_output("");
        assert_eq!(info.runtime_version, None);
    }

    #[tokio::test]
    async fn missing_interpreter_degrades_gracefully() {
        let mut cfg = AppConfig::from_base_dir(".");
        cfg.interpreter = "/nonexistent/python-for-ikan".into();
        let info = TorchProbe::new(Arc::new(cfg)).probe().await;
        assert_eq!(info.runtime_version, None);
        assert!(!info.gpu_available);
    }
}
