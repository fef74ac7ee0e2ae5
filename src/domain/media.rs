use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::errors::{DomainError, DomainResult};

pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];
pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Extensiones con las que el detector guarda el resultado.
    pub fn result_extensions(self) -> &'static [&'static str] {
        match self {
            MediaKind::Image => &["jpg", "jpeg", "png"],
            MediaKind::Video => &["mp4", "avi", "mov"],
        }
    }

    pub fn from_filename(name: &str) -> Option<Self> {
        let ext = extension(name)?;
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub original_name: String,
    pub stored_name: String,
    pub kind: MediaKind,
    pub path: PathBuf,
}

/// Extensión en minúsculas, tomando lo que hay tras el último punto.
pub fn extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

pub fn stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

/// Comprueba la extensión contra la lista permitida.
pub fn validate_upload_name(name: &str, allowed: &[String]) -> DomainResult<String> {
    match extension(name) {
        Some(ext) if allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)) => Ok(ext),
        _ => Err(DomainError::BadRequest("Invalid file type".into())),
    }
}

/// Versión de `secure_filename` de werkzeug: solo ASCII, sin separadores
/// de ruta, espacios como `_` y sin `.`/`_` al principio o al final.
pub fn sanitize_filename(name: &str) -> String {
    let ascii: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// `<stem>_<stamp>.<ext>`; con `attempt > 0` se añade `_<attempt>`.
pub fn stamped_name(sanitized: &str, stamp: &str, attempt: u32) -> String {
    let (name, ext) = sanitized.rsplit_once('.').unwrap_or((sanitized, ""));
    let name = if name.is_empty() { "upload" } else { name };
    let suffix = if attempt == 0 { String::new() } else { format!("_{attempt}") };
    if ext.is_empty() {
        format!("{name}_{stamp}{suffix}")
    } else {
        format!("{name}_{stamp}{suffix}.{ext}")
    }
}
