use std::path::Path;
use tracing::warn;

use super::detection::{Detection, RawLabel};
use super::errors::DomainResult;
use super::taxonomy::ClassRemapper;

/// Parsea una línea `class_id x y w h [conf]` del formato de etiquetas YOLO.
///
/// Devuelve `None` para líneas con menos de 5 tokens o con tokens no numéricos.
pub fn parse_label_line(line: &str) -> Option<RawLabel> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return None;
    }

    let class_id = parts[0].parse::<u32>().ok()?;
    let mut bbox = [0f32; 4];
    for (slot, token) in bbox.iter_mut().zip(&parts[1..5]) {
        *slot = token.parse().ok()?;
    }

    // OJO: sin columna de confianza se reutiliza la altura de la caja
    // (token 4). Sospechoso; se mantiene hasta confirmar el formato.
    let confidence = match parts.get(5) {
        Some(token) => token.parse().ok()?,
        None => bbox[3],
    };

    Some(RawLabel { class_id, bbox, confidence })
}

pub fn parse_labels(contents: &str, remapper: &dyn ClassRemapper) -> Vec<Detection> {
    contents
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let parsed = parse_label_line(line);
            if parsed.is_none() && line.split_whitespace().count() >= 5 {
                warn!(line = idx + 1, content = line, "línea de etiqueta malformada, se ignora");
            }
            parsed
        })
        .map(|raw| remapper.remap(&raw))
        .collect()
}

/// Sin fichero de etiquetas no hay detecciones; no es un error.
pub async fn parse_label_file(
    path: Option<&Path>,
    remapper: &dyn ClassRemapper,
) -> DomainResult<Vec<Detection>> {
    let Some(path) = path else { return Ok(Vec::new()) };
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(parse_labels(&contents, remapper)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("reading label file {}", path.display()))
            .into()),
    }
}
