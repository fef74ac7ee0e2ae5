use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::application::ports::MediaNormalizerPort;

/// Marcas `ftyp` de los contenedores HEIF/HEIC.
const HEIF_BRANDS: [&[u8; 4]; 9] = [
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"hevm", b"mif1", b"msf1",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Converter {
    /// `sips` de macOS.
    Sips,
    /// `heif-convert` de libheif (Linux).
    HeifConvert,
    /// Decodificación en proceso y reescritura como PNG.
    Library,
}

const CONVERTERS: [Converter; 3] = [Converter::Sips, Converter::HeifConvert, Converter::Library];

/// Convierte a PNG las fotos HEIF/HEIC (típicas de iPhone) que llegan con
/// extensión de imagen normal.
pub struct HeifNormalizer;

impl HeifNormalizer {
    pub fn new() -> Self {
        Self
    }

    async fn is_heif(path: &Path) -> bool {
        match Command::new("file").arg(path).output().await {
            Ok(out) => {
                let stdout = String::from_utf8_lossy(&out.stdout);
                if stdout.contains("HEIF") || stdout.contains("HEIC") {
                    return true;
                }
            }
            Err(e) => debug!("sonda `file` no disponible: {e}"),
        }
        // `file` antiguo o ausente: miramos la cabecera nosotros.
        match tokio::fs::read(path).await {
            Ok(bytes) => sniff_heif(&bytes),
            Err(_) => false,
        }
    }

    async fn convert(converter: Converter, input: &Path, output: &Path) -> bool {
        let ok = match converter {
            Converter::Sips => {
                let out = Command::new("sips")
                    .args(["-s", "format", "png"])
                    .arg(input)
                    .arg("--out")
                    .arg(output)
                    .output()
                    .await;
                matches!(out, Ok(out) if out.status.success())
            }
            Converter::HeifConvert => {
                let out = Command::new("heif-convert").arg(input).arg(output).output().await;
                matches!(out, Ok(out) if out.status.success())
            }
            Converter::Library => Self::convert_in_process(input, output).await,
        };
        let ok = ok && output.is_file();
        debug!(?converter, ok, "conversión HEIF");
        ok
    }

    async fn convert_in_process(input: &Path, output: &Path) -> bool {
        let (input, output) = (input.to_path_buf(), output.to_path_buf());
        let res = tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            decode(&input)?.save_with_format(&output, image::ImageFormat::Png)?;
            Ok(())
        })
        .await;
        match res {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                debug!("decodificación en proceso fallida: {e:#}");
                false
            }
            Err(e) => {
                warn!("tarea de conversión abortada: {e}");
                false
            }
        }
    }
}

impl Default for HeifNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn sniff_heif(bytes: &[u8]) -> bool {
    bytes.len() >= 12
        && &bytes[4..8] == b"ftyp"
        && HEIF_BRANDS.iter().any(|brand| &bytes[8..12] == *brand)
}

/// Con la feature `heif` se decodifica con libheif; sin ella, `image`
/// elige el decodificador por contenido y no por extensión.
#[cfg(feature = "heif")]
fn decode(input: &Path) -> anyhow::Result<image::DynamicImage> {
    use anyhow::Context;
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let lib = LibHeif::new();
    let path = input.to_str().context("ruta no UTF-8")?;
    let ctx = HeifContext::read_from_file(path)?;
    let handle = ctx.primary_image_handle()?;
    let decoded = lib.decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)?;
    let plane = decoded.planes().interleaved.context("sin plano RGB entrelazado")?;

    let (width, height) = (plane.width, plane.height);
    let row_len = width as usize * 3;
    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in plane.data.chunks(plane.stride).take(height as usize) {
        pixels.extend_from_slice(&row[..row_len]);
    }
    let rgb = image::RgbImage::from_raw(width, height, pixels).context("buffer RGB incompleto")?;
    Ok(image::DynamicImage::ImageRgb8(rgb))
}

#[cfg(not(feature = "heif"))]
fn decode(input: &Path) -> anyhow::Result<image::DynamicImage> {
    Ok(image::ImageReader::open(input)?.with_guessed_format()?.decode()?)
}

#[async_trait]
impl MediaNormalizerPort for HeifNormalizer {
    async fn normalize(&self, path: &Path) -> PathBuf {
        if !Self::is_heif(path).await {
            return path.to_path_buf();
        }

        let output = path.with_extension("png");
        let mut converted = false;
        for converter in CONVERTERS {
            if Self::convert(converter, path, &output).await {
                converted = true;
                break;
            }
        }

        if !converted {
            warn!(path = %path.display(), "no se pudo convertir HEIF; se conserva el original");
            return path.to_path_buf();
        }

        if output != path {
            if let Err(e) = tokio::fs::remove_file(path).await {
                warn!("no se pudo borrar {}: {e}", path.display());
            }
        }
        info!(from = %path.display(), to = %output.display(), "HEIF convertido a PNG");
        output
    }
}
