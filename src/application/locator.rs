//! Búsqueda de los ficheros que deja `detect.py`.
//!
//! Según la versión/configuración, el detector escribe en `<project>/result/`
//! o directamente en `<project>/`. En lugar de condicionales ad hoc, las
//! rutas candidatas salen de una lista fija de estrategias que se prueban en
//! orden; gana la primera que existe.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::media::{stem, MediaKind};

/// Subdirectorio que se pasa como `--name` al detector.
pub const RUN_NAME: &str = "result";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `<root>/result/...`
    RunSubdir,
    /// `<root>/...`
    Root,
}

impl Layout {
    fn dir(self, root: &Path) -> PathBuf {
        match self {
            Layout::RunSubdir => root.join(RUN_NAME),
            Layout::Root => root.to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    /// Nombre del fichero pasado en `--source`.
    Source,
    /// Nombre que envió el cliente en la petición.
    Uploaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateStrategy {
    StemWithExtensions(Layout, NameSource),
    Verbatim(Layout, NameSource),
    FirstFile(Layout),
}

pub const RESULT_STRATEGIES: [LocateStrategy; 10] = [
    LocateStrategy::StemWithExtensions(Layout::RunSubdir, NameSource::Source),
    LocateStrategy::Verbatim(Layout::RunSubdir, NameSource::Source),
    LocateStrategy::StemWithExtensions(Layout::Root, NameSource::Source),
    LocateStrategy::Verbatim(Layout::Root, NameSource::Source),
    LocateStrategy::StemWithExtensions(Layout::RunSubdir, NameSource::Uploaded),
    LocateStrategy::Verbatim(Layout::RunSubdir, NameSource::Uploaded),
    LocateStrategy::StemWithExtensions(Layout::Root, NameSource::Uploaded),
    LocateStrategy::Verbatim(Layout::Root, NameSource::Uploaded),
    LocateStrategy::FirstFile(Layout::RunSubdir),
    LocateStrategy::FirstFile(Layout::Root),
];

pub const LABEL_STRATEGIES: [(Layout, NameSource); 4] = [
    (Layout::RunSubdir, NameSource::Source),
    (Layout::Root, NameSource::Source),
    (Layout::RunSubdir, NameSource::Uploaded),
    (Layout::Root, NameSource::Uploaded),
];

#[derive(Debug, Clone, Copy)]
pub struct LocateRequest<'a> {
    pub root: &'a Path,
    pub source_name: &'a str,
    pub uploaded_name: &'a str,
    pub kind: MediaKind,
}

impl<'a> LocateRequest<'a> {
    fn name(&self, source: NameSource) -> &'a str {
        match source {
            NameSource::Source => self.source_name,
            NameSource::Uploaded => self.uploaded_name,
        }
    }
}

impl LocateStrategy {
    fn find(self, req: &LocateRequest<'_>) -> Option<PathBuf> {
        match self {
            LocateStrategy::StemWithExtensions(layout, source) => {
                let dir = layout.dir(req.root);
                let base = stem(req.name(source));
                req.kind
                    .result_extensions()
                    .iter()
                    .map(|ext| dir.join(format!("{base}.{ext}")))
                    .find(|p| p.is_file())
            }
            LocateStrategy::Verbatim(layout, source) => {
                Some(layout.dir(req.root).join(req.name(source))).filter(|p| p.is_file())
            }
            LocateStrategy::FirstFile(layout) => first_file(&layout.dir(req.root)),
        }
    }
}

/// Primer fichero regular (por nombre) directamente dentro de `dir`.
fn first_file(dir: &Path) -> Option<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    files.into_iter().next()
}

pub fn locate_result(req: &LocateRequest<'_>) -> DomainResult<PathBuf> {
    for strategy in RESULT_STRATEGIES {
        if let Some(found) = strategy.find(req) {
            debug!(?strategy, path = %found.display(), "fichero de resultado encontrado");
            return Ok(found);
        }
    }
    Err(DomainError::NotFound(format!(
        "no result file under {}",
        req.root.display()
    )))
}

pub fn locate_labels(req: &LocateRequest<'_>) -> Option<PathBuf> {
    LABEL_STRATEGIES.iter().find_map(|&(layout, source)| {
        let path = layout
            .dir(req.root)
            .join("labels")
            .join(format!("{}.txt", stem(req.name(source))));
        path.is_file().then_some(path)
    })
}
