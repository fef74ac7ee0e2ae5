use axum::{
    body::Body,
    extract::{multipart::Multipart, rejection::JsonRejection, Path, Request, State},
    response::{IntoResponse, Response},
    Json,
};
use std::path::{Component, Path as FsPath, PathBuf};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::adapters::http::{error::ApiError, state::HttpState};
use crate::application::dto::{DetectRequest, DetectResponse, HealthResponse, UploadResponse, WeightsResponse};
use crate::domain::errors::DomainError;

pub async fn list_weights(State(st): State<HttpState>) -> Result<Json<WeightsResponse>, ApiError> {
    let weights = st.info.list_weights().await?;
    Ok(Json(WeightsResponse { weights }))
}

pub async fn health(State(st): State<HttpState>) -> Json<HealthResponse> {
    Json(st.info.health().await)
}

pub async fn upload(
    State(st): State<HttpState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let bad_multipart = |e: axum::extract::multipart::MultipartError| {
        if e.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
            DomainError::PayloadTooLarge("File too large".into())
        } else {
            DomainError::BadRequest(format!("Invalid upload: {}", e.body_text()))
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(bad_multipart)?;
        let stored = st.upload.store(&name, &data).await?;
        return Ok(Json(stored.into()));
    }

    Err(DomainError::BadRequest("No file provided".into()).into())
}

pub async fn detect(
    State(st): State<HttpState>,
    payload: Result<Json<DetectRequest>, JsonRejection>,
) -> Result<Json<DetectResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| DomainError::BadRequest(e.body_text()))?;
    Ok(Json(st.detection.detect(req).await?))
}

pub async fn get_result(
    State(st): State<HttpState>,
    Path(path): Path<String>,
    req: Request,
) -> Response {
    serve_confined(&st.config.results_dir, &path, req).await
}

pub async fn get_upload(
    State(st): State<HttpState>,
    Path(name): Path<String>,
    req: Request,
) -> Response {
    serve_confined(&st.config.upload_dir, &name, req).await
}

/// Sirve `root/rel` solo si el fichero existe y queda dentro de `root`.
async fn serve_confined(root: &FsPath, rel: &str, req: Request) -> Response {
    let Some(file) = confined_path(root, rel) else {
        return ApiError(DomainError::NotFound("File not found".into())).into_response();
    };
    match ServeFile::new(file).oneshot(req).await {
        Ok(res) => res.map(Body::new).into_response(),
        Err(never) => match never {},
    }
}

fn confined_path(root: &FsPath, rel: &str) -> Option<PathBuf> {
    let rel = FsPath::new(rel);
    if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
        return None;
    }
    let root = root.canonicalize().ok()?;
    let target = root.join(rel).canonicalize().ok()?;
    (target.starts_with(&root) && target.is_file()).then_some(target)
}
