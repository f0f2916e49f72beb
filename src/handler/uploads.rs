use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Extension, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::DBClient,
    error::HttpError,
    extractors::{Json, Path},
    middleware::JWTAuthMiddeware,
    service::{
        error::ServiceError,
        media::{UploadKind, MAX_UPLOAD_BYTES},
        order_service::OrderService,
    },
    AppState,
};

/// Multipart framing on top of the file itself.
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

pub fn uploads_handler() -> Router {
    Router::new()
        .route("/prescription/:order_id", post(upload_prescription))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Pulls the `file` field out of a multipart body and checks it against `kind`.
pub async fn read_file_field(
    mut multipart: Multipart,
    kind: UploadKind,
) -> Result<UploadedFile, HttpError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| HttpError::bad_request(e.body_text()))?;

        kind.check(&content_type, bytes.len())
            .map_err(HttpError::bad_request)?;

        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(HttpError::bad_request("No file uploaded"))
}

pub async fn store_file(
    app_state: &AppState,
    kind: UploadKind,
    file: UploadedFile,
) -> Result<String, HttpError> {
    app_state
        .media
        .upload(kind, file.file_name, &file.content_type, file.bytes)
        .await
        .map_err(|e| HttpError::from(ServiceError::from(e)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionUploadedDto {
    pub success: bool,
    pub message: String,
    pub prescription_url: String,
}

pub async fn upload_prescription(
    Path(order_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let multipart = multipart?;
    let service = OrderService::<DBClient>::new(app_state.db_client.clone());

    // Ownership is checked before anything leaves the server.
    let order = service.get_order_for(&user.user, order_id).await?;
    if order.user_id != user.user.id {
        return Err(ServiceError::OrderAccessDenied(order_id).into());
    }

    let file = read_file_field(multipart, UploadKind::Prescription).await?;
    let url = store_file(&app_state, UploadKind::Prescription, file).await?;

    let order = service.attach_prescription(&user.user, order_id, &url).await?;

    tracing::info!(order_id = %order.id, "prescription uploaded");

    Ok((
        StatusCode::CREATED,
        Json(PrescriptionUploadedDto {
            success: true,
            message: "Prescription uploaded successfully".to_string(),
            prescription_url: url,
        }),
    ))
}
