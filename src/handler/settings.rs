use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Extension, Router};
use validator::Validate;

use crate::{
    db::settingsdb::SettingsExt,
    dtos::{settingsdtos::UpdateSettingsDto, validation_message},
    error::HttpError,
    extractors::Json,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn settings_handler() -> Router {
    Router::new().route("/", get(get_settings).put(update_settings))
}

pub async fn get_settings(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let settings = app_state
        .db_client
        .get_settings()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(settings))
}

pub async fn update_settings(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateSettingsDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let settings = app_state
        .db_client
        .update_settings(&body, user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!(updated_by = %user.user.id, "settings updated");

    Ok(Json(settings))
}
