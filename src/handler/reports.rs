use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Extension, Router};
use chrono::Utc;

use crate::{
    db::orderdb::OrderExt,
    dtos::reportdtos::ReportQueryDto,
    error::HttpError,
    extractors::{Json, Query},
    service::report_service::{build_summary, window_start},
    AppState,
};

pub fn reports_handler() -> Router {
    Router::new().route("/summary", get(get_summary))
}

pub async fn get_summary(
    Query(query): Query<ReportQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let days = query.window().map_err(HttpError::bad_request)?;

    let orders = app_state
        .db_client
        .get_orders_since(window_start(Utc::now(), days))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(build_summary(days, &orders)))
}
