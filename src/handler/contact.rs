use std::sync::Arc;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::contactdb::ContactExt,
    dtos::{contactdtos::*, validation_message, Response},
    error::HttpError,
    extractors::{Json, Path, Query},
    mail::mails::send_contact_notification,
    middleware::{auth, role_check},
    models::{contactmodel::ContactStatus, usermodel::STAFF_ROLES},
    AppState,
};

pub fn contact_handler() -> Router {
    let staff = Router::new()
        .route("/", get(get_messages))
        .route("/:id/status", put(update_message_status))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            role_check(req, next, STAFF_ROLES)
        }))
        .route_layer(middleware::from_fn(auth));

    Router::new()
        .route("/", post(create_message))
        .merge(staff)
}

pub async fn create_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(mut body): Json<CreateContactDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.name = body.name.trim().to_string();
    body.email = body.email.trim().to_string();
    body.message = body.message.trim().to_string();

    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let message = app_state
        .db_client
        .save_contact_message(&body)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    // The message is stored either way; a mail outage only costs the notification.
    if let Err(e) = send_contact_notification(&app_state.mailer, &message).await {
        tracing::warn!(message_id = %message.id, error = %e, "contact notification not sent");
    }

    Ok((
        StatusCode::CREATED,
        Json(Response::ok(
            "Message sent successfully. We will contact you soon.",
        )),
    ))
}

pub async fn get_messages(
    Query(query): Query<ContactQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let status = query.status_filter().map_err(HttpError::bad_request)?;

    let messages = app_state
        .db_client
        .get_contact_messages(status)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(messages))
}

pub async fn update_message_status(
    Path(message_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ContactStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let status = ContactStatus::parse(&body.status)
        .ok_or_else(|| HttpError::bad_request(format!("Unknown message status '{}'", body.status)))?;

    let message = app_state
        .db_client
        .update_contact_status(message_id, status)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Message not found"))?;

    Ok(Json(message))
}
