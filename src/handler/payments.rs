use std::sync::Arc;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
    Extension, Router,
};
use serde_json::Value;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{
    db::{paymentdb::PaymentExt, DBClient},
    dtos::paymentdtos::*,
    error::HttpError,
    extractors::{Json, Path, Query},
    middleware::{auth, role_check, JWTAuthMiddeware},
    models::usermodel::STAFF_ROLES,
    service::{mpesa::MpesaClient, payment_service::PaymentService},
    AppState,
};

pub fn payments_handler() -> Router {
    let staff = Router::new()
        .route("/", get(get_payments))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            role_check(req, next, STAFF_ROLES)
        }));

    let customer = Router::new()
        .route("/mpesa/stk/:order_id", post(initiate_stk))
        .merge(staff)
        .route_layer(middleware::from_fn(auth));

    Router::new()
        .route("/mpesa/callback", post(mpesa_callback))
        .merge(customer)
}

fn payment_service(app_state: &AppState) -> PaymentService<DBClient, MpesaClient> {
    PaymentService::new(app_state.db_client.clone(), app_state.mpesa.clone())
}

/// Compares the `?token=` on a callback with the configured secret.
/// With no secret configured every callback is accepted.
pub fn callback_token_matches(expected: Option<&str>, given: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => {
            let given = given.unwrap_or_default();
            bool::from(expected.as_bytes().ct_eq(given.as_bytes()))
        }
    }
}

pub async fn get_payments(
    Query(query): Query<PaymentQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let status = query.status_filter().map_err(HttpError::bad_request)?;

    let payments = app_state
        .db_client
        .get_payments(status, query.search())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(payments))
}

pub async fn initiate_stk(
    Path(order_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<InitiateStkDto>,
) -> Result<impl IntoResponse, HttpError> {
    let payment = payment_service(&app_state)
        .initiate(&user.user, order_id, &body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(StkInitiatedDto {
            success: true,
            message: "STK prompt sent. Enter PIN on your phone.".to_string(),
            payment_id: payment.id.to_string(),
            checkout_request_id: payment.mpesa.checkout_request_id.unwrap_or_default(),
        }),
    ))
}

pub async fn mpesa_callback(
    Query(query): Query<CallbackQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, HttpError> {
    if !callback_token_matches(
        app_state.env.mpesa.callback_token.as_deref(),
        query.token.as_deref(),
    ) {
        tracing::warn!("M-Pesa callback with a bad token");
        return Err(HttpError::unauthorized("Invalid callback token"));
    }

    let outcome = payment_service(&app_state).reconcile(&payload).await?;
    tracing::debug!(?outcome, "M-Pesa callback handled");

    Ok(Json(CallbackAckDto { ok: true }))
}
