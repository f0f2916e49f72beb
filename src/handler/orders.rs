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
    db::{orderdb::OrderExt, DBClient},
    dtos::{orderdtos::*, validation_message},
    error::HttpError,
    extractors::{Json, Path, Query},
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::STAFF_ROLES,
    service::order_service::OrderService,
    AppState,
};

pub fn orders_handler() -> Router {
    let staff = Router::new()
        .route("/", get(get_orders))
        .route("/:id/decision", put(decide_order))
        .route("/:id/status", put(update_order_status))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            role_check(req, next, STAFF_ROLES)
        }));

    Router::new()
        .route("/", post(create_order))
        .route("/my", get(get_my_orders))
        .route("/:id", get(get_order))
        .merge(staff)
}

fn order_service(app_state: &AppState) -> OrderService<DBClient> {
    OrderService::new(app_state.db_client.clone())
}

pub async fn create_order(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateOrderDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let order = order_service(&app_state)
        .place_order(user.user.id, body)
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_my_orders(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let orders = app_state
        .db_client
        .get_user_orders(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(orders))
}

pub async fn get_orders(
    Query(query): Query<OrderQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let status = query.status_filter().map_err(HttpError::bad_request)?;

    let orders = app_state
        .db_client
        .get_orders(status)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(orders))
}

pub async fn get_order(
    Path(order_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let order = order_service(&app_state)
        .get_order_for(&user.user, order_id)
        .await?;

    Ok(Json(order))
}

pub async fn decide_order(
    Path(order_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<OrderDecisionDto>,
) -> Result<impl IntoResponse, HttpError> {
    let decision = body.decision().map_err(HttpError::bad_request)?;

    let order = order_service(&app_state)
        .decide(order_id, decision, body.note)
        .await?;

    tracing::info!(order_id = %order_id, staff_id = %user.user.id, ?decision, "order reviewed");

    Ok(Json(order))
}

pub async fn update_order_status(
    Path(order_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<OrderStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let target = body.target().map_err(HttpError::bad_request)?;

    let order = order_service(&app_state)
        .advance_status(order_id, target)
        .await?;

    Ok(Json(order))
}
