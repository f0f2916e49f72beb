use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
    Extension, Router,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{productdb::ProductExt, settingsdb::SettingsExt},
    dtos::{productdtos::*, validation_message, ApiResponse, Response},
    error::HttpError,
    extractors::{Json, Path, Query},
    handler::uploads::{read_file_field, store_file, UPLOAD_BODY_LIMIT},
    middleware::{auth, role_check, JWTAuthMiddeware},
    models::usermodel::STAFF_ROLES,
    service::media::UploadKind,
    AppState,
};

pub fn products_handler() -> Router {
    let staff = Router::new()
        .route("/", post(create_product))
        .route("/:id", axum::routing::put(update_product).delete(delete_product))
        .route(
            "/:id/image",
            post(upload_product_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            role_check(req, next, STAFF_ROLES)
        }))
        .route_layer(middleware::from_fn(auth));

    Router::new()
        .route("/", get(get_products))
        .route("/:id", get(get_product))
        .merge(staff)
}

pub async fn get_products(
    Query(query): Query<ProductQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let settings = app_state
        .db_client
        .get_settings()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let filter = query
        .into_filter(settings.low_stock_threshold, Utc::now())
        .map_err(HttpError::bad_request)?;

    let (items, total) = app_state
        .db_client
        .get_products(&filter)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ProductPageDto::new(items, &filter, total)))
}

pub async fn get_product(
    Path(product_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let product = app_state
        .db_client
        .get_product(product_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Product not found"))?;

    Ok(Json(product))
}

pub async fn create_product(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateProductDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let product = app_state
        .db_client
        .save_product(user.user.id, &body)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!(product_id = %product.id, created_by = %user.user.id, "product created");

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    Path(product_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<UpdateProductDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let product = app_state
        .db_client
        .update_product(product_id, &body)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Product not found"))?;

    Ok(Json(product))
}

pub async fn delete_product(
    Path(product_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let deleted = app_state
        .db_client
        .delete_product(product_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if deleted == 0 {
        return Err(HttpError::not_found("Product not found"));
    }

    tracing::info!(product_id = %product_id, "product deleted");

    Ok(Json(Response::ok("Product removed")))
}

pub async fn upload_product_image(
    Path(product_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let multipart = multipart?;
    app_state
        .db_client
        .get_product(product_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Product not found"))?;

    let file = read_file_field(multipart, UploadKind::ProductImage).await?;
    let url = store_file(&app_state, UploadKind::ProductImage, file).await?;

    let product = app_state
        .db_client
        .set_product_image(product_id, &url)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Product not found"))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Image uploaded", product)),
    ))
}
