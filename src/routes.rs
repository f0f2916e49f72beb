use std::sync::Arc;

use axum::{
    extract::Request,
    http::Uri,
    middleware::{self, Next},
    routing::get,
    Extension, Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    error::HttpError,
    handler::{
        auth::auth_handler,
        contact::contact_handler,
        orders::orders_handler,
        payments::payments_handler,
        products::products_handler,
        reports::reports_handler,
        settings::settings_handler,
        uploads::uploads_handler,
        users::{admin_users_handler, users_handler},
    },
    middleware::{auth, role_check},
    models::usermodel::STAFF_ROLES,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

async fn route_not_found(uri: Uri) -> HttpError {
    HttpError::not_found(format!("Route {} Not Found", uri.path()))
}

fn staff_only(router: Router) -> Router {
    router
        .layer(middleware::from_fn(|req: Request, next: Next| {
            role_check(req, next, STAFF_ROLES)
        }))
        .layer(middleware::from_fn(auth))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/users", users_handler().layer(middleware::from_fn(auth)))
        .nest(
            "/admin/users",
            admin_users_handler().layer(middleware::from_fn(auth)),
        )
        .nest("/products", products_handler())
        .nest("/orders", orders_handler().layer(middleware::from_fn(auth)))
        .nest("/uploads", uploads_handler().layer(middleware::from_fn(auth)))
        .nest("/settings", staff_only(settings_handler()))
        .nest("/payments", payments_handler())
        .nest("/contact", contact_handler())
        .nest("/reports", staff_only(reports_handler()))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
        .fallback(route_not_found)
}
