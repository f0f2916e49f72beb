use std::sync::Arc;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, put},
    Extension, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::userdb::UserExt,
    dtos::{userdtos::*, validation_message, ApiResponse, Response},
    error::{is_foreign_key_violation, is_unique_violation, ErrorMessage, HttpError},
    extractors::{Json, Path, Query},
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::{UserRole, ADMIN_ROLES},
    utils::password,
    AppState,
};

/// `/users`: the caller's own profile plus the admin user directory.
pub fn users_handler() -> Router {
    let admin = Router::new()
        .route("/", get(get_users).post(create_user))
        .route(
            "/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            role_check(req, next, ADMIN_ROLES)
        }));

    Router::new()
        .route("/me", get(get_me).put(update_me))
        .merge(admin)
}

/// `/admin/users`: the back-office user screen.
pub fn admin_users_handler() -> Router {
    Router::new()
        .route("/", get(get_users).post(create_user))
        .route("/:id", put(update_user).delete(delete_user))
        .route("/:id/reset-password", put(reset_password))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            role_check(req, next, ADMIN_ROLES)
        }))
}

pub async fn get_me(
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(ApiResponse::success(
        "Profile fetched",
        UserData {
            user: FilterUserDto::filter_user(&user.user),
        },
    )))
}

pub async fn update_me(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let user = &user.user;

    if let Some(new_password) = &body.new_password {
        let current = body
            .current_password
            .as_deref()
            .filter(|current| !current.is_empty())
            .ok_or_else(|| HttpError::bad_request("Current password is required"))?;

        let matched = password::compare(current, &user.password)
            .map_err(|e| HttpError::server_error(e.to_string()))?;

        if !matched {
            return Err(HttpError::bad_request("Current password is incorrect"));
        }

        let hashed =
            password::hash(new_password).map_err(|e| HttpError::server_error(e.to_string()))?;

        app_state
            .db_client
            .update_user_password(user.id, hashed)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;
    }

    let updated = app_state
        .db_client
        .update_user_profile(
            user.id,
            body.name.map(|name| name.trim().to_string()),
            body.profile_pic,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    Ok(Json(ApiResponse::success(
        "Profile updated",
        UserData {
            user: FilterUserDto::filter_user(&updated),
        },
    )))
}

pub async fn get_users(
    Query(query): Query<UserQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let role = query.role_filter().map_err(HttpError::bad_request)?;

    let users = app_state
        .db_client
        .get_users(role, query.search())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(UserListResponseDto {
        success: true,
        results: users.len(),
        users: FilterUserDto::filter_users(&users),
    }))
}

pub async fn get_user(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .get_user(Some(user_id), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    Ok(Json(ApiResponse::success(
        "User fetched",
        UserData {
            user: FilterUserDto::filter_user(&user),
        },
    )))
}

pub async fn create_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let email = normalize_email(&body.email);
    let role = body
        .role
        .as_deref()
        .and_then(UserRole::parse)
        .unwrap_or(UserRole::Customer);

    let hashed_password =
        password::hash(&body.password).map_err(|e| HttpError::server_error(e.to_string()))?;

    let user = app_state
        .db_client
        .save_user(
            body.name.trim().to_string(),
            email,
            hashed_password,
            role,
            body.profile_pic.unwrap_or_default(),
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                HttpError::bad_request(ErrorMessage::EmailExist.to_string())
            } else {
                HttpError::server_error(e.to_string())
            }
        })?;

    tracing::info!(user_id = %user.id, role = user.role.to_str(), "user created by admin");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "User created",
            UserData {
                user: FilterUserDto::filter_user(&user),
            },
        )),
    ))
}

pub async fn update_user(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<AdminUpdateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    // An unrecognised role leaves the current one untouched.
    let role = body.role.as_deref().and_then(UserRole::parse);

    let user = app_state
        .db_client
        .admin_update_user(
            user_id,
            body.name.map(|name| name.trim().to_string()),
            role,
            body.profile_pic,
            body.is_blocked,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    Ok(Json(ApiResponse::success(
        "User updated",
        UserData {
            user: FilterUserDto::filter_user(&user),
        },
    )))
}

pub async fn delete_user(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(admin): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    if admin.user.id == user_id {
        return Err(HttpError::bad_request("You cannot delete your own account."));
    }

    let deleted = app_state.db_client.delete_user(user_id).await.map_err(|e| {
        if is_foreign_key_violation(&e) {
            HttpError::bad_request("User has related records and cannot be deleted")
        } else {
            HttpError::server_error(e.to_string())
        }
    })?;

    if deleted == 0 {
        return Err(HttpError::not_found("User not found"));
    }

    tracing::info!(user_id = %user_id, admin_id = %admin.user.id, "user deleted");

    Ok(Json(Response::ok("User deleted")))
}

pub async fn reset_password(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ResetPasswordDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let hashed =
        password::hash(&body.new_password).map_err(|e| HttpError::server_error(e.to_string()))?;

    app_state
        .db_client
        .update_user_password(user_id, hashed)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    Ok(Json(Response::ok("Password reset successful")))
}
