use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Extension, Router,
};
use axum_extra::extract::cookie::Cookie;
use validator::Validate;

use crate::{
    db::userdb::UserExt,
    dtos::{userdtos::*, validation_message, Response},
    error::{is_unique_violation, ErrorMessage, HttpError},
    extractors::Json,
    models::usermodel::UserRole,
    utils::{password, token},
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

fn token_cookie(value: String, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build(("token", value))
        .path("/")
        .max_age(max_age)
        .http_only(true)
        .build()
}

fn login_response(
    app_state: &AppState,
    status: StatusCode,
    user: &crate::models::usermodel::User,
) -> Result<axum::response::Response, HttpError> {
    let token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let cookie = token_cookie(token.clone(), time::Duration::minutes(app_state.env.jwt_maxage));

    let mut response = (
        status,
        Json(UserLoginResponseDto {
            success: true,
            token,
            user: FilterUserDto::filter_user(user),
        }),
    )
        .into_response();

    response.headers_mut().append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error("Invalid cookie header"))?,
    );

    Ok(response)
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let email = normalize_email(&body.email);

    let existing_user = app_state
        .db_client
        .get_user(None, Some(&email))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if existing_user.is_some() {
        return Err(HttpError::bad_request(ErrorMessage::EmailExist.to_string()));
    }

    let hashed_password =
        password::hash(&body.password).map_err(|e| HttpError::server_error(e.to_string()))?;

    // Self-registration always creates a customer.
    let user = app_state
        .db_client
        .save_user(
            body.name.trim().to_string(),
            email,
            hashed_password,
            UserRole::Customer,
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

    tracing::info!(user_id = %user.id, "user registered");

    login_response(&app_state, StatusCode::CREATED, &user)
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let result = app_state
        .db_client
        .get_user(None, Some(&normalize_email(&body.email)))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let user =
        result.ok_or_else(|| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    let password_matched = password::compare(&body.password, &user.password)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        return Err(HttpError::unauthorized(
            ErrorMessage::WrongCredentials.to_string(),
        ));
    }

    if user.is_blocked {
        return Err(HttpError::forbidden(ErrorMessage::UserBlocked.to_string()));
    }

    login_response(&app_state, StatusCode::OK, &user)
}

pub async fn logout() -> Result<impl IntoResponse, HttpError> {
    let cookie = token_cookie(String::new(), time::Duration::ZERO);

    let mut response = Json(Response::ok("Logged out")).into_response();
    response.headers_mut().append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error("Invalid cookie header"))?,
    );

    Ok(response)
}
