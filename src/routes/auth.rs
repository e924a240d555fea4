use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::accounts::{self, NewUser};
use crate::auth::{self, session};
use crate::error::{AppError, AppResult};
use crate::extractors::MaybeUser;
use crate::routes::Notice;
use crate::state::AppState;
use crate::validation;

// -- Request types --

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
    pub next: Option<String>,
}

pub fn router() -> axum::Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// POST /auth/register
async fn register(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Response> {
    if user.is_some() {
        return Ok(Notice::new("You are already signed in", "/").into_response());
    }

    let new_user = NewUser {
        username: validation::username(&req.username)?,
        email: validation::email(&req.email)?,
        password: req.password.clone(),
    };
    validation::password(&req.password, &req.confirm_password)?;

    let mut conn = state.db.get()?;
    accounts::register(&mut conn, &new_user, state.config.auth.bcrypt_cost, Utc::now())?;

    Ok((
        StatusCode::CREATED,
        Notice::new("Registration Success!", "/auth/login"),
    )
        .into_response())
}

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(req): Json<LoginRequest>,
) -> AppResult<Response> {
    if user.is_some() {
        return Ok(Notice::new("You are already signed in", "/").into_response());
    }

    let conn = state.db.get()?;
    let user = accounts::authenticate(&conn, req.username.trim(), &req.password)?
        .ok_or(AppError::Unauthorized)?;

    let hours = state.config.auth.session_hours;
    let token = session::create_session(&conn, user.id, hours)?;
    let cookie = auth::session_cookie(
        &state.config.auth.cookie_name,
        &token,
        req.remember_me.then_some(hours),
    );
    tracing::info!(user_id = %user.id, "User signed in");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Notice::new(
            format!("Welcome back, {}", user.username),
            auth::safe_redirect(req.next.as_deref()),
        ),
    )
        .into_response())
}

/// POST /auth/logout
async fn logout(
    State(state): State<AppState>,
    request: axum::http::Request<axum::body::Body>,
) -> AppResult<Response> {
    let (parts, _body) = request.into_parts();
    let cookie_name = &state.config.auth.cookie_name;

    if let Some(token) = auth::get_cookie_value(&parts, cookie_name) {
        let conn = state.db.get()?;
        session::delete_session(&conn, token)?;
    }

    Ok((
        [(header::SET_COOKIE, auth::clear_session_cookie(cookie_name))],
        Notice::new("Signed out", "/"),
    )
        .into_response())
}
