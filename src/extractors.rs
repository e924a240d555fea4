use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use chrono::Utc;
use serde::Deserialize;

use crate::accounts;
use crate::auth::{get_cookie_value, session};
use crate::db::models::UserId;
use crate::error::AppError;
use crate::social::PageRequest;
use crate::state::AppState;

/// Represents the currently authenticated user.
///
/// This is the identity every core operation is handed; nothing below the
/// route layer looks at cookies.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
}

/// Extractor that requires authentication.
/// Returns 401 if no valid session found. Refreshes the user's `last_seen`.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token =
            get_cookie_value(parts, &state.config.auth.cookie_name).ok_or(AppError::Unauthorized)?;

        let conn = state.db.get()?;
        let (id, username) = session::session_user(&conn, token)?.ok_or(AppError::Unauthorized)?;
        accounts::touch_last_seen(&conn, id, Utc::now())?;

        Ok(CurrentUser { id, username })
    }
}

/// Optional user extractor: returns None instead of 401 when not authenticated.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(AppError::Unauthorized) => Ok(MaybeUser(None)),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<i64>,
}

/// `?page=N` resolved against the configured page size. A missing or
/// unparsable page number means page 1.
pub struct Paging(pub PageRequest);

impl FromRequestParts<AppState> for Paging {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let page = Query::<PageParams>::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|Query(params)| params.page)
            .unwrap_or(1);
        Ok(Paging(PageRequest::new(
            page,
            state.config.feed.posts_per_page,
        )))
    }
}
