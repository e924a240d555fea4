use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::db::models::{Post, PostId};
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::posts;
use crate::routes::Notice;
use crate::state::AppState;
use crate::validation;

#[derive(Deserialize)]
pub struct PostForm {
    pub body: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post))
        .route(
            "/posts/{id}",
            get(show_post).put(edit_post).delete(delete_post),
        )
}

async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(form): Json<PostForm>,
) -> AppResult<Response> {
    let body = validation::body(&form.body)?;

    let mut conn = state.db.get()?;
    let post = posts::create_post(&mut conn, state.detector.as_ref(), user.id, &body, Utc::now())?;

    Ok((StatusCode::CREATED, Json(post)).into_response())
}

async fn show_post(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Post>> {
    let conn = state.db.get()?;
    Ok(Json(posts::require_post(&conn, PostId(id))?))
}

async fn edit_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(form): Json<PostForm>,
) -> AppResult<Json<Post>> {
    let body = validation::body(&form.body)?;

    let mut conn = state.db.get()?;
    let post = posts::edit_post(
        &mut conn,
        state.detector.as_ref(),
        user.id,
        PostId(id),
        &body,
    )?;
    Ok(Json(post))
}

async fn delete_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Notice> {
    let mut conn = state.db.get()?;
    posts::delete_post(&mut conn, user.id, PostId(id))?;
    Ok(Notice::new("Post deleted", "/"))
}
