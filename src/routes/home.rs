use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::models::TimelinePost;
use crate::error::AppResult;
use crate::extractors::{CurrentUser, Paging};
use crate::social::{feed, Page};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/index", get(index))
        .route("/explore", get(explore))
        .route("/search", get(search))
}

/// GET /: the signed-in user's feed
async fn index(
    State(state): State<AppState>,
    user: CurrentUser,
    Paging(request): Paging,
) -> AppResult<Json<Page<TimelinePost>>> {
    let mut conn = state.db.get()?;
    Ok(Json(feed::followed_posts(&mut conn, user.id, request)?))
}

/// GET /explore: every post
async fn explore(
    State(state): State<AppState>,
    _user: CurrentUser,
    Paging(request): Paging,
) -> AppResult<Json<Page<TimelinePost>>> {
    let mut conn = state.db.get()?;
    Ok(Json(feed::explore_posts(&mut conn, request)?))
}

/// GET /search?q=: an empty query goes back to explore
async fn search(
    State(state): State<AppState>,
    _user: CurrentUser,
    Paging(request): Paging,
    Query(params): Query<SearchParams>,
) -> AppResult<Response> {
    let query = params.q.trim();
    if query.is_empty() {
        return Ok(Redirect::to("/explore").into_response());
    }

    let mut conn = state.db.get()?;
    Ok(Json(feed::search_posts(&mut conn, query, request)?).into_response())
}
