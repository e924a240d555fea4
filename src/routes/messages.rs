use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::models::InboxMessage;
use crate::error::AppResult;
use crate::extractors::{CurrentUser, Paging};
use crate::messages;
use crate::routes::Notice;
use crate::social::Page;
use crate::state::AppState;
use crate::validation;

#[derive(Deserialize)]
pub struct MessageForm {
    pub body: String,
}

#[derive(Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages", get(inbox))
        .route("/messages/unread", get(unread))
        .route("/send_message/{username}", post(send_message))
}

/// GET /messages: opening the inbox marks everything read
async fn inbox(
    State(state): State<AppState>,
    user: CurrentUser,
    Paging(request): Paging,
) -> AppResult<Json<Page<InboxMessage>>> {
    let mut conn = state.db.get()?;
    Ok(Json(messages::open_inbox(&mut conn, user.id, request)?))
}

async fn unread(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<UnreadCount>> {
    let conn = state.db.get()?;
    Ok(Json(UnreadCount {
        unread: messages::unread_count(&conn, user.id)?,
    }))
}

/// POST /send_message/{username}
async fn send_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(recipient): Path<String>,
    Json(form): Json<MessageForm>,
) -> AppResult<Notice> {
    let body = validation::body(&form.body)?;

    let mut conn = state.db.get()?;
    messages::send_message(&mut conn, user.id, &recipient, &body, Utc::now())?;
    Ok(Notice::new(
        "Your message has been sent.",
        format!("/users/{recipient}"),
    ))
}
