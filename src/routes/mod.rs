pub mod auth;
pub mod graphql;
pub mod home;
pub mod messages;
pub mod posts;
pub mod users;

use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The user-visible outcome of a mutation, plus where a browser client
/// should go next.
#[derive(Debug, Serialize)]
pub struct Notice {
    pub notice: String,
    pub redirect: String,
}

impl Notice {
    pub fn new(notice: impl Into<String>, redirect: impl Into<String>) -> Self {
        Self {
            notice: notice.into(),
            redirect: redirect.into(),
        }
    }
}

impl IntoResponse for Notice {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// The full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(home::router())
        .merge(auth::router())
        .merge(posts::router())
        .merge(users::router())
        .merge(messages::router())
        .merge(graphql::router())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
