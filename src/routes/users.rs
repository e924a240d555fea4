use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::accounts;
use crate::db::models::{Profile, TimelinePost, User};
use crate::error::AppResult;
use crate::extractors::{CurrentUser, Paging};
use crate::routes::Notice;
use crate::social::graph::{self, UnfollowOutcome};
use crate::social::{feed, Page};
use crate::state::AppState;
use crate::validation;

#[derive(Serialize)]
pub struct ProfilePage {
    pub user: Profile,
    pub posts: Page<TimelinePost>,
}

#[derive(Deserialize)]
pub struct EditProfileForm {
    pub username: String,
    #[serde(default)]
    pub about_me: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{username}", get(user_profile))
        .route("/profile", post(edit_profile))
        .route("/follow/{username}", post(follow))
        .route("/unfollow/{username}", post(unfollow))
}

/// GET /users/{username}: profile with that user's posts
async fn user_profile(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(username): Path<String>,
    Paging(request): Paging,
) -> AppResult<Json<ProfilePage>> {
    let mut conn = state.db.get()?;
    let user = accounts::profile(&conn, viewer.id, &username)?;
    let posts = feed::profile_posts(&mut conn, user.id, request)?;
    Ok(Json(ProfilePage { user, posts }))
}

/// POST /profile: rename and/or edit "about me"
async fn edit_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(form): Json<EditProfileForm>,
) -> AppResult<Json<User>> {
    let username = validation::username(&form.username)?;
    let about_me = validation::about_me(&form.about_me)?;

    let mut conn = state.db.get()?;
    let updated = accounts::update_profile(&mut conn, user.id, &username, about_me.as_deref())?;
    Ok(Json(updated))
}

/// POST /follow/{username}
async fn follow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Notice> {
    let mut conn = state.db.get()?;
    let target = accounts::require_by_username(&conn, &username)?;
    graph::follow(&mut conn, user.id, target.id)?;

    Ok(Notice::new(
        format!("You are now following {}", target.username),
        format!("/users/{}", target.username),
    ))
}

/// POST /unfollow/{username}
async fn unfollow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Notice> {
    let mut conn = state.db.get()?;
    let target = accounts::require_by_username(&conn, &username)?;
    let notice = match graph::unfollow(&mut conn, user.id, target.id)? {
        UnfollowOutcome::Unfollowed => format!("You are no longer following {}", target.username),
        UnfollowOutcome::WasNotFollowing => {
            format!("You are not following {} yet", target.username)
        }
    };

    Ok(Notice::new(notice, format!("/users/{}", target.username)))
}
