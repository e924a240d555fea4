use std::sync::Arc;

use async_graphql::*;
use chrono::Utc;

use crate::accounts;
use crate::extractors::CurrentUser;
use crate::graphql::types::{FollowResult, PostNode};
use crate::graphql::{client_error, connection};
use crate::lang::LanguageDetector;
use crate::posts;
use crate::social::graph::{self, FollowOutcome, UnfollowOutcome};
use crate::validation;

/// GraphQL Mutation root
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Follow a user. Following someone already followed succeeds unchanged.
    async fn follow(&self, ctx: &Context<'_>, username: String) -> Result<FollowResult> {
        let viewer = ctx.data::<CurrentUser>()?;
        let mut conn = connection(ctx)?;
        let target = accounts::require_by_username(&conn, &username).map_err(client_error)?;

        let message = match graph::follow(&mut conn, viewer.id, target.id).map_err(client_error)? {
            FollowOutcome::Followed => format!("You are now following {}", target.username),
            FollowOutcome::AlreadyFollowing => {
                format!("You are already following {}", target.username)
            }
        };
        let profile =
            accounts::profile(&conn, viewer.id, &target.username).map_err(client_error)?;

        Ok(FollowResult {
            success: true,
            message,
            user: Some(profile.into()),
        })
    }

    /// Stop following a user
    async fn unfollow(&self, ctx: &Context<'_>, username: String) -> Result<FollowResult> {
        let viewer = ctx.data::<CurrentUser>()?;
        let mut conn = connection(ctx)?;
        let target = accounts::require_by_username(&conn, &username).map_err(client_error)?;

        let message = match graph::unfollow(&mut conn, viewer.id, target.id).map_err(client_error)? {
            UnfollowOutcome::Unfollowed => {
                format!("You are no longer following {}", target.username)
            }
            UnfollowOutcome::WasNotFollowing => {
                format!("You are not following {} yet", target.username)
            }
        };
        let profile =
            accounts::profile(&conn, viewer.id, &target.username).map_err(client_error)?;

        Ok(FollowResult {
            success: true,
            message,
            user: Some(profile.into()),
        })
    }

    /// Publish a post as the signed-in user
    async fn create_post(&self, ctx: &Context<'_>, body: String) -> Result<PostNode> {
        let viewer = ctx.data::<CurrentUser>()?;
        let detector = ctx.data::<Arc<dyn LanguageDetector>>()?;
        let body = validation::body(&body).map_err(client_error)?;

        let mut conn = connection(ctx)?;
        let post = posts::create_post(&mut conn, detector.as_ref(), viewer.id, &body, Utc::now())
            .map_err(client_error)?;
        Ok(PostNode::from_post(post, viewer.username.clone()))
    }
}
