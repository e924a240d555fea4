use async_graphql::*;

use crate::accounts;
use crate::extractors::CurrentUser;
use crate::graphql::types::{PostPage, UserProfile};
use crate::graphql::{client_error, connection, page_request};
use crate::messages;
use crate::social::feed;

/// GraphQL Query root
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// The signed-in user's own profile
    async fn me(&self, ctx: &Context<'_>) -> Result<UserProfile> {
        let viewer = ctx.data::<CurrentUser>()?;
        let conn = connection(ctx)?;
        let profile =
            accounts::profile(&conn, viewer.id, &viewer.username).map_err(client_error)?;
        Ok(profile.into())
    }

    /// Home feed: own posts plus posts by followed users
    async fn feed(&self, ctx: &Context<'_>, page: Option<i64>) -> Result<PostPage> {
        let viewer = ctx.data::<CurrentUser>()?;
        let request = page_request(ctx, page)?;
        let mut conn = connection(ctx)?;
        let page = feed::followed_posts(&mut conn, viewer.id, request).map_err(client_error)?;
        Ok(page.into())
    }

    /// Every post on the site
    async fn explore(&self, ctx: &Context<'_>, page: Option<i64>) -> Result<PostPage> {
        let request = page_request(ctx, page)?;
        let mut conn = connection(ctx)?;
        let page = feed::explore_posts(&mut conn, request).map_err(client_error)?;
        Ok(page.into())
    }

    /// Look up a user by name; null if there is no such user
    async fn user(&self, ctx: &Context<'_>, username: String) -> Result<Option<UserProfile>> {
        let viewer = ctx.data::<CurrentUser>()?;
        let conn = connection(ctx)?;
        if accounts::find_by_username(&conn, &username)
            .map_err(client_error)?
            .is_none()
        {
            return Ok(None);
        }
        let profile = accounts::profile(&conn, viewer.id, &username).map_err(client_error)?;
        Ok(Some(profile.into()))
    }

    /// Posts written by one user
    async fn user_posts(
        &self,
        ctx: &Context<'_>,
        username: String,
        page: Option<i64>,
    ) -> Result<PostPage> {
        let request = page_request(ctx, page)?;
        let mut conn = connection(ctx)?;
        let author = accounts::require_by_username(&conn, &username).map_err(client_error)?;
        let page = feed::profile_posts(&mut conn, author.id, request).map_err(client_error)?;
        Ok(page.into())
    }

    /// Full-text search over post bodies
    async fn search(&self, ctx: &Context<'_>, query: String, page: Option<i64>) -> Result<PostPage> {
        let request = page_request(ctx, page)?;
        let mut conn = connection(ctx)?;
        let page = feed::search_posts(&mut conn, &query, request).map_err(client_error)?;
        Ok(page.into())
    }

    /// Messages received since the inbox was last opened
    async fn unread_messages(&self, ctx: &Context<'_>) -> Result<i64> {
        let viewer = ctx.data::<CurrentUser>()?;
        let conn = connection(ctx)?;
        messages::unread_count(&conn, viewer.id).map_err(client_error)
    }
}
