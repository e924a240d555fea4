pub mod mutations;
pub mod queries;
pub mod schema;
pub mod types;

pub use schema::{build_schema, FeedSchema};

use async_graphql::{Context, Error, Result};
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::error::CoreError;
use crate::social::PageRequest;
use crate::state::DbPool;

/// Page request for an optional `page` argument, sized from config.
pub(crate) fn page_request(ctx: &Context<'_>, page: Option<i64>) -> Result<PageRequest> {
    let config = ctx.data::<Config>()?;
    Ok(PageRequest::new(
        page.unwrap_or(1),
        config.feed.posts_per_page,
    ))
}

/// The error a GraphQL client sees. Storage failures are logged and
/// reported generically; everything else carries its own message.
pub(crate) fn client_error(err: CoreError) -> Error {
    match err {
        CoreError::Sql(_) | CoreError::Pool(_) | CoreError::Hash(_) => {
            tracing::error!("GraphQL internal error: {}", err);
            Error::new("Internal server error")
        }
        _ => Error::new(err.to_string()),
    }
}

pub(crate) fn connection(ctx: &Context<'_>) -> Result<PooledConnection<SqliteConnectionManager>> {
    ctx.data::<DbPool>()?
        .get()
        .map_err(|e| client_error(CoreError::Pool(e)))
}
