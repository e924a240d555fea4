use async_graphql::{EmptySubscription, Schema};

use super::mutations::MutationRoot;
use super::queries::QueryRoot;

/// GraphQL Schema type
pub type FeedSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the GraphQL schema
///
/// Resolvers expect the request to carry a `DbPool`, the `Config`, the
/// `Arc<dyn LanguageDetector>` and the caller's `CurrentUser` as data.
pub fn build_schema() -> FeedSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription).finish()
}
