use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::graphql::FeedSchema;
use crate::lang::{self, LanguageDetector};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub detector: Arc<dyn LanguageDetector>,
    pub graphql_schema: FeedSchema,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let detector = lang::from_config(&config.posts);
        Self {
            db,
            config,
            detector,
            graphql_schema: crate::graphql::build_schema(),
        }
    }
}
