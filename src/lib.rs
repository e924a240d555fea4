// Library exports for Warbler
// This allows integration tests and external code to use Warbler modules

pub mod accounts;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod graphql;
pub mod lang;
pub mod messages;
pub mod posts;
pub mod routes;
pub mod social;
pub mod state;
pub mod validation;
