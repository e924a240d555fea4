//! Follow graph, feed listings and the paging contract they share.

pub mod feed;
pub mod graph;
pub mod pagination;

pub use pagination::{Page, PageRequest};
