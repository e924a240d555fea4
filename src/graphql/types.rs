use async_graphql::*;
use chrono::{DateTime, Utc};

use crate::db::models::{Post, Profile, TimelinePost};
use crate::social::Page;

/// A post as it appears in a listing
#[derive(Clone, Debug, SimpleObject)]
pub struct PostNode {
    pub id: i64,

    /// Post text, at most 140 characters
    pub body: String,

    pub author_id: i64,

    /// Username of the author
    pub author: String,

    pub timestamp: DateTime<Utc>,

    /// Detected language code, if one was recognised
    pub language: Option<String>,
}

impl PostNode {
    pub fn from_post(post: Post, author: String) -> Self {
        Self {
            id: post.id.get(),
            body: post.body,
            author_id: post.author_id.get(),
            author,
            timestamp: post.timestamp,
            language: post.language,
        }
    }
}

impl From<TimelinePost> for PostNode {
    fn from(entry: TimelinePost) -> Self {
        Self::from_post(entry.post, entry.author)
    }
}

/// One page of posts, newest first
#[derive(Clone, Debug, SimpleObject)]
pub struct PostPage {
    pub items: Vec<PostNode>,

    /// One-based page number
    pub page: u32,

    pub per_page: u32,

    /// Number of posts across all pages
    pub total: u64,

    pub has_next: bool,
    pub has_prev: bool,
    pub next_num: Option<u32>,
    pub prev_num: Option<u32>,
}

impl From<Page<TimelinePost>> for PostPage {
    fn from(page: Page<TimelinePost>) -> Self {
        let page = page.map(PostNode::from);
        Self {
            items: page.items,
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            has_next: page.has_next,
            has_prev: page.has_prev,
            next_num: page.next_num,
            prev_num: page.prev_num,
        }
    }
}

/// A user's public profile, seen by the signed-in user
#[derive(Clone, Debug, SimpleObject)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub about_me: Option<String>,
    pub last_seen: DateTime<Utc>,

    /// Number of users following this user
    pub followers: i64,

    /// Number of users this user follows
    pub following: i64,

    /// Whether the signed-in user follows this user
    pub followed_by_viewer: bool,

    /// Whether this is the signed-in user's own profile
    pub is_viewer: bool,
}

impl From<Profile> for UserProfile {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id.get(),
            username: profile.username,
            about_me: profile.about_me,
            last_seen: profile.last_seen,
            followers: profile.followers,
            following: profile.following,
            followed_by_viewer: profile.followed_by_viewer,
            is_viewer: profile.is_viewer,
        }
    }
}

/// Result of a follow or unfollow
#[derive(SimpleObject)]
pub struct FollowResult {
    /// Whether the graph now matches what was asked for
    pub success: bool,

    /// Message describing the result
    pub message: String,

    /// The target's profile after the change
    pub user: Option<UserProfile>,
}
