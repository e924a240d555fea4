use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row identifiers. Integer keys so ascending id equals insertion order.
macro_rules! row_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                self.0.to_sql()
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map($name)
            }
        }
    };
}

row_id!(UserId);
row_id!(PostId);
row_id!(MessageId);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub about_me: Option<String>,
    pub last_seen: DateTime<Utc>,
    pub last_message_read_time: Option<DateTime<Utc>>,
}

impl User {
    pub const COLUMNS: &'static str =
        "id, username, email, password_hash, about_me, last_seen, last_message_read_time";

    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            about_me: row.get(4)?,
            last_seen: super::timestamp_column(row, 5)?,
            last_message_read_time: super::optional_timestamp_column(row, 6)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub body: String,
    pub author_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub language: Option<String>,
}

impl Post {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Post {
            id: row.get(0)?,
            body: row.get(1)?,
            author_id: row.get(2)?,
            timestamp: super::timestamp_column(row, 3)?,
            language: row.get(4)?,
        })
    }
}

/// A post joined with its author's username, as listed in feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePost {
    #[serde(flatten)]
    pub post: Post,
    pub author: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: Option<UserId>,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxMessage {
    #[serde(flatten)]
    pub message: Message,
    pub sender: String,
}

/// Public view of a user, with follow-graph counts relative to a viewer.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: UserId,
    pub username: String,
    pub about_me: Option<String>,
    pub last_seen: DateTime<Utc>,
    pub followers: i64,
    pub following: i64,
    pub followed_by_viewer: bool,
    pub is_viewer: bool,
}
