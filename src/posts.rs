use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{Post, PostId, UserId};
use crate::db::{self, format_timestamp};
use crate::error::{CoreError, CoreResult};
use crate::lang::{self, LanguageDetector};

const POST_COLUMNS: &str = "id, body, author_id, timestamp, language";

/// Publish `body` as `author`. The stored timestamp is `now`, or the newest
/// existing post's timestamp if the clock reads earlier than that, so
/// insertion order and timestamp order never disagree.
pub fn create_post(
    conn: &mut Connection,
    detector: &dyn LanguageDetector,
    author: UserId,
    body: &str,
    now: DateTime<Utc>,
) -> CoreResult<Post> {
    let language = lang::tag(detector, body);

    let id = db::with_immediate(conn, |tx| {
        let author_exists: bool = tx.query_row(
            "SELECT COUNT(*) > 0 FROM users WHERE id = ?1",
            params![author],
            |row| row.get(0),
        )?;
        if !author_exists {
            return Err(CoreError::NotFound(format!("User #{}", author)));
        }

        let latest: Option<String> =
            tx.query_row("SELECT MAX(timestamp) FROM posts", [], |row| row.get(0))?;
        let stamp = format_timestamp(&now);
        let stamp = match latest {
            Some(latest) if latest > stamp => latest,
            _ => stamp,
        };

        tx.execute(
            "INSERT INTO posts (body, author_id, timestamp, language) VALUES (?1, ?2, ?3, ?4)",
            params![body, author, stamp, language],
        )?;
        Ok(PostId(tx.last_insert_rowid()))
    })?;

    tracing::info!(post_id = %id, %author, ?language, "Created post");
    require_post(conn, id)
}

pub fn get_post(conn: &Connection, id: PostId) -> CoreResult<Option<Post>> {
    let sql = format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS);
    Ok(conn.query_row(&sql, params![id], Post::from_row).optional()?)
}

pub fn require_post(conn: &Connection, id: PostId) -> CoreResult<Post> {
    get_post(conn, id)?.ok_or_else(|| CoreError::NotFound(format!("Post #{}", id)))
}

/// Replace the body of one of `actor`'s posts. The timestamp is kept; the
/// language tag follows the new text.
pub fn edit_post(
    conn: &mut Connection,
    detector: &dyn LanguageDetector,
    actor: UserId,
    id: PostId,
    body: &str,
) -> CoreResult<Post> {
    let language = lang::tag(detector, body);

    db::with_immediate(conn, |tx| {
        ensure_author(tx, actor, id)?;
        tx.execute(
            "UPDATE posts SET body = ?1, language = ?2 WHERE id = ?3",
            params![body, language, id],
        )?;
        Ok::<_, CoreError>(())
    })?;

    tracing::info!(post_id = %id, "Edited post");
    require_post(conn, id)
}

pub fn delete_post(conn: &mut Connection, actor: UserId, id: PostId) -> CoreResult<()> {
    db::with_immediate(conn, |tx| {
        ensure_author(tx, actor, id)?;
        tx.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        Ok::<_, CoreError>(())
    })?;

    tracing::info!(post_id = %id, "Deleted post");
    Ok(())
}

fn ensure_author(conn: &Connection, actor: UserId, id: PostId) -> CoreResult<()> {
    let author: Option<UserId> = conn
        .query_row(
            "SELECT author_id FROM posts WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    match author {
        None => Err(CoreError::NotFound(format!("Post #{}", id))),
        Some(author) if author != actor => Err(CoreError::Forbidden),
        Some(_) => Ok(()),
    }
}
