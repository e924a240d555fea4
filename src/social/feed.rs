//! Post listings: home feed, profile, explore and search.
//!
//! Every listing orders by `timestamp DESC, id ASC` and is paged with
//! [`fetch_page`], so the same navigation rules apply everywhere.

use rusqlite::types::ToSql;
use rusqlite::Connection;

use crate::db::models::{Post, TimelinePost, UserId};
use crate::error::CoreResult;
use crate::social::pagination::{fetch_page, Page, PageRequest};

const COLUMNS: &str = "p.id, p.body, p.author_id, p.timestamp, p.language, u.username";
const ORDER: &str = "p.timestamp DESC, p.id ASC";

fn timeline_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TimelinePost> {
    Ok(TimelinePost {
        post: Post::from_row(row)?,
        author: row.get(5)?,
    })
}

fn list(
    conn: &mut Connection,
    from_where: &str,
    params: &[&dyn ToSql],
    request: PageRequest,
) -> CoreResult<Page<TimelinePost>> {
    Ok(fetch_page(
        conn,
        COLUMNS,
        from_where,
        ORDER,
        params,
        request,
        timeline_row,
    )?)
}

/// Home feed: posts by `user` and by everyone `user` follows.
pub fn followed_posts(
    conn: &mut Connection,
    user: UserId,
    request: PageRequest,
) -> CoreResult<Page<TimelinePost>> {
    list(
        conn,
        "FROM posts p
         JOIN users u ON u.id = p.author_id
         WHERE p.author_id = ?
            OR p.author_id IN (SELECT followed_id FROM followers WHERE follower_id = ?)",
        &[&user, &user],
        request,
    )
}

/// Posts written by `author` alone.
pub fn profile_posts(
    conn: &mut Connection,
    author: UserId,
    request: PageRequest,
) -> CoreResult<Page<TimelinePost>> {
    list(
        conn,
        "FROM posts p
         JOIN users u ON u.id = p.author_id
         WHERE p.author_id = ?",
        &[&author],
        request,
    )
}

/// Every post.
pub fn explore_posts(conn: &mut Connection, request: PageRequest) -> CoreResult<Page<TimelinePost>> {
    list(
        conn,
        "FROM posts p
         JOIN users u ON u.id = p.author_id",
        &[],
        request,
    )
}

/// Full-text search over post bodies. Every word of `query` must appear.
pub fn search_posts(
    conn: &mut Connection,
    query: &str,
    request: PageRequest,
) -> CoreResult<Page<TimelinePost>> {
    let Some(expr) = match_expression(query) else {
        return Ok(Page::from_parts(Vec::new(), request, 0));
    };

    list(
        conn,
        "FROM posts p
         JOIN users u ON u.id = p.author_id
         WHERE p.id IN (SELECT rowid FROM posts_fts WHERE posts_fts MATCH ?)",
        &[&expr],
        request,
    )
}

/// Turn free text into an FTS5 expression of quoted terms, so user input can
/// never be parsed as query syntax. `None` when nothing searchable remains.
fn match_expression(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t.to_lowercase()))
        .collect();
    (!terms.is_empty()).then(|| terms.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{insert_post_at, insert_user, test_pool};
    use crate::social::graph;

    fn bodies(page: &Page<TimelinePost>) -> Vec<&str> {
        page.items.iter().map(|p| p.post.body.as_str()).collect()
    }

    #[test]
    fn feed_includes_self_and_followed_only() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();
        let a = insert_user(&conn, "alice");
        let b = insert_user(&conn, "bob");
        let c = insert_user(&conn, "carol");
        insert_post_at(&conn, a, "from alice", "2024-01-01T00:00:01.000000Z");
        insert_post_at(&conn, b, "from bob", "2024-01-01T00:00:02.000000Z");
        insert_post_at(&conn, c, "from carol", "2024-01-01T00:00:03.000000Z");

        let alone = followed_posts(&mut conn, a, PageRequest::new(1, 10)).unwrap();
        assert_eq!(bodies(&alone), vec!["from alice"]);

        graph::follow(&mut conn, a, b).unwrap();
        let page = followed_posts(&mut conn, a, PageRequest::new(1, 10)).unwrap();
        assert_eq!(bodies(&page), vec!["from bob", "from alice"]);
        assert_eq!(page.items[0].author, "bob");
    }

    #[test]
    fn equal_timestamps_break_ties_by_id() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();
        let a = insert_user(&conn, "alice");
        let ts = "2024-01-01T00:00:00.000000Z";
        let first = insert_post_at(&conn, a, "first", ts);
        let second = insert_post_at(&conn, a, "second", ts);
        insert_post_at(&conn, a, "newest", "2024-01-02T00:00:00.000000Z");

        let page = explore_posts(&mut conn, PageRequest::new(1, 10)).unwrap();
        assert_eq!(bodies(&page), vec!["newest", "first", "second"]);
        assert!(first < second);
    }

    #[test]
    fn profile_posts_are_single_author() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();
        let a = insert_user(&conn, "alice");
        let b = insert_user(&conn, "bob");
        insert_post_at(&conn, a, "mine", "2024-01-01T00:00:01.000000Z");
        insert_post_at(&conn, b, "theirs", "2024-01-01T00:00:02.000000Z");
        graph::follow(&mut conn, a, b).unwrap();

        let page = profile_posts(&mut conn, a, PageRequest::new(1, 10)).unwrap();
        assert_eq!(bodies(&page), vec!["mine"]);
        assert_eq!(page.total, 1);
    }

    #[test]
    fn pages_partition_the_listing() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();
        let a = insert_user(&conn, "alice");
        for i in 0..7 {
            insert_post_at(
                &conn,
                a,
                &format!("post {}", i),
                &format!("2024-01-01T00:00:0{}.000000Z", i),
            );
        }

        let p1 = explore_posts(&mut conn, PageRequest::new(1, 3)).unwrap();
        let p2 = explore_posts(&mut conn, PageRequest::new(2, 3)).unwrap();
        let p3 = explore_posts(&mut conn, PageRequest::new(3, 3)).unwrap();
        let p4 = explore_posts(&mut conn, PageRequest::new(4, 3)).unwrap();

        assert_eq!(bodies(&p1), vec!["post 6", "post 5", "post 4"]);
        assert_eq!(bodies(&p2), vec!["post 3", "post 2", "post 1"]);
        assert_eq!(bodies(&p3), vec!["post 0"]);
        assert!(p1.has_next && p2.has_next && !p3.has_next);
        assert!(p4.items.is_empty());
        assert!(!p4.has_next);
        assert_eq!(p4.total, 7);
    }

    #[test]
    fn search_matches_all_terms() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();
        let a = insert_user(&conn, "alice");
        insert_post_at(&conn, a, "Rust is great", "2024-01-01T00:00:01.000000Z");
        insert_post_at(&conn, a, "rust never sleeps", "2024-01-01T00:00:02.000000Z");
        insert_post_at(&conn, a, "Python is great", "2024-01-01T00:00:03.000000Z");

        let rust = search_posts(&mut conn, "RUST", PageRequest::new(1, 10)).unwrap();
        assert_eq!(bodies(&rust), vec!["rust never sleeps", "Rust is great"]);

        let both = search_posts(&mut conn, "great rust", PageRequest::new(1, 10)).unwrap();
        assert_eq!(bodies(&both), vec!["Rust is great"]);
    }

    #[test]
    fn search_sees_edits_and_deletes() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();
        let a = insert_user(&conn, "alice");
        let id = insert_post_at(&conn, a, "old words", "2024-01-01T00:00:01.000000Z");

        conn.execute(
            "UPDATE posts SET body = 'new words' WHERE id = ?1",
            rusqlite::params![id],
        )
        .unwrap();
        assert_eq!(
            search_posts(&mut conn, "old", PageRequest::new(1, 10))
                .unwrap()
                .total,
            0
        );
        assert_eq!(
            search_posts(&mut conn, "new", PageRequest::new(1, 10))
                .unwrap()
                .total,
            1
        );

        conn.execute("DELETE FROM posts WHERE id = ?1", rusqlite::params![id])
            .unwrap();
        assert_eq!(
            search_posts(&mut conn, "new", PageRequest::new(1, 10))
                .unwrap()
                .total,
            0
        );
    }

    #[test]
    fn search_input_is_not_query_syntax() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();
        let a = insert_user(&conn, "alice");
        insert_post_at(&conn, a, "hello world", "2024-01-01T00:00:01.000000Z");

        let page = search_posts(&mut conn, "hello OR \"* NEAR(", PageRequest::new(1, 10)).unwrap();
        assert_eq!(page.total, 0);
        let blank = search_posts(&mut conn, "  ?! ", PageRequest::new(1, 10)).unwrap();
        assert!(blank.items.is_empty());
        assert!(!blank.has_next);
    }

    #[test]
    fn match_expression_quotes_terms() {
        assert_eq!(
            match_expression("Hello, World!").as_deref(),
            Some("\"hello\" \"world\"")
        );
        assert_eq!(match_expression("..."), None);
    }
}
