//! The follow graph: directed follower → followed edges kept in their own
//! relation, with a composite primary key so both directions are indexed and
//! a pair can only appear once.

use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::db::{self, models::UserId};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowOutcome {
    Followed,
    /// The edge already existed; nothing changed.
    AlreadyFollowing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnfollowOutcome {
    Unfollowed,
    /// There was no edge to remove; nothing changed.
    WasNotFollowing,
}

impl UnfollowOutcome {
    pub fn was_following(self) -> bool {
        self == UnfollowOutcome::Unfollowed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FollowCounts {
    pub followers: i64,
    pub following: i64,
}

pub fn is_following(conn: &Connection, follower: UserId, followed: UserId) -> CoreResult<bool> {
    Ok(conn.query_row(
        "SELECT COUNT(*) > 0 FROM followers WHERE follower_id = ?1 AND followed_id = ?2",
        params![follower, followed],
        |row| row.get(0),
    )?)
}

/// Add the edge `follower → followed`. Following someone twice is a silent
/// success: the insert is a no-op under the pair's uniqueness constraint, so
/// concurrent calls cannot produce a second edge or surface a constraint error.
pub fn follow(conn: &mut Connection, follower: UserId, followed: UserId) -> CoreResult<FollowOutcome> {
    if follower == followed {
        return Err(CoreError::SelfReference("follow"));
    }

    let outcome = db::with_immediate(conn, |tx| {
        ensure_user_exists(tx, followed)?;
        let inserted = tx.execute(
            "INSERT INTO followers (follower_id, followed_id) VALUES (?1, ?2)
             ON CONFLICT (follower_id, followed_id) DO NOTHING",
            params![follower, followed],
        )?;
        Ok::<_, CoreError>(if inserted == 1 {
            FollowOutcome::Followed
        } else {
            FollowOutcome::AlreadyFollowing
        })
    })?;

    tracing::info!(%follower, %followed, ?outcome, "follow");
    Ok(outcome)
}

/// Remove the edge `follower → followed`, reporting whether it existed.
pub fn unfollow(
    conn: &mut Connection,
    follower: UserId,
    followed: UserId,
) -> CoreResult<UnfollowOutcome> {
    if follower == followed {
        return Err(CoreError::SelfReference("unfollow"));
    }

    let outcome = db::with_immediate(conn, |tx| {
        ensure_user_exists(tx, followed)?;
        let removed = tx.execute(
            "DELETE FROM followers WHERE follower_id = ?1 AND followed_id = ?2",
            params![follower, followed],
        )?;
        Ok::<_, CoreError>(if removed == 1 {
            UnfollowOutcome::Unfollowed
        } else {
            UnfollowOutcome::WasNotFollowing
        })
    })?;

    tracing::info!(%follower, %followed, ?outcome, "unfollow");
    Ok(outcome)
}

/// Everyone `user` follows. Does not include `user`.
pub fn followed_set(conn: &Connection, user: UserId) -> CoreResult<BTreeSet<UserId>> {
    collect_ids(
        conn,
        "SELECT followed_id FROM followers WHERE follower_id = ?1",
        user,
    )
}

/// Everyone following `user`.
pub fn followers_set(conn: &Connection, user: UserId) -> CoreResult<BTreeSet<UserId>> {
    collect_ids(
        conn,
        "SELECT follower_id FROM followers WHERE followed_id = ?1",
        user,
    )
}

pub fn follow_counts(conn: &Connection, user: UserId) -> CoreResult<FollowCounts> {
    Ok(conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM followers WHERE followed_id = ?1),
            (SELECT COUNT(*) FROM followers WHERE follower_id = ?1)",
        params![user],
        |row| {
            Ok(FollowCounts {
                followers: row.get(0)?,
                following: row.get(1)?,
            })
        },
    )?)
}

fn ensure_user_exists(conn: &Connection, id: UserId) -> CoreResult<()> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(CoreError::NotFound(format!("User #{}", id)))
    }
}

fn collect_ids(conn: &Connection, sql: &str, user: UserId) -> CoreResult<BTreeSet<UserId>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map(params![user], |row| row.get(0))?
        .collect::<Result<BTreeSet<UserId>, _>>()?;
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{insert_user, test_pool};

    fn edge_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM followers", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn nobody_follows_themselves() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();
        let a = insert_user(&conn, "alice");

        assert!(!is_following(&conn, a, a).unwrap());
        assert!(matches!(
            follow(&mut conn, a, a),
            Err(CoreError::SelfReference("follow"))
        ));
        assert!(matches!(
            unfollow(&mut conn, a, a),
            Err(CoreError::SelfReference("unfollow"))
        ));
        assert_eq!(edge_count(&conn), 0);
    }

    #[test]
    fn follow_is_idempotent() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();
        let a = insert_user(&conn, "alice");
        let b = insert_user(&conn, "bob");

        assert_eq!(follow(&mut conn, a, b).unwrap(), FollowOutcome::Followed);
        assert_eq!(
            follow(&mut conn, a, b).unwrap(),
            FollowOutcome::AlreadyFollowing
        );
        assert_eq!(edge_count(&conn), 1);
        assert!(is_following(&conn, a, b).unwrap());
        assert!(!is_following(&conn, b, a).unwrap());
    }

    #[test]
    fn unfollow_inverts_follow_and_reports_missing_edge() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();
        let a = insert_user(&conn, "alice");
        let b = insert_user(&conn, "bob");

        follow(&mut conn, a, b).unwrap();
        let first = unfollow(&mut conn, a, b).unwrap();
        assert!(first.was_following());
        assert_eq!(edge_count(&conn), 0);

        let second = unfollow(&mut conn, a, b).unwrap();
        assert_eq!(second, UnfollowOutcome::WasNotFollowing);
        assert_eq!(edge_count(&conn), 0);
    }

    #[test]
    fn unknown_target_is_not_found() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();
        let a = insert_user(&conn, "alice");

        assert!(matches!(
            follow(&mut conn, a, UserId(999)),
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            unfollow(&mut conn, a, UserId(999)),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn sets_and_counts_follow_both_directions() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();
        let a = insert_user(&conn, "alice");
        let b = insert_user(&conn, "bob");
        let c = insert_user(&conn, "carol");

        follow(&mut conn, a, b).unwrap();
        follow(&mut conn, a, c).unwrap();
        follow(&mut conn, c, a).unwrap();

        assert_eq!(
            followed_set(&conn, a).unwrap(),
            [b, c].into_iter().collect::<BTreeSet<_>>()
        );
        assert_eq!(
            followers_set(&conn, a).unwrap(),
            [c].into_iter().collect::<BTreeSet<_>>()
        );
        assert!(followed_set(&conn, b).unwrap().is_empty());

        let counts = follow_counts(&conn, a).unwrap();
        assert_eq!(counts, FollowCounts { followers: 1, following: 2 });
    }

    #[test]
    fn concurrent_follows_leave_one_edge() {
        let (pool, _tmp) = test_pool();
        let (a, b) = {
            let conn = pool.get().unwrap();
            (insert_user(&conn, "alice"), insert_user(&conn, "bob"))
        };

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    let mut conn = pool.get().unwrap();
                    follow(&mut conn, a, b).unwrap()
                })
            })
            .collect();
        let outcomes: Vec<FollowOutcome> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(
            outcomes
                .iter()
                .filter(|o| **o == FollowOutcome::Followed)
                .count(),
            1
        );
        assert_eq!(edge_count(&pool.get().unwrap()), 1);
    }
}
