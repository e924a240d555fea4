//! User store: registration, credentials and profile fields.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{Profile, User, UserId};
use crate::db::{self, format_timestamp};
use crate::error::{CoreError, CoreResult};
use crate::social::graph;

/// Already shape-validated registration input.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub fn hash_password(password: &str, cost: u32) -> CoreResult<String> {
    Ok(bcrypt::hash(password, cost)?)
}

pub fn verify_password(user: &User, password: &str) -> bool {
    bcrypt::verify(password, &user.password_hash).unwrap_or(false)
}

/// Create a user. Username and email uniqueness is checked inside the write
/// transaction, and a constraint violation from a racing insert is reported
/// the same way.
pub fn register(
    conn: &mut Connection,
    new_user: &NewUser,
    bcrypt_cost: u32,
    now: DateTime<Utc>,
) -> CoreResult<User> {
    // Hash outside the write lock
    let password_hash = hash_password(&new_user.password, bcrypt_cost)?;

    let id = db::with_immediate(conn, |tx| {
        if username_taken(tx, &new_user.username, None)? {
            return Err(CoreError::Conflict("Username is already taken".into()));
        }
        if email_taken(tx, &new_user.email)? {
            return Err(CoreError::Conflict("Email is already taken".into()));
        }

        tx.execute(
            "INSERT INTO users (username, email, password_hash, last_seen)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                new_user.username,
                new_user.email,
                password_hash,
                format_timestamp(&now)
            ],
        )
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                CoreError::Conflict("Username or email is already taken".into())
            } else {
                CoreError::Sql(e)
            }
        })?;

        Ok(UserId(tx.last_insert_rowid()))
    })?;

    tracing::info!(user_id = %id, username = %new_user.username, "Registered user");
    require_by_id(conn, id)
}

/// Look up a user by name and check the password. `None` for either an
/// unknown user or a wrong password.
pub fn authenticate(conn: &Connection, username: &str, password: &str) -> CoreResult<Option<User>> {
    Ok(find_by_username(conn, username)?.filter(|user| verify_password(user, password)))
}

pub fn find_by_username(conn: &Connection, username: &str) -> CoreResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE username = ?1", User::COLUMNS);
    Ok(conn
        .query_row(&sql, params![username], User::from_row)
        .optional()?)
}

pub fn find_by_id(conn: &Connection, id: UserId) -> CoreResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", User::COLUMNS);
    Ok(conn.query_row(&sql, params![id], User::from_row).optional()?)
}

pub fn require_by_username(conn: &Connection, username: &str) -> CoreResult<User> {
    find_by_username(conn, username)?
        .ok_or_else(|| CoreError::NotFound(format!("User {}", username)))
}

pub fn require_by_id(conn: &Connection, id: UserId) -> CoreResult<User> {
    find_by_id(conn, id)?.ok_or_else(|| CoreError::NotFound(format!("User #{}", id)))
}

/// Rename and/or rewrite the about-me text of `actor`.
pub fn update_profile(
    conn: &mut Connection,
    actor: UserId,
    username: &str,
    about_me: Option<&str>,
) -> CoreResult<User> {
    db::with_immediate(conn, |tx| {
        if username_taken(tx, username, Some(actor))? {
            return Err(CoreError::Conflict("Username is already taken".into()));
        }

        let updated = tx
            .execute(
                "UPDATE users SET username = ?1, about_me = ?2 WHERE id = ?3",
                params![username, about_me, actor],
            )
            .map_err(|e| {
                if db::is_unique_violation(&e) {
                    CoreError::Conflict("Username is already taken".into())
                } else {
                    CoreError::Sql(e)
                }
            })?;
        if updated == 0 {
            return Err(CoreError::NotFound(format!("User #{}", actor)));
        }
        Ok(())
    })?;

    tracing::info!(user_id = %actor, "Updated profile");
    require_by_id(conn, actor)
}

pub fn touch_last_seen(conn: &Connection, actor: UserId, now: DateTime<Utc>) -> CoreResult<()> {
    conn.execute(
        "UPDATE users SET last_seen = ?1 WHERE id = ?2",
        params![format_timestamp(&now), actor],
    )?;
    Ok(())
}

/// Public profile of `username` as seen by `viewer`.
pub fn profile(conn: &Connection, viewer: UserId, username: &str) -> CoreResult<Profile> {
    let user = require_by_username(conn, username)?;
    let counts = graph::follow_counts(conn, user.id)?;
    let followed_by_viewer = graph::is_following(conn, viewer, user.id)?;

    Ok(Profile {
        id: user.id,
        username: user.username,
        about_me: user.about_me,
        last_seen: user.last_seen,
        followers: counts.followers,
        following: counts.following,
        followed_by_viewer,
        is_viewer: viewer == user.id,
    })
}

fn username_taken(conn: &Connection, username: &str, except: Option<UserId>) -> CoreResult<bool> {
    let owner: Option<UserId> = conn
        .query_row(
            "SELECT id FROM users WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )
        .optional()?;
    Ok(matches!(owner, Some(id) if Some(id) != except))
}

fn email_taken(conn: &Connection, email: &str) -> CoreResult<bool> {
    Ok(conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;

    // Minimum bcrypt cost keeps the tests fast
    const COST: u32 = 4;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: "hunter2".to_string(),
        }
    }

    fn user_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn register_hashes_password() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();

        let user = register(&mut conn, &new_user("alice", "alice@example.com"), COST, Utc::now())
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "hunter2");
        assert!(verify_password(&user, "hunter2"));
        assert!(!verify_password(&user, "hunter3"));
        assert!(user.last_message_read_time.is_none());
    }

    #[test]
    fn duplicate_email_is_rejected_without_creating_a_row() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();

        register(&mut conn, &new_user("alice", "shared@example.com"), COST, Utc::now()).unwrap();
        let err = register(&mut conn, &new_user("bob", "shared@example.com"), COST, Utc::now())
            .unwrap_err();

        assert!(matches!(err, CoreError::Conflict(ref msg) if msg.contains("Email")));
        assert_eq!(user_count(&conn), 1);
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();

        register(&mut conn, &new_user("alice", "a1@example.com"), COST, Utc::now()).unwrap();
        let err = register(&mut conn, &new_user("alice", "a2@example.com"), COST, Utc::now())
            .unwrap_err();

        assert!(matches!(err, CoreError::Conflict(ref msg) if msg.contains("Username")));
        assert_eq!(user_count(&conn), 1);
    }

    #[test]
    fn authenticate_checks_password() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();
        register(&mut conn, &new_user("alice", "alice@example.com"), COST, Utc::now()).unwrap();

        assert!(authenticate(&conn, "alice", "hunter2").unwrap().is_some());
        assert!(authenticate(&conn, "alice", "wrong").unwrap().is_none());
        assert!(authenticate(&conn, "nobody", "hunter2").unwrap().is_none());
    }

    #[test]
    fn update_profile_renames_and_sets_about_me() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();
        let alice =
            register(&mut conn, &new_user("alice", "alice@example.com"), COST, Utc::now()).unwrap();

        let updated = update_profile(&mut conn, alice.id, "alice2", Some("hi there")).unwrap();
        assert_eq!(updated.username, "alice2");
        assert_eq!(updated.about_me.as_deref(), Some("hi there"));

        // Keeping one's own name is not a conflict
        update_profile(&mut conn, alice.id, "alice2", None).unwrap();
    }

    #[test]
    fn update_profile_rejects_taken_username() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();
        let alice =
            register(&mut conn, &new_user("alice", "alice@example.com"), COST, Utc::now()).unwrap();
        register(&mut conn, &new_user("bob", "bob@example.com"), COST, Utc::now()).unwrap();

        let err = update_profile(&mut conn, alice.id, "bob", None).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert_eq!(require_by_id(&conn, alice.id).unwrap().username, "alice");
    }

    #[test]
    fn touch_last_seen_moves_timestamp() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();
        let start = Utc::now() - chrono::Duration::hours(1);
        let alice =
            register(&mut conn, &new_user("alice", "alice@example.com"), COST, start).unwrap();
        assert_eq!(alice.last_seen, db::parse_timestamp(&format_timestamp(&start)).unwrap());

        let later = Utc::now();
        touch_last_seen(&conn, alice.id, later).unwrap();
        let reloaded = require_by_id(&conn, alice.id).unwrap();
        assert!(reloaded.last_seen > alice.last_seen);
    }

    #[test]
    fn profile_reports_counts_and_viewer_relationship() {
        let (pool, _tmp) = test_pool();
        let mut conn = pool.get().unwrap();
        let alice =
            register(&mut conn, &new_user("alice", "alice@example.com"), COST, Utc::now()).unwrap();
        let bob =
            register(&mut conn, &new_user("bob", "bob@example.com"), COST, Utc::now()).unwrap();
        graph::follow(&mut conn, alice.id, bob.id).unwrap();

        let seen_by_alice = profile(&conn, alice.id, "bob").unwrap();
        assert_eq!(seen_by_alice.followers, 1);
        assert_eq!(seen_by_alice.following, 0);
        assert!(seen_by_alice.followed_by_viewer);
        assert!(!seen_by_alice.is_viewer);

        let own = profile(&conn, bob.id, "bob").unwrap();
        assert!(own.is_viewer);
        assert!(!own.followed_by_viewer);

        assert!(matches!(
            profile(&conn, alice.id, "nobody"),
            Err(CoreError::NotFound(_))
        ));
    }
}
