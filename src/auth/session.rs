use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::UserId;
use crate::error::CoreResult;

/// Create a new session for a user. Returns the session token.
pub fn create_session(conn: &Connection, user_id: UserId, hours: u64) -> CoreResult<String> {
    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// The user owning an unexpired session `token`.
pub fn session_user(conn: &Connection, token: &str) -> CoreResult<Option<(UserId, String)>> {
    Ok(conn
        .query_row(
            "SELECT u.id, u.username FROM sessions s \
             JOIN users u ON u.id = s.user_id \
             WHERE s.token = ?1 AND s.expires_at > datetime('now')",
            params![token],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?)
}

/// Delete a session by token.
pub fn delete_session(conn: &Connection, token: &str) -> CoreResult<()> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
