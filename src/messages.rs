//! Private messages and the per-user "last read" watermark.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};

use crate::accounts;
use crate::db::models::{InboxMessage, Message, MessageId, UserId};
use crate::db::{self, format_timestamp};
use crate::error::{CoreError, CoreResult};
use crate::social::pagination::{query_page, Page, PageRequest};

pub fn send_message(
    conn: &mut Connection,
    sender: UserId,
    recipient: &str,
    body: &str,
    now: DateTime<Utc>,
) -> CoreResult<Message> {
    let message = db::with_immediate(conn, |tx| {
        let receiver = accounts::require_by_username(tx, recipient)?;

        // Strictly after every stored message, so nothing sent after a
        // watermark was set can sort at or below it
        let latest: Option<String> =
            tx.query_row("SELECT MAX(timestamp) FROM messages", [], |row| row.get(0))?;
        let floor = latest
            .as_deref()
            .and_then(db::parse_timestamp)
            .map(|latest| latest + Duration::microseconds(1));
        let timestamp = format_timestamp(&floor.map_or(now, |floor| floor.max(now)));

        tx.execute(
            "INSERT INTO messages (sender_id, receiver_id, body, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![sender, receiver.id, body, timestamp],
        )?;
        Ok::<_, CoreError>(Message {
            id: MessageId(tx.last_insert_rowid()),
            sender_id: sender,
            receiver_id: Some(receiver.id),
            body: body.to_string(),
            timestamp: db::parse_timestamp(&timestamp).unwrap_or(now),
        })
    })?;

    tracing::info!(message_id = %message.id, %sender, "Sent message");
    Ok(message)
}

/// Messages received by `user`, newest first.
pub fn inbox(
    conn: &mut Connection,
    user: UserId,
    request: PageRequest,
) -> CoreResult<Page<InboxMessage>> {
    let tx = conn.transaction()?;
    let page = inbox_page(&tx, user, request)?;
    tx.commit()?;
    Ok(page)
}

/// Read a page of the inbox and mark everything received so far as read, as
/// one write transaction. A message committed afterwards stays unread.
pub fn open_inbox(
    conn: &mut Connection,
    user: UserId,
    request: PageRequest,
) -> CoreResult<Page<InboxMessage>> {
    db::with_immediate(conn, |tx| {
        let page = inbox_page(tx, user, request)?;
        mark_read(tx, user)?;
        Ok(page)
    })
}

fn inbox_page(
    conn: &Connection,
    user: UserId,
    request: PageRequest,
) -> CoreResult<Page<InboxMessage>> {
    Ok(query_page(
        conn,
        "m.id, m.sender_id, m.receiver_id, m.body, m.timestamp, u.username",
        "FROM messages m
         JOIN users u ON u.id = m.sender_id
         WHERE m.receiver_id = ?",
        "m.timestamp DESC, m.id ASC",
        &[&user],
        request,
        |row| {
            Ok(InboxMessage {
                message: Message {
                    id: row.get(0)?,
                    sender_id: row.get(1)?,
                    receiver_id: row.get(2)?,
                    body: row.get(3)?,
                    timestamp: db::timestamp_column(row, 4)?,
                },
                sender: row.get(5)?,
            })
        },
    )?)
}

/// Received messages newer than the watermark; all of them if `user` has
/// never opened the inbox.
pub fn unread_count(conn: &Connection, user: UserId) -> CoreResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM messages m
         JOIN users u ON u.id = m.receiver_id
         WHERE m.receiver_id = ?1
           AND (u.last_message_read_time IS NULL OR m.timestamp > u.last_message_read_time)",
        params![user],
        |row| row.get(0),
    )?)
}

/// Move `user`'s watermark up to the newest message they have received.
/// Left unset while the inbox is empty.
fn mark_read(conn: &Connection, user: UserId) -> CoreResult<()> {
    conn.execute(
        "UPDATE users
         SET last_message_read_time = (SELECT MAX(timestamp) FROM messages WHERE receiver_id = ?1)
         WHERE id = ?1
           AND EXISTS (SELECT 1 FROM messages WHERE receiver_id = ?1)",
        params![user],
    )?;
    Ok(())
}
