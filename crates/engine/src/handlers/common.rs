//! Shared guards for command handlers
//!
//! Handlers express their preconditions by chaining these with `?`; each
//! failure maps to a stable wire code through `DomainError`.

use plaza_domain::{DomainError, UserId};

use crate::connections::{ConnectionId, ConnectionInfo, CurrentRoom};
use crate::state::AppState;

/// Snapshot the caller's connection; gone means the socket closed while the
/// command was in flight.
pub async fn connection(
    state: &AppState,
    connection_id: ConnectionId,
) -> Result<ConnectionInfo, DomainError> {
    state
        .connections
        .get(connection_id)
        .await
        .ok_or_else(|| DomainError::protocol("connection closed"))
}

/// The caller must have authenticated on this connection.
pub fn require_identity(conn: &ConnectionInfo) -> Result<(UserId, String), DomainError> {
    match (conn.user_id, &conn.username) {
        (Some(user_id), Some(username)) => Ok((user_id, username.clone())),
        _ => Err(DomainError::authorization("authenticate first")),
    }
}

pub fn require_role(conn: &ConnectionInfo, role: &str) -> Result<(), DomainError> {
    if conn.has_role(role) {
        Ok(())
    } else {
        Err(DomainError::authorization(format!(
            "requires the {role} role"
        )))
    }
}

/// The caller must currently be in a room.
pub fn require_room(conn: &ConnectionInfo) -> Result<CurrentRoom, DomainError> {
    conn.room
        .clone()
        .ok_or_else(|| DomainError::not_found("room", "you are not in a room"))
}
