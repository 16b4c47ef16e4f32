//! Moderation: forced disconnects

use plaza_domain::DomainError;
use plaza_protocol::ServerMessage;

use crate::connections::ConnectionId;
use crate::state::AppState;

/// Disconnect another user's connection. The admin-role requirement is
/// enforced by the dispatcher's access gate.
///
/// The target gets a `KICKED` notice before the socket is cancelled; an
/// absent target is acknowledged silently so kicks race cleanly with
/// disconnects.
pub async fn kick(
    state: &AppState,
    connection_id: ConnectionId,
    req_id: Option<String>,
    target_username: String,
) -> Result<Option<ServerMessage>, DomainError> {
    let Some(target) = state.connections.find_by_username(&target_username).await else {
        return Ok(Some(ServerMessage::Ack { req_id }));
    };

    state
        .connections
        .send_to(
            target.connection_id,
            ServerMessage::Kicked {
                reason: "kicked by an administrator".into(),
            },
        )
        .await;
    target.cancel.cancel();

    tracing::info!(
        target = %target_username,
        by = %connection_id,
        "Kicked connection"
    );
    Ok(Some(ServerMessage::Ack { req_id }))
}
