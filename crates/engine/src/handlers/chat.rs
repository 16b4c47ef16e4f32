//! Room chat

use plaza_domain::DomainError;
use plaza_protocol::ServerMessage;

use crate::connections::ConnectionId;
use crate::handlers::common;
use crate::state::AppState;

/// Relay a chat line to the rest of the caller's room.
///
/// The chat log is best effort: a gateway failure is logged and the line is
/// still relayed, so a history outage never silences a room.
pub async fn chat(
    state: &AppState,
    connection_id: ConnectionId,
    text: String,
) -> Result<Option<ServerMessage>, DomainError> {
    let conn = common::connection(state, connection_id).await?;
    let (user_id, username) = common::require_identity(&conn)?;
    let room = common::require_room(&conn)?;

    if let Err(err) = state
        .persist(state.gateway.append_chat_message(room.id, user_id, &text))
        .await
    {
        tracing::warn!(%err, room = %room.name, "Failed to persist chat line");
    }

    state
        .connections
        .broadcast(
            &room.name,
            ServerMessage::Chat {
                room: room.name.clone(),
                from: username,
                text,
            },
            Some(connection_id),
        )
        .await;

    Ok(None)
}
