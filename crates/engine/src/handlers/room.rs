//! Room handlers: join/leave/subscribe, directory, templates, creation

use plaza_domain::{DomainError, FurnitureItem, Presence, RoomId, TemplateId, UserId};
use plaza_protocol::ServerMessage;

use crate::connections::{ConnectionId, CurrentRoom};
use crate::converters::{furniture_dto, room_summary_dto, room_template_dto};
use crate::handlers::common;
use crate::persistence::RoomSpec;
use crate::state::AppState;

/// Resolve a room name to an id.
///
/// Public lookup first; when that misses and a pin was supplied, fall back
/// to the caller's own rooms (pinned rooms only unlock for their owner).
/// A miss and a pin mismatch are the same error, so the directory cannot be
/// probed for which pinned rooms exist.
async fn resolve_room(
    state: &AppState,
    user_id: UserId,
    name: &str,
    pin: Option<&str>,
) -> Result<RoomId, DomainError> {
    if let Some(room_id) = state
        .persist(state.gateway.get_public_room_id_by_name(name))
        .await?
    {
        return Ok(room_id);
    }
    if pin.is_some() {
        if let Some(room_id) = state
            .persist(state.gateway.get_room_id_by_owner(name, user_id, pin))
            .await?
        {
            return Ok(room_id);
        }
    }
    Err(DomainError::not_found("room", name))
}

/// Move the caller into a room: implicit leave of the previous room, presence
/// bookkeeping, and join notices. Returns the furniture snapshot for the
/// reply, or `None` when the connection closed mid-flight.
async fn enter_room(
    state: &AppState,
    connection_id: ConnectionId,
    user_id: UserId,
    username: &str,
    room_id: RoomId,
    room_name: &str,
) -> Result<Option<Vec<FurnitureItem>>, DomainError> {
    // Snapshot before mutating anything, so a gateway failure leaves the
    // caller exactly where they were
    let furniture = state.persist(state.gateway.get_room_furniture(room_id)).await?;

    let room = CurrentRoom {
        id: room_id,
        name: room_name.to_string(),
    };
    let Some(previous) = state.connections.join_room(connection_id, room).await else {
        return Ok(None);
    };

    if let Some(prev) = previous {
        state
            .connections
            .broadcast(
                &prev.name,
                ServerMessage::UserLeft {
                    room: prev.name.clone(),
                    username: username.to_string(),
                },
                None,
            )
            .await;
        if let Err(err) = state
            .persist(state.gateway.set_presence(prev.id, user_id, Presence::Leave))
            .await
        {
            tracing::warn!(%err, room = %prev.name, "Failed to persist presence removal");
        }
    }

    if let Err(err) = state
        .persist(state.gateway.set_presence(room_id, user_id, Presence::Enter))
        .await
    {
        tracing::warn!(%err, room = %room_name, "Failed to persist presence");
    }

    state
        .connections
        .broadcast(
            room_name,
            ServerMessage::UserJoined {
                room: room_name.to_string(),
                username: username.to_string(),
            },
            Some(connection_id),
        )
        .await;

    Ok(Some(furniture))
}

/// Join a room by name, with a pin for pin-protected rooms.
pub async fn join(
    state: &AppState,
    connection_id: ConnectionId,
    req_id: Option<String>,
    room_name: String,
    pin: Option<String>,
) -> Result<Option<ServerMessage>, DomainError> {
    let conn = common::connection(state, connection_id).await?;
    let (user_id, username) = common::require_identity(&conn)?;

    let room_id = resolve_room(state, user_id, &room_name, pin.as_deref()).await?;
    let Some(furniture) =
        enter_room(state, connection_id, user_id, &username, room_id, &room_name).await?
    else {
        return Ok(None);
    };

    Ok(Some(ServerMessage::RoomJoined {
        req_id,
        room: room_name,
        data: furniture.into_iter().map(furniture_dto).collect(),
    }))
}

/// Leave the current room; acknowledged even when not in one.
pub async fn leave(
    state: &AppState,
    connection_id: ConnectionId,
    req_id: Option<String>,
) -> Result<Option<ServerMessage>, DomainError> {
    let conn = common::connection(state, connection_id).await?;

    let Some(room) = state.connections.leave_room(connection_id).await else {
        return Ok(Some(ServerMessage::Ack { req_id }));
    };

    if let (Some(user_id), Some(username)) = (conn.user_id, conn.username) {
        state
            .connections
            .broadcast(
                &room.name,
                ServerMessage::UserLeft {
                    room: room.name.clone(),
                    username,
                },
                None,
            )
            .await;
        if let Err(err) = state
            .persist(state.gateway.set_presence(room.id, user_id, Presence::Leave))
            .await
        {
            tracing::warn!(%err, room = %room.name, "Failed to persist presence removal");
        }
    }

    Ok(Some(ServerMessage::RoomLeft {
        req_id,
        room: room.name,
    }))
}

/// Subscribe to a public room's broadcasts; the game client's (re)attach
/// path. Same move semantics as a join, but the reply is a full state
/// re-sync rather than a join receipt.
pub async fn subscribe(
    state: &AppState,
    connection_id: ConnectionId,
    req_id: Option<String>,
    room_name: String,
) -> Result<Option<ServerMessage>, DomainError> {
    let conn = common::connection(state, connection_id).await?;
    let (user_id, username) = common::require_identity(&conn)?;

    let room_id = resolve_room(state, user_id, &room_name, None).await?;
    let Some(furniture) =
        enter_room(state, connection_id, user_id, &username, room_id, &room_name).await?
    else {
        return Ok(None);
    };

    Ok(Some(ServerMessage::RoomState {
        req_id,
        room: room_name,
        furniture: furniture.into_iter().map(furniture_dto).collect(),
    }))
}

/// List all rooms, most populated first.
pub async fn get_rooms(
    state: &AppState,
    req_id: Option<String>,
) -> Result<Option<ServerMessage>, DomainError> {
    let rooms = state.persist(state.gateway.list_rooms_by_popularity()).await?;
    Ok(Some(ServerMessage::Rooms {
        req_id,
        data: rooms.into_iter().map(room_summary_dto).collect(),
    }))
}

/// Create a room owned by the caller; a pin makes it pin-protected.
pub async fn create_room(
    state: &AppState,
    connection_id: ConnectionId,
    req_id: Option<String>,
    name: String,
    template_id: Option<i64>,
    pin: Option<String>,
) -> Result<Option<ServerMessage>, DomainError> {
    let conn = common::connection(state, connection_id).await?;
    let (user_id, _) = common::require_identity(&conn)?;

    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(DomainError::validation("room name is required"));
    }
    if let Some(pin) = &pin {
        if pin.is_empty() || !pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::validation("pin must be numeric"));
        }
    }

    let room_id = match template_id {
        Some(template_id) => {
            state
                .persist(state.gateway.create_room_from_template(
                    user_id,
                    TemplateId::new(template_id),
                    &name,
                    pin.as_deref(),
                ))
                .await?
        }
        None => {
            let spec = RoomSpec {
                name,
                owner_id: user_id,
                pin,
            };
            state.persist(state.gateway.create_room(&spec)).await?
        }
    };
    tracing::info!(room_id = %room_id, owner = %user_id, "Created room");
    Ok(Some(ServerMessage::RoomCreated {
        req_id,
        data: room_id.as_i64(),
    }))
}

pub async fn get_templates(
    state: &AppState,
    req_id: Option<String>,
) -> Result<Option<ServerMessage>, DomainError> {
    let templates = state.persist(state.gateway.list_room_templates()).await?;
    Ok(Some(ServerMessage::RoomTemplates {
        req_id,
        data: templates.into_iter().map(room_template_dto).collect(),
    }))
}

pub async fn get_template(
    state: &AppState,
    req_id: Option<String>,
    template_id: i64,
) -> Result<Option<ServerMessage>, DomainError> {
    let template = state
        .persist(state.gateway.get_room_template(TemplateId::new(template_id)))
        .await?;
    Ok(Some(ServerMessage::RoomTemplate {
        req_id,
        data: room_template_dto(template),
    }))
}

pub async fn get_room_furniture(
    state: &AppState,
    req_id: Option<String>,
    room_id: i64,
) -> Result<Option<ServerMessage>, DomainError> {
    let furniture = state
        .persist(state.gateway.get_room_furniture(RoomId::new(room_id)))
        .await?;
    Ok(Some(ServerMessage::RoomFurniture {
        req_id,
        data: furniture.into_iter().map(furniture_dto).collect(),
    }))
}
