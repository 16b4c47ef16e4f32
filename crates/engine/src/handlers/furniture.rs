//! Shared furniture: place, move, and avatar tile clicks
//!
//! Furniture mutations are durable first, broadcast second: the
//! `FURNITURE_UPDATED` notice goes to the whole room including the sender,
//! whose own client treats it as the authoritative echo.

use plaza_domain::{DomainError, FurnitureItem};
use plaza_protocol::ServerMessage;

use crate::connections::{ConnectionId, ConnectionInfo, CurrentRoom};
use crate::converters::furniture_dto;
use crate::handlers::common;
use crate::state::AppState;

/// The room a furniture command acts on: the caller's current room when the
/// names agree, otherwise the named public room.
async fn resolve_acting_room(
    state: &AppState,
    conn: &ConnectionInfo,
    room_name: &str,
) -> Result<CurrentRoom, DomainError> {
    if let Some(current) = &conn.room {
        if current.name == room_name {
            return Ok(current.clone());
        }
    }
    let room_id = state
        .persist(state.gateway.get_public_room_id_by_name(room_name))
        .await?
        .ok_or_else(|| DomainError::not_found("room", room_name))?;
    Ok(CurrentRoom {
        id: room_id,
        name: room_name.to_string(),
    })
}

/// Place a new item in the caller's room.
#[allow(clippy::too_many_arguments)]
pub async fn create(
    state: &AppState,
    connection_id: ConnectionId,
    req_id: Option<String>,
    room_name: String,
    uid: String,
    proto_id: String,
    tx: f32,
    ty: f32,
    color: Option<String>,
) -> Result<Option<ServerMessage>, DomainError> {
    let conn = common::connection(state, connection_id).await?;
    let room = resolve_acting_room(state, &conn, &room_name).await?;

    if uid.is_empty() || proto_id.is_empty() {
        return Err(DomainError::validation("uid and proto_id are required"));
    }

    let mut item = FurnitureItem {
        id: 0,
        uid,
        name: proto_id.clone(),
        sprite_path: format!("assets/furniture/{proto_id}.png"),
        tx,
        ty,
        rotation: 0.0,
        scale: 1.0,
        interactable: false,
        color,
    };
    item.id = state.persist(state.gateway.add_furniture(room.id, &item)).await?;

    state
        .connections
        .broadcast(
            &room.name,
            ServerMessage::FurnitureUpdated {
                room: room.name.clone(),
                furniture: furniture_dto(item),
            },
            None,
        )
        .await;

    Ok(req_id.map(|req_id| ServerMessage::Ack {
        req_id: Some(req_id),
    }))
}

/// Move an existing item.
pub async fn update(
    state: &AppState,
    connection_id: ConnectionId,
    req_id: Option<String>,
    room_name: String,
    uid: String,
    tx: f32,
    ty: f32,
) -> Result<Option<ServerMessage>, DomainError> {
    let conn = common::connection(state, connection_id).await?;
    let room = resolve_acting_room(state, &conn, &room_name).await?;

    let item = state
        .persist(state.gateway.update_furniture(room.id, &uid, tx, ty))
        .await?
        .ok_or_else(|| DomainError::not_found("furniture", uid))?;

    state
        .connections
        .broadcast(
            &room.name,
            ServerMessage::FurnitureUpdated {
                room: room.name.clone(),
                furniture: furniture_dto(item),
            },
            None,
        )
        .await;

    Ok(req_id.map(|req_id| ServerMessage::Ack {
        req_id: Some(req_id),
    }))
}

/// Avatar movement: persisted best effort, echoed to the whole room so every
/// client (the mover included) animates from the same event.
///
/// Unlike furniture placement, avatars only move where their user actually
/// is, so the named room must be the caller's current one.
pub async fn tile_click(
    state: &AppState,
    connection_id: ConnectionId,
    room_name: String,
    tx: f32,
    ty: f32,
) -> Result<Option<ServerMessage>, DomainError> {
    let conn = common::connection(state, connection_id).await?;
    let (user_id, username) = common::require_identity(&conn)?;
    let room = common::require_room(&conn)?;
    if room.name != room_name {
        return Err(DomainError::not_found("room", room_name));
    }

    if let Err(err) = state
        .persist(state.gateway.update_player_position(room.id, user_id, tx, ty))
        .await
    {
        tracing::warn!(%err, room = %room.name, "Failed to persist avatar position");
    }

    state
        .connections
        .broadcast(
            &room.name,
            ServerMessage::PlayerMoved {
                room: room.name.clone(),
                username,
                tx,
                ty,
            },
            None,
        )
        .await;

    Ok(None)
}
