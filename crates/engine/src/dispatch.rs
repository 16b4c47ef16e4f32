//! Frame dispatcher: one inbound text frame in, at most one direct reply out
//!
//! Decodes the frame, routes the command to its handler, and converts any
//! failure into a single `ERROR` envelope mirroring the client's `reqId`.
//! Broadcasts triggered by the command go through the connection manager
//! inside the handlers; this layer only ever answers the originating
//! connection.

use plaza_domain::DomainError;
use plaza_protocol::{decode, ClientCommand, ErrorBody, ServerMessage};

use crate::connections::ConnectionId;
use crate::handlers::{self, common};
use crate::state::AppState;

/// Access level a command requires, checked once before dispatch
enum Access {
    Open,
    Authenticated,
    Role(&'static str),
}

fn required_access(command: &ClientCommand) -> Access {
    match command {
        ClientCommand::Authenticate { .. }
        | ClientCommand::Register { .. }
        | ClientCommand::CheckEmail { .. }
        | ClientCommand::CheckUsername { .. }
        | ClientCommand::GetRoomTemplates { .. }
        | ClientCommand::GetRoomTemplate { .. }
        | ClientCommand::GetRoomFurniture { .. }
        | ClientCommand::GetRooms { .. } => Access::Open,
        // Leaving while anonymous is a harmless acknowledged no-op
        ClientCommand::LeaveRoom { .. } => Access::Open,
        ClientCommand::Kick { .. } => Access::Role("admin"),
        ClientCommand::JoinRoom { .. }
        | ClientCommand::SubscribeRoom { .. }
        | ClientCommand::CreateRoom { .. }
        | ClientCommand::CreateFurniture { .. }
        | ClientCommand::UpdateFurniture { .. }
        | ClientCommand::TileClick { .. }
        | ClientCommand::Chat { .. } => Access::Authenticated,
    }
}

/// Handle one text frame from a connection.
pub async fn handle_frame(state: &AppState, connection_id: ConnectionId, raw: &str) {
    let command = match decode(raw) {
        Ok(command) => command,
        Err(err) => {
            tracing::debug!(connection_id = %connection_id, %err, "Undecodable frame");
            send_error(state, connection_id, None, &DomainError::protocol(err.to_string()))
                .await;
            return;
        }
    };

    let req_id = command.req_id().map(str::to_string);
    match handle_command(state, connection_id, command).await {
        Ok(Some(reply)) => state.connections.send_to(connection_id, reply).await,
        Ok(None) => {}
        Err(err) => {
            tracing::debug!(connection_id = %connection_id, %err, "Command failed");
            send_error(state, connection_id, req_id, &err).await;
        }
    }
}

async fn send_error(
    state: &AppState,
    connection_id: ConnectionId,
    req_id: Option<String>,
    err: &DomainError,
) {
    state
        .connections
        .send_to(
            connection_id,
            ServerMessage::Error {
                req_id,
                error: ErrorBody {
                    code: err.code().to_string(),
                    message: err.to_string(),
                },
            },
        )
        .await;
}

async fn handle_command(
    state: &AppState,
    connection_id: ConnectionId,
    command: ClientCommand,
) -> Result<Option<ServerMessage>, DomainError> {
    match required_access(&command) {
        Access::Open => {}
        Access::Authenticated => {
            let conn = common::connection(state, connection_id).await?;
            common::require_identity(&conn)?;
        }
        Access::Role(role) => {
            let conn = common::connection(state, connection_id).await?;
            common::require_identity(&conn)?;
            common::require_role(&conn, role)?;
        }
    }

    match command {
        ClientCommand::Authenticate {
            req_id,
            username,
            password,
        } => handlers::auth::authenticate(state, connection_id, req_id, username, password).await,
        ClientCommand::Register {
            req_id,
            username,
            email,
            password,
        } => handlers::auth::register(state, req_id, username, email, password).await,
        ClientCommand::CheckEmail { req_id, email } => {
            handlers::auth::check_email(state, req_id, email).await
        }
        ClientCommand::CheckUsername { req_id, username } => {
            handlers::auth::check_username(state, req_id, username).await
        }
        ClientCommand::JoinRoom { req_id, room, pin } => {
            handlers::room::join(state, connection_id, req_id, room, pin).await
        }
        ClientCommand::LeaveRoom { req_id } => {
            handlers::room::leave(state, connection_id, req_id).await
        }
        ClientCommand::SubscribeRoom { req_id, room } => {
            handlers::room::subscribe(state, connection_id, req_id, room).await
        }
        ClientCommand::GetRooms { req_id } => handlers::room::get_rooms(state, req_id).await,
        ClientCommand::CreateRoom {
            req_id,
            name,
            template_id,
            pin,
        } => handlers::room::create_room(state, connection_id, req_id, name, template_id, pin).await,
        ClientCommand::GetRoomTemplates { req_id } => {
            handlers::room::get_templates(state, req_id).await
        }
        ClientCommand::GetRoomTemplate {
            req_id,
            template_id,
        } => handlers::room::get_template(state, req_id, template_id).await,
        ClientCommand::GetRoomFurniture { req_id, room_id } => {
            handlers::room::get_room_furniture(state, req_id, room_id).await
        }
        ClientCommand::CreateFurniture {
            req_id,
            room,
            uid,
            proto_id,
            tx,
            ty,
            color,
        } => {
            handlers::furniture::create(
                state,
                connection_id,
                req_id,
                room,
                uid,
                proto_id,
                tx,
                ty,
                color,
            )
            .await
        }
        ClientCommand::UpdateFurniture {
            req_id,
            room,
            uid,
            tx,
            ty,
        } => handlers::furniture::update(state, connection_id, req_id, room, uid, tx, ty).await,
        ClientCommand::TileClick { room, tx, ty } => {
            handlers::furniture::tile_click(state, connection_id, room, tx, ty).await
        }
        ClientCommand::Chat { text } => handlers::chat::chat(state, connection_id, text).await,
        ClientCommand::Kick {
            req_id,
            target_username,
        } => handlers::moderation::kick(state, connection_id, req_id, target_username).await,
    }
}
