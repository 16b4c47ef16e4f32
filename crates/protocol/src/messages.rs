//! WebSocket message types for client/engine communication
//!
//! `ClientCommand` is the single internal command representation: structured
//! JSON envelopes deserialize into it directly, and the legacy text grammar
//! (see `decode`) parses into the same variants. `ServerMessage` covers both
//! request/response envelopes (which mirror `reqId`) and room broadcasts
//! (which carry no correlation id).

use serde::{Deserialize, Serialize};

use crate::dto::{FurnitureDto, RoomSummaryDto, RoomTemplateDto, SessionDto};

// =============================================================================
// Client Commands (client → engine)
// =============================================================================

/// Commands from client to engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientCommand {
    /// Verify credentials and bind an identity to this connection
    Authenticate {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        username: String,
        password: String,
    },
    /// Create an account
    Register {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        username: String,
        email: String,
        password: String,
    },
    /// Join a room by name; `pin` unlocks pin-protected rooms
    JoinRoom {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        room: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pin: Option<String>,
    },
    /// Leave the current room (no-op when not in one)
    LeaveRoom {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
    },
    /// Disconnect another user's connection (admin only)
    Kick {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        #[serde(rename = "targetUsername")]
        target_username: String,
    },
    CheckEmail {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        email: String,
    },
    CheckUsername {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        username: String,
    },
    GetRoomTemplates {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
    },
    GetRoomTemplate {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        #[serde(rename = "templateId")]
        template_id: i64,
    },
    GetRoomFurniture {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        #[serde(rename = "roomId")]
        room_id: i64,
    },
    /// List rooms ordered by popularity
    GetRooms {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
    },
    /// Create a room, optionally seeded from a template
    CreateRoom {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        name: String,
        #[serde(
            rename = "templateId",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        template_id: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pin: Option<String>,
    },
    /// Subscribe to a public room's broadcasts with a full state re-sync.
    /// Used by the game client to (re)attach after a legacy-text join.
    SubscribeRoom {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        room: String,
    },
    CreateFurniture {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        room: String,
        uid: String,
        proto_id: String,
        tx: f32,
        ty: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    UpdateFurniture {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        room: String,
        uid: String,
        tx: f32,
        ty: f32,
    },
    /// Avatar movement; echoed to the whole room including the sender
    TileClick { room: String, tx: f32, ty: f32 },
    /// Room chat; produced by the decode step for unprefixed text
    Chat { text: String },
}

impl ClientCommand {
    /// Correlation token to mirror in the reply, if the client sent one
    pub fn req_id(&self) -> Option<&str> {
        match self {
            Self::Authenticate { req_id, .. }
            | Self::Register { req_id, .. }
            | Self::JoinRoom { req_id, .. }
            | Self::LeaveRoom { req_id }
            | Self::Kick { req_id, .. }
            | Self::CheckEmail { req_id, .. }
            | Self::CheckUsername { req_id, .. }
            | Self::GetRoomTemplates { req_id }
            | Self::GetRoomTemplate { req_id, .. }
            | Self::GetRoomFurniture { req_id, .. }
            | Self::GetRooms { req_id }
            | Self::CreateRoom { req_id, .. }
            | Self::SubscribeRoom { req_id, .. }
            | Self::CreateFurniture { req_id, .. }
            | Self::UpdateFurniture { req_id, .. } => req_id.as_deref(),
            Self::TileClick { .. } | Self::Chat { .. } => None,
        }
    }
}

// =============================================================================
// Server Messages (engine → client)
// =============================================================================

/// Error payload of an `ERROR` envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Messages from engine to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    Pong,
    /// Bare success reply for commands with no payload to return
    Ack {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
    },
    /// Every failed command gets exactly one of these, mirroring `reqId`
    Error {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        error: ErrorBody,
    },
    Authenticated {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        data: SessionDto,
    },
    Registered {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
    },
    EmailChecked {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        /// true when the email is still available
        data: bool,
    },
    UsernameChecked {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        data: bool,
    },
    /// Join reply; `data` is the room's current furniture snapshot
    RoomJoined {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        room: String,
        data: Vec<FurnitureDto>,
    },
    RoomLeft {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        room: String,
    },
    Rooms {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        data: Vec<RoomSummaryDto>,
    },
    RoomCreated {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        /// New room id
        data: i64,
    },
    RoomTemplates {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        data: Vec<RoomTemplateDto>,
    },
    RoomTemplate {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        data: RoomTemplateDto,
    },
    RoomFurniture {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        data: Vec<FurnitureDto>,
    },
    /// Full furniture re-sync for subscribers
    RoomState {
        #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
        req_id: Option<String>,
        room: String,
        furniture: Vec<FurnitureDto>,
    },
    /// One item placed or moved; echoed to everyone including the sender
    FurnitureUpdated { room: String, furniture: FurnitureDto },
    PlayerMoved {
        room: String,
        username: String,
        tx: f32,
        ty: f32,
    },
    Chat {
        room: String,
        from: String,
        text: String,
    },
    UserJoined { room: String, username: String },
    UserLeft { room: String, username: String },
    UserDisconnected { room: String, username: String },
    Kicked { reason: String },
}
