//! Wire-format DTOs
//!
//! Shapes the game client actually renders. Field names are pinned by the
//! deployed client (snake_case payload fields, camelCase correlation ids),
//! so serde renames are explicit rather than blanket `rename_all`.

use serde::{Deserialize, Serialize};

/// A furniture item as it appears in `ROOM_STATE` / `FURNITURE_UPDATED`
/// broadcasts and `ROOM_FURNITURE` responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FurnitureDto {
    pub id: i64,
    pub uid: String,
    /// Prototype name; the client falls back to this when `proto_id` is absent
    pub name: String,
    pub sprite_path: String,
    pub tx: f32,
    pub ty: f32,
    pub rotation: f32,
    pub scale: f32,
    pub interactable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// One row of the room directory (`ROOMS` response).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: i64,
    pub name: String,
    pub is_public: bool,
    pub player_count: i64,
}

/// A room template (`ROOM_TEMPLATES` / `ROOM_TEMPLATE` responses).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTemplateDto {
    pub id: i64,
    pub name: String,
    pub width: f32,
    pub height: f32,
    pub skew_angle: f32,
    pub texture_path: String,
    pub default_layout: String,
    pub editable: bool,
}

/// Identity payload of an `AUTHENTICATED` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDto {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub username: String,
    pub roles: Vec<String>,
    pub inventory: Vec<String>,
}
