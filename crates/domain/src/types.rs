//! Room, furniture, and player records as the persistence gateway returns them
//!
//! These are the authoritative shapes; the wire DTOs in `plaza-protocol` are
//! derived from them at the engine boundary.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ids::{RoomId, TemplateId, UserId};

/// A shared object placed in a room.
///
/// The authoritative copy lives in the gateway; the engine only holds a
/// transient snapshot long enough to serialize it into a broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FurnitureItem {
    /// Database id (0 until persisted)
    pub id: i64,
    /// Client-assigned uid, stable across create/update within a session
    pub uid: String,
    /// Prototype name, e.g. "sofa"
    pub name: String,
    pub sprite_path: String,
    /// Tile coordinates
    pub tx: f32,
    pub ty: f32,
    pub rotation: f32,
    pub scale: f32,
    pub interactable: bool,
    pub color: Option<String>,
}

/// Summary row for the room directory listing, ordered by popularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    pub owner_id: UserId,
    pub is_public: bool,
    pub player_count: i64,
}

/// A reusable room layout (floor size, texture, starting furniture).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTemplate {
    pub id: TemplateId,
    pub name: String,
    pub width: f32,
    pub height: f32,
    pub skew_angle: f32,
    pub texture_path: String,
    pub default_layout: String,
    pub editable: bool,
}

/// Identity loaded on a successful authenticate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub roles: HashSet<String>,
    pub inventory: Vec<String>,
}

/// Last known avatar position, persisted best-effort on tile clicks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPosition {
    pub user_id: UserId,
    pub room_id: RoomId,
    pub tx: f32,
    pub ty: f32,
}

/// Direction of a presence change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Presence {
    Enter,
    Leave,
}
