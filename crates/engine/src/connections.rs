//! Room Connection Manager - live connections, sessions, and room fan-out
//!
//! This module is the in-memory source of truth for "who is connected" and
//! "who hears broadcasts for room X". It combines:
//!
//! - **Connection registry**: every live WebSocket, keyed by `ConnectionId`
//! - **Session state**: the identity, roles, and inventory bound to each
//!   connection after a successful authenticate
//! - **Room directory**: room name → member set, created lazily and pruned
//!   when the last member leaves
//! - **Broadcast engine**: fire-and-forget delivery to a room's members
//!
//! # Invariants
//!
//! - A connection's `room` field agrees with the directory at all times:
//!   both are updated inside one write-guard critical section.
//! - A connection is a member of at most one room; joining while joined
//!   performs the implicit leave in the same critical section, so no other
//!   event can observe the connection in two rooms or in neither.
//!
//! The directory is an advisory cache of persisted presence: after a restart
//! it starts empty and clients resubscribe.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use plaza_domain::{UserId, UserProfile};
use plaza_protocol::ServerMessage;

// =============================================================================
// Connection Info
// =============================================================================

/// Opaque handle to one live transport channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The room a connection currently belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentRoom {
    pub id: plaza_domain::RoomId,
    pub name: String,
}

/// Information about a single WebSocket connection
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Unique connection identifier
    pub connection_id: ConnectionId,

    /// Database user id (None until authenticated)
    pub user_id: Option<UserId>,

    /// Display name (None until authenticated)
    pub username: Option<String>,

    /// Roles granted at authenticate time, e.g. "admin"
    pub roles: HashSet<String>,

    /// Item names owned by the user
    pub inventory: Vec<String>,

    /// Room this connection is joined to (None if not in a room)
    pub room: Option<CurrentRoom>,

    /// Channel to send messages to this connection
    pub sender: mpsc::UnboundedSender<ServerMessage>,

    /// Cancelled to force-close the socket (kick)
    pub cancel: CancellationToken,
}

impl ConnectionInfo {
    /// Create a new anonymous connection (not yet authenticated)
    fn new(
        connection_id: ConnectionId,
        sender: mpsc::UnboundedSender<ServerMessage>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            connection_id,
            user_id: None,
            username: None,
            roles: HashSet::new(),
            inventory: Vec::new(),
            room: None,
            sender,
            cancel,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_in_room(&self) -> bool {
        self.room.is_some()
    }
}

// =============================================================================
// Room State
// =============================================================================

/// Fan-out list for a single room
#[derive(Debug, Default)]
struct RoomState {
    members: HashSet<ConnectionId>,
}

impl RoomState {
    fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// =============================================================================
// Room Connection Manager
// =============================================================================

/// Manager for connections and room-scoped fan-out
///
/// All mutations happen in short exclusive-lock sections; lock order is
/// always connections before rooms.
#[derive(Debug, Default)]
pub struct RoomConnectionManager {
    /// All connections by connection_id
    connections: RwLock<HashMap<ConnectionId, ConnectionInfo>>,

    /// Room fan-out lists by room name
    rooms: RwLock<HashMap<String, RoomState>>,
}

impl RoomConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection (anonymous until authenticate)
    pub async fn register(
        &self,
        connection_id: ConnectionId,
        sender: mpsc::UnboundedSender<ServerMessage>,
        cancel: CancellationToken,
    ) {
        let info = ConnectionInfo::new(connection_id, sender, cancel);
        self.connections.write().await.insert(connection_id, info);
        tracing::debug!(connection_id = %connection_id, "Registered new connection");
    }

    /// Unregister a connection (on disconnect)
    ///
    /// Removes it from its room as well; the returned info still carries the
    /// vacated room so the caller can notify remaining members and persist
    /// the presence removal.
    pub async fn unregister(&self, connection_id: ConnectionId) -> Option<ConnectionInfo> {
        let mut connections = self.connections.write().await;
        let info = connections.remove(&connection_id)?;

        if let Some(room) = &info.room {
            let mut rooms = self.rooms.write().await;
            if let Some(state) = rooms.get_mut(&room.name) {
                state.members.remove(&connection_id);
                if state.is_empty() {
                    rooms.remove(&room.name);
                    tracing::debug!(room = %room.name, "Room has no more members, pruned");
                }
            }
        }

        tracing::debug!(connection_id = %connection_id, "Unregistered connection");
        Some(info)
    }

    /// Bind an identity to a connection; idempotent (overwrites)
    ///
    /// Returns false if the connection closed while credentials were being
    /// verified, in which case nothing is mutated.
    pub async fn authenticate(&self, connection_id: ConnectionId, profile: UserProfile) -> bool {
        let mut connections = self.connections.write().await;
        let Some(conn) = connections.get_mut(&connection_id) else {
            return false;
        };
        conn.user_id = Some(profile.id);
        conn.username = Some(profile.username);
        conn.roles = profile.roles;
        conn.inventory = profile.inventory;
        true
    }

    /// Get connection info by connection_id
    pub async fn get(&self, connection_id: ConnectionId) -> Option<ConnectionInfo> {
        self.connections.read().await.get(&connection_id).cloned()
    }

    /// Move a connection into a room
    ///
    /// The implicit leave of the previous room and the join of the new one
    /// happen under one write guard, so the single-room invariant holds for
    /// every observer.
    ///
    /// Returns `None` if the connection is gone (closed mid-flight);
    /// otherwise `Some(previous_room)` so the caller can emit a "left"
    /// notice.
    pub async fn join_room(
        &self,
        connection_id: ConnectionId,
        room: CurrentRoom,
    ) -> Option<Option<CurrentRoom>> {
        let mut connections = self.connections.write().await;
        let conn = connections.get_mut(&connection_id)?;
        let mut rooms = self.rooms.write().await;

        let previous = conn.room.take();
        if let Some(prev) = &previous {
            if let Some(state) = rooms.get_mut(&prev.name) {
                state.members.remove(&connection_id);
                if state.is_empty() {
                    rooms.remove(&prev.name);
                }
            }
        }

        rooms
            .entry(room.name.clone())
            .or_default()
            .members
            .insert(connection_id);
        conn.room = Some(room.clone());

        tracing::info!(
            connection_id = %connection_id,
            room = %room.name,
            previous = ?previous.as_ref().map(|r| r.name.as_str()),
            "Connection joined room"
        );

        Some(previous)
    }

    /// Leave the current room; no-op if not in one
    pub async fn leave_room(&self, connection_id: ConnectionId) -> Option<CurrentRoom> {
        let mut connections = self.connections.write().await;
        let conn = connections.get_mut(&connection_id)?;
        let room = conn.room.take()?;

        let mut rooms = self.rooms.write().await;
        if let Some(state) = rooms.get_mut(&room.name) {
            state.members.remove(&connection_id);
            if state.is_empty() {
                rooms.remove(&room.name);
            }
        }

        tracing::info!(connection_id = %connection_id, room = %room.name, "Connection left room");
        Some(room)
    }

    /// Read-only snapshot of a room's member set
    pub async fn members(&self, room_name: &str) -> Vec<ConnectionId> {
        self.rooms
            .read()
            .await
            .get(room_name)
            .map(|state| state.members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub async fn room_count(&self, room_name: &str) -> usize {
        self.rooms
            .read()
            .await
            .get(room_name)
            .map(|state| state.members.len())
            .unwrap_or(0)
    }

    /// Find a live connection by authenticated username (for Kick)
    pub async fn find_by_username(&self, username: &str) -> Option<ConnectionInfo> {
        self.connections
            .read()
            .await
            .values()
            .find(|conn| conn.username.as_deref() == Some(username))
            .cloned()
    }

    /// Send a message to a specific connection
    pub async fn send_to(&self, connection_id: ConnectionId, message: ServerMessage) {
        if let Some(conn) = self.connections.read().await.get(&connection_id) {
            if conn.sender.send(message).is_err() {
                tracing::debug!(connection_id = %connection_id, "Send to closing connection dropped");
            }
        }
    }

    /// Broadcast a message to a room's members, optionally excluding one
    ///
    /// Delivery is fire-and-forget per member: a failed send (already-closing
    /// socket) is logged and skipped, never aborting the rest. Messages
    /// issued from one control flow arrive in issuance order (unbounded
    /// per-connection channels).
    pub async fn broadcast(
        &self,
        room_name: &str,
        message: ServerMessage,
        exclude: Option<ConnectionId>,
    ) {
        let members = self.members(room_name).await;
        let connections = self.connections.read().await;
        for member in members {
            if Some(member) == exclude {
                continue;
            }
            if let Some(conn) = connections.get(&member) {
                if conn.sender.send(message.clone()).is_err() {
                    tracing::debug!(
                        connection_id = %member,
                        room = %room_name,
                        "Broadcast to closing connection dropped"
                    );
                }
            }
        }
    }
}
