//! Persistence gateway: the engine's only door to durable state
//!
//! Handlers never touch SQL. Everything durable (accounts, rooms, furniture,
//! presence, chat log, positions) goes through this trait, so tests swap in a
//! mock and the backing store can change without touching the handlers.

use async_trait::async_trait;

use plaza_domain::{
    DomainError, FurnitureItem, Presence, RoomId, RoomSummary, RoomTemplate, TemplateId, UserId,
    UserProfile,
};

pub mod sqlite;

pub use sqlite::SqliteGateway;

/// Parameters for creating a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSpec {
    pub name: String,
    pub owner_id: UserId,
    /// None makes the room public
    pub pin: Option<String>,
}

/// Durable-state operations required by the engine
///
/// Every method returns `DomainError` so handler code maps failures to wire
/// errors uniformly; gateway implementations translate their native errors
/// into the domain taxonomy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Verify credentials; `Ok` carries the user's id and username
    async fn authenticate_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserProfile, DomainError>;

    /// Create an account with an initial role; any collision surfaces as a
    /// validation error
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<UserId, DomainError>;

    async fn is_email_registered(&self, email: &str) -> Result<bool, DomainError>;

    async fn is_username_registered(&self, username: &str) -> Result<bool, DomainError>;

    /// Create a room; fails validation if the owner already has one by that name
    async fn create_room(&self, spec: &RoomSpec) -> Result<RoomId, DomainError>;

    /// Create a room carrying a template reference; the template must exist
    async fn create_room_from_template<'a>(
        &self,
        owner_id: UserId,
        template_id: TemplateId,
        name: &str,
        pin: Option<&'a str>,
    ) -> Result<RoomId, DomainError>;

    /// Look up a public room by exact name
    async fn get_public_room_id_by_name(&self, name: &str) -> Result<Option<RoomId>, DomainError>;

    /// Owner-scoped lookup: resolves the caller's own room, pin verified when
    /// the room carries one
    async fn get_room_id_by_owner<'a>(
        &self,
        name: &str,
        owner_id: UserId,
        pin: Option<&'a str>,
    ) -> Result<Option<RoomId>, DomainError>;

    /// All rooms, most populated first
    async fn list_rooms_by_popularity(&self) -> Result<Vec<RoomSummary>, DomainError>;

    async fn list_room_templates(&self) -> Result<Vec<RoomTemplate>, DomainError>;

    async fn get_room_template(&self, template_id: TemplateId)
        -> Result<RoomTemplate, DomainError>;

    async fn get_room_furniture(&self, room_id: RoomId) -> Result<Vec<FurnitureItem>, DomainError>;

    /// Insert one furniture item, returning its row id
    async fn add_furniture(
        &self,
        room_id: RoomId,
        item: &FurnitureItem,
    ) -> Result<i64, DomainError>;

    /// Move an existing item; `None` when no item with that uid exists
    async fn update_furniture(
        &self,
        room_id: RoomId,
        uid: &str,
        tx: f32,
        ty: f32,
    ) -> Result<Option<FurnitureItem>, DomainError>;

    /// Record a user entering or leaving a room
    async fn set_presence(
        &self,
        room_id: RoomId,
        user_id: UserId,
        presence: Presence,
    ) -> Result<(), DomainError>;

    /// Persisted member set of a room; authoritative across restarts
    async fn list_presence(&self, room_id: RoomId) -> Result<Vec<UserId>, DomainError>;

    async fn get_user_roles(&self, user_id: UserId) -> Result<Vec<String>, DomainError>;

    async fn get_user_inventory(&self, user_id: UserId) -> Result<Vec<String>, DomainError>;

    /// Best-effort chat history; callers log failures and carry on
    async fn append_chat_message(
        &self,
        room_id: RoomId,
        user_id: UserId,
        text: &str,
    ) -> Result<(), DomainError>;

    /// Best-effort avatar position; callers log failures and carry on
    async fn update_player_position(
        &self,
        room_id: RoomId,
        user_id: UserId,
        tx: f32,
        ty: f32,
    ) -> Result<(), DomainError>;
}
