//! Plaza Domain - Core domain types for the virtual-space backend
//!
//! This crate contains the vocabulary shared by the engine and the
//! persistence gateway:
//! - Entity ids (`UserId`, `RoomId`, `TemplateId`)
//! - Room, furniture, and player records as the gateway returns them
//! - The unified `DomainError` taxonomy
//!
//! No I/O, no async, no business logic - pure data types.

pub mod error;
pub mod ids;
pub mod types;

pub use error::DomainError;
pub use ids::{RoomId, TemplateId, UserId};
pub use types::{
    FurnitureItem, PlayerPosition, Presence, RoomSummary, RoomTemplate, UserProfile,
};
