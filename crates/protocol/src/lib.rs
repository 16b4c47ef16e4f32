//! Plaza Protocol - Wire types for client/engine communication
//!
//! This crate contains everything that crosses the socket:
//! - `ClientCommand` / `ServerMessage`, the tagged envelopes
//! - Wire-format DTOs (furniture, rooms, templates)
//! - The decode boundary: structured JSON envelopes and the legacy
//!   `/`-prefixed text grammar both decode into the SAME `ClientCommand`
//!   representation; unprefixed text is room chat
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - serde, serde_json, thiserror only
//! 2. **No business logic** - pure data types and the decode step
//! 3. **One internal command set** - the legacy grammar is an alternate
//!    encoding, never a second command vocabulary

pub mod decode;
pub mod dto;
pub mod messages;

pub use decode::{decode, DecodeError};
pub use dto::{FurnitureDto, RoomSummaryDto, RoomTemplateDto, SessionDto};
pub use messages::{ClientCommand, ErrorBody, ServerMessage};
