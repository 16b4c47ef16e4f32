//! Command handlers, one module per concern

pub mod auth;
pub mod chat;
pub mod common;
pub mod furniture;
pub mod moderation;
pub mod room;
