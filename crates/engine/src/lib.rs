//! Plaza engine: WebSocket session, room, and broadcast engine
//!
//! One binary serves every concern: connection lifecycle, authentication,
//! named rooms (public or pin-protected), room chat, shared furniture, and
//! presence, all persisted through a pluggable gateway backed by SQLite.

pub mod config;
pub mod connections;
pub mod converters;
pub mod dispatch;
pub mod handlers;
pub mod persistence;
pub mod state;
pub mod websocket;

#[cfg(test)]
mod e2e_tests;
