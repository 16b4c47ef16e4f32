//! Unified error types for the domain layer
//!
//! Provides a common error type used across all engine operations, enabling
//! consistent error handling without forcing handlers to use String or anyhow.
//! Every variant maps onto a stable wire code so the dispatcher can convert
//! any failure into an error envelope for the originating connection.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Bad credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Missing role for a privileged command, or no identity at all
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Malformed or missing fields, unparseable arguments
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Room, template, or target connection absent
    #[error("Not found: {entity} {name}")]
    NotFound { entity: &'static str, name: String },

    /// Undecodable or unrecognized command
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Backing-store call failed or timed out
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl DomainError {
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    /// Creates a validation error for business rule violations.
    ///
    /// Use this when required fields are empty or missing, values are outside
    /// allowed ranges, or numeric arguments fail to parse.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            name: name.into(),
        }
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Stable wire code for the error envelope.
    ///
    /// Room lookups get their own code because clients branch on it
    /// (a failed pin join renders differently from a generic miss).
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "AUTH_FAILED",
            Self::Authorization(_) => "NOT_AUTHORIZED",
            Self::Validation(_) => "VALIDATION",
            Self::NotFound { entity, .. } if *entity == "room" => "ROOM_NOT_FOUND",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Protocol(_) => "PROTOCOL_ERROR",
            Self::Persistence(_) => "PERSISTENCE",
        }
    }
}
