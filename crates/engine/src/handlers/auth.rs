//! Account handlers: authenticate, register, availability checks

use plaza_domain::{DomainError, UserProfile};
use plaza_protocol::ServerMessage;

use crate::connections::ConnectionId;
use crate::converters::session_dto;
use crate::state::AppState;

/// Verify credentials and bind the identity to this connection.
///
/// Roles and inventory are loaded eagerly so privileged commands never need
/// another gateway round trip.
pub async fn authenticate(
    state: &AppState,
    connection_id: ConnectionId,
    req_id: Option<String>,
    username: String,
    password: String,
) -> Result<Option<ServerMessage>, DomainError> {
    let identity = state
        .persist(state.gateway.authenticate_user(&username, &password))
        .await?;
    let roles = state.persist(state.gateway.get_user_roles(identity.id)).await?;
    let inventory = state
        .persist(state.gateway.get_user_inventory(identity.id))
        .await?;

    let profile = UserProfile {
        id: identity.id,
        username: identity.username,
        roles: roles.into_iter().collect(),
        inventory,
    };

    // Socket may have closed while we were at the gateway
    if !state
        .connections
        .authenticate(connection_id, profile.clone())
        .await
    {
        return Ok(None);
    }

    tracing::info!(connection_id = %connection_id, username = %profile.username, "Authenticated");
    Ok(Some(ServerMessage::Authenticated {
        req_id,
        data: session_dto(profile),
    }))
}

/// Create an account.
///
/// Collisions with an existing username or email surface as one generic
/// validation error, so registration cannot be used to probe which half
/// collided; the explicit availability checks exist for cooperative clients.
pub async fn register(
    state: &AppState,
    req_id: Option<String>,
    username: String,
    email: String,
    password: String,
) -> Result<Option<ServerMessage>, DomainError> {
    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(DomainError::validation(
            "username, email, and password are required",
        ));
    }
    if !email.contains('@') {
        return Err(DomainError::validation("invalid email address"));
    }

    let user_id = state
        .persist(state.gateway.create_user(&username, &email, &password, "user"))
        .await?;
    tracing::info!(user_id = %user_id, username = %username, "Registered new account");
    Ok(Some(ServerMessage::Registered { req_id }))
}

/// `data` is true when the email is still available.
pub async fn check_email(
    state: &AppState,
    req_id: Option<String>,
    email: String,
) -> Result<Option<ServerMessage>, DomainError> {
    let registered = state.persist(state.gateway.is_email_registered(&email)).await?;
    Ok(Some(ServerMessage::EmailChecked {
        req_id,
        data: !registered,
    }))
}

pub async fn check_username(
    state: &AppState,
    req_id: Option<String>,
    username: String,
) -> Result<Option<ServerMessage>, DomainError> {
    let registered = state
        .persist(state.gateway.is_username_registered(&username))
        .await?;
    Ok(Some(ServerMessage::UsernameChecked {
        req_id,
        data: !registered,
    }))
}
