//! Decode boundary: raw socket text → `ClientCommand`
//!
//! Three surfaces, one command set:
//! - JSON envelopes `{type, reqId?, ...}` deserialize directly
//! - Legacy text commands prefixed with `/` map 1:1 onto the same variants
//! - Anything else is room chat
//!
//! Decoding is total: malformed input yields a `DecodeError`, never a panic,
//! and never a silently-empty fallback value.

use thiserror::Error;

use crate::messages::ClientCommand;

/// Sentinel prefix of the legacy text grammar
const COMMAND_SENTINEL: char = '/';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid message envelope: {0}")]
    Json(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{0}")]
    Malformed(String),
}

/// Decode one inbound text frame.
pub fn decode(raw: &str) -> Result<ClientCommand, DecodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::Malformed("empty message".into()));
    }
    if trimmed.starts_with('{') {
        return serde_json::from_str(trimmed).map_err(|e| DecodeError::Json(e.to_string()));
    }
    if trimmed.starts_with(COMMAND_SENTINEL) {
        return decode_legacy(trimmed);
    }
    Ok(ClientCommand::Chat {
        text: trimmed.to_string(),
    })
}

/// Parse the legacy `/command arg...` grammar.
///
/// Passwords may contain spaces, so `/login` treats everything after the
/// username as the password; the other commands are whitespace-tokenized.
/// The `/register` argument order follows the deployed client:
/// username, email, password.
fn decode_legacy(text: &str) -> Result<ClientCommand, DecodeError> {
    let mut parts = text.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default().trim();

    match verb {
        "/login" => {
            let (username, password) = split_first(rest);
            if username.is_empty() || password.is_empty() {
                return Err(DecodeError::Malformed(
                    "usage: /login <username> <password>".into(),
                ));
            }
            Ok(ClientCommand::Authenticate {
                req_id: None,
                username: username.to_string(),
                password: password.to_string(),
            })
        }
        "/register" => {
            let mut args = rest.split_whitespace();
            match (args.next(), args.next(), args.next()) {
                (Some(username), Some(email), Some(password)) => Ok(ClientCommand::Register {
                    req_id: None,
                    username: username.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                }),
                _ => Err(DecodeError::Malformed(
                    "usage: /register <username> <email> <password>".into(),
                )),
            }
        }
        "/join" => {
            let mut args = rest.split_whitespace();
            let room = args
                .next()
                .ok_or_else(|| DecodeError::Malformed("usage: /join <room> [pin]".into()))?;
            Ok(ClientCommand::JoinRoom {
                req_id: None,
                room: room.to_string(),
                pin: args.next().map(str::to_string),
            })
        }
        "/leave" => Ok(ClientCommand::LeaveRoom { req_id: None }),
        "/kick" => {
            if rest.is_empty() {
                return Err(DecodeError::Malformed("usage: /kick <username>".into()));
            }
            Ok(ClientCommand::Kick {
                req_id: None,
                target_username: rest.to_string(),
            })
        }
        "/check_email" => {
            if rest.is_empty() {
                return Err(DecodeError::Malformed("usage: /check_email <email>".into()));
            }
            Ok(ClientCommand::CheckEmail {
                req_id: None,
                email: rest.to_string(),
            })
        }
        "/check_username" => {
            if rest.is_empty() {
                return Err(DecodeError::Malformed(
                    "usage: /check_username <username>".into(),
                ));
            }
            Ok(ClientCommand::CheckUsername {
                req_id: None,
                username: rest.to_string(),
            })
        }
        other => Err(DecodeError::UnknownCommand(other.to_string())),
    }
}

/// Split off the first whitespace-delimited token; the remainder keeps
/// internal whitespace.
fn split_first(s: &str) -> (&str, &str) {
    match s.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim_start()),
        None => (s, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_envelope_decodes() {
        let cmd = decode(r#"{"type":"LEAVE_ROOM","reqId":"x"}"#).expect("decode");
        assert_eq!(
            cmd,
            ClientCommand::LeaveRoom {
                req_id: Some("x".into())
            }
        );
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            decode(r#"{"type":"NO_SUCH_COMMAND"}"#),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(decode(r#"{"room":}"#), Err(DecodeError::Json(_))));
    }

    #[test]
    fn legacy_login_keeps_spaces_in_password() {
        let cmd = decode("/login dame correct horse battery").expect("decode");
        assert_eq!(
            cmd,
            ClientCommand::Authenticate {
                req_id: None,
                username: "dame".into(),
                password: "correct horse battery".into(),
            }
        );
    }

    #[test]
    fn legacy_register_uses_client_argument_order() {
        let cmd = decode("/register dame dame@example.com hunter22").expect("decode");
        assert_eq!(
            cmd,
            ClientCommand::Register {
                req_id: None,
                username: "dame".into(),
                email: "dame@example.com".into(),
                password: "hunter22".into(),
            }
        );
    }

    #[test]
    fn legacy_join_with_and_without_pin() {
        assert_eq!(
            decode("/join Lobby").expect("decode"),
            ClientCommand::JoinRoom {
                req_id: None,
                room: "Lobby".into(),
                pin: None,
            }
        );
        assert_eq!(
            decode("/join Vault 1234").expect("decode"),
            ClientCommand::JoinRoom {
                req_id: None,
                room: "Vault".into(),
                pin: Some("1234".into()),
            }
        );
    }

    #[test]
    fn unknown_sentinel_command_is_an_error() {
        assert_eq!(
            decode("/dance"),
            Err(DecodeError::UnknownCommand("/dance".into()))
        );
    }

    #[test]
    fn unprefixed_text_is_chat() {
        assert_eq!(
            decode("hello everyone").expect("decode"),
            ClientCommand::Chat {
                text: "hello everyone".into()
            }
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(decode("   "), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn missing_legacy_arguments_are_rejected() {
        assert!(matches!(decode("/login dame"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode("/kick"), Err(DecodeError::Malformed(_))));
    }
}
