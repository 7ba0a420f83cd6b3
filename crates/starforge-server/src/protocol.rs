//! Wire messages exchanged with game clients.
//!
//! Every frame is a JSON object `{"type": ..., "payload": ...}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

/// Messages the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    AuthSuccess {
        #[serde(rename = "userId")]
        user_id: u64,
    },
    AuthFailed(String),
    Tick {
        tick: u64,
    },
    PlanetUpdate(Value),
    FleetUpdate(Value),
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Raw inbound frame before its payload is interpreted.
#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

/// Messages clients send to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Auth { token: String },
    /// A well-formed frame of a type the server does not handle.
    Unknown { kind: String },
}

/// Parse one inbound text frame.
///
/// An `auth` frame whose payload is not a string is
/// [`ProtocolError::InvalidAuthPayload`] so the caller can still answer it.
pub fn parse_client_message(text: &str) -> Result<ClientMessage, ProtocolError> {
    let wire: WireMessage = serde_json::from_str(text)?;
    match wire.kind.as_str() {
        "auth" => match wire.payload {
            Value::String(token) => Ok(ClientMessage::Auth { token }),
            _ => Err(ProtocolError::InvalidAuthPayload),
        },
        _ => Ok(ClientMessage::Unknown { kind: wire.kind }),
    }
}
