//! Wire protocol
//!
//! JSON text frames exchanged between the relay and its clients.
//!
//! ## Server → client
//!
//! ```text
//! {"type":"init","id":"k3j9x0qa"}                       once, on connect
//! {"type":"cursors","cursors":[["k3j9x0qa",[0.4,0.2]],   every broadcast tick
//!                              ["p0w7c2mz",null]]}
//! ```
//!
//! ## Client → server
//!
//! ```text
//! [0.4, 0.2]      normalized position (x / canvas width, y / document height)
//! null            cursor hidden
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Protocol error types
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Frame is not valid JSON for the expected message
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Coordinates are NaN or infinite
    #[error("Non-finite coordinates: [{0}, {1}]")]
    NonFinite(f32, f32),
}

/// One `[id, position]` pair of a cursor table broadcast
pub type CursorEntry = (String, Option<[f32; 2]>);

/// Messages sent by the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Identifier assigned to the receiving connection
    Init {
        /// Connection id
        id: String,
    },

    /// Full cursor table
    Cursors {
        /// Every connected cursor, hidden ones as `null`
        cursors: Vec<CursorEntry>,
    },
}

impl ServerMessage {
    /// Serialize to a JSON text frame
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a JSON text frame
    pub fn decode(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Position update sent by a client: normalized coordinates or hidden
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CursorUpdate(pub Option<[f32; 2]>);

impl CursorUpdate {
    /// Visible cursor at normalized coordinates
    pub fn at(xy: [f32; 2]) -> Self {
        Self(Some(xy))
    }

    /// Hidden cursor
    pub fn hidden() -> Self {
        Self(None)
    }

    /// Normalized position, `None` when hidden
    pub fn position(&self) -> Option<[f32; 2]> {
        self.0
    }

    /// Serialize to a JSON text frame
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate a JSON text frame
    pub fn decode(text: &str) -> Result<Self> {
        let update: Self = serde_json::from_str(text)?;
        if let Some([x, y]) = update.0 {
            if !x.is_finite() || !y.is_finite() {
                return Err(ProtocolError::NonFinite(x, y));
            }
        }
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_wire_format() {
        let msg = ServerMessage::Init {
            id: "k3j9x0qa".to_string(),
        };
        assert_eq!(msg.encode().unwrap(), r#"{"type":"init","id":"k3j9x0qa"}"#);
    }

    #[test]
    fn test_cursors_wire_format() {
        let msg = ServerMessage::Cursors {
            cursors: vec![
                ("a".to_string(), Some([0.5, 0.25])),
                ("b".to_string(), None),
            ],
        };
        assert_eq!(
            msg.encode().unwrap(),
            r#"{"type":"cursors","cursors":[["a",[0.5,0.25]],["b",null]]}"#
        );
    }

    #[test]
    fn test_decode_cursors() {
        let msg =
            ServerMessage::decode(r#"{"type":"cursors","cursors":[["x",[1,0.5]],["y",null]]}"#)
                .unwrap();
        match msg {
            ServerMessage::Cursors { cursors } => {
                assert_eq!(cursors.len(), 2);
                assert_eq!(cursors[0], ("x".to_string(), Some([1.0, 0.5])));
                assert_eq!(cursors[1].1, None);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(ServerMessage::decode(r#"{"type":"bogus"}"#).is_err());
    }

    #[test]
    fn test_cursor_update_wire_format() {
        assert_eq!(CursorUpdate::hidden().encode().unwrap(), "null");
        assert_eq!(CursorUpdate::at([0.5, 0.75]).encode().unwrap(), "[0.5,0.75]");
        assert_eq!(CursorUpdate::decode("null").unwrap(), CursorUpdate::hidden());
        assert_eq!(
            CursorUpdate::decode("[0.1, 0.2]").unwrap(),
            CursorUpdate::at([0.1, 0.2])
        );
    }

    #[test]
    fn test_cursor_update_rejects_garbage() {
        assert!(CursorUpdate::decode("{\"x\":1}").is_err());
        assert!(CursorUpdate::decode("[1]").is_err());
        assert!(CursorUpdate::decode("not json").is_err());
        assert!(matches!(
            CursorUpdate::decode("[1e40, 0]"),
            Err(ProtocolError::NonFinite(_, _))
        ));
    }
}
