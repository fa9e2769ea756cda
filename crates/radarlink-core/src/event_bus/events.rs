//! Event type definitions for the session event bus.
//!
//! Events are cloneable and serializable for logging/replay. Payload
//! events carry the raw frame bytes untouched; framing and checksums are
//! the concern of the protocol layer above.

use serde::{Deserialize, Serialize};

use crate::codec::encode_hex;

/// Maximum payload hex characters rendered before truncation.
const DISPLAY_PAYLOAD_LIMIT: usize = 24;

/// Events observable over the lifetime of one serial session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkEvent {
    /// Session established; the handshake has been submitted.
    Connected,
    /// Delivered to a subscriber exactly once, at subscribe time.
    Subscribed,
    /// Session torn down.
    Disconnected,
    /// Raw frame received from the device.
    Read {
        /// Bytes exactly as the transport driver delivered them.
        payload: Vec<u8>,
    },
    /// Raw frame transmitted to the device.
    Write {
        /// Bytes exactly as they were submitted to the link.
        payload: Vec<u8>,
    },
}

impl LinkEvent {
    /// Whether this event carries frame bytes.
    pub fn is_data(&self) -> bool {
        matches!(self, LinkEvent::Read { .. } | LinkEvent::Write { .. })
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            LinkEvent::Connected => "Connected".to_string(),
            LinkEvent::Subscribed => "Subscribed".to_string(),
            LinkEvent::Disconnected => "Disconnected".to_string(),
            LinkEvent::Read { payload } => {
                format!("RX {} bytes: {}", payload.len(), preview(payload))
            }
            LinkEvent::Write { payload } => {
                format!("TX {} bytes: {}", payload.len(), preview(payload))
            }
        }
    }
}

impl std::fmt::Display for LinkEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

fn preview(payload: &[u8]) -> String {
    let hex = encode_hex(payload);
    if hex.len() > DISPLAY_PAYLOAD_LIMIT {
        format!("{}...", &hex[..DISPLAY_PAYLOAD_LIMIT])
    } else {
        hex
    }
}
