//! Error handling for RadarLink
//!
//! Provides error types for the two layers of the stack:
//! - Codec errors (hex frame parsing)
//! - Transport errors (link and session management)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Frame codec error type
///
/// Represents failures while converting between hex command strings and
/// raw frame bytes. These surface synchronously and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input cannot decode to whole bytes
    #[error("hex string has odd length {len}; a frame must decode to whole bytes")]
    OddLength {
        /// Length of the offending input in characters.
        len: usize,
    },

    /// A two-character chunk is not a base-16 byte value
    #[error("invalid hex digit at offset {offset}")]
    InvalidDigit {
        /// Byte offset of the chunk that failed to parse.
        offset: usize,
    },
}

/// Transport error type
///
/// Represents errors raised at the link boundary: GATT discovery during
/// `connect`, session state machine misuse, and write/notification
/// failures on an established session.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The remote device does not expose the requested service
    #[error("service {service:#06x} not found on the remote device")]
    ServiceNotFound {
        /// 16-bit id of the missing service.
        service: u16,
    },

    /// The service does not expose the requested characteristic
    #[error("characteristic {characteristic:#06x} not found in service {service:#06x}")]
    CharacteristicNotFound {
        /// 16-bit id of the enclosing service.
        service: u16,
        /// 16-bit id of the missing characteristic.
        characteristic: u16,
    },

    /// A session is already connecting or connected
    #[error("session already connecting or connected")]
    AlreadyConnected,

    /// The operation requires an established session
    #[error("session not connected")]
    NotConnected,

    /// The link stack rejected an outbound frame
    #[error("write to characteristic {characteristic:#06x} failed: {reason}")]
    WriteFailed {
        /// 16-bit id of the target characteristic.
        characteristic: u16,
        /// Driver-reported reason for the failure.
        reason: String,
    },

    /// Enabling or disabling notifications failed
    #[error("notification setup on characteristic {characteristic:#06x} failed: {reason}")]
    NotificationSetup {
        /// 16-bit id of the notifying characteristic.
        characteristic: u16,
        /// Driver-reported reason for the failure.
        reason: String,
    },

    /// Driver-specific failure crossing the transport boundary
    #[error(transparent)]
    Driver(#[from] anyhow::Error),
}

/// Main error type for RadarLink
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Frame codec error
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a codec error
    pub fn is_codec_error(&self) -> bool {
        matches!(self, Error::Codec(_))
    }

    /// Check if this is a transport error
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Check if this error reports a missing service or characteristic
    ///
    /// These are the `connect`-time acquisition failures; they leave the
    /// session idle with no partial state.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Transport(
                TransportError::ServiceNotFound { .. }
                    | TransportError::CharacteristicNotFound { .. }
            )
        )
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err: Error = CodecError::OddLength { len: 3 }.into();
        assert!(err.is_codec_error());
        assert!(!err.is_transport_error());

        let err: Error = TransportError::ServiceNotFound { service: 0xFFF0 }.into();
        assert!(err.is_transport_error());
        assert!(err.is_not_found());

        let err: Error = TransportError::AlreadyConnected.into();
        assert!(err.is_transport_error());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_error_display_messages() {
        let err: Error = TransportError::CharacteristicNotFound {
            service: 0xFFF0,
            characteristic: 0xFFF2,
        }
        .into();
        let rendered = format!("{}", err);
        assert!(rendered.contains("0xfff2"));
        assert!(rendered.contains("0xfff0"));

        let err = Error::other("boom");
        assert_eq!(format!("{}", err), "boom");
    }

    #[test]
    fn test_driver_error_wrapping() {
        let driver = anyhow::anyhow!("adapter powered off");
        let err: Error = TransportError::from(driver).into();
        assert!(format!("{}", err).contains("adapter powered off"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
