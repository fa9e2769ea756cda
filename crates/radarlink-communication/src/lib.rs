//! # RadarLink Communication
//!
//! Transport boundary and session lifecycle controller for the RadarLink
//! serial-over-BLE channel. The session controller serializes outbound
//! frames through a rate-limited write pump, republishes inbound
//! notifications as events, and performs the firmware login handshake
//! when a session is established.

pub mod session;
pub mod transport;

pub use session::{SerialSession, SessionConfig, SessionState};

pub use transport::{
    mock::{MockCharacteristic, MockTransport},
    CharacteristicHandle, NotificationHandler, ServiceHandle, Transport, NOTIFY_CHARACTERISTIC,
    SERIAL_SERVICE, WRITE_CHARACTERISTIC,
};
