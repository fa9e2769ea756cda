//! Transport boundary for the BLE link driver.
//!
//! The session controller never talks to a radio directly. It depends on
//! the capability traits below, which mirror exactly the GATT surface it
//! needs: primary-service lookup, characteristic lookup, frame writes,
//! notification subscription, and link teardown. Any driver (bluer,
//! btleplug, a test double) can sit behind them.

pub mod mock;

use async_trait::async_trait;
use radarlink_core::types::DataCallback;
use radarlink_core::Result;
use std::sync::Arc;

/// GATT service exposing the serial channel on LD2410-family firmware.
pub const SERIAL_SERVICE: u16 = 0xFFF0;

/// Characteristic accepting outbound command frames.
pub const WRITE_CHARACTERISTIC: u16 = 0xFFF2;

/// Characteristic notifying inbound report frames.
pub const NOTIFY_CHARACTERISTIC: u16 = 0xFFF1;

/// Callback invoked with the raw bytes of each inbound notification.
pub type NotificationHandler = DataCallback<Vec<u8>>;

/// Link driver capability: session-scoped access to the remote device
#[async_trait]
pub trait Transport: Send + Sync {
    /// Resolve the primary service with the given 16-bit id
    ///
    /// # Errors
    ///
    /// Fails with [`radarlink_core::TransportError::ServiceNotFound`]
    /// when the device does not expose the service.
    async fn primary_service(&self, service: u16) -> Result<Arc<dyn ServiceHandle>>;

    /// Tear down the physical link session
    async fn disconnect(&self) -> Result<()>;
}

/// A resolved GATT service
#[async_trait]
pub trait ServiceHandle: Send + Sync + std::fmt::Debug {
    /// Resolve a characteristic within this service
    ///
    /// # Errors
    ///
    /// Fails with
    /// [`radarlink_core::TransportError::CharacteristicNotFound`] when
    /// the service does not expose the characteristic.
    async fn characteristic(&self, characteristic: u16) -> Result<Arc<dyn CharacteristicHandle>>;
}

/// A resolved GATT characteristic
#[async_trait]
pub trait CharacteristicHandle: Send + Sync + std::fmt::Debug {
    /// Submit a frame to the device
    ///
    /// Completion means the local stack accepted the frame, not that the
    /// firmware acknowledged it.
    async fn write_value(&self, payload: &[u8]) -> Result<()>;

    /// Register `handler` and enable notifications
    ///
    /// At most one handler is active at a time; registering again
    /// replaces the previous handler.
    async fn start_notifications(&self, handler: NotificationHandler) -> Result<()>;

    /// Disable notifications and drop the registered handler
    async fn stop_notifications(&self) -> Result<()>;
}
