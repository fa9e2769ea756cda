//! In-memory transport double.
//!
//! Implements the transport capability traits against plain shared
//! state so the session controller can be driven through every
//! lifecycle scenario without a radio: recorded writes, injected
//! notifications, and per-step failure injection.

use crate::transport::{
    CharacteristicHandle, NotificationHandler, ServiceHandle, Transport, NOTIFY_CHARACTERISTIC,
    SERIAL_SERVICE, WRITE_CHARACTERISTIC,
};
use async_trait::async_trait;
use radarlink_core::error::{Result, TransportError};
use radarlink_core::types::{thread_safe_none, thread_safe_vec, ThreadSafeOption, ThreadSafeVec};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared form of the notification handler, clonable out of the lock
/// before invocation.
type SharedHandler = Arc<dyn Fn(Vec<u8>) + Send + Sync>;

/// A recordable, scriptable characteristic
pub struct MockCharacteristic {
    id: u16,
    writes: ThreadSafeVec<Vec<u8>>,
    handler: ThreadSafeOption<SharedHandler>,
    fail_writes: AtomicBool,
    fail_notification_setup: AtomicBool,
}

impl MockCharacteristic {
    fn new(id: u16) -> Self {
        Self {
            id,
            writes: thread_safe_vec(),
            handler: thread_safe_none(),
            fail_writes: AtomicBool::new(false),
            fail_notification_setup: AtomicBool::new(false),
        }
    }

    /// Frames written to this characteristic, in submission order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().clone()
    }

    /// Simulate a device notification carrying `payload`.
    ///
    /// Invokes the registered handler synchronously in the caller's
    /// context, exactly as a driver callback would. Silently does
    /// nothing when notifications are not active.
    pub fn notify(&self, payload: Vec<u8>) {
        let handler = self.handler.lock().clone();
        if let Some(handler) = handler {
            handler(payload);
        }
    }

    /// Whether a notification handler is currently registered.
    pub fn notifications_active(&self) -> bool {
        self.handler.lock().is_some()
    }

    /// Make subsequent `write_value` calls fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make the next `start_notifications` call fail.
    pub fn set_fail_notification_setup(&self, fail: bool) {
        self.fail_notification_setup.store(fail, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for MockCharacteristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCharacteristic")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CharacteristicHandle for MockCharacteristic {
    async fn write_value(&self, payload: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::WriteFailed {
                characteristic: self.id,
                reason: "injected write failure".to_string(),
            }
            .into());
        }
        self.writes.lock().push(payload.to_vec());
        Ok(())
    }

    async fn start_notifications(&self, handler: NotificationHandler) -> Result<()> {
        if self.fail_notification_setup.load(Ordering::SeqCst) {
            return Err(TransportError::NotificationSetup {
                characteristic: self.id,
                reason: "injected notification failure".to_string(),
            }
            .into());
        }
        *self.handler.lock() = Some(Arc::from(handler));
        Ok(())
    }

    async fn stop_notifications(&self) -> Result<()> {
        self.handler.lock().take();
        Ok(())
    }
}

/// The serial service as exposed by a stock device
struct MockService {
    id: u16,
    characteristics: HashMap<u16, Arc<MockCharacteristic>>,
}

impl std::fmt::Debug for MockService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockService")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ServiceHandle for MockService {
    async fn characteristic(&self, characteristic: u16) -> Result<Arc<dyn CharacteristicHandle>> {
        match self.characteristics.get(&characteristic) {
            Some(found) => Ok(found.clone() as Arc<dyn CharacteristicHandle>),
            None => Err(TransportError::CharacteristicNotFound {
                service: self.id,
                characteristic,
            }
            .into()),
        }
    }
}

/// Scriptable in-memory transport
///
/// By default exposes the serial service with both characteristics, the
/// way stock firmware does. Builder methods remove pieces to script
/// acquisition failures.
pub struct MockTransport {
    service: Arc<MockService>,
    expose_service: bool,
    disconnects: AtomicUsize,
}

impl MockTransport {
    /// A transport exposing the full serial service.
    pub fn new() -> Self {
        let mut characteristics = HashMap::new();
        characteristics.insert(
            WRITE_CHARACTERISTIC,
            Arc::new(MockCharacteristic::new(WRITE_CHARACTERISTIC)),
        );
        characteristics.insert(
            NOTIFY_CHARACTERISTIC,
            Arc::new(MockCharacteristic::new(NOTIFY_CHARACTERISTIC)),
        );
        Self {
            service: Arc::new(MockService {
                id: SERIAL_SERVICE,
                characteristics,
            }),
            expose_service: true,
            disconnects: AtomicUsize::new(0),
        }
    }

    /// A transport whose service lookup always fails.
    pub fn without_service(mut self) -> Self {
        self.expose_service = false;
        self
    }

    /// A transport whose service lacks the given characteristic.
    pub fn without_characteristic(self, characteristic: u16) -> Self {
        let mut characteristics = self.service.characteristics.clone();
        characteristics.remove(&characteristic);
        Self {
            service: Arc::new(MockService {
                id: self.service.id,
                characteristics,
            }),
            ..self
        }
    }

    /// Access a characteristic for scripting and assertions.
    ///
    /// Panics when the characteristic was removed; tests that remove a
    /// characteristic have no business scripting it.
    pub fn characteristic(&self, characteristic: u16) -> Arc<MockCharacteristic> {
        self.service.characteristics[&characteristic].clone()
    }

    /// Number of times the link was torn down.
    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn primary_service(&self, service: u16) -> Result<Arc<dyn ServiceHandle>> {
        if !self.expose_service || service != self.service.id {
            return Err(TransportError::ServiceNotFound { service }.into());
        }
        Ok(self.service.clone() as Arc<dyn ServiceHandle>)
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
