//! Session lifecycle controller for the serial channel.
//!
//! Orchestrates one logical connection: characteristic acquisition, the
//! login handshake, the outbound write pump, and the inbound
//! notification listener. Consumers see four operations: `connect`,
//! `disconnect`, `write`, `subscribe`.
//!
//! The write pump is a spawned task draining the outbound queue one
//! frame per tick, because the link accepts only one outstanding write
//! at a time; its cadence bounds outbound throughput to one frame per
//! pump interval. Inbound frames are event-driven: the driver invokes
//! the notification handler, which rebroadcasts the bytes untouched.

use crate::transport::{
    CharacteristicHandle, Transport, NOTIFY_CHARACTERISTIC, SERIAL_SERVICE, WRITE_CHARACTERISTIC,
};
use radarlink_core::codec;
use radarlink_core::error::{Error, Result, TransportError};
use radarlink_core::event_bus::{EventBus, LinkEvent, SubscriptionId};
use radarlink_core::types::{
    thread_safe_deque, thread_safe_none, thread_safe_rw, ThreadSafeDeque, ThreadSafeOption,
    ThreadSafeRw,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// State of one serial session
///
/// Tracks where the controller is in its lifecycle. There is no terminal
/// state: a completed teardown returns to `Idle`, from which a new
/// session may be established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session; ready to connect
    Idle,
    /// Acquiring the service and characteristic handles
    Connecting,
    /// Session established; pump and listener running
    Connected,
    /// Teardown in progress
    Disconnecting,
}

impl SessionState {
    /// Check if a transition from this state to `target` is valid.
    ///
    /// Valid transitions:
    /// - Idle → Connecting
    /// - Connecting → Connected, Idle
    /// - Idle, Connecting, Connected → Disconnecting
    /// - Disconnecting → Idle
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, target),
            (Idle, Connecting)
                | (Connecting, Connected | Idle)
                | (Idle | Connecting | Connected, Disconnecting)
                | (Disconnecting, Idle)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnecting => write!(f, "Disconnecting"),
        }
    }
}

/// Configuration for the session controller
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Delay between write pump ticks. Bounds outbound throughput to
    /// one frame per interval and bounds how long `disconnect` may take
    /// to be observed by the pump.
    pub pump_interval: Duration,
    /// Capacity of the async event receiver channel.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pump_interval: Duration::from_millis(100),
            event_capacity: 1024,
        }
    }
}

/// Hook invoked with the error of each failed frame submission.
type WriteFailureHandler = Arc<dyn Fn(Error) + Send + Sync>;

/// Serial session controller
///
/// Owns the event bus, the outbound queue, and the session handles for
/// exactly one logical connection at a time. `connect` may be called
/// again after a completed `disconnect`; each established session gets a
/// fresh stop flag, so a stopped session can never bleed into the next.
pub struct SerialSession {
    transport: Arc<dyn Transport>,
    config: SessionConfig,
    bus: Arc<EventBus>,
    /// Outbound frames awaiting transmission, oldest first.
    write_queue: ThreadSafeDeque<Vec<u8>>,
    state: ThreadSafeRw<SessionState>,
    /// Stop flag of the current session. Once set it is never cleared;
    /// `connect` installs a fresh flag instead.
    stopping: ThreadSafeRw<Arc<AtomicBool>>,
    send_characteristic: ThreadSafeRw<Option<Arc<dyn CharacteristicHandle>>>,
    recv_characteristic: ThreadSafeRw<Option<Arc<dyn CharacteristicHandle>>>,
    pump_task: ThreadSafeOption<JoinHandle<()>>,
    write_failure_handler: ThreadSafeOption<WriteFailureHandler>,
}

impl SerialSession {
    /// Create a session controller with the default configuration
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    /// Create a session controller with a custom configuration
    pub fn with_config(transport: Arc<dyn Transport>, config: SessionConfig) -> Self {
        let bus = Arc::new(EventBus::with_capacity(config.event_capacity));
        Self {
            transport,
            config,
            bus,
            write_queue: thread_safe_deque(),
            state: thread_safe_rw(SessionState::Idle),
            stopping: thread_safe_rw(Arc::new(AtomicBool::new(false))),
            send_characteristic: thread_safe_rw(None),
            recv_characteristic: thread_safe_rw(None),
            pump_task: thread_safe_none(),
            write_failure_handler: thread_safe_none(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// Number of frames waiting in the outbound queue
    pub fn queued_writes(&self) -> usize {
        self.write_queue.lock().len()
    }

    /// Subscribe to session events
    ///
    /// The handler receives [`LinkEvent::Subscribed`] synchronously
    /// before this method returns, then every later event in broadcast
    /// order. Handlers run on the broadcasting task and must not panic.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(LinkEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(handler)
    }

    /// Remove a subscription; no-op if already removed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Get an async receiver mirroring every broadcast event
    pub fn events(&self) -> broadcast::Receiver<LinkEvent> {
        self.bus.receiver()
    }

    /// Install a hook invoked with the error of each failed frame
    /// submission (handshake included). Without a hook, failures are
    /// only logged.
    pub fn set_write_failure_handler<F>(&self, handler: F)
    where
        F: Fn(Error) + Send + Sync + 'static,
    {
        *self.write_failure_handler.lock() = Some(Arc::new(handler));
    }

    /// Enqueue an outbound frame
    ///
    /// Never blocks and never fails, in any state. Frames queued before
    /// `connect` are flushed once the session is established; frames
    /// still queued when `disconnect` runs are dropped.
    pub fn write(&self, payload: Vec<u8>) {
        self.write_queue.lock().push_back(payload);
    }

    /// Establish a session
    ///
    /// Acquires the serial service and both characteristics, submits the
    /// login frame, starts the read listener and the write pump, then
    /// broadcasts [`LinkEvent::Connected`]. On any acquisition failure
    /// the error is returned, the controller is left `Idle`, and no
    /// event is broadcast.
    ///
    /// # Errors
    ///
    /// Fails with [`TransportError::AlreadyConnected`] unless the
    /// controller is `Idle`, and with the driver's error when service or
    /// characteristic acquisition fails.
    pub async fn connect(&self) -> Result<()> {
        self.transition(SessionState::Connecting)?;

        // Fresh stop flag for the new session; the previous session's
        // flag stays set forever.
        *self.stopping.write() = Arc::new(AtomicBool::new(false));

        match self.establish().await {
            Ok(()) => {
                *self.state.write() = SessionState::Connected;
                self.bus.broadcast(LinkEvent::Connected);
                tracing::debug!("session established");
                Ok(())
            }
            Err(err) => {
                // No partial session: drop whatever was acquired and
                // return to Idle without emitting an event.
                self.send_characteristic.write().take();
                self.recv_characteristic.write().take();
                *self.state.write() = SessionState::Idle;
                Err(err)
            }
        }
    }

    /// Tear down the session
    ///
    /// Sets the stop flag (the pump exits at its next tick boundary),
    /// stops notifications, clears the outbound queue, asks the driver
    /// to terminate the link, then broadcasts
    /// [`LinkEvent::Disconnected`] and returns to `Idle`.
    ///
    /// # Errors
    ///
    /// Returns the driver's teardown error, after local state has
    /// already been reset.
    pub async fn disconnect(&self) -> Result<()> {
        self.transition(SessionState::Disconnecting)?;
        self.stopping.read().store(true, Ordering::SeqCst);

        // Stale frames must not replay into a future session.
        let dropped = {
            let mut queue = self.write_queue.lock();
            let dropped = queue.len();
            queue.clear();
            dropped
        };
        if dropped > 0 {
            tracing::debug!("dropped {} queued frames on disconnect", dropped);
        }

        let receiver = self.recv_characteristic.write().take();
        if let Some(receiver) = receiver {
            if let Err(err) = receiver.stop_notifications().await {
                tracing::error!("failed to stop notifications: {}", err);
            }
        }
        self.send_characteristic.write().take();

        // The pump holds its own clones; it exits on its own at the
        // next tick, so the handle can be detached.
        self.pump_task.lock().take();

        let result = self.transport.disconnect().await;
        *self.state.write() = SessionState::Idle;
        self.bus.broadcast(LinkEvent::Disconnected);
        tracing::debug!("session torn down");
        result
    }

    fn transition(&self, target: SessionState) -> Result<()> {
        let mut state = self.state.write();
        if !state.can_transition_to(target) {
            return Err(match target {
                SessionState::Connecting => TransportError::AlreadyConnected,
                _ => TransportError::NotConnected,
            }
            .into());
        }
        *state = target;
        Ok(())
    }

    async fn establish(&self) -> Result<()> {
        let service = self.transport.primary_service(SERIAL_SERVICE).await?;
        let send = service.characteristic(WRITE_CHARACTERISTIC).await?;
        let recv = service.characteristic(NOTIFY_CHARACTERISTIC).await?;

        *self.send_characteristic.write() = Some(send.clone());
        *self.recv_characteristic.write() = Some(recv.clone());

        self.login(&send).await;
        self.start_read_listener().await?;
        self.start_write_pump(send);
        Ok(())
    }

    /// Submit the login frame.
    ///
    /// The firmware ignores every other command until it has seen this
    /// one. Submission is awaited, but the firmware's acknowledgment is
    /// not: validating the handshake is the protocol layer's job, and a
    /// failed submission is reported to the failure hook rather than
    /// aborting the connection.
    async fn login(&self, send: &Arc<dyn CharacteristicHandle>) {
        let frame = match codec::auth_command() {
            Ok(frame) => frame,
            Err(err) => {
                tracing::error!("login frame does not decode: {}", err);
                return;
            }
        };
        if let Err(err) = send.write_value(&frame).await {
            tracing::warn!("login write failed: {}", err);
            self.report_write_failure(err);
        }
    }

    async fn start_read_listener(&self) -> Result<()> {
        let receiver = self.recv_characteristic.read().clone();
        let Some(receiver) = receiver else {
            // Acquisition failures abort connect before this point; an
            // absent handle just means inbound frames are unavailable.
            tracing::debug!("receive characteristic absent, inbound frames disabled");
            return Ok(());
        };

        let bus = self.bus.clone();
        receiver
            .start_notifications(Box::new(move |payload| {
                bus.broadcast(LinkEvent::Read { payload });
            }))
            .await
    }

    fn start_write_pump(&self, send: Arc<dyn CharacteristicHandle>) {
        let stopping = self.stopping.read().clone();
        let queue = self.write_queue.clone();
        let bus = self.bus.clone();
        let failure_handler = self.write_failure_handler.clone();
        let interval = self.config.pump_interval;

        let handle = tokio::spawn(async move {
            loop {
                if stopping.load(Ordering::SeqCst) {
                    break;
                }

                let frame = queue.lock().pop_front();
                if let Some(frame) = frame {
                    match send.write_value(&frame).await {
                        Ok(()) => {
                            bus.broadcast(LinkEvent::Write { payload: frame });
                        }
                        Err(err) => {
                            // The frame is dropped, not requeued; the
                            // pump keeps running.
                            tracing::warn!("outbound frame dropped: {}", err);
                            let handler = failure_handler.lock().clone();
                            if let Some(handler) = handler {
                                handler(err);
                            }
                        }
                    }
                }

                tokio::time::sleep(interval).await;
            }
            tracing::debug!("write pump stopped");
        });

        *self.pump_task.lock() = Some(handle);
    }

    fn report_write_failure(&self, err: Error) {
        let handler = self.write_failure_handler.lock().clone();
        if let Some(handler) = handler {
            handler(err);
        }
    }
}

impl Drop for SerialSession {
    fn drop(&mut self) {
        // Stop a still-running pump; it owns clones of the queue and
        // bus and would otherwise tick forever.
        self.stopping.read().store(true, Ordering::SeqCst);
    }
}

impl fmt::Debug for SerialSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialSession")
            .field("state", &self.state())
            .field("queued_writes", &self.queued_writes())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        use SessionState::*;

        assert!(Idle.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(Connected));
        assert!(Connecting.can_transition_to(Idle));
        assert!(Connected.can_transition_to(Disconnecting));
        assert!(Disconnecting.can_transition_to(Idle));

        // Disconnect may start from any live state.
        assert!(Idle.can_transition_to(Disconnecting));
        assert!(Connecting.can_transition_to(Disconnecting));

        // A second connect attempt is never valid mid-session.
        assert!(!Connecting.can_transition_to(Connecting));
        assert!(!Connected.can_transition_to(Connecting));
        assert!(!Disconnecting.can_transition_to(Connecting));
        assert!(!Connected.can_transition_to(Connected));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Idle.to_string(), "Idle");
        assert_eq!(SessionState::Disconnecting.to_string(), "Disconnecting");
    }

    #[test]
    fn test_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.pump_interval, Duration::from_millis(100));
        assert_eq!(config.event_capacity, 1024);
    }
}
