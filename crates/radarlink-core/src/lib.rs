//! # RadarLink Core
//!
//! Core types and utilities for the RadarLink serial-over-BLE transport.
//! Provides the frame codec, the session event bus, the error taxonomy,
//! and shared type aliases used across the workspace.

pub mod codec;
pub mod error;
pub mod event_bus;
pub mod types;

pub use codec::{auth_command, decode_hex, encode_hex, AUTH_COMMAND_HEX};

pub use error::{CodecError, Error, Result, TransportError};

// Re-export event bus for convenience
pub use event_bus::{EventBus, LinkEvent, SubscriptionId};

// Re-export type aliases for convenience
pub use types::{
    thread_safe, thread_safe_deque, thread_safe_none, thread_safe_rw, thread_safe_vec,
    DataCallback, ThreadSafe, ThreadSafeDeque, ThreadSafeOption, ThreadSafeRw, ThreadSafeVec,
};
