//! # Event Bus Module
//!
//! Publish/subscribe distribution of session lifecycle and data events.
//!
//! ## Overview
//!
//! The bus carries every observable fact about one serial session:
//! - The lifecycle controller publishes `Connected` and `Disconnected`
//! - The write pump publishes a `Write` per transmitted frame
//! - The read listener publishes a `Read` per inbound notification
//! - Each new subscriber receives `Subscribed` once, synchronously
//!
//! There is no buffering: a subscriber sees only events broadcast after
//! its registration.
//!
//! ## Usage
//!
//! ```rust
//! use radarlink_core::event_bus::{EventBus, LinkEvent};
//!
//! let bus = EventBus::new();
//! let subscription = bus.subscribe(|event| {
//!     if let LinkEvent::Read { payload } = event {
//!         println!("frame: {} bytes", payload.len());
//!     }
//! });
//!
//! bus.broadcast(LinkEvent::Read { payload: vec![0xFD, 0xFC] });
//!
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
