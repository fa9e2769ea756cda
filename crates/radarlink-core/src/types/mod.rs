//! Type system utilities and aliases.
//!
//! This module provides type aliases and constructor helpers for the
//! shared-state types used throughout the workspace.
//!
//! ## Modules
//!
//! - [`aliases`]: Type aliases for `Arc<Mutex<T>>`, `Arc<RwLock<T>>`, callbacks, etc.

pub mod aliases;

pub use aliases::*;
