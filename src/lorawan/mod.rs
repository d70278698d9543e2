//! LoRaWAN network-server MAC implementation
//!
//! This module contains the MAC command state machine, including:
//! - MAC command identifiers and payloads
//! - Regional defaults
//! - Per-device MAC state and pending-request queue
//! - Per-command answer handlers
//! - Command registry and uplink processor
//! - Event publishing

/// MAC command identifiers and payloads
pub mod commands;

/// Domain events emitted for processed commands
pub mod events;

/// Per-command answer and indication handlers
pub mod handlers;

/// Per-device MAC state
pub mod mac;

/// Uplink command processing
pub mod processor;

/// Regional parameters and defaults
pub mod region;

/// Command dispatch
pub mod registry;

pub use events::{Event, EventDetails, EventKind, EventSink};
pub use mac::{MacError, MacParameters, MacState};
pub use processor::{process_uplink_commands, ProcessError, UplinkContext, UplinkReport};
pub use registry::{CommandRegistry, RegistryError};
