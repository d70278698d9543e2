//! Device identity and session configuration
//!
//! This module contains the types that identify an end device and describe
//! its session as the network server sees it:
//! - Device identity (DevEUI, DevAddr)
//! - Device class
//! - Activation mode

/// Device identity, class and activation state
pub mod device;

pub use device::{ActivationState, DeviceClass, DeviceId};
