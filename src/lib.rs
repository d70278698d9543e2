//! LoRaWAN network-server MAC layer in Rust
//!
//! This crate tracks, per end device, the negotiated LoRaWAN radio and session
//! parameters and advances them as MAC command answers arrive in uplinks.
//! It supports LoRaWAN 1.0.x and 1.1 command families, including Class B.
//!
//! # Features
//! - Typed MAC requests, answers and indications
//! - FIFO matching of answers against pending downlink requests
//! - Per-field acknowledgment handling for every command family
//! - Per-frame processing with per-command isolation
//! - Proprietary command registration
//! - No allocation, no unsafe code
//!
//! # Example
//! ```
//! use core::time::Duration;
//!
//! use lorawan_ns::{
//!     config::device::{ActivationState, DeviceId},
//!     lorawan::{
//!         commands::{MacRequest, RejoinCountExponent, RejoinParamSetupAns, RejoinParamSetupReq,
//!             RejoinTimeExponent, UplinkCommand},
//!         events::{EventDetails, EventKind, EventSink},
//!         mac::MacState,
//!         processor::{process_uplink_commands, UplinkContext},
//!         region::Region,
//!         registry::CommandRegistry,
//!     },
//! };
//!
//! struct Discard;
//!
//! impl EventSink for Discard {
//!     type Error = ();
//!
//!     fn publish(&mut self, _: EventKind, _: &DeviceId, _: &EventDetails) -> Result<(), ()> {
//!         Ok(())
//!     }
//! }
//!
//! let registry = CommandRegistry::new();
//! let mut state = MacState::new(Region::EU868, ActivationState::OTAAActivated);
//! state
//!     .enqueue(MacRequest::RejoinParamSetup(RejoinParamSetupReq {
//!         max_count_exponent: RejoinCountExponent::Count128,
//!         max_time_exponent: RejoinTimeExponent::Time10,
//!     }))
//!     .unwrap();
//!
//! let commands = [UplinkCommand::RejoinParamSetupAns(Some(RejoinParamSetupAns {
//!     max_time_exponent_ack: true,
//! }))];
//! let ctx = UplinkContext::new(DeviceId::new([0x01; 8], [0x02; 4]), Duration::from_secs(1_400_000_000));
//!
//! let report = process_uplink_commands(&registry, &mut state, &commands, &ctx, &mut Discard).unwrap();
//! assert_eq!(report.events.len(), 1);
//! assert!(state.pending_requests.is_empty());
//! ```

#![warn(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

/// Device identities, classes and activation
pub mod config;

/// LoRaWAN MAC layer implementation
pub mod lorawan;
