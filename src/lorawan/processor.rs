//! Uplink command processing
//!
//! Processes the MAC commands of one uplink frame, in frame order, against
//! one device's MAC state:
//! - Each command is dispatched through the [`CommandRegistry`]
//! - A failing command is rolled back and reported; the rest still run
//! - The resulting state is written back once, after the whole frame
//! - Events are published after the state has been written back
//!
//! Calls for the same device must not overlap: the caller serializes frames
//! per device, for example with one worker per device session.

use core::fmt;
use core::time::Duration;

use heapless::Vec;
use log::{debug, warn};

use crate::config::device::DeviceId;
use super::commands::UplinkCommand;
use super::events::{Event, EventSink};
use super::mac::{MacError, MacState};
use super::registry::CommandRegistry;

/// Maximum number of MAC commands processed from one uplink
pub const MAX_UPLINK_COMMANDS: usize = 32;

/// Facts about the uplink carrying the commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UplinkContext {
    /// Device that sent the uplink
    pub device: DeviceId,
    /// GPS time at which the uplink was received
    pub received_at: Duration,
    /// Number of gateways that received the uplink
    pub gateway_count: u8,
    /// Best link margin in dB above the demodulation floor
    pub margin: u8,
    /// Uplink frame counter
    pub f_cnt_up: u32,
}

impl UplinkContext {
    /// Create a context for an uplink received at GPS time `received_at`
    pub fn new(device: DeviceId, received_at: Duration) -> Self {
        Self {
            device,
            received_at,
            gateway_count: 1,
            margin: 0,
            f_cnt_up: 0,
        }
    }

    /// Set the link quality reported by LinkCheckAns
    pub fn with_link_quality(mut self, gateway_count: u8, margin: u8) -> Self {
        self.gateway_count = gateway_count;
        self.margin = margin;
        self
    }

    /// Set the uplink frame counter
    pub fn with_f_cnt_up(mut self, f_cnt_up: u32) -> Self {
        self.f_cnt_up = f_cnt_up;
        self
    }
}

/// Failure of one command in a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandError {
    /// Position of the command in the frame
    pub index: usize,
    /// Command identifier
    pub cid: u8,
    /// What went wrong
    pub error: MacError,
}

/// Outcome of processing one uplink frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UplinkReport {
    /// Events of the commands that were processed, in frame order
    pub events: Vec<Event, MAX_UPLINK_COMMANDS>,
    /// Commands that failed, in frame order
    pub errors: Vec<CommandError, MAX_UPLINK_COMMANDS>,
}

impl UplinkReport {
    /// Whether every command was processed
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Frame-level processing error; the state is untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProcessError {
    /// The frame holds more than [`MAX_UPLINK_COMMANDS`] commands
    TooManyCommands,
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::TooManyCommands => write!(
                f,
                "more than {} MAC commands in one uplink",
                MAX_UPLINK_COMMANDS
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProcessError {}

/// Process the MAC commands of one uplink frame
pub fn process_uplink_commands<S: EventSink>(
    registry: &CommandRegistry,
    state: &mut MacState,
    commands: &[UplinkCommand],
    ctx: &UplinkContext,
    sink: &mut S,
) -> Result<UplinkReport, ProcessError> {
    if commands.len() > MAX_UPLINK_COMMANDS {
        warn!(
            "Dropping uplink of {:02X?} with {} MAC commands",
            ctx.device.dev_eui,
            commands.len()
        );
        return Err(ProcessError::TooManyCommands);
    }

    let mut working = state.clone();
    let mut report = UplinkReport::default();

    for (index, command) in commands.iter().enumerate() {
        let cid = command.cid();
        let checkpoint = working.clone();

        // both pushes stay within commands.len() <= MAX_UPLINK_COMMANDS
        match registry.dispatch(&mut working, command, ctx) {
            Ok(event) => {
                debug!("MAC command 0x{:02X}: {}", cid, event.kind.name());
                let _ = report.events.push(event);
            }
            Err(error) => {
                warn!(
                    "MAC command 0x{:02X} at position {} from {:02X?} failed: {}",
                    cid, index, ctx.device.dev_eui, error
                );
                working = checkpoint;
                let _ = report.errors.push(CommandError { index, cid, error });
            }
        }
    }

    *state = working;

    for event in report.events.iter() {
        if let Err(err) = sink.publish(event.kind, &ctx.device, &event.details) {
            warn!("Failed to publish {}: {:?}", event.kind.name(), err);
        }
    }

    Ok(report)
}
