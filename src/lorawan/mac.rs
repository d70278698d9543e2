use core::fmt;

use heapless::Vec;

use crate::config::device::{ActivationState, DeviceClass};
use super::commands::{Cid, MacRequest, MacResponse, RejoinCountExponent, RejoinTimeExponent};
use super::region::{Channel, Region, MAX_CHANNELS};

/// Maximum number of unanswered downlink requests per device
pub const MAX_PENDING_REQUESTS: usize = 16;

/// Maximum number of responses waiting for the next downlink
pub const MAX_QUEUED_RESPONSES: usize = 16;

/// Maximum number of command families reported by [`MacState::diverged`]
pub const MAX_DIVERGED: usize = 16;

/// MAC command processing error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacError {
    /// The decoded command carries no payload
    MissingPayload,
    /// No pending request of the answered type
    NoMatchingRequest,
    /// No handler for the command identifier
    UnsupportedCommand,
    /// A field holds a value outside its valid domain
    InvalidFieldValue,
    /// A bounded queue is at capacity
    QueueFull,
}

impl fmt::Display for MacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacError::MissingPayload => f.write_str("command payload missing"),
            MacError::NoMatchingRequest => f.write_str("no pending request matches the answer"),
            MacError::UnsupportedCommand => f.write_str("unsupported MAC command"),
            MacError::InvalidFieldValue => f.write_str("field value out of range"),
            MacError::QueueFull => f.write_str("queue full"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MacError {}

/// Radio and session parameters of an end device
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MacParameters {
    /// Uplink data rate index
    pub adr_data_rate_index: u8,
    /// Uplink TX power index
    pub adr_tx_power_index: u8,
    /// Number of transmissions per uplink
    pub adr_nb_trans: u8,
    /// ADR_ACK_LIMIT as `2^n`
    pub adr_ack_limit_exponent: u8,
    /// ADR_ACK_DELAY as `2^n`
    pub adr_ack_delay_exponent: u8,
    /// Channels, indexed by channel number
    pub channels: Vec<Channel, MAX_CHANNELS>,
    /// Aggregated duty cycle as `1 / 2^n`
    pub max_duty_cycle: u8,
    /// RX1 delay in seconds
    pub rx1_delay: u8,
    /// RX1 data rate offset
    pub rx1_data_rate_offset: u8,
    /// RX2 data rate index
    pub rx2_data_rate_index: u8,
    /// RX2 frequency in Hz
    pub rx2_frequency: u32,
    /// MaxEIRP index
    pub max_eirp_index: u8,
    /// Uplink dwell time limited to 400 ms
    pub uplink_dwell_time: bool,
    /// Downlink dwell time limited to 400 ms
    pub downlink_dwell_time: bool,
    /// Rejoin count periodicity
    pub rejoin_count_periodicity: RejoinCountExponent,
    /// Rejoin time periodicity
    pub rejoin_time_periodicity: RejoinTimeExponent,
    /// Class B ping slot periodicity, once announced by the device
    pub ping_slot_periodicity: Option<u8>,
    /// Ping slot frequency in Hz (0 = region default)
    pub ping_slot_frequency: u32,
    /// Ping slot data rate index
    pub ping_slot_data_rate_index: u8,
    /// Beacon frequency in Hz (0 = region default)
    pub beacon_frequency: u32,
}

/// Last DevStatusAns received from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceStatus {
    /// Battery level (0 = external power, 1-254 = level, 255 = unknown)
    pub battery: u8,
    /// Demodulation margin in dB
    pub margin: i8,
    /// Uplink frame counter of the frame carrying the answer
    pub f_cnt_up: u32,
}

/// Per-device MAC state
///
/// Current parameters only move when the device confirms a change.
/// Desired parameters are owned by the ADR and policy layers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MacState {
    /// Region the device operates in
    pub region: Region,
    /// How the session was activated
    pub activation: ActivationState,
    /// Current device class
    pub device_class: DeviceClass,
    /// Parameters the device is believed to use
    pub current_parameters: MacParameters,
    /// Parameters the network wants the device to use
    pub desired_parameters: MacParameters,
    /// Unanswered downlink requests, oldest first
    pub pending_requests: Vec<MacRequest, MAX_PENDING_REQUESTS>,
    /// Answers to device-initiated commands, waiting for a downlink
    pub queued_responses: Vec<MacResponse, MAX_QUEUED_RESPONSES>,
    /// Last reported device status
    pub last_device_status: Option<DeviceStatus>,
}

impl MacState {
    /// Create the MAC state of a freshly activated device
    pub fn new(region: Region, activation: ActivationState) -> Self {
        let parameters = region.default_parameters();
        Self {
            region,
            activation,
            device_class: DeviceClass::A,
            current_parameters: parameters.clone(),
            desired_parameters: parameters,
            pending_requests: Vec::new(),
            queued_responses: Vec::new(),
            last_device_status: None,
        }
    }

    /// Record a request sent to the device.
    ///
    /// Proprietary requests must carry a CID in the proprietary range.
    pub fn enqueue(&mut self, request: MacRequest) -> Result<(), MacError> {
        if let MacRequest::Proprietary { cid, .. } = &request {
            if !Cid::is_proprietary(*cid) {
                return Err(MacError::InvalidFieldValue);
            }
        }
        self.pending_requests
            .push(request)
            .map_err(|_| MacError::QueueFull)
    }

    /// Remove and return the oldest pending request accepted by `predicate`
    pub fn dequeue_first_matching<F>(&mut self, mut predicate: F) -> Option<MacRequest>
    where
        F: FnMut(&MacRequest) -> bool,
    {
        let index = self.pending_requests.iter().position(|r| predicate(r))?;
        self.pending_requests[index..].rotate_left(1);
        self.pending_requests.pop()
    }

    /// Oldest pending request for which `extract` yields a value, left in place
    pub fn find_request<T, F>(&self, extract: F) -> Option<T>
    where
        F: FnMut(&MacRequest) -> Option<T>,
    {
        self.pending_requests.iter().find_map(extract)
    }

    /// Whether a request with the given CID is awaiting an answer
    pub fn has_pending(&self, cid: u8) -> bool {
        self.pending_requests.iter().any(|r| r.cid() == cid)
    }

    /// Mutate the current parameters
    pub fn apply_current<F>(&mut self, mutator: F)
    where
        F: FnOnce(&mut MacParameters),
    {
        mutator(&mut self.current_parameters)
    }

    /// Queue a response for the next downlink
    pub fn queue_response(&mut self, response: MacResponse) -> Result<(), MacError> {
        self.queued_responses
            .push(response)
            .map_err(|_| MacError::QueueFull)
    }

    /// Return to the region defaults after a device reset.
    ///
    /// Desired parameters are kept so the scheduler re-converges.
    pub fn reset(&mut self) {
        self.current_parameters = self.region.default_parameters();
        self.pending_requests.clear();
        self.queued_responses.clear();
    }

    /// Command families whose desired and current parameters differ and
    /// that have no request in flight
    pub fn diverged(&self) -> Vec<Cid, MAX_DIVERGED> {
        let current = &self.current_parameters;
        let desired = &self.desired_parameters;
        let mut families = Vec::new();

        let channels_differ = |f: fn(&Channel) -> (u32, u8, u8)| {
            current.channels.len() != desired.channels.len()
                || current.channels.iter().zip(desired.channels.iter()).any(|(c, d)| f(c) != f(d))
        };

        let checks = [
            (
                Cid::LinkADR,
                current.adr_data_rate_index != desired.adr_data_rate_index
                    || current.adr_tx_power_index != desired.adr_tx_power_index
                    || current.adr_nb_trans != desired.adr_nb_trans
                    || channels_differ(|c| (0, c.enable_uplink as u8, 0)),
            ),
            (Cid::DutyCycle, current.max_duty_cycle != desired.max_duty_cycle),
            (
                Cid::RXParamSetup,
                current.rx1_data_rate_offset != desired.rx1_data_rate_offset
                    || current.rx2_data_rate_index != desired.rx2_data_rate_index
                    || current.rx2_frequency != desired.rx2_frequency,
            ),
            (
                Cid::NewChannel,
                channels_differ(|c| (c.uplink_frequency, c.min_data_rate_index, c.max_data_rate_index)),
            ),
            (Cid::RXTimingSetup, current.rx1_delay != desired.rx1_delay),
            (
                Cid::TxParamSetup,
                current.max_eirp_index != desired.max_eirp_index
                    || current.uplink_dwell_time != desired.uplink_dwell_time
                    || current.downlink_dwell_time != desired.downlink_dwell_time,
            ),
            (
                Cid::DlChannel,
                channels_differ(|c| (c.downlink_frequency.unwrap_or(0), 0, 0)),
            ),
            (
                Cid::ADRParamSetup,
                current.adr_ack_limit_exponent != desired.adr_ack_limit_exponent
                    || current.adr_ack_delay_exponent != desired.adr_ack_delay_exponent,
            ),
            (
                Cid::RejoinParamSetup,
                current.rejoin_count_periodicity != desired.rejoin_count_periodicity
                    || current.rejoin_time_periodicity != desired.rejoin_time_periodicity,
            ),
            (
                Cid::PingSlotChannel,
                current.ping_slot_frequency != desired.ping_slot_frequency
                    || current.ping_slot_data_rate_index != desired.ping_slot_data_rate_index,
            ),
            (Cid::BeaconFreq, current.beacon_frequency != desired.beacon_frequency),
        ];

        for (cid, differs) in checks {
            if differs && !self.has_pending(cid as u8) {
                // fewer families than MAX_DIVERGED
                let _ = families.push(cid);
            }
        }
        families
    }
}
