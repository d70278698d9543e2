//! Domain events for processed MAC commands
//!
//! Every successfully processed uplink command yields exactly one event.
//! Events are handed to an [`EventSink`] after the state change; a failing
//! sink never undoes the change.

use crate::config::device::DeviceId;
use super::commands::{MacRequest, MacResponse, ProprietaryPayload};
use super::mac::DeviceStatus;

/// Kind of MAC event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum EventKind {
    ResetIndication,
    LinkCheckRequest,
    LinkAdrAccept,
    LinkAdrReject,
    DutyCycleAnswer,
    RxParamSetupAccept,
    RxParamSetupReject,
    DeviceStatusAnswer,
    NewChannelAccept,
    NewChannelReject,
    RxTimingSetupAnswer,
    TxParamSetupAnswer,
    DlChannelAccept,
    DlChannelReject,
    RekeyIndication,
    AdrParamSetupAnswer,
    DeviceTimeRequest,
    RejoinParamAccept,
    RejoinParamReject,
    PingSlotInfoRequest,
    PingSlotChannelAccept,
    PingSlotChannelReject,
    BeaconFreqAccept,
    BeaconFreqReject,
    DeviceModeIndication,
    Proprietary,
}

impl EventKind {
    /// Stable event name
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ResetIndication => "ns.mac.reset.indication",
            EventKind::LinkCheckRequest => "ns.mac.link_check.request",
            EventKind::LinkAdrAccept => "ns.mac.link_adr.accept",
            EventKind::LinkAdrReject => "ns.mac.link_adr.reject",
            EventKind::DutyCycleAnswer => "ns.mac.duty_cycle.answer",
            EventKind::RxParamSetupAccept => "ns.mac.rx_param_setup.accept",
            EventKind::RxParamSetupReject => "ns.mac.rx_param_setup.reject",
            EventKind::DeviceStatusAnswer => "ns.mac.device_status.answer",
            EventKind::NewChannelAccept => "ns.mac.new_channel.accept",
            EventKind::NewChannelReject => "ns.mac.new_channel.reject",
            EventKind::RxTimingSetupAnswer => "ns.mac.rx_timing_setup.answer",
            EventKind::TxParamSetupAnswer => "ns.mac.tx_param_setup.answer",
            EventKind::DlChannelAccept => "ns.mac.dl_channel.accept",
            EventKind::DlChannelReject => "ns.mac.dl_channel.reject",
            EventKind::RekeyIndication => "ns.mac.rekey.indication",
            EventKind::AdrParamSetupAnswer => "ns.mac.adr_param_setup.answer",
            EventKind::DeviceTimeRequest => "ns.mac.device_time.request",
            EventKind::RejoinParamAccept => "ns.mac.rejoin_param.accept",
            EventKind::RejoinParamReject => "ns.mac.rejoin_param.reject",
            EventKind::PingSlotInfoRequest => "ns.mac.ping_slot_info.request",
            EventKind::PingSlotChannelAccept => "ns.mac.ping_slot_channel.accept",
            EventKind::PingSlotChannelReject => "ns.mac.ping_slot_channel.reject",
            EventKind::BeaconFreqAccept => "ns.mac.beacon_freq.accept",
            EventKind::BeaconFreqReject => "ns.mac.beacon_freq.reject",
            EventKind::DeviceModeIndication => "ns.mac.device_mode.indication",
            EventKind::Proprietary => "ns.mac.proprietary",
        }
    }
}

/// What an event reports
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventDetails {
    /// The matched request, with the values it carried
    Request(MacRequest),
    /// The response queued for a device-initiated command
    Response(MacResponse),
    /// The status reported in a DevStatusAns
    DeviceStatus(DeviceStatus),
    /// A proprietary command, by CID and raw payload
    Proprietary {
        /// Command identifier
        cid: u8,
        /// Raw payload
        payload: ProprietaryPayload,
    },
}

/// Event produced by one processed command
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    /// Event kind
    pub kind: EventKind,
    /// Event details
    pub details: EventDetails,
}

impl Event {
    /// Create a new event
    pub fn new(kind: EventKind, details: EventDetails) -> Self {
        Self { kind, details }
    }

    /// Event about a matched request
    pub fn request(kind: EventKind, request: MacRequest) -> Self {
        Self::new(kind, EventDetails::Request(request))
    }

    /// Event about a queued response
    pub fn response(kind: EventKind, response: MacResponse) -> Self {
        Self::new(kind, EventDetails::Response(response))
    }
}

/// Receiver of MAC events
///
/// Publishing is fire-and-forget: errors are logged by the caller and
/// otherwise ignored. Implementations should not block.
pub trait EventSink {
    /// Error type of the sink
    type Error: core::fmt::Debug;

    /// Publish one event for a device
    fn publish(
        &mut self,
        kind: EventKind,
        device: &DeviceId,
        details: &EventDetails,
    ) -> Result<(), Self::Error>;
}
