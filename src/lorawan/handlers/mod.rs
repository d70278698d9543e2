//! Per-command handlers
//!
//! Each handler processes one uplink command against one device's MAC state:
//! - Answers are matched against the oldest pending request of their type
//! - A matched request is consumed whether the device accepted it or not
//! - Accepted values are merged into the current parameters field by field
//! - Device-initiated commands queue a response for the next downlink
//!
//! Handlers validate everything before they mutate, so an error leaves the
//! state exactly as it was. A matched request that cannot be applied to the
//! device's channel plan is still consumed, and reported as rejected. On
//! success they return the one event describing the outcome.

use log::trace;

use super::commands::{Cid, MacRequest};
use super::mac::{MacError, MacState};

/// Class B commands: device time, ping slots and beacons
pub mod class_b;

/// Link control commands: ADR, channels, duty cycle, device status
pub mod link;

/// Receive window commands
pub mod rx;

/// Session commands: reset, rekey, rejoin and device mode
pub mod session;

pub use class_b::{
    handle_beacon_freq_ans, handle_device_time_req, handle_ping_slot_channel_ans,
    handle_ping_slot_info_req,
};
pub use link::{
    handle_adr_param_setup_ans, handle_dev_status_ans, handle_dl_channel_ans,
    handle_duty_cycle_ans, handle_link_adr_ans, handle_link_check_req, handle_new_channel_ans,
    handle_tx_param_setup_ans,
};
pub use rx::{handle_rx_param_setup_ans, handle_rx_timing_setup_ans};
pub use session::{
    handle_device_mode_ind, handle_rejoin_param_setup_ans, handle_rekey_ind, handle_reset_ind,
};

/// Oldest pending request `extract` accepts, without consuming it
fn pending<T, F>(state: &MacState, extract: F) -> Result<T, MacError>
where
    F: FnMut(&MacRequest) -> Option<T>,
{
    state
        .find_request(extract)
        .ok_or(MacError::NoMatchingRequest)
}

/// Consume the oldest pending standard request with the given CID
fn consume(state: &mut MacState, cid: Cid) {
    let standard = |r: &MacRequest| {
        !matches!(r, MacRequest::Proprietary { .. }) && r.cid() == cid as u8
    };
    if let Some(request) = state.dequeue_first_matching(standard) {
        trace!("Consumed pending request {:?}", request);
    }
}
