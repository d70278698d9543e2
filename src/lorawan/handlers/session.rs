use log::debug;

use crate::config::device::{ActivationState, DeviceClass};
use crate::lorawan::commands::{
    Cid, DeviceModeInd, MacRequest, MacResponse, RejoinParamSetupAns, RekeyInd, ResetInd,
};
use crate::lorawan::events::{Event, EventKind};
use crate::lorawan::mac::{MacError, MacState};
use super::{consume, pending};

/// Highest LoRaWAN 1.x minor version the server implements
const SERVER_MINOR_VERSION: u8 = 1;

/// Handle a ResetInd from an ABP device.
///
/// The device has returned to its default parameters, so the current
/// parameters follow and all pending requests are dropped.
pub fn handle_reset_ind(state: &mut MacState, pld: Option<&ResetInd>) -> Result<Event, MacError> {
    let pld = pld.ok_or(MacError::MissingPayload)?;
    if state.activation != ActivationState::ABPActivated {
        return Err(MacError::UnsupportedCommand);
    }
    if pld.minor_version == 0 {
        return Err(MacError::InvalidFieldValue);
    }

    let response = MacResponse::ResetConf {
        minor_version: pld.minor_version.min(SERVER_MINOR_VERSION),
    };
    debug!("Device reset, dropping {} pending requests", state.pending_requests.len());
    state.reset();
    state.queue_response(response.clone())?;
    Ok(Event::response(EventKind::ResetIndication, response))
}

/// Handle a RekeyInd from an OTAA device
pub fn handle_rekey_ind(state: &mut MacState, pld: Option<&RekeyInd>) -> Result<Event, MacError> {
    let pld = pld.ok_or(MacError::MissingPayload)?;
    if state.activation != ActivationState::OTAAActivated {
        return Err(MacError::UnsupportedCommand);
    }
    if pld.minor_version == 0 {
        return Err(MacError::InvalidFieldValue);
    }

    let response = MacResponse::RekeyConf {
        minor_version: pld.minor_version.min(SERVER_MINOR_VERSION),
    };
    state.queue_response(response.clone())?;
    Ok(Event::response(EventKind::RekeyIndication, response))
}

/// Handle a RejoinParamSetupAns.
///
/// The count periodicity is applied on any match; the time periodicity only
/// when the device acknowledged it.
pub fn handle_rejoin_param_setup_ans(
    state: &mut MacState,
    pld: Option<&RejoinParamSetupAns>,
) -> Result<Event, MacError> {
    let pld = pld.ok_or(MacError::MissingPayload)?;
    let req = pending(state, |r| match r {
        MacRequest::RejoinParamSetup(req) => Some(*req),
        _ => None,
    })?;

    consume(state, Cid::RejoinParamSetup);
    state.apply_current(|p| {
        p.rejoin_count_periodicity = req.max_count_exponent;
        if pld.max_time_exponent_ack {
            p.rejoin_time_periodicity = req.max_time_exponent;
        }
    });

    let kind = if pld.max_time_exponent_ack {
        EventKind::RejoinParamAccept
    } else {
        EventKind::RejoinParamReject
    };
    Ok(Event::request(kind, MacRequest::RejoinParamSetup(req)))
}

/// Handle a DeviceModeInd
pub fn handle_device_mode_ind(
    state: &mut MacState,
    pld: Option<&DeviceModeInd>,
) -> Result<Event, MacError> {
    let pld = pld.ok_or(MacError::MissingPayload)?;
    let class = DeviceClass::from_device_mode(pld.class).ok_or(MacError::InvalidFieldValue)?;

    let response = MacResponse::DeviceModeConf { class };
    state.queue_response(response.clone())?;
    state.device_class = class;
    Ok(Event::response(EventKind::DeviceModeIndication, response))
}
