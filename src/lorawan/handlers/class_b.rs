use crate::lorawan::commands::{
    BeaconFreqAns, Cid, MacRequest, MacResponse, PingSlotChannelAns, PingSlotInfoReq,
};
use crate::lorawan::events::{Event, EventKind};
use crate::lorawan::mac::{MacError, MacState};
use crate::lorawan::processor::UplinkContext;
use super::{consume, pending};

/// Highest ping slot periodicity (one slot every 128 s)
const MAX_PING_SLOT_PERIODICITY: u8 = 7;

/// Answer a DeviceTimeReq with the GPS time the uplink was received at
pub fn handle_device_time_req(
    state: &mut MacState,
    ctx: &UplinkContext,
) -> Result<Event, MacError> {
    let fraction = (u64::from(ctx.received_at.subsec_nanos()) * 256) / 1_000_000_000;
    let response = MacResponse::DeviceTimeAns {
        // the 32-bit GPS seconds field wraps around
        seconds: (ctx.received_at.as_secs() & u64::from(u32::MAX)) as u32,
        fractional_second: fraction as u8,
    };
    state.queue_response(response.clone())?;
    Ok(Event::response(EventKind::DeviceTimeRequest, response))
}

/// Handle a PingSlotInfoReq announcing the device's ping slot periodicity
pub fn handle_ping_slot_info_req(
    state: &mut MacState,
    pld: Option<&PingSlotInfoReq>,
) -> Result<Event, MacError> {
    let pld = pld.ok_or(MacError::MissingPayload)?;
    if pld.period > MAX_PING_SLOT_PERIODICITY {
        return Err(MacError::InvalidFieldValue);
    }

    state.queue_response(MacResponse::PingSlotInfoAns)?;
    state.apply_current(|p| p.ping_slot_periodicity = Some(pld.period));
    Ok(Event::response(EventKind::PingSlotInfoRequest, MacResponse::PingSlotInfoAns))
}

/// Handle a PingSlotChannelAns. Frequency and data rate are only applied
/// when both acks are set.
pub fn handle_ping_slot_channel_ans(
    state: &mut MacState,
    pld: Option<&PingSlotChannelAns>,
) -> Result<Event, MacError> {
    let pld = pld.ok_or(MacError::MissingPayload)?;
    let req = pending(state, |r| match r {
        MacRequest::PingSlotChannel(req) => Some(*req),
        _ => None,
    })?;

    consume(state, Cid::PingSlotChannel);
    if !(pld.frequency_ack && pld.data_rate_index_ack) {
        return Ok(Event::request(
            EventKind::PingSlotChannelReject,
            MacRequest::PingSlotChannel(req),
        ));
    }

    state.apply_current(|p| {
        p.ping_slot_frequency = req.frequency;
        p.ping_slot_data_rate_index = req.data_rate_index;
    });
    Ok(Event::request(EventKind::PingSlotChannelAccept, MacRequest::PingSlotChannel(req)))
}

/// Handle a BeaconFreqAns
pub fn handle_beacon_freq_ans(
    state: &mut MacState,
    pld: Option<&BeaconFreqAns>,
) -> Result<Event, MacError> {
    let pld = pld.ok_or(MacError::MissingPayload)?;
    let req = pending(state, |r| match r {
        MacRequest::BeaconFreq(req) => Some(*req),
        _ => None,
    })?;

    consume(state, Cid::BeaconFreq);
    if !pld.frequency_ack {
        return Ok(Event::request(EventKind::BeaconFreqReject, MacRequest::BeaconFreq(req)));
    }

    state.apply_current(|p| p.beacon_frequency = req.frequency);
    Ok(Event::request(EventKind::BeaconFreqAccept, MacRequest::BeaconFreq(req)))
}
