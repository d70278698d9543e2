use heapless::Vec;
use log::warn;

use crate::lorawan::commands::{
    Cid, DevStatusAns, DlChannelAns, LinkAdrAns, MacRequest, MacResponse, NewChannelAns,
};
use crate::lorawan::events::{Event, EventDetails, EventKind};
use crate::lorawan::mac::{DeviceStatus, MacError, MacState};
use crate::lorawan::processor::UplinkContext;
use crate::lorawan::region::{Channel, Region, MAX_CHANNELS};
use super::{consume, pending};

/// LinkADRReq value that keeps the current data rate or TX power
const KEEP_CURRENT: u8 = 0x0F;

/// Highest link margin LinkCheckAns can carry; 255 is reserved
const MAX_LINK_MARGIN: u8 = 254;

/// Answer a LinkCheckReq with the link quality of the carrying uplink
pub fn handle_link_check_req(
    state: &mut MacState,
    ctx: &UplinkContext,
) -> Result<Event, MacError> {
    let response = MacResponse::LinkCheckAns {
        margin: ctx.margin.min(MAX_LINK_MARGIN),
        gateway_count: ctx.gateway_count,
    };
    state.queue_response(response.clone())?;
    Ok(Event::response(EventKind::LinkCheckRequest, response))
}

/// Handle a LinkADRAns.
///
/// LinkADR is atomic: data rate, TX power, NbTrans and channel mask are only
/// applied when all three acknowledgments are set. A matched request whose
/// mask does not fit the channel plan is consumed and rejected.
pub fn handle_link_adr_ans(
    state: &mut MacState,
    pld: Option<&LinkAdrAns>,
) -> Result<Event, MacError> {
    let pld = pld.ok_or(MacError::MissingPayload)?;
    let req = pending(state, |r| match r {
        MacRequest::LinkAdr(req) => Some(*req),
        _ => None,
    })?;

    consume(state, Cid::LinkADR);
    if !(pld.channel_mask_ack && pld.data_rate_index_ack && pld.tx_power_index_ack) {
        return Ok(Event::request(EventKind::LinkAdrReject, MacRequest::LinkAdr(req)));
    }

    let channels = match masked_channels(
        state.region,
        &state.current_parameters.channels,
        req.channel_mask,
        req.channel_mask_control,
    ) {
        Ok(channels) => channels,
        Err(_) => {
            warn!(
                "LinkADRReq mask {:04X} (control {}) does not fit the channel plan",
                req.channel_mask, req.channel_mask_control
            );
            return Ok(Event::request(EventKind::LinkAdrReject, MacRequest::LinkAdr(req)));
        }
    };

    state.apply_current(|p| {
        if req.data_rate_index != KEEP_CURRENT {
            p.adr_data_rate_index = req.data_rate_index;
        }
        if req.tx_power_index != KEEP_CURRENT {
            p.adr_tx_power_index = req.tx_power_index;
        }
        if req.nb_trans != 0 {
            p.adr_nb_trans = req.nb_trans;
        }
        p.channels = channels;
    });
    Ok(Event::request(EventKind::LinkAdrAccept, MacRequest::LinkAdr(req)))
}

/// Apply a 16-bit channel mask at `offset`
fn apply_block(channels: &mut [Channel], offset: usize, mask: u16) -> Result<(), MacError> {
    for bit in 0..16 {
        let enabled = mask & (1 << bit) != 0;
        match channels.get_mut(offset + bit) {
            Some(channel) if channel.uplink_frequency != 0 => channel.enable_uplink = enabled,
            _ if enabled => return Err(MacError::InvalidFieldValue),
            _ => {}
        }
    }
    Ok(())
}

/// Channels after applying a LinkADRReq channel mask
fn masked_channels(
    region: Region,
    channels: &[Channel],
    mask: u16,
    control: u8,
) -> Result<Vec<Channel, MAX_CHANNELS>, MacError> {
    let mut channels: Vec<Channel, MAX_CHANNELS> =
        Vec::from_slice(channels).map_err(|_| MacError::InvalidFieldValue)?;

    match (control, region.fixed_channel_plan()) {
        (0..=4, _) => apply_block(&mut channels, control as usize * 16, mask)?,
        (5, true) => {
            // one bit per bank of eight 125 kHz channels plus its 500 kHz channel
            if mask & 0xFF00 != 0 {
                return Err(MacError::InvalidFieldValue);
            }
            for (i, channel) in channels.iter_mut().enumerate() {
                let bank = if i < 64 { i / 8 } else { i - 64 };
                channel.enable_uplink = mask & (1 << bank) != 0;
            }
        }
        (6 | 7, true) => {
            for channel in channels.iter_mut().take(64) {
                channel.enable_uplink = control == 6;
            }
            apply_block(&mut channels, 64, mask)?;
        }
        (6, false) => {
            for channel in channels.iter_mut() {
                channel.enable_uplink = channel.uplink_frequency != 0;
            }
        }
        _ => return Err(MacError::InvalidFieldValue),
    }
    Ok(channels)
}

/// Handle a DutyCycleAns. The duty cycle is applied on any match.
pub fn handle_duty_cycle_ans(state: &mut MacState) -> Result<Event, MacError> {
    let req = pending(state, |r| match r {
        MacRequest::DutyCycle(req) => Some(*req),
        _ => None,
    })?;

    consume(state, Cid::DutyCycle);
    state.apply_current(|p| p.max_duty_cycle = req.max_duty_cycle);
    Ok(Event::request(EventKind::DutyCycleAnswer, MacRequest::DutyCycle(req)))
}

/// Handle a DevStatusAns
pub fn handle_dev_status_ans(
    state: &mut MacState,
    pld: Option<&DevStatusAns>,
    ctx: &UplinkContext,
) -> Result<Event, MacError> {
    let pld = pld.ok_or(MacError::MissingPayload)?;
    pending(state, |r| matches!(r, MacRequest::DevStatus).then_some(()))?;
    if !(-32..=31).contains(&pld.margin) {
        return Err(MacError::InvalidFieldValue);
    }

    consume(state, Cid::DevStatus);
    let status = DeviceStatus {
        battery: pld.battery,
        margin: pld.margin,
        f_cnt_up: ctx.f_cnt_up,
    };
    state.last_device_status = Some(status);
    Ok(Event::new(EventKind::DeviceStatusAnswer, EventDetails::DeviceStatus(status)))
}

/// Handle a NewChannelAns. The channel is only set when both acks are set
/// and the request fits the region.
pub fn handle_new_channel_ans(
    state: &mut MacState,
    pld: Option<&NewChannelAns>,
) -> Result<Event, MacError> {
    let pld = pld.ok_or(MacError::MissingPayload)?;
    let req = pending(state, |r| match r {
        MacRequest::NewChannel(req) => Some(*req),
        _ => None,
    })?;

    consume(state, Cid::NewChannel);
    if !(pld.frequency_ack && pld.data_rate_ack) {
        return Ok(Event::request(EventKind::NewChannelReject, MacRequest::NewChannel(req)));
    }

    let index = req.channel_index as usize;
    if index >= state.region.max_channels()
        || (req.frequency != 0 && req.min_data_rate_index > req.max_data_rate_index)
    {
        warn!("NewChannelReq for channel {} cannot be applied", index);
        return Ok(Event::request(EventKind::NewChannelReject, MacRequest::NewChannel(req)));
    }

    state.apply_current(|p| {
        let channel = Channel {
            uplink_frequency: req.frequency,
            downlink_frequency: None,
            min_data_rate_index: req.min_data_rate_index,
            max_data_rate_index: req.max_data_rate_index,
            enable_uplink: req.frequency != 0,
        };
        while p.channels.len() <= index {
            // index < max_channels() <= MAX_CHANNELS
            let _ = p.channels.push(Channel {
                uplink_frequency: 0,
                downlink_frequency: None,
                min_data_rate_index: 0,
                max_data_rate_index: 0,
                enable_uplink: false,
            });
        }
        p.channels[index] = channel;
    });
    Ok(Event::request(EventKind::NewChannelAccept, MacRequest::NewChannel(req)))
}

/// Handle a DlChannelAns. The downlink frequency is only set when both acks
/// are set and the channel exists.
pub fn handle_dl_channel_ans(
    state: &mut MacState,
    pld: Option<&DlChannelAns>,
) -> Result<Event, MacError> {
    let pld = pld.ok_or(MacError::MissingPayload)?;
    let req = pending(state, |r| match r {
        MacRequest::DlChannel(req) => Some(*req),
        _ => None,
    })?;

    consume(state, Cid::DlChannel);
    if !(pld.channel_frequency_ack && pld.uplink_frequency_exists_ack) {
        return Ok(Event::request(EventKind::DlChannelReject, MacRequest::DlChannel(req)));
    }

    let index = req.channel_index as usize;
    match state.current_parameters.channels.get(index) {
        Some(channel) if channel.uplink_frequency != 0 => {}
        _ => {
            warn!("DlChannelReq for undefined channel {}", index);
            return Ok(Event::request(EventKind::DlChannelReject, MacRequest::DlChannel(req)));
        }
    }

    state.apply_current(|p| p.channels[index].downlink_frequency = Some(req.frequency));
    Ok(Event::request(EventKind::DlChannelAccept, MacRequest::DlChannel(req)))
}

/// Handle a TxParamSetupAns. EIRP and dwell times are applied on any match.
pub fn handle_tx_param_setup_ans(state: &mut MacState) -> Result<Event, MacError> {
    let req = pending(state, |r| match r {
        MacRequest::TxParamSetup(req) => Some(*req),
        _ => None,
    })?;

    consume(state, Cid::TxParamSetup);
    state.apply_current(|p| {
        p.max_eirp_index = req.max_eirp_index;
        p.uplink_dwell_time = req.uplink_dwell_time;
        p.downlink_dwell_time = req.downlink_dwell_time;
    });
    Ok(Event::request(EventKind::TxParamSetupAnswer, MacRequest::TxParamSetup(req)))
}

/// Handle an ADRParamSetupAns. Both exponents are applied on any match.
pub fn handle_adr_param_setup_ans(state: &mut MacState) -> Result<Event, MacError> {
    let req = pending(state, |r| match r {
        MacRequest::AdrParamSetup(req) => Some(*req),
        _ => None,
    })?;

    consume(state, Cid::ADRParamSetup);
    state.apply_current(|p| {
        p.adr_ack_limit_exponent = req.adr_ack_limit_exponent;
        p.adr_ack_delay_exponent = req.adr_ack_delay_exponent;
    });
    Ok(Event::request(EventKind::AdrParamSetupAnswer, MacRequest::AdrParamSetup(req)))
}
