use crate::lorawan::commands::{Cid, MacRequest, RxParamSetupAns};
use crate::lorawan::events::{Event, EventKind};
use crate::lorawan::mac::{MacError, MacState};
use super::{consume, pending};

/// Handle an RXParamSetupAns.
///
/// The RX1 offset, RX2 data rate and RX2 frequency are kept unless all
/// three acknowledgments are set.
pub fn handle_rx_param_setup_ans(
    state: &mut MacState,
    pld: Option<&RxParamSetupAns>,
) -> Result<Event, MacError> {
    let pld = pld.ok_or(MacError::MissingPayload)?;
    let req = pending(state, |r| match r {
        MacRequest::RxParamSetup(req) => Some(*req),
        _ => None,
    })?;

    consume(state, Cid::RXParamSetup);
    if !(pld.rx1_data_rate_offset_ack && pld.rx2_data_rate_index_ack && pld.rx2_frequency_ack) {
        return Ok(Event::request(EventKind::RxParamSetupReject, MacRequest::RxParamSetup(req)));
    }

    state.apply_current(|p| {
        p.rx1_data_rate_offset = req.rx1_data_rate_offset;
        p.rx2_data_rate_index = req.rx2_data_rate_index;
        p.rx2_frequency = req.rx2_frequency;
    });
    Ok(Event::request(EventKind::RxParamSetupAccept, MacRequest::RxParamSetup(req)))
}

/// Handle an RXTimingSetupAns. The delay is applied on any match.
pub fn handle_rx_timing_setup_ans(state: &mut MacState) -> Result<Event, MacError> {
    let req = pending(state, |r| match r {
        MacRequest::RxTimingSetup(req) => Some(*req),
        _ => None,
    })?;

    consume(state, Cid::RXTimingSetup);
    // a delay of 0 means 1 second
    state.apply_current(|p| p.rx1_delay = req.delay.max(1));
    Ok(Event::request(EventKind::RxTimingSetupAnswer, MacRequest::RxTimingSetup(req)))
}
