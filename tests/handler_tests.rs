use core::time::Duration;

use lorawan_ns::{
    config::device::{ActivationState, DeviceClass},
    lorawan::{
        commands::{
            AdrParamSetupReq, BeaconFreqAns, BeaconFreqReq, DevStatusAns, DeviceModeInd,
            DlChannelAns, DlChannelReq, DutyCycleReq, LinkAdrAns, LinkAdrReq, MacRequest,
            MacResponse, NewChannelAns, NewChannelReq, PingSlotChannelAns, PingSlotChannelReq,
            PingSlotInfoReq, RejoinCountExponent, RejoinParamSetupAns, RejoinParamSetupReq,
            RejoinTimeExponent, RekeyInd, ResetInd, RxParamSetupAns, RxParamSetupReq,
            RxTimingSetupReq, TxParamSetupReq, UplinkCommand,
        },
        events::{EventDetails, EventKind},
        handlers::*,
        mac::{DeviceStatus, MacError, MacState, MAX_QUEUED_RESPONSES},
        processor::UplinkContext,
        region::Region,
        registry::CommandRegistry,
    },
};

use mock::{abp_state, context, device, otaa_state};

fn rejoin_req(count: RejoinCountExponent, time: RejoinTimeExponent) -> MacRequest {
    MacRequest::RejoinParamSetup(RejoinParamSetupReq {
        max_count_exponent: count,
        max_time_exponent: time,
    })
}

fn link_adr_req(data_rate_index: u8, tx_power_index: u8, channel_mask: u16, channel_mask_control: u8) -> LinkAdrReq {
    LinkAdrReq {
        data_rate_index,
        tx_power_index,
        channel_mask,
        channel_mask_control,
        nb_trans: 2,
    }
}

const ALL_ACK: LinkAdrAns = LinkAdrAns {
    channel_mask_ack: true,
    data_rate_index_ack: true,
    tx_power_index_ack: true,
};

#[test]
fn test_rejoin_param_setup_nil_payload() {
    let mut state = otaa_state();
    state
        .enqueue(rejoin_req(RejoinCountExponent::Count128, RejoinTimeExponent::Time10))
        .unwrap();
    let expected = state.clone();

    let result = handle_rejoin_param_setup_ans(&mut state, None);

    assert_eq!(result, Err(MacError::MissingPayload));
    assert_eq!(state, expected);
}

#[test]
fn test_rejoin_param_setup_no_request() {
    let mut state = otaa_state();
    let expected = state.clone();

    let result = handle_rejoin_param_setup_ans(
        &mut state,
        Some(&RejoinParamSetupAns { max_time_exponent_ack: true }),
    );

    assert_eq!(result, Err(MacError::NoMatchingRequest));
    assert_eq!(state, expected);
}

#[test]
fn test_rejoin_param_setup_ack() {
    let mut state = otaa_state();
    state
        .enqueue(rejoin_req(RejoinCountExponent::Count128, RejoinTimeExponent::Time10))
        .unwrap();

    let mut expected = otaa_state();
    expected.current_parameters.rejoin_count_periodicity = RejoinCountExponent::Count128;
    expected.current_parameters.rejoin_time_periodicity = RejoinTimeExponent::Time10;

    let event = handle_rejoin_param_setup_ans(
        &mut state,
        Some(&RejoinParamSetupAns { max_time_exponent_ack: true }),
    )
    .unwrap();

    assert_eq!(event.kind, EventKind::RejoinParamAccept);
    assert_eq!(
        event.details,
        EventDetails::Request(rejoin_req(RejoinCountExponent::Count128, RejoinTimeExponent::Time10))
    );
    assert_eq!(state, expected);
}

#[test]
fn test_rejoin_param_setup_no_ack() {
    let mut state = otaa_state();
    state.current_parameters.rejoin_time_periodicity = RejoinTimeExponent::Time1;
    state
        .enqueue(rejoin_req(RejoinCountExponent::Count1024, RejoinTimeExponent::Time11))
        .unwrap();

    let mut expected = otaa_state();
    expected.current_parameters.rejoin_count_periodicity = RejoinCountExponent::Count1024;
    expected.current_parameters.rejoin_time_periodicity = RejoinTimeExponent::Time1;

    let event = handle_rejoin_param_setup_ans(
        &mut state,
        Some(&RejoinParamSetupAns { max_time_exponent_ack: false }),
    )
    .unwrap();

    assert_eq!(event.kind, EventKind::RejoinParamReject);
    assert_eq!(state, expected);
}

#[test]
fn test_answer_consumed_once() {
    let mut state = otaa_state();
    state
        .enqueue(rejoin_req(RejoinCountExponent::Count64, RejoinTimeExponent::Time3))
        .unwrap();
    let answer = RejoinParamSetupAns { max_time_exponent_ack: true };

    assert!(handle_rejoin_param_setup_ans(&mut state, Some(&answer)).is_ok());
    let after_first = state.clone();

    let replay = handle_rejoin_param_setup_ans(&mut state, Some(&answer));
    assert_eq!(replay, Err(MacError::NoMatchingRequest));
    assert_eq!(state, after_first);
}

#[test]
fn test_oldest_request_matched_first() {
    let mut state = otaa_state();
    let first = rejoin_req(RejoinCountExponent::Count128, RejoinTimeExponent::Time10);
    let second = rejoin_req(RejoinCountExponent::Count1024, RejoinTimeExponent::Time11);
    state.enqueue(MacRequest::DevStatus).unwrap();
    state.enqueue(first.clone()).unwrap();
    state.enqueue(MacRequest::DutyCycle(DutyCycleReq { max_duty_cycle: 3 })).unwrap();
    state.enqueue(second.clone()).unwrap();

    let event = handle_rejoin_param_setup_ans(
        &mut state,
        Some(&RejoinParamSetupAns { max_time_exponent_ack: true }),
    )
    .unwrap();

    assert_eq!(event.details, EventDetails::Request(first));
    assert_eq!(state.current_parameters.rejoin_count_periodicity, RejoinCountExponent::Count128);
    assert_eq!(
        state.pending_requests.as_slice(),
        &[
            MacRequest::DevStatus,
            MacRequest::DutyCycle(DutyCycleReq { max_duty_cycle: 3 }),
            second,
        ]
    );
}

#[test]
fn test_link_adr_accept() {
    let mut state = otaa_state();
    state.enqueue(MacRequest::LinkAdr(link_adr_req(5, 2, 0x0003, 0))).unwrap();

    let event = handle_link_adr_ans(&mut state, Some(&ALL_ACK)).unwrap();

    assert_eq!(event.kind, EventKind::LinkAdrAccept);
    let params = &state.current_parameters;
    assert_eq!(params.adr_data_rate_index, 5);
    assert_eq!(params.adr_tx_power_index, 2);
    assert_eq!(params.adr_nb_trans, 2);
    let enabled: Vec<bool> = params.channels.iter().map(|c| c.enable_uplink).collect();
    assert_eq!(enabled, vec![true, true, false]);
    assert!(state.pending_requests.is_empty());
}

#[test]
fn test_link_adr_reject_keeps_parameters() {
    let mut state = otaa_state();
    state.enqueue(MacRequest::LinkAdr(link_adr_req(5, 2, 0x0001, 0))).unwrap();

    let mut expected = state.clone();
    expected.pending_requests.clear();

    let event = handle_link_adr_ans(
        &mut state,
        Some(&LinkAdrAns {
            channel_mask_ack: true,
            data_rate_index_ack: false,
            tx_power_index_ack: true,
        }),
    )
    .unwrap();

    assert_eq!(event.kind, EventKind::LinkAdrReject);
    assert_eq!(state, expected);
}

#[test]
fn test_link_adr_keep_current_values() {
    let mut state = otaa_state();
    state.current_parameters.adr_data_rate_index = 4;
    state.current_parameters.adr_tx_power_index = 1;
    let mut req = link_adr_req(0x0F, 0x0F, 0x0007, 0);
    req.nb_trans = 0;
    state.enqueue(MacRequest::LinkAdr(req)).unwrap();

    handle_link_adr_ans(&mut state, Some(&ALL_ACK)).unwrap();

    assert_eq!(state.current_parameters.adr_data_rate_index, 4);
    assert_eq!(state.current_parameters.adr_tx_power_index, 1);
    assert_eq!(state.current_parameters.adr_nb_trans, 1);
}

#[test]
fn test_link_adr_mask_for_undefined_channel() {
    let mut state = otaa_state();
    state.enqueue(MacRequest::LinkAdr(link_adr_req(5, 2, 0x0020, 0))).unwrap();
    let mut expected = state.clone();
    expected.pending_requests.clear();

    let event = handle_link_adr_ans(&mut state, Some(&ALL_ACK)).unwrap();

    assert_eq!(event.kind, EventKind::LinkAdrReject);
    assert_eq!(state, expected);
}

#[test]
fn test_link_adr_dynamic_plan_rejects_bank_controls() {
    let mut state = otaa_state();
    state.enqueue(MacRequest::LinkAdr(link_adr_req(5, 2, 0x0001, 7))).unwrap();

    let event = handle_link_adr_ans(&mut state, Some(&ALL_ACK)).unwrap();

    assert_eq!(event.kind, EventKind::LinkAdrReject);
    assert!(state.pending_requests.is_empty());
    assert_eq!(state.current_parameters, Region::EU868.default_parameters());
}

#[test]
fn test_link_adr_unusable_request_does_not_block_next() {
    let mut state = otaa_state();
    state.enqueue(MacRequest::LinkAdr(link_adr_req(5, 2, 0x0020, 0))).unwrap();
    state.enqueue(MacRequest::LinkAdr(link_adr_req(4, 1, 0x0005, 0))).unwrap();

    let first = handle_link_adr_ans(&mut state, Some(&ALL_ACK)).unwrap();
    let second = handle_link_adr_ans(&mut state, Some(&ALL_ACK)).unwrap();

    assert_eq!(first.kind, EventKind::LinkAdrReject);
    assert_eq!(second.kind, EventKind::LinkAdrAccept);
    assert_eq!(state.current_parameters.adr_data_rate_index, 4);
    assert_eq!(state.current_parameters.adr_tx_power_index, 1);
    let enabled: Vec<bool> = state
        .current_parameters
        .channels
        .iter()
        .map(|c| c.enable_uplink)
        .collect();
    assert_eq!(enabled, vec![true, false, true]);
    assert!(state.pending_requests.is_empty());
    assert_eq!(
        handle_link_adr_ans(&mut state, Some(&ALL_ACK)),
        Err(MacError::NoMatchingRequest)
    );
}

#[test]
fn test_link_adr_us915_all_off_with_wide_channel() {
    let mut state = MacState::new(Region::US915, ActivationState::OTAAActivated);
    state.enqueue(MacRequest::LinkAdr(link_adr_req(3, 0, 0x0002, 7))).unwrap();

    handle_link_adr_ans(&mut state, Some(&ALL_ACK)).unwrap();

    let enabled: Vec<usize> = state
        .current_parameters
        .channels
        .iter()
        .enumerate()
        .filter(|(_, c)| c.enable_uplink)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(enabled, vec![65]);
}

#[test]
fn test_link_adr_us915_bank_mask() {
    let mut state = MacState::new(Region::US915, ActivationState::OTAAActivated);
    state.enqueue(MacRequest::LinkAdr(link_adr_req(3, 0, 0x0002, 5))).unwrap();

    handle_link_adr_ans(&mut state, Some(&ALL_ACK)).unwrap();

    let enabled: Vec<usize> = state
        .current_parameters
        .channels
        .iter()
        .enumerate()
        .filter(|(_, c)| c.enable_uplink)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(enabled, vec![8, 9, 10, 11, 12, 13, 14, 15, 65]);
}

#[test]
fn test_duty_cycle_applied() {
    let mut state = otaa_state();
    state.enqueue(MacRequest::DutyCycle(DutyCycleReq { max_duty_cycle: 7 })).unwrap();

    let event = handle_duty_cycle_ans(&mut state).unwrap();

    assert_eq!(event.kind, EventKind::DutyCycleAnswer);
    assert_eq!(state.current_parameters.max_duty_cycle, 7);
    assert!(state.pending_requests.is_empty());
}

#[test]
fn test_duty_cycle_without_request() {
    let mut state = otaa_state();
    let expected = state.clone();

    assert_eq!(handle_duty_cycle_ans(&mut state), Err(MacError::NoMatchingRequest));
    assert_eq!(state, expected);
}

#[test]
fn test_rx_param_setup_accept() {
    let mut state = otaa_state();
    let req = RxParamSetupReq {
        rx1_data_rate_offset: 2,
        rx2_data_rate_index: 3,
        rx2_frequency: 869_525_000,
    };
    state.enqueue(MacRequest::RxParamSetup(req)).unwrap();

    let event = handle_rx_param_setup_ans(
        &mut state,
        Some(&RxParamSetupAns {
            rx1_data_rate_offset_ack: true,
            rx2_data_rate_index_ack: true,
            rx2_frequency_ack: true,
        }),
    )
    .unwrap();

    assert_eq!(event.kind, EventKind::RxParamSetupAccept);
    assert_eq!(state.current_parameters.rx1_data_rate_offset, 2);
    assert_eq!(state.current_parameters.rx2_data_rate_index, 3);
}

#[test]
fn test_rx_param_setup_partial_ack_rejected() {
    let mut state = otaa_state();
    state
        .enqueue(MacRequest::RxParamSetup(RxParamSetupReq {
            rx1_data_rate_offset: 2,
            rx2_data_rate_index: 3,
            rx2_frequency: 869_100_000,
        }))
        .unwrap();
    let mut expected = state.clone();
    expected.pending_requests.clear();

    let event = handle_rx_param_setup_ans(
        &mut state,
        Some(&RxParamSetupAns {
            rx1_data_rate_offset_ack: true,
            rx2_data_rate_index_ack: true,
            rx2_frequency_ack: false,
        }),
    )
    .unwrap();

    assert_eq!(event.kind, EventKind::RxParamSetupReject);
    assert_eq!(state, expected);
}

#[test]
fn test_dev_status_recorded() {
    let mut state = otaa_state();
    state.enqueue(MacRequest::DevStatus).unwrap();

    let event = handle_dev_status_ans(
        &mut state,
        Some(&DevStatusAns { battery: 200, margin: -5 }),
        &context(),
    )
    .unwrap();

    let status = DeviceStatus {
        battery: 200,
        margin: -5,
        f_cnt_up: 42,
    };
    assert_eq!(event.details, EventDetails::DeviceStatus(status));
    assert_eq!(state.last_device_status, Some(status));
}

#[test]
fn test_dev_status_margin_out_of_range() {
    let mut state = otaa_state();
    state.enqueue(MacRequest::DevStatus).unwrap();
    let expected = state.clone();

    let result = handle_dev_status_ans(
        &mut state,
        Some(&DevStatusAns { battery: 10, margin: 40 }),
        &context(),
    );

    assert_eq!(result, Err(MacError::InvalidFieldValue));
    assert_eq!(state, expected);
}

#[test]
fn test_new_channel_accept() {
    let mut state = otaa_state();
    state
        .enqueue(MacRequest::NewChannel(NewChannelReq {
            channel_index: 5,
            frequency: 867_100_000,
            min_data_rate_index: 0,
            max_data_rate_index: 5,
        }))
        .unwrap();

    let event = handle_new_channel_ans(
        &mut state,
        Some(&NewChannelAns { frequency_ack: true, data_rate_ack: true }),
    )
    .unwrap();

    assert_eq!(event.kind, EventKind::NewChannelAccept);
    let channels = &state.current_parameters.channels;
    assert_eq!(channels.len(), 6);
    assert_eq!(channels[3].uplink_frequency, 0);
    assert!(!channels[4].enable_uplink);
    assert_eq!(channels[5].uplink_frequency, 867_100_000);
    assert!(channels[5].enable_uplink);
}

#[test]
fn test_new_channel_reject() {
    let mut state = otaa_state();
    state
        .enqueue(MacRequest::NewChannel(NewChannelReq {
            channel_index: 3,
            frequency: 867_100_000,
            min_data_rate_index: 0,
            max_data_rate_index: 5,
        }))
        .unwrap();
    let mut expected = state.clone();
    expected.pending_requests.clear();

    let event = handle_new_channel_ans(
        &mut state,
        Some(&NewChannelAns { frequency_ack: false, data_rate_ack: true }),
    )
    .unwrap();

    assert_eq!(event.kind, EventKind::NewChannelReject);
    assert_eq!(state, expected);
}

#[test]
fn test_new_channel_index_outside_region() {
    let mut state = otaa_state();
    state
        .enqueue(MacRequest::NewChannel(NewChannelReq {
            channel_index: 20,
            frequency: 867_100_000,
            min_data_rate_index: 0,
            max_data_rate_index: 5,
        }))
        .unwrap();
    state
        .enqueue(MacRequest::NewChannel(NewChannelReq {
            channel_index: 3,
            frequency: 867_300_000,
            min_data_rate_index: 0,
            max_data_rate_index: 5,
        }))
        .unwrap();
    let answer = NewChannelAns { frequency_ack: true, data_rate_ack: true };

    let first = handle_new_channel_ans(&mut state, Some(&answer)).unwrap();
    assert_eq!(first.kind, EventKind::NewChannelReject);
    assert_eq!(state.current_parameters.channels.len(), 3);
    assert_eq!(state.pending_requests.len(), 1);

    let second = handle_new_channel_ans(&mut state, Some(&answer)).unwrap();
    assert_eq!(second.kind, EventKind::NewChannelAccept);
    assert_eq!(state.current_parameters.channels[3].uplink_frequency, 867_300_000);
    assert!(state.pending_requests.is_empty());
}

#[test]
fn test_rx_timing_setup_zero_means_one_second() {
    let mut state = otaa_state();
    state.current_parameters.rx1_delay = 5;
    state.enqueue(MacRequest::RxTimingSetup(RxTimingSetupReq { delay: 0 })).unwrap();

    handle_rx_timing_setup_ans(&mut state).unwrap();

    assert_eq!(state.current_parameters.rx1_delay, 1);
}

#[test]
fn test_tx_param_setup_applied() {
    let mut state = otaa_state();
    state
        .enqueue(MacRequest::TxParamSetup(TxParamSetupReq {
            max_eirp_index: 9,
            uplink_dwell_time: true,
            downlink_dwell_time: false,
        }))
        .unwrap();

    let event = handle_tx_param_setup_ans(&mut state).unwrap();

    assert_eq!(event.kind, EventKind::TxParamSetupAnswer);
    assert_eq!(state.current_parameters.max_eirp_index, 9);
    assert!(state.current_parameters.uplink_dwell_time);
    assert!(!state.current_parameters.downlink_dwell_time);
}

#[test]
fn test_dl_channel_accept() {
    let mut state = otaa_state();
    state
        .enqueue(MacRequest::DlChannel(DlChannelReq { channel_index: 1, frequency: 869_000_000 }))
        .unwrap();

    let event = handle_dl_channel_ans(
        &mut state,
        Some(&DlChannelAns {
            channel_frequency_ack: true,
            uplink_frequency_exists_ack: true,
        }),
    )
    .unwrap();

    assert_eq!(event.kind, EventKind::DlChannelAccept);
    assert_eq!(state.current_parameters.channels[1].downlink_frequency, Some(869_000_000));
}

#[test]
fn test_dl_channel_for_undefined_channel() {
    let mut state = otaa_state();
    state
        .enqueue(MacRequest::DlChannel(DlChannelReq { channel_index: 7, frequency: 869_000_000 }))
        .unwrap();
    state
        .enqueue(MacRequest::DlChannel(DlChannelReq { channel_index: 2, frequency: 869_200_000 }))
        .unwrap();
    let answer = DlChannelAns {
        channel_frequency_ack: true,
        uplink_frequency_exists_ack: true,
    };

    let first = handle_dl_channel_ans(&mut state, Some(&answer)).unwrap();
    assert_eq!(first.kind, EventKind::DlChannelReject);
    assert_eq!(state.current_parameters, Region::EU868.default_parameters());

    let second = handle_dl_channel_ans(&mut state, Some(&answer)).unwrap();
    assert_eq!(second.kind, EventKind::DlChannelAccept);
    assert_eq!(state.current_parameters.channels[2].downlink_frequency, Some(869_200_000));
    assert!(state.pending_requests.is_empty());
}

#[test]
fn test_adr_param_setup_applied() {
    let mut state = otaa_state();
    state
        .enqueue(MacRequest::AdrParamSetup(AdrParamSetupReq {
            adr_ack_limit_exponent: 8,
            adr_ack_delay_exponent: 4,
        }))
        .unwrap();

    handle_adr_param_setup_ans(&mut state).unwrap();

    assert_eq!(state.current_parameters.adr_ack_limit_exponent, 8);
    assert_eq!(state.current_parameters.adr_ack_delay_exponent, 4);
}

#[test]
fn test_link_check_queues_answer() {
    let mut state = otaa_state();

    let event = handle_link_check_req(&mut state, &context()).unwrap();

    let response = MacResponse::LinkCheckAns {
        margin: 12,
        gateway_count: 3,
    };
    assert_eq!(event.kind, EventKind::LinkCheckRequest);
    assert_eq!(state.queued_responses.as_slice(), &[response]);
}

#[test]
fn test_link_check_with_full_response_queue() {
    let mut state = otaa_state();
    for _ in 0..MAX_QUEUED_RESPONSES {
        state.queue_response(MacResponse::PingSlotInfoAns).unwrap();
    }
    let expected = state.clone();

    assert_eq!(handle_link_check_req(&mut state, &context()), Err(MacError::QueueFull));
    assert_eq!(state, expected);
}

#[test]
fn test_device_time_from_reception_time() {
    let mut state = otaa_state();

    handle_device_time_req(&mut state, &context()).unwrap();

    assert_eq!(
        state.queued_responses.as_slice(),
        &[MacResponse::DeviceTimeAns {
            seconds: 1_300_000_000,
            fractional_second: 128,
        }]
    );
}

#[test]
fn test_device_time_wraps_at_32_bits() {
    let mut state = otaa_state();
    let ctx = UplinkContext::new(device(), Duration::from_secs(u64::from(u32::MAX) + 11));

    handle_device_time_req(&mut state, &ctx).unwrap();

    assert_eq!(
        state.queued_responses.as_slice(),
        &[MacResponse::DeviceTimeAns {
            seconds: 10,
            fractional_second: 0,
        }]
    );
}

#[test]
fn test_ping_slot_info() {
    let mut state = otaa_state();

    let event = handle_ping_slot_info_req(&mut state, Some(&PingSlotInfoReq { period: 5 })).unwrap();

    assert_eq!(event.kind, EventKind::PingSlotInfoRequest);
    assert_eq!(state.current_parameters.ping_slot_periodicity, Some(5));
    assert_eq!(state.desired_parameters.ping_slot_periodicity, None);
    assert_eq!(state.queued_responses.as_slice(), &[MacResponse::PingSlotInfoAns]);
}

#[test]
fn test_ping_slot_info_invalid_period() {
    let mut state = otaa_state();
    let expected = state.clone();

    assert_eq!(
        handle_ping_slot_info_req(&mut state, Some(&PingSlotInfoReq { period: 9 })),
        Err(MacError::InvalidFieldValue)
    );
    assert_eq!(state, expected);
}

#[test]
fn test_ping_slot_channel_accept_and_reject() {
    let mut state = otaa_state();
    let req = PingSlotChannelReq {
        frequency: 869_100_000,
        data_rate_index: 2,
    };
    state.enqueue(MacRequest::PingSlotChannel(req)).unwrap();
    state.enqueue(MacRequest::PingSlotChannel(req)).unwrap();

    let rejected = handle_ping_slot_channel_ans(
        &mut state,
        Some(&PingSlotChannelAns { frequency_ack: true, data_rate_index_ack: false }),
    )
    .unwrap();
    assert_eq!(rejected.kind, EventKind::PingSlotChannelReject);
    assert_eq!(state.current_parameters.ping_slot_frequency, 869_525_000);

    let accepted = handle_ping_slot_channel_ans(
        &mut state,
        Some(&PingSlotChannelAns { frequency_ack: true, data_rate_index_ack: true }),
    )
    .unwrap();
    assert_eq!(accepted.kind, EventKind::PingSlotChannelAccept);
    assert_eq!(state.current_parameters.ping_slot_frequency, 869_100_000);
    assert_eq!(state.current_parameters.ping_slot_data_rate_index, 2);
    assert!(state.pending_requests.is_empty());
}

#[test]
fn test_beacon_freq() {
    let mut state = otaa_state();
    state.enqueue(MacRequest::BeaconFreq(BeaconFreqReq { frequency: 869_300_000 })).unwrap();

    let event = handle_beacon_freq_ans(&mut state, Some(&BeaconFreqAns { frequency_ack: true })).unwrap();

    assert_eq!(event.kind, EventKind::BeaconFreqAccept);
    assert_eq!(state.current_parameters.beacon_frequency, 869_300_000);
}

#[test]
fn test_beacon_freq_nil_payload() {
    let mut state = otaa_state();
    state.enqueue(MacRequest::BeaconFreq(BeaconFreqReq { frequency: 869_300_000 })).unwrap();
    let expected = state.clone();

    assert_eq!(handle_beacon_freq_ans(&mut state, None), Err(MacError::MissingPayload));
    assert_eq!(state, expected);
}

#[test]
fn test_reset_ind_restores_defaults() {
    let mut state = abp_state();
    state.current_parameters.rx1_delay = 5;
    state.current_parameters.adr_data_rate_index = 4;
    state.desired_parameters.adr_data_rate_index = 4;
    state.enqueue(MacRequest::DevStatus).unwrap();

    let event = handle_reset_ind(&mut state, Some(&ResetInd { minor_version: 3 })).unwrap();

    let mut expected = abp_state();
    expected.desired_parameters.adr_data_rate_index = 4;
    expected
        .queue_response(MacResponse::ResetConf { minor_version: 1 })
        .unwrap();
    assert_eq!(event.kind, EventKind::ResetIndication);
    assert_eq!(state, expected);
}

#[test]
fn test_reset_ind_from_otaa_device() {
    let mut state = otaa_state();
    let expected = state.clone();

    assert_eq!(
        handle_reset_ind(&mut state, Some(&ResetInd { minor_version: 1 })),
        Err(MacError::UnsupportedCommand)
    );
    assert_eq!(state, expected);
}

#[test]
fn test_rekey_ind() {
    let mut state = otaa_state();

    let event = handle_rekey_ind(&mut state, Some(&RekeyInd { minor_version: 1 })).unwrap();

    assert_eq!(event.kind, EventKind::RekeyIndication);
    assert_eq!(
        state.queued_responses.as_slice(),
        &[MacResponse::RekeyConf { minor_version: 1 }]
    );

    let mut abp = abp_state();
    assert_eq!(
        handle_rekey_ind(&mut abp, Some(&RekeyInd { minor_version: 1 })),
        Err(MacError::UnsupportedCommand)
    );
    assert_eq!(
        handle_rekey_ind(&mut state, Some(&RekeyInd { minor_version: 0 })),
        Err(MacError::InvalidFieldValue)
    );
}

#[test]
fn test_device_mode_ind() {
    let mut state = otaa_state();

    handle_device_mode_ind(&mut state, Some(&DeviceModeInd { class: 2 })).unwrap();

    assert_eq!(state.device_class, DeviceClass::C);
    assert_eq!(
        state.queued_responses.as_slice(),
        &[MacResponse::DeviceModeConf { class: DeviceClass::C }]
    );

    let expected = state.clone();
    assert_eq!(
        handle_device_mode_ind(&mut state, Some(&DeviceModeInd { class: 1 })),
        Err(MacError::InvalidFieldValue)
    );
    assert_eq!(state, expected);
}

/// Every answer family: the request it answers, a well-formed answer and,
/// for answers with a payload, the same answer without one
fn answer_families() -> Vec<(MacRequest, UplinkCommand, Option<UplinkCommand>)> {
    vec![
        (
            MacRequest::LinkAdr(link_adr_req(5, 2, 0x0003, 0)),
            UplinkCommand::LinkAdrAns(Some(ALL_ACK)),
            Some(UplinkCommand::LinkAdrAns(None)),
        ),
        (
            MacRequest::DutyCycle(DutyCycleReq { max_duty_cycle: 2 }),
            UplinkCommand::DutyCycleAns,
            None,
        ),
        (
            MacRequest::RxParamSetup(RxParamSetupReq {
                rx1_data_rate_offset: 1,
                rx2_data_rate_index: 2,
                rx2_frequency: 869_525_000,
            }),
            UplinkCommand::RxParamSetupAns(Some(RxParamSetupAns {
                rx1_data_rate_offset_ack: true,
                rx2_data_rate_index_ack: true,
                rx2_frequency_ack: true,
            })),
            Some(UplinkCommand::RxParamSetupAns(None)),
        ),
        (
            MacRequest::DevStatus,
            UplinkCommand::DevStatusAns(Some(DevStatusAns { battery: 10, margin: 5 })),
            Some(UplinkCommand::DevStatusAns(None)),
        ),
        (
            MacRequest::NewChannel(NewChannelReq {
                channel_index: 3,
                frequency: 867_100_000,
                min_data_rate_index: 0,
                max_data_rate_index: 5,
            }),
            UplinkCommand::NewChannelAns(Some(NewChannelAns { frequency_ack: true, data_rate_ack: true })),
            Some(UplinkCommand::NewChannelAns(None)),
        ),
        (
            MacRequest::RxTimingSetup(RxTimingSetupReq { delay: 2 }),
            UplinkCommand::RxTimingSetupAns,
            None,
        ),
        (
            MacRequest::TxParamSetup(TxParamSetupReq {
                max_eirp_index: 7,
                uplink_dwell_time: false,
                downlink_dwell_time: true,
            }),
            UplinkCommand::TxParamSetupAns,
            None,
        ),
        (
            MacRequest::DlChannel(DlChannelReq { channel_index: 0, frequency: 869_000_000 }),
            UplinkCommand::DlChannelAns(Some(DlChannelAns {
                channel_frequency_ack: true,
                uplink_frequency_exists_ack: true,
            })),
            Some(UplinkCommand::DlChannelAns(None)),
        ),
        (
            MacRequest::AdrParamSetup(AdrParamSetupReq {
                adr_ack_limit_exponent: 7,
                adr_ack_delay_exponent: 3,
            }),
            UplinkCommand::AdrParamSetupAns,
            None,
        ),
        (
            rejoin_req(RejoinCountExponent::Count256, RejoinTimeExponent::Time4),
            UplinkCommand::RejoinParamSetupAns(Some(RejoinParamSetupAns { max_time_exponent_ack: true })),
            Some(UplinkCommand::RejoinParamSetupAns(None)),
        ),
        (
            MacRequest::PingSlotChannel(PingSlotChannelReq {
                frequency: 869_100_000,
                data_rate_index: 2,
            }),
            UplinkCommand::PingSlotChannelAns(Some(PingSlotChannelAns {
                frequency_ack: true,
                data_rate_index_ack: true,
            })),
            Some(UplinkCommand::PingSlotChannelAns(None)),
        ),
        (
            MacRequest::BeaconFreq(BeaconFreqReq { frequency: 869_300_000 }),
            UplinkCommand::BeaconFreqAns(Some(BeaconFreqAns { frequency_ack: true })),
            Some(UplinkCommand::BeaconFreqAns(None)),
        ),
    ]
}

#[test]
fn test_every_answer_without_request() {
    let registry = CommandRegistry::new();

    for (request, answer, missing) in answer_families() {
        let mut state = otaa_state();
        let expected = state.clone();

        let result = registry.dispatch(&mut state, &answer, &context());
        assert_eq!(result, Err(MacError::NoMatchingRequest), "{:?}", request);
        assert_eq!(state, expected, "{:?}", request);

        if let Some(missing) = missing {
            let result = registry.dispatch(&mut state, &missing, &context());
            assert_eq!(result, Err(MacError::MissingPayload), "{:?}", request);
            assert_eq!(state, expected, "{:?}", request);
        }
    }
}

#[test]
fn test_every_answer_consumed_once() {
    let registry = CommandRegistry::new();

    for (request, answer, _) in answer_families() {
        let mut state = otaa_state();
        state.enqueue(request.clone()).unwrap();

        assert!(registry.dispatch(&mut state, &answer, &context()).is_ok(), "{:?}", request);
        assert!(state.pending_requests.is_empty(), "{:?}", request);
        let after_first = state.clone();

        let replay = registry.dispatch(&mut state, &answer, &context());
        assert_eq!(replay, Err(MacError::NoMatchingRequest), "{:?}", request);
        assert_eq!(state, after_first, "{:?}", request);
    }
}

#[test]
fn test_every_answer_missing_payload_keeps_request() {
    let registry = CommandRegistry::new();

    for (request, _, missing) in answer_families() {
        let Some(missing) = missing else { continue };
        let mut state = otaa_state();
        state.enqueue(request.clone()).unwrap();
        let expected = state.clone();

        let result = registry.dispatch(&mut state, &missing, &context());
        assert_eq!(result, Err(MacError::MissingPayload), "{:?}", request);
        assert_eq!(state, expected, "{:?}", request);
    }
}

#[test]
fn test_proprietary_request_not_consumed_by_standard_answer() {
    let mut state = otaa_state();
    let payload = heapless::Vec::from_slice(&[0x01]).unwrap();

    assert_eq!(
        state.enqueue(MacRequest::Proprietary { cid: 0x03, payload: payload.clone() }),
        Err(MacError::InvalidFieldValue)
    );
    assert!(state.pending_requests.is_empty());

    // inserted directly, bypassing enqueue
    state
        .pending_requests
        .push(MacRequest::Proprietary { cid: 0x03, payload: payload.clone() })
        .unwrap();
    state.enqueue(MacRequest::LinkAdr(link_adr_req(5, 2, 0x0003, 0))).unwrap();

    let event = handle_link_adr_ans(&mut state, Some(&ALL_ACK)).unwrap();

    assert_eq!(event.kind, EventKind::LinkAdrAccept);
    assert_eq!(
        state.pending_requests.as_slice(),
        &[MacRequest::Proprietary { cid: 0x03, payload }]
    );
}
