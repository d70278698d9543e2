use core::fmt;

use heapless::FnvIndexMap;

use super::commands::{Cid, UplinkCommand};
use super::events::Event;
use super::handlers;
use super::mac::{MacError, MacState};
use super::processor::UplinkContext;

/// Maximum number of proprietary command handlers
pub const MAX_PROPRIETARY_HANDLERS: usize = 16;

/// Handler for a proprietary command: state, CID and raw payload
pub type ProprietaryHandler = fn(&mut MacState, u8, &[u8]) -> Result<Event, MacError>;

/// Registry error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// The CID is outside the proprietary range
    ReservedCid,
    /// A handler is already registered for the CID
    AlreadyRegistered,
    /// The handler table is full
    Full,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::ReservedCid => f.write_str("CID outside the proprietary range"),
            RegistryError::AlreadyRegistered => f.write_str("CID already registered"),
            RegistryError::Full => f.write_str("handler table full"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RegistryError {}

/// Maps uplink commands to their handlers.
///
/// Standard commands are dispatched by an exhaustive match; proprietary
/// commands through a table filled once at start-up. The registry is
/// read-only afterwards and can be shared between workers.
#[derive(Default)]
pub struct CommandRegistry {
    proprietary: FnvIndexMap<u8, ProprietaryHandler, MAX_PROPRIETARY_HANDLERS>,
}

impl CommandRegistry {
    /// Create a registry with the standard command families
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a proprietary CID (0x80..=0xFF)
    pub fn register(&mut self, cid: u8, handler: ProprietaryHandler) -> Result<(), RegistryError> {
        if !Cid::is_proprietary(cid) {
            return Err(RegistryError::ReservedCid);
        }
        if self.proprietary.contains_key(&cid) {
            return Err(RegistryError::AlreadyRegistered);
        }
        self.proprietary
            .insert(cid, handler)
            .map(|_| ())
            .map_err(|_| RegistryError::Full)
    }

    /// Whether an uplink command with this CID can be handled
    pub fn supports(&self, cid: u8) -> bool {
        match Cid::try_from(cid) {
            Ok(Cid::ForceRejoin | Cid::BeaconTiming) => false,
            Ok(_) => true,
            Err(_) => self.proprietary.contains_key(&cid),
        }
    }

    /// Run the handler for `command` against `state`
    pub fn dispatch(
        &self,
        state: &mut MacState,
        command: &UplinkCommand,
        ctx: &UplinkContext,
    ) -> Result<Event, MacError> {
        match command {
            UplinkCommand::ResetInd(pld) => handlers::handle_reset_ind(state, pld.as_ref()),
            UplinkCommand::LinkCheckReq => handlers::handle_link_check_req(state, ctx),
            UplinkCommand::LinkAdrAns(pld) => handlers::handle_link_adr_ans(state, pld.as_ref()),
            UplinkCommand::DutyCycleAns => handlers::handle_duty_cycle_ans(state),
            UplinkCommand::RxParamSetupAns(pld) => {
                handlers::handle_rx_param_setup_ans(state, pld.as_ref())
            }
            UplinkCommand::DevStatusAns(pld) => {
                handlers::handle_dev_status_ans(state, pld.as_ref(), ctx)
            }
            UplinkCommand::NewChannelAns(pld) => {
                handlers::handle_new_channel_ans(state, pld.as_ref())
            }
            UplinkCommand::RxTimingSetupAns => handlers::handle_rx_timing_setup_ans(state),
            UplinkCommand::TxParamSetupAns => handlers::handle_tx_param_setup_ans(state),
            UplinkCommand::DlChannelAns(pld) => handlers::handle_dl_channel_ans(state, pld.as_ref()),
            UplinkCommand::RekeyInd(pld) => handlers::handle_rekey_ind(state, pld.as_ref()),
            UplinkCommand::AdrParamSetupAns => handlers::handle_adr_param_setup_ans(state),
            UplinkCommand::DeviceTimeReq => handlers::handle_device_time_req(state, ctx),
            UplinkCommand::RejoinParamSetupAns(pld) => {
                handlers::handle_rejoin_param_setup_ans(state, pld.as_ref())
            }
            UplinkCommand::PingSlotInfoReq(pld) => {
                handlers::handle_ping_slot_info_req(state, pld.as_ref())
            }
            UplinkCommand::PingSlotChannelAns(pld) => {
                handlers::handle_ping_slot_channel_ans(state, pld.as_ref())
            }
            UplinkCommand::BeaconFreqAns(pld) => {
                handlers::handle_beacon_freq_ans(state, pld.as_ref())
            }
            UplinkCommand::DeviceModeInd(pld) => {
                handlers::handle_device_mode_ind(state, pld.as_ref())
            }
            UplinkCommand::Proprietary { cid, payload } => {
                let handler = self
                    .proprietary
                    .get(cid)
                    .ok_or(MacError::UnsupportedCommand)?;
                handler(state, *cid, payload)
            }
            UplinkCommand::Unknown(_) => Err(MacError::UnsupportedCommand),
        }
    }
}
