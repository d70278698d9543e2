use heapless::Vec;

use crate::config::device::DeviceClass;
use crate::lorawan::mac::MacError;

/// Maximum payload length carried by a proprietary MAC command
pub const MAX_PROPRIETARY_PAYLOAD: usize = 16;

/// Raw payload of a proprietary MAC command
pub type ProprietaryPayload = Vec<u8, MAX_PROPRIETARY_PAYLOAD>;

/// MAC command identifiers
///
/// Requests and their answers share a CID; the direction tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Cid {
    ResetInd = 0x01,
    LinkCheck = 0x02,
    LinkADR = 0x03,
    DutyCycle = 0x04,
    RXParamSetup = 0x05,
    DevStatus = 0x06,
    NewChannel = 0x07,
    RXTimingSetup = 0x08,
    TxParamSetup = 0x09,
    DlChannel = 0x0A,
    Rekey = 0x0B,
    ADRParamSetup = 0x0C,
    DeviceTime = 0x0D,
    ForceRejoin = 0x0E,
    RejoinParamSetup = 0x0F,
    PingSlotInfo = 0x10,
    PingSlotChannel = 0x11,
    BeaconTiming = 0x12,
    BeaconFreq = 0x13,
    DeviceMode = 0x20,
}

/// First CID of the proprietary range
pub const PROPRIETARY_CID_MIN: u8 = 0x80;

impl Cid {
    /// Whether `cid` lies in the proprietary range (0x80..=0xFF)
    pub fn is_proprietary(cid: u8) -> bool {
        cid >= PROPRIETARY_CID_MIN
    }
}

impl TryFrom<u8> for Cid {
    type Error = MacError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x01 => Cid::ResetInd,
            0x02 => Cid::LinkCheck,
            0x03 => Cid::LinkADR,
            0x04 => Cid::DutyCycle,
            0x05 => Cid::RXParamSetup,
            0x06 => Cid::DevStatus,
            0x07 => Cid::NewChannel,
            0x08 => Cid::RXTimingSetup,
            0x09 => Cid::TxParamSetup,
            0x0A => Cid::DlChannel,
            0x0B => Cid::Rekey,
            0x0C => Cid::ADRParamSetup,
            0x0D => Cid::DeviceTime,
            0x0E => Cid::ForceRejoin,
            0x0F => Cid::RejoinParamSetup,
            0x10 => Cid::PingSlotInfo,
            0x11 => Cid::PingSlotChannel,
            0x12 => Cid::BeaconTiming,
            0x13 => Cid::BeaconFreq,
            0x20 => Cid::DeviceMode,
            _ => return Err(MacError::UnsupportedCommand),
        })
    }
}

/// Maximum number of messages between two rejoin requests, as `2^(4+n)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum RejoinCountExponent {
    #[default]
    Count16 = 0,
    Count32,
    Count64,
    Count128,
    Count256,
    Count512,
    Count1024,
    Count2048,
    Count4096,
    Count8192,
    Count16384,
    Count32768,
    Count65536,
    Count131072,
    Count262144,
    Count524288,
}

impl RejoinCountExponent {
    const ALL: [Self; 16] = [
        Self::Count16,
        Self::Count32,
        Self::Count64,
        Self::Count128,
        Self::Count256,
        Self::Count512,
        Self::Count1024,
        Self::Count2048,
        Self::Count4096,
        Self::Count8192,
        Self::Count16384,
        Self::Count32768,
        Self::Count65536,
        Self::Count131072,
        Self::Count262144,
        Self::Count524288,
    ];

    /// Number of uplinks between rejoin requests
    pub fn messages(&self) -> u32 {
        1 << (4 + *self as u32)
    }
}

impl TryFrom<u8> for RejoinCountExponent {
    type Error = MacError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(MacError::InvalidFieldValue)
    }
}

/// Maximum time between two rejoin requests, as `2^(10+n)` seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum RejoinTimeExponent {
    #[default]
    Time0 = 0,
    Time1,
    Time2,
    Time3,
    Time4,
    Time5,
    Time6,
    Time7,
    Time8,
    Time9,
    Time10,
    Time11,
    Time12,
    Time13,
    Time14,
    Time15,
}

impl RejoinTimeExponent {
    const ALL: [Self; 16] = [
        Self::Time0,
        Self::Time1,
        Self::Time2,
        Self::Time3,
        Self::Time4,
        Self::Time5,
        Self::Time6,
        Self::Time7,
        Self::Time8,
        Self::Time9,
        Self::Time10,
        Self::Time11,
        Self::Time12,
        Self::Time13,
        Self::Time14,
        Self::Time15,
    ];

    /// Seconds between rejoin requests
    pub fn seconds(&self) -> u32 {
        1 << (10 + *self as u32)
    }
}

impl TryFrom<u8> for RejoinTimeExponent {
    type Error = MacError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(MacError::InvalidFieldValue)
    }
}

/// Link ADR request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkAdrReq {
    /// Data rate index (15 = keep current)
    pub data_rate_index: u8,
    /// TX power index (15 = keep current)
    pub tx_power_index: u8,
    /// Channel mask
    pub channel_mask: u16,
    /// Channel mask control
    pub channel_mask_control: u8,
    /// Number of transmissions (0 = keep current)
    pub nb_trans: u8,
}

/// Duty cycle request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DutyCycleReq {
    /// Aggregated duty cycle as `1 / 2^max_duty_cycle`
    pub max_duty_cycle: u8,
}

/// RX parameter setup request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RxParamSetupReq {
    /// RX1 data rate offset
    pub rx1_data_rate_offset: u8,
    /// RX2 data rate index
    pub rx2_data_rate_index: u8,
    /// RX2 frequency in Hz
    pub rx2_frequency: u32,
}

/// New channel request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewChannelReq {
    /// Channel index
    pub channel_index: u8,
    /// Frequency in Hz (0 = disable the channel)
    pub frequency: u32,
    /// Minimum data rate index
    pub min_data_rate_index: u8,
    /// Maximum data rate index
    pub max_data_rate_index: u8,
}

/// RX timing setup request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RxTimingSetupReq {
    /// RX1 delay in seconds (0 means 1)
    pub delay: u8,
}

/// TX parameter setup request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TxParamSetupReq {
    /// MaxEIRP index
    pub max_eirp_index: u8,
    /// Uplink dwell time limited to 400 ms
    pub uplink_dwell_time: bool,
    /// Downlink dwell time limited to 400 ms
    pub downlink_dwell_time: bool,
}

/// Downlink channel request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DlChannelReq {
    /// Channel index
    pub channel_index: u8,
    /// Downlink frequency in Hz
    pub frequency: u32,
}

/// ADR parameter setup request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdrParamSetupReq {
    /// ADR_ACK_LIMIT as `2^n`
    pub adr_ack_limit_exponent: u8,
    /// ADR_ACK_DELAY as `2^n`
    pub adr_ack_delay_exponent: u8,
}

/// Rejoin parameter setup request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RejoinParamSetupReq {
    /// Maximum uplinks between rejoin requests
    pub max_count_exponent: RejoinCountExponent,
    /// Maximum time between rejoin requests
    pub max_time_exponent: RejoinTimeExponent,
}

/// Ping slot channel request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PingSlotChannelReq {
    /// Ping slot frequency in Hz (0 = region default)
    pub frequency: u32,
    /// Ping slot data rate index
    pub data_rate_index: u8,
}

/// Beacon frequency request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeaconFreqReq {
    /// Beacon frequency in Hz (0 = region default)
    pub frequency: u32,
}

/// Downlink MAC request awaiting an answer from the device
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum MacRequest {
    LinkAdr(LinkAdrReq),
    DutyCycle(DutyCycleReq),
    RxParamSetup(RxParamSetupReq),
    DevStatus,
    NewChannel(NewChannelReq),
    RxTimingSetup(RxTimingSetupReq),
    TxParamSetup(TxParamSetupReq),
    DlChannel(DlChannelReq),
    AdrParamSetup(AdrParamSetupReq),
    RejoinParamSetup(RejoinParamSetupReq),
    PingSlotChannel(PingSlotChannelReq),
    BeaconFreq(BeaconFreqReq),
    /// Request in the proprietary CID range
    Proprietary { cid: u8, payload: ProprietaryPayload },
}

impl MacRequest {
    /// Command identifier of the request
    pub fn cid(&self) -> u8 {
        let cid = match self {
            MacRequest::LinkAdr(_) => Cid::LinkADR,
            MacRequest::DutyCycle(_) => Cid::DutyCycle,
            MacRequest::RxParamSetup(_) => Cid::RXParamSetup,
            MacRequest::DevStatus => Cid::DevStatus,
            MacRequest::NewChannel(_) => Cid::NewChannel,
            MacRequest::RxTimingSetup(_) => Cid::RXTimingSetup,
            MacRequest::TxParamSetup(_) => Cid::TxParamSetup,
            MacRequest::DlChannel(_) => Cid::DlChannel,
            MacRequest::AdrParamSetup(_) => Cid::ADRParamSetup,
            MacRequest::RejoinParamSetup(_) => Cid::RejoinParamSetup,
            MacRequest::PingSlotChannel(_) => Cid::PingSlotChannel,
            MacRequest::BeaconFreq(_) => Cid::BeaconFreq,
            MacRequest::Proprietary { cid, .. } => return *cid,
        };
        cid as u8
    }
}

/// ResetInd payload (LoRaWAN 1.1, ABP only)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResetInd {
    /// LoRaWAN minor version implemented by the device
    pub minor_version: u8,
}

/// Link ADR answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkAdrAns {
    /// Channel mask ACK
    pub channel_mask_ack: bool,
    /// Data rate ACK
    pub data_rate_index_ack: bool,
    /// Power ACK
    pub tx_power_index_ack: bool,
}

/// RX parameter setup answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RxParamSetupAns {
    /// RX1 data rate offset ACK
    pub rx1_data_rate_offset_ack: bool,
    /// RX2 data rate ACK
    pub rx2_data_rate_index_ack: bool,
    /// RX2 channel ACK
    pub rx2_frequency_ack: bool,
}

/// Device status answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DevStatusAns {
    /// Battery level (0 = external power, 1-254 = level, 255 = unknown)
    pub battery: u8,
    /// Demodulation margin in dB, 6-bit signed (-32..=31)
    pub margin: i8,
}

/// New channel answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewChannelAns {
    /// Channel frequency OK
    pub frequency_ack: bool,
    /// Data rate range OK
    pub data_rate_ack: bool,
}

/// Downlink channel answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DlChannelAns {
    /// Channel frequency OK
    pub channel_frequency_ack: bool,
    /// Uplink frequency exists
    pub uplink_frequency_exists_ack: bool,
}

/// RekeyInd payload (LoRaWAN 1.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RekeyInd {
    /// LoRaWAN minor version implemented by the device
    pub minor_version: u8,
}

/// Rejoin parameter setup answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RejoinParamSetupAns {
    /// Device accepted the time periodicity
    pub max_time_exponent_ack: bool,
}

/// Ping slot info request sent by a Class B device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PingSlotInfoReq {
    /// Ping slot periodicity (0-7), one slot every `2^period` seconds
    pub period: u8,
}

/// Ping slot channel answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PingSlotChannelAns {
    /// Frequency OK
    pub frequency_ack: bool,
    /// Data rate OK
    pub data_rate_index_ack: bool,
}

/// Beacon frequency answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeaconFreqAns {
    /// Beacon frequency OK
    pub frequency_ack: bool,
}

/// DeviceModeInd payload (LoRaWAN 1.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceModeInd {
    /// Requested class, as sent on the wire (0 = A, 2 = C)
    pub class: u8,
}

/// MAC command decoded from an uplink frame
///
/// Variants that carry a payload hold `None` when the decoder could not
/// produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum UplinkCommand {
    ResetInd(Option<ResetInd>),
    LinkCheckReq,
    LinkAdrAns(Option<LinkAdrAns>),
    DutyCycleAns,
    RxParamSetupAns(Option<RxParamSetupAns>),
    DevStatusAns(Option<DevStatusAns>),
    NewChannelAns(Option<NewChannelAns>),
    RxTimingSetupAns,
    TxParamSetupAns,
    DlChannelAns(Option<DlChannelAns>),
    RekeyInd(Option<RekeyInd>),
    AdrParamSetupAns,
    DeviceTimeReq,
    RejoinParamSetupAns(Option<RejoinParamSetupAns>),
    PingSlotInfoReq(Option<PingSlotInfoReq>),
    PingSlotChannelAns(Option<PingSlotChannelAns>),
    BeaconFreqAns(Option<BeaconFreqAns>),
    DeviceModeInd(Option<DeviceModeInd>),
    /// Command in the proprietary CID range
    Proprietary { cid: u8, payload: ProprietaryPayload },
    /// CID the decoder did not recognize
    Unknown(u8),
}

impl UplinkCommand {
    /// Command identifier of the uplink command
    pub fn cid(&self) -> u8 {
        let cid = match self {
            UplinkCommand::ResetInd(_) => Cid::ResetInd,
            UplinkCommand::LinkCheckReq => Cid::LinkCheck,
            UplinkCommand::LinkAdrAns(_) => Cid::LinkADR,
            UplinkCommand::DutyCycleAns => Cid::DutyCycle,
            UplinkCommand::RxParamSetupAns(_) => Cid::RXParamSetup,
            UplinkCommand::DevStatusAns(_) => Cid::DevStatus,
            UplinkCommand::NewChannelAns(_) => Cid::NewChannel,
            UplinkCommand::RxTimingSetupAns => Cid::RXTimingSetup,
            UplinkCommand::TxParamSetupAns => Cid::TxParamSetup,
            UplinkCommand::DlChannelAns(_) => Cid::DlChannel,
            UplinkCommand::RekeyInd(_) => Cid::Rekey,
            UplinkCommand::AdrParamSetupAns => Cid::ADRParamSetup,
            UplinkCommand::DeviceTimeReq => Cid::DeviceTime,
            UplinkCommand::RejoinParamSetupAns(_) => Cid::RejoinParamSetup,
            UplinkCommand::PingSlotInfoReq(_) => Cid::PingSlotInfo,
            UplinkCommand::PingSlotChannelAns(_) => Cid::PingSlotChannel,
            UplinkCommand::BeaconFreqAns(_) => Cid::BeaconFreq,
            UplinkCommand::DeviceModeInd(_) => Cid::DeviceMode,
            UplinkCommand::Proprietary { cid, .. } | UplinkCommand::Unknown(cid) => return *cid,
        };
        cid as u8
    }
}

/// Network-server answer to a device-initiated command, queued for the next downlink
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MacResponse {
    /// ResetConf with the negotiated minor version
    ResetConf {
        /// LoRaWAN minor version
        minor_version: u8,
    },
    /// LinkCheckAns
    LinkCheckAns {
        /// Link margin in dB above the demodulation floor
        margin: u8,
        /// Number of gateways that received the request
        gateway_count: u8,
    },
    /// RekeyConf with the negotiated minor version
    RekeyConf {
        /// LoRaWAN minor version
        minor_version: u8,
    },
    /// DeviceTimeAns
    DeviceTimeAns {
        /// Seconds since the GPS epoch
        seconds: u32,
        /// Fractional second in 1/256 s steps
        fractional_second: u8,
    },
    /// PingSlotInfoAns
    PingSlotInfoAns,
    /// DeviceModeConf
    DeviceModeConf {
        /// Class the device now operates in
        class: DeviceClass,
    },
}
