use heapless::Vec;

use super::commands::{RejoinCountExponent, RejoinTimeExponent};
use super::mac::MacParameters;

/// Maximum number of channels tracked per device (US915: 64 + 8)
pub const MAX_CHANNELS: usize = 72;

/// Channel as configured on the device
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Channel {
    /// Uplink frequency in Hz (0 = channel disabled)
    pub uplink_frequency: u32,
    /// Downlink frequency in Hz, when set by DlChannelReq
    pub downlink_frequency: Option<u32>,
    /// Minimum data rate index
    pub min_data_rate_index: u8,
    /// Maximum data rate index
    pub max_data_rate_index: u8,
    /// Whether the device may use the channel for uplinks
    pub enable_uplink: bool,
}

impl Channel {
    fn new(frequency: u32, min_data_rate_index: u8, max_data_rate_index: u8) -> Self {
        Self {
            uplink_frequency: frequency,
            downlink_frequency: None,
            min_data_rate_index,
            max_data_rate_index,
            enable_uplink: true,
        }
    }
}

/// Supported regions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Region {
    /// EU 863-870 MHz, dynamic channel plan
    EU868,
    /// US 902-928 MHz, fixed channel plan
    US915,
}

impl Region {
    /// Whether the region uses a fixed channel plan.
    ///
    /// Fixed plans interpret ChMaskCntl 5-7 as bank operations.
    pub fn fixed_channel_plan(&self) -> bool {
        matches!(self, Region::US915)
    }

    /// Number of channel slots a device may have in this region
    pub fn max_channels(&self) -> usize {
        match self {
            Region::EU868 => 16,
            Region::US915 => MAX_CHANNELS,
        }
    }

    /// Default RX2 frequency and data rate index
    pub fn rx2_defaults(&self) -> (u32, u8) {
        match self {
            Region::EU868 => (869_525_000, 0),
            Region::US915 => (923_300_000, 8),
        }
    }

    /// Default MaxEIRP index (TxParamSetupReq encoding)
    pub fn default_max_eirp_index(&self) -> u8 {
        match self {
            // 16 dBm
            Region::EU868 => 5,
            // 30 dBm
            Region::US915 => 13,
        }
    }

    /// Default channels the device boots with
    pub fn default_channels(&self) -> Vec<Channel, MAX_CHANNELS> {
        let mut channels = Vec::new();
        match self {
            Region::EU868 => {
                for freq in [868_100_000, 868_300_000, 868_500_000] {
                    // capacity is MAX_CHANNELS, never exceeded here
                    let _ = channels.push(Channel::new(freq, 0, 5));
                }
            }
            Region::US915 => {
                // 64 125 kHz upstream channels
                for i in 0..64u32 {
                    let _ = channels.push(Channel::new(902_300_000 + i * 200_000, 0, 3));
                }
                // 8 500 kHz upstream channels
                for i in 0..8u32 {
                    let _ = channels.push(Channel::new(903_000_000 + i * 1_600_000, 4, 4));
                }
            }
        }
        channels
    }

    /// MAC parameters a device uses right after activation
    pub fn default_parameters(&self) -> MacParameters {
        let (rx2_frequency, rx2_data_rate_index) = self.rx2_defaults();
        let (ping_slot_frequency, ping_slot_data_rate_index) = match self {
            Region::EU868 => (869_525_000, 3),
            // frequency hopping
            Region::US915 => (0, 8),
        };

        MacParameters {
            adr_data_rate_index: 0,
            adr_tx_power_index: 0,
            adr_nb_trans: 1,
            adr_ack_limit_exponent: 6,
            adr_ack_delay_exponent: 5,
            channels: self.default_channels(),
            max_duty_cycle: 0,
            rx1_delay: 1,
            rx1_data_rate_offset: 0,
            rx2_data_rate_index,
            rx2_frequency,
            max_eirp_index: self.default_max_eirp_index(),
            uplink_dwell_time: false,
            downlink_dwell_time: false,
            rejoin_count_periodicity: RejoinCountExponent::Count16,
            rejoin_time_periodicity: RejoinTimeExponent::Time0,
            ping_slot_periodicity: None,
            ping_slot_frequency,
            ping_slot_data_rate_index,
            beacon_frequency: 0,
        }
    }
}
