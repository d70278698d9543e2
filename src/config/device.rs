/// EUI-64 (8 bytes)
pub type EUI64 = [u8; 8];
/// Device Address (4 bytes)
pub type DevAddr = [u8; 4];

/// Identity of an end device within the network server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceId {
    /// Device EUI (unique device identifier)
    pub dev_eui: EUI64,
    /// Device address of the active session
    pub dev_addr: DevAddr,
}

impl DeviceId {
    /// Create a new device identity
    pub fn new(dev_eui: EUI64, dev_addr: DevAddr) -> Self {
        Self { dev_eui, dev_addr }
    }
}

/// LoRaWAN device class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceClass {
    /// Class A: Uplink followed by two receive windows
    #[default]
    A,
    /// Class B: Scheduled receive slots (beaconing)
    B,
    /// Class C: Continuously listening except when transmitting
    C,
}

impl DeviceClass {
    /// Decode the class field of a DeviceModeInd.
    ///
    /// Only Class A (0) and Class C (2) can be requested this way; 1 is RFU.
    pub fn from_device_mode(value: u8) -> Option<Self> {
        match value {
            0 => Some(DeviceClass::A),
            2 => Some(DeviceClass::C),
            _ => None,
        }
    }

    /// Wire value used in DeviceModeInd/DeviceModeConf
    pub fn device_mode(&self) -> u8 {
        match self {
            DeviceClass::A => 0,
            DeviceClass::B => 1,
            DeviceClass::C => 2,
        }
    }
}

/// How the device session was activated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivationState {
    /// Device is activated through OTAA
    OTAAActivated,
    /// Device is activated through ABP
    ABPActivated,
}
