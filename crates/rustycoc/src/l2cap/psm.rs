//! Protocol/Service Multiplexer (PSM) handling for L2CAP
//!
//! This module validates and names the PSM values a channel can target.

use std::fmt;

/// Protocol/Service Multiplexer identifying the service a channel connects to.
///
/// See Bluetooth Core Specification Vol 3, Part A, Section 4.2 and
/// assigned numbers: https://www.bluetooth.com/specifications/assigned-numbers/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Psm(u16);

impl Psm {
    /// Service Discovery Protocol
    pub const SDP: Psm = Psm(0x0001);
    /// RFCOMM protocol
    pub const RFCOMM: Psm = Psm(0x0003);
    /// ATT protocol
    pub const ATT: Psm = Psm(0x001F);
    /// Internet Protocol Support Profile
    pub const IPSP: Psm = Psm(0x0023);
    /// Object Transfer Service
    pub const OTS: Psm = Psm(0x0025);
    /// Enhanced ATT
    pub const EATT: Psm = Psm(0x0027);

    /// First dynamically assigned LE PSM
    pub const LE_DYNAMIC_MIN: u16 = 0x0080;
    /// Last dynamically assigned LE PSM
    pub const LE_DYNAMIC_MAX: u16 = 0x00FF;

    /// Create a PSM, rejecting the reserved value zero
    pub fn new(value: u16) -> Option<Self> {
        if value == 0 {
            None
        } else {
            Some(Psm(value))
        }
    }

    /// Get the PSM value as u16
    pub fn value(&self) -> u16 {
        self.0
    }

    /// Whether the PSM lies in the LE dynamic range (0x0080-0x00FF)
    pub fn is_le_dynamic(&self) -> bool {
        (Self::LE_DYNAMIC_MIN..=Self::LE_DYNAMIC_MAX).contains(&self.0)
    }

    /// Whether the PSM is well formed for BR/EDR: the least significant octet
    /// must be odd and the most significant octet even.
    pub fn is_valid_classic(&self) -> bool {
        let [low, high] = self.0.to_le_bytes();
        low & 0x01 == 0x01 && high & 0x01 == 0x00
    }

    fn name(&self) -> Option<&'static str> {
        match self.0 {
            0x0001 => Some("SDP"),
            0x0003 => Some("RFCOMM"),
            0x001F => Some("ATT"),
            0x0023 => Some("IPSP"),
            0x0025 => Some("OTS"),
            0x0027 => Some("EATT"),
            _ => None,
        }
    }
}

impl TryFrom<u16> for Psm {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Psm::new(value).ok_or(value)
    }
}

impl fmt::Display for Psm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} (0x{:04X})", name, self.0),
            None if self.is_le_dynamic() => write!(f, "Dynamic LE PSM (0x{:04X})", self.0),
            None => write!(f, "PSM (0x{:04X})", self.0),
        }
    }
}
