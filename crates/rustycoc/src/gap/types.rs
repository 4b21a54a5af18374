use crate::gap::constants::*;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Address type of the remote device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressType {
    /// LE public device address
    Public,
    /// LE random device address
    Random,
    /// BR/EDR (classic) address
    BrEdr,
}

impl AddressType {
    /// Whether the address belongs to the LE transport
    pub fn is_le(&self) -> bool {
        !matches!(self, AddressType::BrEdr)
    }
}

impl From<AddressType> for u8 {
    fn from(value: AddressType) -> Self {
        match value {
            AddressType::Public => BDADDR_LE_PUBLIC,
            AddressType::Random => BDADDR_LE_RANDOM,
            AddressType::BrEdr => BDADDR_BREDR,
        }
    }
}

impl TryFrom<u8> for AddressType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            BDADDR_LE_PUBLIC => Ok(AddressType::Public),
            BDADDR_LE_RANDOM => Ok(AddressType::Random),
            BDADDR_BREDR => Ok(AddressType::BrEdr),
            other => Err(other),
        }
    }
}

/// Error returned when a textual device address cannot be parsed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("expected 6 colon-separated octets, found {0}")]
    OctetCount(usize),

    #[error("invalid octet {0:?}")]
    InvalidOctet(String),
}

/// Bluetooth device address.
///
/// Bytes are stored in the order the kernel expects them in `bdaddr_t`,
/// i.e. least significant octet first. The textual form prints the most
/// significant octet first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BdAddr {
    pub bytes: [u8; BDADDR_LEN],
}

impl BdAddr {
    /// The wildcard address (`BDADDR_ANY`)
    pub const ANY: BdAddr = BdAddr {
        bytes: [0u8; BDADDR_LEN],
    };

    pub fn new(bytes: [u8; BDADDR_LEN]) -> Self {
        Self { bytes }
    }
}

impl FromStr for BdAddr {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let octets: Vec<&str> = s.trim().split(':').collect();
        if octets.len() != BDADDR_LEN {
            return Err(AddressParseError::OctetCount(octets.len()));
        }

        let mut bytes = [0u8; BDADDR_LEN];
        for (i, octet) in octets.iter().enumerate() {
            if octet.len() != 2 {
                return Err(AddressParseError::InvalidOctet(octet.to_string()));
            }
            // Textual form is most significant octet first
            hex::decode_to_slice(octet.as_bytes(), &mut bytes[BDADDR_LEN - 1 - i..BDADDR_LEN - i])
                .map_err(|_| AddressParseError::InvalidOctet(octet.to_string()))?;
        }

        Ok(Self { bytes })
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.bytes[5],
            self.bytes[4],
            self.bytes[3],
            self.bytes[2],
            self.bytes[1],
            self.bytes[0]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let addr: BdAddr = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(addr.bytes, [0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA]);
        assert_eq!(addr.to_string(), "AA:BB:CC:DD:EE:FF");

        let lower: BdAddr = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        assert_eq!(lower, addr);

        let built = BdAddr::new([0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA]);
        assert_eq!(built, addr);
        assert_eq!(BdAddr::ANY.to_string(), "00:00:00:00:00:00");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(
            "AA:BB:CC".parse::<BdAddr>(),
            Err(AddressParseError::OctetCount(3))
        );
        assert_eq!(
            "AA:BB:CC:DD:EE:GG".parse::<BdAddr>(),
            Err(AddressParseError::InvalidOctet("GG".to_string()))
        );
        assert_eq!(
            "AA:BB:CC:DD:EE:F".parse::<BdAddr>(),
            Err(AddressParseError::InvalidOctet("F".to_string()))
        );
    }

    #[test]
    fn test_address_type_mapping() {
        assert_eq!(u8::from(AddressType::Random), BDADDR_LE_RANDOM);
        assert_eq!(AddressType::try_from(BDADDR_LE_PUBLIC), Ok(AddressType::Public));
        assert_eq!(AddressType::try_from(0x07), Err(0x07));
        assert!(AddressType::Random.is_le());
        assert!(!AddressType::BrEdr.is_le());
    }
}
