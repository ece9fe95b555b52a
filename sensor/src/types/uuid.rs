//! UUID types.

use core::fmt;

use crate::Error;

/// A 16-bit or 128-bit UUID.
///
/// The bytes are stored little-endian, the order in which they travel over the air.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Uuid {
    /// 16-bit UUID
    Uuid16([u8; 2]),
    /// 128-bit UUID
    Uuid128([u8; 16]),
}

impl From<u128> for Uuid {
    fn from(data: u128) -> Self {
        Uuid::Uuid128(data.to_le_bytes())
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(data: [u8; 16]) -> Self {
        Uuid::Uuid128(data)
    }
}

impl From<[u8; 2]> for Uuid {
    fn from(data: [u8; 2]) -> Self {
        Uuid::Uuid16(data)
    }
}

impl From<u16> for Uuid {
    fn from(data: u16) -> Self {
        Uuid::Uuid16(data.to_le_bytes())
    }
}

impl Uuid {
    /// Create a new 16-bit UUID.
    pub const fn new_short(val: u16) -> Self {
        Self::Uuid16(val.to_le_bytes())
    }

    /// Create a new 128-bit UUID from little-endian bytes.
    pub const fn new_long(val: [u8; 16]) -> Self {
        Self::Uuid128(val)
    }

    /// Create a new 128-bit UUID from its canonical (big-endian) numeric form,
    /// e.g. `0xF000AA00_0451_4000_B000_000000000000`.
    pub const fn from_u128(val: u128) -> Self {
        Self::Uuid128(val.to_le_bytes())
    }

    /// Number of significant bytes: 2 or 16.
    pub const fn byte_len(&self) -> usize {
        match self {
            Uuid::Uuid16(_) => 2,
            Uuid::Uuid128(_) => 16,
        }
    }

    /// Get the 16-bit UUID value, if this is a short UUID.
    pub fn as_short(&self) -> Option<u16> {
        match self {
            Uuid::Uuid16(data) => Some(u16::from_le_bytes(*data)),
            Uuid::Uuid128(_) => None,
        }
    }

    /// Get the raw UUID bytes.
    pub fn as_raw(&self) -> &[u8] {
        match self {
            Uuid::Uuid16(uuid) => uuid,
            Uuid::Uuid128(uuid) => uuid,
        }
    }

    /// Compare against a UUID reported by the peer.
    ///
    /// Both sides must carry the same byte length; only that many bytes are compared.
    pub fn matches(&self, reported: &Uuid) -> bool {
        self.byte_len() == reported.byte_len() && self.as_raw() == reported.as_raw()
    }
}

impl TryFrom<&[u8]> for Uuid {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        match value.len() {
            2 => Ok(Uuid::Uuid16([value[0], value[1]])),
            16 => {
                let mut bytes = [0; 16];
                bytes.copy_from_slice(value);
                Ok(Uuid::Uuid128(bytes))
            }
            _ => Err(Error::InvalidUuidLength(value.len())),
        }
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uuid::Uuid16(bytes) => write!(f, "{:04x}", u16::from_le_bytes(*bytes)),
            Uuid::Uuid128(bytes) => {
                for (i, b) in bytes.iter().rev().enumerate() {
                    if matches!(i, 4 | 6 | 8 | 10) {
                        f.write_str("-")?;
                    }
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}
