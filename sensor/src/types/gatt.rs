//! GATT attribute records exchanged with the Bluetooth stack.

use core::fmt::{self, Display};

use crate::types::uuid::Uuid;

/// Status code reported by the stack when a GATT request completes.
///
/// Values follow the ATT error codes (Core Specification Vol 3, Part F, 3.4.1.1),
/// with `0x00` meaning success.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct GattStatus {
    value: u8,
}

impl GattStatus {
    /// The request completed
    pub const SUCCESS: Self = Self { value: 0x00 };
    /// Attempted to use a handle that isn't valid on this server
    pub const INVALID_HANDLE: Self = Self { value: 0x01 };
    /// The attribute cannot be read
    pub const READ_NOT_PERMITTED: Self = Self { value: 0x02 };
    /// The attribute cannot be written
    pub const WRITE_NOT_PERMITTED: Self = Self { value: 0x03 };
    /// The attribute requires authentication before it can be read or written
    pub const INSUFFICIENT_AUTHENTICATION: Self = Self { value: 0x05 };
    /// No attribute found within the given attribute handle range
    pub const ATTRIBUTE_NOT_FOUND: Self = Self { value: 0x0a };
    /// The attribute value length is invalid for the operation
    pub const INVALID_ATTRIBUTE_VALUE_LENGTH: Self = Self { value: 0x0d };
    /// The request could not be completed for an unlikely reason
    pub const UNLIKELY_ERROR: Self = Self { value: 0x0e };
    /// The attribute requires encryption before it can be read or written
    pub const INSUFFICIENT_ENCRYPTION: Self = Self { value: 0x0f };
    /// Insufficient resources to complete the request
    pub const INSUFFICIENT_RESOURCES: Self = Self { value: 0x11 };

    /// Wrap a raw status byte.
    pub const fn new(value: u8) -> Self {
        Self { value }
    }

    /// Raw status byte.
    pub const fn raw(&self) -> u8 {
        self.value
    }

    /// Whether the request completed without error.
    pub const fn is_success(&self) -> bool {
        self.value == 0
    }
}

impl Display for GattStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::SUCCESS => f.write_str("success"),
            Self::INVALID_HANDLE => f.write_str("invalid handle"),
            Self::READ_NOT_PERMITTED => f.write_str("read not permitted"),
            Self::WRITE_NOT_PERMITTED => f.write_str("write not permitted"),
            Self::INSUFFICIENT_AUTHENTICATION => f.write_str("insufficient authentication"),
            Self::ATTRIBUTE_NOT_FOUND => f.write_str("attribute not found"),
            Self::INVALID_ATTRIBUTE_VALUE_LENGTH => f.write_str("invalid attribute value length"),
            Self::UNLIKELY_ERROR => f.write_str("unlikely error"),
            Self::INSUFFICIENT_ENCRYPTION => f.write_str("insufficient encryption"),
            Self::INSUFFICIENT_RESOURCES => f.write_str("insufficient resources"),
            other => write!(f, "status {:#04x}", other.value),
        }
    }
}

/// Characteristic properties
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CharacteristicProp {
    /// Broadcast
    Broadcast = 0x01,
    /// Read
    Read = 0x02,
    /// Write without response
    WriteWithoutResponse = 0x04,
    /// Write
    Write = 0x08,
    /// Notify
    Notify = 0x10,
    /// Indicate
    Indicate = 0x20,
    /// Authenticated writes
    AuthenticatedWrite = 0x40,
    /// Extended properties
    Extended = 0x80,
}

/// Properties bitmask of a characteristic declaration.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharacteristicProps(pub u8);

impl CharacteristicProps {
    /// Build a bitmask from a list of properties.
    pub fn new(props: &[CharacteristicProp]) -> Self {
        Self(props.iter().fold(0, |acc, p| acc | *p as u8))
    }

    /// Whether any of the given properties is set.
    pub fn any(&self, props: &[CharacteristicProp]) -> bool {
        props.iter().any(|p| self.0 & (*p as u8) != 0)
    }

    /// Whether the read property (bit 0x02) is set.
    pub fn is_readable(&self) -> bool {
        self.any(&[CharacteristicProp::Read])
    }
}

impl From<u8> for CharacteristicProps {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

/// Attribute handle range covered by a service or characteristic.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupHandle {
    /// First handle of the group.
    pub start: u16,
    /// Last handle of the group.
    pub end: u16,
}

impl GroupHandle {
    /// Create a handle range.
    pub const fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }
}

/// A primary service reported during service discovery.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredService {
    /// Service type.
    pub uuid: Uuid,
    /// Handles spanned by the service.
    pub group: GroupHandle,
}

/// A characteristic reported during characteristic discovery.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredCharacteristic {
    /// Characteristic type.
    pub uuid: Uuid,
    /// Handles spanned by the characteristic, declaration included.
    pub group: GroupHandle,
    /// Handle of the characteristic value.
    pub value_handle: u16,
    /// Declared properties.
    pub properties: CharacteristicProps,
}

/// A descriptor reported during descriptor discovery.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredDescriptor {
    /// Descriptor type.
    pub uuid: Uuid,
    /// Descriptor handle.
    pub handle: u16,
}

/// Service scope handed to the stack when discovering characteristics.
pub type ServiceRange = DiscoveredService;

/// Characteristic scope handed to the stack when discovering descriptors.
pub type CharacteristicRange = DiscoveredCharacteristic;

/// An attribute value carried by a read response or a notification.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeValue<'a> {
    /// Handle the value belongs to.
    pub handle: u16,
    /// Value bytes.
    pub value: &'a [u8],
}
