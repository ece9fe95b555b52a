//! Declarative GATT client for BLE sensor peripherals.
#![no_std]

extern crate alloc;

use bt_hci::param::{AddrKind, BdAddr};

mod fmt;

pub mod attribute;
pub mod config;
pub mod cursor;
mod discovery;
mod dispatch;
mod notification;
pub mod pool;
pub mod profiles;
mod sensor;
pub mod stack;
pub mod types;

pub use discovery::Phase;
pub use notification::Notification;
pub use sensor::{Sensor, SensorHandler};

/// Errors raised by the sensor engine itself.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No connection is established.
    NotConnected,
    /// The id does not name a node of the tree.
    NotFound,
    /// The node has not been resolved to a handle on the peer.
    NotDiscovered,
    /// The operation is not valid in the current phase.
    InvalidState,
    /// A value buffer could not be allocated.
    OutOfMemory,
    /// The notification queue is full.
    QueueFull,
    /// A UUID must be 2 or 16 bytes long.
    InvalidUuidLength(usize),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotConnected => f.write_str("not connected"),
            Self::NotFound => f.write_str("no such attribute"),
            Self::NotDiscovered => f.write_str("attribute not discovered"),
            Self::InvalidState => f.write_str("invalid state"),
            Self::OutOfMemory => f.write_str("out of memory"),
            Self::QueueFull => f.write_str("notification queue full"),
            Self::InvalidUuidLength(len) => write!(f, "invalid uuid length {}", len),
        }
    }
}

/// Errors returned by operations that reach the underlying stack.
#[derive(Debug, PartialEq)]
pub enum SensorError<E> {
    /// The stack rejected the request.
    Stack(E),
    /// The engine refused the request.
    Sensor(Error),
}

impl<E> From<Error> for SensorError<E> {
    fn from(value: Error) -> Self {
        Self::Sensor(value)
    }
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for SensorError<E>
where
    E: defmt::Format,
{
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Stack(e) => {
                defmt::write!(fmt, "Stack({})", e)
            }
            Self::Sensor(e) => {
                defmt::write!(fmt, "Sensor({})", e)
            }
        }
    }
}

/// Address of a peripheral.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    /// Public or random.
    pub kind: AddrKind,
    /// Raw address bytes, least significant first.
    pub addr: BdAddr,
}

impl Address {
    /// A public device address.
    pub fn public(addr: [u8; 6]) -> Self {
        Self {
            kind: AddrKind::PUBLIC,
            addr: BdAddr::new(addr),
        }
    }

    /// A random device address.
    pub fn random(addr: [u8; 6]) -> Self {
        Self {
            kind: AddrKind::RANDOM,
            addr: BdAddr::new(addr),
        }
    }
}

/// Everything needed to declare and drive a sensor.
pub mod prelude {
    pub use bt_hci::param::ConnHandle;

    pub use crate::attribute::{
        AttributeTree, Characteristic, CharacteristicData, CharacteristicHandler, CharacteristicId, Descriptor,
        DescriptorData, DescriptorHandler, DescriptorId, NotificationAction, Service, ServiceId, Uuid,
    };
    pub use crate::pool::{HeapPool, ValuePool};
    pub use crate::stack::{Context, GattStack, Target};
    pub use crate::types::gatt::{
        AttributeValue, CharacteristicProp, CharacteristicProps, DiscoveredCharacteristic, DiscoveredDescriptor,
        DiscoveredService, GattStatus, GroupHandle,
    };
    pub use crate::{Address, Error, Phase, Sensor, SensorError, SensorHandler};
}
