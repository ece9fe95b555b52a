//! The Bluetooth stack the sensor runs on top of.
//!
//! The engine never talks to a controller itself. Every request goes through a
//! [`GattStack`] implementation, and every answer comes back through one of the
//! `Sensor::on_*` entry points, tagged with the [`Context`] the request was issued with.
use bt_hci::param::ConnHandle;

use crate::attribute::{CharacteristicId, DescriptorId};
use crate::types::gatt::{CharacteristicRange, ServiceRange};
use crate::Address;

/// Node an application-initiated request targets.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Characteristic(CharacteristicId),
    Descriptor(DescriptorId),
}

/// Who issued a read or write, handed back unchanged on completion.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// Issued by the discovery engine while reading initial values.
    Discovery,
    /// Issued through the dispatcher on behalf of the application.
    Application(Target),
}

/// GATT client primitives of the underlying stack.
///
/// Requests return as soon as they are queued. Discovery results are reported one
/// attribute per callback followed by a single `None`, reads and writes by exactly one
/// completion. The stack is expected to issue one outstanding request at a time and to
/// always eventually call back or report a disconnect.
pub trait GattStack {
    type Error;

    /// Open a link to `address`.
    fn connect(&mut self, address: &Address) -> Result<ConnHandle, Self::Error>;

    /// Tear down the link.
    fn disconnect(&mut self, conn: ConnHandle) -> Result<(), Self::Error>;

    /// Route value notifications of `conn` to `Sensor::on_notification`.
    fn register_notifications(&mut self, conn: ConnHandle) -> Result<(), Self::Error>;

    /// Discover every primary service, reported through `Sensor::on_service`.
    fn discover_primary_services(&mut self, conn: ConnHandle) -> Result<(), Self::Error>;

    /// Discover the characteristics of `service`, reported through `Sensor::on_characteristic`.
    fn discover_characteristics(&mut self, conn: ConnHandle, service: &ServiceRange) -> Result<(), Self::Error>;

    /// Discover the descriptors of `characteristic`, reported through `Sensor::on_descriptor`.
    fn discover_descriptors(
        &mut self,
        conn: ConnHandle,
        characteristic: &CharacteristicRange,
    ) -> Result<(), Self::Error>;

    /// Read the attribute at `handle`, completed through `Sensor::on_read`.
    fn read(&mut self, conn: ConnHandle, handle: u16, context: Context) -> Result<(), Self::Error>;

    /// Write `value` to the attribute at `handle`, completed through `Sensor::on_write`.
    fn write(&mut self, conn: ConnHandle, handle: u16, value: &[u8], context: Context) -> Result<(), Self::Error>;
}
