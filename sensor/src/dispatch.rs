//! Application-initiated reads and writes.
use bt_hci::param::ConnHandle;

use crate::attribute::{CharacteristicId, DescriptorId};
use crate::pool::ValuePool;
use crate::stack::{Context, GattStack, Target};
use crate::types::gatt::GattStatus;
use crate::discovery::Phase;
use crate::{Error, Sensor, SensorError};

/// Value written to a client characteristic configuration descriptor that was never read.
const CCC_DEFAULT: [u8; 2] = [0x00, 0x00];
const CCC_NOTIFY: u8 = 0x01;

impl<S: GattStack, P: ValuePool> Sensor<S, P> {
    /// Read the value of a characteristic.
    ///
    /// Only accepted once the sensor is ready; `Error::InvalidState` otherwise.
    ///
    /// Completion is reported to the characteristic's [`CharacteristicHandler::on_data`](crate::attribute::CharacteristicHandler::on_data).
    pub fn read_characteristic(&mut self, id: CharacteristicId) -> Result<(), SensorError<S::Error>> {
        let conn = self.ready_connection()?;
        let handle = self
            .data
            .characteristic(id)
            .ok_or(Error::NotFound)?
            .value_handle()
            .ok_or(Error::NotDiscovered)?;
        debug!("[dispatch] read characteristic {:?} at {:#x}", id, handle);
        self.stack
            .read(conn, handle, Context::Application(Target::Characteristic(id)))
            .map_err(SensorError::Stack)
    }

    /// Read the value of a descriptor.
    pub fn read_descriptor(&mut self, id: DescriptorId) -> Result<(), SensorError<S::Error>> {
        let conn = self.ready_connection()?;
        let handle = self.descriptor_handle(id)?;
        debug!("[dispatch] read descriptor {:?} at {:#x}", id, handle);
        self.stack
            .read(conn, handle, Context::Application(Target::Descriptor(id)))
            .map_err(SensorError::Stack)
    }

    /// Write `value` to a characteristic.
    ///
    /// The cached value is left as is; completion is reported to
    /// [`CharacteristicHandler::on_write`](crate::attribute::CharacteristicHandler::on_write).
    pub fn write_characteristic(&mut self, id: CharacteristicId, value: &[u8]) -> Result<(), SensorError<S::Error>> {
        let conn = self.ready_connection()?;
        let handle = self
            .data
            .characteristic(id)
            .ok_or(Error::NotFound)?
            .value_handle()
            .ok_or(Error::NotDiscovered)?;
        debug!("[dispatch] write {} bytes to characteristic {:?} at {:#x}", value.len(), id, handle);
        self.stack
            .write(conn, handle, value, Context::Application(Target::Characteristic(id)))
            .map_err(SensorError::Stack)
    }

    /// Write `value` to a descriptor.
    pub fn write_descriptor(&mut self, id: DescriptorId, value: &[u8]) -> Result<(), SensorError<S::Error>> {
        let conn = self.ready_connection()?;
        let handle = self.descriptor_handle(id)?;
        debug!("[dispatch] write {} bytes to descriptor {:?} at {:#x}", value.len(), id, handle);
        self.stack
            .write(conn, handle, value, Context::Application(Target::Descriptor(id)))
            .map_err(SensorError::Stack)
    }

    /// Turn notifications on through the client characteristic configuration descriptor `ccc`.
    pub fn enable_notification(&mut self, ccc: DescriptorId) -> Result<(), SensorError<S::Error>> {
        self.set_notification(ccc, true)
    }

    /// Turn notifications off through the client characteristic configuration descriptor `ccc`.
    pub fn disable_notification(&mut self, ccc: DescriptorId) -> Result<(), SensorError<S::Error>> {
        self.set_notification(ccc, false)
    }

    fn set_notification(&mut self, id: DescriptorId, enable: bool) -> Result<(), SensorError<S::Error>> {
        let conn = self.ready_connection()?;
        let handle = self.descriptor_handle(id)?;
        let data = self.data.descriptor_mut(id).ok_or(Error::NotFound)?;
        if data.value.is_empty() {
            data.value.store(&self.pool, &CCC_DEFAULT)?;
        }
        let Some(value) = data.value.get_mut() else {
            return Err(Error::OutOfMemory.into());
        };
        if enable {
            value[0] |= CCC_NOTIFY;
        } else {
            value[0] &= !CCC_NOTIFY;
        }
        let value = &*value;
        debug!("[dispatch] notifications {} on {:?}: {:?}", enable, id, value);
        self.stack
            .write(conn, handle, value, Context::Application(Target::Descriptor(id)))
            .map_err(SensorError::Stack)
    }

    /// Connection application requests go out on. Only one request may be in flight, so
    /// nothing is accepted while discovery still owns the stack.
    fn ready_connection(&self) -> Result<ConnHandle, Error> {
        let conn = self.connection.ok_or(Error::NotConnected)?;
        if !matches!(self.phase, Phase::Ready) {
            debug!("[dispatch] request refused in phase {:?}", self.phase);
            return Err(Error::InvalidState);
        }
        Ok(conn)
    }

    fn descriptor_handle(&self, id: DescriptorId) -> Result<u16, Error> {
        self.data
            .descriptor(id)
            .ok_or(Error::NotFound)?
            .handle()
            .ok_or(Error::NotDiscovered)
    }

    /// Completion of a read issued with `context`.
    pub fn on_read(
        &mut self,
        conn: ConnHandle,
        context: Context,
        status: GattStatus,
        value: &[u8],
    ) -> Result<(), SensorError<S::Error>> {
        if !self.is_current(conn) {
            trace!("[dispatch] ignoring read completion for {:?}", conn);
            return Ok(());
        }
        match context {
            Context::Discovery => self.on_discovery_read(conn, status, value),
            Context::Application(Target::Characteristic(id)) => {
                self.complete_characteristic_read(id, status, value);
                Ok(())
            }
            Context::Application(Target::Descriptor(id)) => {
                self.complete_descriptor_read(id, status, value);
                Ok(())
            }
        }
    }

    /// Completion of a write issued with `context`.
    pub fn on_write(&mut self, conn: ConnHandle, context: Context, status: GattStatus) {
        if !self.is_current(conn) {
            trace!("[dispatch] ignoring write completion for {:?}", conn);
            return;
        }
        if !status.is_success() {
            debug!("[dispatch] write {:?} failed: {:?}", context, status);
        }
        match context {
            Context::Application(Target::Characteristic(id)) => {
                if let Some(handler) = self.tree.characteristic(id).and_then(|c| c.callbacks()) {
                    handler.on_write(id, status);
                }
            }
            Context::Application(Target::Descriptor(id)) => {
                if let Some(handler) = self.tree.descriptor(id).and_then(|d| d.callbacks()) {
                    handler.on_write(id, status);
                }
            }
            Context::Discovery => trace!("[dispatch] ignoring discovery write completion"),
        }
    }
}
