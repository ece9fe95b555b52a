//! Discovery state machine.
//!
//! Each phase walks the tree with its own [`Cursor`] and issues one request to the stack
//! at a time. The request's completion arrives through one of the `on_*` entry points,
//! which records the result and issues the next request, or moves on to the next phase
//! once the current one has nothing left to do.
use bt_hci::param::ConnHandle;

use crate::attribute::{CharacteristicId, DescriptorId};
use crate::cursor::{CharacteristicFilter, Cursor};
use crate::pool::ValuePool;
use crate::stack::{Context, GattStack};
use crate::types::gatt::{
    CharacteristicRange, DiscoveredCharacteristic, DiscoveredDescriptor, DiscoveredService, GattStatus, ServiceRange,
};
use crate::{Sensor, SensorError};

/// Lifecycle phase of a [`Sensor`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No link.
    Idle,
    /// A link was requested and is not established yet.
    Connecting,
    /// Waiting for the primary services of the peer.
    ServiceDiscovery,
    /// Discovering the characteristics of the service under the cursor.
    CharacteristicDiscovery(Cursor),
    /// Discovering the descriptors of the characteristic under the cursor.
    DescriptorDiscovery(Cursor),
    /// Reading the initial value of the characteristic under the cursor.
    CharacteristicValueRead(Cursor),
    /// Reading the initial value of the descriptor under the cursor.
    DescriptorValueRead(Cursor),
    /// Discovery completed.
    Ready,
    /// The stack refused a discovery request. Only a disconnect leaves this phase.
    Stalled,
}

impl Phase {
    /// Cursor of the phases that walk the tree.
    pub fn cursor(&self) -> Option<Cursor> {
        match self {
            Self::CharacteristicDiscovery(cursor)
            | Self::DescriptorDiscovery(cursor)
            | Self::CharacteristicValueRead(cursor)
            | Self::DescriptorValueRead(cursor) => Some(*cursor),
            _ => None,
        }
    }

    /// Whether discovery is still running.
    pub fn is_discovering(&self) -> bool {
        matches!(
            self,
            Self::ServiceDiscovery
                | Self::CharacteristicDiscovery(_)
                | Self::DescriptorDiscovery(_)
                | Self::CharacteristicValueRead(_)
                | Self::DescriptorValueRead(_)
        )
    }
}

impl<S: GattStack, P: ValuePool> Sensor<S, P> {
    /// The link requested by [`Sensor::connect`] is up: start discovery.
    pub fn on_connected(&mut self, conn: ConnHandle) -> Result<(), SensorError<S::Error>> {
        if !self.is_current(conn) || !matches!(self.phase, Phase::Connecting) {
            trace!("[discovery] ignoring connection event for {:?}", conn);
            return Ok(());
        }
        info!("[discovery] connected {:?}, discovering services", conn);
        if let Err(e) = self.stack.register_notifications(conn) {
            return Err(self.stall(e));
        }
        self.phase = Phase::ServiceDiscovery;
        if let Err(e) = self.stack.discover_primary_services(conn) {
            return Err(self.stall(e));
        }
        Ok(())
    }

    /// A primary service was discovered, or `None` once all have been reported.
    pub fn on_service(
        &mut self,
        conn: ConnHandle,
        service: Option<&DiscoveredService>,
    ) -> Result<(), SensorError<S::Error>> {
        if !self.is_current(conn) || !matches!(self.phase, Phase::ServiceDiscovery) {
            trace!("[discovery] ignoring service event for {:?}", conn);
            return Ok(());
        }
        match service {
            Some(service) => {
                match self.tree.find_service(&service.uuid) {
                    Some(id) => {
                        debug!("[discovery] service {:?} at {:?}", service.uuid, service.group);
                        if let Some(data) = self.data.service_mut(id) {
                            data.group = Some(service.group);
                        }
                    }
                    None => trace!("[discovery] skipping undeclared service {:?}", service.uuid),
                }
                Ok(())
            }
            None => self.discover_characteristics(conn, Cursor::new()),
        }
    }

    /// A characteristic of the service under discovery was found, or `None` once all
    /// of that service have been reported.
    pub fn on_characteristic(
        &mut self,
        conn: ConnHandle,
        characteristic: Option<&DiscoveredCharacteristic>,
    ) -> Result<(), SensorError<S::Error>> {
        let cursor = match self.phase {
            Phase::CharacteristicDiscovery(cursor) if self.is_current(conn) => cursor,
            _ => {
                trace!("[discovery] ignoring characteristic event for {:?}", conn);
                return Ok(());
            }
        };
        let Some(reported) = characteristic else {
            return self.discover_characteristics(conn, cursor);
        };

        let declared = cursor.current_service().and_then(|service| {
            let index = self
                .tree
                .service(service)?
                .characteristics()
                .iter()
                .position(|c| c.uuid().matches(&reported.uuid))?;
            Some(CharacteristicId {
                service: service.index(),
                index,
            })
        });
        match declared.and_then(|id| self.data.characteristic_mut(id)) {
            Some(data) => {
                debug!(
                    "[discovery] characteristic {:?} value handle {:#x}",
                    reported.uuid, reported.value_handle
                );
                data.group = Some(reported.group);
                data.value_handle = Some(reported.value_handle);
                data.properties = reported.properties;
            }
            None => trace!("[discovery] skipping undeclared characteristic {:?}", reported.uuid),
        }
        Ok(())
    }

    /// A descriptor of the characteristic under discovery was found, or `None` once all
    /// of that characteristic have been reported.
    pub fn on_descriptor(
        &mut self,
        conn: ConnHandle,
        descriptor: Option<&DiscoveredDescriptor>,
    ) -> Result<(), SensorError<S::Error>> {
        let cursor = match self.phase {
            Phase::DescriptorDiscovery(cursor) if self.is_current(conn) => cursor,
            _ => {
                trace!("[discovery] ignoring descriptor event for {:?}", conn);
                return Ok(());
            }
        };
        let Some(reported) = descriptor else {
            return self.discover_descriptors(conn, cursor);
        };

        let declared = cursor
            .current_characteristic()
            .and_then(|characteristic| self.tree.find_descriptor(characteristic, &reported.uuid));
        match declared.and_then(|id| self.data.descriptor_mut(id)) {
            Some(data) => {
                debug!("[discovery] descriptor {:?} at {:#x}", reported.uuid, reported.handle);
                data.handle = Some(reported.handle);
            }
            None => trace!("[discovery] skipping undeclared descriptor {:?}", reported.uuid),
        }
        Ok(())
    }

    /// Completion of a value read issued during discovery.
    pub(crate) fn on_discovery_read(
        &mut self,
        conn: ConnHandle,
        status: GattStatus,
        value: &[u8],
    ) -> Result<(), SensorError<S::Error>> {
        match self.phase {
            Phase::CharacteristicValueRead(cursor) => {
                if let Some(id) = cursor.current_characteristic() {
                    self.complete_characteristic_read(id, status, value);
                }
                self.read_characteristics(conn, cursor)
            }
            Phase::DescriptorValueRead(cursor) => {
                if let Some(id) = cursor.current_descriptor() {
                    self.complete_descriptor_read(id, status, value);
                }
                self.read_descriptors(conn, cursor)
            }
            _ => {
                trace!("[discovery] ignoring read completion in phase {:?}", self.phase);
                Ok(())
            }
        }
    }

    /// Request the characteristics of the next discovered service.
    fn discover_characteristics(&mut self, conn: ConnHandle, mut cursor: Cursor) -> Result<(), SensorError<S::Error>> {
        while let Some(id) = cursor.next_service(&self.tree) {
            let (Some(service), Some(group)) = (
                self.tree.service(id),
                self.data.service(id).and_then(|data| data.group()),
            ) else {
                warn!("[discovery] service {:?} not found on peer, skipping", id);
                continue;
            };
            let range = ServiceRange {
                uuid: *service.uuid(),
                group,
            };
            self.phase = Phase::CharacteristicDiscovery(cursor);
            debug!("[discovery] discovering characteristics of {:?}", range.uuid);
            if let Err(e) = self.stack.discover_characteristics(conn, &range) {
                return Err(self.stall(e));
            }
            return Ok(());
        }
        self.discover_descriptors(conn, Cursor::new())
    }

    /// Request the descriptors of the next characteristic declaring any.
    fn discover_descriptors(&mut self, conn: ConnHandle, mut cursor: Cursor) -> Result<(), SensorError<S::Error>> {
        while let Some(id) = cursor.next_characteristic(&self.tree, &self.data, CharacteristicFilter::HasDescriptors) {
            let range = self.tree.characteristic(id).zip(self.data.characteristic(id)).and_then(|(c, data)| {
                Some(CharacteristicRange {
                    uuid: *c.uuid(),
                    group: data.group()?,
                    value_handle: data.value_handle()?,
                    properties: data.properties(),
                })
            });
            let Some(range) = range else {
                warn!("[discovery] characteristic {:?} not found on peer, skipping", id);
                continue;
            };
            self.phase = Phase::DescriptorDiscovery(cursor);
            debug!("[discovery] discovering descriptors of {:?}", range.uuid);
            if let Err(e) = self.stack.discover_descriptors(conn, &range) {
                return Err(self.stall(e));
            }
            return Ok(());
        }
        self.read_characteristics(conn, Cursor::new())
    }

    /// Read the next readable characteristic.
    fn read_characteristics(&mut self, conn: ConnHandle, mut cursor: Cursor) -> Result<(), SensorError<S::Error>> {
        while let Some(id) = cursor.next_characteristic(&self.tree, &self.data, CharacteristicFilter::Readable) {
            let Some(handle) = self.data.characteristic(id).and_then(|data| data.value_handle()) else {
                warn!("[discovery] characteristic {:?} has no value handle, skipping", id);
                continue;
            };
            self.phase = Phase::CharacteristicValueRead(cursor);
            trace!("[discovery] reading characteristic {:?} at {:#x}", id, handle);
            match self.stack.read(conn, handle, Context::Discovery) {
                Ok(()) => return Ok(()),
                Err(_) => {
                    warn!("[discovery] read of characteristic {:?} not issued", id);
                    self.complete_characteristic_read(id, GattStatus::UNLIKELY_ERROR, &[]);
                }
            }
        }
        self.read_descriptors(conn, Cursor::new())
    }

    /// Read the next discovered descriptor.
    fn read_descriptors(&mut self, conn: ConnHandle, mut cursor: Cursor) -> Result<(), SensorError<S::Error>> {
        while let Some(id) = cursor.next_descriptor(&self.tree) {
            let Some(handle) = self.data.descriptor(id).and_then(|data| data.handle()) else {
                warn!("[discovery] descriptor {:?} not found on peer, skipping", id);
                continue;
            };
            self.phase = Phase::DescriptorValueRead(cursor);
            trace!("[discovery] reading descriptor {:?} at {:#x}", id, handle);
            match self.stack.read(conn, handle, Context::Discovery) {
                Ok(()) => return Ok(()),
                Err(_) => {
                    warn!("[discovery] read of descriptor {:?} not issued", id);
                    self.complete_descriptor_read(id, GattStatus::UNLIKELY_ERROR, &[]);
                }
            }
        }
        self.finish();
        Ok(())
    }

    fn finish(&mut self) {
        info!("[discovery] complete, sensor ready");
        self.phase = Phase::Ready;
        if let Some(handler) = self.handler.as_ref() {
            handler.on_ready();
        }
    }

    fn stall(&mut self, e: S::Error) -> SensorError<S::Error> {
        error!("[discovery] request refused by stack in phase {:?}, stalled", self.phase);
        self.phase = Phase::Stalled;
        SensorError::Stack(e)
    }

    /// Store a read result and hand it to the characteristic's handler.
    pub(crate) fn complete_characteristic_read(&mut self, id: CharacteristicId, status: GattStatus, value: &[u8]) {
        let Some(data) = self.data.characteristic_mut(id) else {
            return;
        };
        if status.is_success() {
            if let Err(e) = data.value.store(&self.pool, value) {
                warn!("[discovery] keeping previous value of {:?}: {:?}", id, e);
            }
        } else {
            debug!("[discovery] read of {:?} failed: {:?}", id, status);
        }
        if let Some(handler) = self.tree.characteristic(id).and_then(|c| c.callbacks()) {
            handler.on_data(id, data, status);
        }
    }

    /// Store a read result and hand it to the descriptor's handler.
    pub(crate) fn complete_descriptor_read(&mut self, id: DescriptorId, status: GattStatus, value: &[u8]) {
        let Some(data) = self.data.descriptor_mut(id) else {
            return;
        };
        if status.is_success() {
            if let Err(e) = data.value.store(&self.pool, value) {
                warn!("[discovery] keeping previous value of {:?}: {:?}", id, e);
            }
        } else {
            debug!("[discovery] read of {:?} failed: {:?}", id, status);
        }
        if let Some(handler) = self.tree.descriptor(id).and_then(|d| d.callbacks()) {
            handler.on_data(id, data, status);
        }
    }
}
