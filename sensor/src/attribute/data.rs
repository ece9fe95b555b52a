//! Runtime data attached to each node of an [`AttributeTree`](super::AttributeTree).
//!
//! The tree itself never changes after construction. Everything learned from the peer
//! (handles, properties, last known values) lives here, written only by the discovery
//! engine, the dispatcher and the notification pipeline.
use alloc::boxed::Box;
use alloc::vec::Vec;

use super::{AttributeTree, CharacteristicId, DescriptorId, ServiceId};
use crate::pool::ValuePool;
use crate::types::gatt::{CharacteristicProps, GroupHandle};
use crate::Error;

/// Last known value of a characteristic or descriptor.
///
/// Owns at most one buffer. The buffer is allocated on the first stored value, replaced
/// only when a longer value arrives, and otherwise overwritten in place.
#[derive(Debug, Default)]
pub struct CachedValue {
    buf: Option<Box<[u8]>>,
    len: usize,
}

impl CachedValue {
    /// The cached bytes, if a value has been stored.
    pub fn get(&self) -> Option<&[u8]> {
        self.buf.as_deref().map(|buf| &buf[..self.len])
    }

    /// Length of the cached value.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no value has been cached.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the buffer currently held.
    pub fn capacity(&self) -> usize {
        self.buf.as_ref().map_or(0, |buf| buf.len())
    }

    /// Store a new value.
    ///
    /// Empty values leave the cache untouched. If a bigger buffer is needed and the pool
    /// cannot provide one, the previous value is kept and `OutOfMemory` is returned.
    pub(crate) fn store<P: ValuePool>(&mut self, pool: &P, value: &[u8]) -> Result<(), Error> {
        if value.is_empty() {
            return Ok(());
        }
        if self.capacity() < value.len() {
            let buf = pool.alloc(value.len()).ok_or(Error::OutOfMemory)?;
            self.buf = Some(buf);
        }
        if let Some(buf) = self.buf.as_mut() {
            buf[..value.len()].copy_from_slice(value);
            self.len = value.len();
        }
        Ok(())
    }

    pub(crate) fn get_mut(&mut self) -> Option<&mut [u8]> {
        let len = self.len;
        self.buf.as_deref_mut().map(|buf| &mut buf[..len])
    }

    pub(crate) fn clear(&mut self) {
        self.buf = None;
        self.len = 0;
    }
}

/// Runtime data of a service.
#[derive(Debug, Default)]
pub struct ServiceData {
    pub(crate) group: Option<GroupHandle>,
}

impl ServiceData {
    /// Handle range reported by the peer, once discovered.
    pub fn group(&self) -> Option<GroupHandle> {
        self.group
    }
}

/// Runtime data of a characteristic.
#[derive(Debug, Default)]
pub struct CharacteristicData {
    pub(crate) group: Option<GroupHandle>,
    pub(crate) value_handle: Option<u16>,
    pub(crate) properties: CharacteristicProps,
    pub(crate) value: CachedValue,
}

impl CharacteristicData {
    /// Handle range of the characteristic, once discovered.
    pub fn group(&self) -> Option<GroupHandle> {
        self.group
    }

    /// Handle of the characteristic value, once discovered.
    pub fn value_handle(&self) -> Option<u16> {
        self.value_handle
    }

    /// Properties reported by the peer; empty until discovered.
    pub fn properties(&self) -> CharacteristicProps {
        self.properties
    }

    /// Last known value.
    pub fn value(&self) -> &CachedValue {
        &self.value
    }
}

/// Runtime data of a descriptor.
#[derive(Debug, Default)]
pub struct DescriptorData {
    pub(crate) handle: Option<u16>,
    pub(crate) value: CachedValue,
}

impl DescriptorData {
    /// Descriptor handle, once discovered.
    pub fn handle(&self) -> Option<u16> {
        self.handle
    }

    /// Last known value.
    pub fn value(&self) -> &CachedValue {
        &self.value
    }
}

#[derive(Debug, Default)]
struct ServiceSlot {
    data: ServiceData,
    characteristics: Vec<CharacteristicSlot>,
}

#[derive(Debug, Default)]
struct CharacteristicSlot {
    data: CharacteristicData,
    descriptors: Vec<DescriptorData>,
}

/// Runtime records for a whole tree, mirroring its shape.
#[derive(Debug, Default)]
pub struct TreeData {
    services: Vec<ServiceSlot>,
}

impl TreeData {
    /// Create empty records for every node of `tree`.
    pub fn new(tree: &AttributeTree) -> Self {
        let services = tree
            .services()
            .iter()
            .map(|service| ServiceSlot {
                data: ServiceData::default(),
                characteristics: service
                    .characteristics()
                    .iter()
                    .map(|characteristic| CharacteristicSlot {
                        data: CharacteristicData::default(),
                        descriptors: characteristic
                            .descriptors()
                            .iter()
                            .map(|_| DescriptorData::default())
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        Self { services }
    }

    /// Runtime data of a service.
    pub fn service(&self, id: ServiceId) -> Option<&ServiceData> {
        self.services.get(id.0).map(|s| &s.data)
    }

    /// Runtime data of a characteristic.
    pub fn characteristic(&self, id: CharacteristicId) -> Option<&CharacteristicData> {
        self.services
            .get(id.service)
            .and_then(|s| s.characteristics.get(id.index))
            .map(|c| &c.data)
    }

    /// Runtime data of a descriptor.
    pub fn descriptor(&self, id: DescriptorId) -> Option<&DescriptorData> {
        self.services
            .get(id.service)
            .and_then(|s| s.characteristics.get(id.characteristic))
            .and_then(|c| c.descriptors.get(id.index))
    }

    pub(crate) fn service_mut(&mut self, id: ServiceId) -> Option<&mut ServiceData> {
        self.services.get_mut(id.0).map(|s| &mut s.data)
    }

    pub(crate) fn characteristic_mut(&mut self, id: CharacteristicId) -> Option<&mut CharacteristicData> {
        self.services
            .get_mut(id.service)
            .and_then(|s| s.characteristics.get_mut(id.index))
            .map(|c| &mut c.data)
    }

    pub(crate) fn descriptor_mut(&mut self, id: DescriptorId) -> Option<&mut DescriptorData> {
        self.services
            .get_mut(id.service)
            .and_then(|s| s.characteristics.get_mut(id.characteristic))
            .and_then(|c| c.descriptors.get_mut(id.index))
    }

    /// Drop every handle learned from the peer. Cached values are kept.
    pub(crate) fn forget_handles(&mut self) {
        for service in self.services.iter_mut() {
            service.data.group = None;
            for characteristic in service.characteristics.iter_mut() {
                characteristic.data.group = None;
                characteristic.data.value_handle = None;
                characteristic.data.properties = CharacteristicProps::default();
                for descriptor in characteristic.descriptors.iter_mut() {
                    descriptor.handle = None;
                }
            }
        }
    }

    /// Release every cached value buffer.
    pub(crate) fn clear_values(&mut self) {
        for service in self.services.iter_mut() {
            for characteristic in service.characteristics.iter_mut() {
                characteristic.data.value.clear();
                for descriptor in characteristic.descriptors.iter_mut() {
                    descriptor.value.clear();
                }
            }
        }
    }
}
