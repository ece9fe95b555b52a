//! Declarative attribute tree of a sensor.
//!
//! A sensor is described once, before any connection exists, as an ordered list of
//! services, each holding characteristics, each holding descriptors. The tree is
//! immutable afterwards; what the peer reports at runtime is kept apart in [`TreeData`].
//!
//! ```
//! use std::rc::Rc;
//! use ble_sensor::attribute::{consts, AttributeTree, Characteristic, Descriptor, Service};
//! use ble_sensor::prelude::*;
//!
//! struct Battery;
//! impl CharacteristicHandler for Battery {}
//!
//! let tree = AttributeTree::builder()
//!     .service(
//!         Service::new(consts::BATTERY_SERVICE_UUID16).characteristic(
//!             Characteristic::new(consts::CHARACTERISTIC_BATTERY_LEVEL_UUID16)
//!                 .handler(Rc::new(Battery))
//!                 .descriptor(Descriptor::new(consts::CHARACTERISTIC_CCCD_UUID16)),
//!         ),
//!     )
//!     .build();
//! assert_eq!(tree.services().len(), 1);
//! ```
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

pub mod consts;
mod data;

pub use data::*;

use crate::types::gatt::GattStatus;
pub use crate::types::uuid::Uuid;

/// Decision taken by a characteristic on an incoming notification.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    /// Drop the notification.
    Discard,
    /// Copy the payload and hand it to [`CharacteristicHandler::on_data`] outside
    /// the stack context.
    Process,
}

/// Application callbacks of a characteristic.
///
/// Every method has an empty default, so implementors only override what they use.
pub trait CharacteristicHandler {
    /// A new value is available, from a read or a processed notification.
    ///
    /// Called with a failing `status` when a read did not succeed; `data` then still
    /// holds the previous value, if any.
    fn on_data(&self, _id: CharacteristicId, _data: &CharacteristicData, _status: GattStatus) {}

    /// A write issued through the sensor completed.
    fn on_write(&self, _id: CharacteristicId, _status: GattStatus) {}

    /// A notification arrived for this characteristic.
    ///
    /// Runs inside the stack's callback context: keep it short and non-blocking.
    fn on_notification(&self, _id: CharacteristicId, _value: &[u8]) -> NotificationAction {
        NotificationAction::Discard
    }
}

/// Application callbacks of a descriptor.
pub trait DescriptorHandler {
    /// A new value is available, or a read failed with `status`.
    fn on_data(&self, _id: DescriptorId, _data: &DescriptorData, _status: GattStatus) {}

    /// A write issued through the sensor completed.
    fn on_write(&self, _id: DescriptorId, _status: GattStatus) {}
}

/// Position of a service in its tree.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceId(pub(crate) usize);

impl ServiceId {
    /// Index of the service in declaration order.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Position of a characteristic in its tree.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacteristicId {
    pub(crate) service: usize,
    pub(crate) index: usize,
}

impl CharacteristicId {
    /// Owning service.
    pub fn service(&self) -> ServiceId {
        ServiceId(self.service)
    }

    /// Index of the characteristic within its service.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Position of a descriptor in its tree.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId {
    pub(crate) service: usize,
    pub(crate) characteristic: usize,
    pub(crate) index: usize,
}

impl DescriptorId {
    /// Owning characteristic.
    pub fn characteristic(&self) -> CharacteristicId {
        CharacteristicId {
            service: self.service,
            index: self.characteristic,
        }
    }

    /// Index of the descriptor within its characteristic.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// A descriptor definition.
#[derive(Clone)]
pub struct Descriptor {
    uuid: Uuid,
    handler: Option<Rc<dyn DescriptorHandler>>,
}

impl Descriptor {
    /// Declare a descriptor of the given type.
    pub fn new(uuid: impl Into<Uuid>) -> Self {
        Self {
            uuid: uuid.into(),
            handler: None,
        }
    }

    /// Attach the application callbacks.
    pub fn handler(mut self, handler: Rc<dyn DescriptorHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Descriptor type.
    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub(crate) fn callbacks(&self) -> Option<&dyn DescriptorHandler> {
        self.handler.as_deref()
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("uuid", &self.uuid)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// A characteristic definition.
#[derive(Clone)]
pub struct Characteristic {
    uuid: Uuid,
    handler: Option<Rc<dyn CharacteristicHandler>>,
    descriptors: Vec<Descriptor>,
}

impl Characteristic {
    /// Declare a characteristic of the given type.
    pub fn new(uuid: impl Into<Uuid>) -> Self {
        Self {
            uuid: uuid.into(),
            handler: None,
            descriptors: Vec::new(),
        }
    }

    /// Attach the application callbacks.
    pub fn handler(mut self, handler: Rc<dyn CharacteristicHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Append a descriptor.
    pub fn descriptor(mut self, descriptor: Descriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Characteristic type.
    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    /// Declared descriptors, in order.
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Whether at least one descriptor is declared.
    pub fn has_descriptors(&self) -> bool {
        !self.descriptors.is_empty()
    }

    pub(crate) fn callbacks(&self) -> Option<&dyn CharacteristicHandler> {
        self.handler.as_deref()
    }
}

impl fmt::Debug for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Characteristic")
            .field("uuid", &self.uuid)
            .field("handler", &self.handler.is_some())
            .field("descriptors", &self.descriptors)
            .finish()
    }
}

/// A service definition.
#[derive(Debug, Clone)]
pub struct Service {
    uuid: Uuid,
    characteristics: Vec<Characteristic>,
}

impl Service {
    /// Declare a primary service of the given type.
    pub fn new(uuid: impl Into<Uuid>) -> Self {
        Self {
            uuid: uuid.into(),
            characteristics: Vec::new(),
        }
    }

    /// Append a characteristic.
    pub fn characteristic(mut self, characteristic: Characteristic) -> Self {
        self.characteristics.push(characteristic);
        self
    }

    /// Service type.
    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    /// Declared characteristics, in order.
    pub fn characteristics(&self) -> &[Characteristic] {
        &self.characteristics
    }
}

/// Builder for an [`AttributeTree`].
#[derive(Debug, Default)]
pub struct TreeBuilder {
    services: Vec<Service>,
}

impl TreeBuilder {
    /// Append a service.
    pub fn service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    /// Freeze the tree.
    pub fn build(self) -> AttributeTree {
        AttributeTree {
            services: self.services,
        }
    }
}

/// Immutable tree of services, characteristics and descriptors.
#[derive(Debug, Clone, Default)]
pub struct AttributeTree {
    services: Vec<Service>,
}

impl AttributeTree {
    /// Start declaring a tree.
    pub fn builder() -> TreeBuilder {
        TreeBuilder::default()
    }

    /// Declared services, in order.
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Look up a service.
    pub fn service(&self, id: ServiceId) -> Option<&Service> {
        self.services.get(id.0)
    }

    /// Look up a characteristic.
    pub fn characteristic(&self, id: CharacteristicId) -> Option<&Characteristic> {
        self.services
            .get(id.service)
            .and_then(|s| s.characteristics.get(id.index))
    }

    /// Look up a descriptor.
    pub fn descriptor(&self, id: DescriptorId) -> Option<&Descriptor> {
        self.characteristic(id.characteristic())
            .and_then(|c| c.descriptors.get(id.index))
    }

    /// First service of the given type.
    pub fn find_service(&self, uuid: &Uuid) -> Option<ServiceId> {
        self.services.iter().position(|s| s.uuid.matches(uuid)).map(ServiceId)
    }

    /// First characteristic of the given type, across all services.
    pub fn find_characteristic(&self, uuid: &Uuid) -> Option<CharacteristicId> {
        self.characteristic_ids()
            .find(|id| self.characteristic(*id).is_some_and(|c| c.uuid.matches(uuid)))
    }

    /// Descriptor of the given type within one characteristic.
    pub fn find_descriptor(&self, characteristic: CharacteristicId, uuid: &Uuid) -> Option<DescriptorId> {
        let position = self
            .characteristic(characteristic)?
            .descriptors
            .iter()
            .position(|d| d.uuid.matches(uuid))?;
        Some(DescriptorId {
            service: characteristic.service,
            characteristic: characteristic.index,
            index: position,
        })
    }

    /// Ids of every characteristic, in declaration order.
    pub fn characteristic_ids(&self) -> impl Iterator<Item = CharacteristicId> + '_ {
        self.services.iter().enumerate().flat_map(|(service, s)| {
            (0..s.characteristics.len()).map(move |index| CharacteristicId { service, index })
        })
    }

    /// Ids of every descriptor, in declaration order.
    pub fn descriptor_ids(&self) -> impl Iterator<Item = DescriptorId> + '_ {
        self.characteristic_ids().flat_map(move |c| {
            let count = self.characteristic(c).map_or(0, |c| c.descriptors.len());
            (0..count).map(move |index| DescriptorId {
                service: c.service,
                characteristic: c.index,
                index,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> AttributeTree {
        AttributeTree::builder()
            .service(
                Service::new(0x1800u16)
                    .characteristic(Characteristic::new(0x2a00u16))
                    .characteristic(Characteristic::new(0x2a01u16)),
            )
            .service(Service::new(0x180fu16).characteristic(
                Characteristic::new(0x2a19u16).descriptor(Descriptor::new(consts::CHARACTERISTIC_CCCD_UUID16)),
            ))
            .build()
    }

    #[test]
    fn lookup_by_uuid() {
        let tree = tree();
        assert_eq!(tree.find_service(&Uuid::new_short(0x180f)), Some(ServiceId(1)));
        let battery = tree.find_characteristic(&Uuid::new_short(0x2a19)).unwrap();
        assert_eq!(battery, CharacteristicId { service: 1, index: 0 });
        let ccc = tree.find_descriptor(battery, &consts::CHARACTERISTIC_CCCD_UUID16).unwrap();
        assert_eq!(ccc.characteristic(), battery);
        assert_eq!(tree.descriptor(ccc).map(|d| *d.uuid()), Some(consts::CHARACTERISTIC_CCCD_UUID16));
        assert!(tree.find_characteristic(&Uuid::new_short(0x2a02)).is_none());
    }

    #[test]
    fn ids_in_declaration_order() {
        let tree = tree();
        let ids: Vec<_> = tree.characteristic_ids().collect();
        assert_eq!(
            ids,
            [
                CharacteristicId { service: 0, index: 0 },
                CharacteristicId { service: 0, index: 1 },
                CharacteristicId { service: 1, index: 0 },
            ]
        );
        assert_eq!(tree.descriptor_ids().count(), 1);
    }

    #[test]
    fn out_of_range_lookups() {
        let tree = tree();
        assert!(tree.service(ServiceId(2)).is_none());
        assert!(tree.characteristic(CharacteristicId { service: 0, index: 2 }).is_none());
        assert!(tree
            .descriptor(DescriptorId {
                service: 0,
                characteristic: 0,
                index: 0
            })
            .is_none());
    }
}
