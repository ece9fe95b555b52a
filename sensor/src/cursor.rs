//! Cursor over the nested sequences of an attribute tree.
//!
//! Discovery results arrive one attribute at a time, each from its own stack callback,
//! so the walk cannot be a plain loop. A [`Cursor`] remembers where the previous step
//! stopped and moves exactly one item forward per call.

use crate::attribute::{AttributeTree, CharacteristicId, DescriptorId, ServiceId, TreeData};

/// Which characteristics [`Cursor::next_characteristic`] stops at.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacteristicFilter {
    /// Every characteristic.
    Any,
    /// Characteristics declaring at least one descriptor.
    HasDescriptors,
    /// Characteristics whose discovered properties have the read bit set.
    Readable,
}

impl CharacteristicFilter {
    fn accepts(&self, tree: &AttributeTree, data: &TreeData, id: CharacteristicId) -> bool {
        match self {
            Self::Any => true,
            Self::HasDescriptors => tree.characteristic(id).is_some_and(|c| c.has_descriptors()),
            Self::Readable => data.characteristic(id).is_some_and(|c| c.properties().is_readable()),
        }
    }
}

/// Position within a tree: one optional index per level.
///
/// `None` means the level has not been entered yet.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    service: Option<usize>,
    characteristic: Option<usize>,
    descriptor: Option<usize>,
}

impl Cursor {
    /// A cursor positioned before the first service.
    pub const fn new() -> Self {
        Self {
            service: None,
            characteristic: None,
            descriptor: None,
        }
    }

    /// Move back before the first service.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Whether every level is unset.
    pub fn is_reset(&self) -> bool {
        self.service.is_none() && self.characteristic.is_none() && self.descriptor.is_none()
    }

    /// Raw indices (service, characteristic, descriptor).
    pub fn indices(&self) -> (Option<usize>, Option<usize>, Option<usize>) {
        (self.service, self.characteristic, self.descriptor)
    }

    /// Service under the cursor.
    pub fn current_service(&self) -> Option<ServiceId> {
        self.service.map(ServiceId)
    }

    /// Characteristic under the cursor.
    pub fn current_characteristic(&self) -> Option<CharacteristicId> {
        Some(CharacteristicId {
            service: self.service?,
            index: self.characteristic?,
        })
    }

    /// Descriptor under the cursor.
    pub fn current_descriptor(&self) -> Option<DescriptorId> {
        Some(DescriptorId {
            service: self.service?,
            characteristic: self.characteristic?,
            index: self.descriptor?,
        })
    }

    /// Step to the next service.
    ///
    /// Once past the last service the cursor stays there and keeps returning `None`.
    pub fn next_service(&mut self, tree: &AttributeTree) -> Option<ServiceId> {
        let count = tree.services().len();
        let next = self.service.map_or(0, |s| s + 1).min(count);
        self.service = Some(next);
        (next < count).then_some(ServiceId(next))
    }

    /// Step to the next characteristic accepted by `filter`, crossing into following
    /// services as needed.
    pub fn next_characteristic(
        &mut self,
        tree: &AttributeTree,
        data: &TreeData,
        filter: CharacteristicFilter,
    ) -> Option<CharacteristicId> {
        let mut service = self.service.unwrap_or(0);
        let mut index = self.characteristic.map_or(0, |c| c + 1);

        while let Some(s) = tree.services().get(service) {
            while index < s.characteristics().len() {
                let id = CharacteristicId { service, index };
                if filter.accepts(tree, data, id) {
                    self.service = Some(service);
                    self.characteristic = Some(index);
                    return Some(id);
                }
                index += 1;
            }
            index = 0;
            service += 1;
        }

        self.service = Some(service);
        self.characteristic = None;
        None
    }

    /// Step to the next descriptor, crossing into following characteristics and
    /// services as needed.
    pub fn next_descriptor(&mut self, tree: &AttributeTree) -> Option<DescriptorId> {
        let mut service = self.service.unwrap_or(0);
        let mut characteristic = self.characteristic.unwrap_or(0);
        let mut index = self.descriptor.map_or(0, |d| d + 1);

        while let Some(s) = tree.services().get(service) {
            while let Some(c) = s.characteristics().get(characteristic) {
                if index < c.descriptors().len() {
                    self.service = Some(service);
                    self.characteristic = Some(characteristic);
                    self.descriptor = Some(index);
                    return Some(DescriptorId {
                        service,
                        characteristic,
                        index,
                    });
                }
                index = 0;
                characteristic += 1;
            }
            characteristic = 0;
            service += 1;
        }

        self.service = Some(service);
        self.characteristic = None;
        self.descriptor = None;
        None
    }
}
