//! Broadcom WICED Sense2 kit.
//!
//! All sensors report through a single notifying characteristic. The first byte of each
//! notification is a set of flags telling which readings follow.
use alloc::rc::Rc;

use crate::attribute::consts::CHARACTERISTIC_CCCD_UUID16;
use crate::attribute::{AttributeTree, Characteristic, CharacteristicHandler, Descriptor, Service, Uuid};

pub const SERVICE: Uuid = Uuid::from_u128(0x739298B6_87B6_4984_A5DC_BDC18B068985);
pub const DATA: Uuid = Uuid::from_u128(0x33EF9113_3B55_413E_B553_FEA1EAADA459);

pub const ACCELEROMETER: u8 = 1 << 0;
pub const GYRO: u8 = 1 << 1;
pub const HUMIDITY: u8 = 1 << 2;
pub const MAGNETOMETER: u8 = 1 << 3;
pub const PRESSURE: u8 = 1 << 4;
pub const TEMPERATURE: u8 = 1 << 5;

/// Layout of a data notification.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// Accelerometer, gyro and magnetometer, three signed 16-bit axes each.
    Motion,
    /// Humidity, pressure and temperature, one unsigned 16-bit reading each.
    Environment,
}

impl Payload {
    pub const MOTION_FLAGS: u8 = ACCELEROMETER | GYRO | MAGNETOMETER;
    pub const ENVIRONMENT_FLAGS: u8 = HUMIDITY | PRESSURE | TEMPERATURE;

    /// Classify a notification by its leading flags byte.
    pub fn of(value: &[u8]) -> Option<Self> {
        match *value.first()? {
            Self::MOTION_FLAGS => Some(Self::Motion),
            Self::ENVIRONMENT_FLAGS => Some(Self::Environment),
            _ => None,
        }
    }

    /// Length of the readings following the flags byte.
    pub fn readings_len(&self) -> usize {
        match self {
            Self::Motion => 18,
            Self::Environment => 6,
        }
    }
}

/// Tree of the WICED Sense2 service, with `handler` attached to the data characteristic.
pub fn tree(handler: Rc<dyn CharacteristicHandler>) -> AttributeTree {
    AttributeTree::builder()
        .service(
            Service::new(SERVICE).characteristic(
                Characteristic::new(DATA)
                    .handler(handler)
                    .descriptor(Descriptor::new(CHARACTERISTIC_CCCD_UUID16)),
            ),
        )
        .build()
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::string::ToString;

    use super::*;

    struct Ignore;
    impl CharacteristicHandler for Ignore {}

    #[test]
    fn uuids_match_wire_order() {
        assert_eq!(SERVICE.to_string(), "739298b6-87b6-4984-a5dc-bdc18b068985");
        assert_eq!(
            SERVICE.as_raw(),
            &[0x85, 0x89, 0x06, 0x8b, 0xc1, 0xbd, 0xdc, 0xa5, 0x84, 0x49, 0xb6, 0x87, 0xb6, 0x98, 0x92, 0x73]
        );
        assert_eq!(DATA.to_string(), "33ef9113-3b55-413e-b553-fea1eaada459");
    }

    #[test]
    fn payload_kind() {
        assert_eq!(Payload::of(&[0x0b, 0, 0]), Some(Payload::Motion));
        assert_eq!(Payload::of(&[0x34]), Some(Payload::Environment));
        assert_eq!(Payload::of(&[0x01]), None);
        assert_eq!(Payload::of(&[]), None);
        assert_eq!(Payload::Environment.readings_len(), 6);
    }

    #[test]
    fn tree_shape() {
        let tree = tree(Rc::new(Ignore));
        let data = tree.find_characteristic(&DATA).unwrap();
        assert!(tree.find_descriptor(data, &CHARACTERISTIC_CCCD_UUID16).is_some());
    }
}
