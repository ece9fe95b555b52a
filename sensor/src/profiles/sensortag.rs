//! Texas Instruments CC2650 SensorTag.
//!
//! Each sensor lives in its own vendor service holding a data characteristic, which
//! notifies, and a configuration characteristic switching the sensor on and off.
use alloc::rc::Rc;
use core::ops::BitOr;

use crate::attribute::consts::CHARACTERISTIC_CCCD_UUID16;
use crate::attribute::{AttributeTree, Characteristic, CharacteristicHandler, Descriptor, Service, Uuid};

const fn vendor_uuid(id: u16) -> Uuid {
    Uuid::from_u128(0xF000_0000_0451_4000_B000_0000_0000_0000 | ((id as u128) << 96))
}

pub const TEMPERATURE_SERVICE: Uuid = vendor_uuid(0xAA00);
pub const TEMPERATURE_DATA: Uuid = vendor_uuid(0xAA01);
pub const TEMPERATURE_CONFIG: Uuid = vendor_uuid(0xAA02);
pub const TEMPERATURE_PERIOD: Uuid = vendor_uuid(0xAA03);

pub const HUMIDITY_SERVICE: Uuid = vendor_uuid(0xAA20);
pub const HUMIDITY_DATA: Uuid = vendor_uuid(0xAA21);
pub const HUMIDITY_CONFIG: Uuid = vendor_uuid(0xAA22);

pub const OPTICAL_SERVICE: Uuid = vendor_uuid(0xAA70);
pub const OPTICAL_DATA: Uuid = vendor_uuid(0xAA71);
pub const OPTICAL_CONFIG: Uuid = vendor_uuid(0xAA72);

pub const MOTION_SERVICE: Uuid = vendor_uuid(0xAA80);
pub const MOTION_DATA: Uuid = vendor_uuid(0xAA81);
pub const MOTION_CONFIG: Uuid = vendor_uuid(0xAA82);

pub const IO_SERVICE: Uuid = vendor_uuid(0xAA64);
pub const IO_DATA: Uuid = vendor_uuid(0xAA65);
pub const IO_CONFIG: Uuid = vendor_uuid(0xAA66);

pub const SIMPLE_KEYS_SERVICE: Uuid = Uuid::new_short(0xFFE0);
pub const SIMPLE_KEYS_DATA: Uuid = Uuid::new_short(0xFFE1);

/// Configuration value switching a sensor off.
pub const SENSOR_DISABLE: u8 = 0x00;
/// Configuration value switching a sensor on.
pub const SENSOR_ENABLE: u8 = 0x01;

/// Shortest measurement period, in units of 10 ms.
pub const PERIOD_MIN: u8 = 0x1E;
/// Longest measurement period, in units of 10 ms.
pub const PERIOD_MAX: u8 = 0xFF;
/// Measurement period after power-up, in units of 10 ms.
pub const PERIOD_DEFAULT: u8 = 0x64;

/// Period characteristic value for a measurement every `millis` milliseconds.
pub fn period(millis: u32) -> u8 {
    (millis / 10).clamp(PERIOD_MIN as u32, PERIOD_MAX as u32) as u8
}

/// Accelerometer full-scale range.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccelerometerRange {
    #[default]
    G2,
    G4,
    G8,
    G16,
}

/// Value of the motion sensor configuration characteristic.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionConfig(pub u16);

impl MotionConfig {
    pub const GYRO_X: Self = Self(1 << 0);
    pub const GYRO_Y: Self = Self(1 << 1);
    pub const GYRO_Z: Self = Self(1 << 2);
    pub const ACCELEROMETER_X: Self = Self(1 << 3);
    pub const ACCELEROMETER_Y: Self = Self(1 << 4);
    pub const ACCELEROMETER_Z: Self = Self(1 << 5);
    /// All three axes.
    pub const MAGNETOMETER: Self = Self(1 << 6);
    pub const WAKE_ON_MOTION: Self = Self(1 << 7);

    pub const GYRO: Self = Self(Self::GYRO_X.0 | Self::GYRO_Y.0 | Self::GYRO_Z.0);
    pub const ACCELEROMETER: Self = Self(Self::ACCELEROMETER_X.0 | Self::ACCELEROMETER_Y.0 | Self::ACCELEROMETER_Z.0);
    pub const DISABLED: Self = Self(0);

    /// Replace the accelerometer range bits.
    pub fn with_range(self, range: AccelerometerRange) -> Self {
        Self((self.0 & !(0b11 << 8)) | ((range as u16) << 8))
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Bytes as written to the characteristic.
    pub fn to_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }
}

impl BitOr for MotionConfig {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

fn sensor_service(
    service: Uuid,
    data: Uuid,
    config: Uuid,
    period: Option<Uuid>,
    handler: &Rc<dyn CharacteristicHandler>,
) -> Service {
    let service = Service::new(service)
        .characteristic(
            Characteristic::new(data)
                .handler(handler.clone())
                .descriptor(Descriptor::new(CHARACTERISTIC_CCCD_UUID16)),
        )
        .characteristic(Characteristic::new(config).handler(handler.clone()));
    match period {
        Some(period) => service.characteristic(Characteristic::new(period).handler(handler.clone())),
        None => service,
    }
}

/// Tree of every SensorTag service, with `handler` attached to all characteristics.
///
/// Data characteristics carry their client characteristic configuration descriptor, so
/// notifications can be switched on with [`Sensor::enable_notification`](crate::Sensor::enable_notification).
pub fn tree(handler: Rc<dyn CharacteristicHandler>) -> AttributeTree {
    AttributeTree::builder()
        .service(sensor_service(
            TEMPERATURE_SERVICE,
            TEMPERATURE_DATA,
            TEMPERATURE_CONFIG,
            Some(TEMPERATURE_PERIOD),
            &handler,
        ))
        .service(sensor_service(HUMIDITY_SERVICE, HUMIDITY_DATA, HUMIDITY_CONFIG, None, &handler))
        .service(sensor_service(OPTICAL_SERVICE, OPTICAL_DATA, OPTICAL_CONFIG, None, &handler))
        .service(sensor_service(MOTION_SERVICE, MOTION_DATA, MOTION_CONFIG, None, &handler))
        .service(
            Service::new(IO_SERVICE)
                .characteristic(Characteristic::new(IO_DATA).handler(handler.clone()))
                .characteristic(Characteristic::new(IO_CONFIG).handler(handler.clone())),
        )
        .service(
            Service::new(SIMPLE_KEYS_SERVICE).characteristic(
                Characteristic::new(SIMPLE_KEYS_DATA)
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
    fn vendor_uuids() {
        assert_eq!(TEMPERATURE_SERVICE.to_string(), "f000aa00-0451-4000-b000-000000000000");
        assert_eq!(MOTION_CONFIG.to_string(), "f000aa82-0451-4000-b000-000000000000");
        assert_eq!(SIMPLE_KEYS_DATA.as_short(), Some(0xFFE1));
    }

    #[test]
    fn period_is_clamped() {
        assert_eq!(period(1000), PERIOD_DEFAULT);
        assert_eq!(period(0), PERIOD_MIN);
        assert_eq!(period(60_000), PERIOD_MAX);
    }

    #[test]
    fn motion_config_bits() {
        let config = (MotionConfig::GYRO | MotionConfig::ACCELEROMETER).with_range(AccelerometerRange::G8);
        assert_eq!(config.0, 0x023f);
        assert!(config.contains(MotionConfig::GYRO_Y));
        assert!(!config.contains(MotionConfig::MAGNETOMETER));
        assert_eq!(config.with_range(AccelerometerRange::G4).to_bytes(), [0x3f, 0x01]);
    }

    #[test]
    fn tree_shape() {
        let tree = tree(Rc::new(Ignore));
        assert_eq!(tree.services().len(), 6);
        let temperature = tree.find_service(&TEMPERATURE_SERVICE).unwrap();
        assert_eq!(tree.service(temperature).unwrap().characteristics().len(), 3);
        let data = tree.find_characteristic(&TEMPERATURE_DATA).unwrap();
        assert!(tree.find_descriptor(data, &CHARACTERISTIC_CCCD_UUID16).is_some());
        let config = tree.find_characteristic(&TEMPERATURE_CONFIG).unwrap();
        assert!(!tree.characteristic(config).unwrap().has_descriptors());
        assert_eq!(tree.descriptor_ids().count(), 5);
    }
}
