use super::Uuid;

pub const GENERIC_ACCESS_SERVICE_UUID16: Uuid = Uuid::new_short(0x1800);
pub const GENERIC_ATTRIBUTE_SERVICE_UUID16: Uuid = Uuid::new_short(0x1801);
pub const DEVICE_INFORMATION_SERVICE_UUID16: Uuid = Uuid::new_short(0x180A);
pub const BATTERY_SERVICE_UUID16: Uuid = Uuid::new_short(0x180F);

pub const CHARACTERISTIC_DEVICE_NAME_UUID16: Uuid = Uuid::new_short(0x2A00);
pub const CHARACTERISTIC_APPEARANCE_UUID16: Uuid = Uuid::new_short(0x2A01);
pub const CHARACTERISTIC_BATTERY_LEVEL_UUID16: Uuid = Uuid::new_short(0x2A19);

pub const CHARACTERISTIC_EXTENDED_PROPERTIES_UUID16: Uuid = Uuid::new_short(0x2900);
pub const CHARACTERISTIC_USER_DESCRIPTION_UUID16: Uuid = Uuid::new_short(0x2901);
pub const CHARACTERISTIC_CCCD_UUID16: Uuid = Uuid::new_short(0x2902);
