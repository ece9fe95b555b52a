//! Compile-time configuration.
//!
//! `ble-sensor` has some configuration settings that are set at compile time.
//!
//! They are set via environment variables at build time: set the variable named
//! `BLE_SENSOR_<value>`. For example `BLE_SENSOR_NOTIFICATION_QUEUE_SIZE=16 cargo build`.
//! You can also set them in the `[env]` section of `.cargo/config.toml`.

mod raw {
    #![allow(unused)]
    include!(concat!(env!("OUT_DIR"), "/config.rs"));
}

/// Notification queue size
///
/// This is the number of accepted notifications that can wait for deferred processing
/// at the same time. Notifications accepted while the queue is full are dropped.
///
/// Default: 8.
pub const NOTIFICATION_QUEUE_SIZE: usize = raw::NOTIFICATION_QUEUE_SIZE;

/// Maximum notification length
///
/// Payload bytes beyond this length are not copied into the deferred record.
///
/// Default: 512.
pub const MAX_NOTIFICATION_LEN: usize = raw::MAX_NOTIFICATION_LEN;
