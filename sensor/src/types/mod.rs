//! Common types.

pub mod gatt;
pub mod uuid;
