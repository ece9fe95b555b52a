//! Ready-made trees for supported sensor devices.
pub mod sensortag;
pub mod wiced_sense;
