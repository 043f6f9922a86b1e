//! Common types and utilities shared across the package and field layers.

pub mod unit;

pub use unit::{pt_to_emu, px_to_emu};
