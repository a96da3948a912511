//!
//! Handler
//! -------------
//!
//! Drives capture lines from a source through an adapter into a sink, and
//! schedules several inputs either one after another into a single sink or
//! concurrently with one sink each.
//!
//! Module for handler

pub mod decode_task;

pub use decode_task::{DecodeStats, DecodeTask, decode_inputs};
