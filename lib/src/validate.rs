//! Frame integrity check.
//!
//! The firmware writes the receive timestamp once before and once after the
//! IQ payload; a frame whose copies disagree was corrupted in transit.

use crate::errors::DecodeError;
use crate::frame::RawFrame;

/// Passes `frame` through when its guard timestamp matches its receive timestamp.
pub fn validate(frame: RawFrame) -> Result<RawFrame, DecodeError> {
    let rx_timestamp = frame.fields.rx_timestamp;
    let guard = frame.fields.rx_timestamp_guard;
    if rx_timestamp == guard {
        Ok(frame)
    } else {
        Err(DecodeError::GuardMismatch { rx_timestamp, guard })
    }
}
