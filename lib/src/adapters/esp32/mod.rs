//! ESP32 Wi-Fi Module
//!
//! Parsing of the capture lines written by the ESP32 CSI firmware. Two wire
//! encodings exist:
//!
//! - binary: the whole record as one base64 line (starts with `/v`, the
//!   encoding of the byte-order marker)
//! - textual: a bracketed array of the same fields with a base64 IQ payload
//!
//! `classify` picks the encoding before any parsing happens.
pub mod adapter;
pub mod binary;
pub mod textual;

pub use crate::adapters::esp32::adapter::ESP32Adapter;
use crate::errors::DecodeError;
use crate::frame::RawFrame;

/// Line prefix produced by base64-encoding the little-endian byte-order marker.
pub const BASE64_LINE_PREFIX: &str = "/v";

/// The two wire encodings a capture line can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEncoding {
    Textual,
    Binary,
}

/// Decides which encoding `line` uses, without parsing it.
pub fn classify(line: &str) -> Result<FrameEncoding, DecodeError> {
    let line = line.trim();
    if line.starts_with('[') && line.ends_with(']') {
        Ok(FrameEncoding::Textual)
    } else if line.starts_with(BASE64_LINE_PREFIX) {
        Ok(FrameEncoding::Binary)
    } else {
        Err(DecodeError::UnrecognizedEncoding)
    }
}

/// Parses one capture line into a `RawFrame`.
pub fn parse_line(line: &str) -> Result<RawFrame, DecodeError> {
    let line = line.trim();
    match classify(line)? {
        FrameEncoding::Textual => textual::parse(line),
        FrameEncoding::Binary => binary::parse(line),
    }
}
