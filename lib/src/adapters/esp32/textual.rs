//! Textual array frames: `[65534, 3, 452, 1, ...]`, one JSON-style array per
//! line holding the binary layout's fields in the same order. Hardware
//! addresses appear as six separate byte elements and the IQ payload is a
//! base64 string.

use std::slice::Iter;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::errors::DecodeError;
use crate::frame::{BYTE_ORDER_MARKER, FrameFields, MacAddr, RawFrame};

/// Number of array elements in a textual frame.
pub const TEXTUAL_FIELD_COUNT: usize = 43;

pub fn parse(line: &str) -> Result<RawFrame, DecodeError> {
    let values: Vec<Value> =
        serde_json::from_str(line).map_err(|e| DecodeError::Truncated(format!("invalid array: {e}")))?;
    if values.len() != TEXTUAL_FIELD_COUNT {
        return Err(DecodeError::Truncated(format!(
            "expected {TEXTUAL_FIELD_COUNT} array elements, got {}",
            values.len()
        )));
    }

    let mut row = Row { values: values.iter() };
    let marker: u32 = row.int("BOM")?;
    if marker != BYTE_ORDER_MARKER {
        return Err(DecodeError::BadMarker(marker));
    }

    let fields = FrameFields {
        marker,
        data_export_format: row.int("data_export_format")?,
        record_length: row.int("record_length")?,
        csi_export_format: row.int("csi_export_format")?,
        project_type: row.int("project_type")?,
        this_mac: row.mac("this_mac")?,
        tv_sec: row.int("tv_sec")?,
        tv_usec: row.int("tv_usec")?,
        rx_timestamp: row.int("rx_timestamp")?,
        pkt_mac: row.mac("pkt_mac")?,
        rssi: row.int("rssi")?,
        rate: row.int("rate")?,
        sig_mode: row.int("sig_mode")?,
        mcs: row.int("mcs")?,
        cwb: row.int("cwb")?,
        smoothing: row.int("smoothing")?,
        not_sounding: row.int("not_sounding")?,
        aggregation: row.int("aggregation")?,
        stbc: row.int("stbc")?,
        fec_coding: row.int("fec_coding")?,
        sgi: row.int("sgi")?,
        noise_floor: row.int("noise_floor")?,
        ampdu_cnt: row.int("ampdu_cnt")?,
        channel: row.int("channel")?,
        secondary_channel: row.int("secondary_channel")?,
        rx_timestamp2: row.int("rx_timestamp2")?,
        ant: row.int("ant")?,
        sig_len: row.int("sig_len")?,
        rx_state: row.int("rx_state")?,
        first_word_invalid: row.flag("first_word_invalid")?,
        csi_len: row.int("csi_len")?,
        rx_timestamp_guard: 0,
    };
    let csi_data = row.payload("csi_data")?;
    let rx_timestamp_guard = row.int("rx_timestamp_guard")?;

    Ok(RawFrame {
        fields: FrameFields {
            rx_timestamp_guard,
            ..fields
        },
        csi_data,
    })
}

/// Sequential reader over the array elements; each read consumes one element.
struct Row<'a> {
    values: Iter<'a, Value>,
}

impl Row<'_> {
    fn next(&mut self, field: &str) -> Result<&Value, DecodeError> {
        self.values
            .next()
            .ok_or_else(|| DecodeError::Truncated(format!("missing element {field}")))
    }

    fn int<T: TryFrom<i64>>(&mut self, field: &str) -> Result<T, DecodeError> {
        let value = self.next(field)?;
        value
            .as_i64()
            .and_then(|v| T::try_from(v).ok())
            .ok_or_else(|| DecodeError::Truncated(format!("{field}: invalid value {value}")))
    }

    fn flag(&mut self, field: &str) -> Result<bool, DecodeError> {
        match self.next(field)? {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => n
                .as_i64()
                .map(|v| v != 0)
                .ok_or_else(|| DecodeError::Truncated(format!("{field}: invalid value {n}"))),
            other => Err(DecodeError::Truncated(format!("{field}: invalid value {other}"))),
        }
    }

    fn mac(&mut self, field: &str) -> Result<MacAddr, DecodeError> {
        let mut mac = [0u8; 6];
        for byte in mac.iter_mut() {
            *byte = self.int(field)?;
        }
        Ok(MacAddr(mac))
    }

    fn payload(&mut self, field: &str) -> Result<Vec<i8>, DecodeError> {
        let value = self.next(field)?;
        let encoded = value
            .as_str()
            .ok_or_else(|| DecodeError::Truncated(format!("{field}: expected a base64 string")))?;
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| DecodeError::Truncated(format!("{field}: invalid base64: {e}")))?;
        Ok(bytes.into_iter().map(|b| b as i8).collect())
    }
}
