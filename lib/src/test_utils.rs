//! Builders for capture lines used across the crate's tests.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use byteorder::{LittleEndian, WriteBytesExt};
use serde_json::Value;

use crate::adapters::esp32::binary::{BINARY_FRAME_LEN, CSI_PAYLOAD_LEN};
use crate::csi_types::{Complex, WifiConfig};
use crate::frame::{BYTE_ORDER_MARKER, FrameFields, MacAddr};

/// Plausible header fields for a frame captured with `config`.
pub fn sample_fields(config: WifiConfig) -> FrameFields {
    FrameFields {
        marker: BYTE_ORDER_MARKER,
        data_export_format: 3,
        record_length: 452,
        csi_export_format: 1,
        project_type: 2,
        this_mac: MacAddr([0x24, 0x6f, 0x28, 0x01, 0x02, 0x03]),
        tv_sec: 1_700_000_000,
        tv_usec: 250_000,
        rx_timestamp: 8_123_456,
        pkt_mac: MacAddr([0xa4, 0xcf, 0x12, 0xaa, 0xbb, 0xcc]),
        rssi: -55,
        rate: 11,
        sig_mode: config.signal_mode,
        mcs: 7,
        cwb: config.channel_bandwidth,
        smoothing: 1,
        not_sounding: 1,
        aggregation: 0,
        stbc: config.stbc,
        fec_coding: 0,
        sgi: 1,
        noise_floor: -95,
        ampdu_cnt: 0,
        channel: 6,
        secondary_channel: config.secondary_channel,
        rx_timestamp2: 8_123_470,
        ant: 0,
        sig_len: 128,
        rx_state: 0,
        first_word_invalid: false,
        csi_len: CSI_PAYLOAD_LEN as u16,
        rx_timestamp_guard: 8_123_456,
    }
}

/// Serializes `fields` in the binary layout. The payload is zero-padded or
/// cut to the fixed payload size.
pub fn encode_binary(fields: &FrameFields, payload: &[i8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(BINARY_FRAME_LEN);
    buf.write_u32::<LittleEndian>(fields.marker).unwrap();
    buf.write_u16::<LittleEndian>(fields.data_export_format).unwrap();
    buf.write_i32::<LittleEndian>(fields.record_length).unwrap();
    buf.write_u16::<LittleEndian>(fields.csi_export_format).unwrap();
    buf.push(fields.project_type);
    buf.extend_from_slice(&fields.this_mac.0);
    buf.write_u32::<LittleEndian>(fields.tv_sec).unwrap();
    buf.write_u32::<LittleEndian>(fields.tv_usec).unwrap();
    buf.write_u32::<LittleEndian>(fields.rx_timestamp).unwrap();
    buf.extend_from_slice(&fields.pkt_mac.0);
    buf.push(fields.rssi as u8);
    buf.extend_from_slice(&[
        fields.rate,
        fields.sig_mode,
        fields.mcs,
        fields.cwb,
        fields.smoothing,
        fields.not_sounding,
        fields.aggregation,
        fields.stbc,
        fields.fec_coding,
        fields.sgi,
    ]);
    buf.push(fields.noise_floor as u8);
    buf.extend_from_slice(&[fields.ampdu_cnt, fields.channel, fields.secondary_channel]);
    buf.write_u32::<LittleEndian>(fields.rx_timestamp2).unwrap();
    buf.push(fields.ant);
    buf.write_u16::<LittleEndian>(fields.sig_len).unwrap();
    buf.push(fields.rx_state);
    buf.push(fields.first_word_invalid as u8);
    buf.write_u16::<LittleEndian>(fields.csi_len).unwrap();
    let mut data = [0u8; CSI_PAYLOAD_LEN];
    for (slot, value) in data.iter_mut().zip(payload) {
        *slot = *value as u8;
    }
    buf.extend_from_slice(&data);
    buf.write_u32::<LittleEndian>(fields.rx_timestamp_guard).unwrap();
    assert_eq!(buf.len(), BINARY_FRAME_LEN);
    buf
}

/// A binary capture line.
pub fn binary_line(fields: &FrameFields, payload: &[i8]) -> String {
    STANDARD.encode(encode_binary(fields, payload))
}

/// A textual capture line carrying `payload` as-is.
pub fn textual_line(fields: &FrameFields, payload: &[i8]) -> String {
    let mut values: Vec<Value> = vec![
        Value::from(fields.marker),
        Value::from(fields.data_export_format),
        Value::from(fields.record_length),
        Value::from(fields.csi_export_format),
        Value::from(fields.project_type),
    ];
    values.extend(fields.this_mac.0.iter().map(|&b| Value::from(b)));
    values.extend([Value::from(fields.tv_sec), Value::from(fields.tv_usec), Value::from(fields.rx_timestamp)]);
    values.extend(fields.pkt_mac.0.iter().map(|&b| Value::from(b)));
    values.extend([
        Value::from(fields.rssi),
        Value::from(fields.rate),
        Value::from(fields.sig_mode),
        Value::from(fields.mcs),
        Value::from(fields.cwb),
        Value::from(fields.smoothing),
        Value::from(fields.not_sounding),
        Value::from(fields.aggregation),
        Value::from(fields.stbc),
        Value::from(fields.fec_coding),
        Value::from(fields.sgi),
        Value::from(fields.noise_floor),
        Value::from(fields.ampdu_cnt),
        Value::from(fields.channel),
        Value::from(fields.secondary_channel),
        Value::from(fields.rx_timestamp2),
        Value::from(fields.ant),
        Value::from(fields.sig_len),
        Value::from(fields.rx_state),
        Value::from(fields.first_word_invalid as u8),
        Value::from(fields.csi_len),
    ]);
    let bytes: Vec<u8> = payload.iter().map(|&b| b as u8).collect();
    values.push(Value::from(STANDARD.encode(bytes)));
    values.push(fields.rx_timestamp_guard.into());
    serde_json::to_string(&values).unwrap()
}

/// `n` bytes counting up from zero, wrapping.
pub fn ramp_payload(n: usize) -> Vec<i8> {
    (0..n).map(|k| (k % 256) as u8 as i8).collect()
}

/// `pairs` IQ pairs where pair `j` reads back as `indexed_sample(j)`.
pub fn indexed_payload(pairs: usize) -> Vec<i8> {
    (0..pairs)
        .flat_map(|j| [(j / 128) as i8, (j % 128) as i8])
        .collect()
}

pub fn indexed_sample(j: usize) -> Complex {
    Complex::new((j % 128) as f64, (j / 128) as f64)
}
