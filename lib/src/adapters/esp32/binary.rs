//! Compact binary frames: one base64 line per record.
//!
//! Layout (little-endian, no padding):
//!
//! ```text
//! u32 marker | u16 format | i32 record_length | u16 csi_format | u8 project_type
//! u8[6] this_mac | u32 tv_sec | u32 tv_usec | u32 rx_timestamp | u8[6] pkt_mac
//! i8 rssi | u8 rate | u8 sig_mode | u8 mcs | u8 cwb | u8 smoothing | u8 not_sounding
//! u8 aggregation | u8 stbc | u8 fec_coding | u8 sgi | i8 noise_floor | u8 ampdu_cnt
//! u8 channel | u8 secondary_channel | u32 rx_timestamp2 | u8 ant | u16 sig_len
//! u8 rx_state | u8 first_word_invalid | u16 csi_len | i8[384] csi_data
//! u32 rx_timestamp_guard
//! ```

use std::io::{Cursor, Read};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use byteorder::{LittleEndian, ReadBytesExt};

use crate::errors::DecodeError;
use crate::frame::{BYTE_ORDER_MARKER, FrameFields, MacAddr, RawFrame};

/// Size of the fixed IQ payload carried by every binary frame.
pub const CSI_PAYLOAD_LEN: usize = 384;
/// Size of the full binary record, guard timestamp included.
pub const BINARY_FRAME_LEN: usize = 67 + CSI_PAYLOAD_LEN;
/// `{marker: u32, format: u16, record length: i32}`
const HEADER_LEN: usize = 10;

/// Base64-decodes `line` and parses the resulting bytes.
pub fn parse(line: &str) -> Result<RawFrame, DecodeError> {
    let bytes = STANDARD
        .decode(line.trim())
        .map_err(|e| DecodeError::Truncated(format!("invalid base64: {e}")))?;
    parse_bytes(&bytes)
}

/// Parses an already decoded binary record. Trailing bytes past the guard
/// timestamp (firmware alignment padding) are ignored.
pub fn parse_bytes(bytes: &[u8]) -> Result<RawFrame, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::Truncated(format!(
            "header needs {HEADER_LEN} bytes, got {}",
            bytes.len()
        )));
    }

    let mut cursor = Cursor::new(bytes);
    let marker = cursor.read_u32::<LittleEndian>().map_err(short("marker"))?;
    if marker != BYTE_ORDER_MARKER {
        return Err(DecodeError::BadMarker(marker));
    }

    if bytes.len() < BINARY_FRAME_LEN {
        return Err(DecodeError::Truncated(format!(
            "record needs {BINARY_FRAME_LEN} bytes, got {}",
            bytes.len()
        )));
    }

    let data_export_format = cursor.read_u16::<LittleEndian>().map_err(short("format"))?;
    let record_length = cursor.read_i32::<LittleEndian>().map_err(short("record_length"))?;
    let csi_export_format = cursor.read_u16::<LittleEndian>().map_err(short("csi_export_format"))?;
    let project_type = cursor.read_u8().map_err(short("project_type"))?;
    let this_mac = read_mac(&mut cursor, "this_mac")?;
    let tv_sec = cursor.read_u32::<LittleEndian>().map_err(short("tv_sec"))?;
    let tv_usec = cursor.read_u32::<LittleEndian>().map_err(short("tv_usec"))?;
    let rx_timestamp = cursor.read_u32::<LittleEndian>().map_err(short("rx_timestamp"))?;
    let pkt_mac = read_mac(&mut cursor, "pkt_mac")?;
    let rssi = cursor.read_i8().map_err(short("rssi"))?;
    let rate = cursor.read_u8().map_err(short("rate"))?;
    let sig_mode = cursor.read_u8().map_err(short("sig_mode"))?;
    let mcs = cursor.read_u8().map_err(short("mcs"))?;
    let cwb = cursor.read_u8().map_err(short("cwb"))?;
    let smoothing = cursor.read_u8().map_err(short("smoothing"))?;
    let not_sounding = cursor.read_u8().map_err(short("not_sounding"))?;
    let aggregation = cursor.read_u8().map_err(short("aggregation"))?;
    let stbc = cursor.read_u8().map_err(short("stbc"))?;
    let fec_coding = cursor.read_u8().map_err(short("fec_coding"))?;
    let sgi = cursor.read_u8().map_err(short("sgi"))?;
    let noise_floor = cursor.read_i8().map_err(short("noise_floor"))?;
    let ampdu_cnt = cursor.read_u8().map_err(short("ampdu_cnt"))?;
    let channel = cursor.read_u8().map_err(short("channel"))?;
    let secondary_channel = cursor.read_u8().map_err(short("secondary_channel"))?;
    let rx_timestamp2 = cursor.read_u32::<LittleEndian>().map_err(short("rx_timestamp2"))?;
    let ant = cursor.read_u8().map_err(short("ant"))?;
    let sig_len = cursor.read_u16::<LittleEndian>().map_err(short("sig_len"))?;
    let rx_state = cursor.read_u8().map_err(short("rx_state"))?;
    let first_word_invalid = cursor.read_u8().map_err(short("first_word_invalid"))? != 0;
    let csi_len = cursor.read_u16::<LittleEndian>().map_err(short("csi_len"))?;

    let mut payload = [0u8; CSI_PAYLOAD_LEN];
    cursor.read_exact(&mut payload).map_err(short("csi_data"))?;
    let csi_data = payload.iter().map(|&b| b as i8).collect();

    let rx_timestamp_guard = cursor.read_u32::<LittleEndian>().map_err(short("rx_timestamp_guard"))?;

    Ok(RawFrame {
        fields: FrameFields {
            marker,
            data_export_format,
            record_length,
            csi_export_format,
            project_type,
            this_mac,
            tv_sec,
            tv_usec,
            rx_timestamp,
            pkt_mac,
            rssi,
            rate,
            sig_mode,
            mcs,
            cwb,
            smoothing,
            not_sounding,
            aggregation,
            stbc,
            fec_coding,
            sgi,
            noise_floor,
            ampdu_cnt,
            channel,
            secondary_channel,
            rx_timestamp2,
            ant,
            sig_len,
            rx_state,
            first_word_invalid,
            csi_len,
            rx_timestamp_guard,
        },
        csi_data,
    })
}

fn read_mac(cursor: &mut Cursor<&[u8]>, field: &'static str) -> Result<MacAddr, DecodeError> {
    let mut mac = [0u8; 6];
    cursor.read_exact(&mut mac).map_err(short(field))?;
    Ok(MacAddr(mac))
}

fn short(field: &'static str) -> impl Fn(std::io::Error) -> DecodeError {
    move |e| DecodeError::Truncated(format!("failed to read {field}: {e}"))
}
