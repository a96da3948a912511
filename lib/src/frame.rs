//! Decoded ESP32 CSI capture frames.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::csi_types::WifiConfig;

/// Byte-order marker written at the start of every firmware record.
pub const BYTE_ORDER_MARKER: u32 = 0xFFFE;

/// A 6-byte hardware address, rendered as `AA:BB:CC:DD:EE:FF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MacAddr(pub [u8; 6]);

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Scalar fields of one frame, in wire order.
///
/// Serialized names follow the firmware's export column names so emitted
/// records stay compatible with existing tooling.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FrameFields {
    #[serde(rename = "BOM")]
    pub marker: u32,
    pub data_export_format: u16,
    pub record_length: i32,
    pub csi_export_format: u16,
    pub project_type: u8,
    pub this_mac: MacAddr,
    pub tv_sec: u32,
    pub tv_usec: u32,
    pub rx_timestamp: u32,
    pub pkt_mac: MacAddr,
    pub rssi: i8,
    pub rate: u8,
    pub sig_mode: u8,
    pub mcs: u8,
    pub cwb: u8,
    pub smoothing: u8,
    pub not_sounding: u8,
    pub aggregation: u8,
    pub stbc: u8,
    pub fec_coding: u8,
    pub sgi: u8,
    pub noise_floor: i8,
    pub ampdu_cnt: u8,
    pub channel: u8,
    pub secondary_channel: u8,
    pub rx_timestamp2: u32,
    pub ant: u8,
    pub sig_len: u16,
    pub rx_state: u8,
    pub first_word_invalid: bool,
    pub csi_len: u16,
    pub rx_timestamp_guard: u32,
}

impl FrameFields {
    pub fn wifi_config(&self) -> WifiConfig {
        WifiConfig::new(self.secondary_channel, self.sig_mode, self.cwb, self.stbc)
    }
}

/// One parsed input line: header fields plus the raw QIQI... payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawFrame {
    pub fields: FrameFields,
    pub csi_data: Vec<i8>,
}

impl RawFrame {
    pub fn wifi_config(&self) -> WifiConfig {
        self.fields.wifi_config()
    }
}
