//! CSI data types
//!
//! Types shared by the ESP32 adapter, the remapping engine and the sinks.

use std::fmt;

use num_complex::Complex64;

/// Complex number type alias for CSI data representation.
pub type Complex = Complex64;

/// Canonically indexed subcarrier array. Position 0 is the lowest physical
/// subcarrier index; the length is 64 or 128 depending only on the
/// secondary channel.
pub type SubcarrierArray = Vec<Complex>;

/// Width of every output array when no secondary channel is in use.
pub const NARROW_WIDTH: usize = 64;
/// Width of every output array when a secondary channel is bonded.
pub const WIDE_WIDTH: usize = 128;

/// The radio configuration 4-tuple a frame was captured with.
///
/// Keys the remapping table. `Display` renders the 4-digit tag used in
/// emitted records and diagnostics, e.g. `"2110"`.
#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WifiConfig {
    pub secondary_channel : u8, // 0: none, 1: above, 2: below
    pub signal_mode       : u8, // 0: legacy, 1: HT, 3: VHT
    pub channel_bandwidth : u8, // 0: 20MHz, 1: 40MHz
    pub stbc              : u8, // 0: no STBC, 1: STBC
}

impl WifiConfig {
    pub const fn new(secondary_channel: u8, signal_mode: u8, channel_bandwidth: u8, stbc: u8) -> Self {
        Self {
            secondary_channel,
            signal_mode,
            channel_bandwidth,
            stbc,
        }
    }

    /// Length of the output arrays for this configuration.
    pub fn array_width(&self) -> usize {
        if self.secondary_channel == 0 { NARROW_WIDTH } else { WIDE_WIDTH }
    }

    pub fn tag(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WifiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            self.secondary_channel, self.signal_mode, self.channel_bandwidth, self.stbc
        )
    }
}

/// The three training-field estimates of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RemappedCsi {
    /// Legacy long training field (LLTF)
    pub ltf: SubcarrierArray,
    /// High-throughput long training field (HT-LTF)
    pub ht: SubcarrierArray,
    /// Space-time block coded HT-LTF
    pub stbc_ht: SubcarrierArray,
}

impl RemappedCsi {
    /// Three arrays of `width` positions, all holding `missing`.
    pub fn filled(width: usize, missing: Complex) -> Self {
        RemappedCsi {
            ltf: vec![missing; width],
            ht: vec![missing; width],
            stbc_ht: vec![missing; width],
        }
    }

    pub fn width(&self) -> usize {
        self.ltf.len()
    }
}
