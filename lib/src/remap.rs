//! Subcarrier remapping
//! --------------------
//!
//! The ESP32 reports the LLTF, HT-LTF and STBC-HT-LTF estimates back to back
//! in one QIQIQI... byte buffer. Which samples belong to which training field,
//! and which physical subcarrier each sample describes, depends on the
//! `(secondary_channel, signal_mode, channel_bandwidth, stbc)` configuration
//! the packet was received with.
//!
//! This module turns that buffer into three arrays indexed from the lowest
//! subcarrier upwards: 64 wide without a secondary channel (k = -32..31),
//! 128 wide with one (k = -64..63). With the secondary channel below the
//! primary, the primary occupies the upper half; above, the lower half.
//!
//! The index arithmetic follows the firmware's hardware framing, so every
//! supported configuration is spelled out as a row of `MAPPING_RULES`
//! instead of being derived from a formula.

use log::trace;
use Placement::{At, LowRotate, Split121};

use crate::csi_types::{Complex, RemappedCsi, WifiConfig};
use crate::errors::CsiError;
use crate::frame::RawFrame;

/// Samples of a 121-sample 40MHz block that land from the array centre upwards.
const SPLIT_UPPER_LEN: usize = 61;
/// Destination of the remaining 60 samples of a 121-sample block.
const SPLIT_LOWER_START: usize = 4;

/// Where a training field's contiguous block of samples goes in its output array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// The block covers the whole array, rotated by half its length:
    /// `dest[i] = block[(i + n/2) % n]`. Undoes the FFT ordering
    /// (0..n/2-1 then -n/2..-1) the radio reports samples in.
    LowRotate,
    /// The block is copied unchanged starting at the given array position.
    At(usize),
    /// 121-sample block: the first 61 samples go to `[64..125)`, the last 60
    /// to `[4..64)`.
    Split121,
}

#[derive(Debug, Clone, Copy)]
struct FieldSpec {
    start: usize,
    end: usize,
    placement: Placement,
}

impl FieldSpec {
    fn apply(&self, samples: &[Complex], dest: &mut [Complex]) {
        let block = &samples[self.start..self.end];
        match self.placement {
            Placement::LowRotate => {
                let n = block.len();
                debug_assert_eq!(n, dest.len());
                for (i, slot) in dest.iter_mut().enumerate() {
                    *slot = block[(i + n / 2) % n];
                }
            }
            Placement::At(offset) => {
                dest[offset..offset + block.len()].copy_from_slice(block);
            }
            Placement::Split121 => {
                let center = dest.len() / 2;
                let (upper, lower) = block.split_at(SPLIT_UPPER_LEN);
                dest[center..center + upper.len()].copy_from_slice(upper);
                dest[SPLIT_LOWER_START..SPLIT_LOWER_START + lower.len()].copy_from_slice(lower);
            }
        }
    }
}

/// One supported configuration: its expected IQ-pair count and where each
/// training field's samples are taken from and put.
#[derive(Debug, Clone, Copy)]
struct MappingRule {
    config: WifiConfig,
    expected_len: usize,
    ltf: FieldSpec,
    ht: Option<FieldSpec>,
    stbc_ht: Option<FieldSpec>,
}

impl MappingRule {
    /// Smallest sample count that covers every field slice.
    fn needed_len(&self) -> usize {
        [Some(self.ltf), self.ht, self.stbc_ht]
            .iter()
            .flatten()
            .map(|f| f.end)
            .max()
            .unwrap_or(0)
    }
}

const fn rule(
    config: WifiConfig,
    expected_len: usize,
    ltf: FieldSpec,
    ht: Option<FieldSpec>,
    stbc_ht: Option<FieldSpec>,
) -> MappingRule {
    MappingRule {
        config,
        expected_len,
        ltf,
        ht,
        stbc_ht,
    }
}

const fn field(start: usize, end: usize, placement: Placement) -> FieldSpec {
    FieldSpec { start, end, placement }
}

#[rustfmt::skip]
static MAPPING_RULES: [MappingRule; 13] = [
    // No secondary channel, 20MHz: LLTF/HT-LTF/STBC-HT-LTF each 0~31, -32~-1
    rule(WifiConfig::new(0, 0, 0, 0),  64, field(0, 64, LowRotate), None, None),
    rule(WifiConfig::new(0, 1, 0, 0), 128, field(0, 64, LowRotate), Some(field(64, 128, LowRotate)), None),
    rule(WifiConfig::new(0, 1, 0, 1), 192, field(0, 64, LowRotate), Some(field(64, 128, LowRotate)), Some(field(128, 192, LowRotate))),
    // Secondary channel below: the primary is the upper half
    rule(WifiConfig::new(2, 0, 0, 0),  64, field(0, 64, At(64)), None, None),
    rule(WifiConfig::new(2, 1, 0, 0), 128, field(0, 64, At(64)), Some(field(64, 128, At(64))), None),
    rule(WifiConfig::new(2, 1, 0, 1), 190, field(0, 64, At(64)), Some(field(64, 127, At(64))), Some(field(127, 190, At(64)))),
    rule(WifiConfig::new(2, 1, 1, 0), 192, field(0, 64, At(64)), Some(field(64, 192, LowRotate)), None),
    rule(WifiConfig::new(2, 0, 1, 1), 306, field(0, 64, At(64)), Some(field(64, 185, Split121)), Some(field(185, 306, Split121))),
    // Secondary channel above: the primary is the lower half
    rule(WifiConfig::new(1, 0, 0, 0),  64, field(0, 64, At(0)), None, None),
    rule(WifiConfig::new(1, 1, 0, 0), 128, field(0, 64, At(0)), Some(field(64, 128, At(0))), None),
    rule(WifiConfig::new(1, 1, 0, 1), 188, field(0, 64, At(0)), Some(field(64, 126, At(2))), Some(field(126, 188, At(2)))),
    rule(WifiConfig::new(1, 1, 1, 0), 192, field(0, 64, At(0)), Some(field(64, 192, LowRotate)), None),
    rule(WifiConfig::new(1, 1, 1, 1), 306, field(0, 64, At(0)), Some(field(64, 185, Split121)), Some(field(185, 306, Split121))),
];

fn rule_for(config: WifiConfig) -> Option<&'static MappingRule> {
    MAPPING_RULES.iter().find(|rule| rule.config == config)
}

/// Expected IQ-pair count for `config`, if it is supported.
pub fn expected_len(config: WifiConfig) -> Option<usize> {
    rule_for(config).map(|rule| rule.expected_len)
}

/// All supported configurations, in table order.
pub fn supported_configs() -> impl Iterator<Item = WifiConfig> {
    MAPPING_RULES.iter().map(|rule| rule.config)
}

/// Interprets `csi_data` as signed `(Q, I)` byte pairs and builds `I + jQ` samples.
pub fn iq_samples(csi_data: &[i8]) -> Result<Vec<Complex>, CsiError> {
    if csi_data.len() % 2 != 0 {
        return Err(CsiError::OddSampleCount(csi_data.len()));
    }
    Ok(csi_data
        .chunks_exact(2)
        .map(|qi| Complex::new(qi[1] as f64, qi[0] as f64))
        .collect())
}

/// Splits a frame's IQ payload into canonically indexed LLTF, HT-LTF and
/// STBC-HT-LTF arrays.
///
/// Positions without a sample, and whole training fields the configuration
/// does not carry, hold `missing_value`. With `strict`, the payload must
/// hold exactly the configuration's expected number of IQ pairs; otherwise
/// extra samples are ignored.
pub fn remap(frame: &RawFrame, missing_value: Complex, strict: bool) -> Result<(RemappedCsi, WifiConfig), CsiError> {
    let config = frame.wifi_config();
    let mut samples = iq_samples(&frame.csi_data)?;
    if frame.fields.first_word_invalid {
        // The first CSI word (two IQ pairs) is garbage when the radio flags it.
        samples.iter_mut().take(2).for_each(|s| *s = missing_value);
    }

    let rule = rule_for(config).ok_or(CsiError::UnsupportedConfig(config))?;
    let actual = samples.len();
    if strict && actual != rule.expected_len {
        return Err(CsiError::LengthMismatch {
            config,
            expected: rule.expected_len,
            actual,
        });
    }
    let needed = rule.needed_len();
    if actual < needed {
        return Err(CsiError::InsufficientSamples { config, needed, actual });
    }
    trace!("Remapping {actual} IQ pairs with wifi_config={config}");

    let mut csi = RemappedCsi::filled(config.array_width(), missing_value);
    rule.ltf.apply(&samples, &mut csi.ltf);
    if let Some(ht) = rule.ht {
        ht.apply(&samples, &mut csi.ht);
    }
    if let Some(stbc_ht) = rule.stbc_ht {
        stbc_ht.apply(&samples, &mut csi.stbc_ht);
    }
    Ok((csi, config))
}
