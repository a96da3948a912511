use log::trace;

use super::parse_line;
use crate::adapters::CsiDataAdapter;
use crate::csi_types::Complex;
use crate::errors::RecordError;
use crate::record::DecodedRecord;
use crate::remap::remap;
use crate::validate::validate;

/// Adapter for ESP32 CSI capture lines.
///
/// Accepts both wire encodings, rejects frames whose guard timestamp does not
/// match, and remaps the IQ payload into canonically ordered LLTF, HT-LTF
/// and STBC-HT-LTF arrays.
#[derive(Debug, Clone, Copy)]
pub struct ESP32Adapter {
    /// Written to every array position without a sample.
    missing_value: Complex,
    /// Reject payloads whose IQ-pair count differs from the configuration's.
    strict: bool,
}

impl ESP32Adapter {
    pub fn new(missing_value: Complex, strict: bool) -> Self {
        Self { missing_value, strict }
    }
}

impl Default for ESP32Adapter {
    fn default() -> Self {
        Self::new(Complex::new(0.0, 0.0), false)
    }
}

impl CsiDataAdapter for ESP32Adapter {
    /// Runs parse, integrity check and remapping on one line.
    ///
    /// Nothing is shared between calls, so lines may be decoded in any order
    /// and from any number of tasks at once.
    fn produce(&self, line: &str) -> Result<DecodedRecord, RecordError> {
        let frame = validate(parse_line(line)?)?;
        let (csi, wifi_config) = remap(&frame, self.missing_value, self.strict)?;
        trace!(
            "Decoded frame rx_timestamp={} wifi_config={wifi_config} width={}",
            frame.fields.rx_timestamp,
            csi.width()
        );
        Ok(DecodedRecord {
            fields: frame.fields,
            wifi_config,
            csi,
        })
    }
}
