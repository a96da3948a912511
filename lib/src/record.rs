//! Decoded records and their serialized shape.

use serde::Serialize;

use crate::csi_types::{RemappedCsi, WifiConfig};
use crate::export;
use crate::frame::FrameFields;

/// One fully decoded capture line.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    pub fields: FrameFields,
    pub wifi_config: WifiConfig,
    pub csi: RemappedCsi,
}

/// The emitted form of a `DecodedRecord`: every scalar header field, the
/// configuration tag and the three training fields as interleaved integers.
#[derive(Debug, Serialize)]
pub struct ExportedRecord<'a> {
    #[serde(flatten)]
    pub fields: &'a FrameFields,
    pub wifi_config: String,
    pub ltf_csi: Vec<i16>,
    pub ht_csi: Vec<i16>,
    pub stbcht_csi: Vec<i16>,
}

impl DecodedRecord {
    pub fn export(&self) -> ExportedRecord<'_> {
        ExportedRecord {
            fields: &self.fields,
            wifi_config: self.wifi_config.tag(),
            ltf_csi: export::encode(&self.csi.ltf),
            ht_csi: export::encode(&self.csi.ht),
            stbcht_csi: export::encode(&self.csi.stbc_ht),
        }
    }
}
