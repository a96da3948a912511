//! The csv sink writes one row per record: every scalar header field, the
//! configuration tag, then the three training fields as quoted,
//! space-separated interleaved integers.
//!
//! example:
//! 65534,3,452,1,2,24:6F:28:01:02:03,...,0,384,8123456,0000,"66 65 68 67 ...","0 0 ...","0 0 ..."

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::SinkError;
use crate::frame::FrameFields;
use crate::record::DecodedRecord;
use crate::sinks::{Sink, output_name};

pub const CSV_HEADER: &str = "BOM,data_export_format,record_length,csi_export_format,project_type,this_mac,\
tv_sec,tv_usec,rx_timestamp,pkt_mac,rssi,rate,sig_mode,mcs,cwb,smoothing,not_sounding,aggregation,stbc,\
fec_coding,sgi,noise_floor,ampdu_cnt,channel,secondary_channel,rx_timestamp2,ant,sig_len,rx_state,\
first_word_invalid,csi_len,rx_timestamp_guard,wifi_config,ltf_csi,ht_csi,stbcht_csi";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct CsvConfig {
    /// Path to the output file; stdout when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

pub struct CsvSink {
    writer: Option<BufWriter<Box<dyn Write + Send>>>,
}

impl CsvSink {
    pub async fn new(config: CsvConfig) -> Result<Self, SinkError> {
        log::trace!("Creating CSV sink (file: {})", output_name(config.path.as_deref()));
        let output: Box<dyn Write + Send> = match config.path {
            Some(path) => Box::new(File::create(path)?),
            None => Box::new(std::io::stdout()),
        };
        let mut writer = BufWriter::new(output);
        writeln!(writer, "{CSV_HEADER}")?;
        Ok(CsvSink { writer: Some(writer) })
    }

    fn write(&mut self, record: &DecodedRecord) -> Result<(), SinkError> {
        let writer = self.writer.as_mut().ok_or(SinkError::Closed)?;
        let exported = record.export();
        writeln!(
            writer,
            "{},{},\"{}\",\"{}\",\"{}\"",
            scalar_columns(exported.fields),
            exported.wifi_config,
            join(&exported.ltf_csi),
            join(&exported.ht_csi),
            join(&exported.stbcht_csi)
        )?;
        Ok(())
    }
}

fn join(values: &[i16]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ")
}

fn scalar_columns(f: &FrameFields) -> String {
    [
        f.marker.to_string(),
        f.data_export_format.to_string(),
        f.record_length.to_string(),
        f.csi_export_format.to_string(),
        f.project_type.to_string(),
        f.this_mac.to_string(),
        f.tv_sec.to_string(),
        f.tv_usec.to_string(),
        f.rx_timestamp.to_string(),
        f.pkt_mac.to_string(),
        f.rssi.to_string(),
        f.rate.to_string(),
        f.sig_mode.to_string(),
        f.mcs.to_string(),
        f.cwb.to_string(),
        f.smoothing.to_string(),
        f.not_sounding.to_string(),
        f.aggregation.to_string(),
        f.stbc.to_string(),
        f.fec_coding.to_string(),
        f.sgi.to_string(),
        f.noise_floor.to_string(),
        f.ampdu_cnt.to_string(),
        f.channel.to_string(),
        f.secondary_channel.to_string(),
        f.rx_timestamp2.to_string(),
        f.ant.to_string(),
        f.sig_len.to_string(),
        f.rx_state.to_string(),
        u8::from(f.first_word_invalid).to_string(),
        f.csi_len.to_string(),
        f.rx_timestamp_guard.to_string(),
    ]
    .join(",")
}

#[async_trait]
impl Sink for CsvSink {
    async fn provide(&mut self, record: &DecodedRecord) -> Result<(), SinkError> {
        self.write(record)
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}
