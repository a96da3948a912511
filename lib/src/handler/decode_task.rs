//! DecodeTask runs the per-line pipeline for one input: read, decode,
//! report rejects, write records.
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, error, info};
use tokio::task::JoinSet;
use tokio_stream::StreamExt;

use crate::FromConfig;
use crate::adapters::CsiDataAdapter;
use crate::diagnostics::Diagnostics;
use crate::errors::{RecordError, TaskError};
use crate::sinks::{Sink, SinkConfig};
use crate::sources::FileReader;

/// Line counts of one or more decoded inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Non-blank lines read.
    pub lines: usize,
    /// Records written to the sink.
    pub decoded: usize,
    /// Skipped lines per error kind.
    pub rejected: BTreeMap<&'static str, usize>,
}

impl DecodeStats {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    pub fn merge(&mut self, other: DecodeStats) {
        self.lines += other.lines;
        self.decoded += other.decoded;
        for (kind, count) in other.rejected {
            *self.rejected.entry(kind).or_default() += count;
        }
    }
}

impl fmt::Display for DecodeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lines, {} decoded, {} rejected",
            self.lines,
            self.decoded,
            self.rejected_total()
        )?;
        if !self.rejected.is_empty() {
            let kinds: Vec<String> = self.rejected.iter().map(|(k, n)| format!("{k}={n}")).collect();
            write!(f, " ({})", kinds.join(", "))?;
        }
        Ok(())
    }
}

/// Shares one adapter and one diagnostics sink between any number of inputs.
#[derive(Clone)]
pub struct DecodeTask {
    adapter: Arc<dyn CsiDataAdapter>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl DecodeTask {
    pub fn new(adapter: Arc<dyn CsiDataAdapter>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self { adapter, diagnostics }
    }

    /// Decodes every line of `source` into `sink`.
    ///
    /// Lines that fail to decode are reported to the diagnostics sink and
    /// counted; they never end the run. The sink is not closed.
    ///
    /// # Errors
    ///
    /// Returns a [`TaskError`] if the source cannot be read or the sink fails.
    pub async fn run(&self, source: FileReader, sink: &mut dyn Sink) -> Result<DecodeStats, TaskError> {
        let name = source.name();
        debug!("Decoding {name}");
        let mut stats = DecodeStats::default();
        let mut lines = source.lines();
        while let Some(item) = lines.next().await {
            let (line_no, line) = item?;
            stats.lines += 1;
            let produced = match &line {
                Ok(text) => self.adapter.produce(text),
                Err(e) => Err(RecordError::from(e.clone())),
            };
            match produced {
                Ok(record) => {
                    sink.provide(&record).await?;
                    stats.decoded += 1;
                }
                Err(e) => {
                    self.diagnostics.rejected(&name, line_no, line.as_deref().unwrap_or(""), &e);
                    *stats.rejected.entry(e.kind()).or_default() += 1;
                }
            }
        }
        info!("{name}: {stats}");
        Ok(stats)
    }

    /// Decodes one input into its own sink and closes it.
    async fn run_to(&self, input: PathBuf, sink_config: SinkConfig) -> Result<DecodeStats, TaskError> {
        let mut sink = <dyn Sink>::from_config(sink_config).await?;
        let result = self.run(FileReader::new(input), sink.as_mut()).await;
        let closed = sink.close().await;
        let stats = result?;
        closed?;
        Ok(stats)
    }
}

/// Decodes `inputs` and returns the combined counts.
///
/// With `out_dir`, every input is decoded by its own tokio task into its own
/// file under that directory, in no particular order. Without, inputs are
/// decoded in order into the single configured sink.
///
/// An input that cannot be read is logged and skipped; the first such error
/// is returned once the remaining inputs are done. A failing shared sink ends
/// the run. Ctrl-C ends the run with [`TaskError::Interrupted`].
pub async fn decode_inputs(
    task: DecodeTask,
    inputs: Vec<PathBuf>,
    sink_config: SinkConfig,
    out_dir: Option<PathBuf>,
) -> Result<DecodeStats, TaskError> {
    let work = async {
        match out_dir {
            Some(dir) => decode_concurrently(task, inputs, sink_config, dir).await,
            None => decode_sequentially(task, inputs, sink_config).await,
        }
    };
    tokio::select! {
        result = work => result,
        Ok(()) = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping decode");
            Err(TaskError::Interrupted)
        }
    }
}

async fn decode_sequentially(
    task: DecodeTask,
    inputs: Vec<PathBuf>,
    sink_config: SinkConfig,
) -> Result<DecodeStats, TaskError> {
    let mut sink = <dyn Sink>::from_config(sink_config).await?;
    let mut total = DecodeStats::default();
    let mut first_error = None;
    for input in inputs {
        match task.run(FileReader::new(input), sink.as_mut()).await {
            Ok(stats) => total.merge(stats),
            Err(TaskError::SourceError(e)) => {
                error!("{e}");
                if first_error.is_none() {
                    first_error = Some(TaskError::SourceError(e));
                }
            }
            Err(e) => {
                // Nothing more can be written; best effort flush of what was.
                let _ = sink.close().await;
                return Err(e);
            }
        }
    }
    sink.close().await?;
    first_error.map_or(Ok(total), Err)
}

async fn decode_concurrently(
    task: DecodeTask,
    inputs: Vec<PathBuf>,
    sink_config: SinkConfig,
    out_dir: PathBuf,
) -> Result<DecodeStats, TaskError> {
    tokio::fs::create_dir_all(&out_dir)
        .await
        .map_err(|e| TaskError::Config(format!("cannot create {}: {e}", out_dir.display())))?;

    let configs = sink_config.for_inputs(&out_dir, &inputs);
    let mut tasks = JoinSet::new();
    for (input, config) in inputs.into_iter().zip(configs) {
        let task = task.clone();
        debug!("Writing {} to {:?}", input.display(), config.path());
        tasks.spawn(async move { task.run_to(input, config).await });
    }

    // Keep joining after a failure; dropping the set would abort the other
    // tasks before their sinks are flushed.
    let mut total = DecodeStats::default();
    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        match joined.map_err(TaskError::from).and_then(|result| result) {
            Ok(stats) => total.merge(stats),
            Err(e) => {
                error!("{e}");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    first_error.map_or(Ok(total), Err)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::adapters::esp32::ESP32Adapter;
    use crate::csi_types::WifiConfig;
    use crate::diagnostics::{LogDiagnostics, MockDiagnostics};
    use crate::errors::SinkError;
    use crate::record::DecodedRecord;
    use crate::sinks::file::FileConfig;
    use crate::sinks::OutputFormat;
    use crate::sources::MAX_LINE_LEN;
    use crate::test_utils::{binary_line, indexed_payload, ramp_payload, sample_fields, textual_line};

    #[derive(Default)]
    struct VecSink {
        records: Arc<Mutex<Vec<DecodedRecord>>>,
    }

    #[async_trait]
    impl Sink for VecSink {
        async fn provide(&mut self, record: &DecodedRecord) -> Result<(), SinkError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn close(&mut self) -> Result<(), SinkError> {
            Ok(())
        }
    }

    fn capture_file(lines: &[String]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    fn mixed_capture() -> Vec<String> {
        let good = sample_fields(WifiConfig::new(0, 1, 0, 0));
        let mut bad_guard = good.clone();
        bad_guard.rx_timestamp_guard = 1;
        vec![
            binary_line(&good, &ramp_payload(384)),
            "I (1234) wifi: not a frame".to_owned(),
            textual_line(&good, &ramp_payload(256)),
            binary_line(&bad_guard, &ramp_payload(384)),
            textual_line(&sample_fields(WifiConfig::new(0, 3, 0, 0)), &ramp_payload(128)),
        ]
    }

    fn task_with(diagnostics: Arc<dyn Diagnostics>) -> DecodeTask {
        DecodeTask::new(Arc::new(ESP32Adapter::default()), diagnostics)
    }

    #[tokio::test]
    async fn test_bad_lines_are_reported_and_skipped() {
        let file = capture_file(&mixed_capture());
        let mut diagnostics = MockDiagnostics::new();
        diagnostics
            .expect_rejected()
            .withf(|_, line_no, _, e| *line_no == 2 && e.kind() == "unrecognized_encoding")
            .times(1)
            .return_const(());
        diagnostics
            .expect_rejected()
            .withf(|_, line_no, _, e| *line_no == 4 && e.kind() == "guard_mismatch")
            .times(1)
            .return_const(());
        diagnostics
            .expect_rejected()
            .withf(|_, line_no, _, e| *line_no == 5 && e.kind() == "unsupported_config")
            .times(1)
            .return_const(());

        let mut sink = VecSink::default();
        let stats = task_with(Arc::new(diagnostics))
            .run(FileReader::new(file.path()), &mut sink)
            .await
            .unwrap();

        assert_eq!(stats.lines, 5);
        assert_eq!(stats.decoded, 2);
        assert_eq!(stats.rejected_total(), 3);
        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.wifi_config.tag() == "0100"));
    }

    #[tokio::test]
    async fn test_overlong_line_is_rejected_as_truncated() {
        let good = binary_line(&sample_fields(WifiConfig::new(0, 1, 0, 0)), &ramp_payload(384));
        let file = capture_file(&["A".repeat(MAX_LINE_LEN + 1), good]);
        let mut diagnostics = MockDiagnostics::new();
        diagnostics
            .expect_rejected()
            .withf(|_, line_no, line, e| *line_no == 1 && line.is_empty() && e.kind() == "truncated")
            .times(1)
            .return_const(());

        let mut sink = VecSink::default();
        let stats = task_with(Arc::new(diagnostics))
            .run(FileReader::new(file.path()), &mut sink)
            .await
            .unwrap();

        assert_eq!(stats.lines, 2);
        assert_eq!(stats.decoded, 1);
        assert_eq!(stats.rejected.get("truncated"), Some(&1));
    }

    #[tokio::test]
    async fn test_missing_input_is_a_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = VecSink::default();
        let err = task_with(Arc::new(LogDiagnostics))
            .run(FileReader::new(dir.path().join("absent")), &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::SourceError(_)));
    }

    #[tokio::test]
    async fn test_sequential_inputs_share_one_sink_in_order() {
        let first = capture_file(&[binary_line(&sample_fields(WifiConfig::new(1, 0, 0, 0)), &[])]);
        let second = capture_file(&[binary_line(&sample_fields(WifiConfig::new(2, 0, 0, 0)), &[])]);
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("all.jsonl");
        let sink = SinkConfig::File(FileConfig {
            path: Some(out.clone()),
            format: OutputFormat::Json,
        });

        let stats = decode_inputs(
            task_with(Arc::new(LogDiagnostics)),
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            sink,
            None,
        )
        .await
        .unwrap();
        assert_eq!(stats.decoded, 2);

        let contents = std::fs::read_to_string(&out).unwrap();
        let tags: Vec<String> = contents
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["wifi_config"].to_string())
            .collect();
        assert_eq!(tags, vec!["\"1000\"", "\"2000\""]);
    }

    #[tokio::test]
    async fn test_out_dir_gets_one_file_per_input() {
        let inputs_dir = tempfile::tempdir().unwrap();
        let mut inputs = Vec::new();
        for name in ["a", "b", "c"] {
            let path = inputs_dir.path().join(format!("{name}.txt"));
            let line = textual_line(&sample_fields(WifiConfig::new(0, 0, 0, 0)), &indexed_payload(64));
            std::fs::write(&path, format!("{line}\n")).unwrap();
            inputs.push(path);
        }
        let out_dir = inputs_dir.path().join("decoded");

        let stats = decode_inputs(
            task_with(Arc::new(LogDiagnostics)),
            inputs,
            SinkConfig::default(),
            Some(out_dir.clone()),
        )
        .await
        .unwrap();

        assert_eq!(stats.lines, 3);
        assert_eq!(stats.decoded, 3);
        for name in ["a", "b", "c"] {
            let contents = std::fs::read_to_string(out_dir.join(format!("{name}.jsonl"))).unwrap();
            assert_eq!(contents.lines().count(), 1);
        }
    }

    #[tokio::test]
    async fn test_out_dir_keeps_inputs_with_the_same_stem_apart() {
        let inputs_dir = tempfile::tempdir().unwrap();
        let fields = sample_fields(WifiConfig::new(0, 0, 0, 0));
        let mut inputs = Vec::new();
        for (sub, frames) in [("a", 3), ("b", 5)] {
            let dir = inputs_dir.path().join(sub);
            std::fs::create_dir(&dir).unwrap();
            let path = dir.join("run.txt");
            let lines: Vec<String> = (0..frames).map(|_| binary_line(&fields, &indexed_payload(64))).collect();
            std::fs::write(&path, lines.join("\n")).unwrap();
            inputs.push(path);
        }
        let out_dir = inputs_dir.path().join("decoded");

        let stats = decode_inputs(
            task_with(Arc::new(LogDiagnostics)),
            inputs,
            SinkConfig::default(),
            Some(out_dir.clone()),
        )
        .await
        .unwrap();

        assert_eq!(stats.decoded, 8);
        let first = std::fs::read_to_string(out_dir.join("run.jsonl")).unwrap();
        let second = std::fs::read_to_string(out_dir.join("run-1.jsonl")).unwrap();
        assert_eq!(first.lines().count(), 3);
        assert_eq!(second.lines().count(), 5);
    }

    #[tokio::test]
    async fn test_out_dir_failure_still_finishes_other_inputs() {
        let inputs_dir = tempfile::tempdir().unwrap();
        let good = inputs_dir.path().join("good.txt");
        std::fs::write(&good, mixed_capture().join("\n")).unwrap();
        let out_dir = inputs_dir.path().join("decoded");

        let err = decode_inputs(
            task_with(Arc::new(LogDiagnostics)),
            vec![inputs_dir.path().join("absent.txt"), good],
            SinkConfig::default(),
            Some(out_dir.clone()),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, TaskError::SourceError(_)));
        let contents = std::fs::read_to_string(out_dir.join("good.jsonl")).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_input_does_not_stop_the_others() {
        let good = capture_file(&mixed_capture());
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.jsonl");
        let sink = SinkConfig::File(FileConfig {
            path: Some(out.clone()),
            format: OutputFormat::Json,
        });

        let err = decode_inputs(
            task_with(Arc::new(LogDiagnostics)),
            vec![dir.path().join("absent.txt"), good.path().to_path_buf()],
            sink,
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, TaskError::SourceError(_)));
        assert_eq!(std::fs::read_to_string(&out).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_stats_merge_and_display() {
        let mut total = DecodeStats::default();
        total.merge(DecodeStats {
            lines: 3,
            decoded: 2,
            rejected: BTreeMap::from([("truncated", 1)]),
        });
        total.merge(DecodeStats {
            lines: 2,
            decoded: 0,
            rejected: BTreeMap::from([("truncated", 1), ("bad_marker", 1)]),
        });
        assert_eq!(total.rejected_total(), 3);
        assert_eq!(
            total.to_string(),
            "5 lines, 2 decoded, 3 rejected (bad_marker=1, truncated=2)"
        );
    }
}
