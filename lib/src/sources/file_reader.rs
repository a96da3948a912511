use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_stream::stream;
use log::debug;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio_stream::Stream;

use crate::errors::{DecodeError, SourceError};

/// Path that selects standard input instead of a file.
pub const STDIN_PATH: &str = "-";

/// Longest line kept in memory. Frame lines are around 1 KiB.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Numbered lines of one input, numbering from 1. Blank lines are skipped
/// but still counted. A line longer than [`MAX_LINE_LEN`] comes through as
/// [`DecodeError::Truncated`].
pub type LineStream = Pin<Box<dyn Stream<Item = Result<(usize, Result<String, DecodeError>), SourceError>> + Send>>;

/// A line source over a capture file, or stdin for `-`.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReader {
    path: PathBuf,
}

impl FileReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> String {
        if self.is_stdin() {
            "<stdin>".to_owned()
        } else {
            self.path.display().to_string()
        }
    }

    pub fn is_stdin(&self) -> bool {
        self.path.as_os_str() == STDIN_PATH
    }

    /// Streams the input's lines without their terminators.
    ///
    /// Invalid UTF-8 is replaced rather than failing the read; such a line
    /// will simply not decode. An unreadable input ends the stream with an error.
    pub fn lines(self) -> LineStream {
        Box::pin(stream! {
            let reader: Box<dyn AsyncRead + Send + Unpin> = if self.is_stdin() {
                Box::new(tokio::io::stdin())
            } else {
                match File::open(&self.path).await {
                    Ok(file) => Box::new(file),
                    Err(source) => {
                        yield Err(SourceError::Open { path: self.name(), source });
                        return;
                    }
                }
            };
            debug!("Reading lines from {}", self.name());

            let mut reader = BufReader::new(reader);
            let mut buf = Vec::new();
            let mut line_no = 0;
            loop {
                buf.clear();
                // Room for the longest kept line and its CRLF.
                match (&mut reader).take(MAX_LINE_LEN as u64 + 2).read_until(b'\n', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(e) => {
                        yield Err(SourceError::Io(e));
                        return;
                    }
                }
                line_no += 1;

                let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                if line.len() > MAX_LINE_LEN {
                    if let Err(e) = skip_line(&mut reader, &buf).await {
                        yield Err(SourceError::Io(e));
                        return;
                    }
                    let error = DecodeError::Truncated(format!("line longer than {MAX_LINE_LEN} bytes"));
                    yield Ok((line_no, Err(error)));
                    continue;
                }

                let line = String::from_utf8_lossy(line);
                if line.trim().is_empty() {
                    continue;
                }
                yield Ok((line_no, Ok(line.into_owned())));
            }
        })
    }
}

/// Discards the rest of an overlong line whose first bytes are in `read`.
async fn skip_line<R: AsyncBufRead + Unpin>(reader: &mut R, read: &[u8]) -> std::io::Result<()> {
    if read.ends_with(b"\n") {
        return Ok(());
    }
    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            return Ok(());
        }
        match chunk.iter().position(|b| *b == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                return Ok(());
            }
            None => {
                let len = chunk.len();
                reader.consume(len);
            }
        }
    }
}
