//! Line sources
//! ------------
//!
//! Capture logs are plain text, one frame per line, read either from a
//! file or from standard input.

pub mod file_reader;

pub use file_reader::{FileReader, LineStream, MAX_LINE_LEN, STDIN_PATH};
