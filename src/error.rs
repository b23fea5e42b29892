use std::io;
use thiserror::Error;

use crate::header::MIN_INPUT_LEN;

/// Every way a single conversion can be rejected.
///
/// All variants are fatal for the input they were raised on. A truncated
/// trailing frame is never reported here; decoding stops at it instead.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("File too small to be a valid OSD recording: {len} bytes (need at least {MIN_INPUT_LEN})")]
    TooSmall { len: usize },
    #[error("Legacy MSPOSD recording: single-byte-cell files are not supported by this converter")]
    UnsupportedLegacyFormat,
    #[error("Malformed header: {0}")]
    MalformedHeader(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
