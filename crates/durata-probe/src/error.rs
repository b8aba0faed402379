//! Error types for durata-probe.

use std::io;
use thiserror::Error;

/// Result type for durata-probe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for durata-probe operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error other than an end-of-stream condition.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream ended in the middle of a structure.
    #[error("unexpected end of stream")]
    TruncatedStream,

    /// A length-prefixed element header could not be decoded.
    #[error("invalid element header: {0}")]
    InvalidHeader(&'static str),

    /// A child element's declared size overruns its parent.
    #[error("child element ends at {child_end} past parent end {parent_end}")]
    InvalidContainerSize { child_end: u64, parent_end: u64 },

    /// A known leaf element has an unexpected byte width.
    #[error("unsupported {element} encoding ({len} bytes)")]
    UnsupportedEncoding { element: &'static str, len: u64 },

    /// The timecode scale element carried a zero value.
    #[error("timecode scale must be non-zero")]
    InvalidTimescale,

    /// The stream does not start with an EBML identification element.
    #[error("missing EBML identification element")]
    NotEbml,

    /// The container is well-formed but carries no usable duration.
    #[error("no audio duration found")]
    DurationNotFound,

    /// A flat-format stream violates its own structure.
    #[error("malformed stream: {0}")]
    Malformed(&'static str),

    /// A recognized but unimplemented encoding.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    /// Format detection found nothing to dispatch to.
    #[error("unrecognized file format")]
    UnknownFormat,
}
