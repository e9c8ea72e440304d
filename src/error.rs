use thiserror::Error;

/// Boundary-facing failures.
///
/// Malformed dendrogram buffers and out-of-range `k` values are not errors;
/// those decode best-effort to empty results. Only inputs the
/// embedding itself got wrong (an unknown format code, a broken length
/// header) are reported here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("unknown pixel format code {0} (expected 1 = RGB or 0 = RGBA)")]
    UnknownPixelFormat(u32),

    #[error("buffer too short for a 4-byte length header")]
    MissingLengthHeader,

    #[error("length header declares {declared} bytes but only {available} follow")]
    TruncatedBuffer { declared: usize, available: usize },
}
