//! Error vocabulary shared by the section locator and the archive reader.

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while locating or reading an embedded ZIP section.
///
/// The locator itself only produces [`Error::Format`] and [`Error::Io`].
/// The remaining variants belong to the archive reader, so callers can tell
/// "the archive could not be found" apart from "the archive was found but
/// its content is unreadable".
#[derive(Error, Debug)]
pub enum Error {
    /// The ZIP structures are missing or malformed. The reason is enclosed.
    #[error("zip: not a valid zip file ({0})")]
    Format(&'static str),

    /// Reading from the underlying source failed, including short reads.
    #[error("zip: I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry uses a compression method this crate cannot decode.
    #[error("zip: unsupported compression algorithm {0}")]
    UnsupportedAlgorithm(u16),

    /// The decoded entry data does not match the recorded CRC-32.
    #[error("zip: checksum error (expected {expected:#010x}, got {actual:#010x})")]
    ChecksumMismatch { expected: u32, actual: u32 },
}

impl Error {
    /// True when the archive could not be located or its trailer is corrupt.
    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format(_))
    }

    /// True when the failure came from the byte source rather than the data.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}
