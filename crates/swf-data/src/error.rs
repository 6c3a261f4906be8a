use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

bitflags! {
    /// Fault categories which abort the current operation when enabled.
    ///
    /// A disabled category is tolerated: the reader falls back to a neutral value
    /// (zero bytes, dropped remainder, empty timeline...) and continues.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ErrorFlags: u32 {
        /// Read past the end of the current byte range.
        const OUT_OF_BOUNDS = 0b0000_0001;
        /// Structurally malformed payload.
        const INVALID_DATA = 0b0000_0010;
        /// A decoder did not consume the whole tag payload.
        const EXTRA_DATA = 0b0000_0100;
        /// Tag type missing from the decode table.
        const UNKNOWN_TAG = 0b0000_1000;
        /// Propagate a tag decode failure instead of treating the tag as absent.
        const INVALID_TAG = 0b0001_0000;
        /// A sprite places itself, directly or transitively.
        const CIRCULAR_REFERENCE = 0b0010_0000;
        /// Valid bytes which cannot be processed for the requested operation.
        const UNPROCESSABLE_DATA = 0b0100_0000;
    }
}

impl Default for ErrorFlags {
    fn default() -> Self {
        Self::all().difference(Self::INVALID_TAG)
    }
}

impl ErrorFlags {
    /// Raises `error` if its category is enabled, otherwise logs and tolerates it.
    pub fn check(self, error: Error) -> Result<()> {
        match error.flag() {
            Some(flag) if !self.contains(flag) => {
                tracing::debug!(%error, "tolerated fault");
                Ok(())
            }
            _ => Err(error),
        }
    }

    /// Whether a failed tag decode should abort the surrounding scan.
    pub fn tag_failure_is_fatal(self) -> bool {
        self.contains(Self::INVALID_TAG)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Out of bounds read at offset {offset} (range end {end}, requested {length} bytes)")]
    OutOfBounds {
        offset: usize,
        end: usize,
        length: usize,
    },
    #[error("Invalid data at offset {offset}: {message}")]
    InvalidData { offset: usize, message: String },
    #[error("Tag at offset {offset} has {length} bytes of extra data")]
    ExtraData { offset: usize, length: usize },
    #[error("Unknown tag type {tag_type} at offset {offset}")]
    UnknownTag { tag_type: u16, offset: usize },
    #[error("Circular reference on character {id}")]
    CircularReference { id: u16 },
    #[error("Unprocessable data: {0}")]
    UnprocessableData(String),
    #[error("No character exported as '{0}'")]
    UnknownName(String),
}

impl Error {
    /// The fault category of this error. Name lookups have none: a miss is always reported.
    pub fn flag(&self) -> Option<ErrorFlags> {
        match self {
            Error::OutOfBounds { .. } => Some(ErrorFlags::OUT_OF_BOUNDS),
            Error::InvalidData { .. } => Some(ErrorFlags::INVALID_DATA),
            Error::ExtraData { .. } => Some(ErrorFlags::EXTRA_DATA),
            Error::UnknownTag { .. } => Some(ErrorFlags::UNKNOWN_TAG),
            Error::CircularReference { .. } => Some(ErrorFlags::CIRCULAR_REFERENCE),
            Error::UnprocessableData(_) => Some(ErrorFlags::UNPROCESSABLE_DATA),
            Error::UnknownName(_) => None,
        }
    }

    pub(crate) fn invalid(offset: usize, message: impl Into<String>) -> Self {
        Error::InvalidData {
            offset,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
