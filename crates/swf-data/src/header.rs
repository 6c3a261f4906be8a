//! Movie container: signature, compression and the fixed header preceding the tag stream.

use crate::cursor::Cursor;
use crate::error::{Error, ErrorFlags, Result};
use crate::model::Rectangle;
use flate2::read::ZlibDecoder;
use serde::Serialize;
use std::io::Read;

/// Signature, version and file length.
const PREFIX_LENGTH: usize = 8;

/// Upper bound on the inflated size reserved up front, as a multiple of the input size.
const MAX_RESERVE_RATIO: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Compression {
    None,
    Zlib,
    Lzma,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieHeader {
    pub compression: Compression,
    pub version: u8,
    /// Uncompressed length declared by the file.
    pub file_length: u32,
    /// Stage bounds, in twips.
    pub frame_size: Rectangle,
    pub frame_rate: f64,
    pub frame_count: u16,
}

/// An uncompressed movie: header plus the byte range of its tag stream.
#[derive(Debug, Clone)]
pub struct SwfFile {
    pub header: MovieHeader,
    /// Whole uncompressed file, prefix included, so offsets match the declared layout.
    pub data: Vec<u8>,
    pub tags_offset: usize,
}

impl SwfFile {
    pub fn parse(bytes: &[u8], flags: ErrorFlags) -> Result<Self> {
        if bytes.len() < PREFIX_LENGTH {
            return Err(Error::UnprocessableData("file too short for a movie header".into()));
        }
        let compression = match &bytes[..3] {
            b"FWS" => Compression::None,
            b"CWS" => Compression::Zlib,
            b"ZWS" => Compression::Lzma,
            _ => return Err(Error::UnprocessableData("missing movie signature".into())),
        };
        let version = bytes[3];
        let file_length = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

        let data = match compression {
            Compression::None => bytes.to_vec(),
            Compression::Zlib => {
                // the declared length is untrusted
                let reserve = (file_length as usize).min(bytes.len().saturating_mul(MAX_RESERVE_RATIO));
                let mut data = Vec::with_capacity(reserve);
                data.extend_from_slice(&bytes[..PREFIX_LENGTH]);
                if let Err(error) = ZlibDecoder::new(&bytes[PREFIX_LENGTH..]).read_to_end(&mut data) {
                    // Truncated archives still expose everything inflated so far.
                    flags.check(Error::UnprocessableData(format!("zlib stream: {error}")))?;
                }
                data
            }
            Compression::Lzma => {
                return Err(Error::UnprocessableData("LZMA compressed movies are not supported".into()));
            }
        };
        if data.len() != file_length as usize {
            tracing::debug!(declared = file_length, actual = data.len(), "movie length mismatch");
        }

        let mut cursor = Cursor::with_range(&data, PREFIX_LENGTH, data.len(), flags);
        let frame_size = Rectangle::read(&mut cursor)?;
        let frame_rate = f64::from(cursor.read_u16()?) / 256.0;
        let frame_count = cursor.read_u16()?;
        let tags_offset = cursor.offset();

        Ok(Self {
            header: MovieHeader {
                compression,
                version,
                file_length,
                frame_size,
                frame_rate,
                frame_count,
            },
            data,
            tags_offset,
        })
    }

    /// Cursor over the tag stream.
    pub fn cursor(&self, flags: ErrorFlags) -> Cursor<'_> {
        Cursor::with_range(&self.data, self.tags_offset, self.data.len(), flags)
    }
}
