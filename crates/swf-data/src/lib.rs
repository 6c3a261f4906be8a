//! swf-data: binary cursor, error flags, tag framing and structural tag payloads.
//!
//! This crate turns the bytes of a movie into [`TagRecord`]s and decoded [`Tag`]s.
//! Resolving those tags into drawable characters is the job of `swf-core`.

/// Bounds-checked byte and bit reader.
pub mod cursor;

/// Fault categories and the shared error type.
pub mod error;

/// Colors, rectangles, matrices, color transforms, filters.
pub mod model;

/// Tag headers and the tag type catalogue.
pub mod tag;

/// Decoded tag payloads.
pub mod tags;

/// Decode table and dispatch.
pub mod decode;

/// Movie container and header.
pub mod header;

pub mod bitmap;
mod place;
pub mod shape;

pub use cursor::Cursor;
pub use decode::{decode_tag, DecodeContext, DecodeFn, DecodeTable};
pub use error::{Error, ErrorFlags, Result};
pub use header::{MovieHeader, SwfFile};
pub use model::{BlendMode, ColorTransform, Filter, FilterKind, Matrix, Rectangle, Rgba};
pub use tag::{read_all_tags, TagIter, TagRecord, TagType, DEFINITION_TAGS};
pub use tags::*;
