//! `DefineBits*` and `DefineBitsLossless*` headers; pixel data stays compressed.

use crate::cursor::Cursor;
use crate::decode::DecodeContext;
use crate::error::{Error, Result};
use crate::tag::TagType;
use crate::tags::{DefineBits, DefineBitsLossless, Tag};
use std::rc::Rc;

pub const FORMAT_COLORMAPPED: u8 = 3;
pub const FORMAT_RGB15: u8 = 4;
pub const FORMAT_RGB32: u8 = 5;

pub(crate) fn decode_bits(cursor: &mut Cursor<'_>, ctx: &DecodeContext<'_>) -> Result<Tag> {
    let version = match TagType::from_code(ctx.tag_type) {
        Some(TagType::DefineBits) => 1,
        Some(TagType::DefineBitsJpeg2) => 2,
        Some(TagType::DefineBitsJpeg3) => 3,
        _ => 4,
    };

    let id = cursor.read_u16()?;
    let alpha_offset = if version >= 3 {
        Some(cursor.read_u32()? as usize)
    } else {
        None
    };
    let deblock = if version == 4 {
        Some(cursor.read_fixed8()?)
    } else {
        None
    };

    let (image_data, alpha_data) = match alpha_offset {
        Some(length) => {
            let image = cursor.read_bytes(length)?.to_vec();
            (image, Some(cursor.read_remaining().to_vec()))
        }
        None => (cursor.read_remaining().to_vec(), None),
    };

    Ok(Tag::DefineBits(Rc::new(DefineBits {
        version,
        id,
        deblock,
        image_data,
        alpha_data,
    })))
}

pub(crate) fn decode_lossless(cursor: &mut Cursor<'_>, ctx: &DecodeContext<'_>) -> Result<Tag> {
    let version = if ctx.tag_type == TagType::DefineBitsLossless.code() {
        1
    } else {
        2
    };

    let id = cursor.read_u16()?;
    let format_offset = cursor.offset();
    let format = cursor.read_u8()?;
    let width = cursor.read_u16()?;
    let height = cursor.read_u16()?;

    if !matches!(format, FORMAT_COLORMAPPED | FORMAT_RGB15 | FORMAT_RGB32) {
        cursor
            .flags()
            .check(Error::invalid(format_offset, format!("unknown bitmap format {format}")))?;
    }
    let color_table_size = if format == FORMAT_COLORMAPPED {
        Some(cursor.read_u8()?)
    } else {
        None
    };

    Ok(Tag::DefineBitsLossless(Rc::new(DefineBitsLossless {
        version,
        id,
        format,
        width,
        height,
        color_table_size,
        data: cursor.read_remaining().to_vec(),
    })))
}
