//! `DefineShape` 1 to 4: bounds and style tables.

use crate::cursor::Cursor;
use crate::decode::DecodeContext;
use crate::error::{Error, Result};
use crate::model::{Matrix, Rectangle, Rgba};
use crate::tag::TagType;
use crate::tags::{DefineShape, FillStyle, Gradient, GradientRecord, LineStyle, Tag};
use std::rc::Rc;

/// `LINESTYLE2` flag announcing a fill style instead of a color.
const LINE_HAS_FILL: u16 = 1 << 11;
const LINE_JOIN_MITER: u16 = 2;

pub(crate) fn decode_shape(cursor: &mut Cursor<'_>, ctx: &DecodeContext<'_>) -> Result<Tag> {
    let version = match TagType::from_code(ctx.tag_type) {
        Some(TagType::DefineShape) => 1,
        Some(TagType::DefineShape2) => 2,
        Some(TagType::DefineShape3) => 3,
        _ => 4,
    };

    let id = cursor.read_u16()?;
    let bounds = Rectangle::read(cursor)?;
    let edge_bounds = if version >= 4 {
        let edge_bounds = Rectangle::read(cursor)?;
        // Reserved bits, winding rule and stroke scaling hints.
        cursor.read_u8()?;
        Some(edge_bounds)
    } else {
        None
    };
    let fill_styles = read_fill_styles(cursor, version)?;
    let line_styles = read_line_styles(cursor, version)?;
    let records = cursor.read_remaining().to_vec();

    Ok(Tag::DefineShape(Rc::new(DefineShape {
        version,
        id,
        bounds,
        edge_bounds,
        fill_styles,
        line_styles,
        records,
    })))
}

fn read_style_count(cursor: &mut Cursor<'_>, version: u8) -> Result<usize> {
    let count = cursor.read_u8()?;
    if count == 0xFF && version >= 2 {
        return Ok(cursor.read_u16()? as usize);
    }
    Ok(count as usize)
}

fn read_color(cursor: &mut Cursor<'_>, version: u8) -> Result<Rgba> {
    if version >= 3 {
        Rgba::read_rgba(cursor)
    } else {
        Rgba::read_rgb(cursor)
    }
}

pub fn read_fill_styles(cursor: &mut Cursor<'_>, version: u8) -> Result<Vec<FillStyle>> {
    let count = read_style_count(cursor, version)?;
    (0..count).map(|_| read_fill_style(cursor, version)).collect()
}

pub fn read_fill_style(cursor: &mut Cursor<'_>, version: u8) -> Result<FillStyle> {
    let offset = cursor.offset();
    let style = match cursor.read_u8()? {
        0x00 => FillStyle::Solid(read_color(cursor, version)?),
        0x10 => FillStyle::LinearGradient {
            matrix: Matrix::read(cursor)?,
            gradient: read_gradient(cursor, version)?,
        },
        0x12 => FillStyle::RadialGradient {
            matrix: Matrix::read(cursor)?,
            gradient: read_gradient(cursor, version)?,
        },
        0x13 => FillStyle::FocalGradient {
            matrix: Matrix::read(cursor)?,
            gradient: read_gradient(cursor, version)?,
            focal_point: cursor.read_fixed8()?,
        },
        kind @ 0x40..=0x43 => FillStyle::Bitmap {
            id: cursor.read_u16()?,
            matrix: Matrix::read(cursor)?,
            smoothed: kind < 0x42,
            repeating: kind & 0x01 == 0,
        },
        other => {
            cursor.flags().check(Error::invalid(
                offset,
                format!("unknown fill style type {other:#04x}"),
            ))?;
            FillStyle::Solid(Rgba::TRANSPARENT)
        }
    };
    Ok(style)
}

fn read_gradient(cursor: &mut Cursor<'_>, version: u8) -> Result<Gradient> {
    let header = cursor.read_u8()?;
    let count = header & 0x0F;
    let records = (0..count)
        .map(|_| {
            Ok(GradientRecord {
                ratio: cursor.read_u8()?,
                color: read_color(cursor, version)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Gradient {
        spread: header >> 6,
        interpolation: (header >> 4) & 0x03,
        records,
    })
}

pub fn read_line_styles(cursor: &mut Cursor<'_>, version: u8) -> Result<Vec<LineStyle>> {
    let count = read_style_count(cursor, version)?;
    (0..count).map(|_| read_line_style(cursor, version)).collect()
}

fn read_line_style(cursor: &mut Cursor<'_>, version: u8) -> Result<LineStyle> {
    let width = cursor.read_u16()?;
    if version < 4 {
        return Ok(LineStyle {
            width,
            color: read_color(cursor, version)?,
            fill: None,
            flags: 0,
            miter_limit: None,
        });
    }

    let flags = cursor.read_bits(16)? as u16;
    let miter_limit = if (flags >> 12) & 0x03 == LINE_JOIN_MITER {
        Some(cursor.read_fixed8()?)
    } else {
        None
    };
    let (color, fill) = if flags & LINE_HAS_FILL != 0 {
        (Rgba::TRANSPARENT, Some(read_fill_style(cursor, version)?))
    } else {
        (Rgba::read_rgba(cursor)?, None)
    };

    Ok(LineStyle {
        width,
        color,
        fill,
        flags,
        miter_limit,
    })
}
