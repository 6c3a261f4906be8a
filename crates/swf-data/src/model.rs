//! Structural records shared by many tag payloads: colors, rectangles, matrices, color transforms.

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Packs the color as `0xRRGGBBAA`.
    pub fn packed(&self) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, self.a])
    }

    pub fn read_rgb(cursor: &mut Cursor<'_>) -> Result<Self> {
        let [r, g, b] = [cursor.read_u8()?, cursor.read_u8()?, cursor.read_u8()?];
        Ok(Self::new(r, g, b, 255))
    }

    pub fn read_rgba(cursor: &mut Cursor<'_>) -> Result<Self> {
        let [r, g, b, a] = [
            cursor.read_u8()?,
            cursor.read_u8()?,
            cursor.read_u8()?,
            cursor.read_u8()?,
        ];
        Ok(Self::new(r, g, b, a))
    }
}

/// Axis aligned rectangle in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

impl Rectangle {
    pub const ZERO: Rectangle = Rectangle::new(0, 0, 0, 0);

    pub const fn new(x_min: i32, x_max: i32, y_min: i32, y_max: i32) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    pub fn width(&self) -> i32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> i32 {
        self.y_max - self.y_min
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Smallest rectangle containing both. Empty rectangles are ignored.
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rectangle::new(
            self.x_min.min(other.x_min),
            self.x_max.max(other.x_max),
            self.y_min.min(other.y_min),
            self.y_max.max(other.y_max),
        )
    }

    pub fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        let bits = cursor.read_bits(5)?;
        let rect = Rectangle::new(
            cursor.read_sbits(bits)?,
            cursor.read_sbits(bits)?,
            cursor.read_sbits(bits)?,
            cursor.read_sbits(bits)?,
        );
        cursor.align();
        Ok(rect)
    }
}

/// 2x3 affine matrix. Translation is in twips.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotate_skew0: f64,
    pub rotate_skew1: f64,
    pub translate_x: i32,
    pub translate_y: i32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        scale_x: 1.0,
        scale_y: 1.0,
        rotate_skew0: 0.0,
        rotate_skew1: 0.0,
        translate_x: 0,
        translate_y: 0,
    };

    pub fn translate(x: i32, y: i32) -> Self {
        Self {
            translate_x: x,
            translate_y: y,
            ..Self::IDENTITY
        }
    }

    pub fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        let mut matrix = Matrix::IDENTITY;
        if cursor.read_bool()? {
            let bits = cursor.read_bits(5)?;
            matrix.scale_x = cursor.read_fbits(bits)?;
            matrix.scale_y = cursor.read_fbits(bits)?;
        }
        if cursor.read_bool()? {
            let bits = cursor.read_bits(5)?;
            matrix.rotate_skew0 = cursor.read_fbits(bits)?;
            matrix.rotate_skew1 = cursor.read_fbits(bits)?;
        }
        let bits = cursor.read_bits(5)?;
        matrix.translate_x = cursor.read_sbits(bits)?;
        matrix.translate_y = cursor.read_sbits(bits)?;
        cursor.align();
        Ok(matrix)
    }
}

/// Per channel multiply-then-add color transform.
///
/// Multipliers are 8.8 fixed point (256 is 1.0), additive terms are in color units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorTransform {
    /// Red, green, blue, alpha.
    pub mult: [i16; 4],
    pub add: [i16; 4],
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ColorTransform {
    pub const IDENTITY: ColorTransform = ColorTransform {
        mult: [256; 4],
        add: [0; 4],
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Reads a `CXFORM` (`with_alpha == false`) or `CXFORMWITHALPHA` record.
    pub fn read(cursor: &mut Cursor<'_>, with_alpha: bool) -> Result<Self> {
        let has_add = cursor.read_bool()?;
        let has_mult = cursor.read_bool()?;
        let bits = cursor.read_bits(4)?;
        let channels = if with_alpha { 4 } else { 3 };
        let mut transform = Self::IDENTITY;
        if has_mult {
            for channel in transform.mult.iter_mut().take(channels) {
                *channel = cursor.read_sbits(bits)? as i16;
            }
        }
        if has_add {
            for channel in transform.add.iter_mut().take(channels) {
                *channel = cursor.read_sbits(bits)? as i16;
            }
        }
        cursor.align();
        Ok(transform)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Normal,
    Layer,
    Multiply,
    Screen,
    Lighten,
    Darken,
    Difference,
    Add,
    Subtract,
    Invert,
    Alpha,
    Erase,
    Overlay,
    HardLight,
}

impl BlendMode {
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 | 1 => BlendMode::Normal,
            2 => BlendMode::Layer,
            3 => BlendMode::Multiply,
            4 => BlendMode::Screen,
            5 => BlendMode::Lighten,
            6 => BlendMode::Darken,
            7 => BlendMode::Difference,
            8 => BlendMode::Add,
            9 => BlendMode::Subtract,
            10 => BlendMode::Invert,
            11 => BlendMode::Alpha,
            12 => BlendMode::Erase,
            13 => BlendMode::Overlay,
            14 => BlendMode::HardLight,
            _ => return None,
        })
    }
}

/// Surface filter attached to a placement. Only framing is decoded: the parameters stay raw.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Filter {
    pub kind: FilterKind,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    DropShadow,
    Blur,
    Glow,
    Bevel,
    GradientGlow,
    Convolution,
    ColorMatrix,
    GradientBevel,
}

impl Filter {
    pub fn read_list(cursor: &mut Cursor<'_>) -> Result<Vec<Filter>> {
        let count = cursor.read_u8()?;
        let mut filters = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let offset = cursor.offset();
            let kind = match cursor.read_u8()? {
                0 => FilterKind::DropShadow,
                1 => FilterKind::Blur,
                2 => FilterKind::Glow,
                3 => FilterKind::Bevel,
                4 => FilterKind::GradientGlow,
                5 => FilterKind::Convolution,
                6 => FilterKind::ColorMatrix,
                7 => FilterKind::GradientBevel,
                other => {
                    cursor
                        .flags()
                        .check(Error::invalid(offset, format!("unknown filter {other}")))?;
                    break;
                }
            };
            let start = cursor.offset();
            let length = match kind {
                FilterKind::DropShadow => 23,
                FilterKind::Blur => 9,
                FilterKind::Glow => 15,
                FilterKind::Bevel => 27,
                FilterKind::ColorMatrix => 80,
                FilterKind::GradientGlow | FilterKind::GradientBevel => {
                    let colors = cursor.read_u8()? as usize;
                    1 + colors * 5 + 19
                }
                FilterKind::Convolution => {
                    let x = cursor.read_u8()? as usize;
                    let y = cursor.read_u8()? as usize;
                    2 + 8 + x * y * 4 + 5
                }
            };
            // Length prefixes read above are part of the raw parameters.
            let consumed = cursor.offset() - start;
            let mut data = cursor.data()[start..cursor.offset()].to_vec();
            data.extend_from_slice(cursor.read_bytes(length - consumed)?);
            filters.push(Filter { kind, data });
        }
        Ok(filters)
    }
}
