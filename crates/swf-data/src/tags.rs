//! Decoded tag payloads.

use crate::model::{BlendMode, ColorTransform, Filter, Matrix, Rectangle, Rgba};
use serde::Serialize;
use std::rc::Rc;

/// A decoded tag. Tags without a structural decoder keep their payload as [`RawTag`].
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    ShowFrame,
    DefineShape(Rc<DefineShape>),
    DefineSprite(Rc<DefineSprite>),
    DefineBits(Rc<DefineBits>),
    DefineBitsLossless(Rc<DefineBitsLossless>),
    JpegTables(Vec<u8>),
    PlaceObject(Box<PlaceObject>),
    RemoveObject(RemoveObject),
    FrameLabel(FrameLabel),
    SetBackgroundColor(Rgba),
    ExportAssets(Vec<SymbolEntry>),
    SymbolClass(Vec<SymbolEntry>),
    /// Known tag type whose payload is opaque to this crate (fonts, sounds, bytecode...).
    Raw(RawTag),
    /// Tag type missing from the decode table.
    Unknown(RawTag),
}

impl Tag {
    /// Id of the character defined by this tag.
    pub fn character_id(&self) -> Option<u16> {
        match self {
            Tag::DefineShape(shape) => Some(shape.id),
            Tag::DefineSprite(sprite) => Some(sprite.id),
            Tag::DefineBits(bits) => Some(bits.id),
            Tag::DefineBitsLossless(bits) => Some(bits.id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTag {
    pub tag_type: u16,
    pub offset: usize,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolEntry {
    pub id: u16,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameLabel {
    pub name: String,
    pub anchor: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefineSprite {
    pub id: u16,
    pub frame_count: u16,
    /// Control tags of the sprite timeline, `End` excluded.
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefineShape {
    /// 1 to 4, following `DefineShape`, `DefineShape2`...
    pub version: u8,
    pub id: u16,
    pub bounds: Rectangle,
    pub edge_bounds: Option<Rectangle>,
    pub fill_styles: Vec<FillStyle>,
    pub line_styles: Vec<LineStyle>,
    /// Outline records, left undecoded.
    pub records: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FillStyle {
    Solid(Rgba),
    LinearGradient {
        matrix: Matrix,
        gradient: Gradient,
    },
    RadialGradient {
        matrix: Matrix,
        gradient: Gradient,
    },
    FocalGradient {
        matrix: Matrix,
        gradient: Gradient,
        focal_point: f64,
    },
    Bitmap {
        id: u16,
        matrix: Matrix,
        smoothed: bool,
        repeating: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Gradient {
    pub spread: u8,
    pub interpolation: u8,
    pub records: Vec<GradientRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GradientRecord {
    pub ratio: u8,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    /// Twips.
    pub width: u16,
    pub color: Rgba,
    /// `LINESTYLE2` fill, replacing `color`.
    pub fill: Option<FillStyle>,
    /// Raw `LINESTYLE2` cap/join/scale flags.
    pub flags: u16,
    pub miter_limit: Option<f64>,
}

/// `DefineBits` (version 1, needs `JPEGTables`) and `DefineBitsJPEG2/3/4`.
#[derive(Debug, Clone, PartialEq)]
pub struct DefineBits {
    pub version: u8,
    pub id: u16,
    pub deblock: Option<f64>,
    /// JPEG, PNG or GIF data.
    pub image_data: Vec<u8>,
    /// Zlib compressed alpha plane.
    pub alpha_data: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefineBitsLossless {
    /// 1 for RGB, 2 for ARGB.
    pub version: u8,
    pub id: u16,
    pub format: u8,
    pub width: u16,
    pub height: u16,
    pub color_table_size: Option<u8>,
    /// Zlib compressed color table and pixels.
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaceObject {
    pub version: u8,
    pub depth: u16,
    pub character_id: Option<u16>,
    /// Modify the object already at `depth` instead of placing a new one.
    pub is_move: bool,
    pub matrix: Option<Matrix>,
    pub color_transform: Option<ColorTransform>,
    pub ratio: Option<u16>,
    pub name: Option<String>,
    pub clip_depth: Option<u16>,
    pub class_name: Option<String>,
    pub filters: Option<Vec<Filter>>,
    pub blend_mode: Option<BlendMode>,
    pub cache_as_bitmap: Option<bool>,
    pub visible: Option<bool>,
    pub background_color: Option<Rgba>,
    /// Clip event handlers (bytecode), left undecoded.
    pub clip_actions: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveObject {
    pub depth: u16,
    /// Only present in `RemoveObject` version 1.
    pub character_id: Option<u16>,
}
