//! Drawing sink: where a drawn frame goes.

use crate::shape::Shape;
use crate::timeline::FrameObject;
use image::RgbaImage;
use serde::Serialize;
use swf_data::{BlendMode, Matrix, Rectangle};

/// Receives the leaves of a drawn display list, in depth order.
///
/// Every placed object is bracketed by `begin_object`/`end_object`; nested sprites
/// produce nested brackets.
pub trait DrawingSink {
    fn begin_object(&mut self, object: &FrameObject);
    fn end_object(&mut self);
    fn shape(&mut self, shape: &Shape);
    fn image(&mut self, id: u16, pixels: &RgbaImage);
}

/// Recorded sink event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    BeginObject {
        depth: u16,
        character_id: u16,
        matrix: Matrix,
        blend_mode: BlendMode,
        clip_depth: Option<u16>,
    },
    EndObject,
    Shape {
        id: u16,
        bounds: Rectangle,
        /// Fill identity hashes, fills then strokes.
        fills: Vec<String>,
    },
    Image {
        id: u16,
        width: u32,
        height: u32,
    },
}

impl DrawingSink for Vec<DrawCommand> {
    fn begin_object(&mut self, object: &FrameObject) {
        self.push(DrawCommand::BeginObject {
            depth: object.depth,
            character_id: object.character_id,
            matrix: object.matrix,
            blend_mode: object.blend_mode,
            clip_depth: object.clip_depth,
        });
    }

    fn end_object(&mut self) {
        self.push(DrawCommand::EndObject);
    }

    fn shape(&mut self, shape: &Shape) {
        let fills = shape
            .fills
            .iter()
            .chain(shape.strokes.iter().map(|stroke| &stroke.fill))
            .map(|fill| fill.hash())
            .collect();
        self.push(DrawCommand::Shape {
            id: shape.id,
            bounds: shape.bounds,
            fills,
        });
    }

    fn image(&mut self, id: u16, pixels: &RgbaImage) {
        self.push(DrawCommand::Image {
            id,
            width: pixels.width(),
            height: pixels.height(),
        });
    }
}
