//! swf-core: characters, timelines and drawing on top of `swf-data` tags.
//!
//! The [`Extractor`] is the entry point: it finds shapes, sprites and bitmaps in a movie,
//! binds them into [`Character`]s and replays display lists into [`Timeline`]s that can
//! be drawn into any [`DrawingSink`].

pub mod bitmap;
pub mod color;
pub mod config;
pub mod drawable;
pub mod extractor;
pub mod fill;
pub mod geometry;
pub mod shape;
pub mod sink;
pub mod sprite;
pub mod timeline;

pub use bitmap::ImageDefinition;
pub use color::ColorTransformExt;
pub use config::ExtractOptions;
pub use drawable::{Character, Drawable, MissingCharacter};
pub use extractor::{ExportMap, Extractor, ExtractorBuilder, ImageMap, ShapeMap, SpriteMap};
pub use fill::{BitmapFill, Fill, GradientFill};
pub use shape::{Shape, ShapeDefinition, Stroke};
pub use sink::{DrawCommand, DrawingSink};
pub use sprite::SpriteDefinition;
pub use timeline::{Frame, FrameObject, Timeline, TimelineProcessor};
