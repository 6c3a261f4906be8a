//! The capability set shared by every character and timeline.

use crate::bitmap::ImageDefinition;
use crate::shape::ShapeDefinition;
use crate::sink::DrawingSink;
use crate::sprite::SpriteDefinition;
use std::rc::Rc;
use swf_data::{ColorTransform, Rectangle, Result};

pub trait Drawable {
    /// Bounds in twips, in the drawable's own coordinate space.
    fn bounds(&self) -> Result<Rectangle>;

    /// Number of frames. With `recursive`, the longest nested timeline counts too.
    fn frames_count(&self, recursive: bool) -> Result<usize>;

    /// Emits `frame` to `sink`. Frame numbers wrap around the timeline length.
    fn draw(&self, sink: &mut dyn DrawingSink, frame: usize) -> Result<()>;

    /// A copy with `transform` baked into every color. The receiver is left untouched.
    fn transform_colors(&self, transform: &ColorTransform) -> Result<Self>
    where
        Self: Sized;
}

/// A resolved character id.
#[derive(Debug, Clone)]
pub enum Character {
    Shape(Rc<ShapeDefinition>),
    Sprite(Rc<SpriteDefinition>),
    Image(Rc<ImageDefinition>),
    /// Id with no definition in the movie.
    Missing(MissingCharacter),
}

/// Stand-in for a character id nothing defines: empty, single frame, draws nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingCharacter {
    pub id: u16,
}

impl Character {
    pub fn id(&self) -> u16 {
        match self {
            Character::Shape(shape) => shape.id(),
            Character::Sprite(sprite) => sprite.id(),
            Character::Image(image) => image.id(),
            Character::Missing(missing) => missing.id,
        }
    }

    /// Offset of the defining tag, `None` for missing characters.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Character::Shape(shape) => Some(shape.offset()),
            Character::Sprite(sprite) => Some(sprite.offset()),
            Character::Image(image) => Some(image.offset()),
            Character::Missing(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Character::Shape(_) => "shape",
            Character::Sprite(_) => "sprite",
            Character::Image(_) => "image",
            Character::Missing(_) => "missing",
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Character::Missing(_))
    }

    /// Same definition, not just the same id.
    pub fn ptr_eq(&self, other: &Character) -> bool {
        match (self, other) {
            (Character::Shape(a), Character::Shape(b)) => Rc::ptr_eq(a, b),
            (Character::Sprite(a), Character::Sprite(b)) => Rc::ptr_eq(a, b),
            (Character::Image(a), Character::Image(b)) => Rc::ptr_eq(a, b),
            (Character::Missing(a), Character::Missing(b)) => a == b,
            _ => false,
        }
    }

    /// Address of the shared definition, used to memoize per-definition work.
    pub(crate) fn address(&self) -> usize {
        match self {
            Character::Shape(shape) => Rc::as_ptr(shape) as usize,
            Character::Sprite(sprite) => Rc::as_ptr(sprite) as usize,
            Character::Image(image) => Rc::as_ptr(image) as usize,
            Character::Missing(missing) => usize::from(missing.id),
        }
    }
}

impl Drawable for Character {
    fn bounds(&self) -> Result<Rectangle> {
        match self {
            Character::Shape(shape) => shape.bounds(),
            Character::Sprite(sprite) => sprite.bounds(),
            Character::Image(image) => image.bounds(),
            Character::Missing(missing) => missing.bounds(),
        }
    }

    fn frames_count(&self, recursive: bool) -> Result<usize> {
        match self {
            Character::Shape(shape) => shape.frames_count(recursive),
            Character::Sprite(sprite) => sprite.frames_count(recursive),
            Character::Image(image) => image.frames_count(recursive),
            Character::Missing(missing) => missing.frames_count(recursive),
        }
    }

    fn draw(&self, sink: &mut dyn DrawingSink, frame: usize) -> Result<()> {
        match self {
            Character::Shape(shape) => shape.draw(sink, frame),
            Character::Sprite(sprite) => sprite.draw(sink, frame),
            Character::Image(image) => image.draw(sink, frame),
            Character::Missing(missing) => missing.draw(sink, frame),
        }
    }

    fn transform_colors(&self, transform: &ColorTransform) -> Result<Self> {
        Ok(match self {
            Character::Shape(shape) => Character::Shape(Rc::new(shape.transform_colors(transform)?)),
            Character::Sprite(sprite) => Character::Sprite(Rc::new(sprite.transform_colors(transform)?)),
            Character::Image(image) => Character::Image(Rc::new(image.transform_colors(transform)?)),
            Character::Missing(missing) => Character::Missing(*missing),
        })
    }
}

impl Drawable for MissingCharacter {
    fn bounds(&self) -> Result<Rectangle> {
        Ok(Rectangle::ZERO)
    }

    fn frames_count(&self, _recursive: bool) -> Result<usize> {
        Ok(1)
    }

    fn draw(&self, _sink: &mut dyn DrawingSink, _frame: usize) -> Result<()> {
        Ok(())
    }

    fn transform_colors(&self, _transform: &ColorTransform) -> Result<Self> {
        Ok(*self)
    }
}
