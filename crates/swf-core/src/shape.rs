use crate::drawable::Drawable;
use crate::extractor::{Extractor, Library};
use crate::fill::Fill;
use crate::sink::DrawingSink;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use swf_data::{ColorTransform, DefineShape, Rectangle, Result};

/// A shape with its fills bound to the movie images.
#[derive(Debug, Clone)]
pub struct Shape {
    pub id: u16,
    pub bounds: Rectangle,
    pub fills: Vec<Fill>,
    pub strokes: Vec<Stroke>,
    /// Outline records, as stored in the movie.
    pub records: Rc<[u8]>,
}

#[derive(Debug, Clone)]
pub struct Stroke {
    /// Twips.
    pub width: u16,
    pub fill: Fill,
    /// Cap, join and scaling flags of `LINESTYLE2`.
    pub flags: u16,
    pub miter_limit: Option<f64>,
}

impl Shape {
    pub fn transform_colors(&self, transform: &ColorTransform) -> Result<Shape> {
        let fills = self
            .fills
            .iter()
            .map(|fill| fill.transform_colors(transform))
            .collect::<Result<Vec<_>>>()?;
        let strokes = self
            .strokes
            .iter()
            .map(|stroke| {
                Ok(Stroke {
                    fill: stroke.fill.transform_colors(transform)?,
                    ..stroke.clone()
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Shape {
            fills,
            strokes,
            ..self.clone()
        })
    }
}

enum ShapeState {
    Pending(Weak<Library>),
    Ready(Rc<Shape>),
}

/// A shape character. Fills are bound on first use.
pub struct ShapeDefinition {
    tag: Rc<DefineShape>,
    offset: usize,
    state: RefCell<ShapeState>,
}

impl fmt::Debug for ShapeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ready = matches!(*self.state.borrow(), ShapeState::Ready(_));
        f.debug_struct("ShapeDefinition")
            .field("id", &self.tag.id)
            .field("offset", &self.offset)
            .field("ready", &ready)
            .finish()
    }
}

impl ShapeDefinition {
    pub(crate) fn new(tag: Rc<DefineShape>, offset: usize, library: Weak<Library>) -> Self {
        Self {
            tag,
            offset,
            state: RefCell::new(ShapeState::Pending(library)),
        }
    }

    pub fn id(&self) -> u16 {
        self.tag.id
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn tag(&self) -> &DefineShape {
        &self.tag
    }

    pub fn shape(&self) -> Result<Rc<Shape>> {
        let library = match &*self.state.borrow() {
            ShapeState::Ready(shape) => return Ok(shape.clone()),
            ShapeState::Pending(library) => library.clone(),
        };
        let extractor = Extractor::upgrade(&library)?;
        let images = extractor.images()?;

        let fills = self.tag.fill_styles.iter().map(|style| Fill::resolve(style, &images)).collect();
        let strokes = self
            .tag
            .line_styles
            .iter()
            .map(|line| Stroke {
                width: line.width,
                fill: match &line.fill {
                    Some(style) => Fill::resolve(style, &images),
                    None => Fill::Solid(line.color),
                },
                flags: line.flags,
                miter_limit: line.miter_limit,
            })
            .collect();
        let shape = Rc::new(Shape {
            id: self.tag.id,
            bounds: self.tag.bounds,
            fills,
            strokes,
            records: Rc::from(self.tag.records.as_slice()),
        });
        *self.state.borrow_mut() = ShapeState::Ready(shape.clone());
        Ok(shape)
    }
}

impl Drawable for ShapeDefinition {
    fn bounds(&self) -> Result<Rectangle> {
        Ok(self.tag.bounds)
    }

    fn frames_count(&self, _recursive: bool) -> Result<usize> {
        Ok(1)
    }

    fn draw(&self, sink: &mut dyn DrawingSink, _frame: usize) -> Result<()> {
        sink.shape(&*self.shape()?);
        Ok(())
    }

    fn transform_colors(&self, transform: &ColorTransform) -> Result<Self> {
        let shape = self.shape()?;
        let shape = if transform.is_identity() {
            shape
        } else {
            Rc::new(shape.transform_colors(transform)?)
        };
        Ok(Self {
            tag: self.tag.clone(),
            offset: self.offset,
            state: RefCell::new(ShapeState::Ready(shape)),
        })
    }
}
