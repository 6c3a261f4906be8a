use crate::drawable::Drawable;
use crate::extractor::{Extractor, Library};
use crate::sink::DrawingSink;
use crate::timeline::Timeline;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use swf_data::{ColorTransform, DefineSprite, Rectangle, Result};

enum SpriteState {
    Unresolved(Weak<Library>),
    /// Timeline construction in progress. Reaching this state again means a cycle.
    Resolving(Weak<Library>),
    Resolved(Rc<Timeline>),
}

/// A sprite character. Its timeline is built on first use and kept.
pub struct SpriteDefinition {
    tag: Rc<DefineSprite>,
    offset: usize,
    state: RefCell<SpriteState>,
}

impl fmt::Debug for SpriteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.state.borrow() {
            SpriteState::Unresolved(_) => "unresolved",
            SpriteState::Resolving(_) => "resolving",
            SpriteState::Resolved(_) => "resolved",
        };
        f.debug_struct("SpriteDefinition")
            .field("id", &self.tag.id)
            .field("offset", &self.offset)
            .field("state", &state)
            .finish()
    }
}

impl SpriteDefinition {
    pub(crate) fn new(tag: Rc<DefineSprite>, offset: usize, library: Weak<Library>) -> Self {
        Self {
            tag,
            offset,
            state: RefCell::new(SpriteState::Unresolved(library)),
        }
    }

    pub fn id(&self) -> u16 {
        self.tag.id
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Frame count declared by the tag, which may disagree with the timeline.
    pub fn declared_frames(&self) -> u16 {
        self.tag.frame_count
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.state.borrow(), SpriteState::Resolved(_))
    }

    pub fn timeline(&self) -> Result<Rc<Timeline>> {
        let (library, reentered) = match &*self.state.borrow() {
            SpriteState::Resolved(timeline) => return Ok(timeline.clone()),
            SpriteState::Resolving(library) => (library.clone(), true),
            SpriteState::Unresolved(library) => (library.clone(), false),
        };
        let extractor = Extractor::upgrade(&library)?;
        if reentered {
            extractor.circular_reference(self.tag.id)?;
            return Ok(Rc::new(Timeline::empty()));
        }

        *self.state.borrow_mut() = SpriteState::Resolving(library.clone());
        match extractor.resolve_sprite(&self.tag) {
            Ok(timeline) => {
                *self.state.borrow_mut() = SpriteState::Resolved(timeline.clone());
                Ok(timeline)
            }
            Err(error) => {
                *self.state.borrow_mut() = SpriteState::Unresolved(library);
                Err(error)
            }
        }
    }
}

impl Drawable for SpriteDefinition {
    fn bounds(&self) -> Result<Rectangle> {
        self.timeline()?.bounds()
    }

    fn frames_count(&self, recursive: bool) -> Result<usize> {
        self.timeline()?.frames_count(recursive)
    }

    fn draw(&self, sink: &mut dyn DrawingSink, frame: usize) -> Result<()> {
        self.timeline()?.draw(sink, frame)
    }

    fn transform_colors(&self, transform: &ColorTransform) -> Result<Self> {
        let timeline = self.timeline()?;
        let timeline = if transform.is_identity() {
            timeline
        } else {
            Rc::new(timeline.transform_colors(transform)?)
        };
        Ok(Self {
            tag: self.tag.clone(),
            offset: self.offset,
            state: RefCell::new(SpriteState::Resolved(timeline)),
        })
    }
}
