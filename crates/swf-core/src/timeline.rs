//! Display list replay: control tags in, frame snapshots out.

use crate::color::ColorTransformExt;
use crate::drawable::{Character, Drawable};
use crate::extractor::Extractor;
use crate::geometry::transform_bounds;
use crate::sink::DrawingSink;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;
use swf_data::{BlendMode, ColorTransform, Error, Filter, Matrix, PlaceObject, Rectangle, Result, Tag};
use tracing::trace;

/// A character placed on the display list.
#[derive(Debug, Clone)]
pub struct FrameObject {
    pub depth: u16,
    pub character_id: u16,
    pub character: Character,
    pub matrix: Matrix,
    pub color_transform: Option<ColorTransform>,
    pub ratio: Option<u16>,
    pub name: Option<String>,
    /// Masks every depth up to this one.
    pub clip_depth: Option<u16>,
    pub filters: Vec<Filter>,
    pub blend_mode: BlendMode,
    pub visible: bool,
    /// Character bounds through `matrix`.
    pub bounds: Rectangle,
}

impl FrameObject {
    fn new(depth: u16, character_id: u16, character: Character) -> Self {
        Self {
            depth,
            character_id,
            character,
            matrix: Matrix::IDENTITY,
            color_transform: None,
            ratio: None,
            name: None,
            clip_depth: None,
            filters: Vec::new(),
            blend_mode: BlendMode::Normal,
            visible: true,
            bounds: Rectangle::ZERO,
        }
    }

    fn apply(&mut self, place: &PlaceObject) {
        if let Some(matrix) = place.matrix {
            self.matrix = matrix;
        }
        if let Some(color_transform) = place.color_transform {
            self.color_transform = Some(color_transform);
        }
        if place.ratio.is_some() {
            self.ratio = place.ratio;
        }
        if let Some(name) = &place.name {
            self.name = Some(name.clone());
        }
        if place.clip_depth.is_some() {
            self.clip_depth = place.clip_depth;
        }
        if let Some(filters) = &place.filters {
            self.filters = filters.clone();
        }
        if let Some(blend_mode) = place.blend_mode {
            self.blend_mode = blend_mode;
        }
        if let Some(visible) = place.visible {
            self.visible = visible;
        }
    }

    fn transform_colors(&self, transform: &ColorTransform, memo: &mut HashMap<(usize, ColorTransform), Character>) -> Result<Self> {
        let combined = match &self.color_transform {
            Some(own) => transform.compose(own),
            None => *transform,
        };
        let key = (self.character.address(), combined);
        let character = match memo.get(&key) {
            Some(character) => character.clone(),
            None => {
                let character = self.character.transform_colors(&combined)?;
                memo.insert(key, character.clone());
                character
            }
        };
        Ok(Self {
            character,
            color_transform: None,
            ..self.clone()
        })
    }
}

/// Display list snapshot taken at a `ShowFrame`.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: usize,
    pub label: Option<String>,
    /// Keyed by depth, drawn in ascending order.
    pub objects: BTreeMap<u16, FrameObject>,
    pub bounds: Rectangle,
}

/// Ordered frames of the root movie or of a sprite. Never empty.
#[derive(Debug, Clone)]
pub struct Timeline {
    bounds: Rectangle,
    frames: Rc<[Frame]>,
}

impl Timeline {
    pub fn new(frames: Vec<Frame>) -> Self {
        if frames.is_empty() {
            return Self::empty();
        }
        let bounds = frames.iter().fold(Rectangle::ZERO, |bounds, frame| bounds.union(&frame.bounds));
        Self {
            bounds,
            frames: frames.into(),
        }
    }

    /// One empty frame with zero bounds.
    pub fn empty() -> Self {
        Self {
            bounds: Rectangle::ZERO,
            frames: Rc::new([Frame {
                index: 0,
                label: None,
                objects: BTreeMap::new(),
                bounds: Rectangle::ZERO,
            }]),
        }
    }

    /// Same frames, reported with `bounds`.
    pub fn with_bounds(&self, bounds: Rectangle) -> Self {
        Self {
            bounds,
            frames: self.frames.clone(),
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Frame `index`, wrapping around the timeline length.
    pub fn frame(&self, index: usize) -> &Frame {
        &self.frames[index % self.frames.len()]
    }

    pub fn frame_by_label(&self, label: &str) -> Option<&Frame> {
        self.frames.iter().find(|frame| frame.label.as_deref() == Some(label))
    }
}

impl Drawable for Timeline {
    fn bounds(&self) -> Result<Rectangle> {
        Ok(self.bounds)
    }

    fn frames_count(&self, recursive: bool) -> Result<usize> {
        let mut count = self.frames.len();
        if recursive {
            let mut seen = HashSet::new();
            for object in self.frames.iter().flat_map(|frame| frame.objects.values()) {
                if seen.insert(object.character.address()) {
                    count = count.max(object.character.frames_count(true)?);
                }
            }
        }
        Ok(count)
    }

    fn draw(&self, sink: &mut dyn DrawingSink, frame: usize) -> Result<()> {
        for object in self.frame(frame).objects.values() {
            if !object.visible {
                continue;
            }
            sink.begin_object(object);
            object.character.draw(sink, frame)?;
            sink.end_object();
        }
        Ok(())
    }

    fn transform_colors(&self, transform: &ColorTransform) -> Result<Self> {
        if transform.is_identity() {
            return Ok(self.clone());
        }
        let mut memo = HashMap::new();
        let frames = self
            .frames
            .iter()
            .map(|frame| {
                let objects = frame
                    .objects
                    .iter()
                    .map(|(depth, object)| Ok((*depth, object.transform_colors(transform, &mut memo)?)))
                    .collect::<Result<BTreeMap<_, _>>>()?;
                Ok(Frame { objects, ..frame.clone() })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            bounds: self.bounds,
            frames: frames.into(),
        })
    }
}

/// Replays control tags into a [`Timeline`], resolving placed ids through the extractor.
pub struct TimelineProcessor<'e> {
    extractor: &'e Extractor,
}

impl<'e> TimelineProcessor<'e> {
    pub fn new(extractor: &'e Extractor) -> Self {
        Self { extractor }
    }

    pub fn process<'t>(&self, tags: impl IntoIterator<Item = &'t Tag>) -> Result<Timeline> {
        let mut display: BTreeMap<u16, FrameObject> = BTreeMap::new();
        let mut frames = Vec::new();
        let mut label = None;
        let mut pending = false;

        for tag in tags {
            match tag {
                Tag::ShowFrame => {
                    frames.push(snapshot(frames.len(), label.take(), &display));
                    pending = false;
                }
                Tag::PlaceObject(place) => {
                    self.place(&mut display, place)?;
                    pending = true;
                }
                Tag::RemoveObject(remove) => {
                    display.remove(&remove.depth);
                    pending = true;
                }
                Tag::FrameLabel(frame_label) => {
                    label = Some(frame_label.name.clone());
                    pending = true;
                }
                _ => {}
            }
        }
        if pending || frames.is_empty() {
            frames.push(snapshot(frames.len(), label, &display));
        }
        trace!(frames = frames.len(), "timeline processed");
        Ok(Timeline::new(frames))
    }

    fn place(&self, display: &mut BTreeMap<u16, FrameObject>, place: &PlaceObject) -> Result<()> {
        let mut object = match (display.get(&place.depth), place.character_id) {
            (Some(current), id) if place.is_move => {
                let mut object = current.clone();
                if let Some(id) = id.filter(|id| *id != object.character_id) {
                    object.character_id = id;
                    object.character = self.extractor.character(id)?;
                }
                object
            }
            (_, Some(id)) => FrameObject::new(place.depth, id, self.extractor.character(id)?),
            (_, None) => {
                self.extractor.options().errors.check(Error::UnprocessableData(format!(
                    "nothing to modify at depth {}",
                    place.depth
                )))?;
                return Ok(());
            }
        };
        object.apply(place);
        object.bounds = transform_bounds(&object.character.bounds()?, &object.matrix);
        display.insert(place.depth, object);
        Ok(())
    }
}

fn snapshot(index: usize, label: Option<String>, display: &BTreeMap<u16, FrameObject>) -> Frame {
    let bounds = display
        .values()
        .fold(Rectangle::ZERO, |bounds, object| bounds.union(&object.bounds));
    Frame {
        index,
        label,
        objects: display.clone(),
        bounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractOptions;
    use swf_data::{FrameLabel, RemoveObject};

    fn extractor(options: ExtractOptions) -> Extractor {
        Extractor::builder(Vec::new()).options(options).build()
    }

    fn place(depth: u16, id: Option<u16>, is_move: bool, matrix: Option<Matrix>) -> Tag {
        Tag::PlaceObject(Box::new(PlaceObject {
            version: 2,
            depth,
            character_id: id,
            is_move,
            matrix,
            ..Default::default()
        }))
    }

    #[test]
    fn test_place_move_remove() {
        let extractor = extractor(ExtractOptions::default());
        let tags = vec![
            place(1, Some(10), false, None),
            place(2, Some(11), false, None),
            Tag::ShowFrame,
            place(1, None, true, Some(Matrix::translate(40, 0))),
            Tag::RemoveObject(RemoveObject {
                depth: 2,
                character_id: None,
            }),
            Tag::FrameLabel(FrameLabel {
                name: "end".into(),
                anchor: false,
            }),
            Tag::ShowFrame,
        ];
        let timeline = TimelineProcessor::new(&extractor).process(&tags).unwrap();
        assert_eq!(timeline.frames().len(), 2);

        let first = &timeline.frames()[0];
        assert_eq!(first.objects.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert!(first.objects[&1].character.is_missing());

        let second = timeline.frame_by_label("end").unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(second.objects.len(), 1);
        assert_eq!(second.objects[&1].character_id, 10);
        assert_eq!(second.objects[&1].matrix, Matrix::translate(40, 0));
    }

    #[test]
    fn test_trailing_changes_make_a_frame() {
        let extractor = extractor(ExtractOptions::default());
        let tags = vec![Tag::ShowFrame, place(1, Some(3), false, None)];
        let timeline = TimelineProcessor::new(&extractor).process(&tags).unwrap();
        assert_eq!(timeline.frames().len(), 2);
        assert_eq!(timeline.frame(3).index, 1);
    }

    #[test]
    fn test_empty_tags_make_one_frame() {
        let extractor = extractor(ExtractOptions::default());
        let timeline = TimelineProcessor::new(&extractor).process(&Vec::<Tag>::new()).unwrap();
        assert_eq!(timeline.frames_count(false).unwrap(), 1);
        assert_eq!(timeline.bounds().unwrap(), Rectangle::ZERO);
    }

    #[test]
    fn test_move_without_object() {
        let tags = vec![place(4, None, true, None), Tag::ShowFrame];

        let strict = extractor(ExtractOptions::default());
        assert!(matches!(
            TimelineProcessor::new(&strict).process(&tags),
            Err(Error::UnprocessableData(_))
        ));

        let lenient = extractor(ExtractOptions::lenient());
        let timeline = TimelineProcessor::new(&lenient).process(&tags).unwrap();
        assert!(timeline.frames()[0].objects.is_empty());
    }

    #[test]
    fn test_with_bounds_shares_frames() {
        let timeline = Timeline::empty();
        let stage = Rectangle::new(0, 100, 0, 100);
        let resized = timeline.with_bounds(stage);
        assert_eq!(resized.bounds().unwrap(), stage);
        assert!(Rc::ptr_eq(&timeline.frames, &resized.frames));
    }
}
