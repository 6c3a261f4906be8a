//! Character resolution over one movie.
//!
//! The extractor scans the tag stream on demand and keeps what it finds: one scan per
//! character kind, one decode per tag. [`Extractor::release`] drops the per-kind
//! caches but decoded tags are kept, so a later rescan never decodes twice.

use crate::bitmap::ImageDefinition;
use crate::config::ExtractOptions;
use crate::drawable::{Character, MissingCharacter};
use crate::shape::ShapeDefinition;
use crate::sprite::SpriteDefinition;
use crate::timeline::{Timeline, TimelineProcessor};
use std::cell::{Cell, RefCell};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};
use swf_data::{
    decode_tag, read_all_tags, Cursor, DecodeTable, DefineSprite, Error, Rectangle, Result, SwfFile, Tag, TagRecord,
    TagType,
};
use tracing::{debug, instrument, warn};

pub type ShapeMap = BTreeMap<u16, Rc<ShapeDefinition>>;
pub type SpriteMap = BTreeMap<u16, Rc<SpriteDefinition>>;
pub type ImageMap = BTreeMap<u16, Rc<ImageDefinition>>;
pub type ExportMap = BTreeMap<String, u16>;

const DEFAULT_VERSION: u8 = 10;

pub(crate) struct Library {
    data: Vec<u8>,
    start: usize,
    end: usize,
    version: u8,
    stage: Rectangle,
    options: ExtractOptions,
    table: DecodeTable,
    /// Decoded tags by payload offset. Survives [`Extractor::release`].
    decoded: RefCell<HashMap<usize, Tag>>,
    caches: RefCell<Caches>,
    scans: Cell<usize>,
    /// Sprites whose timeline is being built, innermost last.
    resolving: RefCell<Vec<u16>>,
    /// Sprites found on a reference cycle.
    cyclic: RefCell<HashSet<u16>>,
}

#[derive(Default)]
struct Caches {
    shapes: Option<Rc<ShapeMap>>,
    sprites: Option<Rc<SpriteMap>>,
    images: Option<Rc<ImageMap>>,
    characters: Option<Rc<HashMap<u16, Character>>>,
    exported: Option<Rc<ExportMap>>,
    timeline: Option<Rc<Timeline>>,
    display_timeline: Option<Rc<Timeline>>,
}

/// Lazy, memoizing view over the characters of a movie.
///
/// Cloning is cheap and clones share their caches. Characters handed out keep working
/// while any clone is alive.
#[derive(Clone)]
pub struct Extractor {
    library: Rc<Library>,
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("version", &self.library.version)
            .field("stage", &self.library.stage)
            .field("range", &(self.library.start..self.library.end))
            .field("scans", &self.library.scans.get())
            .finish()
    }
}

pub struct ExtractorBuilder {
    data: Vec<u8>,
    start: usize,
    end: Option<usize>,
    version: u8,
    stage: Rectangle,
    options: ExtractOptions,
    table: DecodeTable,
}

impl ExtractorBuilder {
    /// Byte range of the tag stream. Defaults to the whole buffer.
    pub fn range(mut self, start: usize, end: usize) -> Self {
        self.start = start;
        self.end = Some(end);
        self
    }

    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn stage(mut self, stage: Rectangle) -> Self {
        self.stage = stage;
        self
    }

    pub fn options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn decode_table(mut self, table: DecodeTable) -> Self {
        self.table = table;
        self
    }

    pub fn build(self) -> Extractor {
        let end = self.end.unwrap_or(self.data.len()).min(self.data.len());
        let library = Library {
            start: self.start.min(end),
            end,
            data: self.data,
            version: self.version,
            stage: self.stage,
            options: self.options,
            table: self.table,
            decoded: RefCell::new(HashMap::new()),
            caches: RefCell::new(Caches::default()),
            scans: Cell::new(0),
            resolving: RefCell::new(Vec::new()),
            cyclic: RefCell::new(HashSet::new()),
        };
        Extractor {
            library: Rc::new(library),
        }
    }
}

impl Extractor {
    /// Extractor over a raw tag stream.
    pub fn builder(data: Vec<u8>) -> ExtractorBuilder {
        ExtractorBuilder {
            data,
            start: 0,
            end: None,
            version: DEFAULT_VERSION,
            stage: Rectangle::ZERO,
            options: ExtractOptions::default(),
            table: DecodeTable::standard(),
        }
    }

    pub fn new(file: SwfFile, options: ExtractOptions) -> Self {
        let end = file.data.len();
        Self::builder(file.data)
            .range(file.tags_offset, end)
            .version(file.header.version)
            .stage(file.header.frame_size)
            .options(options)
            .build()
    }

    /// Parses a complete movie file.
    pub fn from_bytes(bytes: &[u8], options: ExtractOptions) -> Result<Self> {
        Ok(Self::new(SwfFile::parse(bytes, options.errors)?, options))
    }

    pub(crate) fn upgrade(library: &Weak<Library>) -> Result<Extractor> {
        library
            .upgrade()
            .map(|library| Extractor { library })
            .ok_or_else(|| Error::UnprocessableData("character used after its extractor was dropped".into()))
    }

    fn downgrade(&self) -> Weak<Library> {
        Rc::downgrade(&self.library)
    }

    pub fn options(&self) -> ExtractOptions {
        self.library.options
    }

    pub fn version(&self) -> u8 {
        self.library.version
    }

    /// Stage bounds from the movie header.
    pub fn stage(&self) -> Rectangle {
        self.library.stage
    }

    /// Number of tag stream scans performed so far.
    pub fn scan_count(&self) -> usize {
        self.library.scans.get()
    }

    fn cursor(&self) -> Cursor<'_> {
        let library = &self.library;
        Cursor::with_range(&library.data, library.start, library.end, library.options.errors)
    }

    /// Headers of every top-level tag, without decoding payloads.
    pub fn tags(&self) -> Result<Vec<TagRecord>> {
        read_all_tags(&self.cursor(), None, true).collect()
    }

    /// Decodes every top-level tag of the given types, in stream order.
    ///
    /// Tags failing to decode abort the scan when `INVALID_TAG` is enabled and are skipped
    /// otherwise.
    #[instrument(level = "debug", skip_all, fields(kinds = types.len()))]
    pub fn scan(&self, types: &[TagType]) -> Result<Vec<(TagRecord, Tag)>> {
        let library = &self.library;
        library.scans.set(library.scans.get() + 1);

        let cursor = self.cursor();
        let mut tags = Vec::new();
        for record in read_all_tags(&cursor, None, true) {
            let record = record?;
            if !types.iter().any(|kind| kind.code() == record.tag_type) {
                continue;
            }
            match self.decode(&record, &cursor) {
                Ok(tag) => tags.push((record, tag)),
                Err(error) if !library.options.errors.tag_failure_is_fatal() => {
                    warn!(tag_type = record.tag_type, offset = record.offset, %error, "skipping invalid tag");
                }
                Err(error) => return Err(error),
            }
        }
        debug!(tags = tags.len(), "scan finished");
        Ok(tags)
    }

    fn decode(&self, record: &TagRecord, cursor: &Cursor<'_>) -> Result<Tag> {
        if let Some(tag) = self.library.decoded.borrow().get(&record.offset) {
            return Ok(tag.clone());
        }
        let tag = decode_tag(record, cursor, self.library.version, &self.library.table)?;
        self.library.decoded.borrow_mut().insert(record.offset, tag.clone());
        Ok(tag)
    }

    fn cached<T>(&self, slot: fn(&mut Caches) -> &mut Option<Rc<T>>, build: impl FnOnce() -> Result<T>) -> Result<Rc<T>> {
        if let Some(value) = slot(&mut self.library.caches.borrow_mut()) {
            return Ok(value.clone());
        }
        let value = Rc::new(build()?);
        *slot(&mut self.library.caches.borrow_mut()) = Some(value.clone());
        Ok(value)
    }

    pub fn shapes(&self) -> Result<Rc<ShapeMap>> {
        self.cached(
            |caches| &mut caches.shapes,
            || {
                let mut shapes = ShapeMap::new();
                for (record, tag) in self.scan(&TagType::SHAPES)? {
                    if let Tag::DefineShape(shape) = tag {
                        let definition = ShapeDefinition::new(shape, record.offset, self.downgrade());
                        shapes.insert(definition.id(), Rc::new(definition));
                    }
                }
                Ok(shapes)
            },
        )
    }

    pub fn sprites(&self) -> Result<Rc<SpriteMap>> {
        self.cached(
            |caches| &mut caches.sprites,
            || {
                let mut sprites = SpriteMap::new();
                for (record, tag) in self.scan(&[TagType::DefineSprite])? {
                    if let Tag::DefineSprite(sprite) = tag {
                        let definition = SpriteDefinition::new(sprite, record.offset, self.downgrade());
                        sprites.insert(definition.id(), Rc::new(definition));
                    }
                }
                Ok(sprites)
            },
        )
    }

    pub fn images(&self) -> Result<Rc<ImageMap>> {
        self.cached(
            |caches| &mut caches.images,
            || {
                let mut types = TagType::IMAGES.to_vec();
                types.push(TagType::JpegTables);

                let flags = self.library.options.errors;
                let mut tables: Option<Rc<[u8]>> = None;
                let mut images = ImageMap::new();
                for (record, tag) in self.scan(&types)? {
                    let image = match tag {
                        Tag::JpegTables(data) => {
                            tables = Some(Rc::from(data));
                            continue;
                        }
                        Tag::DefineBits(bits) => ImageDefinition::jpeg(bits, tables.clone(), record.offset, flags),
                        Tag::DefineBitsLossless(bits) => ImageDefinition::lossless(bits, record.offset, flags),
                        _ => continue,
                    };
                    images.insert(image.id(), Rc::new(image));
                }
                Ok(images)
            },
        )
    }

    /// Export and class names, mapped to character ids.
    pub fn exported(&self) -> Result<Rc<ExportMap>> {
        self.cached(
            |caches| &mut caches.exported,
            || {
                let mut exported = ExportMap::new();
                for (_, tag) in self.scan(&TagType::EXPORTS)? {
                    match tag {
                        Tag::ExportAssets(entries) => exported.extend(entries.into_iter().map(|e| (e.name, e.id))),
                        // id 0 names the class of the root timeline
                        Tag::SymbolClass(entries) => exported.extend(
                            entries
                                .into_iter()
                                .filter(|entry| entry.id != 0)
                                .map(|e| (e.name, e.id)),
                        ),
                        _ => {}
                    }
                }
                Ok(exported)
            },
        )
    }

    fn characters(&self) -> Result<Rc<HashMap<u16, Character>>> {
        self.cached(
            |caches| &mut caches.characters,
            || {
                let images = self.images()?;
                let shapes = self.shapes()?;
                let sprites = self.sprites()?;
                let candidates = images
                    .values()
                    .map(|image| Character::Image(image.clone()))
                    .chain(shapes.values().map(|shape| Character::Shape(shape.clone())))
                    .chain(sprites.values().map(|sprite| Character::Sprite(sprite.clone())));

                let mut characters: HashMap<u16, Character> = HashMap::new();
                for character in candidates {
                    match characters.entry(character.id()) {
                        Entry::Vacant(entry) => {
                            entry.insert(character);
                        }
                        Entry::Occupied(mut entry) => {
                            // the definition appearing last in the stream wins
                            if character.offset() > entry.get().offset() {
                                debug!(id = character.id(), kind = character.kind(), "character id redefined");
                                entry.insert(character);
                            }
                        }
                    }
                }
                Ok(characters)
            },
        )
    }

    /// The character defined under `id`, or a [`MissingCharacter`] placeholder.
    pub fn character(&self, id: u16) -> Result<Character> {
        Ok(match self.characters()?.get(&id) {
            Some(character) => character.clone(),
            None => {
                debug!(id, "missing character");
                Character::Missing(MissingCharacter { id })
            }
        })
    }

    /// Every defined character id, ascending.
    pub fn character_ids(&self) -> Result<Vec<u16>> {
        let mut ids: Vec<u16> = self.characters()?.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// The character exported under `name`.
    pub fn by_name(&self, name: &str) -> Result<Character> {
        let id = *self
            .exported()?
            .get(name)
            .ok_or_else(|| Error::UnknownName(name.to_string()))?;
        self.character(id)
    }

    /// The root timeline. With `use_display_bounds` it reports the stage bounds instead of
    /// the union of its frames.
    pub fn timeline(&self, use_display_bounds: bool) -> Result<Rc<Timeline>> {
        let timeline = self.cached(
            |caches| &mut caches.timeline,
            || {
                let tags: Vec<Tag> = self
                    .scan(&TagType::DISPLAY_LIST)?
                    .into_iter()
                    .map(|(_, tag)| tag)
                    .collect();
                TimelineProcessor::new(self).process(&tags)
            },
        )?;
        if !use_display_bounds {
            return Ok(timeline);
        }
        self.cached(
            |caches| &mut caches.display_timeline,
            || Ok(timeline.with_bounds(self.library.stage)),
        )
    }

    /// Drops every cached map and timeline. Decoded tags are kept.
    pub fn release(&self) {
        *self.library.caches.borrow_mut() = Caches::default();
        self.library.cyclic.borrow_mut().clear();
        debug!("caches released");
    }

    pub(crate) fn resolve_sprite(&self, sprite: &DefineSprite) -> Result<Rc<Timeline>> {
        self.library.resolving.borrow_mut().push(sprite.id);
        let result = TimelineProcessor::new(self).process(&sprite.tags);
        self.library.resolving.borrow_mut().pop();

        let timeline = result?;
        if self.library.cyclic.borrow().contains(&sprite.id) {
            warn!(sprite = sprite.id, "circular sprite reference, timeline left empty");
            return Ok(Rc::new(Timeline::empty()));
        }
        Ok(Rc::new(timeline))
    }

    /// Called when sprite `id` is reached again while its own timeline is being built.
    pub(crate) fn circular_reference(&self, id: u16) -> Result<()> {
        self.library.options.errors.check(Error::CircularReference { id })?;
        let resolving = self.library.resolving.borrow();
        if let Some(start) = resolving.iter().rposition(|sprite| *sprite == id) {
            self.library.cyclic.borrow_mut().extend(&resolving[start..]);
        }
        Ok(())
    }
}
