//! Tag dispatch: the type → decoder table and the decoders for control tags.

use crate::bitmap::{decode_bits, decode_lossless};
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::model::Rgba;
use crate::place::{decode_place_object, decode_remove_object};
use crate::shape::decode_shape;
use crate::tag::{read_all_tags, TagRecord, TagType};
use crate::tags::{DefineSprite, FrameLabel, RawTag, SymbolEntry, Tag};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Deepest sprite body a decoder may be invoked from.
const MAX_SPRITE_DEPTH: usize = 16;

/// Decodes one tag payload. The cursor covers exactly the payload.
pub type DecodeFn = fn(&mut Cursor<'_>, &DecodeContext<'_>) -> Result<Tag>;

/// What a decoder knows about the tag it is decoding.
pub struct DecodeContext<'t> {
    pub table: &'t DecodeTable,
    /// Movie version from the header.
    pub version: u8,
    pub tag_type: u16,
    /// Absolute payload offset.
    pub offset: usize,
    /// Number of enclosing sprite bodies, 0 for top-level tags.
    pub depth: usize,
}

/// Tag type → decoder lookup table.
#[derive(Clone)]
pub struct DecodeTable {
    decoders: HashMap<u16, DecodeFn>,
}

impl fmt::Debug for DecodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut codes: Vec<_> = self.decoders.keys().collect();
        codes.sort();
        f.debug_struct("DecodeTable").field("codes", &codes).finish()
    }
}

impl Default for DecodeTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl DecodeTable {
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Every known tag type. Types without a structural decoder decode to [`Tag::Raw`].
    pub fn standard() -> Self {
        let mut table = Self::empty();
        for tag in TagType::ALL {
            table.register(tag.code(), decode_raw);
        }
        for tag in TagType::SHAPES {
            table.register(tag.code(), decode_shape);
        }
        for tag in TagType::IMAGES {
            table.register(tag.code(), decode_bits);
        }
        table
            .register(TagType::DefineBitsLossless.code(), decode_lossless)
            .register(TagType::DefineBitsLossless2.code(), decode_lossless)
            .register(TagType::ShowFrame.code(), decode_show_frame)
            .register(TagType::DefineSprite.code(), decode_sprite)
            .register(TagType::PlaceObject.code(), decode_place_object)
            .register(TagType::PlaceObject2.code(), decode_place_object)
            .register(TagType::PlaceObject3.code(), decode_place_object)
            .register(TagType::RemoveObject.code(), decode_remove_object)
            .register(TagType::RemoveObject2.code(), decode_remove_object)
            .register(TagType::FrameLabel.code(), decode_frame_label)
            .register(TagType::SetBackgroundColor.code(), decode_background_color)
            .register(TagType::ExportAssets.code(), decode_symbols)
            .register(TagType::SymbolClass.code(), decode_symbols)
            .register(TagType::JpegTables.code(), decode_jpeg_tables);
        table
    }

    /// Installs or replaces the decoder of `tag_type`.
    pub fn register(&mut self, tag_type: u16, decoder: DecodeFn) -> &mut Self {
        self.decoders.insert(tag_type, decoder);
        self
    }

    pub fn get(&self, tag_type: u16) -> Option<DecodeFn> {
        self.decoders.get(&tag_type).copied()
    }

    pub fn contains(&self, tag_type: u16) -> bool {
        self.decoders.contains_key(&tag_type)
    }
}

/// Decodes the payload of `record`, read from the buffer of `cursor`.
///
/// The decoder must consume the whole payload: leftovers raise [`Error::ExtraData`]
/// when enabled and are dropped otherwise.
pub fn decode_tag(record: &TagRecord, cursor: &Cursor<'_>, version: u8, table: &DecodeTable) -> Result<Tag> {
    decode_at_depth(record, cursor, version, table, 0)
}

fn decode_at_depth(record: &TagRecord, cursor: &Cursor<'_>, version: u8, table: &DecodeTable, depth: usize) -> Result<Tag> {
    let flags = cursor.flags();
    let mut payload = cursor.slice(record.offset, record.end())?;

    let Some(decoder) = table.get(record.tag_type) else {
        flags.check(Error::UnknownTag {
            tag_type: record.tag_type,
            offset: record.offset,
        })?;
        return Ok(Tag::Unknown(RawTag {
            tag_type: record.tag_type,
            offset: record.offset,
            data: payload.read_remaining().to_vec(),
        }));
    };

    let ctx = DecodeContext {
        table,
        version,
        tag_type: record.tag_type,
        offset: record.offset,
        depth,
    };
    let tag = decoder(&mut payload, &ctx)?;

    if !payload.is_at_end() {
        flags.check(Error::ExtraData {
            offset: record.offset,
            length: payload.remaining(),
        })?;
    }
    Ok(tag)
}

pub fn decode_raw(cursor: &mut Cursor<'_>, ctx: &DecodeContext<'_>) -> Result<Tag> {
    Ok(Tag::Raw(RawTag {
        tag_type: ctx.tag_type,
        offset: ctx.offset,
        data: cursor.read_remaining().to_vec(),
    }))
}

fn decode_show_frame(_cursor: &mut Cursor<'_>, _ctx: &DecodeContext<'_>) -> Result<Tag> {
    Ok(Tag::ShowFrame)
}

fn decode_sprite(cursor: &mut Cursor<'_>, ctx: &DecodeContext<'_>) -> Result<Tag> {
    if ctx.depth >= MAX_SPRITE_DEPTH {
        return Err(Error::invalid(ctx.offset, "sprites nested too deeply"));
    }
    let id = cursor.read_u16()?;
    let frame_count = cursor.read_u16()?;
    let flags = cursor.flags();

    let mut tags = Vec::new();
    let mut records = read_all_tags(cursor, None, false);
    for record in records.by_ref() {
        let record = record?;
        // sprite bodies only hold control tags
        let decoded = if record.tag_type == TagType::DefineSprite.code() {
            Err(Error::invalid(record.offset, "sprite defined inside a sprite"))
        } else {
            decode_at_depth(&record, cursor, ctx.version, ctx.table, ctx.depth + 1)
        };
        match decoded {
            Ok(tag) => tags.push(tag),
            Err(error) if !flags.tag_failure_is_fatal() => {
                tracing::warn!(sprite = id, tag_type = record.tag_type, offset = record.offset, %error, "skipping invalid tag");
            }
            Err(error) => return Err(error),
        }
    }
    cursor.skip(records.offset() - cursor.offset())?;

    Ok(Tag::DefineSprite(Rc::new(DefineSprite {
        id,
        frame_count,
        tags,
    })))
}

fn decode_frame_label(cursor: &mut Cursor<'_>, _ctx: &DecodeContext<'_>) -> Result<Tag> {
    let name = cursor.read_string()?;
    let anchor = !cursor.is_at_end() && cursor.read_u8()? == 1;
    Ok(Tag::FrameLabel(FrameLabel { name, anchor }))
}

fn decode_background_color(cursor: &mut Cursor<'_>, _ctx: &DecodeContext<'_>) -> Result<Tag> {
    Ok(Tag::SetBackgroundColor(Rgba::read_rgb(cursor)?))
}

fn decode_symbols(cursor: &mut Cursor<'_>, ctx: &DecodeContext<'_>) -> Result<Tag> {
    let count = cursor.read_u16()?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let id = cursor.read_u16()?;
        let name = cursor.read_string()?;
        entries.push(SymbolEntry { id, name });
    }
    if ctx.tag_type == TagType::SymbolClass.code() {
        Ok(Tag::SymbolClass(entries))
    } else {
        Ok(Tag::ExportAssets(entries))
    }
}

fn decode_jpeg_tables(cursor: &mut Cursor<'_>, _ctx: &DecodeContext<'_>) -> Result<Tag> {
    Ok(Tag::JpegTables(cursor.read_remaining().to_vec()))
}
