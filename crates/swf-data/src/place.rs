//! Display list tags: `PlaceObject` 1 to 3 and `RemoveObject` 1 and 2.

use crate::cursor::Cursor;
use crate::decode::DecodeContext;
use crate::error::{Error, Result};
use crate::model::{BlendMode, ColorTransform, Filter, Matrix, Rgba};
use crate::tag::TagType;
use crate::tags::{PlaceObject, RemoveObject, Tag};

const HAS_CLIP_ACTIONS: u8 = 0x80;
const HAS_CLIP_DEPTH: u8 = 0x40;
const HAS_NAME: u8 = 0x20;
const HAS_RATIO: u8 = 0x10;
const HAS_COLOR_TRANSFORM: u8 = 0x08;
const HAS_MATRIX: u8 = 0x04;
const HAS_CHARACTER: u8 = 0x02;
const MOVE: u8 = 0x01;

// PlaceObject3 second flag byte
const HAS_BACKGROUND_COLOR: u8 = 0x40;
const HAS_VISIBLE: u8 = 0x20;
const HAS_IMAGE: u8 = 0x10;
const HAS_CLASS_NAME: u8 = 0x08;
const HAS_CACHE_AS_BITMAP: u8 = 0x04;
const HAS_BLEND_MODE: u8 = 0x02;
const HAS_FILTER_LIST: u8 = 0x01;

pub(crate) fn decode_place_object(cursor: &mut Cursor<'_>, ctx: &DecodeContext<'_>) -> Result<Tag> {
    let place = if ctx.tag_type == TagType::PlaceObject.code() {
        read_place_object(cursor)?
    } else {
        read_place_object2(cursor, ctx.tag_type == TagType::PlaceObject3.code())?
    };
    Ok(Tag::PlaceObject(Box::new(place)))
}

fn read_place_object(cursor: &mut Cursor<'_>) -> Result<PlaceObject> {
    let character_id = cursor.read_u16()?;
    let depth = cursor.read_u16()?;
    let matrix = Matrix::read(cursor)?;
    let color_transform = if cursor.is_at_end() {
        None
    } else {
        Some(ColorTransform::read(cursor, false)?)
    };

    Ok(PlaceObject {
        version: 1,
        depth,
        character_id: Some(character_id),
        matrix: Some(matrix),
        color_transform,
        ..Default::default()
    })
}

fn read_place_object2(cursor: &mut Cursor<'_>, extended: bool) -> Result<PlaceObject> {
    let flags = cursor.read_u8()?;
    let flags3 = if extended { cursor.read_u8()? } else { 0 };
    let depth = cursor.read_u16()?;

    let has = |flag: u8| flags & flag != 0;
    let has3 = |flag: u8| flags3 & flag != 0;

    let class_name = if has3(HAS_CLASS_NAME) || (has3(HAS_IMAGE) && has(HAS_CHARACTER)) {
        Some(cursor.read_string()?)
    } else {
        None
    };
    let character_id = has(HAS_CHARACTER).then(|| cursor.read_u16()).transpose()?;
    let matrix = has(HAS_MATRIX).then(|| Matrix::read(cursor)).transpose()?;
    let color_transform = has(HAS_COLOR_TRANSFORM)
        .then(|| ColorTransform::read(cursor, true))
        .transpose()?;
    let ratio = has(HAS_RATIO).then(|| cursor.read_u16()).transpose()?;
    let name = has(HAS_NAME).then(|| cursor.read_string()).transpose()?;
    let clip_depth = has(HAS_CLIP_DEPTH).then(|| cursor.read_u16()).transpose()?;
    let filters = has3(HAS_FILTER_LIST)
        .then(|| Filter::read_list(cursor))
        .transpose()?;

    let blend_mode = if has3(HAS_BLEND_MODE) {
        let offset = cursor.offset();
        let code = cursor.read_u8()?;
        match BlendMode::from_code(code) {
            Some(mode) => Some(mode),
            None => {
                cursor
                    .flags()
                    .check(Error::invalid(offset, format!("unknown blend mode {code}")))?;
                Some(BlendMode::Normal)
            }
        }
    } else {
        None
    };
    let cache_as_bitmap = has3(HAS_CACHE_AS_BITMAP)
        .then(|| cursor.read_u8().map(|v| v != 0))
        .transpose()?;
    let visible = has3(HAS_VISIBLE)
        .then(|| cursor.read_u8().map(|v| v != 0))
        .transpose()?;
    let background_color = has3(HAS_BACKGROUND_COLOR)
        .then(|| Rgba::read_rgba(cursor))
        .transpose()?;
    let clip_actions = has(HAS_CLIP_ACTIONS).then(|| cursor.read_remaining().to_vec());

    Ok(PlaceObject {
        version: if extended { 3 } else { 2 },
        depth,
        character_id,
        is_move: has(MOVE),
        matrix,
        color_transform,
        ratio,
        name,
        clip_depth,
        class_name,
        filters,
        blend_mode,
        cache_as_bitmap,
        visible,
        background_color,
        clip_actions,
    })
}

pub(crate) fn decode_remove_object(cursor: &mut Cursor<'_>, ctx: &DecodeContext<'_>) -> Result<Tag> {
    let character_id = if ctx.tag_type == TagType::RemoveObject.code() {
        Some(cursor.read_u16()?)
    } else {
        None
    };
    let depth = cursor.read_u16()?;
    Ok(Tag::RemoveObject(RemoveObject {
        depth,
        character_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodeTable;
    use crate::error::ErrorFlags;

    fn decode(tag_type: TagType, payload: &[u8], flags: ErrorFlags) -> Result<Tag> {
        let table = DecodeTable::standard();
        let ctx = DecodeContext {
            table: &table,
            version: 10,
            tag_type: tag_type.code(),
            offset: 0,
            depth: 0,
        };
        let mut cursor = Cursor::new(payload, flags);
        let tag = (table.get(tag_type.code()).unwrap())(&mut cursor, &ctx)?;
        assert!(cursor.is_at_end());
        Ok(tag)
    }

    #[test]
    fn test_place_object2_new_character() {
        // HasName | HasMatrix | HasCharacter, depth 3, id 7, empty matrix, "hero"
        let mut payload = vec![HAS_NAME | HAS_MATRIX | HAS_CHARACTER, 3, 0, 7, 0, 0];
        payload.extend_from_slice(b"hero\0");
        let Tag::PlaceObject(place) = decode(TagType::PlaceObject2, &payload, ErrorFlags::default()).unwrap() else {
            panic!("Expected PlaceObject");
        };
        assert_eq!(place.version, 2);
        assert_eq!(place.depth, 3);
        assert_eq!(place.character_id, Some(7));
        assert_eq!(place.matrix, Some(Matrix::IDENTITY));
        assert_eq!(place.name.as_deref(), Some("hero"));
        assert!(!place.is_move);
    }

    #[test]
    fn test_place_object2_move() {
        let payload = [MOVE | HAS_RATIO, 1, 0, 0x10, 0x00];
        let Tag::PlaceObject(place) = decode(TagType::PlaceObject2, &payload, ErrorFlags::default()).unwrap() else {
            panic!("Expected PlaceObject");
        };
        assert!(place.is_move);
        assert_eq!(place.character_id, None);
        assert_eq!(place.ratio, Some(16));
    }

    #[test]
    fn test_place_object3_extended_fields() {
        let payload = [
            HAS_CHARACTER,
            HAS_BLEND_MODE | HAS_CACHE_AS_BITMAP | HAS_VISIBLE,
            2,
            0,
            5,
            0,
            3,
            1,
            0,
        ];
        let Tag::PlaceObject(place) = decode(TagType::PlaceObject3, &payload, ErrorFlags::default()).unwrap() else {
            panic!("Expected PlaceObject");
        };
        assert_eq!(place.version, 3);
        assert_eq!(place.character_id, Some(5));
        assert_eq!(place.blend_mode, Some(BlendMode::Multiply));
        assert_eq!(place.cache_as_bitmap, Some(true));
        assert_eq!(place.visible, Some(false));
    }

    #[test]
    fn test_unknown_blend_mode() {
        let payload = [0, HAS_BLEND_MODE, 2, 0, 99];
        assert!(decode(TagType::PlaceObject3, &payload, ErrorFlags::default()).is_err());
        let Tag::PlaceObject(place) = decode(TagType::PlaceObject3, &payload, ErrorFlags::empty()).unwrap() else {
            panic!("Expected PlaceObject");
        };
        assert_eq!(place.blend_mode, Some(BlendMode::Normal));
    }

    #[test]
    fn test_remove_objects() {
        assert_eq!(
            decode(TagType::RemoveObject, &[4, 0, 2, 0], ErrorFlags::default()).unwrap(),
            Tag::RemoveObject(RemoveObject {
                depth: 2,
                character_id: Some(4)
            })
        );
        assert_eq!(
            decode(TagType::RemoveObject2, &[2, 0], ErrorFlags::default()).unwrap(),
            Tag::RemoveObject(RemoveObject {
                depth: 2,
                character_id: None
            })
        );
    }
}
