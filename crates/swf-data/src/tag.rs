//! Tag framing: record headers, character id extraction and the tag type catalogue.

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use serde::Serialize;

/// Every tag code known to the decode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u16)]
pub enum TagType {
    End = 0,
    ShowFrame = 1,
    DefineShape = 2,
    PlaceObject = 4,
    RemoveObject = 5,
    DefineBits = 6,
    DefineButton = 7,
    JpegTables = 8,
    SetBackgroundColor = 9,
    DefineFont = 10,
    DefineText = 11,
    DoAction = 12,
    DefineFontInfo = 13,
    DefineSound = 14,
    StartSound = 15,
    DefineButtonSound = 17,
    SoundStreamHead = 18,
    SoundStreamBlock = 19,
    DefineBitsLossless = 20,
    DefineBitsJpeg2 = 21,
    DefineShape2 = 22,
    DefineButtonCxform = 23,
    Protect = 24,
    PlaceObject2 = 26,
    RemoveObject2 = 28,
    DefineShape3 = 32,
    DefineText2 = 33,
    DefineButton2 = 34,
    DefineBitsJpeg3 = 35,
    DefineBitsLossless2 = 36,
    DefineEditText = 37,
    DefineSprite = 39,
    ProductInfo = 41,
    FrameLabel = 43,
    SoundStreamHead2 = 45,
    DefineMorphShape = 46,
    DefineFont2 = 48,
    ExportAssets = 56,
    ImportAssets = 57,
    EnableDebugger = 58,
    DoInitAction = 59,
    DefineVideoStream = 60,
    VideoFrame = 61,
    DefineFontInfo2 = 62,
    DebugId = 63,
    EnableDebugger2 = 64,
    ScriptLimits = 65,
    SetTabIndex = 66,
    FileAttributes = 69,
    PlaceObject3 = 70,
    ImportAssets2 = 71,
    DefineFontAlignZones = 73,
    CsmTextSettings = 74,
    DefineFont3 = 75,
    SymbolClass = 76,
    Metadata = 77,
    DefineScalingGrid = 78,
    DoAbc = 82,
    DefineShape4 = 83,
    DefineMorphShape2 = 84,
    DefineSceneAndFrameLabelData = 86,
    DefineBinaryData = 87,
    DefineFontName = 88,
    StartSound2 = 89,
    DefineBitsJpeg4 = 90,
    DefineFont4 = 91,
    EnableTelemetry = 93,
}

impl TagType {
    pub const ALL: [TagType; 67] = [
        TagType::End,
        TagType::ShowFrame,
        TagType::DefineShape,
        TagType::PlaceObject,
        TagType::RemoveObject,
        TagType::DefineBits,
        TagType::DefineButton,
        TagType::JpegTables,
        TagType::SetBackgroundColor,
        TagType::DefineFont,
        TagType::DefineText,
        TagType::DoAction,
        TagType::DefineFontInfo,
        TagType::DefineSound,
        TagType::StartSound,
        TagType::DefineButtonSound,
        TagType::SoundStreamHead,
        TagType::SoundStreamBlock,
        TagType::DefineBitsLossless,
        TagType::DefineBitsJpeg2,
        TagType::DefineShape2,
        TagType::DefineButtonCxform,
        TagType::Protect,
        TagType::PlaceObject2,
        TagType::RemoveObject2,
        TagType::DefineShape3,
        TagType::DefineText2,
        TagType::DefineButton2,
        TagType::DefineBitsJpeg3,
        TagType::DefineBitsLossless2,
        TagType::DefineEditText,
        TagType::DefineSprite,
        TagType::ProductInfo,
        TagType::FrameLabel,
        TagType::SoundStreamHead2,
        TagType::DefineMorphShape,
        TagType::DefineFont2,
        TagType::ExportAssets,
        TagType::ImportAssets,
        TagType::EnableDebugger,
        TagType::DoInitAction,
        TagType::DefineVideoStream,
        TagType::VideoFrame,
        TagType::DefineFontInfo2,
        TagType::DebugId,
        TagType::EnableDebugger2,
        TagType::ScriptLimits,
        TagType::SetTabIndex,
        TagType::FileAttributes,
        TagType::PlaceObject3,
        TagType::ImportAssets2,
        TagType::DefineFontAlignZones,
        TagType::CsmTextSettings,
        TagType::DefineFont3,
        TagType::SymbolClass,
        TagType::Metadata,
        TagType::DefineScalingGrid,
        TagType::DoAbc,
        TagType::DefineShape4,
        TagType::DefineMorphShape2,
        TagType::DefineSceneAndFrameLabelData,
        TagType::DefineBinaryData,
        TagType::DefineFontName,
        TagType::StartSound2,
        TagType::DefineBitsJpeg4,
        TagType::DefineFont4,
        TagType::EnableTelemetry,
    ];

    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<TagType> {
        TagType::ALL.iter().copied().find(|t| t.code() == code)
    }

    pub fn is_definition(self) -> bool {
        DEFINITION_TAGS.contains(&self)
    }

    pub const SHAPES: [TagType; 4] = [
        TagType::DefineShape,
        TagType::DefineShape2,
        TagType::DefineShape3,
        TagType::DefineShape4,
    ];

    pub const IMAGES: [TagType; 6] = [
        TagType::DefineBits,
        TagType::DefineBitsJpeg2,
        TagType::DefineBitsJpeg3,
        TagType::DefineBitsJpeg4,
        TagType::DefineBitsLossless,
        TagType::DefineBitsLossless2,
    ];

    pub const DISPLAY_LIST: [TagType; 7] = [
        TagType::ShowFrame,
        TagType::PlaceObject,
        TagType::PlaceObject2,
        TagType::PlaceObject3,
        TagType::RemoveObject,
        TagType::RemoveObject2,
        TagType::FrameLabel,
    ];

    pub const EXPORTS: [TagType; 2] = [TagType::ExportAssets, TagType::SymbolClass];
}

/// Tag kinds whose payload starts with the id of the character they define.
pub const DEFINITION_TAGS: [TagType; 25] = [
    TagType::DefineShape,
    TagType::DefineBits,
    TagType::DefineButton,
    TagType::DefineFont,
    TagType::DefineText,
    TagType::DefineSound,
    TagType::DefineBitsLossless,
    TagType::DefineBitsJpeg2,
    TagType::DefineShape2,
    TagType::DefineShape3,
    TagType::DefineText2,
    TagType::DefineButton2,
    TagType::DefineBitsJpeg3,
    TagType::DefineBitsLossless2,
    TagType::DefineEditText,
    TagType::DefineSprite,
    TagType::DefineMorphShape,
    TagType::DefineFont2,
    TagType::DefineVideoStream,
    TagType::DefineFont3,
    TagType::DefineShape4,
    TagType::DefineMorphShape2,
    TagType::DefineBinaryData,
    TagType::DefineBitsJpeg4,
    TagType::DefineFont4,
];

/// Header sentinel announcing a 32 bit length.
pub const LONG_LENGTH: usize = 0x3F;

/// Location of one tag payload in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    pub tag_type: u16,
    /// Absolute offset of the payload (after the header).
    pub offset: usize,
    pub length: usize,
    /// Character id, when extracted from a definition tag.
    pub id: Option<u16>,
}

impl TagRecord {
    pub fn kind(&self) -> Option<TagType> {
        TagType::from_code(self.tag_type)
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Lazily iterates the tag records of `cursor` until `end` (or the cursor's end).
///
/// The `End` tag stops the iteration. With `extract_id`, the character id of
/// definition tags is read without decoding the rest of the payload.
pub fn read_all_tags<'a>(cursor: &Cursor<'a>, end: Option<usize>, extract_id: bool) -> TagIter<'a> {
    let mut cursor = *cursor;
    if let Some(end) = end {
        if end < cursor.end() {
            cursor = Cursor::with_range(cursor.data(), cursor.offset(), end, cursor.flags());
        }
    }
    TagIter {
        cursor,
        extract_id,
        done: false,
    }
}

pub struct TagIter<'a> {
    cursor: Cursor<'a>,
    extract_id: bool,
    done: bool,
}

impl<'a> TagIter<'a> {
    /// Absolute offset of the next header (or of the end of the scanned range).
    pub fn offset(&self) -> usize {
        self.cursor.offset()
    }

    fn next_record(&mut self) -> Result<Option<TagRecord>> {
        if self.cursor.is_at_end() {
            return Ok(None);
        }
        let header = self.cursor.read_u16()?;
        let tag_type = header >> 6;
        let mut length = (header as usize) & LONG_LENGTH;
        if length == LONG_LENGTH {
            length = self.cursor.read_u32()? as usize;
        }
        if tag_type == TagType::End.code() {
            return Ok(None);
        }

        let offset = self.cursor.offset();
        if length > self.cursor.remaining() {
            self.cursor.flags().check(Error::OutOfBounds {
                offset,
                end: self.cursor.end(),
                length,
            })?;
            tracing::debug!(tag_type, offset, length, "truncated tag payload");
            length = self.cursor.remaining();
        }

        let definition = TagType::from_code(tag_type).is_some_and(TagType::is_definition);
        let id = if self.extract_id && definition && length >= 2 {
            let id = self.cursor.read_u16()?;
            self.cursor.skip(length - 2)?;
            Some(id)
        } else {
            self.cursor.skip(length)?;
            None
        };

        Ok(Some(TagRecord {
            tag_type,
            offset,
            length,
            id,
        }))
    }
}

impl<'a> Iterator for TagIter<'a> {
    type Item = Result<TagRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}
