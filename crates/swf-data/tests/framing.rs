use flate2::write::ZlibEncoder;
use flate2::Compression as Level;
use std::io::Write;
use swf_data::header::Compression;
use swf_data::{
    decode_tag, read_all_tags, Cursor, DecodeTable, Error, ErrorFlags, FrameLabel, Rgba, SwfFile, SymbolEntry, Tag,
    TagRecord,
};

fn short(tag_type: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = ((tag_type << 6) | payload.len() as u16).to_le_bytes().to_vec();
    out.extend_from_slice(payload);
    out
}

fn long(tag_type: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = ((tag_type << 6) | 0x3F).to_le_bytes().to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Compressed movie: background color (long header), label, export with a stray
/// trailing byte, an unknown tag type, one frame.
fn compressed_movie() -> Vec<u8> {
    let mut body = vec![0x78, 0x00, 0x05, 0x5F, 0x00, 0x00, 0x0F, 0xA0, 0x00];
    body.extend_from_slice(&[0x00, 0x18, 0x01, 0x00]);
    body.extend(long(9, &[0xFF, 0x80, 0x00]));
    body.extend(short(43, b"intro\0\x01"));
    body.extend(short(56, b"\x01\x00\x07\x00hero\0\xAA"));
    body.extend(short(200, &[1]));
    body.extend(short(1, &[]));
    body.extend(short(0, &[]));

    let mut encoder = ZlibEncoder::new(Vec::new(), Level::default());
    encoder.write_all(&body).unwrap();
    let compressed = encoder.finish().unwrap();

    let mut movie = b"CWS\x0a".to_vec();
    movie.extend_from_slice(&((8 + body.len()) as u32).to_le_bytes());
    movie.extend(compressed);
    movie
}

fn records(file: &SwfFile, flags: ErrorFlags) -> Vec<TagRecord> {
    read_all_tags(&file.cursor(flags), None, true)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn test_compressed_movie_framing() {
    let file = SwfFile::parse(&compressed_movie(), ErrorFlags::default()).unwrap();
    assert_eq!(file.header.compression, Compression::Zlib);
    assert_eq!(file.header.version, 10);
    assert_eq!(file.header.frame_rate, 24.0);
    assert_eq!(file.header.frame_count, 1);
    assert_eq!(file.data.len(), file.header.file_length as usize);

    let records = records(&file, ErrorFlags::default());
    let types: Vec<u16> = records.iter().map(|r| r.tag_type).collect();
    assert_eq!(types, vec![9, 43, 56, 200, 1]);

    // Long form: 2 byte header plus a 32 bit length.
    assert_eq!(records[0].offset, file.tags_offset + 6);
    assert_eq!(records[0].length, 3);
    assert_eq!(records[1].offset, records[0].end() + 2);
}

#[test]
fn test_lenient_decoding_keeps_going() {
    let file = SwfFile::parse(&compressed_movie(), ErrorFlags::empty()).unwrap();
    let cursor = file.cursor(ErrorFlags::empty());
    let table = DecodeTable::standard();

    let tags: Vec<Tag> = records(&file, ErrorFlags::empty())
        .iter()
        .map(|record| decode_tag(record, &cursor, file.header.version, &table).unwrap())
        .collect();

    assert_eq!(tags[0], Tag::SetBackgroundColor(Rgba::new(0xFF, 0x80, 0x00, 0xFF)));
    assert_eq!(
        tags[1],
        Tag::FrameLabel(FrameLabel {
            name: "intro".into(),
            anchor: true
        })
    );
    assert_eq!(
        tags[2],
        Tag::ExportAssets(vec![SymbolEntry {
            id: 7,
            name: "hero".into()
        }])
    );
    assert!(matches!(&tags[3], Tag::Unknown(raw) if raw.tag_type == 200 && raw.data == vec![1]));
    assert_eq!(tags[4], Tag::ShowFrame);
}

#[test]
fn test_strict_decoding_reports_faults() {
    let file = SwfFile::parse(&compressed_movie(), ErrorFlags::default()).unwrap();
    let cursor = file.cursor(ErrorFlags::default());
    let table = DecodeTable::standard();
    let records = records(&file, ErrorFlags::default());

    assert_eq!(
        decode_tag(&records[2], &cursor, 10, &table),
        Err(Error::ExtraData {
            offset: records[2].offset,
            length: 1
        })
    );
    assert_eq!(
        decode_tag(&records[3], &cursor, 10, &table),
        Err(Error::UnknownTag {
            tag_type: 200,
            offset: records[3].offset
        })
    );
}

#[test]
fn test_truncated_payload() {
    let mut data = ((2u16 << 6) | 0x3F).to_le_bytes().to_vec();
    data.extend_from_slice(&100u32.to_le_bytes());
    data.extend_from_slice(&[1, 0]);

    let strict = Cursor::new(&data, ErrorFlags::default());
    let first = read_all_tags(&strict, None, false).next().unwrap();
    assert_eq!(
        first,
        Err(Error::OutOfBounds {
            offset: 6,
            end: 8,
            length: 100
        })
    );

    let lenient = Cursor::new(&data, ErrorFlags::empty());
    let records: Vec<TagRecord> = read_all_tags(&lenient, None, true)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].length, 2);
    assert_eq!(records[0].id, Some(1));
}

#[test]
fn test_sprite_inside_sprite_is_rejected() {
    // A deep chain of sprites, each defined inside the previous one.
    let mut data = short(1, &[]);
    for id in 0..4_000u16 {
        let mut payload = id.to_le_bytes().to_vec();
        payload.extend_from_slice(&[1, 0]);
        payload.extend(data);
        payload.extend(short(0, &[]));
        data = long(39, &payload);
    }
    let table = DecodeTable::standard();

    let lenient = Cursor::new(&data, ErrorFlags::default());
    let record = read_all_tags(&lenient, None, true).next().unwrap().unwrap();
    assert_eq!(record.id, Some(3_999));
    let Tag::DefineSprite(outer) = decode_tag(&record, &lenient, 10, &table).unwrap() else {
        panic!("Expected DefineSprite");
    };
    assert!(outer.tags.is_empty());

    let strict = Cursor::new(&data, ErrorFlags::all());
    assert!(matches!(
        decode_tag(&record, &strict, 10, &table),
        Err(Error::InvalidData { offset, .. }) if offset == record.offset + 10
    ));
}
