// Builders for synthetic tag streams and movies.
#![allow(dead_code)]

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;
use swf_data::{ColorTransform, Rectangle, Rgba, TagType};

#[derive(Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    current: u8,
    count: u32,
}

impl BitWriter {
    pub fn bits(&mut self, value: u32, n: u32) -> &mut Self {
        for i in (0..n).rev() {
            self.current = (self.current << 1) | ((value >> i) & 1) as u8;
            self.count += 1;
            if self.count == 8 {
                self.bytes.push(self.current);
                self.current = 0;
                self.count = 0;
            }
        }
        self
    }

    pub fn sbits(&mut self, value: i32, n: u32) -> &mut Self {
        let mask = if n == 32 { u32::MAX } else { (1u32 << n) - 1 };
        self.bits(value as u32 & mask, n)
    }

    pub fn finish(&mut self) -> Vec<u8> {
        if self.count > 0 {
            self.bytes.push(self.current << (8 - self.count));
            self.current = 0;
            self.count = 0;
        }
        std::mem::take(&mut self.bytes)
    }
}

pub fn signed_bits(values: &[i32]) -> u32 {
    values
        .iter()
        .map(|v| {
            let magnitude = if *v < 0 { !*v } else { *v };
            33 - magnitude.leading_zeros()
        })
        .max()
        .unwrap_or(1)
        .max(1)
}

pub fn rect(bounds: Rectangle) -> Vec<u8> {
    let values = [bounds.x_min, bounds.x_max, bounds.y_min, bounds.y_max];
    let n = signed_bits(&values);
    let mut writer = BitWriter::default();
    writer.bits(n, 5);
    for value in values {
        writer.sbits(value, n);
    }
    writer.finish()
}

pub fn translate(x: i32, y: i32) -> Vec<u8> {
    let n = signed_bits(&[x, y]);
    let mut writer = BitWriter::default();
    writer.bits(0, 1).bits(0, 1).bits(n, 5).sbits(x, n).sbits(y, n);
    writer.finish()
}

pub fn cxform_with_alpha(transform: &ColorTransform) -> Vec<u8> {
    let values: Vec<i32> = transform.mult.iter().chain(&transform.add).map(|v| i32::from(*v)).collect();
    let n = signed_bits(&values);
    let mut writer = BitWriter::default();
    writer.bits(1, 1).bits(1, 1).bits(n, 4);
    for value in values {
        writer.sbits(value, n);
    }
    writer.finish()
}

pub fn tag(tag_type: TagType, payload: &[u8]) -> Vec<u8> {
    raw_tag(tag_type.code(), payload)
}

pub fn raw_tag(code: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    if payload.len() < 0x3F {
        out.extend_from_slice(&((code << 6) | payload.len() as u16).to_le_bytes());
    } else {
        out.extend_from_slice(&((code << 6) | 0x3F).to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    }
    out.extend_from_slice(payload);
    out
}

pub fn end() -> Vec<u8> {
    vec![0, 0]
}

pub fn show_frame() -> Vec<u8> {
    tag(TagType::ShowFrame, &[])
}

/// `DefineShape3` with solid fills and no outline.
pub fn define_shape(id: u16, bounds: Rectangle, fills: &[Rgba]) -> Vec<u8> {
    let mut payload = id.to_le_bytes().to_vec();
    payload.extend(rect(bounds));
    payload.push(fills.len() as u8);
    for fill in fills {
        payload.extend_from_slice(&[0x00, fill.r, fill.g, fill.b, fill.a]);
    }
    payload.push(0);
    // one fill bit, no line bits, end of shape
    payload.extend_from_slice(&[0x10, 0x00]);
    tag(TagType::DefineShape3, &payload)
}

/// `DefineShape3` with one clipped bitmap fill.
pub fn define_bitmap_shape(id: u16, bounds: Rectangle, bitmap: u16) -> Vec<u8> {
    let mut payload = id.to_le_bytes().to_vec();
    payload.extend(rect(bounds));
    payload.push(1);
    payload.push(0x41);
    payload.extend_from_slice(&bitmap.to_le_bytes());
    payload.extend(translate(0, 0));
    payload.push(0);
    payload.extend_from_slice(&[0x10, 0x00]);
    tag(TagType::DefineShape3, &payload)
}

/// `DefineBitsLossless2` of 32-bit premultiplied ARGB pixels.
pub fn define_lossless(id: u16, width: u16, height: u16, argb: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(argb).unwrap();
    let mut payload = id.to_le_bytes().to_vec();
    payload.push(5);
    payload.extend_from_slice(&width.to_le_bytes());
    payload.extend_from_slice(&height.to_le_bytes());
    payload.extend(encoder.finish().unwrap());
    tag(TagType::DefineBitsLossless2, &payload)
}

pub fn define_sprite(id: u16, frame_count: u16, body: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = id.to_le_bytes().to_vec();
    payload.extend_from_slice(&frame_count.to_le_bytes());
    for tag in body {
        payload.extend_from_slice(tag);
    }
    payload.extend(end());
    tag(TagType::DefineSprite, &payload)
}

/// `PlaceObject2` of a new character, optionally translated.
pub fn place(depth: u16, id: u16, offset: Option<(i32, i32)>) -> Vec<u8> {
    place_with(depth, Some(id), false, offset, None)
}

pub fn place_with(
    depth: u16,
    id: Option<u16>,
    is_move: bool,
    offset: Option<(i32, i32)>,
    color: Option<ColorTransform>,
) -> Vec<u8> {
    let mut flags = 0u8;
    if is_move {
        flags |= 0x01;
    }
    if id.is_some() {
        flags |= 0x02;
    }
    if offset.is_some() {
        flags |= 0x04;
    }
    if color.is_some() {
        flags |= 0x08;
    }
    let mut payload = vec![flags];
    payload.extend_from_slice(&depth.to_le_bytes());
    if let Some(id) = id {
        payload.extend_from_slice(&id.to_le_bytes());
    }
    if let Some((x, y)) = offset {
        payload.extend(translate(x, y));
    }
    if let Some(color) = color {
        payload.extend(cxform_with_alpha(&color));
    }
    tag(TagType::PlaceObject2, &payload)
}

pub fn remove(depth: u16) -> Vec<u8> {
    tag(TagType::RemoveObject2, &depth.to_le_bytes())
}

pub fn frame_label(name: &str) -> Vec<u8> {
    let mut payload = name.as_bytes().to_vec();
    payload.push(0);
    tag(TagType::FrameLabel, &payload)
}

pub fn export(entries: &[(u16, &str)]) -> Vec<u8> {
    let mut payload = (entries.len() as u16).to_le_bytes().to_vec();
    for (id, name) in entries {
        payload.extend_from_slice(&id.to_le_bytes());
        payload.extend_from_slice(name.as_bytes());
        payload.push(0);
    }
    tag(TagType::ExportAssets, &payload)
}

/// Concatenates tags and appends `End`.
pub fn stream(tags: &[Vec<u8>]) -> Vec<u8> {
    let mut out = tags.concat();
    out.extend(end());
    out
}

/// Uncompressed movie around `tags`.
pub fn movie(version: u8, stage: Rectangle, frame_count: u16, tags: &[Vec<u8>]) -> Vec<u8> {
    let mut body = rect(stage);
    body.extend_from_slice(&[0x00, 0x18]);
    body.extend_from_slice(&frame_count.to_le_bytes());
    body.extend(stream(tags));

    let mut out = b"FWS".to_vec();
    out.push(version);
    out.extend_from_slice(&((8 + body.len()) as u32).to_le_bytes());
    out.extend(body);
    out
}
