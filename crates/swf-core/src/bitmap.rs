//! Bitmap characters: lossless and JPEG/PNG/GIF payloads decoded to RGBA.

use crate::color::ColorTransformExt;
use crate::drawable::Drawable;
use crate::sink::DrawingSink;
use flate2::read::ZlibDecoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use std::cell::OnceCell;
use std::fmt;
use std::io::Read;
use std::rc::Rc;
use swf_data::bitmap::{FORMAT_COLORMAPPED, FORMAT_RGB15, FORMAT_RGB32};
use swf_data::{ColorTransform, DefineBits, DefineBitsLossless, Error, ErrorFlags, Rectangle, Result};
use tracing::debug;

/// Twips per pixel.
pub const TWIPS_PER_PIXEL: i32 = 20;

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];
/// Spurious EOI+SOI some encoders put in front of the JPEG stream.
const ERRONEOUS_HEADER: [u8; 4] = [0xFF, 0xD9, 0xFF, 0xD8];

#[derive(Clone)]
enum ImageSource {
    Jpeg {
        bits: Rc<DefineBits>,
        /// Shared `JPEGTables` payload, only used by version 1 tags.
        tables: Option<Rc<[u8]>>,
    },
    Lossless(Rc<DefineBitsLossless>),
}

/// A bitmap character. Pixels are decoded on first use and kept.
#[derive(Clone)]
pub struct ImageDefinition {
    id: u16,
    offset: usize,
    source: ImageSource,
    flags: ErrorFlags,
    pixels: OnceCell<Rc<RgbaImage>>,
    /// Transform already baked into `pixels`.
    color_transform: Option<ColorTransform>,
    /// Checksum of transformed pixels, computed on first identity request.
    checksum: OnceCell<String>,
}

impl fmt::Debug for ImageDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageDefinition")
            .field("id", &self.id)
            .field("offset", &self.offset)
            .field("decoded", &self.pixels.get().is_some())
            .field("color_transform", &self.color_transform)
            .finish()
    }
}

impl ImageDefinition {
    pub(crate) fn jpeg(bits: Rc<DefineBits>, tables: Option<Rc<[u8]>>, offset: usize, flags: ErrorFlags) -> Self {
        Self::new(bits.id, offset, ImageSource::Jpeg { bits, tables }, flags)
    }

    pub(crate) fn lossless(bits: Rc<DefineBitsLossless>, offset: usize, flags: ErrorFlags) -> Self {
        Self::new(bits.id, offset, ImageSource::Lossless(bits), flags)
    }

    fn new(id: u16, offset: usize, source: ImageSource, flags: ErrorFlags) -> Self {
        Self {
            id,
            offset,
            source,
            flags,
            pixels: OnceCell::new(),
            color_transform: None,
            checksum: OnceCell::new(),
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    /// Offset of the defining tag.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn color_transform(&self) -> Option<ColorTransform> {
        self.color_transform
    }

    /// Pixel size known without decoding.
    pub fn declared_size(&self) -> Option<(u32, u32)> {
        match &self.source {
            ImageSource::Lossless(bits) => Some((u32::from(bits.width), u32::from(bits.height))),
            ImageSource::Jpeg { .. } => self.pixels.get().map(|pixels| pixels.dimensions()),
        }
    }

    pub fn pixels(&self) -> Result<Rc<RgbaImage>> {
        if let Some(pixels) = self.pixels.get() {
            return Ok(pixels.clone());
        }
        let pixels = Rc::new(self.decode()?);
        let _ = self.pixels.set(pixels.clone());
        Ok(pixels)
    }

    /// Stable identity: the id, plus a pixel checksum once a color transform is applied.
    pub fn identity(&self) -> String {
        match (self.color_transform, self.pixels.get()) {
            (Some(_), Some(pixels)) => format!("{}:{}", self.id, self.checksum.get_or_init(|| checksum(pixels))),
            _ => self.id.to_string(),
        }
    }

    fn decode(&self) -> Result<RgbaImage> {
        let decoded = match &self.source {
            ImageSource::Jpeg { bits, tables } => decode_jpeg(bits, tables.as_deref()),
            ImageSource::Lossless(bits) => decode_lossless(bits),
        };
        match decoded {
            Ok(image) => Ok(image),
            Err(error) => {
                self.flags.check(error)?;
                let (width, height) = self.declared_size().unwrap_or((1, 1));
                Ok(RgbaImage::new(width.max(1), height.max(1)))
            }
        }
    }
}

impl Drawable for ImageDefinition {
    fn bounds(&self) -> Result<Rectangle> {
        let (width, height) = match self.declared_size() {
            Some(size) => size,
            None => self.pixels()?.dimensions(),
        };
        Ok(Rectangle::new(
            0,
            width as i32 * TWIPS_PER_PIXEL,
            0,
            height as i32 * TWIPS_PER_PIXEL,
        ))
    }

    fn frames_count(&self, _recursive: bool) -> Result<usize> {
        Ok(1)
    }

    fn draw(&self, sink: &mut dyn DrawingSink, _frame: usize) -> Result<()> {
        sink.image(self.id, &*self.pixels()?);
        Ok(())
    }

    fn transform_colors(&self, transform: &ColorTransform) -> Result<Self> {
        if transform.is_identity() {
            return Ok(self.clone());
        }
        let mut pixels = (*self.pixels()?).clone();
        transform.apply_to_image(&mut pixels);
        let applied = match &self.color_transform {
            Some(previous) => transform.compose(previous),
            None => *transform,
        };
        Ok(Self {
            pixels: OnceCell::from(Rc::new(pixels)),
            color_transform: Some(applied),
            checksum: OnceCell::new(),
            ..self.clone()
        })
    }
}

fn checksum(pixels: &RgbaImage) -> String {
    let mut png = Vec::new();
    let encoded = PngEncoder::new(&mut png).write_image(
        pixels.as_raw(),
        pixels.width(),
        pixels.height(),
        ExtendedColorType::Rgba8,
    );
    let bytes: &[u8] = match encoded {
        Ok(()) => &png,
        Err(_) => pixels.as_raw(),
    };
    blake3::hash(bytes).to_hex().to_string()
}

fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| Error::UnprocessableData(format!("zlib stream: {e}")))?;
    Ok(out)
}

/// Prepends the shared tables of a version 1 `DefineBits` to its scan data.
fn merge_jpeg_tables(tables: &[u8], data: &[u8]) -> Vec<u8> {
    let tables = tables.strip_prefix(&ERRONEOUS_HEADER).unwrap_or(tables);
    let tables = tables.strip_suffix(&EOI).unwrap_or(tables);
    if tables.len() <= SOI.len() {
        return data.to_vec();
    }
    let body = data.strip_prefix(&SOI).unwrap_or(data);
    [tables, body].concat()
}

fn decode_jpeg(bits: &DefineBits, tables: Option<&[u8]>) -> Result<RgbaImage> {
    let stripped = bits
        .image_data
        .strip_prefix(&ERRONEOUS_HEADER)
        .unwrap_or(bits.image_data.as_slice());
    let merged: Vec<u8>;
    let data = match tables {
        Some(tables) if bits.version == 1 => {
            merged = merge_jpeg_tables(tables, stripped);
            merged.as_slice()
        }
        _ => stripped,
    };

    let mut image = image::load_from_memory(data)
        .map_err(|e| Error::UnprocessableData(format!("image {}: {e}", bits.id)))?
        .to_rgba8();

    if let Some(alpha) = bits.alpha_data.as_deref().filter(|alpha| !alpha.is_empty()) {
        let plane = inflate(alpha)?;
        let expected = image.width() as usize * image.height() as usize;
        if plane.len() < expected {
            return Err(Error::UnprocessableData(format!(
                "image {}: alpha plane has {} bytes, {expected} expected",
                bits.id,
                plane.len()
            )));
        }
        for (pixel, alpha) in image.pixels_mut().zip(plane) {
            pixel.0[3] = alpha;
        }
    }
    Ok(image)
}

fn decode_lossless(bits: &DefineBitsLossless) -> Result<RgbaImage> {
    let data = inflate(&bits.data)?;
    let width = usize::from(bits.width);
    let height = usize::from(bits.height);
    let with_alpha = bits.version == 2;
    let mut image = RgbaImage::new(u32::from(bits.width), u32::from(bits.height));

    match bits.format {
        FORMAT_COLORMAPPED => {
            let entry = if with_alpha { 4 } else { 3 };
            let palette_length = (usize::from(bits.color_table_size.unwrap_or(0)) + 1) * entry;
            let stride = padded(width);
            ensure_length(bits.id, &data, palette_length + stride * height)?;
            let (palette, indices) = data.split_at(palette_length);
            for (x, y, pixel) in image.enumerate_pixels_mut() {
                let index = usize::from(indices[y as usize * stride + x as usize]);
                pixel.0 = match palette.get(index * entry..(index + 1) * entry) {
                    Some(color) if with_alpha => unpremultiply([color[0], color[1], color[2], color[3]]),
                    Some(color) => [color[0], color[1], color[2], 255],
                    None => [0; 4],
                };
            }
        }
        FORMAT_RGB15 => {
            let stride = padded(width * 2);
            ensure_length(bits.id, &data, stride * height)?;
            for (x, y, pixel) in image.enumerate_pixels_mut() {
                let at = y as usize * stride + x as usize * 2;
                let value = u16::from_be_bytes([data[at], data[at + 1]]);
                let channel = |shift: u16| ((value >> shift & 0x1F) * 255 / 31) as u8;
                pixel.0 = [channel(10), channel(5), channel(0), 255];
            }
        }
        FORMAT_RGB32 => {
            let stride = width * 4;
            ensure_length(bits.id, &data, stride * height)?;
            for (x, y, pixel) in image.enumerate_pixels_mut() {
                let at = y as usize * stride + x as usize * 4;
                let [a, r, g, b] = [data[at], data[at + 1], data[at + 2], data[at + 3]];
                pixel.0 = if with_alpha { unpremultiply([r, g, b, a]) } else { [r, g, b, 255] };
            }
        }
        other => {
            return Err(Error::UnprocessableData(format!("bitmap {}: unknown format {other}", bits.id)));
        }
    }
    Ok(image)
}

/// Rows are padded to 32 bits.
fn padded(length: usize) -> usize {
    (length + 3) & !3
}

fn ensure_length(id: u16, data: &[u8], expected: usize) -> Result<()> {
    if data.len() < expected {
        debug!(id, actual = data.len(), expected, "short bitmap data");
        return Err(Error::UnprocessableData(format!(
            "bitmap {id}: {} bytes of pixel data, {expected} expected",
            data.len()
        )));
    }
    Ok(())
}

fn unpremultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    if a == 0 {
        return [0; 4];
    }
    let channel = |c: u8| (u16::from(c) * 255 / u16::from(a)).min(255) as u8;
    [channel(r), channel(g), channel(b), a]
}
