//! # swf-extract
//!
//! Reads SWF movies and exposes their characters (shapes, sprites, bitmaps) as a lazily
//! resolved, drawable graph.
//!
//! [`swf_data`] frames and decodes the tag stream; [`swf_core`] resolves characters and
//! timelines. This crate re-exports both and adds file loading.

pub use swf_core;
pub use swf_data;

pub use swf_core::{
    Character, ColorTransformExt, DrawCommand, Drawable, DrawingSink, ExtractOptions, Extractor, Fill, Frame,
    FrameObject, Shape, Timeline,
};
pub use swf_data::{ColorTransform, Error, ErrorFlags, MovieHeader, Rectangle, Rgba, SwfFile};

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Where movie and configuration bytes come from.
pub trait MovieLoader {
    fn load_bytes(&self, path: &Path) -> Result<Vec<u8>>;
}

pub struct FileLoader;

impl MovieLoader for FileLoader {
    fn load_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }
}

/// Reads and parses a movie file.
pub fn load_movie(path: impl AsRef<Path>, options: ExtractOptions) -> Result<Extractor> {
    load_movie_with(&FileLoader, path.as_ref(), options).map(|(_, extractor)| extractor)
}

/// Loads a movie through `loader`, returning its header next to the extractor.
pub fn load_movie_with(loader: &dyn MovieLoader, path: &Path, options: ExtractOptions) -> Result<(MovieHeader, Extractor)> {
    let bytes = loader
        .load_bytes(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let file = SwfFile::parse(&bytes, options.errors).with_context(|| format!("parsing {}", path.display()))?;
    let header = file.header.clone();
    info!(
        version = header.version,
        frames = header.frame_count,
        compression = ?header.compression,
        "movie loaded"
    );
    Ok((header, Extractor::new(file, options)))
}

/// Reads [`ExtractOptions`] from a JSON file.
pub fn load_options(loader: &dyn MovieLoader, path: &Path) -> Result<ExtractOptions> {
    let bytes = loader
        .load_bytes(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let text = String::from_utf8(bytes).with_context(|| format!("{} is not UTF-8", path.display()))?;
    ExtractOptions::from_json(&text).with_context(|| format!("parsing options in {}", path.display()))
}
