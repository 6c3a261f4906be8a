//! Resolved fills and their identity hashes.
//!
//! Two fills with the same hash render identically, so renderers can share the
//! patterns and textures built for them.

use crate::bitmap::ImageDefinition;
use crate::color::ColorTransformExt;
use crate::drawable::Drawable;
use serde::Serialize;
use std::collections::BTreeMap;
use std::rc::Rc;
use swf_data::{ColorTransform, FillStyle, Gradient, Matrix, Result, Rgba};
use tracing::debug;

#[derive(Debug, Clone)]
pub enum Fill {
    Solid(Rgba),
    LinearGradient(GradientFill),
    /// Radial gradients, focal ones included.
    RadialGradient(GradientFill),
    Bitmap(BitmapFill),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientFill {
    pub matrix: Matrix,
    pub gradient: Gradient,
    pub focal_point: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct BitmapFill {
    pub image: Rc<ImageDefinition>,
    /// Not part of the fill hash.
    pub matrix: Matrix,
    pub smoothed: bool,
    pub repeating: bool,
}

impl Fill {
    /// Binds a decoded fill style to the movie images. Unknown bitmaps resolve to transparent.
    pub fn resolve(style: &FillStyle, images: &BTreeMap<u16, Rc<ImageDefinition>>) -> Fill {
        match style {
            FillStyle::Solid(color) => Fill::Solid(*color),
            FillStyle::LinearGradient { matrix, gradient } => Fill::LinearGradient(GradientFill {
                matrix: *matrix,
                gradient: gradient.clone(),
                focal_point: None,
            }),
            FillStyle::RadialGradient { matrix, gradient } => Fill::RadialGradient(GradientFill {
                matrix: *matrix,
                gradient: gradient.clone(),
                focal_point: None,
            }),
            FillStyle::FocalGradient {
                matrix,
                gradient,
                focal_point,
            } => Fill::RadialGradient(GradientFill {
                matrix: *matrix,
                gradient: gradient.clone(),
                focal_point: Some(*focal_point),
            }),
            FillStyle::Bitmap {
                id,
                matrix,
                smoothed,
                repeating,
            } => match images.get(id) {
                Some(image) => Fill::Bitmap(BitmapFill {
                    image: image.clone(),
                    matrix: *matrix,
                    smoothed: *smoothed,
                    repeating: *repeating,
                }),
                None => {
                    debug!(id, "bitmap fill without image");
                    Fill::Solid(Rgba::TRANSPARENT)
                }
            },
        }
    }

    /// Identity hash of what this fill paints.
    pub fn hash(&self) -> String {
        match self {
            Fill::Solid(color) => format!("S{:08x}", color.packed()),
            Fill::LinearGradient(fill) => format!("L{}", fill.digest()),
            Fill::RadialGradient(fill) => format!("R{}", fill.digest()),
            Fill::Bitmap(fill) => format!(
                "B{}{}{}",
                u8::from(fill.repeating),
                u8::from(fill.smoothed),
                fill.image.identity()
            ),
        }
    }

    pub fn transform_colors(&self, transform: &ColorTransform) -> Result<Fill> {
        if transform.is_identity() {
            return Ok(self.clone());
        }
        Ok(match self {
            Fill::Solid(color) => Fill::Solid(transform.apply(*color)),
            Fill::LinearGradient(fill) => Fill::LinearGradient(fill.transform_colors(transform)),
            Fill::RadialGradient(fill) => Fill::RadialGradient(fill.transform_colors(transform)),
            Fill::Bitmap(fill) => Fill::Bitmap(BitmapFill {
                image: Rc::new(fill.image.transform_colors(transform)?),
                ..fill.clone()
            }),
        })
    }
}

impl GradientFill {
    fn digest(&self) -> String {
        let encoded = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&encoded).to_hex().to_string()
    }

    fn transform_colors(&self, transform: &ColorTransform) -> GradientFill {
        let mut fill = self.clone();
        for record in &mut fill.gradient.records {
            record.color = transform.apply(record.color);
        }
        fill
    }
}
