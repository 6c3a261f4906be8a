//! Color transform arithmetic.
//!
//! Multipliers are 8.8 fixed point (`256` is `1.0`), additive terms are applied after
//! multiplication and results are clamped to `0..=255`.

use glam::Vec4;
use image::RgbaImage;
use swf_data::{ColorTransform, Rgba};

pub trait ColorTransformExt {
    /// Transforms a single color.
    fn apply(&self, color: Rgba) -> Rgba;

    /// Transform equivalent to applying `inner` first, then `self`.
    fn compose(&self, inner: &ColorTransform) -> ColorTransform;

    /// Transforms every pixel of `image` in place.
    fn apply_to_image(&self, image: &mut RgbaImage);
}

impl ColorTransformExt for ColorTransform {
    fn apply(&self, color: Rgba) -> Rgba {
        if self.is_identity() {
            return color;
        }
        let [r, g, b, a] = transform_channels(self, [color.r, color.g, color.b, color.a]);
        Rgba::new(r, g, b, a)
    }

    fn compose(&self, inner: &ColorTransform) -> ColorTransform {
        let mut mult = [0i16; 4];
        let mut add = [0i16; 4];
        for channel in 0..4 {
            let outer_mult = i32::from(self.mult[channel]);
            mult[channel] = saturate(i32::from(inner.mult[channel]) * outer_mult >> 8);
            add[channel] = saturate((i32::from(inner.add[channel]) * outer_mult >> 8) + i32::from(self.add[channel]));
        }
        ColorTransform { mult, add }
    }

    fn apply_to_image(&self, image: &mut RgbaImage) {
        if self.is_identity() {
            return;
        }
        for pixel in image.pixels_mut() {
            pixel.0 = transform_channels(self, pixel.0);
        }
    }
}

fn transform_channels(transform: &ColorTransform, channels: [u8; 4]) -> [u8; 4] {
    let color = Vec4::from(channels.map(f32::from));
    let mult = Vec4::from(transform.mult.map(f32::from));
    let add = Vec4::from(transform.add.map(f32::from));
    let out = ((color * mult) / 256.0).floor() + add;
    out.clamp(Vec4::ZERO, Vec4::splat(255.0)).to_array().map(|c| c as u8)
}

fn saturate(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}
