/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

//! Colour filters on straight (non-premultiplied) RGBA8 images.
//!
//! Each primitive is a 4x5 colour matrix in row-major order as in the CSS
//! Filter Effects spec. Primitives are applied one after another with
//! clamping in between, in the fixed order brightness, contrast, hue-rotate,
//! saturate.

use atelier_core::Filters;
use image::RgbaImage;

pub type ColorMatrix = [f32; 20];

pub const IDENTITY: ColorMatrix = [
    1.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

/// `amount` is a factor, 1.0 = identity.
pub fn brightness(amount: f32) -> ColorMatrix {
    [
        amount, 0.0, 0.0, 0.0, 0.0, //
        0.0, amount, 0.0, 0.0, 0.0, //
        0.0, 0.0, amount, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]
}

pub fn contrast(amount: f32) -> ColorMatrix {
    let t = 0.5 - 0.5 * amount;
    [
        amount, 0.0, 0.0, 0.0, t, //
        0.0, amount, 0.0, 0.0, t, //
        0.0, 0.0, amount, 0.0, t, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]
}

pub fn hue_rotate(degrees: f32) -> ColorMatrix {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        0.213 + cos * 0.787 - sin * 0.213,
        0.715 - cos * 0.715 - sin * 0.715,
        0.072 - cos * 0.072 + sin * 0.928,
        0.0,
        0.0,
        0.213 - cos * 0.213 + sin * 0.143,
        0.715 + cos * 0.285 + sin * 0.140,
        0.072 - cos * 0.072 - sin * 0.283,
        0.0,
        0.0,
        0.213 - cos * 0.213 - sin * 0.787,
        0.715 - cos * 0.715 + sin * 0.715,
        0.072 + cos * 0.928 + sin * 0.072,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
        0.0,
    ]
}

pub fn saturate(amount: f32) -> ColorMatrix {
    [
        0.213 + 0.787 * amount,
        0.715 - 0.715 * amount,
        0.072 - 0.072 * amount,
        0.0,
        0.0,
        0.213 - 0.213 * amount,
        0.715 + 0.285 * amount,
        0.072 - 0.072 * amount,
        0.0,
        0.0,
        0.213 - 0.213 * amount,
        0.715 - 0.715 * amount,
        0.072 + 0.928 * amount,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
        0.0,
    ]
}

/// Matrices for the non-identity primitives of `filters`, in canonical order.
pub fn filter_chain(filters: &Filters) -> Vec<ColorMatrix> {
    let f = filters.clamped();
    let mut chain = Vec::with_capacity(4);
    if f.brightness != 100.0 {
        chain.push(brightness(f.brightness / 100.0));
    }
    if f.contrast != 100.0 {
        chain.push(contrast(f.contrast / 100.0));
    }
    if f.hue != 0.0 {
        chain.push(hue_rotate(f.hue));
    }
    if f.saturation != 100.0 {
        chain.push(saturate(f.saturation / 100.0));
    }
    chain
}

pub fn apply_filters(image: &mut RgbaImage, filters: &Filters) {
    let chain = filter_chain(filters);
    if chain.is_empty() {
        return;
    }
    for px in image.pixels_mut() {
        let mut c = [
            px[0] as f32 / 255.0,
            px[1] as f32 / 255.0,
            px[2] as f32 / 255.0,
            px[3] as f32 / 255.0,
        ];
        for m in &chain {
            c = apply_matrix(m, c);
        }
        for (dst, v) in px.0.iter_mut().zip(c) {
            *dst = (v * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn apply_matrix(m: &ColorMatrix, [r, g, b, a]: [f32; 4]) -> [f32; 4] {
    [
        (m[0] * r + m[1] * g + m[2] * b + m[3] * a + m[4]).clamp(0.0, 1.0),
        (m[5] * r + m[6] * g + m[7] * b + m[8] * a + m[9]).clamp(0.0, 1.0),
        (m[10] * r + m[11] * g + m[12] * b + m[13] * a + m[14]).clamp(0.0, 1.0),
        (m[15] * r + m[16] * g + m[17] * b + m[18] * a + m[19]).clamp(0.0, 1.0),
    ]
}

/// Luma grayscale lifted toward white, used for watermark cells.
pub fn wax_tone(image: &mut RgbaImage, lift: f32) {
    for px in image.pixels_mut() {
        let luma = 0.2126 * px[0] as f32 + 0.7152 * px[1] as f32 + 0.0722 * px[2] as f32;
        let v = (luma + (255.0 - luma) * lift).round().clamp(0.0, 255.0) as u8;
        px[0] = v;
        px[1] = v;
        px[2] = v;
    }
}
