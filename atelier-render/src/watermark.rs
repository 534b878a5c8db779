/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use atelier_core::WatermarkConfig;
use image::{RgbaImage, imageops};
use tiny_skia::{BlendMode, FilterQuality, Paint, Pattern, Pixmap, Rect, SpreadMode, Transform};

use crate::RenderError;
use crate::filters::wax_tone;
use crate::paint::pixmap_from_rgba;

/// How far the grayscale cell is lifted toward white.
pub const WAX_LIFT: f32 = 0.35;

/// One square pattern cell: the source fitted and centred on a transparent
/// tile, then toned down to a light gray.
pub fn pattern_cell(source: &RgbaImage, side: u32) -> Result<RgbaImage, RenderError> {
    if side == 0 {
        return Err(RenderError::InvalidDimensions("watermark pattern size must be > 0".into()));
    }
    let (fw, fh) = fit(source.width(), source.height(), side);
    let fitted = imageops::resize(source, fw.clamp(1, side), fh.clamp(1, side), imageops::FilterType::Triangle);
    let mut cell = RgbaImage::new(side, side);
    let x = (side - fitted.width()) / 2;
    let y = (side - fitted.height()) / 2;
    imageops::overlay(&mut cell, &fitted, x as i64, y as i64);
    wax_tone(&mut cell, WAX_LIFT);
    Ok(cell)
}

fn fit(w: u32, h: u32, side: u32) -> (u32, u32) {
    if w == 0 || h == 0 {
        return (side, side);
    }
    if w >= h {
        (side, (side as u64 * h as u64 / w as u64) as u32)
    } else {
        ((side as u64 * w as u64 / h as u64) as u32, side)
    }
}

/// Tiles `cell` over the whole canvas with a multiply blend, the pattern
/// rotated about the canvas centre.
pub fn paint_watermark(pixmap: &mut Pixmap, cell: &RgbaImage, config: &WatermarkConfig) -> Result<(), RenderError> {
    let cell_pixmap = pixmap_from_rgba(cell)?;
    let cx = pixmap.width() as f32 / 2.0;
    let cy = pixmap.height() as f32 / 2.0;

    let mut paint = Paint::default();
    paint.shader = Pattern::new(
        cell_pixmap.as_ref(),
        SpreadMode::Repeat,
        FilterQuality::Bilinear,
        config.opacity.clamp(0.0, 1.0),
        Transform::from_rotate_at(config.angle, cx, cy),
    );
    paint.blend_mode = BlendMode::Multiply;
    paint.anti_alias = true;

    let rect = Rect::from_xywh(0.0, 0.0, pixmap.width() as f32, pixmap.height() as f32)
        .ok_or_else(|| RenderError::InvalidDimensions("canvas has no area".into()))?;
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn cell_is_square_gray_and_centered() {
        let src = RgbaImage::from_pixel(40, 20, Rgba([200, 30, 30, 255]));
        let cell = pattern_cell(&src, 10).unwrap();
        assert_eq!(cell.dimensions(), (10, 10));
        // Letterboxed rows stay transparent.
        assert_eq!(cell.get_pixel(5, 0).0[3], 0);
        let [r, g, b, a] = cell.get_pixel(5, 5).0;
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(a, 255);
    }

    #[test]
    fn zero_side_is_rejected() {
        let src = RgbaImage::new(4, 4);
        assert!(pattern_cell(&src, 0).is_err());
    }

    #[test]
    fn multiply_only_darkens() {
        let mut pixmap = Pixmap::new(32, 32).unwrap();
        pixmap.fill(tiny_skia::Color::WHITE);
        let cell = RgbaImage::from_pixel(8, 8, Rgba([100, 100, 100, 255]));
        let config = WatermarkConfig { enabled: true, pattern_size: 8, opacity: 0.5, angle: 30.0 };
        paint_watermark(&mut pixmap, &cell, &config).unwrap();

        let px = pixmap.pixel(16, 16).unwrap();
        assert!(px.red() < 255);
        assert!(px.red() > 100);
        assert_eq!(px.alpha(), 255);
    }
}
