/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use atelier_core::color::parse_hex_color;
use atelier_core::{PixelRect, ShapeContent, ShapeType};
use image::{RgbaImage, imageops};
use tiny_skia::{
    Color, FillRule, FilterQuality, IntSize, Paint, PathBuilder, Pattern, Pixmap, Rect, SpreadMode, Stroke,
    Transform,
};

use crate::RenderError;

pub fn parse_color(hex: &str) -> Option<Color> {
    let [r, g, b, a] = parse_hex_color(hex)?;
    Some(Color::from_rgba8(r, g, b, a))
}

/// Converts straight RGBA8 into a premultiplied pixmap.
pub fn pixmap_from_rgba(image: &RgbaImage) -> Result<Pixmap, RenderError> {
    let (w, h) = image.dimensions();
    let size = IntSize::from_wh(w, h)
        .ok_or_else(|| RenderError::InvalidDimensions(format!("image of {w}x{h}")))?;

    let mut pixels = Vec::with_capacity((w * h * 4) as usize);
    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        let a_f = a as f32 / 255.0;
        pixels.push((r as f32 * a_f).round() as u8);
        pixels.push((g as f32 * a_f).round() as u8);
        pixels.push((b as f32 * a_f).round() as u8);
        pixels.push(a);
    }

    Pixmap::from_vec(pixels, size).ok_or_else(|| RenderError::PixmapCreationError(format!("{w}x{h} image")))
}

/// Maps an element's local box `(0, 0, w, h)` onto the canvas: rotated by
/// `rotation` degrees clockwise about the centre of `rect`.
pub fn local_transform(rect: PixelRect, rotation: f32) -> Transform {
    let center = rect.center();
    Transform::from_translate(-rect.width / 2.0, -rect.height / 2.0)
        .post_rotate(rotation)
        .post_translate(center.x, center.y)
}

/// Image already filtered, resized to the target box and turned into a pixmap.
pub struct PreparedImage {
    pub pixmap: Pixmap,
}

impl PreparedImage {
    pub fn new(filtered: &RgbaImage, width: f32, height: f32) -> Result<Self, RenderError> {
        let target_w = width.round() as u32;
        let target_h = height.round() as u32;
        if target_w == 0 || target_h == 0 {
            return Err(RenderError::InvalidDimensions(format!("image box {width}x{height}")));
        }
        let resized = if filtered.dimensions() == (target_w, target_h) {
            filtered.clone()
        } else {
            imageops::resize(filtered, target_w, target_h, imageops::FilterType::Lanczos3)
        };
        Ok(Self {
            pixmap: pixmap_from_rgba(&resized)?,
        })
    }

    pub fn draw(&self, target: &mut Pixmap, transform: Transform) {
        let w = self.pixmap.width() as f32;
        let h = self.pixmap.height() as f32;
        let mut paint = Paint::default();
        paint.shader = Pattern::new(
            self.pixmap.as_ref(),
            SpreadMode::Pad,
            FilterQuality::Bilinear,
            1.0,
            Transform::identity(),
        );
        paint.anti_alias = true;

        if let Some(rect) = Rect::from_xywh(0.0, 0.0, w, h) {
            target.fill_rect(rect, &paint, transform, None);
        }
    }
}

pub fn draw_shape(
    target: &mut Pixmap,
    shape: &ShapeContent,
    width: f32,
    height: f32,
    transform: Transform,
) -> Result<(), RenderError> {
    let rect = Rect::from_xywh(0.0, 0.0, width, height)
        .ok_or_else(|| RenderError::InvalidDimensions("shape width/height must be > 0".into()))?;

    let path = match shape.shape_type {
        ShapeType::Rectangle => PathBuilder::from_rect(rect),
        ShapeType::Circle => PathBuilder::from_oval(rect)
            .ok_or_else(|| RenderError::InvalidDimensions("circle has no area".into()))?,
    };

    let fill = parse_color(&shape.fill_color)
        .ok_or_else(|| RenderError::InvalidColorFormat(shape.fill_color.clone()))?;
    let mut paint = Paint::default();
    paint.set_color(fill);
    paint.anti_alias = true;
    target.fill_path(&path, &paint, FillRule::Winding, transform, None);

    if shape.stroke_width > 0.0 {
        let stroke_color = parse_color(&shape.stroke_color)
            .ok_or_else(|| RenderError::InvalidColorFormat(shape.stroke_color.clone()))?;
        paint.set_color(stroke_color);
        let stroke = Stroke {
            width: shape.stroke_width,
            ..Stroke::default()
        };
        target.stroke_path(&path, &paint, &stroke, transform, None);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn premultiplies_alpha() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 128]));
        let pixmap = pixmap_from_rgba(&img).unwrap();
        let px = pixmap.pixel(0, 0).unwrap();
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (100, 50, 25, 128));
    }

    #[test]
    fn local_transform_keeps_center_fixed() {
        let rect = PixelRect { x: 10.0, y: 20.0, width: 40.0, height: 20.0 };
        let t = local_transform(rect, 180.0);
        let mut p = [tiny_skia::Point::from_xy(20.0, 10.0)];
        t.map_points(&mut p);
        assert!((p[0].x - 30.0).abs() < 1e-3);
        assert!((p[0].y - 30.0).abs() < 1e-3);
    }

    #[test]
    fn circle_leaves_corners_empty() {
        let mut pixmap = Pixmap::new(20, 20).unwrap();
        let shape = ShapeContent {
            shape_type: ShapeType::Circle,
            fill_color: "#ff0000".into(),
            stroke_color: "#000000".into(),
            stroke_width: 0.0,
        };
        draw_shape(&mut pixmap, &shape, 20.0, 20.0, Transform::identity()).unwrap();
        assert_eq!(pixmap.pixel(0, 0).unwrap().alpha(), 0);
        assert_eq!(pixmap.pixel(10, 10).unwrap().red(), 255);
    }

    #[test]
    fn bad_fill_color_is_an_error() {
        let mut pixmap = Pixmap::new(4, 4).unwrap();
        let shape = ShapeContent {
            shape_type: ShapeType::Rectangle,
            fill_color: "red".into(),
            stroke_color: "#000".into(),
            stroke_width: 1.0,
        };
        assert!(matches!(
            draw_shape(&mut pixmap, &shape, 4.0, 4.0, Transform::identity()),
            Err(RenderError::InvalidColorFormat(_))
        ));
    }
}
