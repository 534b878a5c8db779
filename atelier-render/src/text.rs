/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use atelier_core::{FontStyle, TextContent, TextExtent};
use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Style, SwashCache, Weight};
use tiny_skia::{Color, IntSize, Pixmap, PixmapPaint, Transform};
use tracing::{debug, warn};

pub const LINE_HEIGHT: f32 = 1.2;
/// Smallest size handed to the shaper. Stored designs may carry zero or garbage.
pub const MIN_FONT_SIZE: f32 = 1.0;

/// Resolves a CSS-like family list to the first family the font database knows.
fn resolve_family(font_system: &FontSystem, family_list: &str) -> Option<String> {
    for f in family_list.split(',').map(|s| s.trim().trim_matches('"').trim_matches('\'')) {
        match f.to_lowercase().as_str() {
            "arial" | "sans-serif" | "sans serif" | "system-ui" | "-apple-system" | "serif" | "mono"
            | "monospace" => return None,
            _ => {
                let normalized_query = f.to_lowercase().replace(' ', "");
                let mut found_name: Option<String> = None;
                font_system.db().faces().for_each(|face| {
                    for (name, _) in &face.families {
                        if name.to_lowercase().replace(' ', "") == normalized_query {
                            found_name = Some(name.clone());
                        }
                    }
                });
                if let Some(name) = found_name {
                    debug!(requested = f, matched = %name, "matched font family");
                    return Some(name);
                }
            }
        }
    }
    None
}

fn generic_family(family_list: &str) -> Family<'static> {
    for f in family_list.split(',').map(|s| s.trim().to_lowercase()) {
        match f.as_str() {
            "serif" => return Family::Serif,
            "mono" | "monospace" => return Family::Monospace,
            "arial" | "sans-serif" | "sans serif" | "system-ui" | "-apple-system" => return Family::SansSerif,
            _ => {}
        }
    }
    Family::SansSerif
}

/// Shapes `text` into a buffer using its family, weight and style.
pub fn shape(font_system: &mut FontSystem, text: &TextContent, font_size: f32) -> Buffer {
    let font_size = if font_size.is_finite() { font_size.max(MIN_FONT_SIZE) } else { MIN_FONT_SIZE };
    let metrics = Metrics::new(font_size, font_size * LINE_HEIGHT);
    let mut buffer = Buffer::new(font_system, metrics);

    let named = resolve_family(font_system, &text.font_family);
    let family = match &named {
        Some(name) => Family::Name(name.as_str()),
        None => {
            debug!(font_family = %text.font_family, "using generic family fallback");
            generic_family(&text.font_family)
        }
    };

    let mut attrs = Attrs::new().family(family).weight(Weight(text.font_weight));
    if text.font_style == FontStyle::Italic {
        attrs = attrs.style(Style::Italic);
    }

    buffer.set_text(font_system, &text.text, &attrs, Shaping::Advanced, None);
    buffer.shape_until_scroll(font_system, false);
    buffer
}

pub fn buffer_extent(buffer: &Buffer) -> TextExtent {
    let mut width: f32 = 0.0;
    let mut lines = 0usize;
    for run in buffer.layout_runs() {
        width = width.max(run.line_w);
        lines += 1;
    }
    TextExtent {
        width,
        height: lines.max(1) as f32 * buffer.metrics().line_height,
    }
}

/// Draws every glyph of `buffer` with `transform` mapping the buffer's
/// top-left corner into the canvas. Returns the number of glyphs drawn.
pub fn draw_buffer(
    pixmap: &mut Pixmap,
    font_system: &mut FontSystem,
    swash_cache: &mut SwashCache,
    buffer: &Buffer,
    color: Color,
    transform: Transform,
) -> usize {
    let mut glyphs_drawn = 0;

    for run in buffer.layout_runs() {
        for glyph in run.glyphs {
            let physical_glyph = glyph.physical((0., 0.), 1.0);

            let Some(image) = swash_cache.get_image(font_system, physical_glyph.cache_key) else {
                warn!("glyph image missing from swash cache");
                continue;
            };

            let width = image.placement.width;
            let height = image.placement.height;
            if width == 0 || height == 0 {
                continue;
            }

            let glyph_x = physical_glyph.x as f32 + image.placement.left as f32;
            let glyph_y = run.line_y + physical_glyph.y as f32 - image.placement.top as f32;

            let Some(size) = IntSize::from_wh(width, height) else {
                continue;
            };
            let mut pixels = Vec::with_capacity((width * height * 4) as usize);

            if image.data.len() == (width * height) as usize {
                let (r, g, b, a) = (color.red(), color.green(), color.blue(), color.alpha());
                for mask_val in image.data.iter() {
                    let alpha = a * (*mask_val as f32 / 255.0);
                    pixels.push((r * alpha * 255.0) as u8);
                    pixels.push((g * alpha * 255.0) as u8);
                    pixels.push((b * alpha * 255.0) as u8);
                    pixels.push((alpha * 255.0) as u8);
                }
            } else if image.data.len() == (width * height * 4) as usize {
                for chunk in image.data.chunks(4) {
                    let a_f = chunk[3] as f32 / 255.0;
                    pixels.push((chunk[0] as f32 * a_f) as u8);
                    pixels.push((chunk[1] as f32 * a_f) as u8);
                    pixels.push((chunk[2] as f32 * a_f) as u8);
                    pixels.push(chunk[3]);
                }
            } else {
                warn!(len = image.data.len(), "unknown glyph image format from swash");
                continue;
            }

            if let Some(glyph_pixmap) = Pixmap::from_vec(pixels, size) {
                pixmap.draw_pixmap(
                    0,
                    0,
                    glyph_pixmap.as_ref(),
                    &PixmapPaint::default(),
                    transform.pre_translate(glyph_x, glyph_y),
                    None,
                );
                glyphs_drawn += 1;
            }
        }
    }

    glyphs_drawn
}
