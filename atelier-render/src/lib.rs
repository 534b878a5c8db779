/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

pub mod decode;
pub mod export;
pub mod filters;
pub mod paint;
pub mod text;
pub mod watermark;

use std::collections::{HashMap, HashSet};

use atelier_core::hit_test::text_rect;
use atelier_core::{
    Element, ElementKind, PaperConfig, PixelRect, Scene, TextContent, TextExtent, TextMeasure,
};
use cosmic_text::{FontSystem, SwashCache};
use image::RgbaImage;
use thiserror::Error;
use tiny_skia::{Pixmap, Transform};
use tracing::{debug, info, warn};

pub use decode::{DecodeJoin, DecodedImages, probe_dimensions};
pub use export::{ExportArtifact, export_file_name};

use crate::decode::decode_scene_images;
use crate::paint::{PreparedImage, draw_shape, local_transform, parse_color, pixmap_from_rgba};

/// Encoded images and fonts keyed by source URL or file name.
pub type Resources = HashMap<String, Vec<u8>>;

/// Share of the smaller grid cell side one repeated copy spans before the
/// template family multiplier.
pub const GRID_COPY_FILL: f32 = 0.6;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to create pixmap: {0}")]
    PixmapCreationError(String),

    #[error("Invalid color format: {0}")]
    InvalidColorFormat(String),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Image decoding error: {0}")]
    ImageError(String),

    #[error("Background image failed to load: {0}")]
    BackgroundLoad(String),

    #[error("Export finalized with {pending} image decodes unresolved")]
    DecodeIncomplete { pending: usize },

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

pub struct Renderer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    pixmap_buffer: Option<Pixmap>,
    image_cache: HashMap<String, RgbaImage>,
    loaded_fonts: HashSet<String>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasure for Renderer {
    fn measure(&mut self, text: &TextContent) -> TextExtent {
        let buffer = text::shape(&mut self.font_system, text, text.font_size);
        text::buffer_extent(&buffer)
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
            pixmap_buffer: None,
            image_cache: HashMap::new(),
            loaded_fonts: HashSet::new(),
        }
    }

    /// Drops cached decodes, e.g. after an upload replaced a source URL's bytes.
    pub fn clear_image_cache(&mut self) {
        self.image_cache.clear();
    }

    fn load_fonts(&mut self, resources: &Resources) {
        let mut new_fonts = false;
        for (name, data) in resources {
            if (name.ends_with(".ttf") || name.ends_with(".otf") || name.ends_with(".woff2"))
                && !self.loaded_fonts.contains(name)
            {
                self.font_system.db_mut().load_font_data(data.clone());
                self.loaded_fonts.insert(name.clone());
                new_fonts = true;
            }
        }

        if !new_fonts {
            return;
        }

        let mut first_family = None;
        self.font_system.db().faces().for_each(|face| {
            for (name, _) in &face.families {
                debug!(family = %name, "font family available");
            }
            if first_family.is_none() {
                if let Some((name, _)) = face.families.first() {
                    first_family = Some(name.clone());
                }
            }
        });

        if let Some(family) = first_family {
            info!(%family, "setting default font family");
            let db = self.font_system.db_mut();
            db.set_sans_serif_family(family.clone());
            db.set_serif_family(family.clone());
            db.set_monospace_family(family.clone());
            db.set_cursive_family(family.clone());
            db.set_fantasy_family(family);
        }
    }

    /// Renders the scene to the internal buffer and returns the raw pixel data (premultiplied RGBA8).
    /// The buffer is reused between calls of the same canvas size.
    pub fn render_raw(&mut self, scene: &Scene, resources: &Resources) -> Result<&[u8], RenderError> {
        self.load_fonts(resources);

        let (w, h) = (scene.canvas.width, scene.canvas.height);
        let mut pixmap = match self.pixmap_buffer.take() {
            Some(p) if p.width() == w && p.height() == h => p,
            _ => Pixmap::new(w, h)
                .ok_or_else(|| RenderError::PixmapCreationError(format!("invalid canvas dimensions {w}x{h}")))?,
        };

        let result = self.compose(&mut pixmap, scene, resources);
        self.pixmap_buffer = Some(pixmap);
        result?;

        Ok(self.pixmap_buffer.as_ref().map(|p| p.data()).unwrap_or_default())
    }

    /// Renders the scene and encodes it as PNG.
    pub fn render(&mut self, scene: &Scene, resources: &Resources) -> Result<Vec<u8>, RenderError> {
        self.render_raw(scene, resources)?;

        self.pixmap_buffer
            .as_ref()
            .ok_or_else(|| RenderError::PixmapCreationError("no rendered surface".into()))?
            .encode_png()
            .map_err(|e| RenderError::EncodingError(e.to_string()))
    }

    fn compose(&mut self, pixmap: &mut Pixmap, scene: &Scene, resources: &Resources) -> Result<(), RenderError> {
        let background = parse_color(&scene.canvas.background)
            .ok_or_else(|| RenderError::InvalidColorFormat(scene.canvas.background.clone()))?;
        pixmap.fill(background);

        if let Some(key) = &scene.canvas.background_image {
            self.draw_background_image(pixmap, key, resources)?;
        }

        let decoded = decode_scene_images(scene, resources, &mut self.image_cache);

        if let Some(config) = scene.canvas.watermark.filter(|w| w.enabled) {
            let source = scene
                .elements
                .iter()
                .filter(|e| e.visible)
                .find_map(|e| e.image_content().and_then(|img| img.source_url()).and_then(|url| decoded.get(url)));
            match source {
                Some(image) => {
                    let cell = watermark::pattern_cell(image, config.pattern_size)?;
                    watermark::paint_watermark(pixmap, &cell, &config)?;
                }
                None => debug!("watermark enabled but no loaded image to build it from"),
            }
        }

        let drawn = match scene.paper.as_ref().filter(|p| p.repeat) {
            Some(paper) => self.draw_grid_pattern(pixmap, scene, paper, &decoded)?,
            None => {
                let mut drawn = 0;
                for element in scene.draw_order() {
                    if self.draw_element(pixmap, scene, element, &decoded)? {
                        drawn += 1;
                    }
                }
                drawn
            }
        };

        if !decoded.join.is_settled() {
            let join = decoded.join;
            return Err(RenderError::DecodeIncomplete {
                pending: join.started - join.completed - join.failed,
            });
        }

        info!(
            width = scene.canvas.width,
            height = scene.canvas.height,
            drawn,
            failed_images = decoded.join.failed,
            "composed scene"
        );
        Ok(())
    }

    fn draw_background_image(&mut self, pixmap: &mut Pixmap, key: &str, resources: &Resources) -> Result<(), RenderError> {
        let (w, h) = (pixmap.width(), pixmap.height());
        let cache_key = format!("bg_{key}_{w}_{h}");

        if !self.image_cache.contains_key(&cache_key) {
            let bytes = resources
                .get(key)
                .ok_or_else(|| RenderError::BackgroundLoad(format!("resource '{key}' not found")))?;
            let dynamic_image =
                image::load_from_memory(bytes).map_err(|e| RenderError::BackgroundLoad(format!("{key}: {e}")))?;
            let resized = dynamic_image
                .resize_to_fill(w, h, image::imageops::FilterType::Lanczos3)
                .to_rgba8();
            self.image_cache.insert(cache_key.clone(), resized);
        }

        if let Some(bg) = self.image_cache.get(&cache_key) {
            let bg_pixmap = pixmap_from_rgba(bg)?;
            pixmap.draw_pixmap(0, 0, bg_pixmap.as_ref(), &tiny_skia::PixmapPaint::default(), Transform::identity(), None);
        }
        Ok(())
    }

    /// Draws one element. Returns `false` when it was skipped.
    fn draw_element(
        &mut self,
        pixmap: &mut Pixmap,
        scene: &Scene,
        element: &Element,
        decoded: &DecodedImages,
    ) -> Result<bool, RenderError> {
        let (cw, ch) = scene.canvas_size_f32();

        match &element.kind {
            ElementKind::Image(img) => {
                let Some(source) = img.source_url().and_then(|url| decoded.get(url)) else {
                    return Ok(false);
                };
                let rect = image_rect(element, source, cw, ch);
                if rect.width < 1.0 || rect.height < 1.0 {
                    warn!(id = %element.id, "image element too small to draw");
                    return Ok(false);
                }
                let mut filtered = source.clone();
                filters::apply_filters(&mut filtered, &img.filters);
                let prepared = PreparedImage::new(&filtered, rect.width, rect.height)?;
                prepared.draw(pixmap, local_transform(rect, element.rotation));
            }
            ElementKind::Shape(shape) => {
                let rect = element.pixel_rect(cw, ch);
                if let Err(e) = draw_shape(pixmap, shape, rect.width, rect.height, local_transform(rect, element.rotation)) {
                    warn!(id = %element.id, error = %e, "shape skipped");
                    return Ok(false);
                }
            }
            ElementKind::Text(content) => {
                let Some(color) = parse_color(&content.text_color) else {
                    warn!(id = %element.id, color = %content.text_color, "text skipped: invalid colour");
                    return Ok(false);
                };
                let buffer = text::shape(&mut self.font_system, content, content.font_size);
                let extent = text::buffer_extent(&buffer);
                let rect = text_rect(element.anchor_px(cw, ch), content.text_align, extent);
                let glyphs = text::draw_buffer(
                    pixmap,
                    &mut self.font_system,
                    &mut self.swash_cache,
                    &buffer,
                    color,
                    local_transform(rect, element.rotation),
                );
                debug!(id = %element.id, glyphs, "drew text");
            }
        }
        Ok(true)
    }

    /// Repeating-template export: one copy of the first visible image per grid cell.
    fn draw_grid_pattern(
        &mut self,
        pixmap: &mut Pixmap,
        scene: &Scene,
        paper: &PaperConfig,
        decoded: &DecodedImages,
    ) -> Result<usize, RenderError> {
        let Some((element, img, source)) = scene.elements.iter().filter(|e| e.visible).find_map(|e| {
            let img = e.image_content()?;
            let source = decoded.get(img.source_url()?)?;
            Some((e, img, source))
        }) else {
            warn!("grid pattern export has no loaded image to repeat");
            return Ok(0);
        };

        let (cw, ch) = scene.canvas_size_f32();
        let layout = &paper.layout;
        let (cell_w, cell_h) = layout
            .cell_size()
            .map_err(|e| RenderError::InvalidDimensions(e.to_string()))?;
        let centers = layout
            .cell_centers()
            .map_err(|e| RenderError::InvalidDimensions(e.to_string()))?;

        let cell_px = (cell_w * cw / 100.0).min(cell_h * ch / 100.0);
        let width = cell_px * GRID_COPY_FILL * paper.family.scale_multiplier();
        let ratio = element
            .aspect_ratio
            .unwrap_or(source.width() as f32 / source.height().max(1) as f32);
        let height = width / ratio;

        let mut filtered = source.clone();
        filters::apply_filters(&mut filtered, &img.filters);
        let prepared = PreparedImage::new(&filtered, width, height)?;

        for center in &centers {
            let rect = PixelRect::from_center(center.x * cw / 100.0, center.y * ch / 100.0, width, height);
            prepared.draw(pixmap, local_transform(rect, element.rotation));
        }

        debug!(copies = centers.len(), family = ?paper.family, "drew grid pattern");
        Ok(centers.len())
    }
}

/// Pixel box of an image element, taking the aspect ratio from the decoded
/// bitmap when the element has not recorded one yet.
fn image_rect(element: &Element, source: &RgbaImage, cw: f32, ch: f32) -> PixelRect {
    if element.aspect_ratio.is_some() || source.height() == 0 {
        return element.pixel_rect(cw, ch);
    }
    let mut sized = element.clone();
    sized.set_aspect_ratio_once(source.width() as f32 / source.height() as f32);
    sized.pixel_rect(cw, ch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::{
        ElementSize, GridLayout, ImageSource, Point, ShapeType, Space, TemplateFamily, TextContent, WatermarkConfig,
    };
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    /// 100x100: green left half, blue right half, red 40x40 centre.
    fn marker_png() -> Vec<u8> {
        let img = RgbaImage::from_fn(100, 100, |x, y| {
            if (30..70).contains(&x) && (30..70).contains(&y) {
                Rgba(RED)
            } else if x < 50 {
                Rgba(GREEN)
            } else {
                Rgba(BLUE)
            }
        });
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    fn px(renderer: &Renderer, x: u32, y: u32) -> [u8; 4] {
        let p = renderer.pixmap_buffer.as_ref().unwrap().pixel(x, y).unwrap();
        [p.red(), p.green(), p.blue(), p.alpha()]
    }

    fn close(a: [u8; 4], b: [u8; 4]) -> bool {
        a.iter().zip(b).all(|(x, y)| (*x as i16 - y as i16).abs() <= 8)
    }

    fn centered_scene(rotation: f32) -> (Scene, Resources) {
        let mut scene = Scene::new(Space::Percent, 400, 300);
        scene.add(
            Element::image(Point::new(50.0, 50.0), ElementSize::percent(30.0))
                .with_source(ImageSource::Permanent("marker.png".into()))
                .with_rotation(rotation),
        );
        let mut resources = Resources::new();
        resources.insert("marker.png".into(), marker_png());
        (scene, resources)
    }

    #[test]
    fn centered_image_keeps_centre_under_rotation() {
        let mut renderer = Renderer::new();

        let (scene, resources) = centered_scene(0.0);
        renderer.render_raw(&scene, &resources).unwrap();
        // Element box: 120x120 centred on (200, 150), spanning x 140..260.
        assert!(close(px(&renderer, 200, 150), RED));
        assert!(close(px(&renderer, 150, 150), GREEN));
        assert!(close(px(&renderer, 250, 150), BLUE));
        assert!(close(px(&renderer, 10, 10), [255, 255, 255, 255]));

        let (scene, resources) = centered_scene(180.0);
        renderer.render_raw(&scene, &resources).unwrap();
        assert!(close(px(&renderer, 200, 150), RED));
        assert!(close(px(&renderer, 150, 150), BLUE));
        assert!(close(px(&renderer, 250, 150), GREEN));
    }

    #[test]
    fn higher_z_occludes_lower() {
        let mut scene = Scene::new(Space::Percent, 100, 100);
        let mut red = Element::shape(ShapeType::Rectangle, Point::new(50.0, 50.0), ElementSize::percent(50.0));
        if let ElementKind::Shape(s) = &mut red.kind {
            s.fill_color = "#ff0000".into();
        }
        let mut blue = red.clone();
        blue.id = atelier_core::ElementId::new();
        if let ElementKind::Shape(s) = &mut blue.kind {
            s.fill_color = "#0000ff".into();
        }
        let blue_id = scene.add(blue);
        scene.add(red);
        scene.bring_to_front(scene.index_of(blue_id).unwrap());

        let mut renderer = Renderer::new();
        renderer.render_raw(&scene, &Resources::new()).unwrap();
        assert_eq!(px(&renderer, 50, 50), BLUE);
    }

    #[test]
    fn missing_element_image_is_skipped() {
        let (scene, _) = centered_scene(0.0);
        let mut renderer = Renderer::new();
        let png = renderer.render(&scene, &Resources::new()).unwrap();
        assert!(!png.is_empty());
        assert_eq!(px(&renderer, 200, 150), [255, 255, 255, 255]);
    }

    #[test]
    fn background_image_failure_aborts() {
        let (mut scene, resources) = centered_scene(0.0);
        scene.canvas.background_image = Some("template.png".into());
        let mut renderer = Renderer::new();
        assert!(matches!(
            renderer.render(&scene, &resources),
            Err(RenderError::BackgroundLoad(_))
        ));
    }

    #[test]
    fn background_image_is_drawn() {
        let (mut scene, mut resources) = centered_scene(0.0);
        scene.elements.clear();
        scene.canvas.background_image = Some("template.png".into());
        let template = RgbaImage::from_pixel(8, 6, Rgba(GREEN));
        let mut bytes = Vec::new();
        template.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        resources.insert("template.png".into(), bytes);

        let mut renderer = Renderer::new();
        renderer.render_raw(&scene, &resources).unwrap();
        assert!(close(px(&renderer, 5, 5), GREEN));
    }

    #[test]
    fn invalid_canvas_is_reported() {
        let scene = Scene::new(Space::Percent, 0, 10);
        let mut renderer = Renderer::new();
        assert!(matches!(
            renderer.render_raw(&scene, &Resources::new()),
            Err(RenderError::PixmapCreationError(_))
        ));
    }

    #[test]
    fn watermark_tints_empty_canvas() {
        let (mut scene, resources) = centered_scene(0.0);
        scene.canvas.watermark = Some(WatermarkConfig {
            enabled: true,
            pattern_size: 40,
            opacity: 0.8,
            angle: 0.0,
        });
        let mut renderer = Renderer::new();
        renderer.render_raw(&scene, &resources).unwrap();
        // Away from the element the canvas is no longer pure white.
        let corner = px(&renderer, 20, 20);
        assert_ne!(corner, [255, 255, 255, 255]);
        assert_eq!(corner[0], corner[1]);
    }

    #[test]
    fn grid_pattern_repeats_first_image() {
        let (mut scene, resources) = centered_scene(0.0);
        scene.paper = Some(PaperConfig {
            layout: GridLayout::new(2, 2, 0.0),
            family: TemplateFamily::Standard,
            repeat: true,
        });
        let mut renderer = Renderer::new();
        renderer.render_raw(&scene, &resources).unwrap();
        // Cell centres at 25% / 75%; centre of each copy is red.
        for (x, y) in [(100, 75), (300, 75), (100, 225), (300, 225)] {
            assert!(close(px(&renderer, x, y), RED), "cell at ({x}, {y})");
        }
        // Nothing drawn at the canvas centre.
        assert_eq!(px(&renderer, 200, 150), [255, 255, 255, 255]);
    }

    #[test]
    fn text_is_measured_and_drawn() {
        let mut scene = Scene::new(Space::Percent, 200, 100);
        let mut content = TextContent::new("Atelier", 32.0);
        content.text_color = "#000000".into();
        scene.add(Element::text(content.clone(), Point::new(50.0, 50.0), ElementSize::percent(40.0)));

        let mut renderer = Renderer::new();
        let extent = renderer.measure(&content);
        assert!(extent.height > 0.0);
        renderer.render(&scene, &Resources::new()).unwrap();
    }

    #[test]
    fn zero_font_size_is_floored() {
        let mut scene = Scene::new(Space::Percent, 200, 100);
        let content = TextContent::new("hi", 0.0);
        let id = scene.add(Element::text(content.clone(), Point::new(50.0, 50.0), ElementSize::percent(40.0)));

        let mut renderer = Renderer::new();
        assert!(renderer.measure(&content).height > 0.0);
        assert!(renderer.measure(&TextContent::new("hi", f32::NAN)).height > 0.0);
        assert_eq!(scene.hit_test(Point::new(100.0, 50.0), (200.0, 100.0), &mut renderer), Some(id));
        renderer.render(&scene, &Resources::new()).unwrap();
    }

    #[test]
    fn bad_colour_skips_only_that_element() {
        let mut scene = Scene::new(Space::Percent, 100, 100);
        let mut named = Element::shape(ShapeType::Rectangle, Point::new(25.0, 50.0), ElementSize::percent(30.0));
        if let ElementKind::Shape(s) = &mut named.kind {
            s.fill_color = "red".into();
        }
        let mut blue = Element::shape(ShapeType::Rectangle, Point::new(75.0, 50.0), ElementSize::percent(30.0));
        if let ElementKind::Shape(s) = &mut blue.kind {
            s.fill_color = "#0000ff".into();
        }
        let mut label = TextContent::new("x", 12.0);
        label.text_color = "blue-ish".into();
        scene.add(named);
        scene.add(blue);
        scene.add(Element::text(label, Point::new(50.0, 10.0), ElementSize::percent(10.0)));

        let mut renderer = Renderer::new();
        renderer.render_raw(&scene, &Resources::new()).unwrap();
        assert_eq!(px(&renderer, 25, 50), [255, 255, 255, 255]);
        assert_eq!(px(&renderer, 75, 50), BLUE);
    }
}
