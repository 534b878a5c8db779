/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use std::collections::HashMap;

use atelier_core::{ElementKind, Scene};
use image::{GenericImageView, RgbaImage};
use tracing::{debug, warn};

use crate::{RenderError, Resources};

/// Count-based fan-in over per-image decodes. The export finalizes once every
/// started decode either completed or failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeJoin {
    pub started: usize,
    pub completed: usize,
    pub failed: usize,
}

impl DecodeJoin {
    pub fn start(&mut self) {
        self.started += 1;
    }

    pub fn complete(&mut self) {
        self.completed += 1;
    }

    pub fn fail(&mut self) {
        self.failed += 1;
    }

    pub fn is_settled(&self) -> bool {
        self.completed + self.failed == self.started
    }
}

/// Decoded straight-alpha bitmaps keyed by source URL.
#[derive(Debug, Default)]
pub struct DecodedImages {
    pub images: HashMap<String, RgbaImage>,
    pub join: DecodeJoin,
}

impl DecodedImages {
    pub fn get(&self, source: &str) -> Option<&RgbaImage> {
        self.images.get(source)
    }
}

pub fn decode_bytes(bytes: &[u8]) -> Result<RgbaImage, RenderError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| RenderError::ImageError(e.to_string()))
}

/// Natural size of an encoded image without keeping the pixels.
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32), RenderError> {
    image::load_from_memory(bytes)
        .map(|img| img.dimensions())
        .map_err(|e| RenderError::ImageError(e.to_string()))
}

/// Starts a decode for every visible, sourced image element and collects the
/// results. Failures are logged and counted, never fatal. `cache` holds
/// decodes from earlier renders.
pub fn decode_scene_images(
    scene: &Scene,
    resources: &Resources,
    cache: &mut HashMap<String, RgbaImage>,
) -> DecodedImages {
    let mut out = DecodedImages::default();

    for element in scene.elements.iter().filter(|e| e.visible) {
        let ElementKind::Image(img) = &element.kind else {
            continue;
        };
        let Some(source) = img.source_url() else {
            debug!(id = %element.id, "image element has no source yet, skipping");
            continue;
        };
        if out.images.contains_key(source) {
            continue;
        }

        out.join.start();
        if let Some(cached) = cache.get(source) {
            out.images.insert(source.to_string(), cached.clone());
            out.join.complete();
            continue;
        }

        let decoded = match resources.get(source) {
            Some(bytes) => decode_bytes(bytes),
            None => Err(RenderError::ImageError(format!("resource '{source}' not found"))),
        };
        match decoded {
            Ok(rgba) => {
                cache.insert(source.to_string(), rgba.clone());
                out.images.insert(source.to_string(), rgba);
                out.join.complete();
            }
            Err(e) => {
                warn!(id = %element.id, source, error = %e, "image failed to load, element skipped");
                out.join.fail();
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::{Element, ElementSize, ImageSource, Point, Space};
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([1, 2, 3, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    fn sourced(url: &str) -> Element {
        Element::image(Point::new(50.0, 50.0), ElementSize::percent(20.0))
            .with_source(ImageSource::Permanent(url.to_string()))
    }

    #[test]
    fn join_counts_successes_and_failures() {
        let mut scene = Scene::new(Space::Percent, 100, 100);
        scene.add(sourced("ok.png"));
        scene.add(sourced("broken.png"));
        scene.add(sourced("missing.png"));
        scene.add(Element::image(Point::new(1.0, 1.0), ElementSize::percent(5.0)));

        let mut resources = Resources::new();
        resources.insert("ok.png".into(), png(4, 2));
        resources.insert("broken.png".into(), b"not an image".to_vec());

        let decoded = decode_scene_images(&scene, &resources, &mut HashMap::new());
        assert_eq!(decoded.join, DecodeJoin { started: 3, completed: 1, failed: 2 });
        assert!(decoded.join.is_settled());
        assert_eq!(decoded.get("ok.png").unwrap().dimensions(), (4, 2));
    }

    #[test]
    fn hidden_elements_are_not_decoded() {
        let mut scene = Scene::new(Space::Percent, 100, 100);
        let id = scene.add(sourced("ok.png"));
        scene.get_mut(id).unwrap().visible = false;
        let decoded = decode_scene_images(&scene, &Resources::new(), &mut HashMap::new());
        assert_eq!(decoded.join.started, 0);
    }

    #[test]
    fn probe_reads_natural_size() {
        assert_eq!(probe_dimensions(&png(7, 3)).unwrap(), (7, 3));
        assert!(probe_dimensions(b"nope").is_err());
    }
}
