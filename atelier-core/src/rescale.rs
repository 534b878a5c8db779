/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use tracing::debug;

use crate::element::ElementKind;
use crate::error::SceneError;
use crate::scene::Scene;
use crate::space::ElementSize;

impl Scene {
    /// Changes the output canvas size, optionally rescaling every element.
    ///
    /// Positions scale per axis. Scalar percent sizes and font sizes scale by
    /// the smaller factor so shapes keep their proportions; pixel sizes scale
    /// per axis. Without `scale_elements` element numbers stay as they are.
    pub fn resize_canvas(&mut self, width: u32, height: u32, scale_elements: bool) -> Result<(), SceneError> {
        if width == 0 || height == 0 {
            return Err(SceneError::InvalidCanvasSize { width, height });
        }
        let (old_w, old_h) = self.canvas_size_f32();
        self.canvas.width = width;
        self.canvas.height = height;

        if !scale_elements || self.elements.is_empty() || old_w <= 0.0 || old_h <= 0.0 {
            return Ok(());
        }

        let sx = width as f32 / old_w;
        let sy = height as f32 / old_h;
        let uniform = sx.min(sy);

        for element in &mut self.elements {
            element.position.x *= sx;
            element.position.y *= sy;
            element.size = match element.size {
                ElementSize::Percent { value } => ElementSize::percent(value * uniform),
                ElementSize::Pixels { width, height } => ElementSize::pixels(width * sx, height * sy),
            };
            if let ElementKind::Text(text) = &mut element.kind {
                text.font_size *= uniform;
            }
        }

        debug!(width, height, sx, sy, count = self.elements.len(), "rescaled elements to new canvas");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::element::Element;
    use crate::error::SceneError;
    use crate::scene::Scene;
    use crate::space::{ElementSize, Point, Space};

    fn scene() -> Scene {
        let mut scene = Scene::new(Space::Percent, 800, 600);
        scene.add(Element::image(Point::new(10.0, 20.0), ElementSize::percent(30.0)));
        scene.add(Element::image(Point::new(40.0, 50.0), ElementSize::percent(10.0)));
        scene
    }

    #[test]
    fn widening_doubles_x_only() {
        let mut scene = scene();
        scene.resize_canvas(1600, 600, true).unwrap();
        let pos: Vec<Point> = scene.elements.iter().map(|e| e.position).collect();
        assert_eq!(pos, vec![Point::new(20.0, 20.0), Point::new(80.0, 50.0)]);
        // min(2, 1) keeps the scalar size unchanged
        assert_eq!(scene.elements[0].size, ElementSize::percent(30.0));
        assert_eq!((scene.canvas.width, scene.canvas.height), (1600, 600));
    }

    #[test]
    fn without_scaling_numbers_are_unchanged() {
        let mut scene = scene();
        let before = scene.elements.clone();
        scene.resize_canvas(1600, 600, false).unwrap();
        assert_eq!(scene.elements, before);
        assert_eq!(scene.canvas.width, 1600);
    }

    #[test]
    fn pixel_sizes_scale_per_axis() {
        let mut scene = Scene::new(Space::Pixel, 400, 400);
        scene.add(Element::image(Point::new(100.0, 100.0), ElementSize::pixels(50.0, 40.0)));
        scene.resize_canvas(800, 200, true).unwrap();
        let e = &scene.elements[0];
        assert_eq!(e.position, Point::new(200.0, 50.0));
        assert_eq!(e.size, ElementSize::pixels(100.0, 20.0));
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut scene = scene();
        assert_eq!(
            scene.resize_canvas(0, 600, true),
            Err(SceneError::InvalidCanvasSize { width: 0, height: 600 })
        );
        assert_eq!(scene.canvas.width, 800);
    }
}
