/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

//! JSON shapes exchanged with design storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::element::{Element, ElementKind};
use crate::error::SceneError;
use crate::scene::{CanvasConfig, PaperConfig, Scene, WatermarkConfig};
use crate::space::Space;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DesignPayload {
    pub elements: Vec<Element>,
    pub canvas_size: CanvasSize,
    pub background_color: String,
    #[serde(default)]
    pub space: Space,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<WatermarkConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_config: Option<PaperConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DesignRecord {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub data: DesignPayload,
}

impl Scene {
    /// Snapshot for storage. Session-local image sources do not survive a
    /// reload, so they are dropped and the element comes back pending.
    pub fn to_payload(&self) -> DesignPayload {
        let elements = self
            .elements
            .iter()
            .cloned()
            .map(|mut element| {
                if let ElementKind::Image(img) = &mut element.kind {
                    if img.source.as_ref().is_some_and(|s| s.is_ephemeral()) {
                        debug!(id = %element.id, "stripping ephemeral image source");
                        img.source = None;
                    }
                }
                element
            })
            .collect();

        DesignPayload {
            elements,
            canvas_size: CanvasSize {
                width: self.canvas.width,
                height: self.canvas.height,
            },
            background_color: self.canvas.background.clone(),
            space: self.space,
            template_id: self.template_id.clone(),
            background_image: self.canvas.background_image.clone(),
            watermark: self.canvas.watermark,
            paper_config: self.paper.clone(),
        }
    }

    pub fn from_payload(payload: DesignPayload) -> Result<Self, SceneError> {
        let CanvasSize { width, height } = payload.canvas_size;
        if width == 0 || height == 0 {
            return Err(SceneError::InvalidCanvasSize { width, height });
        }
        if let Some(bad) = payload.elements.iter().find(|e| e.space() != payload.space) {
            return Err(SceneError::InvalidPayload(format!(
                "element {} is not in {:?} space",
                bad.id, payload.space
            )));
        }

        Ok(Self {
            canvas: CanvasConfig {
                width,
                height,
                background: payload.background_color,
                background_image: payload.background_image,
                watermark: payload.watermark,
            },
            space: payload.space,
            elements: payload.elements,
            template_id: payload.template_id,
            paper: payload.paper_config,
            last_swap: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ImageSource;
    use crate::space::{ElementSize, Point};

    #[test]
    fn ephemeral_sources_are_stripped() {
        let mut scene = Scene::new(Space::Percent, 800, 600);
        let kept = scene.add(
            Element::image(Point::new(50.0, 50.0), ElementSize::percent(30.0))
                .with_source(ImageSource::Permanent("https://cdn.example/a.png".into())),
        );
        let dropped = scene.add(
            Element::image(Point::new(20.0, 20.0), ElementSize::percent(10.0))
                .with_source(ImageSource::Ephemeral("blob:atelier/1".into())),
        );

        let payload = scene.to_payload();
        let src = |id| {
            payload.elements.iter().find(|e| e.id == id).unwrap().image_content().unwrap().source.clone()
        };
        assert!(src(kept).is_some());
        assert!(src(dropped).is_none());
        // The live scene is not touched.
        assert!(scene.get(dropped).unwrap().image_content().unwrap().source.is_some());
    }

    #[test]
    fn payload_json_uses_camel_case_layout() {
        let mut scene = Scene::new(Space::Percent, 800, 600);
        scene.template_id = Some("tshirt-front".into());
        let json = serde_json::to_value(scene.to_payload()).unwrap();
        assert_eq!(json["canvasSize"]["width"], 800);
        assert_eq!(json["backgroundColor"], "#ffffff");
        assert_eq!(json["templateId"], "tshirt-front");
    }

    #[test]
    fn payload_restores_scene() {
        let mut scene = Scene::new(Space::Pixel, 500, 500);
        scene.add(Element::image(Point::new(1.0, 2.0), ElementSize::pixels(10.0, 10.0)));
        let restored = Scene::from_payload(scene.to_payload()).unwrap();
        assert_eq!(restored, scene);
    }

    #[test]
    fn mixed_space_payload_is_rejected() {
        let mut scene = Scene::new(Space::Pixel, 500, 500);
        scene.elements.push(Element::image(Point::new(1.0, 2.0), ElementSize::percent(10.0)));
        assert!(matches!(Scene::from_payload(scene.to_payload()), Err(SceneError::InvalidPayload(_))));
    }
}
