/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arrange::GridLayout;
use crate::element::{Element, ElementId};
use crate::error::SceneError;
use crate::space::Space;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub space: Space,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub paper: Option<PaperConfig>,
    /// Pair exchanged by the last raise or lower, used to break z ties.
    #[serde(skip)]
    pub(crate) last_swap: Option<(ElementId, ElementId)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub background: String,
    /// Template image drawn over the background colour. Must decode for export to proceed.
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub watermark: Option<WatermarkConfig>,
}

impl CanvasConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: "#ffffff".to_string(),
            background_image: None,
            watermark: None,
        }
    }
}

/// Tiled "wax effect" derived from the first loaded image element.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WatermarkConfig {
    pub enabled: bool,
    /// Side of one pattern cell in pixels.
    pub pattern_size: u32,
    pub opacity: f32,
    /// Rotation of the whole pattern about the canvas centre, in degrees.
    pub angle: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            pattern_size: 120,
            opacity: 0.15,
            angle: -30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateFamily {
    #[default]
    Standard,
    Sparse,
    LargeSections,
}

impl TemplateFamily {
    /// Scale applied to the repeated element in grid-pattern exports.
    pub fn scale_multiplier(&self) -> f32 {
        match self {
            TemplateFamily::Standard => 1.0,
            TemplateFamily::Sparse => 0.8,
            TemplateFamily::LargeSections => 1.5,
        }
    }
}

/// Wax-paper specific settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaperConfig {
    pub layout: GridLayout,
    #[serde(default)]
    pub family: TemplateFamily,
    /// Export one copy of the first image per grid cell instead of the element list.
    #[serde(default)]
    pub repeat: bool,
}

impl Scene {
    pub fn new(space: Space, width: u32, height: u32) -> Self {
        Self {
            canvas: CanvasConfig::new(width, height),
            space,
            elements: Vec::new(),
            template_id: None,
            paper: None,
            last_swap: None,
        }
    }

    pub fn canvas_size_f32(&self) -> (f32, f32) {
        (self.canvas.width as f32, self.canvas.height as f32)
    }

    pub fn max_z_index(&self) -> Option<i32> {
        self.elements.iter().map(|e| e.z_index).max()
    }

    pub fn min_z_index(&self) -> Option<i32> {
        self.elements.iter().map(|e| e.z_index).min()
    }

    /// Appends an element above everything else and returns its id.
    pub fn add(&mut self, mut element: Element) -> ElementId {
        element.z_index = self.max_z_index().map_or(1, |max| max + 1);
        let id = element.id;
        debug!(%id, kind = element.kind.name(), z = element.z_index, "element added");
        self.elements.push(element);
        id
    }

    pub fn remove(&mut self, id: ElementId) -> Result<Element, SceneError> {
        let index = self.index_of(id).ok_or(SceneError::ElementNotFound(id))?;
        Ok(self.elements.remove(index))
    }

    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Visible elements, lowest z first. Ties keep collection order.
    pub fn draw_order(&self) -> Vec<&Element> {
        let mut visible: Vec<&Element> = self.elements.iter().filter(|e| e.visible).collect();
        visible.sort_by_key(|e| e.z_index);
        visible
    }

    /// Applies a finished image decode to the element with `id`.
    ///
    /// The decode is dropped when the element is gone or its source changed
    /// since the decode started. Returns whether anything was applied.
    pub fn apply_decoded(&mut self, id: ElementId, source_key: &str, natural_w: u32, natural_h: u32) -> bool {
        let Some(element) = self.get_mut(id) else {
            debug!(%id, "decoded image for removed element dropped");
            return false;
        };
        let ratio = if natural_h > 0 { natural_w as f32 / natural_h as f32 } else { 0.0 };
        let Some(img) = element.image_content_mut() else {
            return false;
        };
        if img.source_url() != Some(source_key) {
            debug!(%id, source_key, "stale decode dropped");
            return false;
        }
        img.natural_size = Some((natural_w, natural_h));
        element.set_aspect_ratio_once(ratio);
        true
    }
}
