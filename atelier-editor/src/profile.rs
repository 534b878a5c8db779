/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

//! Per-page configuration. The three pages share every component and differ
//! only in the values below.

use atelier_core::{GridLayout, PaperConfig, Scene, Space, TemplateFamily, WatermarkConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PageKind {
    #[default]
    Editor,
    LogoDesigner,
    WaxPaper,
}

impl PageKind {
    /// Word used in export file names when no template is active.
    pub fn label(&self) -> &'static str {
        match self {
            PageKind::Editor => "mockup",
            PageKind::LogoDesigner => "logo",
            PageKind::WaxPaper => "wax-paper",
        }
    }
}

/// Clamp for interactive resizing, in the page's native units. A missing
/// `max` means "up to the canvas".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ResizeBounds {
    pub min: f32,
    #[serde(default)]
    pub max: Option<f32>,
}

impl ResizeBounds {
    pub fn clamp(&self, value: f32, canvas_limit: f32) -> f32 {
        let max = self.max.unwrap_or(canvas_limit).max(self.min);
        value.clamp(self.min, max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub family: TemplateFamily,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub grid: Option<GridLayout>,
    /// Export one copy of the first image per grid cell.
    #[serde(default)]
    pub repeat: bool,
}

impl Template {
    fn mockup(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            family: TemplateFamily::Standard,
            background_image: Some(format!("templates/{id}.png")),
            grid: None,
            repeat: false,
        }
    }

    fn paper(id: &str, name: &str, family: TemplateFamily, grid: GridLayout) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            family,
            background_image: None,
            grid: Some(grid),
            repeat: true,
        }
    }

    pub fn paper_config(&self) -> Option<PaperConfig> {
        self.grid.map(|layout| PaperConfig {
            layout,
            family: self.family,
            repeat: self.repeat,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PageProfile {
    pub kind: PageKind,
    pub space: Space,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background: String,
    pub resize: ResizeBounds,
    /// Drag snap step in native units, if snapping is on.
    pub snap: Option<f32>,
    /// Size given to newly added elements, in native units.
    pub default_element_size: f32,
    pub watermark: Option<WatermarkConfig>,
    pub templates: Vec<Template>,
}

impl Default for PageProfile {
    fn default() -> Self {
        Self::editor()
    }
}

impl PageProfile {
    pub fn editor() -> Self {
        Self {
            kind: PageKind::Editor,
            space: Space::Percent,
            canvas_width: 800,
            canvas_height: 600,
            background: "#ffffff".to_string(),
            resize: ResizeBounds { min: 5.0, max: Some(100.0) },
            snap: None,
            default_element_size: 30.0,
            watermark: None,
            templates: vec![
                Template::mockup("t-shirt", "T-Shirt"),
                Template::mockup("tote-bag", "Tote Bag"),
                Template::mockup("coffee-cup", "Coffee Cup"),
            ],
        }
    }

    pub fn logo_designer() -> Self {
        Self {
            kind: PageKind::LogoDesigner,
            space: Space::Pixel,
            canvas_width: 500,
            canvas_height: 500,
            background: "#ffffff".to_string(),
            resize: ResizeBounds { min: 5.0, max: None },
            snap: Some(10.0),
            default_element_size: 100.0,
            watermark: None,
            templates: Vec::new(),
        }
    }

    pub fn wax_paper() -> Self {
        Self {
            kind: PageKind::WaxPaper,
            space: Space::Percent,
            canvas_width: 1200,
            canvas_height: 900,
            background: "#f5efe0".to_string(),
            resize: ResizeBounds { min: 5.0, max: Some(80.0) },
            snap: Some(5.0),
            default_element_size: 20.0,
            watermark: Some(WatermarkConfig {
                enabled: true,
                ..WatermarkConfig::default()
            }),
            templates: vec![
                Template::paper("classic-grid", "Classic Grid", TemplateFamily::Standard, GridLayout::new(2, 3, 5.0)),
                Template::paper("sparse-dots", "Sparse Dots", TemplateFamily::Sparse, GridLayout::new(3, 4, 4.0)),
                Template::paper(
                    "large-sections",
                    "Large Sections",
                    TemplateFamily::LargeSections,
                    GridLayout::new(1, 2, 6.0),
                ),
            ],
        }
    }

    pub fn builtin(kind: PageKind) -> Self {
        match kind {
            PageKind::Editor => Self::editor(),
            PageKind::LogoDesigner => Self::logo_designer(),
            PageKind::WaxPaper => Self::wax_paper(),
        }
    }

    /// Parses a profile. Missing fields come from the built-in profile of
    /// the given `kind`, or the editor when `kind` is absent too.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let overrides: Value = serde_json::from_str(json)?;
        let kind = match overrides.get("kind") {
            Some(kind) => PageKind::deserialize(kind)?,
            None => PageKind::default(),
        };
        let mut merged = serde_json::to_value(Self::builtin(kind))?;
        merge(&mut merged, overrides);
        serde_json::from_value(merged)
    }

    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// An empty scene configured for this page.
    pub fn new_scene(&self) -> Scene {
        let mut scene = Scene::new(self.space, self.canvas_width, self.canvas_height);
        scene.canvas.background = self.background.clone();
        scene.canvas.watermark = self.watermark;
        scene
    }
}

/// Overlays `patch` onto `base`, descending into objects present in both.
fn merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_bounds() {
        assert_eq!(PageProfile::editor().resize.clamp(120.0, 800.0), 100.0);
        assert_eq!(PageProfile::wax_paper().resize.clamp(95.0, 800.0), 80.0);
        assert_eq!(PageProfile::wax_paper().resize.clamp(1.0, 800.0), 5.0);
        assert_eq!(PageProfile::logo_designer().resize.clamp(900.0, 500.0), 500.0);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let profile = PageProfile::from_json(r#"{ "canvasWidth": 640 }"#).unwrap();
        assert_eq!(profile.kind, PageKind::Editor);
        assert_eq!(profile.canvas_width, 640);
        assert_eq!(profile.canvas_height, 600);
        assert_eq!(profile.space, Space::Percent);
    }

    #[test]
    fn partial_json_follows_its_kind() {
        let profile =
            PageProfile::from_json(r#"{ "kind": "wax-paper", "canvasWidth": 640, "resize": { "min": 10 } }"#).unwrap();
        let wax = PageProfile::wax_paper();
        assert_eq!(profile.canvas_width, 640);
        assert_eq!(profile.canvas_height, 900);
        assert_eq!(profile.resize, ResizeBounds { min: 10.0, max: Some(80.0) });
        assert_eq!(profile.snap, Some(5.0));
        assert_eq!(profile.watermark, wax.watermark);
        assert_eq!(profile.templates, wax.templates);

        let logo = PageProfile::from_json(r#"{ "kind": "logo-designer" }"#).unwrap();
        assert_eq!(logo, PageProfile::logo_designer());
    }

    #[test]
    fn profile_survives_json() {
        let profile = PageProfile::wax_paper();
        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(PageProfile::from_json(&json).unwrap(), profile);
    }

    #[test]
    fn paper_templates_carry_grid() {
        let profile = PageProfile::wax_paper();
        let paper = profile.template("sparse-dots").and_then(Template::paper_config).unwrap();
        assert_eq!(paper.family, TemplateFamily::Sparse);
        assert!(paper.repeat);
        assert!(profile.template("t-shirt").is_none());
    }

    #[test]
    fn new_scene_applies_page_values() {
        let scene = PageProfile::logo_designer().new_scene();
        assert_eq!(scene.space, Space::Pixel);
        assert_eq!((scene.canvas.width, scene.canvas.height), (500, 500));
    }
}
