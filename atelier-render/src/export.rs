/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use atelier_core::Scene;
use chrono::Utc;
use tracing::info;

use crate::{RenderError, Renderer, Resources};

/// Encoded export ready to hand to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// `<subject>-<label>-<millis>.png`, with both words lowercased and spaces
/// turned into dashes.
pub fn export_file_name(subject: &str, label: &str, millis: i64) -> String {
    format!("{}-{}-{millis}.png", slug(subject), slug(label))
}

fn slug(s: &str) -> String {
    let slug: String = s
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    if slug.is_empty() { "design".to_string() } else { slug }
}

/// Label used in the export name: template id, else `pattern` for grid
/// exports, else `design`.
pub fn export_label(scene: &Scene) -> &str {
    match &scene.template_id {
        Some(id) => id,
        None if scene.paper.as_ref().is_some_and(|p| p.repeat) => "pattern",
        None => "design",
    }
}

impl Renderer {
    /// Renders `scene` to PNG and names the result after `subject` and the
    /// scene's template.
    pub fn export(&mut self, scene: &Scene, resources: &Resources, subject: &str) -> Result<ExportArtifact, RenderError> {
        let bytes = self.render(scene, resources)?;
        let file_name = export_file_name(subject, export_label(scene), Utc::now().timestamp_millis());
        info!(%file_name, size = bytes.len(), "exported design");

        Ok(ExportArtifact {
            file_name,
            bytes,
            width: scene.canvas.width,
            height: scene.canvas.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::{GridLayout, PaperConfig, Space, TemplateFamily};

    #[test]
    fn file_name_layout() {
        assert_eq!(export_file_name("mockup", "tote-bag", 1700000000000), "mockup-tote-bag-1700000000000.png");
        assert_eq!(export_file_name("Wax Paper", "Sheet A", 5), "wax-paper-sheet-a-5.png");
        assert_eq!(export_file_name("", "x", 1), "design-x-1.png");
    }

    #[test]
    fn label_prefers_template() {
        let mut scene = Scene::new(Space::Percent, 10, 10);
        assert_eq!(export_label(&scene), "design");
        scene.paper = Some(PaperConfig {
            layout: GridLayout::new(2, 2, 1.0),
            family: TemplateFamily::Sparse,
            repeat: true,
        });
        assert_eq!(export_label(&scene), "pattern");
        scene.template_id = Some("burger-wrap".into());
        assert_eq!(export_label(&scene), "burger-wrap");
    }

    #[test]
    fn export_produces_png() {
        let scene = Scene::new(Space::Pixel, 16, 8);
        let mut renderer = Renderer::new();
        let artifact = renderer.export(&scene, &Resources::new(), "logo").unwrap();
        assert!(artifact.file_name.starts_with("logo-design-"));
        assert!(artifact.file_name.ends_with(".png"));
        assert_eq!(&artifact.bytes[1..4], b"PNG");
        assert_eq!((artifact.width, artifact.height), (16, 8));
    }
}
