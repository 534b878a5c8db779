/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::space::{ElementSize, PixelRect, Point, Space, finite_or, percent_to_px};

/// Stable identity of an element. Assigned once, never reused.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ElementId(Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    pub position: Point,
    pub size: ElementSize,
    /// Degrees clockwise about the element centre, kept in `[0, 360)`.
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Width / height of the natural image. Written once by the first decode.
    #[serde(default)]
    pub aspect_ratio: Option<f32>,
    #[serde(default = "default_true")]
    pub maintain_aspect_ratio: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ElementKind {
    Image(ImageContent),
    Shape(ShapeContent),
    Text(TextContent),
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Image(_) => "image",
            ElementKind::Shape(_) => "shape",
            ElementKind::Text(_) => "text",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "url", rename_all = "lowercase")]
pub enum ImageSource {
    /// Uploaded and addressable after reload.
    Permanent(String),
    /// Session-local object URL. Stripped before persistence.
    Ephemeral(String),
}

impl ImageSource {
    pub fn url(&self) -> &str {
        match self {
            ImageSource::Permanent(url) | ImageSource::Ephemeral(url) => url,
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        matches!(self, ImageSource::Ephemeral(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    #[serde(default)]
    pub source: Option<ImageSource>,
    #[serde(default)]
    pub filters: Filters,
    /// Natural pixel size once decoded. `None` while the element is pending.
    #[serde(skip)]
    pub natural_size: Option<(u32, u32)>,
}

impl ImageContent {
    pub fn source_url(&self) -> Option<&str> {
        self.source.as_ref().map(ImageSource::url)
    }

    pub fn is_pending(&self) -> bool {
        self.natural_size.is_none()
    }
}

/// Colour adjustments for image elements.
///
/// `brightness`, `contrast` and `saturation` are percentages in `0..=200` with
/// 100 as identity; `hue` is a rotation in degrees with 0 as identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Filters {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub hue: f32,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            hue: 0.0,
        }
    }
}

impl Filters {
    pub fn is_identity(&self) -> bool {
        *self == Filters::default()
    }

    pub fn clamped(&self) -> Self {
        Self {
            brightness: finite_or(self.brightness, 100.0).clamp(0.0, 200.0),
            contrast: finite_or(self.contrast, 100.0).clamp(0.0, 200.0),
            saturation: finite_or(self.saturation, 100.0).clamp(0.0, 200.0),
            hue: finite_or(self.hue, 0.0).rem_euclid(360.0),
        }
    }

    /// CSS filter string in the canonical primitive order.
    pub fn css_filter(&self) -> String {
        let f = self.clamped();
        format!(
            "brightness({}%) contrast({}%) hue-rotate({}deg) saturate({}%)",
            f.brightness, f.contrast, f.hue, f.saturation
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Rectangle,
    Circle,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShapeContent {
    pub shape_type: ShapeType,
    pub fill_color: String,
    pub stroke_color: String,
    #[serde(default)]
    pub stroke_width: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub text: String,
    pub font_size: f32,
    pub font_family: String,
    #[serde(default = "default_weight")]
    pub font_weight: u16,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub text_align: TextAlign,
    pub text_color: String,
}

fn default_weight() -> u16 {
    400
}

impl TextContent {
    pub fn new(text: impl Into<String>, font_size: f32) -> Self {
        Self {
            text: text.into(),
            font_size,
            font_family: "sans-serif".to_string(),
            font_weight: default_weight(),
            font_style: FontStyle::Normal,
            text_align: TextAlign::Center,
            text_color: "#000000".to_string(),
        }
    }
}

impl Element {
    fn with_kind(kind: ElementKind, position: Point, size: ElementSize) -> Self {
        Self {
            id: ElementId::new(),
            kind,
            position,
            size,
            rotation: 0.0,
            z_index: 0,
            locked: false,
            visible: true,
            aspect_ratio: None,
            maintain_aspect_ratio: true,
        }
    }

    /// A pending image element; the source and aspect ratio arrive later.
    pub fn image(position: Point, size: ElementSize) -> Self {
        Self::with_kind(ElementKind::Image(ImageContent::default()), position, size)
    }

    pub fn shape(shape_type: ShapeType, position: Point, size: ElementSize) -> Self {
        let mut element = Self::with_kind(
            ElementKind::Shape(ShapeContent {
                shape_type,
                fill_color: "#3b82f6".to_string(),
                stroke_color: "#1e3a8a".to_string(),
                stroke_width: 0.0,
            }),
            position,
            size,
        );
        if element.space() == Space::Percent {
            element.aspect_ratio = Some(1.0);
        }
        element
    }

    pub fn text(content: TextContent, position: Point, size: ElementSize) -> Self {
        Self::with_kind(ElementKind::Text(content), position, size)
    }

    pub fn with_source(mut self, source: ImageSource) -> Self {
        if let ElementKind::Image(img) = &mut self.kind {
            img.source = Some(source);
        }
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.set_rotation(degrees);
        self
    }

    pub fn with_aspect_ratio(mut self, ratio: f32) -> Self {
        self.set_aspect_ratio_once(ratio);
        self
    }

    pub fn space(&self) -> Space {
        self.size.space()
    }

    pub fn image_content(&self) -> Option<&ImageContent> {
        match &self.kind {
            ElementKind::Image(img) => Some(img),
            _ => None,
        }
    }

    pub fn image_content_mut(&mut self) -> Option<&mut ImageContent> {
        match &mut self.kind {
            ElementKind::Image(img) => Some(img),
            _ => None,
        }
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = finite_or(degrees, 0.0).rem_euclid(360.0);
    }

    /// Records the aspect ratio if none is known yet. Returns whether it was written.
    pub fn set_aspect_ratio_once(&mut self, ratio: f32) -> bool {
        if self.aspect_ratio.is_some() || !ratio.is_finite() || ratio <= 0.0 {
            return false;
        }
        self.aspect_ratio = Some(ratio);
        true
    }

    /// Extent along x in the element's native units.
    pub fn extent_x(&self) -> f32 {
        match self.size {
            ElementSize::Percent { value } => value,
            ElementSize::Pixels { width, .. } => width,
        }
    }

    /// Extent along y in native units. Percent-space elements use the scalar size.
    pub fn extent_y(&self) -> f32 {
        match self.size {
            ElementSize::Percent { value } => value,
            ElementSize::Pixels { height, .. } => height,
        }
    }

    /// Pixel width and height on a canvas of the given size.
    pub fn pixel_size(&self, canvas_w: f32, canvas_h: f32) -> (f32, f32) {
        match self.size {
            ElementSize::Percent { value } => {
                let w = percent_to_px(value, canvas_w);
                let h = match self.aspect_ratio {
                    Some(ratio) if self.maintain_aspect_ratio => w / ratio,
                    _ => percent_to_px(value, canvas_h),
                };
                (w, h)
            }
            ElementSize::Pixels { width, height } => {
                let h = match self.aspect_ratio {
                    Some(ratio) if self.maintain_aspect_ratio => width / ratio,
                    _ => height,
                };
                (width, h)
            }
        }
    }

    /// Axis-aligned pixel box, ignoring rotation.
    pub fn pixel_rect(&self, canvas_w: f32, canvas_h: f32) -> PixelRect {
        let (w, h) = self.pixel_size(canvas_w, canvas_h);
        match self.space() {
            Space::Percent => PixelRect::from_center(
                percent_to_px(self.position.x, canvas_w),
                percent_to_px(self.position.y, canvas_h),
                w,
                h,
            ),
            Space::Pixel => PixelRect {
                x: self.position.x,
                y: self.position.y,
                width: w,
                height: h,
            },
        }
    }

    /// Anchor point in canvas pixels: the centre in percent-space, the
    /// top-left corner in pixel-space.
    pub fn anchor_px(&self, canvas_w: f32, canvas_h: f32) -> Point {
        match self.space() {
            Space::Percent => Point::new(
                percent_to_px(self.position.x, canvas_w),
                percent_to_px(self.position.y, canvas_h),
            ),
            Space::Pixel => self.position,
        }
    }
}
