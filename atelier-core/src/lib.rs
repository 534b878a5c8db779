/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

//! Scene model shared by the editor, logo-designer and wax-paper pages.
//!
//! A [`Scene`] owns an ordered list of [`Element`]s plus the canvas they are
//! composed on. Everything that mutates a scene (z-order, alignment, canvas
//! rescaling, grid arrangement) lives here; rasterization is in
//! `atelier-render`.

pub mod align;
pub mod arrange;
pub mod color;
pub mod element;
pub mod error;
pub mod payload;
pub mod rescale;
pub mod scene;
pub mod selection;
pub mod space;
pub mod zorder;

pub use align::{Alignment, Axis, Distribution};
pub use arrange::{ArrangeReport, GridLayout};
pub use element::{
    Element, ElementId, ElementKind, Filters, FontStyle, ImageContent, ImageSource, ShapeContent,
    ShapeType, TextAlign, TextContent,
};
pub use error::SceneError;
pub use hit_test::{ApproxTextMeasure, TEXT_HIT_PADDING, TextExtent, TextMeasure};
pub use payload::{CanvasSize, DesignPayload, DesignRecord};
pub use scene::{CanvasConfig, PaperConfig, Scene, TemplateFamily, WatermarkConfig};
pub use selection::Selection;
pub use space::{ElementSize, PixelRect, Point, Space};
