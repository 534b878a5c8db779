/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use thiserror::Error;

use crate::element::ElementId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    #[error("Invalid canvas size: {width}x{height}")]
    InvalidCanvasSize { width: u32, height: u32 },

    #[error("Select at least {required} elements (got {actual})")]
    SelectionTooSmall { required: usize, actual: usize },

    #[error("Operation requires a percent-space scene")]
    RequiresPercentSpace,

    #[error("Invalid grid layout: {0}")]
    InvalidGrid(String),

    #[error("Invalid design payload: {0}")]
    InvalidPayload(String),
}
