/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

//! Coordinate spaces and the adapter that turns element geometry into canvas pixels.
//!
//! Percent-space positions are the element centre expressed as a percentage of
//! the canvas size. Pixel-space positions are the top-left corner in absolute
//! canvas pixels and are tied to one canvas resolution.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Space {
    #[default]
    Percent,
    Pixel,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Size of an element in its native space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "unit", rename_all = "lowercase")]
pub enum ElementSize {
    /// Width as a percentage of the canvas width. Height is derived.
    Percent { value: f32 },
    Pixels { width: f32, height: f32 },
}

impl ElementSize {
    pub const fn percent(value: f32) -> Self {
        ElementSize::Percent { value }
    }

    pub const fn pixels(width: f32, height: f32) -> Self {
        ElementSize::Pixels { width, height }
    }

    pub fn space(&self) -> Space {
        match self {
            ElementSize::Percent { .. } => Space::Percent,
            ElementSize::Pixels { .. } => Space::Pixel,
        }
    }
}

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn inflate(&self, pad: f32) -> Self {
        Self {
            x: self.x - pad,
            y: self.y - pad,
            width: self.width + pad * 2.0,
            height: self.height + pad * 2.0,
        }
    }

    pub fn intersects(&self, other: &PixelRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

pub fn percent_to_px(value: f32, dimension: f32) -> f32 {
    value * dimension / 100.0
}

pub fn px_to_percent(value: f32, dimension: f32) -> f32 {
    if dimension <= 0.0 {
        return 0.0;
    }
    value * 100.0 / dimension
}

/// Replaces NaN and infinities so geometry stays finite after arithmetic on user input.
pub fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}
