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

use crate::error::SceneError;
use crate::scene::Scene;
use crate::space::{ElementSize, Point, Space};

/// Share of the smaller cell side an arranged element occupies.
pub const ARRANGE_FILL: f32 = 0.8;

/// Rows and columns of a repeating layout. `spacing` is a percentage of the
/// canvas, used for the outer margin as well as the gutters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GridLayout {
    pub rows: u32,
    pub columns: u32,
    pub spacing: f32,
}

impl GridLayout {
    pub const fn new(rows: u32, columns: u32, spacing: f32) -> Self {
        Self { rows, columns, spacing }
    }

    pub fn capacity(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// Cell width and height in percent of the canvas.
    pub fn cell_size(&self) -> Result<(f32, f32), SceneError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(SceneError::InvalidGrid("rows and columns must be at least 1".into()));
        }
        if !self.spacing.is_finite() || self.spacing < 0.0 {
            return Err(SceneError::InvalidGrid(format!("spacing {} is not a valid percentage", self.spacing)));
        }
        let cols = self.columns as f32;
        let rows = self.rows as f32;
        let cell_w = (100.0 - (cols + 1.0) * self.spacing) / cols;
        let cell_h = (100.0 - (rows + 1.0) * self.spacing) / rows;
        if cell_w <= 0.0 || cell_h <= 0.0 {
            return Err(SceneError::InvalidGrid(format!(
                "spacing {} leaves no room for {}x{} cells",
                self.spacing, self.rows, self.columns
            )));
        }
        Ok((cell_w, cell_h))
    }

    /// Cell centres in row-major order, in percent of the canvas.
    pub fn cell_centers(&self) -> Result<Vec<Point>, SceneError> {
        let (cell_w, cell_h) = self.cell_size()?;
        let mut centers = Vec::with_capacity(self.capacity());
        for row in 0..self.rows {
            for col in 0..self.columns {
                centers.push(Point::new(
                    self.spacing + col as f32 * (cell_w + self.spacing) + cell_w / 2.0,
                    self.spacing + row as f32 * (cell_h + self.spacing) + cell_h / 2.0,
                ));
            }
        }
        Ok(centers)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArrangeReport {
    pub placed: usize,
    /// Eligible elements beyond the grid capacity, left where they were.
    pub overflow: usize,
}

impl Scene {
    /// Packs visible, unlocked elements into the grid in collection order.
    pub fn arrange_grid(&mut self, layout: &GridLayout) -> Result<ArrangeReport, SceneError> {
        if self.space != Space::Percent {
            return Err(SceneError::RequiresPercentSpace);
        }
        let (cell_w, cell_h) = layout.cell_size()?;
        let centers = layout.cell_centers()?;
        let size = ARRANGE_FILL * cell_w.min(cell_h);

        let mut report = ArrangeReport::default();
        let eligible = self.elements.iter_mut().filter(|e| e.visible && !e.locked);
        for (k, element) in eligible.enumerate() {
            match centers.get(k) {
                Some(center) => {
                    element.position = *center;
                    element.size = ElementSize::percent(size);
                    report.placed += 1;
                }
                None => report.overflow += 1,
            }
        }

        debug!(rows = layout.rows, columns = layout.columns, placed = report.placed, overflow = report.overflow, "arranged grid");
        Ok(report)
    }
}
