/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

//! Aggregate alignment and even distribution over a set of elements.
//!
//! Edges are computed from `position` and the element's native extent, so
//! `right` means `position + extent`. Hidden members are ignored, and only the
//! axis being aligned is written.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::element::{Element, ElementId};
use crate::error::SceneError;
use crate::scene::Scene;

pub const MIN_SELECTION: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Right,
    Top,
    Bottom,
    /// Horizontal centres.
    Center,
    /// Vertical centres.
    Middle,
}

impl Alignment {
    pub fn axis(&self) -> Axis {
        match self {
            Alignment::Left | Alignment::Right | Alignment::Center => Axis::X,
            Alignment::Top | Alignment::Bottom | Alignment::Middle => Axis::Y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    Horizontal,
    Vertical,
}

impl Distribution {
    pub fn axis(&self) -> Axis {
        match self {
            Distribution::Horizontal => Axis::X,
            Distribution::Vertical => Axis::Y,
        }
    }
}

fn coord(e: &Element, axis: Axis) -> f32 {
    match axis {
        Axis::X => e.position.x,
        Axis::Y => e.position.y,
    }
}

fn extent(e: &Element, axis: Axis) -> f32 {
    match axis {
        Axis::X => e.extent_x(),
        Axis::Y => e.extent_y(),
    }
}

fn set_coord(e: &mut Element, axis: Axis, value: f32) {
    match axis {
        Axis::X => e.position.x = value,
        Axis::Y => e.position.y = value,
    }
}

impl Scene {
    /// Indices of the visible elements among `ids`, failing when fewer than two remain.
    fn alignable(&self, ids: &[ElementId]) -> Result<Vec<usize>, SceneError> {
        let indices: Vec<usize> = ids
            .iter()
            .filter_map(|id| self.index_of(*id))
            .filter(|&i| self.elements[i].visible)
            .collect();
        if indices.len() < MIN_SELECTION {
            return Err(SceneError::SelectionTooSmall {
                required: MIN_SELECTION,
                actual: indices.len(),
            });
        }
        Ok(indices)
    }

    pub fn align(&mut self, ids: &[ElementId], alignment: Alignment) -> Result<(), SceneError> {
        let indices = self.alignable(ids)?;
        let axis = alignment.axis();

        match alignment {
            Alignment::Left | Alignment::Top => {
                let target = indices
                    .iter()
                    .map(|&i| coord(&self.elements[i], axis))
                    .fold(f32::INFINITY, f32::min);
                for &i in &indices {
                    set_coord(&mut self.elements[i], axis, target);
                }
            }
            Alignment::Right | Alignment::Bottom => {
                let target = indices
                    .iter()
                    .map(|&i| coord(&self.elements[i], axis) + extent(&self.elements[i], axis))
                    .fold(f32::NEG_INFINITY, f32::max);
                for &i in &indices {
                    let e = &mut self.elements[i];
                    let size = extent(e, axis);
                    set_coord(e, axis, target - size);
                }
            }
            Alignment::Center | Alignment::Middle => {
                let sum: f32 = indices
                    .iter()
                    .map(|&i| coord(&self.elements[i], axis) + extent(&self.elements[i], axis) / 2.0)
                    .sum();
                let target = sum / indices.len() as f32;
                for &i in &indices {
                    let e = &mut self.elements[i];
                    let half = extent(e, axis) / 2.0;
                    set_coord(e, axis, target - half);
                }
            }
        }

        debug!(?alignment, count = indices.len(), "aligned elements");
        Ok(())
    }

    /// Spaces members evenly between the first and last along the axis.
    /// The outermost two keep their coordinates.
    pub fn distribute(&mut self, ids: &[ElementId], distribution: Distribution) -> Result<(), SceneError> {
        let mut indices = self.alignable(ids)?;
        let axis = distribution.axis();

        indices.sort_by(|&a, &b| {
            coord(&self.elements[a], axis).total_cmp(&coord(&self.elements[b], axis))
        });

        let first = coord(&self.elements[indices[0]], axis);
        let last = coord(&self.elements[indices[indices.len() - 1]], axis);
        let step = (last - first) / (indices.len() - 1) as f32;

        for (ordinal, &i) in indices.iter().enumerate().skip(1).take(indices.len() - 2) {
            set_coord(&mut self.elements[i], axis, first + step * ordinal as f32);
        }

        debug!(?distribution, count = indices.len(), "distributed elements");
        Ok(())
    }
}
