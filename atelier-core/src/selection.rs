/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use crate::element::ElementId;
use crate::scene::Scene;

/// Ephemeral selection state: one primary element plus a multi-selection
/// built with Ctrl/Cmd-click. Members are kept in the order they were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    primary: Option<ElementId>,
    members: Vec<ElementId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary(&self) -> Option<ElementId> {
        self.primary
    }

    pub fn members(&self) -> &[ElementId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.members.contains(&id)
    }

    /// Applies a click whose hit test resolved to `hit`.
    ///
    /// A plain click replaces the selection (or clears it on a miss). With the
    /// modifier held the hit element's membership is toggled and a miss
    /// changes nothing.
    pub fn click(&mut self, hit: Option<ElementId>, modifier: bool) {
        match (hit, modifier) {
            (Some(id), false) => {
                self.primary = Some(id);
                self.members = vec![id];
            }
            (None, false) => self.clear(),
            (Some(id), true) => {
                if let Some(pos) = self.members.iter().position(|m| *m == id) {
                    self.members.remove(pos);
                    if self.primary == Some(id) {
                        self.primary = self.members.last().copied();
                    }
                } else {
                    self.members.push(id);
                    self.primary = Some(id);
                }
            }
            (None, true) => {}
        }
    }

    pub fn select_all(&mut self, scene: &Scene) {
        self.members = scene.elements.iter().map(|e| e.id).collect();
        self.primary = self.members.last().copied();
    }

    pub fn clear(&mut self) {
        self.primary = None;
        self.members.clear();
    }

    /// Drops ids whose elements no longer exist.
    pub fn retain_existing(&mut self, scene: &Scene) {
        self.members.retain(|id| scene.get(*id).is_some());
        if self.primary.is_some_and(|id| scene.get(id).is_none()) {
            self.primary = self.members.last().copied();
        }
    }
}
