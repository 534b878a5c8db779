/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

//! Pointer-driven drag and resize.
//!
//! Pointers arrive in canvas pixels at the configured resolution. The
//! controller converts them to the scene's native units (percent or pixels)
//! before touching any element.

use atelier_core::space::{finite_or, px_to_percent};
use atelier_core::{ElementId, ElementSize, Point, Scene, Selection, Space};
use tracing::debug;

use crate::error::SessionError;
use crate::profile::ResizeBounds;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handle {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl Handle {
    /// Unit direction of the handle from the element centre, y pointing down.
    pub fn direction(&self) -> (f32, f32) {
        match self {
            Handle::N => (0.0, -1.0),
            Handle::S => (0.0, 1.0),
            Handle::E => (1.0, 0.0),
            Handle::W => (-1.0, 0.0),
            Handle::NE => (1.0, -1.0),
            Handle::NW => (-1.0, -1.0),
            Handle::SE => (1.0, 1.0),
            Handle::SW => (-1.0, 1.0),
        }
    }
}

/// One element being dragged, with the pointer offset taken at pointer-down.
#[derive(Clone, Debug, PartialEq)]
pub struct Grab {
    pub id: ElementId,
    pub offset: Point,
}

/// Pixel-space box at the moment a resize started.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeOrigin {
    pub pointer: Point,
    pub position: Point,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging {
        grabs: Vec<Grab>,
    },
    Resizing {
        id: ElementId,
        handle: Handle,
        origin: ResizeOrigin,
    },
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    state: InteractionState,
    bounds: ResizeBounds,
    snap: Option<f32>,
}

impl InteractionController {
    pub fn new(bounds: ResizeBounds, snap: Option<f32>) -> Self {
        let mut controller = Self {
            state: InteractionState::Idle,
            bounds,
            snap: None,
        };
        controller.set_snap(snap);
        controller
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == InteractionState::Idle
    }

    pub fn set_snap(&mut self, snap: Option<f32>) {
        self.snap = snap.filter(|s| s.is_finite() && *s > 0.0);
    }

    /// Pointer-down on an element body. Drags every unlocked, visible member
    /// when `id` is part of a multi-selection. Locked elements refuse.
    pub fn begin_drag(&mut self, scene: &Scene, selection: &Selection, id: ElementId, pointer: Point) -> bool {
        let Some(element) = scene.get(id) else {
            return false;
        };
        if element.locked {
            debug!(%id, "drag refused on locked element");
            return false;
        }

        let ids: Vec<ElementId> = if selection.contains(id) && selection.len() > 1 {
            selection.members().to_vec()
        } else {
            vec![id]
        };

        let native = to_native(scene, pointer);
        let grabs: Vec<Grab> = ids
            .into_iter()
            .filter_map(|id| scene.get(id))
            .filter(|e| !e.locked && e.visible)
            .map(|e| Grab {
                id: e.id,
                offset: Point::new(native.x - e.position.x, native.y - e.position.y),
            })
            .collect();

        debug!(count = grabs.len(), "drag started");
        self.state = InteractionState::Dragging { grabs };
        true
    }

    /// Pointer-down on one of the selection handles of `id`.
    pub fn begin_resize(&mut self, scene: &Scene, id: ElementId, handle: Handle, pointer: Point) -> bool {
        let Some(element) = scene.get(id) else {
            return false;
        };
        if element.locked {
            debug!(%id, "resize refused on locked element");
            return false;
        }

        let (cw, ch) = scene.canvas_size_f32();
        let (width, height) = element.pixel_size(cw, ch);
        self.state = InteractionState::Resizing {
            id,
            handle,
            origin: ResizeOrigin {
                pointer,
                position: element.position,
                width,
                height,
            },
        };
        true
    }

    /// Applies a pointer move. Returns whether anything changed.
    pub fn pointer_move(&mut self, scene: &mut Scene, pointer: Point) -> bool {
        match &self.state {
            InteractionState::Idle => false,
            InteractionState::Dragging { grabs } => {
                let native = to_native(scene, pointer);
                let mut moved = false;
                for grab in grabs {
                    moved |= self.drag_to(scene, grab, native);
                }
                moved
            }
            InteractionState::Resizing { id, handle, origin } => match scene.space {
                Space::Percent => self.resize_percent(scene, *id, *handle, pointer),
                Space::Pixel => self.resize_pixels(scene, *id, *handle, *origin, pointer),
            },
        }
    }

    /// Ends any drag or resize. Returns whether one was in progress.
    pub fn pointer_up(&mut self) -> bool {
        let active = !self.is_idle();
        if active {
            debug!("interaction ended");
        }
        self.state = InteractionState::Idle;
        active
    }

    fn snapped(&self, value: f32) -> f32 {
        match self.snap {
            Some(step) => (value / step).round() * step,
            None => value,
        }
    }

    fn drag_to(&self, scene: &mut Scene, grab: &Grab, native: Point) -> bool {
        let (cw, ch) = scene.canvas_size_f32();
        let space = scene.space;
        let Some(element) = scene.get_mut(grab.id) else {
            return false;
        };

        let x = self.snapped(native.x - grab.offset.x);
        let y = self.snapped(native.y - grab.offset.y);
        let (max_x, max_y) = match space {
            Space::Percent => (100.0, 100.0),
            Space::Pixel => {
                let (w, h) = element.pixel_size(cw, ch);
                ((cw - w).max(0.0), (ch - h).max(0.0))
            }
        };

        let next = Point::new(
            finite_or(x, element.position.x).clamp(0.0, max_x),
            finite_or(y, element.position.y).clamp(0.0, max_y),
        );
        let changed = next != element.position;
        element.position = next;
        changed
    }

    fn resize_percent(&self, scene: &mut Scene, id: ElementId, handle: Handle, pointer: Point) -> bool {
        let (cw, ch) = scene.canvas_size_f32();
        let Some(element) = scene.get_mut(id) else {
            return false;
        };

        let center = element.anchor_px(cw, ch);
        let (w, h) = element.pixel_size(cw, ch);
        let ratio = if h > 0.0 { w / h } else { 1.0 };
        let (hx, hy) = handle.direction();
        let dx = pointer.x - center.x;
        let dy = pointer.y - center.y;

        // Width in pixels implied by each axis the handle moves along.
        let mut width_px = f32::NEG_INFINITY;
        if hx != 0.0 {
            width_px = width_px.max(2.0 * dx * hx);
        }
        if hy != 0.0 {
            width_px = width_px.max(2.0 * dy * hy * ratio);
        }

        let value = self.bounds.clamp(finite_or(px_to_percent(width_px, cw), self.bounds.min), 100.0);
        let next = ElementSize::percent(value);
        let changed = next != element.size;
        element.size = next;
        changed
    }

    fn resize_pixels(
        &self,
        scene: &mut Scene,
        id: ElementId,
        handle: Handle,
        origin: ResizeOrigin,
        pointer: Point,
    ) -> bool {
        let (cw, ch) = scene.canvas_size_f32();
        let Some(element) = scene.get_mut(id) else {
            return false;
        };

        let (hx, hy) = handle.direction();
        let dx = pointer.x - origin.pointer.x;
        let dy = pointer.y - origin.pointer.y;

        let mut left = origin.position.x;
        let mut top = origin.position.y;
        let mut right = left + origin.width;
        let mut bottom = top + origin.height;

        if hx < 0.0 {
            left = self.snapped(left + dx).clamp(0.0, right);
        } else if hx > 0.0 {
            right = self.snapped(right + dx).clamp(left, cw);
        }
        if hy < 0.0 {
            top = self.snapped(top + dy).clamp(0.0, bottom);
        } else if hy > 0.0 {
            bottom = self.snapped(bottom + dy).clamp(top, ch);
        }

        let mut width = self.bounds.clamp(right - left, cw);
        let mut height = self.bounds.clamp(bottom - top, ch);

        if let Some(ratio) = element.aspect_ratio.filter(|_| element.maintain_aspect_ratio) {
            if hx != 0.0 {
                height = width / ratio;
            } else {
                width = self.bounds.clamp(height * ratio, cw);
            }
        }

        // Keep the edge opposite the handle fixed.
        if hx < 0.0 {
            left = right - width;
        }
        if hy < 0.0 {
            top = bottom - height;
        }

        let position = Point::new(
            finite_or(left, origin.position.x).clamp(0.0, (cw - width).max(0.0)),
            finite_or(top, origin.position.y).clamp(0.0, (ch - height).max(0.0)),
        );
        let size = ElementSize::pixels(width, height);
        let changed = position != element.position || size != element.size;
        element.position = position;
        element.size = size;
        changed
    }
}

fn to_native(scene: &Scene, pointer: Point) -> Point {
    match scene.space {
        Space::Percent => {
            let (cw, ch) = scene.canvas_size_f32();
            Point::new(px_to_percent(pointer.x, cw), px_to_percent(pointer.y, ch))
        }
        Space::Pixel => pointer,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WindowEvent {
    PointerUp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Window-level listeners owned by a session. At most one listener per event.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: Vec<(ListenerId, WindowEvent)>,
}

impl ListenerRegistry {
    pub fn subscribe(&mut self, event: WindowEvent) -> Result<ListenerId, SessionError> {
        if self.is_subscribed(event) {
            return Err(SessionError::DuplicateListener(event));
        }
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push((id, event));
        debug!(?event, "window listener registered");
        Ok(id)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        before != self.listeners.len()
    }

    pub fn is_subscribed(&self, event: WindowEvent) -> bool {
        self.listeners.iter().any(|(_, e)| *e == event)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::{Element, ShapeType};
    use proptest::prelude::*;

    fn bounds(max: Option<f32>) -> ResizeBounds {
        ResizeBounds { min: 5.0, max }
    }

    fn percent_scene() -> (Scene, ElementId) {
        let mut scene = Scene::new(Space::Percent, 1000, 500);
        let id = scene.add(Element::shape(ShapeType::Rectangle, Point::new(50.0, 50.0), ElementSize::percent(20.0)));
        (scene, id)
    }

    #[test]
    fn drag_keeps_grab_offset() {
        let (mut scene, id) = percent_scene();
        let mut c = InteractionController::new(bounds(Some(100.0)), None);
        // Grab 10px right of centre (500, 250).
        assert!(c.begin_drag(&scene, &Selection::new(), id, Point::new(510.0, 250.0)));
        // No jump on the first move.
        assert!(!c.pointer_move(&mut scene, Point::new(510.0, 250.0)));
        assert!(c.pointer_move(&mut scene, Point::new(610.0, 300.0)));
        let p = scene.get(id).unwrap().position;
        assert!((p.x - 60.0).abs() < 1e-4);
        assert!((p.y - 60.0).abs() < 1e-4);
    }

    #[test]
    fn drag_clamps_and_snaps() {
        let (mut scene, id) = percent_scene();
        let mut c = InteractionController::new(bounds(Some(100.0)), Some(5.0));
        c.begin_drag(&scene, &Selection::new(), id, Point::new(500.0, 250.0));
        c.pointer_move(&mut scene, Point::new(5000.0, 137.0));
        let p = scene.get(id).unwrap().position;
        assert_eq!(p.x, 100.0);
        // 27.4% snaps to 25%.
        assert_eq!(p.y, 25.0);
    }

    #[test]
    fn zero_snap_from_config_is_ignored() {
        let (mut scene, id) = percent_scene();
        for snap in [0.0, -5.0, f32::NAN] {
            let mut c = InteractionController::new(bounds(Some(100.0)), Some(snap));
            scene.get_mut(id).unwrap().position = Point::new(50.0, 50.0);
            c.begin_drag(&scene, &Selection::new(), id, Point::new(500.0, 250.0));
            assert!(c.pointer_move(&mut scene, Point::new(700.0, 250.0)));
            assert!((scene.get(id).unwrap().position.x - 70.0).abs() < 1e-4);
            c.pointer_up();
        }
    }

    #[test]
    fn locked_elements_reject_interaction() {
        let (mut scene, id) = percent_scene();
        scene.get_mut(id).unwrap().locked = true;
        let mut c = InteractionController::new(bounds(Some(100.0)), None);
        assert!(!c.begin_drag(&scene, &Selection::new(), id, Point::new(500.0, 250.0)));
        assert!(!c.begin_resize(&scene, id, Handle::E, Point::new(600.0, 250.0)));
        assert!(c.is_idle());
    }

    #[test]
    fn multi_selection_moves_together_except_locked() {
        let (mut scene, a) = percent_scene();
        let b = scene.add(Element::shape(ShapeType::Circle, Point::new(20.0, 20.0), ElementSize::percent(10.0)));
        let locked = scene.add(Element::shape(ShapeType::Circle, Point::new(80.0, 80.0), ElementSize::percent(10.0)));
        scene.get_mut(locked).unwrap().locked = true;

        let mut selection = Selection::new();
        selection.click(Some(a), false);
        selection.click(Some(b), true);
        selection.click(Some(locked), true);

        let mut c = InteractionController::new(bounds(Some(100.0)), None);
        c.begin_drag(&scene, &selection, a, Point::new(500.0, 250.0));
        c.pointer_move(&mut scene, Point::new(600.0, 250.0));

        assert!((scene.get(a).unwrap().position.x - 60.0).abs() < 1e-4);
        assert!((scene.get(b).unwrap().position.x - 30.0).abs() < 1e-4);
        assert_eq!(scene.get(locked).unwrap().position.x, 80.0);
    }

    #[test]
    fn east_handle_sets_width_from_centre_distance() {
        let (mut scene, id) = percent_scene();
        let mut c = InteractionController::new(bounds(Some(100.0)), None);
        c.begin_resize(&scene, id, Handle::E, Point::new(600.0, 250.0));
        // 150px right of centre -> 300px wide -> 30%.
        c.pointer_move(&mut scene, Point::new(650.0, 250.0));
        assert_eq!(scene.get(id).unwrap().size, ElementSize::percent(30.0));

        // Crossing to the other side clamps to the minimum.
        c.pointer_move(&mut scene, Point::new(300.0, 250.0));
        assert_eq!(scene.get(id).unwrap().size, ElementSize::percent(5.0));
    }

    #[test]
    fn resize_respects_page_maximum() {
        let (mut scene, id) = percent_scene();
        let mut c = InteractionController::new(bounds(Some(80.0)), None);
        c.begin_resize(&scene, id, Handle::SE, Point::new(600.0, 350.0));
        c.pointer_move(&mut scene, Point::new(1000.0, 500.0));
        assert_eq!(scene.get(id).unwrap().size, ElementSize::percent(80.0));
    }

    #[test]
    fn pixel_drag_stays_inside_canvas() {
        let mut scene = Scene::new(Space::Pixel, 400, 300);
        let id = scene.add(Element::shape(
            ShapeType::Rectangle,
            Point::new(10.0, 10.0),
            ElementSize::pixels(100.0, 50.0),
        ));
        let mut c = InteractionController::new(bounds(None), None);
        c.begin_drag(&scene, &Selection::new(), id, Point::new(20.0, 20.0));
        c.pointer_move(&mut scene, Point::new(900.0, -40.0));
        assert_eq!(scene.get(id).unwrap().position, Point::new(300.0, 0.0));
    }

    #[test]
    fn pixel_west_handle_keeps_right_edge() {
        let mut scene = Scene::new(Space::Pixel, 400, 300);
        let id = scene.add(Element::shape(
            ShapeType::Rectangle,
            Point::new(100.0, 100.0),
            ElementSize::pixels(100.0, 50.0),
        ));
        let mut c = InteractionController::new(bounds(None), None);
        c.begin_resize(&scene, id, Handle::W, Point::new(100.0, 125.0));
        c.pointer_move(&mut scene, Point::new(60.0, 125.0));
        let e = scene.get(id).unwrap();
        assert_eq!(e.position, Point::new(60.0, 100.0));
        assert_eq!(e.size, ElementSize::pixels(140.0, 50.0));

        // Past the right edge: minimum width, right edge still at 200.
        c.pointer_move(&mut scene, Point::new(350.0, 125.0));
        let e = scene.get(id).unwrap();
        assert_eq!(e.size, ElementSize::pixels(5.0, 50.0));
        assert_eq!(e.position.x, 195.0);
    }

    #[test]
    fn pixel_resize_follows_aspect_ratio() {
        let mut scene = Scene::new(Space::Pixel, 400, 300);
        let id = scene.add(
            Element::image(Point::new(0.0, 0.0), ElementSize::pixels(100.0, 50.0)).with_aspect_ratio(2.0),
        );
        let mut c = InteractionController::new(bounds(None), None);
        c.begin_resize(&scene, id, Handle::SE, Point::new(100.0, 50.0));
        c.pointer_move(&mut scene, Point::new(200.0, 60.0));
        assert_eq!(scene.get(id).unwrap().size, ElementSize::pixels(200.0, 100.0));
    }

    #[test]
    fn pointer_up_always_returns_to_idle() {
        let (mut scene, id) = percent_scene();
        let mut c = InteractionController::new(bounds(Some(100.0)), None);
        assert!(!c.pointer_up());
        c.begin_drag(&scene, &Selection::new(), id, Point::new(500.0, 250.0));
        assert!(c.pointer_up());
        assert!(c.is_idle());
        assert!(!c.pointer_move(&mut scene, Point::new(0.0, 0.0)));
    }

    proptest! {
        #[test]
        fn drags_stay_in_bounds(
            grab_x in 0f32..400.0,
            grab_y in 0f32..300.0,
            to_x in -1000f32..1000.0,
            to_y in -1000f32..1000.0,
            snap in proptest::option::of(1f32..25.0),
        ) {
            let mut scene = Scene::new(Space::Pixel, 400, 300);
            let id = scene.add(Element::shape(
                ShapeType::Rectangle,
                Point::new(150.0, 100.0),
                ElementSize::pixels(100.0, 50.0),
            ));
            let mut c = InteractionController::new(bounds(None), snap);
            c.begin_drag(&scene, &Selection::new(), id, Point::new(grab_x, grab_y));
            c.pointer_move(&mut scene, Point::new(to_x, to_y));
            let p = scene.get(id).unwrap().position;
            prop_assert!((0.0..=300.0).contains(&p.x));
            prop_assert!((0.0..=250.0).contains(&p.y));
        }
    }

    #[test]
    fn registry_refuses_duplicates() {
        let mut registry = ListenerRegistry::default();
        let id = registry.subscribe(WindowEvent::PointerUp).unwrap();
        assert!(matches!(
            registry.subscribe(WindowEvent::PointerUp),
            Err(SessionError::DuplicateListener(WindowEvent::PointerUp))
        ));
        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        assert!(registry.is_empty());
        assert!(registry.subscribe(WindowEvent::PointerUp).is_ok());
    }
}
