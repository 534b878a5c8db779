/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

//! Layer stacking. Every operation takes an index into `Scene::elements`,
//! returns whether anything changed, and treats an out-of-range index as a no-op.

use std::cmp::Ordering;

use crate::scene::Scene;

impl Scene {
    /// Swaps z with the nearest element above. No-op when already topmost.
    pub fn raise(&mut self, i: usize) -> bool {
        match self.neighbour(i, Ordering::Greater) {
            Some(j) => self.swap_z(i, j),
            None => false,
        }
    }

    /// Swaps z with the nearest element below. No-op when already bottommost.
    pub fn lower(&mut self, i: usize) -> bool {
        match self.neighbour(i, Ordering::Less) {
            Some(j) => self.swap_z(i, j),
            None => false,
        }
    }

    /// Sets z to `max + 1`. Calling it again increments again.
    pub fn bring_to_front(&mut self, i: usize) -> bool {
        let Some(max) = self.max_z_index() else {
            return false;
        };
        match self.elements.get_mut(i) {
            Some(e) => {
                e.z_index = max + 1;
                true
            }
            None => false,
        }
    }

    pub fn send_to_back(&mut self, i: usize) -> bool {
        let Some(min) = self.min_z_index() else {
            return false;
        };
        match self.elements.get_mut(i) {
            Some(e) => {
                e.z_index = min - 1;
                true
            }
            None => false,
        }
    }

    pub fn toggle_visible(&mut self, i: usize) -> bool {
        match self.elements.get_mut(i) {
            Some(e) => {
                e.visible = !e.visible;
                true
            }
            None => false,
        }
    }

    pub fn toggle_locked(&mut self, i: usize) -> bool {
        match self.elements.get_mut(i) {
            Some(e) => {
                e.locked = !e.locked;
                true
            }
            None => false,
        }
    }

    /// Closest z on the `side` of element `i`. Among tied candidates the
    /// element `i` last swapped with wins, then collection order.
    fn neighbour(&self, i: usize, side: Ordering) -> Option<usize> {
        let element = self.elements.get(i)?;
        let current = element.z_index;
        let candidates = || {
            self.elements
                .iter()
                .enumerate()
                .filter(move |(_, e)| e.z_index.cmp(&current) == side)
        };
        let target = match side {
            Ordering::Greater => candidates().map(|(_, e)| e.z_index).min()?,
            _ => candidates().map(|(_, e)| e.z_index).max()?,
        };

        let partner = self.last_swap.and_then(|(a, b)| match element.id {
            id if id == a => Some(b),
            id if id == b => Some(a),
            _ => None,
        });
        let tied: Vec<usize> = candidates().filter(|(_, e)| e.z_index == target).map(|(j, _)| j).collect();
        tied.iter()
            .copied()
            .find(|&j| partner == Some(self.elements[j].id))
            .or_else(|| tied.first().copied())
    }

    fn swap_z(&mut self, i: usize, j: usize) -> bool {
        let zi = self.elements[i].z_index;
        self.elements[i].z_index = self.elements[j].z_index;
        self.elements[j].z_index = zi;
        self.last_swap = Some((self.elements[i].id, self.elements[j].id));
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::element::Element;
    use crate::scene::Scene;
    use crate::space::{ElementSize, Point, Space};
    use proptest::prelude::*;

    fn scene_with(zs: &[i32]) -> Scene {
        let mut scene = Scene::new(Space::Percent, 800, 600);
        for &z in zs {
            let id = scene.add(Element::image(Point::new(50.0, 50.0), ElementSize::percent(10.0)));
            scene.get_mut(id).unwrap().z_index = z;
        }
        scene
    }

    fn zs(scene: &Scene) -> Vec<i32> {
        scene.elements.iter().map(|e| e.z_index).collect()
    }

    #[test]
    fn raise_swaps_with_next_higher_only() {
        let mut scene = scene_with(&[1, 7, 3, 10]);
        assert!(scene.raise(0));
        assert_eq!(zs(&scene), vec![3, 7, 1, 10]);
    }

    #[test]
    fn raise_topmost_is_noop() {
        let mut scene = scene_with(&[1, 2, 3]);
        assert!(!scene.raise(2));
        assert_eq!(zs(&scene), vec![1, 2, 3]);
    }

    #[test]
    fn lower_bottommost_is_noop() {
        let mut scene = scene_with(&[4, 2, 9]);
        assert!(!scene.lower(1));
        assert!(scene.lower(2));
        assert_eq!(zs(&scene), vec![9, 2, 4]);
    }

    #[test]
    fn tied_neighbours_round_trip() {
        for start in [[1, 2, 1], [1, 1, 2]] {
            let mut scene = scene_with(&start);
            assert!(scene.raise(0));
            assert_eq!(zs(&scene), vec![2, 1, 1]);
            assert!(scene.lower(0));
            assert_eq!(zs(&scene), start.to_vec());
        }
    }

    #[test]
    fn ties_fall_back_to_collection_order() {
        let mut scene = scene_with(&[3, 1, 1]);
        assert!(scene.lower(0));
        assert_eq!(zs(&scene), vec![1, 3, 1]);
    }

    #[test]
    fn bring_to_front_increments_every_call() {
        let mut scene = scene_with(&[1, 2, 3]);
        scene.bring_to_front(0);
        let first = scene.elements[0].z_index;
        scene.bring_to_front(0);
        let second = scene.elements[0].z_index;

        assert_eq!(first, 4);
        assert!(second > first);
        assert!(scene.elements[1..].iter().all(|e| e.z_index < second));
    }

    #[test]
    fn send_to_back_goes_below_minimum() {
        let mut scene = scene_with(&[1, 2, 3]);
        scene.send_to_back(2);
        assert_eq!(zs(&scene), vec![1, 2, 0]);
    }

    #[test]
    fn toggles_have_no_z_side_effects() {
        let mut scene = scene_with(&[1, 2]);
        assert!(scene.toggle_visible(0));
        assert!(scene.toggle_locked(1));
        assert!(!scene.elements[0].visible);
        assert!(scene.elements[1].locked);
        assert_eq!(zs(&scene), vec![1, 2]);
        assert!(!scene.toggle_locked(5));
    }

    proptest! {
        #[test]
        fn raise_then_lower_round_trips(
            zs_in in proptest::collection::vec(-4i32..4, 2..12),
            pick in 0usize..12,
        ) {
            let i = pick % zs_in.len();
            let mut scene = scene_with(&zs_in);
            let before = zs(&scene);

            if scene.raise(i) {
                scene.lower(i);
            }
            prop_assert_eq!(zs(&scene), before);
        }
    }
}
