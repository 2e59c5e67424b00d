//! Spawn placement policy.
//!
//! - Edge spawners: one of the four map edges, chosen uniformly, a uniform point
//!   along it, pushed `offset` outwards so they appear just off-screen.
//! - Everything else: a random anchor, jittered by up to `jitter` on each axis.
//!   No anchors at all falls back to the map center.

use bevy::prelude::*;
use rand::Rng;

use crate::plugins::world::MapFrame;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Bottom, Edge::Left, Edge::Right];
}

pub fn edge_point(frame: &MapFrame, offset: f32, rng: &mut impl Rng) -> Vec2 {
    let edge = Edge::ALL[rng.gen_range(0..Edge::ALL.len())];
    let t: f32 = rng.gen_range(-0.5..=0.5);
    point_on_edge(frame, edge, t, offset)
}

/// `t` in [-0.5, 0.5] runs along the edge.
pub fn point_on_edge(frame: &MapFrame, edge: Edge, t: f32, offset: f32) -> Vec2 {
    let h = frame.size * 0.5;
    let local = match edge {
        Edge::Top => Vec2::new(t * frame.size.x, h.y + offset),
        Edge::Bottom => Vec2::new(t * frame.size.x, -h.y - offset),
        Edge::Left => Vec2::new(-h.x - offset, t * frame.size.y),
        Edge::Right => Vec2::new(h.x + offset, t * frame.size.y),
    };
    frame.origin + local
}

pub fn anchor_point(anchors: &[Vec2], fallback: Vec2, jitter: f32, rng: &mut impl Rng) -> Vec2 {
    if anchors.is_empty() {
        return fallback;
    }
    let base = anchors[rng.gen_range(0..anchors.len())];
    if jitter <= 0.0 {
        return base;
    }
    base + Vec2::new(rng.gen_range(-jitter..=jitter), rng.gen_range(-jitter..=jitter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn frame() -> MapFrame {
        MapFrame {
            origin: Vec2::new(0.0, 100.0),
            size: Vec2::new(200.0, 100.0),
        }
    }

    #[test]
    fn edge_points_sit_just_outside_the_map() {
        let mut rng = StdRng::seed_from_u64(1);
        let rect = frame().rect();
        let mut seen = [false; 4];

        for _ in 0..400 {
            let p = edge_point(&frame(), 10.0, &mut rng);
            assert!(!rect.contains(p), "{p:?} inside the map");
            assert!(rect.inflate(10.0 + 1e-3).contains(p), "{p:?} too far out");

            let i = if p.y > rect.max.y {
                0
            } else if p.y < rect.min.y {
                1
            } else if p.x < rect.min.x {
                2
            } else {
                3
            };
            seen[i] = true;
        }
        assert_eq!(seen, [true; 4], "every edge gets used");
    }

    #[test]
    fn anchor_points_stay_within_jitter() {
        let mut rng = StdRng::seed_from_u64(2);
        let anchors = [Vec2::new(10.0, 10.0), Vec2::new(-50.0, 0.0)];
        for _ in 0..200 {
            let p = anchor_point(&anchors, Vec2::ZERO, 4.0, &mut rng);
            assert!(anchors.iter().any(|a| (p - *a).abs().max_element() <= 4.0));
        }
    }

    #[test]
    fn missing_anchors_fall_back() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(anchor_point(&[], Vec2::new(1.0, 2.0), 5.0, &mut rng), Vec2::new(1.0, 2.0));
    }
}
