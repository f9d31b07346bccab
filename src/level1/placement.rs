//! Sparkle placement
//!
//! Greedy best-of-N sampling: each new point is the candidate farthest from
//! its nearest already-placed neighbour, with an early exit once a candidate
//! is "far enough". Approximates blue-noise spacing; not reproducible across
//! seeds and not meant to be.

use glam::Vec2;
use rand::Rng;

use crate::tuning::Tuning;

/// `count` fractional positions inside the margin-inset unit square
pub fn generate_positions<R: Rng>(count: usize, rng: &mut R, tuning: &Tuning) -> Vec<Vec2> {
    let margin = tuning.placement_margin.clamp(0.0, 0.49);
    let span = 1.0 - 2.0 * margin;
    let attempts = tuning.placement_attempts.max(1);
    let mut positions: Vec<Vec2> = Vec::with_capacity(count);

    for _ in 0..count {
        let mut best = Vec2::splat(0.5);
        let mut best_nearest = f32::NEG_INFINITY;

        for _ in 0..attempts {
            let candidate = Vec2::new(
                margin + rng.random::<f32>() * span,
                margin + rng.random::<f32>() * span,
            );
            let nearest = positions
                .iter()
                .map(|p| p.distance(candidate))
                .fold(f32::INFINITY, f32::min);

            if nearest > best_nearest {
                best_nearest = nearest;
                best = candidate;
            }
            if nearest >= tuning.placement_min_distance {
                break;
            }
        }

        positions.push(best);
    }

    positions
}
