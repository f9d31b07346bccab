//! Floating word motion
//!
//! Positions are the word's top-left corner in viewport pixels; velocities
//! are pixels per frame.

use glam::Vec2;
use rand::Rng;

use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl Drift {
    /// Random position in the spawn band with a random heading
    pub fn spawn<R: Rng>(rng: &mut R, viewport: Vec2, tuning: &Tuning) -> Self {
        let span_x = (viewport.x - tuning.spawn_right_margin).max(0.0);
        let span_y = (viewport.y - tuning.spawn_top - tuning.spawn_bottom_margin).max(0.0);
        let position = Vec2::new(
            rng.random::<f32>() * span_x,
            tuning.spawn_top + rng.random::<f32>() * span_y,
        );

        let speed = tuning.min_speed + rng.random::<f32>() * (tuning.max_speed - tuning.min_speed);
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        Self {
            position,
            velocity: Vec2::from_angle(angle) * speed,
        }
    }

    /// Advance one frame and bounce off the viewport edges
    pub fn step(&mut self, size: Vec2, viewport: Vec2, top_margin: f32) {
        self.position += self.velocity;

        if self.position.x <= 0.0 {
            self.position.x = 0.0;
            self.velocity.x = self.velocity.x.abs();
        }
        if self.position.x + size.x >= viewport.x {
            self.position.x = viewport.x - size.x;
            self.velocity.x = -self.velocity.x.abs();
        }
        if self.position.y <= top_margin {
            self.position.y = top_margin;
            self.velocity.y = self.velocity.y.abs();
        }
        if self.position.y + size.y >= viewport.y {
            self.position.y = viewport.y - size.y;
            self.velocity.y = -self.velocity.y.abs();
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_spawn_within_band() {
        let tuning = Tuning::default();
        let viewport = Vec2::new(1024.0, 768.0);
        let mut rng = Pcg32::seed_from_u64(4);
        for _ in 0..200 {
            let d = Drift::spawn(&mut rng, viewport, &tuning);
            assert!(d.position.x >= 0.0 && d.position.x <= 874.0);
            assert!(d.position.y >= 100.0 && d.position.y <= 668.0);
            assert!(d.speed() >= 0.15 - 1e-4 && d.speed() <= 0.5 + 1e-4);
        }
    }

    #[test]
    fn test_reflects_off_edges() {
        let viewport = Vec2::new(200.0, 200.0);
        let size = Vec2::new(50.0, 20.0);

        let mut d = Drift {
            position: Vec2::new(0.2, 100.0),
            velocity: Vec2::new(-0.5, 0.0),
        };
        d.step(size, viewport, 80.0);
        assert_eq!(d.position.x, 0.0);
        assert!(d.velocity.x > 0.0);

        let mut d = Drift {
            position: Vec2::new(100.0, 80.3),
            velocity: Vec2::new(0.0, -0.5),
        };
        d.step(size, viewport, 80.0);
        assert_eq!(d.position.y, 80.0);
        assert!(d.velocity.y > 0.0);

        let mut d = Drift {
            position: Vec2::new(149.8, 179.9),
            velocity: Vec2::new(0.4, 0.4),
        };
        d.step(size, viewport, 80.0);
        assert_eq!(d.position, Vec2::new(150.0, 180.0));
        assert!(d.velocity.x < 0.0 && d.velocity.y < 0.0);
    }

    #[test]
    fn test_stays_in_bounds_over_time() {
        let tuning = Tuning::default();
        let viewport = Vec2::new(640.0, 480.0);
        let size = Vec2::new(90.0, 28.0);
        let mut rng = Pcg32::seed_from_u64(12);
        let mut d = Drift::spawn(&mut rng, viewport, &tuning);
        for _ in 0..20_000 {
            d.step(size, viewport, tuning.top_margin);
            assert!(d.position.x >= 0.0 && d.position.x + size.x <= viewport.x);
            assert!(d.position.y >= tuning.top_margin && d.position.y + size.y <= viewport.y);
        }
    }
}
