//! Heart outline geometry
//!
//! The outline is one closed path of six cubic Bézier curves in a 100x100
//! viewBox. It is split into equal-length arcs, one per keyword, each drawn
//! as a dashed copy of the full path.

use glam::Vec2;

/// SVG path data of the outline
pub const HEART_PATH: &str = "M 50 88 C 25 68, 4 48, 4 32 C 4 18, 16 8, 30 8 C 38 8, 45 13, 50 20 C 55 13, 62 8, 70 8 C 84 8, 96 18, 96 32 C 96 48, 75 68, 50 88 Z";

/// The same path as control points: `[start, c1, c2, end]` per curve
const CURVES: [[Vec2; 4]; 6] = [
    [Vec2::new(50.0, 88.0), Vec2::new(25.0, 68.0), Vec2::new(4.0, 48.0), Vec2::new(4.0, 32.0)],
    [Vec2::new(4.0, 32.0), Vec2::new(4.0, 18.0), Vec2::new(16.0, 8.0), Vec2::new(30.0, 8.0)],
    [Vec2::new(30.0, 8.0), Vec2::new(38.0, 8.0), Vec2::new(45.0, 13.0), Vec2::new(50.0, 20.0)],
    [Vec2::new(50.0, 20.0), Vec2::new(55.0, 13.0), Vec2::new(62.0, 8.0), Vec2::new(70.0, 8.0)],
    [Vec2::new(70.0, 8.0), Vec2::new(84.0, 8.0), Vec2::new(96.0, 18.0), Vec2::new(96.0, 32.0)],
    [Vec2::new(96.0, 32.0), Vec2::new(96.0, 48.0), Vec2::new(75.0, 68.0), Vec2::new(50.0, 88.0)],
];

/// Chords per curve when measuring length
const LENGTH_STEPS: usize = 64;

#[inline]
fn cubic_point(p: &[Vec2; 4], t: f32) -> Vec2 {
    let u = 1.0 - t;
    p[0] * (u * u * u) + p[1] * (3.0 * u * u * t) + p[2] * (3.0 * u * t * t) + p[3] * (t * t * t)
}

fn cubic_length(p: &[Vec2; 4]) -> f32 {
    let mut length = 0.0;
    let mut prev = p[0];
    for i in 1..=LENGTH_STEPS {
        let point = cubic_point(p, i as f32 / LENGTH_STEPS as f32);
        length += prev.distance(point);
        prev = point;
    }
    length
}

/// Total length of the outline in viewBox units
pub fn path_length() -> f32 {
    CURVES.iter().map(cubic_length).sum()
}

/// One keyword's share of the outline
#[derive(Debug, Clone, PartialEq)]
pub struct HeartSegment {
    /// Arc length offset where the segment starts
    pub start: f32,
    pub length: f32,
    pub revealed: bool,
}

impl HeartSegment {
    /// `stroke-dasharray` value: the segment, then a gap for the rest of the path
    pub fn dash_array(&self, total: f32) -> String {
        format!("{} {}", self.length, (total - self.length).max(0.0))
    }

    /// `stroke-dashoffset` value
    pub fn dash_offset(&self) -> String {
        format!("-{}", self.start)
    }
}

/// The outline split into `n` equal-length segments in keyword order
#[derive(Debug, Clone)]
pub struct HeartOutline {
    total: f32,
    segments: Vec<HeartSegment>,
    complete: bool,
}

impl HeartOutline {
    pub fn new(n: usize) -> Self {
        let total = path_length();
        let length = if n == 0 { 0.0 } else { total / n as f32 };
        let segments = (0..n)
            .map(|i| HeartSegment {
                start: i as f32 * length,
                length,
                revealed: false,
            })
            .collect();
        Self {
            total,
            segments,
            complete: false,
        }
    }

    pub fn total_length(&self) -> f32 {
        self.total
    }

    pub fn segments(&self) -> &[HeartSegment] {
        &self.segments
    }

    pub fn set_revealed(&mut self, index: usize, revealed: bool) {
        if let Some(segment) = self.segments.get_mut(index) {
            segment.revealed = revealed;
        }
    }

    pub fn revealed_count(&self) -> usize {
        self.segments.iter().filter(|s| s.revealed).count()
    }

    /// Glow once every word is captured
    pub fn mark_complete(&mut self) {
        self.complete = true;
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Relative width of the heart at `fraction` of its height (0 = top, 1 = tip)
pub fn heart_width_at(fraction: f32) -> f32 {
    if fraction < 0.15 {
        0.3 + fraction * 2.5
    } else if fraction < 0.35 {
        0.65 + (fraction - 0.15) * 0.5
    } else if fraction < 0.45 {
        0.75
    } else {
        0.75 * (1.0 - (fraction - 0.45) / 0.55)
    }
}
