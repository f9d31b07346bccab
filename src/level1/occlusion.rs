//! Fog occlusion layer
//!
//! A single-channel alpha bitmap standing in for the canvas: filled with fog,
//! erased with a soft round brush (destination-out), sampled for reveal checks.

use glam::Vec2;

#[derive(Debug, Clone)]
pub struct OcclusionLayer {
    width: u32,
    height: u32,
    fog_alpha: u8,
    alpha: Vec<u8>,
    /// Bumped on every mutation so the canvas repaints only when needed
    revision: u64,
}

impl OcclusionLayer {
    /// A layer fully covered by fog
    pub fn new(width: u32, height: u32, fog_alpha: u8) -> Self {
        Self {
            width,
            height,
            fog_alpha,
            alpha: vec![fog_alpha; width as usize * height as usize],
            revision: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Soft round erase. Full strength at the centre, none at the rim.
    pub fn erase(&mut self, center: Vec2, radius: f32) {
        if radius <= 0.0 || self.width == 0 || self.height == 0 {
            return;
        }
        let x0 = (center.x - radius).floor().max(0.0) as i64;
        let y0 = (center.y - radius).floor().max(0.0) as i64;
        let x1 = ((center.x + radius).ceil() as i64).min(self.width as i64 - 1);
        let y1 = ((center.y + radius).ceil() as i64).min(self.height as i64 - 1);
        if x0 > x1 || y0 > y1 {
            return;
        }

        for y in y0..=y1 {
            for x in x0..=x1 {
                let pixel = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let d = pixel.distance(center);
                if d >= radius {
                    continue;
                }
                let strength = 1.0 - d / radius;
                let i = y as usize * self.width as usize + x as usize;
                let remaining = self.alpha[i] as f32 * (1.0 - strength);
                self.alpha[i] = remaining.round() as u8;
            }
        }
        self.revision += 1;
    }

    /// Alpha at a pixel, `None` out of bounds
    pub fn alpha_at(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(self.alpha[y as usize * self.width as usize + x as usize])
    }

    /// Fraction of grid samples around `anchor` whose alpha is below `threshold`.
    ///
    /// Samples cover offsets `-half_extent..=half_extent` at `stride`; samples
    /// outside the layer are skipped. `None` when no sample is in bounds.
    pub fn cleared_fraction(
        &self,
        anchor: Vec2,
        half_extent: i32,
        stride: i32,
        threshold: u8,
    ) -> Option<f32> {
        let stride = stride.max(1) as usize;
        let mut cleared = 0u32;
        let mut total = 0u32;
        for dx in (-half_extent..=half_extent).step_by(stride) {
            for dy in (-half_extent..=half_extent).step_by(stride) {
                let px = (anchor.x + dx as f32).floor() as i32;
                let py = (anchor.y + dy as f32).floor() as i32;
                let Some(alpha) = self.alpha_at(px, py) else {
                    continue;
                };
                total += 1;
                if alpha < threshold {
                    cleared += 1;
                }
            }
        }
        (total > 0).then(|| cleared as f32 / total as f32)
    }

    /// Resize, refill, and keep prior erasures (nearest-neighbour rescale).
    pub fn resize(&mut self, width: u32, height: u32) {
        let (old_w, old_h) = (self.width, self.height);
        let snapshot = std::mem::take(&mut self.alpha);

        self.width = width;
        self.height = height;
        self.alpha = vec![self.fog_alpha; width as usize * height as usize];

        if old_w > 0 && old_h > 0 {
            for y in 0..height {
                let sy = (y as u64 * old_h as u64 / height as u64) as usize;
                for x in 0..width {
                    let sx = (x as u64 * old_w as u64 / width as u64) as usize;
                    let kept = snapshot[sy * old_w as usize + sx];
                    let i = y as usize * width as usize + x as usize;
                    self.alpha[i] = self.alpha[i].min(kept);
                }
            }
        }
        self.revision += 1;
    }

    /// RGBA pixels for `putImageData`, fog tinted with `rgb`
    pub fn to_rgba(&self, rgb: [u8; 3]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.alpha.len() * 4);
        for &a in &self.alpha {
            out.extend_from_slice(&[rgb[0], rgb[1], rgb[2], a]);
        }
        out
    }
}
