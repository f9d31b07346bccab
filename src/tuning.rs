//! Game tuning constants
//!
//! Every number that shapes gameplay lives here. Defaults match the shipped
//! experience; a `tuning` block in the content JSON may override any field.

use serde::{Deserialize, Serialize};

/// Data-driven gameplay constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tuning {
    // === Level 1: fog reveal ===
    /// Wipe brush radius (px)
    pub brush_radius: f32,
    /// Fog cleared around already-found sparkles on restore (px)
    pub restore_clear_radius: f32,
    /// Fog layer opacity (0-255)
    pub fog_alpha: u8,
    /// Half-extent of the reveal sample grid around a sparkle (px)
    pub reveal_sample_radius: i32,
    /// Reveal sample grid stride (px)
    pub reveal_sample_stride: i32,
    /// Samples below this alpha count as cleared
    pub reveal_alpha_threshold: u8,
    /// Cleared fraction required to reveal a sparkle
    pub reveal_fraction: f32,
    /// Radius of a sparkle hit target (px)
    pub sparkle_hit_radius: f32,
    /// Inset from each edge for generated sparkle positions (fraction)
    pub placement_margin: f32,
    /// Spacing that ends the candidate search early (fraction)
    pub placement_min_distance: f32,
    /// Candidates sampled per sparkle
    pub placement_attempts: u32,
    /// Resize debounce (ms)
    pub resize_debounce_ms: f64,
    /// Particles in a found-sparkle burst
    pub burst_particles: usize,

    // === Level 2: memory match ===
    /// Mismatch indication before cards flip back (ms)
    pub mismatch_delay_ms: f64,
    /// Layout settle time before a timeline node appears (ms, ~2 frames)
    pub timeline_settle_ms: f64,
    /// Delay before scrolling a revealed timeline node into view (ms)
    pub timeline_scroll_ms: f64,
    /// Delay between the last match and hiding the grid (ms)
    pub match_complete_delay_ms: f64,

    // === Level 3: word capture ===
    /// Clicks needed to capture a word
    pub capture_clicks: u32,
    /// Clicks needed in admin mode
    pub admin_capture_clicks: u32,
    /// Blur applied to an unclicked word (px)
    pub max_blur_px: f32,
    /// Space reserved for the title above the play field (px)
    pub top_margin: f32,
    /// Floating speed range (px/frame)
    pub min_speed: f32,
    pub max_speed: f32,
    /// Horizontal room kept free on the right when spawning (px)
    pub spawn_right_margin: f32,
    /// Vertical spawn band: `[spawn_top, height - spawn_bottom_margin)` (px)
    pub spawn_top: f32,
    pub spawn_bottom_margin: f32,
    /// Heart box as fractions of the viewport
    pub heart_top: f32,
    pub heart_bottom: f32,
    pub heart_center_x: f32,
    /// Fraction of the heart width a row may use
    pub heart_row_fill: f32,
    /// Gaps used by the heart packing (px)
    pub row_gap: f32,
    pub word_gap: f32,
    /// Wait before the gift appears after completing (ms)
    pub gift_delay_ms: f64,
    /// Wait before the gift appears when restoring a completed run (ms)
    pub gift_restore_delay_ms: f64,
    /// Gift sequence steps (ms)
    pub gift_show_ms: f64,
    pub gift_open_ms: f64,
    pub gift_sparkle_interval_ms: f64,
    pub gift_message_ms: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            // Level 1
            brush_radius: 40.0,
            restore_clear_radius: 60.0,
            fog_alpha: 242,
            reveal_sample_radius: 25,
            reveal_sample_stride: 10,
            reveal_alpha_threshold: 128,
            reveal_fraction: 0.4,
            sparkle_hit_radius: 24.0,
            placement_margin: 0.12,
            placement_min_distance: 0.18,
            placement_attempts: 80,
            resize_debounce_ms: 150.0,
            burst_particles: 5,

            // Level 2
            mismatch_delay_ms: 2500.0,
            timeline_settle_ms: 32.0,
            timeline_scroll_ms: 300.0,
            match_complete_delay_ms: 800.0,

            // Level 3
            capture_clicks: 3,
            admin_capture_clicks: 1,
            max_blur_px: 8.0,
            top_margin: 80.0,
            min_speed: 0.15,
            max_speed: 0.5,
            spawn_right_margin: 150.0,
            spawn_top: 100.0,
            spawn_bottom_margin: 100.0,
            heart_top: 0.16,
            heart_bottom: 0.72,
            heart_center_x: 0.5,
            heart_row_fill: 0.65,
            row_gap: 8.0,
            word_gap: 12.0,
            gift_delay_ms: 10_000.0,
            gift_restore_delay_ms: 800.0,
            gift_show_ms: 1200.0,
            gift_open_ms: 1000.0,
            gift_sparkle_interval_ms: 300.0,
            gift_message_ms: 2000.0,
        }
    }
}

impl Tuning {
    /// Clicks needed to capture a word (admin mode captures on the first click)
    pub fn capture_threshold(&self, admin: bool) -> u32 {
        let clicks = if admin {
            self.admin_capture_clicks
        } else {
            self.capture_clicks
        };
        clicks.max(1)
    }

    /// Blur for a word that has received `clicks` of `threshold` clicks
    pub fn blur_for(&self, clicks: u32, threshold: u32) -> f32 {
        let progress = (clicks as f32 / threshold.max(1) as f32).min(1.0);
        self.max_blur_px * (1.0 - progress)
    }
}
