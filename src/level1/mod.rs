//! Level 1: fog reveal
//!
//! The player wipes fog off the screen to uncover hidden sparkles, then
//! clicks each uncovered sparkle to find it.
//! - `occlusion`: the fog alpha layer
//! - `placement`: one-time sparkle position generation

pub mod occlusion;
pub mod placement;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde_json::json;

pub use occlusion::OcclusionLayer;
pub use placement::generate_positions;

use crate::analytics::events;
use crate::content::{Level1Content, PhotoRef};
use crate::context::Context;
use crate::sched::{FrameTask, TimerQueue};
use crate::state::{IdSet, Level1Progress, SparklePosition};
use crate::tuning::Tuning;
use crate::{fraction_to_screen, viewport_vec};

/// Glyphs used by the found-sparkle burst
const BURST_GLYPHS: [&str; 5] = ["\u{2764}\u{FE0F}", "\u{1F497}", "\u{1F496}", "\u{2728}", "\u{1F49B}"];

/// A hidden object and its hit target
#[derive(Debug, Clone)]
pub struct SparkleTarget {
    pub id: String,
    pub label: String,
    pub photo: PhotoRef,
    /// Position as a fraction of the viewport (persisted)
    pub fraction: Vec2,
    /// Position in pixels for the current viewport
    pub screen: Vec2,
    /// Fog is cleared enough for the target to be clickable
    pub revealed: bool,
    pub found: bool,
}

/// One floating heart of a burst
#[derive(Debug, Clone, PartialEq)]
pub struct BurstParticle {
    pub glyph: &'static str,
    /// Horizontal drift (px)
    pub drift_x: f32,
    pub delay_ms: f64,
}

/// Decorative burst spawned when a sparkle is found
#[derive(Debug, Clone, PartialEq)]
pub struct Burst {
    pub origin: Vec2,
    pub particles: Vec<BurstParticle>,
}

/// Result of clicking a sparkle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparkleClick {
    /// Newly found; `completed` when it was the last one
    Found { completed: bool },
    AlreadyFound,
    /// Still under the fog
    Hidden,
    Unknown,
}

#[derive(Debug, Clone, Copy)]
enum Level1Timer {
    Resize { width: u32, height: u32 },
}

pub struct FogRevealEngine {
    targets: Vec<SparkleTarget>,
    layer: OcclusionLayer,
    viewport: Vec2,
    tuning: Tuning,
    admin: bool,
    subtitle: String,
    cta_text: String,
    wiping: bool,
    completion_visible: bool,
    reveal_task: FrameTask,
    timers: TimerQueue<Level1Timer>,
    bursts: Vec<Burst>,
    rng: Pcg32,
}

impl FogRevealEngine {
    /// Build the level for a `width` x `height` viewport and restore saved progress
    pub fn new(content: &Level1Content, ctx: &Context, width: u32, height: u32, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let tuning = ctx.tuning.clone();
        let state = ctx.store.read();

        let mut positions = state.level1.sparkle_positions.clone();
        if positions.len() != content.sparkles.len() {
            let generated = generate_positions(content.sparkles.len(), &mut rng, &tuning);
            positions = content
                .sparkles
                .iter()
                .zip(generated)
                .map(|(s, p)| (s.id.clone(), SparklePosition::from(p)))
                .collect();
            let stored = positions.clone();
            ctx.store
                .update::<Level1Progress>(|p| p.sparkle_positions = stored);
            log::info!("Generated {} sparkle positions", positions.len());
        }

        let viewport = viewport_vec(width, height);
        let targets = content
            .sparkles
            .iter()
            .map(|s| {
                let fraction = positions
                    .get(&s.id)
                    .map(|p| p.to_vec2())
                    .unwrap_or(Vec2::splat(0.5));
                SparkleTarget {
                    id: s.id.clone(),
                    label: s.label.clone(),
                    photo: PhotoRef::for_level(1, s.photo.as_deref()),
                    fraction,
                    screen: fraction_to_screen(fraction, viewport),
                    revealed: false,
                    found: false,
                }
            })
            .collect();

        let mut engine = Self {
            targets,
            layer: OcclusionLayer::new(width, height, tuning.fog_alpha),
            viewport,
            admin: ctx.is_admin(),
            subtitle: content.subtitle.clone(),
            cta_text: content.cta_text.clone(),
            wiping: false,
            completion_visible: false,
            reveal_task: FrameTask::start("fog-reveal"),
            timers: TimerQueue::new(),
            bursts: Vec::new(),
            rng,
            tuning,
        };
        engine.restore(&state.level1.found_sparkles);
        engine
    }

    /// Re-apply found sparkles: clear fog around them, show completion if done
    fn restore(&mut self, found: &IdSet) {
        let radius = self.tuning.restore_clear_radius;
        for target in self.targets.iter_mut().filter(|t| found.contains(&t.id)) {
            target.found = true;
            target.revealed = true;
            self.layer.erase(target.screen, radius);
        }
        if self.is_complete() {
            // Restored completion is shown, never re-logged
            self.completion_visible = true;
            self.reveal_task.stop();
            log::info!("Level 1 restored as complete");
        } else {
            log::info!(
                "Level 1 restored: {} of {} found",
                self.found_count(),
                self.total()
            );
        }
    }

    /// Hit target under a point, if any
    pub fn target_at(&self, at: Vec2) -> Option<&SparkleTarget> {
        let radius = self.tuning.sparkle_hit_radius;
        self.targets.iter().find(|t| t.screen.distance(at) <= radius)
    }

    /// Start wiping. Returns `false` when the pointer landed on a hit target.
    pub fn pointer_down(&mut self, at: Vec2) -> bool {
        if self.target_at(at).is_some() {
            return false;
        }
        self.wiping = true;
        self.layer.erase(at, self.tuning.brush_radius);
        true
    }

    pub fn pointer_move(&mut self, at: Vec2) {
        if self.wiping {
            self.layer.erase(at, self.tuning.brush_radius);
        }
    }

    /// Pointer released or left the play area
    pub fn pointer_up(&mut self) {
        self.wiping = false;
    }

    pub fn is_wiping(&self) -> bool {
        self.wiping
    }

    /// Per-frame work: fire due timers, then run the reveal check while active
    pub fn frame(&mut self, now_ms: f64) {
        self.fire_timers(now_ms);
        if self.reveal_task.is_running() {
            self.check_reveal();
        }
    }

    /// Sample the fog around every unfound sparkle and update reveal flags
    pub fn check_reveal(&mut self) {
        let tuning = &self.tuning;
        for target in self.targets.iter_mut().filter(|t| !t.found) {
            if self.admin {
                target.revealed = true;
                continue;
            }
            target.revealed = self
                .layer
                .cleared_fraction(
                    target.screen,
                    tuning.reveal_sample_radius,
                    tuning.reveal_sample_stride,
                    tuning.reveal_alpha_threshold,
                )
                .is_some_and(|cleared| cleared > tuning.reveal_fraction);
        }
    }

    /// Click on a sparkle's hit target
    pub fn click_sparkle(&mut self, id: &str, ctx: &Context) -> SparkleClick {
        let Some(target) = self.targets.iter_mut().find(|t| t.id == id) else {
            return SparkleClick::Unknown;
        };
        if target.found {
            return SparkleClick::AlreadyFound;
        }
        if !target.revealed {
            return SparkleClick::Hidden;
        }

        target.found = true;
        let id = target.id.clone();
        let origin = target.screen;

        ctx.store.update::<Level1Progress>(|p| {
            p.found_sparkles.insert(id.clone());
        });
        ctx.logger
            .emit(events::SPARKLE_FOUND, json!({ "sparkleId": id }));
        log::debug!("Sparkle '{}' found", id);
        self.spawn_burst(origin);

        let completed = self.is_complete();
        if completed {
            self.completion_visible = true;
            self.reveal_task.stop();
            ctx.logger.event(events::LEVEL1_COMPLETED);
            log::info!("Level 1 complete");
        }
        SparkleClick::Found { completed }
    }

    fn spawn_burst(&mut self, origin: Vec2) {
        let particles = (0..self.tuning.burst_particles)
            .map(|i| BurstParticle {
                glyph: BURST_GLYPHS[i % BURST_GLYPHS.len()],
                drift_x: (self.rng.random::<f32>() - 0.5) * 60.0,
                delay_ms: i as f64 * 100.0,
            })
            .collect();
        self.bursts.push(Burst { origin, particles });
    }

    fn fire_timers(&mut self, now_ms: f64) {
        while let Some(timer) = self.timers.pop_due(now_ms) {
            match timer {
                Level1Timer::Resize { width, height } => self.apply_resize(width, height),
            }
        }
    }

    /// Viewport changed at `now_ms`; applied once no further resize arrives
    /// within the debounce delay
    pub fn resize(&mut self, width: u32, height: u32, now_ms: f64) {
        self.fire_timers(now_ms);
        self.timers
            .cancel(|timer| matches!(timer, Level1Timer::Resize { .. }));
        self.timers.schedule(
            self.tuning.resize_debounce_ms,
            Level1Timer::Resize { width, height },
        );
    }

    fn apply_resize(&mut self, width: u32, height: u32) {
        log::debug!("Fog resized to {}x{}", width, height);
        self.layer.resize(width, height);
        self.viewport = viewport_vec(width, height);
        for target in &mut self.targets {
            target.screen = fraction_to_screen(target.fraction, self.viewport);
        }
    }

    /// Bursts spawned since the last call
    pub fn drain_bursts(&mut self) -> Vec<Burst> {
        std::mem::take(&mut self.bursts)
    }

    pub fn targets(&self) -> &[SparkleTarget] {
        &self.targets
    }

    pub fn layer(&self) -> &OcclusionLayer {
        &self.layer
    }

    pub fn found_count(&self) -> usize {
        self.targets.iter().filter(|t| t.found).count()
    }

    pub fn total(&self) -> usize {
        self.targets.len()
    }

    pub fn is_complete(&self) -> bool {
        self.targets.iter().all(|t| t.found)
    }

    /// The "next level" action is shown
    pub fn completion_visible(&self) -> bool {
        self.completion_visible
    }

    pub fn progress_text(&self) -> String {
        format!("{} of {} sparkles found", self.found_count(), self.total())
    }

    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    pub fn cta_text(&self) -> &str {
        &self.cta_text
    }

    pub fn reveal_task(&self) -> &FrameTask {
        &self.reveal_task
    }

    /// More frames are needed (reveal loop running or a resize pending)
    pub fn wants_frames(&self) -> bool {
        self.reveal_task.is_running() || !self.timers.is_empty()
    }
}
