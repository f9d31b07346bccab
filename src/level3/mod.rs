//! Level 3: word capture
//!
//! Keywords float around blurred. Clicking a word enough times captures it
//! into the heart and draws its share of the outline; clicking a captured
//! word releases it. Capturing every word locks the level and plays the gift
//! reveal.
//! - `heart`: outline geometry and segments
//! - `layout`: packing captured words into the heart
//! - `physics`: floating motion
//! - `gift`: the closing sequence

pub mod gift;
pub mod heart;
pub mod layout;
pub mod physics;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde_json::json;

pub use gift::{GiftReveal, GiftStage, GiftStep};
pub use heart::{HeartOutline, heart_width_at};
pub use layout::{Placement, WordBox, pack_into_heart};
pub use physics::Drift;

use crate::analytics::events;
use crate::content::Level3Content;
use crate::context::Context;
use crate::sched::{FrameTask, TimerQueue};
use crate::state::{IdSet, Level3Progress};
use crate::tuning::Tuning;
use crate::viewport_vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordState {
    Floating { clicks: u32 },
    Captured,
}

#[derive(Debug, Clone)]
pub struct FloatingWord {
    pub id: String,
    pub word: String,
    pub state: WordState,
    /// Top-left corner and velocity
    pub drift: Drift,
    /// Rendered size (px); estimated until the driver measures it
    pub size: Vec2,
}

impl FloatingWord {
    pub fn is_captured(&self) -> bool {
        self.state == WordState::Captured
    }

    /// Clicked at least once since it last started floating
    pub fn was_clicked(&self) -> bool {
        match self.state {
            WordState::Floating { clicks } => clicks > 0,
            WordState::Captured => true,
        }
    }
}

/// Result of clicking a word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordClick {
    /// Every word is captured; nothing moves any more
    Ignored,
    Unknown,
    Progress { clicks: u32 },
    Captured { completed: bool },
    Released,
}

/// Rough rendered size of a word before it is measured
fn estimate_size(word: &str) -> Vec2 {
    Vec2::new(word.chars().count() as f32 * 9.0 + 40.0, 28.0)
}

pub struct WordCaptureEngine {
    words: Vec<FloatingWord>,
    heart: HeartOutline,
    gift: GiftReveal,
    all_captured: bool,
    viewport: Vec2,
    threshold: u32,
    tuning: Tuning,
    physics: FrameTask,
    timers: TimerQueue<GiftStep>,
    rng: Pcg32,
    title: String,
    subtitle: String,
}

impl WordCaptureEngine {
    pub fn new(content: &Level3Content, ctx: &Context, width: u32, height: u32, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let tuning = ctx.tuning.clone();
        let viewport = viewport_vec(width, height);

        let words = content
            .keywords
            .iter()
            .map(|kw| FloatingWord {
                id: kw.id.clone(),
                word: kw.word.clone(),
                state: WordState::Floating { clicks: 0 },
                drift: Drift::spawn(&mut rng, viewport, &tuning),
                size: estimate_size(&kw.word),
            })
            .collect();

        let mut engine = Self {
            words,
            heart: HeartOutline::new(content.keywords.len()),
            gift: GiftReveal::new(),
            all_captured: false,
            viewport,
            threshold: tuning.capture_threshold(ctx.is_admin()),
            physics: FrameTask::start("word-physics"),
            timers: TimerQueue::new(),
            rng,
            title: content.title.clone(),
            subtitle: content.subtitle.clone(),
            tuning,
        };
        engine.restore(&ctx.store.read().level3.captured_words);
        engine
    }

    fn restore(&mut self, stored: &IdSet) {
        for (i, word) in self.words.iter_mut().enumerate() {
            if stored.contains(&word.id) {
                word.state = WordState::Captured;
                self.heart.set_revealed(i, true);
            }
        }
        self.relayout();
        if self.captured_count() == self.words.len() {
            log::info!("Level 3 restored as complete");
            self.finish(true);
        } else {
            log::info!(
                "Level 3 restored: {} of {} captured",
                self.captured_count(),
                self.words.len()
            );
        }
    }

    /// Click on word `id`
    pub fn click(&mut self, id: &str, ctx: &Context) -> WordClick {
        if self.all_captured {
            return WordClick::Ignored;
        }
        let Some(index) = self.words.iter().position(|w| w.id == id) else {
            return WordClick::Unknown;
        };

        match self.words[index].state {
            WordState::Captured => {
                self.release(index, ctx);
                WordClick::Released
            }
            WordState::Floating { clicks } => {
                let clicks = clicks + 1;
                if clicks < self.threshold {
                    self.words[index].state = WordState::Floating { clicks };
                    return WordClick::Progress { clicks };
                }
                let completed = self.capture(index, ctx);
                WordClick::Captured { completed }
            }
        }
    }

    fn capture(&mut self, index: usize, ctx: &Context) -> bool {
        let id = self.words[index].id.clone();
        self.words[index].state = WordState::Captured;
        self.heart.set_revealed(index, true);

        ctx.logger.emit(events::WORD_CAPTURED, json!({ "wordId": id }));
        ctx.store.update::<Level3Progress>(|p| {
            p.captured_words.insert(id.clone());
        });
        log::debug!("Word '{}' captured", id);
        self.relayout();

        let completed = self.captured_count() == self.words.len();
        if completed {
            ctx.logger.event(events::LEVEL3_COMPLETED);
            log::info!("Level 3 complete");
            self.finish(false);
        }
        completed
    }

    fn release(&mut self, index: usize, ctx: &Context) {
        let drift = Drift::spawn(&mut self.rng, self.viewport, &self.tuning);
        let word = &mut self.words[index];
        word.state = WordState::Floating { clicks: 0 };
        word.drift = drift;
        self.heart.set_revealed(index, false);

        let id = word.id.clone();
        ctx.store.update::<Level3Progress>(|p| {
            p.captured_words.remove(&id);
        });
        log::debug!("Word '{}' released", id);
        self.relayout();
    }

    /// Lock the level, stop the physics and queue the gift
    fn finish(&mut self, restoring: bool) {
        self.all_captured = true;
        self.heart.mark_complete();
        self.physics.stop();
        let delay = if restoring {
            self.tuning.gift_restore_delay_ms
        } else {
            self.tuning.gift_delay_ms
        };
        self.timers.schedule(delay, GiftStep::Fade);
    }

    /// Re-pack every captured word into the heart, in keyword order
    fn relayout(&mut self) {
        let boxes: Vec<WordBox> = self
            .words
            .iter()
            .filter(|w| w.is_captured())
            .map(|w| WordBox {
                id: w.id.clone(),
                size: w.size,
            })
            .collect();
        for placement in pack_into_heart(&boxes, self.viewport, &self.tuning) {
            if let Some(word) = self.words.iter_mut().find(|w| w.id == placement.id) {
                word.drift.position = placement.center - word.size / 2.0;
            }
        }
    }

    /// Per-frame work: gift timers, then physics while it runs
    pub fn frame(&mut self, now_ms: f64) {
        while let Some(step) = self.timers.pop_due(now_ms) {
            for (delay, next) in self.gift.apply(step, &self.tuning, &mut self.rng) {
                self.timers.schedule(delay, next);
            }
        }
        if self.physics.is_running() {
            let viewport = self.viewport;
            let top = self.tuning.top_margin;
            for word in self.words.iter_mut().filter(|w| !w.is_captured()) {
                word.drift.step(word.size, viewport, top);
            }
        }
    }

    /// Measured size of a word
    pub fn set_word_size(&mut self, id: &str, size: Vec2) {
        if let Some(word) = self.words.iter_mut().find(|w| w.id == id) {
            word.size = size;
        }
        self.relayout();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = viewport_vec(width, height);
        self.relayout();
    }

    /// "Start over": clears all progress. The caller reloads the page.
    pub fn restart(&self, ctx: &Context) -> bool {
        if !self.gift.restart_visible() {
            return false;
        }
        ctx.logger.event(events::RESET);
        ctx.store.reset();
        log::info!("Restarting from level 1");
        true
    }

    pub fn words(&self) -> &[FloatingWord] {
        &self.words
    }

    pub fn word(&self, id: &str) -> Option<&FloatingWord> {
        self.words.iter().find(|w| w.id == id)
    }

    /// Text blur (px) for a word
    pub fn blur(&self, word: &FloatingWord) -> f32 {
        match word.state {
            WordState::Floating { clicks } => self.tuning.blur_for(clicks, self.threshold),
            WordState::Captured => 0.0,
        }
    }

    /// Click badge text, e.g. `1/3`
    pub fn badge(&self, word: &FloatingWord) -> String {
        let clicks = match word.state {
            WordState::Floating { clicks } => clicks,
            WordState::Captured => self.threshold,
        };
        format!("{}/{}", clicks, self.threshold)
    }

    pub fn heart(&self) -> &HeartOutline {
        &self.heart
    }

    pub fn gift(&self) -> &GiftReveal {
        &self.gift
    }

    pub fn captured_count(&self) -> usize {
        self.words.iter().filter(|w| w.is_captured()).count()
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Terminal: every word captured, interaction locked, words glowing
    pub fn is_complete(&self) -> bool {
        self.all_captured
    }

    pub fn progress_text(&self) -> String {
        format!("{} / {} words captured", self.captured_count(), self.words.len())
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    pub fn physics(&self) -> &FrameTask {
        &self.physics
    }

    pub fn wants_frames(&self) -> bool {
        self.physics.is_running() || !self.timers.is_empty()
    }
}
