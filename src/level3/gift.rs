//! Gift box reveal after every word is captured

use rand::Rng;

use crate::tuning::Tuning;

/// Sparkles that pop out of the opened box, in order
pub const GIFT_SPARKLES: [&str; 5] = ["\u{2728}", "\u{1F496}", "\u{1F31F}", "\u{1F495}", "\u{2B50}"];

pub const GIFT_MESSAGE: &str = "Forever & Always \u{1F495}";

pub const RESTART_LABEL: &str = "Start Over";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GiftStage {
    Hidden,
    /// Words, heart and captions fading out
    Fading,
    BoxVisible,
    BoxOpen,
    /// Message and restart action shown
    Finished,
}

/// A step of the sequence, fired by a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiftStep {
    Fade,
    ShowBox,
    OpenBox,
    Sparkle(usize),
    ShowMessage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GiftSparkle {
    pub glyph: &'static str,
    /// Offset inside the box (px)
    pub left: f32,
    pub top: f32,
}

#[derive(Debug, Clone)]
pub struct GiftReveal {
    stage: GiftStage,
    sparkles: Vec<GiftSparkle>,
}

impl Default for GiftReveal {
    fn default() -> Self {
        Self::new()
    }
}

impl GiftReveal {
    pub fn new() -> Self {
        Self {
            stage: GiftStage::Hidden,
            sparkles: Vec::new(),
        }
    }

    pub fn stage(&self) -> GiftStage {
        self.stage
    }

    pub fn sparkles(&self) -> &[GiftSparkle] {
        &self.sparkles
    }

    pub fn restart_visible(&self) -> bool {
        self.stage == GiftStage::Finished
    }

    /// Apply one step; returns the follow-up steps with their delays (ms)
    pub fn apply<R: Rng>(&mut self, step: GiftStep, tuning: &Tuning, rng: &mut R) -> Vec<(f64, GiftStep)> {
        match step {
            GiftStep::Fade => {
                self.stage = GiftStage::Fading;
                vec![(tuning.gift_show_ms, GiftStep::ShowBox)]
            }
            GiftStep::ShowBox => {
                self.stage = GiftStage::BoxVisible;
                vec![(tuning.gift_open_ms, GiftStep::OpenBox)]
            }
            GiftStep::OpenBox => {
                self.stage = GiftStage::BoxOpen;
                let mut next: Vec<(f64, GiftStep)> = (0..GIFT_SPARKLES.len())
                    .map(|i| (i as f64 * tuning.gift_sparkle_interval_ms, GiftStep::Sparkle(i)))
                    .collect();
                next.push((tuning.gift_message_ms, GiftStep::ShowMessage));
                next
            }
            GiftStep::Sparkle(i) => {
                if let Some(&glyph) = GIFT_SPARKLES.get(i) {
                    self.sparkles.push(GiftSparkle {
                        glyph,
                        left: 50.0 + rng.random::<f32>() * 40.0,
                        top: 10.0,
                    });
                }
                Vec::new()
            }
            GiftStep::ShowMessage => {
                self.stage = GiftStage::Finished;
                log::info!("Gift revealed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_full_sequence() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut gift = GiftReveal::new();

        let next = gift.apply(GiftStep::Fade, &tuning, &mut rng);
        assert_eq!(next, vec![(1200.0, GiftStep::ShowBox)]);
        assert_eq!(gift.stage(), GiftStage::Fading);

        let next = gift.apply(GiftStep::ShowBox, &tuning, &mut rng);
        assert_eq!(next, vec![(1000.0, GiftStep::OpenBox)]);

        let next = gift.apply(GiftStep::OpenBox, &tuning, &mut rng);
        assert_eq!(next.len(), 6);
        assert_eq!(next[4], (1200.0, GiftStep::Sparkle(4)));
        assert_eq!(next[5], (2000.0, GiftStep::ShowMessage));
        assert!(!gift.restart_visible());

        for (_, step) in next {
            gift.apply(step, &tuning, &mut rng);
        }
        assert_eq!(gift.sparkles().len(), 5);
        assert!(gift.sparkles().iter().all(|s| s.left >= 50.0 && s.left <= 90.0));
        assert!(gift.restart_visible());
    }
}
