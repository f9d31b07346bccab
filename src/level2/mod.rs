//! Level 2: memory match
//!
//! Two shuffled columns of cards (dates and memories). The player flips one
//! card of each column; equal pair ids match permanently and reveal that
//! pair's node on the timeline, anything else flips back after a delay.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde_json::json;

use crate::analytics::events;
use crate::content::{Level2Content, Pair, PhotoRef};
use crate::context::Context;
use crate::sched::TimerQueue;
use crate::state::{IdSet, Level2Progress};
use crate::tuning::Tuning;

/// Page scroll (px) past which the "back to top" button shows
pub const GO_TOP_THRESHOLD_PX: f64 = 200.0;

/// Which column a card belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Date,
    Photo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Unflipped,
    Flipped,
    /// Flipped, part of a failed comparison, about to flip back
    Mismatched,
    Matched,
}

impl CardState {
    /// Front face is showing
    pub fn is_face_up(self) -> bool {
        !matches!(self, Self::Unflipped)
    }
}

/// What the front of a card shows
#[derive(Debug, Clone, PartialEq)]
pub enum CardFront {
    Date(String),
    Memory {
        photo: PhotoRef,
        emoji: String,
        caption: String,
    },
}

#[derive(Debug, Clone)]
pub struct Card {
    pub pair_id: String,
    pub face: Face,
    pub state: CardState,
    /// `?`, or the pair number in admin mode
    pub back_label: String,
    pub front: CardFront,
}

/// One pair's slot on the timeline below the grid
#[derive(Debug, Clone)]
pub struct TimelineNode {
    pub pair_id: String,
    pub date: String,
    pub photo: PhotoRef,
    pub emoji: String,
    pub caption: String,
    /// Drawn on the right side of the line
    pub right: bool,
    pub visible: bool,
}

/// Result of a flip request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    /// Locked, already face up, or that column already has a pending card
    Ignored,
    /// Waiting for a card from the other column
    Pending,
    Matched { completed: bool },
    Mismatched,
}

#[derive(Debug, Clone, PartialEq)]
enum Level2Timer {
    Unflip { date: usize, photo: usize },
    RevealNode(String),
    ScrollTo(String),
    ShowCompletion,
}

pub struct MemoryMatchEngine {
    dates: Vec<Card>,
    photos: Vec<Card>,
    timeline: Vec<TimelineNode>,
    matched: IdSet,
    total: usize,
    selected_date: Option<usize>,
    selected_photo: Option<usize>,
    locked: bool,
    grid_visible: bool,
    completion_visible: bool,
    timers: TimerQueue<Level2Timer>,
    tuning: Tuning,
    title: String,
    subtitle: String,
    cta_text: String,
}

fn back_label(pair: &Pair, admin: bool) -> String {
    if admin {
        pair.id.replacen('p', "", 1)
    } else {
        "?".to_string()
    }
}

fn shuffled(pairs: &[Pair], rng: &mut Pcg32) -> Vec<usize> {
    let mut order: Vec<usize> = (0..pairs.len()).collect();
    order.shuffle(rng);
    order
}

impl MemoryMatchEngine {
    pub fn new(content: &Level2Content, ctx: &Context, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let admin = ctx.is_admin();
        let pairs = &content.pairs;

        // Independent orders for the two columns
        let date_order = shuffled(pairs, &mut rng);
        let photo_order = shuffled(pairs, &mut rng);

        let dates = date_order
            .iter()
            .map(|&i| Card {
                pair_id: pairs[i].id.clone(),
                face: Face::Date,
                state: CardState::Unflipped,
                back_label: back_label(&pairs[i], admin),
                front: CardFront::Date(pairs[i].date.clone()),
            })
            .collect();
        let photos = photo_order
            .iter()
            .map(|&i| Card {
                pair_id: pairs[i].id.clone(),
                face: Face::Photo,
                state: CardState::Unflipped,
                back_label: back_label(&pairs[i], admin),
                front: CardFront::Memory {
                    photo: PhotoRef::for_level(2, pairs[i].photo.as_deref()),
                    emoji: pairs[i].emoji.clone(),
                    caption: pairs[i].caption.clone(),
                },
            })
            .collect();
        let timeline = pairs
            .iter()
            .enumerate()
            .map(|(i, pair)| TimelineNode {
                pair_id: pair.id.clone(),
                date: pair.date.clone(),
                photo: PhotoRef::for_level(2, pair.photo.as_deref()),
                emoji: pair.emoji.clone(),
                caption: pair.caption.clone(),
                right: i % 2 == 1,
                visible: false,
            })
            .collect();

        let mut engine = Self {
            dates,
            photos,
            timeline,
            matched: IdSet::new(),
            total: pairs.len(),
            selected_date: None,
            selected_photo: None,
            locked: false,
            grid_visible: true,
            completion_visible: false,
            timers: TimerQueue::new(),
            tuning: ctx.tuning.clone(),
            title: content.title.clone(),
            subtitle: content.subtitle.clone(),
            cta_text: content.cta_text.clone(),
        };
        engine.restore(&ctx.store.read().level2.matched_pairs);
        engine
    }

    /// Re-apply stored matches without logging
    fn restore(&mut self, stored: &IdSet) {
        let known: IdSet = self.timeline.iter().map(|n| n.pair_id.clone()).collect();
        self.matched = stored.intersection(&known).cloned().collect();

        for card in self.dates.iter_mut().chain(self.photos.iter_mut()) {
            if self.matched.contains(&card.pair_id) {
                card.state = CardState::Matched;
            }
        }
        for node in &mut self.timeline {
            node.visible = self.matched.contains(&node.pair_id);
        }
        if self.is_complete() {
            self.grid_visible = false;
            self.completion_visible = true;
            log::info!("Level 2 restored as complete");
        } else {
            log::info!("Level 2 restored: {} of {} matched", self.matched.len(), self.total);
        }
    }

    fn column_mut(&mut self, face: Face) -> &mut Vec<Card> {
        match face {
            Face::Date => &mut self.dates,
            Face::Photo => &mut self.photos,
        }
    }

    fn selected_mut(&mut self, face: Face) -> &mut Option<usize> {
        match face {
            Face::Date => &mut self.selected_date,
            Face::Photo => &mut self.selected_photo,
        }
    }

    /// Flip card `index` of the `face` column
    pub fn flip(&mut self, face: Face, index: usize, ctx: &Context) -> FlipOutcome {
        if self.locked || self.selected_mut(face).is_some() {
            return FlipOutcome::Ignored;
        }
        match self.column_mut(face).get_mut(index) {
            Some(card) if card.state == CardState::Unflipped => card.state = CardState::Flipped,
            _ => return FlipOutcome::Ignored,
        }
        *self.selected_mut(face) = Some(index);

        match (self.selected_date, self.selected_photo) {
            (Some(date), Some(photo)) => {
                self.locked = true;
                self.compare(date, photo, ctx)
            }
            _ => FlipOutcome::Pending,
        }
    }

    fn compare(&mut self, date: usize, photo: usize, ctx: &Context) -> FlipOutcome {
        let pair_id = self.dates[date].pair_id.clone();
        if pair_id != self.photos[photo].pair_id {
            self.dates[date].state = CardState::Mismatched;
            self.photos[photo].state = CardState::Mismatched;
            self.timers
                .schedule(self.tuning.mismatch_delay_ms, Level2Timer::Unflip { date, photo });
            log::debug!("Mismatch: {} vs {}", pair_id, self.photos[photo].pair_id);
            return FlipOutcome::Mismatched;
        }

        self.dates[date].state = CardState::Matched;
        self.photos[photo].state = CardState::Matched;
        self.matched.insert(pair_id.clone());
        ctx.store.update::<Level2Progress>(|p| {
            p.matched_pairs.insert(pair_id.clone());
        });
        ctx.logger
            .emit(events::PAIR_MATCHED, json!({ "pairId": pair_id }));
        self.timers.schedule(
            self.tuning.timeline_settle_ms,
            Level2Timer::RevealNode(pair_id.clone()),
        );
        self.selected_date = None;
        self.selected_photo = None;
        self.locked = false;
        log::debug!("Pair '{}' matched", pair_id);

        let completed = self.is_complete();
        if completed {
            ctx.logger.event(events::LEVEL2_COMPLETED);
            self.timers
                .schedule(self.tuning.match_complete_delay_ms, Level2Timer::ShowCompletion);
            log::info!("Level 2 complete");
        }
        FlipOutcome::Matched { completed }
    }

    /// Fire due timers. Returns the pair ids whose timeline node should be
    /// scrolled into view.
    pub fn advance(&mut self, now_ms: f64) -> Vec<String> {
        let mut scroll = Vec::new();
        while let Some(timer) = self.timers.pop_due(now_ms) {
            match timer {
                Level2Timer::Unflip { date, photo } => {
                    for card in [&mut self.dates[date], &mut self.photos[photo]] {
                        if card.state == CardState::Mismatched {
                            card.state = CardState::Unflipped;
                        }
                    }
                    self.selected_date = None;
                    self.selected_photo = None;
                    self.locked = false;
                }
                Level2Timer::RevealNode(id) => {
                    if let Some(node) = self.timeline.iter_mut().find(|n| n.pair_id == id) {
                        node.visible = true;
                        self.timers
                            .schedule(self.tuning.timeline_scroll_ms, Level2Timer::ScrollTo(id));
                    }
                }
                Level2Timer::ScrollTo(id) => scroll.push(id),
                Level2Timer::ShowCompletion => {
                    self.grid_visible = false;
                    self.completion_visible = true;
                }
            }
        }
        scroll
    }

    /// Cards of one column in display order
    pub fn cards(&self, face: Face) -> &[Card] {
        match face {
            Face::Date => &self.dates,
            Face::Photo => &self.photos,
        }
    }

    pub fn timeline(&self) -> &[TimelineNode] {
        &self.timeline
    }

    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.matched.len() == self.total
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn grid_visible(&self) -> bool {
        self.grid_visible
    }

    pub fn completion_visible(&self) -> bool {
        self.completion_visible
    }

    pub fn progress_text(&self) -> String {
        format!("{} of {} pairs matched", self.matched.len(), self.total)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    pub fn cta_text(&self) -> &str {
        &self.cta_text
    }

    pub fn wants_frames(&self) -> bool {
        !self.timers.is_empty()
    }
}
