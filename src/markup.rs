//! Static page skeletons and the text that fills them
//!
//! Skeletons are fixed markup with empty slots. Content strings from
//! `data.json` only ever reach the page as text through [`TextSlot`]s, never
//! as markup.

use crate::level2::TimelineNode;
use crate::level3::gift::{GIFT_MESSAGE, RESTART_LABEL};
use crate::level3::{FloatingWord, WordCaptureEngine};
use crate::orchestrator::ActiveLevel;

/// Text for the element matched by `selector` (`#id` or `.class`)
#[derive(Debug, Clone, PartialEq)]
pub struct TextSlot {
    pub selector: &'static str,
    pub text: String,
}

impl TextSlot {
    fn new(selector: &'static str, text: impl Into<String>) -> Self {
        Self {
            selector,
            text: text.into(),
        }
    }
}

pub const LEVEL1: &str = r#"<canvas id="fog-canvas"></canvas>
<div id="sparkle-overlay"></div>
<p class="subtitle"></p>
<p id="level1-progress" class="progress-indicator"></p>
<button id="level1-cta" class="cta-button" hidden></button>"#;

pub const LEVEL2: &str = r#"<div class="level2-background"></div>
<h1 class="level2-title"></h1>
<p id="level2-progress" class="progress-indicator"></p>
<p class="subtitle"></p>
<div class="game-area">
  <div class="grid-column"><div class="grid-label">Dates</div><div class="card-grid" id="date-grid"></div></div>
  <div class="grid-column"><div class="grid-label">Memories</div><div class="card-grid" id="photo-grid"></div></div>
</div>
<div class="timeline-container visible" id="level2-timeline"><div class="timeline-line"></div></div>
<button id="level2-cta" class="cta-button" hidden></button>
<button class="go-top-btn" id="go-top-btn" aria-label="Go to top">&uarr;</button>"#;

pub const LEVEL3: &str = r#"<div class="level3-background"></div>
<h1 class="level3-title"></h1>
<p class="level3-subtitle"></p>
<p class="level3-progress"></p>
<div class="gift-box-container">
  <div class="gift-box">
    <div class="gift-body"><div class="gift-ribbon-v"></div><div class="gift-ribbon-h"></div></div>
    <div class="gift-lid"><div class="gift-lid-ribbon"></div></div>
  </div>
  <div class="gift-message"></div>
</div>
<button id="level3-restart"></button>"#;

/// Inner markup of one timeline node; the photo or emoji goes before the caption
pub const TIMELINE_NODE: &str = r#"<div class="timeline-node-dot"></div>
<div class="timeline-node-date"></div>
<div class="timeline-node-card"><span class="timeline-node-caption"></span></div>"#;

/// Inner markup of one floating word
pub const FLOATING_WORD: &str = r#"<span class="word-text"></span><span class="click-badge"></span>"#;

/// Skeleton and text for the running level's container
pub fn level(active: &ActiveLevel) -> Option<(&'static str, Vec<TextSlot>)> {
    match active {
        ActiveLevel::Fog(engine) => Some((
            LEVEL1,
            vec![
                TextSlot::new(".subtitle", engine.subtitle()),
                TextSlot::new("#level1-cta", engine.cta_text()),
            ],
        )),
        ActiveLevel::Match(engine) => Some((
            LEVEL2,
            vec![
                TextSlot::new(".level2-title", engine.title()),
                TextSlot::new(".subtitle", engine.subtitle()),
                TextSlot::new("#level2-cta", engine.cta_text()),
            ],
        )),
        ActiveLevel::Capture(engine) => Some((
            LEVEL3,
            vec![
                TextSlot::new(".level3-title", engine.title()),
                TextSlot::new(".level3-subtitle", engine.subtitle()),
                TextSlot::new(".gift-message", GIFT_MESSAGE),
                TextSlot::new("#level3-restart", RESTART_LABEL),
            ],
        )),
        ActiveLevel::Unknown(_) => None,
    }
}

pub fn timeline_node(node: &TimelineNode) -> Vec<TextSlot> {
    vec![
        TextSlot::new(".timeline-node-date", node.date.as_str()),
        TextSlot::new(".timeline-node-caption", node.caption.as_str()),
    ]
}

pub fn floating_word(engine: &WordCaptureEngine, word: &FloatingWord) -> Vec<TextSlot> {
    vec![
        TextSlot::new(".word-text", word.word.as_str()),
        TextSlot::new(".click-badge", engine.badge(word)),
    ]
}
