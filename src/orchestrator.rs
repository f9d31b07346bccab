//! Boot sequence and level transition
//!
//! One page load runs exactly one level. Order matters: query-string
//! overrides (including reset) are applied before anything reads progress,
//! and the page view is logged before the level engine starts.

use serde_json::json;
use thiserror::Error;

use crate::analytics::events;
use crate::content::{ContentDescriptor, ContentError};
use crate::context::Context;
use crate::level1::FogRevealEngine;
use crate::level2::MemoryMatchEngine;
use crate::level3::WordCaptureEngine;

/// Failure before any level could start
#[derive(Debug, Error)]
pub enum BootError {
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// The engine selected for this load
pub enum ActiveLevel {
    Fog(FogRevealEngine),
    Match(MemoryMatchEngine),
    Capture(WordCaptureEngine),
    /// A level number with no engine; nothing is shown
    Unknown(u32),
}

impl ActiveLevel {
    /// The level's "next" action is available
    pub fn completion_visible(&self) -> bool {
        match self {
            Self::Fog(engine) => engine.completion_visible(),
            Self::Match(engine) => engine.completion_visible(),
            Self::Capture(_) | Self::Unknown(_) => false,
        }
    }

    pub fn wants_frames(&self) -> bool {
        match self {
            Self::Fog(engine) => engine.wants_frames(),
            Self::Match(engine) => engine.wants_frames(),
            Self::Capture(engine) => engine.wants_frames(),
            Self::Unknown(_) => false,
        }
    }

    pub fn progress_text(&self) -> Option<String> {
        match self {
            Self::Fog(engine) => Some(engine.progress_text()),
            Self::Match(engine) => Some(engine.progress_text()),
            Self::Capture(engine) => Some(engine.progress_text()),
            Self::Unknown(_) => None,
        }
    }
}

pub struct Orchestrator {
    ctx: Context,
    content: ContentDescriptor,
    level: u32,
    active: ActiveLevel,
}

impl Orchestrator {
    /// Run the boot sequence for one page load.
    ///
    /// `content_json` is the body of `data.json`; `viewport` is the CSS pixel
    /// size of the window; `seed` drives every random choice of this load.
    pub fn boot(
        mut ctx: Context,
        content_json: &str,
        viewport: (u32, u32),
        seed: u64,
    ) -> Result<Self, BootError> {
        ctx.admin.apply(&ctx.store);

        let content = ContentDescriptor::from_json(content_json)?;
        ctx.tuning = content.tuning.clone();

        let mut level = ctx.store.read().current_level;
        if let Some(over) = ctx.admin.override_level {
            log::info!("Level override: {} -> {}", level, over);
            level = ctx.store.set_current_level(over).current_level;
        }

        ctx.logger.init();
        ctx.logger
            .emit(events::PAGE_VIEW, json!({ "level": format!("level{level}") }));

        let (width, height) = viewport;
        let active = match level {
            1 => ActiveLevel::Fog(FogRevealEngine::new(&content.level1, &ctx, width, height, seed)),
            2 => ActiveLevel::Match(MemoryMatchEngine::new(&content.level2, &ctx, seed)),
            3 => ActiveLevel::Capture(WordCaptureEngine::new(
                &content.level3,
                &ctx,
                width,
                height,
                seed,
            )),
            other => {
                log::warn!("No engine for level {}", other);
                ActiveLevel::Unknown(other)
            }
        };
        log::info!("Level {} started", level);

        Ok(Self {
            ctx,
            content,
            level,
            active,
        })
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn active(&self) -> &ActiveLevel {
        &self.active
    }

    /// The engine plus the services it needs, borrowed together
    pub fn parts_mut(&mut self) -> (&mut ActiveLevel, &Context) {
        (&mut self.active, &self.ctx)
    }

    /// Browser tab title for the running level
    pub fn document_title(&self) -> String {
        self.content.document_title(self.level)
    }

    /// Per-frame work. Returns timeline pair ids to scroll into view.
    pub fn frame(&mut self, now_ms: f64) -> Vec<String> {
        match &mut self.active {
            ActiveLevel::Fog(engine) => {
                engine.frame(now_ms);
                Vec::new()
            }
            ActiveLevel::Match(engine) => engine.advance(now_ms),
            ActiveLevel::Capture(engine) => {
                engine.frame(now_ms);
                Vec::new()
            }
            ActiveLevel::Unknown(_) => Vec::new(),
        }
    }

    pub fn wants_frames(&self) -> bool {
        self.active.wants_frames()
    }

    /// Viewport changed at `now_ms` (same clock as [`Self::frame`])
    pub fn resize(&mut self, width: u32, height: u32, now_ms: f64) {
        match &mut self.active {
            ActiveLevel::Fog(engine) => engine.resize(width, height, now_ms),
            ActiveLevel::Capture(engine) => engine.resize(width, height),
            ActiveLevel::Match(_) | ActiveLevel::Unknown(_) => {}
        }
    }

    /// The completion action was taken: log the transition and select the
    /// next level. Returns that level; the caller reloads the page.
    pub fn complete_level(&mut self) -> Option<u32> {
        if !self.active.completion_visible() {
            return None;
        }
        let next = self.level + 1;
        self.ctx.logger.emit(
            events::LEVEL_TRANSITION,
            json!({ "from": format!("level{}", self.level), "to": format!("level{next}") }),
        );
        self.ctx.store.set_current_level(next);
        log::info!("Advancing to level {}", next);
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::AdminOverrides;
    use crate::context::testing::context;
    use crate::state::{Level1Progress, PersistedState};

    const CONTENT: &str = r#"{
        "siteName": "Us",
        "level1": {"name": "Fog", "sparkles": [{"id": "s1", "label": "a"}]},
        "level2": {"name": "Cards", "pairs": [{"id": "p1", "date": "2020"}]},
        "level3": {"keywords": [{"id": "w1", "word": "love"}]}
    }"#;

    fn boot_with(admin: AdminOverrides) -> (Orchestrator, crate::analytics::MemoryTransport) {
        let (mut ctx, _, transport) = context(false);
        ctx.admin = admin;
        let orch = Orchestrator::boot(ctx, CONTENT, (800, 600), 1).unwrap();
        (orch, transport)
    }

    #[test]
    fn test_fresh_boot_starts_level_one() {
        let (orch, transport) = boot_with(AdminOverrides::default());
        assert_eq!(orch.level(), 1);
        assert!(matches!(orch.active(), ActiveLevel::Fog(_)));
        assert_eq!(orch.document_title(), "Us | Fog");

        let events = transport.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["event"], "page_view");
        assert_eq!(events[0]["data"]["level"], "level1");
    }

    #[test]
    fn test_level_override_is_persisted() {
        let (orch, _) = boot_with(AdminOverrides {
            override_level: Some(3),
            ..Default::default()
        });
        assert_eq!(orch.level(), 3);
        assert!(matches!(orch.active(), ActiveLevel::Capture(_)));
        assert_eq!(orch.context().store.read().current_level, 3);
        assert_eq!(orch.document_title(), "Us");
    }

    #[test]
    fn test_reset_runs_before_read() {
        let (mut ctx, _, _) = context(false);
        ctx.store.set_current_level(2);
        ctx.store.update::<Level1Progress>(|p| {
            p.found_sparkles.insert("s1".into());
        });
        ctx.admin = AdminOverrides {
            should_reset: true,
            ..Default::default()
        };
        let orch = Orchestrator::boot(ctx, CONTENT, (800, 600), 1).unwrap();
        assert_eq!(orch.level(), 1);
        if let ActiveLevel::Fog(engine) = orch.active() {
            assert_eq!(engine.found_count(), 0);
        } else {
            panic!("expected level 1");
        }
        let state = orch.context().store.read();
        assert_eq!(state.current_level, PersistedState::default().current_level);
    }

    #[test]
    fn test_complete_level_requires_completion() {
        let (mut orch, transport) = boot_with(AdminOverrides {
            is_admin: true,
            ..Default::default()
        });
        assert_eq!(orch.complete_level(), None);

        orch.frame(16.0);
        let (active, ctx) = orch.parts_mut();
        if let ActiveLevel::Fog(engine) = active {
            engine.click_sparkle("s1", ctx);
        }
        assert_eq!(orch.complete_level(), Some(2));
        assert_eq!(orch.context().store.read().current_level, 2);

        let transition = transport
            .events()
            .into_iter()
            .find(|e| e["event"] == "level_transition")
            .unwrap();
        assert_eq!(transition["data"]["from"], "level1");
        assert_eq!(transition["data"]["to"], "level2");
    }

    #[test]
    fn test_resize_uses_caller_clock() {
        let (mut orch, _) = boot_with(AdminOverrides {
            is_admin: true,
            ..Default::default()
        });
        orch.frame(16.0);
        let (active, ctx) = orch.parts_mut();
        if let ActiveLevel::Fog(engine) = active {
            engine.click_sparkle("s1", ctx);
        }
        assert!(!orch.wants_frames());

        orch.resize(400, 300, 5_000.0);
        orch.frame(5_016.0);
        let ActiveLevel::Fog(engine) = orch.active() else {
            panic!("expected level 1");
        };
        assert_eq!(engine.layer().width(), 800);

        orch.frame(5_200.0);
        let ActiveLevel::Fog(engine) = orch.active() else {
            panic!("expected level 1");
        };
        assert_eq!(engine.layer().width(), 400);
    }

    #[test]
    fn test_unknown_level() {
        let (orch, _) = boot_with(AdminOverrides {
            override_level: Some(7),
            ..Default::default()
        });
        assert!(matches!(orch.active(), ActiveLevel::Unknown(7)));
        assert!(!orch.wants_frames());
    }

    #[test]
    fn test_bad_content_is_boot_error() {
        let (ctx, _, _) = context(false);
        let result = Orchestrator::boot(ctx, "not json", (800, 600), 1);
        assert!(matches!(result, Err(BootError::Content(ContentError::Parse(_)))));
    }
}
