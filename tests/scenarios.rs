//! Whole-journey scenarios driven through the public API, the way the
//! browser driver uses it.

use std::rc::Rc;

use scrapbook::analytics::events;
use scrapbook::analytics::{Environment, EventLogger, MemoryTransport, Session};
use scrapbook::level1::SparkleClick;
use scrapbook::level2::{Face, FlipOutcome};
use scrapbook::level3::{GiftStage, WordClick};
use scrapbook::platform::MemoryStorage;
use scrapbook::{ActiveLevel, AdminOverrides, Context, Orchestrator, PersistedState, StateStore, Tuning};

const CONTENT: &str = r#"{
    "siteName": "Our Story",
    "level1": {
        "name": "Hidden Moments",
        "subtitle": "Wipe away the fog",
        "ctaText": "Next",
        "sparkles": [
            {"id": "s1", "label": "first date"},
            {"id": "s2", "label": "the beach"}
        ]
    },
    "level2": {
        "name": "Memory Lane",
        "title": "Match the moments",
        "pairs": [
            {"id": "p1", "date": "Jan 2020", "caption": "Met", "emoji": "☕"},
            {"id": "p2", "date": "Jun 2021", "caption": "Moved in", "emoji": "🏠"},
            {"id": "p3", "date": "Dec 2022", "caption": "Engaged", "emoji": "💍"}
        ]
    },
    "level3": {
        "name": "Words",
        "title": "Catch the words",
        "keywords": [
            {"id": "w1", "word": "kind"},
            {"id": "w2", "word": "brave"}
        ]
    }
}"#;

/// One browser profile: storage survives across page loads
struct Profile {
    local: MemoryStorage,
    transport: MemoryTransport,
}

impl Profile {
    fn new() -> Self {
        Self {
            local: MemoryStorage::new(),
            transport: MemoryTransport::new(),
        }
    }

    fn load(&self, query: &str) -> Orchestrator {
        let store = StateStore::new(Rc::new(self.local.clone()));
        let session = Session::new(Rc::new(MemoryStorage::new()), 9);
        let logger = EventLogger::new(Box::new(self.transport.clone()), session, Environment::default);
        let ctx = Context::new(store, logger, AdminOverrides::from_query(query), Tuning::default());
        Orchestrator::boot(ctx, CONTENT, (1024, 768), 42).expect("content parses")
    }
}

#[test]
fn full_journey_through_three_levels() {
    let profile = Profile::new();

    // Level 1, admin mode: every sparkle is clickable without wiping
    let mut orch = profile.load("?admin=true");
    assert_eq!(orch.level(), 1);
    orch.frame(16.0);
    for id in ["s1", "s2"] {
        let (active, ctx) = orch.parts_mut();
        let ActiveLevel::Fog(engine) = active else {
            panic!("expected level 1");
        };
        assert!(matches!(engine.click_sparkle(id, ctx), SparkleClick::Found { .. }));
    }
    assert!(orch.active().completion_visible());
    assert_eq!(profile.transport.count(events::LEVEL1_COMPLETED), 1);
    assert_eq!(profile.transport.count(events::SPARKLE_FOUND), 2);
    assert_eq!(orch.complete_level(), Some(2));

    // Level 2: match every pair
    let mut orch = profile.load("");
    assert_eq!(orch.level(), 2);
    let mut now = 0.0;
    for pair in ["p1", "p2", "p3"] {
        let (active, ctx) = orch.parts_mut();
        let ActiveLevel::Match(engine) = active else {
            panic!("expected level 2");
        };
        let date = engine.cards(Face::Date).iter().position(|c| c.pair_id == pair).unwrap();
        let photo = engine.cards(Face::Photo).iter().position(|c| c.pair_id == pair).unwrap();
        assert_eq!(engine.flip(Face::Date, date, ctx), FlipOutcome::Pending);
        assert!(matches!(engine.flip(Face::Photo, photo, ctx), FlipOutcome::Matched { .. }));
        now += 1000.0;
        orch.frame(now);
    }
    assert!(orch.active().completion_visible());
    assert_eq!(profile.transport.count(events::PAIR_MATCHED), 3);
    assert_eq!(profile.transport.count(events::LEVEL2_COMPLETED), 1);
    assert_eq!(orch.complete_level(), Some(3));

    // Level 3: capture both words, then watch the gift open
    let mut orch = profile.load("");
    assert_eq!(orch.level(), 3);
    {
        let (active, ctx) = orch.parts_mut();
        let ActiveLevel::Capture(engine) = active else {
            panic!("expected level 3");
        };
        let threshold = engine.threshold();
        for id in ["w1", "w2"] {
            for _ in 1..threshold {
                assert!(matches!(engine.click(id, ctx), WordClick::Progress { .. }));
            }
            assert!(matches!(engine.click(id, ctx), WordClick::Captured { .. }));
        }
        assert!(engine.is_complete());
        assert!(!engine.restart(ctx));
    }
    orch.frame(1_000_000.0);
    let ActiveLevel::Capture(engine) = orch.active() else {
        panic!("expected level 3");
    };
    assert_eq!(engine.gift().stage(), GiftStage::Finished);
    assert!(engine.restart(orch.context()));

    assert_eq!(orch.context().store.read(), PersistedState::default());
    assert_eq!(profile.transport.count(events::WORD_CAPTURED), 2);
    assert_eq!(profile.transport.count(events::LEVEL3_COMPLETED), 1);
    assert_eq!(profile.transport.count(events::LEVEL_TRANSITION), 2);
    assert_eq!(profile.transport.count(events::PAGE_VIEW), 3);
    assert_eq!(profile.transport.count(events::RESET), 1);
}

#[test]
fn progress_survives_a_reload() {
    let profile = Profile::new();

    let mut orch = profile.load("?level=2");
    {
        let (active, ctx) = orch.parts_mut();
        let ActiveLevel::Match(engine) = active else {
            panic!("expected level 2");
        };
        let date = engine.cards(Face::Date).iter().position(|c| c.pair_id == "p2").unwrap();
        let photo = engine.cards(Face::Photo).iter().position(|c| c.pair_id == "p2").unwrap();
        engine.flip(Face::Date, date, ctx);
        engine.flip(Face::Photo, photo, ctx);
    }
    orch.frame(1000.0);
    assert_eq!(orch.active().progress_text().as_deref(), Some("1 of 3 pairs matched"));

    let orch = profile.load("");
    assert_eq!(orch.level(), 2);
    let ActiveLevel::Match(engine) = orch.active() else {
        panic!("expected level 2");
    };
    assert_eq!(engine.matched_count(), 1);
    assert!(engine.timeline().iter().any(|n| n.pair_id == "p2" && n.visible));
    assert!(!engine.completion_visible());
}

#[test]
fn reset_query_clears_progress() {
    let profile = Profile::new();
    let orch = profile.load("?level=3");
    assert_eq!(orch.level(), 3);

    let orch = profile.load("?reset=true");
    assert_eq!(orch.level(), 1);
    assert_eq!(orch.context().store.read().current_level, 1);
}

#[test]
fn every_event_carries_the_session() {
    let profile = Profile::new();
    let orch = profile.load("");
    let session = orch.context().logger.session_id().to_string();

    let events = profile.transport.events();
    assert!(!events.is_empty());
    for event in events {
        assert_eq!(event["session"], session.as_str());
    }
}
