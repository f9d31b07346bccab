//! Scrapbook entry point
//!
//! In the browser: boots the orchestrator, mounts the active level into the
//! page and drives it from `requestAnimationFrame`. Natively: boots a level
//! headless from a content file and logs what it would show.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::convert::FromWasmAbi;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::{Clamped, JsCast};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{
        CanvasRenderingContext2d, Document, Element, EventTarget, HtmlCanvasElement, HtmlElement,
        ImageData, MouseEvent, TouchEvent, Window,
    };

    use scrapbook::analytics::{BeaconTransport, Environment, EventLogger, Session};
    use scrapbook::level1::FogRevealEngine;
    use scrapbook::level2::{CardFront, CardState, Face, GO_TOP_THRESHOLD_PX, MemoryMatchEngine};
    use scrapbook::level3::heart::HEART_PATH;
    use scrapbook::markup::{self, TextSlot};
    use scrapbook::level3::{GiftStage, WordCaptureEngine};
    use scrapbook::platform::{BrowserStorage, StorageScope};
    use scrapbook::{ActiveLevel, AdminOverrides, ContentError, Context, Orchestrator, StateStore, Tuning};

    /// Fog tint; opacity comes from the tuning
    const FOG_RGB: [u8; 3] = [40, 20, 60];
    const SVG_NS: &str = "http://www.w3.org/2000/svg";

    /// Page state for one load
    struct Game {
        orch: Orchestrator,
        fog_ctx: Option<CanvasRenderingContext2d>,
        fog_canvas: Option<HtmlCanvasElement>,
        painted_revision: Option<u64>,
        gift_sparkles_shown: usize,
        frame_requested: bool,
    }

    impl Game {
        fn new(orch: Orchestrator) -> Self {
            Self {
                orch,
                fog_ctx: None,
                fog_canvas: None,
                painted_revision: None,
                gift_sparkles_shown: 0,
                frame_requested: false,
            }
        }

        /// Bring engine timers up to date before handling input
        fn sync(&mut self) {
            let scroll = self.orch.frame(now());
            scroll_timeline(&scroll);
        }

        /// Push engine state into the DOM
        fn render(&mut self) {
            let Some(document) = document() else {
                return;
            };
            let Self {
                orch,
                fog_ctx,
                fog_canvas,
                painted_revision,
                gift_sparkles_shown,
                ..
            } = self;
            match orch.active() {
                ActiveLevel::Fog(engine) => {
                    if let (Some(ctx), Some(canvas)) = (fog_ctx.as_ref(), fog_canvas.as_ref()) {
                        paint_fog(engine, ctx, canvas, painted_revision);
                    }
                    render_level1(engine, &document);
                }
                ActiveLevel::Match(engine) => render_level2(engine, &document),
                ActiveLevel::Capture(engine) => {
                    render_level3(engine, &document, gift_sparkles_shown)
                }
                ActiveLevel::Unknown(_) => {}
            }
        }
    }

    fn window() -> Option<Window> {
        web_sys::window()
    }

    fn document() -> Option<Document> {
        window()?.document()
    }

    fn now() -> f64 {
        window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or(0.0)
    }

    fn viewport() -> (u32, u32) {
        let Some(window) = window() else {
            return (0, 0);
        };
        let read = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as u32;
        (read(window.inner_width()), read(window.inner_height()))
    }

    fn reload() {
        if let Some(window) = window() {
            let _ = window.location().reload();
        }
    }

    fn listen<E>(target: &EventTarget, event: &str, handler: impl FnMut(E) + 'static)
    where
        E: FromWasmAbi + 'static,
    {
        let closure = Closure::<dyn FnMut(E)>::new(handler);
        let _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn create(document: &Document, tag: &str, class: &str) -> Option<Element> {
        let el = document.create_element(tag).ok()?;
        if !class.is_empty() {
            el.set_class_name(class);
        }
        Some(el)
    }

    fn create_svg(document: &Document, tag: &str) -> Option<Element> {
        document.create_element_ns(Some(SVG_NS), tag).ok()
    }

    fn set_style(el: &Element, property: &str, value: &str) {
        if let Some(el) = el.dyn_ref::<HtmlElement>() {
            let _ = el.style().set_property(property, value);
        }
    }

    fn set_class(el: &Element, class: &str, on: bool) {
        let _ = el.class_list().toggle_with_force(class, on);
    }

    fn set_hidden(el: &Element, hidden: bool) {
        if hidden {
            let _ = el.set_attribute("hidden", "");
        } else {
            let _ = el.remove_attribute("hidden");
        }
    }

    fn by_id(document: &Document, id: &str) -> Option<Element> {
        document.get_element_by_id(id)
    }

    /// Install a static skeleton, then fill its slots as plain text
    fn mount_markup(root: &Element, skeleton: &str, slots: &[TextSlot]) {
        root.set_inner_html(skeleton);
        for slot in slots {
            if let Some(el) = root.query_selector(slot.selector).ok().flatten() {
                el.set_text_content(Some(&slot.text));
            }
        }
    }

    /// Mount the running level's skeleton into its container
    fn mount_level_markup(container: &Element, active: &ActiveLevel) {
        if let Some((skeleton, slots)) = markup::level(active) {
            mount_markup(container, skeleton, &slots);
        }
    }

    /// The level's container, shown. Created if the page lacks it.
    fn level_container(document: &Document, level: u32) -> Option<Element> {
        let id = format!("level-{level}");
        let container = match by_id(document, &id) {
            Some(el) => el,
            None => {
                let el = create(document, "section", "level")?;
                el.set_id(&id);
                document.body()?.append_child(&el).ok()?;
                el
            }
        };
        set_hidden(&container, false);
        Some(container)
    }

    fn scroll_timeline(pair_ids: &[String]) {
        let Some(document) = document() else {
            return;
        };
        for id in pair_ids {
            let selector = format!(".timeline-node[data-pair-id=\"{id}\"]");
            if let Some(node) = document.query_selector(&selector).ok().flatten() {
                let options = web_sys::ScrollIntoViewOptions::new();
                options.set_behavior(web_sys::ScrollBehavior::Smooth);
                options.set_block(web_sys::ScrollLogicalPosition::Center);
                node.scroll_into_view_with_scroll_into_view_options(&options);
            }
        }
    }

    async fn fetch_content(window: &Window) -> Result<String, ContentError> {
        let fail = |e: JsValue| ContentError::Fetch(format!("{e:?}"));
        let response = JsFuture::from(window.fetch_with_str("data.json"))
            .await
            .map_err(fail)?;
        let response: web_sys::Response = response.dyn_into().map_err(fail)?;
        if !response.ok() {
            return Err(ContentError::Fetch(format!("HTTP {}", response.status())));
        }
        let text = JsFuture::from(response.text().map_err(fail)?)
            .await
            .map_err(fail)?;
        text.as_string()
            .ok_or_else(|| ContentError::Fetch("response body is not text".into()))
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Scrapbook starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");
        let seed = js_sys::Date::now() as u64;

        let store = StateStore::new(Rc::new(BrowserStorage::new(StorageScope::Local)));
        let session = Session::new(Rc::new(BrowserStorage::new(StorageScope::Session)), seed);
        let logger = EventLogger::new(Box::new(BeaconTransport), session, Environment::from_browser);
        let admin = AdminOverrides::from_location();
        let ctx = Context::new(store, logger, admin, Tuning::default());

        let booted = match fetch_content(&window).await {
            Ok(json) => Orchestrator::boot(ctx, &json, viewport(), seed).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        let orch = match booted {
            Ok(orch) => orch,
            Err(e) => {
                log::error!("Boot failed: {}", e);
                if let Some(loading) = by_id(&document, "loading") {
                    loading.set_text_content(Some("Something went wrong loading this page."));
                }
                return;
            }
        };

        if let Some(loading) = by_id(&document, "loading") {
            let _ = loading.set_attribute("class", "hidden");
        }
        document.set_title(&orch.document_title());

        let level = orch.level();
        let game = Rc::new(RefCell::new(Game::new(orch)));
        match level {
            1 => mount_level1(&document, &game),
            2 => mount_level2(&document, &game),
            3 => mount_level3(&document, &game),
            _ => {}
        }
        setup_cta(&document, level, &game);
        setup_resize(&game);

        game.borrow_mut().render();
        request_frame(game);

        log::info!("Scrapbook running level {}", level);
    }

    fn setup_cta(document: &Document, level: u32, game: &Rc<RefCell<Game>>) {
        let Some(btn) = by_id(document, &format!("level{level}-cta")) else {
            return;
        };
        let game = game.clone();
        listen(&btn, "click", move |_event: MouseEvent| {
            if game.borrow_mut().orch.complete_level().is_some() {
                reload();
            }
        });
    }

    fn setup_resize(game: &Rc<RefCell<Game>>) {
        let Some(window) = window() else {
            return;
        };
        let game = game.clone();
        listen(&window, "resize", move |_event: web_sys::Event| {
            let (w, h) = viewport();
            {
                let mut g = game.borrow_mut();
                g.sync();
                g.orch.resize(w, h, now());
            }
            request_frame(game.clone());
        });
    }

    // === Level 1 ===

    fn mount_level1(document: &Document, game: &Rc<RefCell<Game>>) {
        let Some(container) = level_container(document, 1) else {
            return;
        };
        let mut g = game.borrow_mut();
        let ActiveLevel::Fog(engine) = g.orch.active() else {
            return;
        };

        mount_level_markup(&container, g.orch.active());

        let Some(overlay) = by_id(document, "sparkle-overlay") else {
            return;
        };
        let admin = g.orch.context().is_admin();
        for target in engine.targets() {
            let Some(hitbox) = create(document, "div", "sparkle-hitbox") else {
                continue;
            };
            let _ = hitbox.set_attribute("data-id", &target.id);
            if let Some(url) = target.photo.url() {
                if let Some(img) = create(document, "img", "sparkle-photo") {
                    let _ = img.set_attribute("src", url);
                    let _ = img.set_attribute("alt", &target.label);
                    let _ = img.set_attribute("draggable", "false");
                    let _ = hitbox.append_child(&img);
                }
            }
            if let Some(label) = create(document, "span", "sparkle-label") {
                label.set_text_content(Some(&target.label));
                let _ = hitbox.append_child(&label);
            }
            if admin {
                set_style(&hitbox, "outline", "2px solid red");
                set_style(&hitbox, "background", "rgba(255,0,0,0.3)");
            }

            let id = target.id.clone();
            let on_click = game.clone();
            listen(&hitbox, "click", move |event: MouseEvent| {
                event.stop_propagation();
                click_sparkle(&on_click, &id);
            });
            let id = target.id.clone();
            let on_tap = game.clone();
            listen(&hitbox, "touchend", move |event: TouchEvent| {
                event.prevent_default();
                event.stop_propagation();
                click_sparkle(&on_tap, &id);
            });
            let _ = overlay.append_child(&hitbox);
        }

        let canvas: Option<HtmlCanvasElement> =
            by_id(document, "fog-canvas").and_then(|c| c.dyn_into().ok());
        if let Some(canvas) = canvas {
            g.fog_ctx = canvas
                .get_context("2d")
                .ok()
                .flatten()
                .and_then(|c| c.dyn_into().ok());
            g.fog_canvas = Some(canvas);
        }
        drop(g);

        setup_wipe(&overlay, game);
    }

    fn click_sparkle(game: &Rc<RefCell<Game>>, id: &str) {
        {
            let mut g = game.borrow_mut();
            g.sync();
            let (active, ctx) = g.orch.parts_mut();
            if let ActiveLevel::Fog(engine) = active {
                let outcome = engine.click_sparkle(id, ctx);
                log::debug!("Sparkle click '{}': {:?}", id, outcome);
                spawn_bursts(engine);
            }
        }
        game.borrow_mut().render();
        request_frame(game.clone());
    }

    fn spawn_bursts(engine: &mut FogRevealEngine) {
        let Some(document) = document() else {
            return;
        };
        let Some(body) = document.body() else {
            return;
        };
        for burst in engine.drain_bursts() {
            for particle in burst.particles {
                let Some(heart) = create(&document, "div", "heart") else {
                    continue;
                };
                heart.set_text_content(Some(particle.glyph));
                set_style(&heart, "left", &format!("{}px", burst.origin.x));
                set_style(&heart, "top", &format!("{}px", burst.origin.y));
                set_style(&heart, "--drift-x", &format!("{}px", particle.drift_x));
                set_style(&heart, "animation-delay", &format!("{}s", particle.delay_ms / 1000.0));
                let done = heart.clone();
                listen(&heart, "animationend", move |_event: web_sys::Event| done.remove());
                let _ = body.append_child(&heart);
            }
        }
    }

    /// Pointer position relative to the overlay
    fn local_point(overlay: &Element, client_x: i32, client_y: i32) -> Vec2 {
        let rect = overlay.get_bounding_client_rect();
        Vec2::new(
            client_x as f32 - rect.left() as f32,
            client_y as f32 - rect.top() as f32,
        )
    }

    fn with_fog(game: &Rc<RefCell<Game>>, f: impl FnOnce(&mut FogRevealEngine)) {
        let mut g = game.borrow_mut();
        let (active, _) = g.orch.parts_mut();
        if let ActiveLevel::Fog(engine) = active {
            f(engine);
        }
        g.render();
    }

    fn setup_wipe(overlay: &Element, game: &Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            let target = overlay.clone();
            listen(overlay, "mousedown", move |event: MouseEvent| {
                let at = local_point(&target, event.client_x(), event.client_y());
                with_fog(&game, |engine| {
                    engine.pointer_down(at);
                });
            });
        }
        {
            let game = game.clone();
            let target = overlay.clone();
            listen(overlay, "mousemove", move |event: MouseEvent| {
                let at = local_point(&target, event.client_x(), event.client_y());
                with_fog(&game, |engine| engine.pointer_move(at));
            });
        }
        for name in ["mouseup", "mouseleave"] {
            let game = game.clone();
            listen(overlay, name, move |_event: MouseEvent| {
                with_fog(&game, |engine| engine.pointer_up());
            });
        }
        {
            let game = game.clone();
            let target = overlay.clone();
            listen(overlay, "touchstart", move |event: TouchEvent| {
                let Some(touch) = event.touches().get(0) else {
                    return;
                };
                let at = local_point(&target, touch.client_x(), touch.client_y());
                with_fog(&game, |engine| {
                    if engine.target_at(at).is_none() {
                        event.prevent_default();
                        engine.pointer_down(at);
                    }
                });
            });
        }
        {
            let game = game.clone();
            let target = overlay.clone();
            listen(overlay, "touchmove", move |event: TouchEvent| {
                event.prevent_default();
                let Some(touch) = event.touches().get(0) else {
                    return;
                };
                let at = local_point(&target, touch.client_x(), touch.client_y());
                with_fog(&game, |engine| engine.pointer_move(at));
            });
        }
        {
            let game = game.clone();
            listen(overlay, "touchend", move |_event: TouchEvent| {
                with_fog(&game, |engine| engine.pointer_up());
            });
        }
    }

    fn paint_fog(
        engine: &FogRevealEngine,
        ctx: &CanvasRenderingContext2d,
        canvas: &HtmlCanvasElement,
        painted: &mut Option<u64>,
    ) {
        let layer = engine.layer();
        if *painted == Some(layer.revision()) {
            return;
        }
        if canvas.width() != layer.width() || canvas.height() != layer.height() {
            canvas.set_width(layer.width());
            canvas.set_height(layer.height());
        }
        let pixels = layer.to_rgba(FOG_RGB);
        match ImageData::new_with_u8_clamped_array_and_sh(Clamped(&pixels[..]), layer.width(), layer.height()) {
            Ok(image) => {
                let _ = ctx.put_image_data(&image, 0.0, 0.0);
                *painted = Some(layer.revision());
            }
            Err(e) => log::warn!("Fog paint failed: {:?}", e),
        }
    }

    fn render_level1(engine: &FogRevealEngine, document: &Document) {
        let complete = engine.is_complete();
        for target in engine.targets() {
            let selector = format!(".sparkle-hitbox[data-id=\"{}\"]", target.id);
            let Some(hitbox) = document.query_selector(&selector).ok().flatten() else {
                continue;
            };
            set_style(&hitbox, "left", &format!("{}px", target.screen.x));
            set_style(&hitbox, "top", &format!("{}px", target.screen.y));
            set_class(&hitbox, "revealed", target.revealed);
            set_class(&hitbox, "sparkle-found", target.found);
        }
        if let Some(progress) = by_id(document, "level1-progress") {
            progress.set_text_content(Some(&engine.progress_text()));
            if complete {
                set_style(&progress, "opacity", "0");
            }
        }
        if let Some(subtitle) = document.query_selector("#level-1 .subtitle").ok().flatten() {
            set_class(&subtitle, "fade-out", complete);
        }
        if let Some(cta) = by_id(document, "level1-cta") {
            set_hidden(&cta, !engine.completion_visible());
            set_class(&cta, "fade-in", engine.completion_visible());
        }
    }

    // === Level 2 ===

    fn mount_level2(document: &Document, game: &Rc<RefCell<Game>>) {
        let Some(container) = level_container(document, 2) else {
            return;
        };
        let g = game.borrow();
        let ActiveLevel::Match(engine) = g.orch.active() else {
            return;
        };

        mount_level_markup(&container, g.orch.active());

        for (face, grid_id) in [(Face::Date, "date-grid"), (Face::Photo, "photo-grid")] {
            let Some(grid) = by_id(document, grid_id) else {
                continue;
            };
            for (index, card) in engine.cards(face).iter().enumerate() {
                let Some(el) = build_card(document, card) else {
                    continue;
                };
                let game = game.clone();
                listen(&el, "click", move |_event: MouseEvent| {
                    {
                        let mut g = game.borrow_mut();
                        g.sync();
                        let (active, ctx) = g.orch.parts_mut();
                        if let ActiveLevel::Match(engine) = active {
                            let outcome = engine.flip(face, index, ctx);
                            log::debug!("Flip {:?}#{}: {:?}", face, index, outcome);
                        }
                        g.render();
                    }
                    request_frame(game.clone());
                });
                let _ = grid.append_child(&el);
            }
        }

        if let Some(timeline) = by_id(document, "level2-timeline") {
            for node in engine.timeline() {
                let Some(el) = create(document, "div", if node.right { "timeline-node right" } else { "timeline-node" })
                else {
                    continue;
                };
                let _ = el.set_attribute("data-pair-id", &node.pair_id);
                mount_markup(&el, markup::TIMELINE_NODE, &markup::timeline_node(node));
                let media = match node.photo.url() {
                    Some(url) => create(document, "img", "timeline-node-photo").inspect(|img| {
                        let _ = img.set_attribute("src", url);
                        let _ = img.set_attribute("alt", &node.caption);
                        let _ = img.set_attribute("draggable", "false");
                    }),
                    None => create(document, "span", "timeline-node-emoji").inspect(|span| {
                        span.set_text_content(Some(&node.emoji));
                    }),
                };
                let card = el.query_selector(".timeline-node-card").ok().flatten();
                let caption = el.query_selector(".timeline-node-caption").ok().flatten();
                if let (Some(media), Some(card)) = (media, card) {
                    let before: Option<&web_sys::Node> = caption.as_ref().map(|c| {
                        let node: &web_sys::Node = c;
                        node
                    });
                    let _ = card.insert_before(&media, before);
                }
                let _ = timeline.append_child(&el);
            }
        }

        if let Some(go_top) = by_id(document, "go-top-btn") {
            let scroller = container.clone();
            listen(&go_top, "click", move |_event: MouseEvent| {
                let options = web_sys::ScrollToOptions::new();
                options.set_top(0.0);
                options.set_behavior(web_sys::ScrollBehavior::Smooth);
                scroller.scroll_to_with_scroll_to_options(&options);
            });
            let scroller = container.clone();
            listen(&container, "scroll", move |_event: web_sys::Event| {
                set_class(&go_top, "visible", scroller.scroll_top() as f64 > GO_TOP_THRESHOLD_PX);
            });
        }
    }

    fn build_card(document: &Document, card: &scrapbook::level2::Card) -> Option<Element> {
        let el = create(document, "div", "card")?;
        let _ = el.set_attribute("data-pair-id", &card.pair_id);
        let inner = create(document, "div", "card-inner")?;
        let back = create(document, "div", "card-back")?;
        back.set_text_content(Some(&card.back_label));

        let front = match &card.front {
            CardFront::Date(date) => {
                let front = create(document, "div", "card-front date-face")?;
                front.set_text_content(Some(date));
                front
            }
            CardFront::Memory {
                photo,
                emoji,
                caption,
            } => {
                let front = create(document, "div", "card-front photo-face")?;
                if let Some(url) = photo.url() {
                    let img = create(document, "img", "card-photo")?;
                    let _ = img.set_attribute("src", url);
                    let _ = img.set_attribute("alt", caption);
                    let _ = img.set_attribute("draggable", "false");
                    let _ = front.append_child(&img);
                }
                let glyph = create(document, "span", "card-emoji")?;
                glyph.set_text_content(Some(emoji));
                let _ = front.append_child(&glyph);
                front
            }
        };
        let _ = inner.append_child(&back);
        let _ = inner.append_child(&front);
        let _ = el.append_child(&inner);
        Some(el)
    }

    fn render_level2(engine: &MemoryMatchEngine, document: &Document) {
        for (face, grid_id) in [(Face::Date, "date-grid"), (Face::Photo, "photo-grid")] {
            let Some(grid) = by_id(document, grid_id) else {
                continue;
            };
            let children = grid.children();
            for (index, card) in engine.cards(face).iter().enumerate() {
                let Some(el) = children.item(index as u32) else {
                    continue;
                };
                set_class(&el, "flipped", card.state.is_face_up());
                set_class(&el, "matched", card.state == CardState::Matched);
                set_class(&el, "mismatch", card.state == CardState::Mismatched);
            }
        }
        for node in engine.timeline() {
            let selector = format!(".timeline-node[data-pair-id=\"{}\"]", node.pair_id);
            if let Some(el) = document.query_selector(&selector).ok().flatten() {
                set_class(&el, "visible", node.visible);
            }
        }
        if let Some(progress) = by_id(document, "level2-progress") {
            progress.set_text_content(Some(&engine.progress_text()));
        }
        if let Some(area) = document.query_selector("#level-2 .game-area").ok().flatten() {
            set_style(&area, "display", if engine.grid_visible() { "" } else { "none" });
        }
        if let Some(cta) = by_id(document, "level2-cta") {
            set_hidden(&cta, !engine.completion_visible());
        }
    }

    // === Level 3 ===

    fn mount_level3(document: &Document, game: &Rc<RefCell<Game>>) {
        let Some(container) = level_container(document, 3) else {
            return;
        };
        {
            let g = game.borrow();
            let ActiveLevel::Capture(engine) = g.orch.active() else {
                return;
            };
            if g.orch.context().is_admin() {
                set_class(&container, "admin-mode", true);
            }

            mount_level_markup(&container, g.orch.active());

            for word in engine.words() {
                let Some(el) = create(document, "div", "floating-word") else {
                    continue;
                };
                let _ = el.set_attribute("data-id", &word.id);
                mount_markup(&el, markup::FLOATING_WORD, &markup::floating_word(engine, word));
                let id = word.id.clone();
                let on_click = game.clone();
                listen(&el, "click", move |_event: MouseEvent| {
                    {
                        let mut g = on_click.borrow_mut();
                        g.sync();
                        let (active, ctx) = g.orch.parts_mut();
                        if let ActiveLevel::Capture(engine) = active {
                            let outcome = engine.click(&id, ctx);
                            log::debug!("Word click '{}': {:?}", id, outcome);
                        }
                        g.render();
                    }
                    request_frame(on_click.clone());
                });
                let _ = container.append_child(&el);
            }

            mount_heart(document, &container, engine);
        }

        // Measure rendered words so the heart packing uses real sizes
        {
            let mut g = game.borrow_mut();
            let (active, _) = g.orch.parts_mut();
            if let ActiveLevel::Capture(engine) = active {
                let sizes: Vec<(String, Vec2)> = engine
                    .words()
                    .iter()
                    .filter_map(|w| {
                        let selector = format!(".floating-word[data-id=\"{}\"]", w.id);
                        let el = document.query_selector(&selector).ok().flatten()?;
                        let el = el.dyn_into::<HtmlElement>().ok()?;
                        Some((w.id.clone(), Vec2::new(el.offset_width() as f32, el.offset_height() as f32)))
                    })
                    .collect();
                for (id, size) in sizes {
                    if size.x > 0.0 && size.y > 0.0 {
                        engine.set_word_size(&id, size);
                    }
                }
            }
        }

        if let Some(restart) = by_id(document, "level3-restart") {
            let game = game.clone();
            listen(&restart, "click", move |_event: MouseEvent| {
                let restarted = {
                    let g = game.borrow();
                    match g.orch.active() {
                        ActiveLevel::Capture(engine) => engine.restart(g.orch.context()),
                        _ => false,
                    }
                };
                if restarted {
                    reload();
                }
            });
        }
    }

    fn mount_heart(document: &Document, container: &Element, engine: &WordCaptureEngine) {
        let Some(svg) = create_svg(document, "svg") else {
            return;
        };
        let _ = svg.set_attribute("class", "heart-outline-svg");
        let _ = svg.set_attribute("viewBox", "0 0 100 100");
        let _ = svg.set_attribute("preserveAspectRatio", "none");

        let heart = engine.heart();
        for (i, segment) in heart.segments().iter().enumerate() {
            let Some(path) = create_svg(document, "path") else {
                continue;
            };
            let _ = path.set_attribute("d", HEART_PATH);
            let _ = path.set_attribute("class", "heart-segment");
            let _ = path.set_attribute("data-index", &i.to_string());
            let _ = path.set_attribute("fill", "none");
            let _ = path.set_attribute("stroke-width", "1.2");
            let _ = path.set_attribute("stroke-dasharray", &segment.dash_array(heart.total_length()));
            let _ = path.set_attribute("stroke-dashoffset", &segment.dash_offset());
            let _ = svg.append_child(&path);
        }
        let _ = container.append_child(&svg);
    }

    fn render_level3(engine: &WordCaptureEngine, document: &Document, sparkles_shown: &mut usize) {
        let complete = engine.is_complete();
        let stage = engine.gift().stage();
        let fading = stage >= GiftStage::Fading;

        for word in engine.words() {
            let selector = format!(".floating-word[data-id=\"{}\"]", word.id);
            let Some(el) = document.query_selector(&selector).ok().flatten() else {
                continue;
            };
            set_style(&el, "left", &format!("{}px", word.drift.position.x));
            set_style(&el, "top", &format!("{}px", word.drift.position.y));
            set_class(&el, "captured", word.is_captured());
            set_class(&el, "clicked", word.was_clicked());
            set_class(&el, "locked", complete);
            set_class(&el, "glowing", complete);
            if fading {
                set_style(&el, "transition", "opacity 1s ease");
                set_style(&el, "opacity", "0");
            }
            if let Some(text) = el.query_selector(".word-text").ok().flatten() {
                set_style(&text, "filter", &format!("blur({}px)", engine.blur(word)));
            }
            if let Some(badge) = el.query_selector(".click-badge").ok().flatten() {
                badge.set_text_content(Some(&engine.badge(word)));
            }
        }

        if let Some(svg) = document.query_selector(".heart-outline-svg").ok().flatten() {
            set_class(&svg, "complete", engine.heart().is_complete());
            // SVG elements have no HtmlElement style handle
            set_class(&svg, "fade-out", fading);
            for (i, segment) in engine.heart().segments().iter().enumerate() {
                let selector = format!(".heart-segment[data-index=\"{i}\"]");
                if let Some(path) = svg.query_selector(&selector).ok().flatten() {
                    set_class(&path, "revealed", segment.revealed);
                }
            }
        }

        if let Some(progress) = document.query_selector(".level3-progress").ok().flatten() {
            progress.set_text_content(Some(&engine.progress_text()));
            if fading {
                set_style(&progress, "opacity", "0");
            }
        }
        if fading {
            if let Some(subtitle) = document.query_selector(".level3-subtitle").ok().flatten() {
                set_style(&subtitle, "opacity", "0");
            }
        }

        if let Some(gift) = document.query_selector(".gift-box-container").ok().flatten() {
            set_class(&gift, "visible", stage >= GiftStage::BoxVisible);
            set_class(&gift, "open", stage >= GiftStage::BoxOpen);
            if let Some(boxed) = gift.query_selector(".gift-box").ok().flatten() {
                for sparkle in engine.gift().sparkles().iter().skip(*sparkles_shown) {
                    if let Some(el) = create(document, "span", "gift-sparkle") {
                        el.set_text_content(Some(sparkle.glyph));
                        set_style(&el, "left", &format!("{}px", sparkle.left));
                        set_style(&el, "top", &format!("{}px", sparkle.top));
                        let _ = boxed.append_child(&el);
                    }
                }
                *sparkles_shown = engine.gift().sparkles().len();
            }
        }
        let finished = engine.gift().restart_visible();
        if let Some(msg) = document.query_selector(".gift-message").ok().flatten() {
            set_class(&msg, "visible", finished);
        }
        if let Some(btn) = by_id(document, "level3-restart") {
            set_class(&btn, "visible", finished);
        }
    }

    // === Frame loop ===

    fn request_frame(game: Rc<RefCell<Game>>) {
        {
            let mut g = game.borrow_mut();
            if g.frame_requested {
                return;
            }
            g.frame_requested = true;
        }
        let Some(window) = window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let keep_going = {
            let mut g = game.borrow_mut();
            g.frame_requested = false;
            let scroll = g.orch.frame(time);
            g.render();
            scroll_timeline(&scroll);
            g.orch.wants_frames()
        };

        // Stop asking for frames once every task has stopped and no timer is pending
        if keep_going {
            request_frame(game);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use std::rc::Rc;

    use scrapbook::analytics::{Environment, EventLogger, NullTransport, Session};
    use scrapbook::platform::MemoryStorage;
    use scrapbook::{ActiveLevel, AdminOverrides, Context, Orchestrator, StateStore, Tuning};

    env_logger::init();
    log::info!("Scrapbook (native) starting...");

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "data.json".to_string());
    let query = args.next().unwrap_or_default();

    let json = match std::fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) => {
            log::error!("Cannot read {}: {}", path, e);
            return std::process::ExitCode::FAILURE;
        }
    };

    let store = StateStore::new(Rc::new(MemoryStorage::new()));
    let session = Session::new(Rc::new(MemoryStorage::new()), 0);
    let logger = EventLogger::new(Box::new(NullTransport), session, Environment::default);
    let ctx = Context::new(store, logger, AdminOverrides::from_query(&query), Tuning::default());

    let orch = match Orchestrator::boot(ctx, &json, (1280, 800), 0) {
        Ok(orch) => orch,
        Err(e) => {
            log::error!("Boot failed: {}", e);
            return std::process::ExitCode::FAILURE;
        }
    };

    println!("{}", orch.document_title());
    match orch.active() {
        ActiveLevel::Fog(engine) => {
            for target in engine.targets() {
                println!(
                    "  sparkle {:<8} at ({:.2}, {:.2})",
                    target.id, target.fraction.x, target.fraction.y
                );
            }
        }
        ActiveLevel::Match(engine) => {
            for node in engine.timeline() {
                println!("  {} {} {}", node.date, node.emoji, node.caption);
            }
        }
        ActiveLevel::Capture(engine) => {
            for word in engine.words() {
                println!("  {} ({})", word.word, engine.badge(word));
            }
        }
        ActiveLevel::Unknown(level) => println!("  no engine for level {level}"),
    }
    if let Some(progress) = orch.active().progress_text() {
        println!("{progress}");
    }
    std::process::ExitCode::SUCCESS
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
