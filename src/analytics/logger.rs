//! Fire-and-forget event logger
//!
//! Events are queued, then flushed immediately through a [`Transport`].
//! A failed send is dropped: no retry, no error surfaced to gameplay.

use std::cell::{OnceCell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use super::device::{DeviceInfo, Environment};
use super::session::Session;

/// Collector endpoint
pub const LOG_ENDPOINT: &str = "/api/log";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Headers for the `fetch` fallback; beacons carry the type on the blob
pub const REQUEST_HEADERS: [(&str, &str); 1] = [("Content-Type", JSON_CONTENT_TYPE)];

/// Why a send did not go out. Only ever logged at debug level.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no transport available")]
    Unavailable,
    #[error("send rejected: {0}")]
    Rejected(String),
}

/// Delivery of one JSON body. Must not block.
pub trait Transport {
    fn send(&self, endpoint: &str, body: &str) -> Result<(), TransportError>;
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn send(&self, _endpoint: &str, _body: &str) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Records bodies in memory. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    sent: Rc<RefCell<Vec<String>>>,
    failing: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that rejects every send
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Every delivered body, parsed
    pub fn events(&self) -> Vec<Value> {
        self.sent
            .borrow()
            .iter()
            .filter_map(|body| serde_json::from_str(body).ok())
            .collect()
    }

    /// Delivered event names in order
    pub fn names(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|e| e["event"].as_str().map(str::to_string))
            .collect()
    }

    /// How many times `name` was delivered
    pub fn count(&self, name: &str) -> usize {
        self.names().iter().filter(|n| *n == name).count()
    }
}

impl Transport for MemoryTransport {
    fn send(&self, _endpoint: &str, body: &str) -> Result<(), TransportError> {
        if self.failing {
            return Err(TransportError::Rejected("test transport".into()));
        }
        self.sent.borrow_mut().push(body.to_string());
        Ok(())
    }
}

/// `navigator.sendBeacon`, falling back to a keepalive `fetch`
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BeaconTransport;

#[cfg(target_arch = "wasm32")]
impl Transport for BeaconTransport {
    fn send(&self, endpoint: &str, body: &str) -> Result<(), TransportError> {
        use wasm_bindgen::JsValue;

        let window = web_sys::window().ok_or(TransportError::Unavailable)?;
        let navigator = window.navigator();

        let has_beacon = js_sys::Reflect::has(&navigator, &JsValue::from_str("sendBeacon"))
            .unwrap_or(false);
        if has_beacon {
            let options = web_sys::BlobPropertyBag::new();
            options.set_type(JSON_CONTENT_TYPE);
            let parts = js_sys::Array::of1(&JsValue::from_str(body));
            let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &options)
                .map_err(|e| TransportError::Rejected(format!("{e:?}")))?;
            return match navigator.send_beacon_with_opt_blob(endpoint, Some(&blob)) {
                Ok(true) => Ok(()),
                Ok(false) => Err(TransportError::Rejected("beacon not queued".into())),
                Err(e) => Err(TransportError::Rejected(format!("{e:?}"))),
            };
        }

        let headers = web_sys::Headers::new().map_err(|e| TransportError::Rejected(format!("{e:?}")))?;
        for (name, value) in REQUEST_HEADERS {
            headers
                .set(name, value)
                .map_err(|e| TransportError::Rejected(format!("{e:?}")))?;
        }
        let init = web_sys::RequestInit::new();
        init.set_method("POST");
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(body));
        init.set_keepalive(true);
        let promise = window.fetch_with_str_and_init(endpoint, &init);
        wasm_bindgen_futures::spawn_local(async move {
            // Delivery is best effort
            let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
        });
        Ok(())
    }
}

#[derive(Serialize)]
struct Payload<'a> {
    event: &'a str,
    session: &'a str,
    data: &'a Value,
    #[serde(flatten)]
    device: &'a DeviceInfo,
}

/// Structured event emitter shared by every level
pub struct EventLogger {
    transport: Box<dyn Transport>,
    session: Session,
    probe: Box<dyn Fn() -> Environment>,
    device: OnceCell<DeviceInfo>,
    queue: RefCell<VecDeque<String>>,
}

impl EventLogger {
    /// `probe` is called at most once, the first time device info is needed
    pub fn new(
        transport: Box<dyn Transport>,
        session: Session,
        probe: impl Fn() -> Environment + 'static,
    ) -> Self {
        Self {
            transport,
            session,
            probe: Box::new(probe),
            device: OnceCell::new(),
            queue: RefCell::new(VecDeque::new()),
        }
    }

    /// Generate the session id and fingerprint up front
    pub fn init(&self) {
        let session = self.session_id();
        let device = self.device_info();
        log::info!(
            "Analytics session {} ({}, {}, {:?})",
            session,
            device.browser,
            device.os,
            device.device
        );
    }

    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    pub fn device_info(&self) -> &DeviceInfo {
        self.device
            .get_or_init(|| DeviceInfo::from_environment(&(self.probe)()))
    }

    /// Emit `name` with a data record
    pub fn emit(&self, name: &str, data: Value) {
        let payload = Payload {
            event: name,
            session: self.session_id(),
            data: &data,
            device: self.device_info(),
        };
        match serde_json::to_string(&payload) {
            Ok(body) => {
                log::debug!("Event '{}' {}", name, data);
                self.queue.borrow_mut().push_back(body);
                self.flush();
            }
            Err(e) => log::debug!("Event '{}' not encoded: {}", name, e),
        }
    }

    /// Emit `name` with an empty data record
    pub fn event(&self, name: &str) {
        self.emit(name, json!({}));
    }

    fn flush(&self) {
        loop {
            let Some(body) = self.queue.borrow_mut().pop_front() else {
                break;
            };
            if let Err(e) = self.transport.send(LOG_ENDPOINT, &body) {
                log::debug!("Dropped analytics event: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;
    use std::cell::Cell;

    fn logger(transport: MemoryTransport) -> EventLogger {
        let session = Session::new(Rc::new(MemoryStorage::new()), 3);
        EventLogger::new(Box::new(transport), session, || Environment {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) Firefox/121.0".into(),
            lang: "en-US".into(),
            ..Default::default()
        })
    }

    #[test]
    fn test_payload_shape() {
        let transport = MemoryTransport::new();
        let logger = logger(transport.clone());
        logger.emit("level1_sparkle_found", json!({"sparkleId": "s1"}));

        let events = transport.events();
        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e["event"], "level1_sparkle_found");
        assert_eq!(e["session"], logger.session_id());
        assert_eq!(e["data"]["sparkleId"], "s1");
        assert_eq!(e["browser"], "Firefox 121");
        assert_eq!(e["lang"], "en-US");
    }

    #[test]
    fn test_failed_delivery_is_swallowed() {
        let transport = MemoryTransport::failing();
        let logger = logger(transport.clone());
        logger.event("reset");
        logger.event("reset");
        assert!(transport.events().is_empty());
        assert!(logger.queue.borrow().is_empty());
    }

    #[test]
    fn test_fetch_fallback_declares_json() {
        let content_type = REQUEST_HEADERS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| *value);
        assert_eq!(content_type, Some("application/json"));
    }

    #[test]
    fn test_device_probe_runs_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let session = Session::new(Rc::new(MemoryStorage::new()), 3);
        let logger = EventLogger::new(Box::new(NullTransport), session, move || {
            counter.set(counter.get() + 1);
            Environment::default()
        });
        logger.init();
        logger.event("a");
        logger.event("b");
        assert_eq!(calls.get(), 1);
    }
}
