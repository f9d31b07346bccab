//! Device fingerprint for analytics tagging
//!
//! Browser and OS detection walk ordered rule tables and take the first
//! match. Order matters: Chromium derivatives (Edge) also carry `Chrome/` and
//! `Safari/`, Chrome carries `Safari/`, iOS carries `Mac OS X` and Android
//! carries `Linux`, so the more specific rule must come first.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Raw facts about the client, gathered once per load
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    pub user_agent: String,
    pub screen: (u32, u32),
    pub viewport: (u32, u32),
    pub color_depth: u32,
    pub lang: String,
    pub tz: String,
    pub referrer: String,
    /// Network effective type (`4g`, `3g`...), empty if unknown
    pub connection: String,
}

#[cfg(target_arch = "wasm32")]
impl Environment {
    /// Probe `navigator`, `screen`, `window` and `Intl`
    pub fn from_browser() -> Self {
        use wasm_bindgen::JsValue;

        let Some(window) = web_sys::window() else {
            return Self::default();
        };
        let navigator = window.navigator();

        fn dim(value: Result<JsValue, JsValue>) -> u32 {
            value
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0)
                .max(0.0) as u32
        }

        let (screen, color_depth) = match window.screen() {
            Ok(s) => (
                (
                    s.width().unwrap_or(0).max(0) as u32,
                    s.height().unwrap_or(0).max(0) as u32,
                ),
                s.color_depth().unwrap_or(0).max(0) as u32,
            ),
            Err(_) => ((0, 0), 0),
        };

        let options = js_sys::Intl::DateTimeFormat::new(&js_sys::Array::new(), &js_sys::Object::new())
            .resolved_options();
        let tz = js_sys::Reflect::get(&options, &JsValue::from_str("timeZone"))
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default();

        let connection = js_sys::Reflect::get(&navigator, &JsValue::from_str("connection"))
            .ok()
            .filter(|c| !c.is_undefined() && !c.is_null())
            .and_then(|c| js_sys::Reflect::get(&c, &JsValue::from_str("effectiveType")).ok())
            .and_then(|v| v.as_string())
            .unwrap_or_default();

        Self {
            user_agent: navigator.user_agent().unwrap_or_default(),
            screen,
            viewport: (dim(window.inner_width()), dim(window.inner_height())),
            color_depth,
            lang: navigator.language().unwrap_or_default(),
            tz,
            referrer: window.document().map(|d| d.referrer()).unwrap_or_default(),
            connection,
        }
    }
}

/// Coarse device class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Tablet,
    #[default]
    Desktop,
}

impl DeviceClass {
    pub fn classify(ua: &str) -> Self {
        if MOBILE.as_ref().is_some_and(|re| re.is_match(ua)) {
            DeviceClass::Mobile
        } else if TABLET.as_ref().is_some_and(|re| re.is_match(ua)) {
            DeviceClass::Tablet
        } else {
            DeviceClass::Desktop
        }
    }
}

/// Fingerprint attached to every analytics event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub ua: String,
    pub browser: String,
    pub os: String,
    pub device: DeviceClass,
    pub screen: String,
    pub viewport: String,
    pub color_depth: u32,
    pub lang: String,
    pub tz: String,
    pub referrer: String,
    pub connection: String,
}

impl DeviceInfo {
    pub fn from_environment(env: &Environment) -> Self {
        let ua = env.user_agent.as_str();
        Self {
            ua: ua.to_string(),
            browser: first_match(BROWSER_RULES, ua),
            os: first_match(OS_RULES, ua),
            device: DeviceClass::classify(ua),
            screen: format!("{}x{}", env.screen.0, env.screen.1),
            viewport: format!("{}x{}", env.viewport.0, env.viewport.1),
            color_depth: env.color_depth,
            lang: env.lang.clone(),
            tz: env.tz.clone(),
            referrer: env.referrer.clone(),
            connection: env.connection.clone(),
        }
    }
}

/// Substring test for a rule
enum Needles {
    All(&'static [&'static str]),
    Any(&'static [&'static str]),
}

impl Needles {
    fn matches(&self, ua: &str) -> bool {
        match self {
            Needles::All(needles) => needles.iter().all(|n| ua.contains(n)),
            Needles::Any(needles) => needles.iter().any(|n| ua.contains(n)),
        }
    }
}

/// `(predicate, label)` with an optional version pattern (first capture group)
struct Rule {
    label: &'static str,
    needles: Needles,
    version: Option<&'static str>,
}

const BROWSER_RULES: &[Rule] = &[
    Rule {
        label: "Firefox",
        needles: Needles::All(&["Firefox/"]),
        version: Some(r"Firefox/(\d+)"),
    },
    Rule {
        label: "Edge",
        needles: Needles::All(&["Edg/"]),
        version: Some(r"Edg/(\d+)"),
    },
    Rule {
        label: "Chrome",
        needles: Needles::All(&["Chrome/"]),
        version: Some(r"Chrome/(\d+)"),
    },
    Rule {
        label: "Safari",
        needles: Needles::All(&["Safari/", "Version/"]),
        version: Some(r"Version/(\d+)"),
    },
];

const OS_RULES: &[Rule] = &[
    Rule {
        label: "Windows",
        needles: Needles::All(&["Windows"]),
        version: None,
    },
    Rule {
        label: "iOS",
        needles: Needles::Any(&["iPhone", "iPad"]),
        version: Some(r"OS (\d+)"),
    },
    Rule {
        label: "macOS",
        needles: Needles::All(&["Mac OS X"]),
        version: Some(r"Mac OS X (\d+[._]\d+)"),
    },
    Rule {
        label: "Android",
        needles: Needles::All(&["Android"]),
        version: Some(r"Android (\d+)"),
    },
    Rule {
        label: "Linux",
        needles: Needles::All(&["Linux"]),
        version: None,
    },
];

fn first_match(rules: &[Rule], ua: &str) -> String {
    rules
        .iter()
        .find(|rule| rule.needles.matches(ua))
        .map(|rule| {
            match rule.version.and_then(|pattern| capture(pattern, ua)) {
                Some(version) => format!("{} {}", rule.label, version.replace('_', ".")),
                None => rule.label.to_string(),
            }
        })
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Version patterns of both tables, compiled on first use
static VERSION_PATTERNS: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    BROWSER_RULES
        .iter()
        .chain(OS_RULES)
        .filter_map(|rule| rule.version)
        .filter_map(|pattern| Regex::new(pattern).ok().map(|re| (pattern, re)))
        .collect()
});

static MOBILE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"Mobi|Android|iPhone").ok());
static TABLET: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"iPad|Tablet").ok());

fn capture(pattern: &str, ua: &str) -> Option<String> {
    let re = VERSION_PATTERNS.get(pattern)?;
    re.captures(ua)?.get(1).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const EDGE_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1";
    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
    const SAFARI_IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Safari/604.1";

    fn info(ua: &str) -> DeviceInfo {
        DeviceInfo::from_environment(&Environment {
            user_agent: ua.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_edge_before_chrome() {
        let d = info(EDGE_WIN);
        assert_eq!(d.browser, "Edge 120");
        assert_eq!(d.os, "Windows");
        assert_eq!(d.device, DeviceClass::Desktop);
    }

    #[test]
    fn test_chrome_before_safari() {
        let d = info(CHROME_MAC);
        assert_eq!(d.browser, "Chrome 120");
        assert_eq!(d.os, "macOS 10.15");
    }

    #[test]
    fn test_firefox_linux() {
        let d = info(FIREFOX_LINUX);
        assert_eq!(d.browser, "Firefox 121");
        assert_eq!(d.os, "Linux");
    }

    #[test]
    fn test_ios_before_macos() {
        let d = info(SAFARI_IPHONE);
        assert_eq!(d.browser, "Safari 17");
        assert_eq!(d.os, "iOS 17");
        assert_eq!(d.device, DeviceClass::Mobile);
    }

    #[test]
    fn test_android_before_linux() {
        let d = info(CHROME_ANDROID);
        assert_eq!(d.os, "Android 14");
        assert_eq!(d.device, DeviceClass::Mobile);
    }

    #[test]
    fn test_ipad_is_tablet() {
        let d = info(SAFARI_IPAD);
        assert_eq!(d.device, DeviceClass::Tablet);
        assert_eq!(d.os, "iOS 16");
    }

    #[test]
    fn test_unknown() {
        let d = info("curl/8.0");
        assert_eq!(d.browser, "Unknown");
        assert_eq!(d.os, "Unknown");
    }

    #[test]
    fn test_every_version_pattern_compiles() {
        let expected = BROWSER_RULES
            .iter()
            .chain(OS_RULES)
            .filter(|rule| rule.version.is_some())
            .count();
        assert_eq!(VERSION_PATTERNS.len(), expected);
        assert!(MOBILE.is_some());
        assert!(TABLET.is_some());
    }

    #[test]
    fn test_serialized_field_names() {
        let d = DeviceInfo::from_environment(&Environment {
            user_agent: FIREFOX_LINUX.into(),
            screen: (1920, 1080),
            viewport: (1280, 720),
            color_depth: 24,
            ..Default::default()
        });
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["screen"], "1920x1080");
        assert_eq!(v["viewport"], "1280x720");
        assert_eq!(v["colorDepth"], 24);
        assert_eq!(v["device"], "desktop");
    }
}
