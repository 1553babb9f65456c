use serde_json::Value;
use tracing::debug;

use crate::scrape::snapshot::{
    Heading, Logo, LogoKind, NavItem, PageSnapshot, MAX_HEADINGS, MAX_NAV_ITEMS,
};

pub const DEFAULT_BACKGROUND: &str = "#ffffff";
pub const DEFAULT_TEXT_COLOR: &str = "#333333";
pub const DEFAULT_FONT: &str = "system-ui, sans-serif";
pub const DEFAULT_TITLE: &str = "Website";

/// Coerce a possibly partial or malformed snapshot-like structure into a
/// well-typed [`PageSnapshot`], substituting documented defaults for every
/// missing or wrong-typed field.
///
/// This is the boundary guard for degraded extraction results: whatever the
/// browser step produced (or failed to produce), the prompt-construction
/// step downstream always receives a complete structure. Images and the
/// screenshot are attached separately by the extractor.
pub fn normalize(url: &str, facts: &Value) -> PageSnapshot {
    let title = string_or(facts.get("title"), DEFAULT_TITLE);

    let navigation = parse_navigation(facts.get("navigation"));
    let headings = parse_headings(facts.get("headings"));
    let logo = parse_logo(facts.get("logo"), &title);

    debug!(
        nav = navigation.len(),
        headings = headings.len(),
        "Normalized page facts"
    );

    PageSnapshot {
        url: string_or(facts.get("url"), url),
        title,
        background_color: string_or(facts.get("backgroundColor"), DEFAULT_BACKGROUND),
        text_color: string_or(facts.get("textColor"), DEFAULT_TEXT_COLOR),
        font_family: string_or(facts.get("fontFamily"), DEFAULT_FONT),
        is_dark: facts
            .get("isDark")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        logo: Some(logo),
        navigation,
        headings,
        images: Vec::new(),
        total_images_found: 0,
        body_text: string_or(facts.get("bodyText"), ""),
        html_preview: string_or(facts.get("htmlPreview"), ""),
        has_search: facts
            .get("hasSearch")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        has_video: facts
            .get("hasVideo")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        screenshot_png: None,
    }
}

fn string_or(value: Option<&Value>, default: &str) -> String {
    match value.and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => default.to_string(),
    }
}

fn parse_navigation(value: Option<&Value>) -> Vec<NavItem> {
    let mut items = Vec::new();
    if let Some(entries) = value.and_then(Value::as_array) {
        for entry in entries {
            let item = match entry {
                // {"text": "...", "href": "..."}
                Value::Object(map) => {
                    let text = map.get("text").and_then(Value::as_str).unwrap_or("");
                    if text.trim().is_empty() {
                        continue;
                    }
                    NavItem {
                        text: text.to_string(),
                        href: map
                            .get("href")
                            .and_then(Value::as_str)
                            .unwrap_or("#")
                            .to_string(),
                    }
                }
                // bare string entries from degraded fallbacks
                Value::String(text) if !text.trim().is_empty() => NavItem {
                    text: text.clone(),
                    href: "#".to_string(),
                },
                _ => continue,
            };
            items.push(item);
            if items.len() >= MAX_NAV_ITEMS {
                break;
            }
        }
    }

    if items.is_empty() {
        items = vec![
            NavItem {
                text: "Home".to_string(),
                href: "#".to_string(),
            },
            NavItem {
                text: "About".to_string(),
                href: "#".to_string(),
            },
        ];
    }
    items
}

fn parse_headings(value: Option<&Value>) -> Vec<Heading> {
    let mut headings = Vec::new();
    if let Some(entries) = value.and_then(Value::as_array) {
        for entry in entries {
            let heading = match entry {
                Value::Object(map) => {
                    let text = map.get("text").and_then(Value::as_str).unwrap_or("");
                    if text.trim().is_empty() {
                        continue;
                    }
                    Heading {
                        text: text.to_string(),
                        level: parse_level(map.get("level")),
                    }
                }
                Value::String(text) if !text.trim().is_empty() => Heading {
                    text: text.clone(),
                    level: 1,
                },
                _ => continue,
            };
            headings.push(heading);
            if headings.len() >= MAX_HEADINGS {
                break;
            }
        }
    }

    if headings.is_empty() {
        headings = vec![Heading {
            text: "Welcome".to_string(),
            level: 1,
        }];
    }
    headings
}

/// Accepts numeric levels (1-6) and tag-name strings ("h2").
fn parse_level(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .filter(|level| (1..=6).contains(level))
            .unwrap_or(1) as u8,
        Some(Value::String(s)) => s
            .trim_start_matches(['h', 'H'])
            .parse::<u8>()
            .ok()
            .filter(|level| (1..=6).contains(level))
            .unwrap_or(1),
        _ => 1,
    }
}

fn parse_logo(value: Option<&Value>, title: &str) -> Logo {
    if let Some(map) = value.and_then(Value::as_object) {
        let kind = map.get("kind").and_then(Value::as_str).unwrap_or("");
        let logo_value = map.get("value").and_then(Value::as_str).unwrap_or("");
        if !logo_value.trim().is_empty() {
            match kind {
                "image" => {
                    return Logo {
                        kind: LogoKind::Image,
                        value: logo_value.to_string(),
                    }
                }
                "text" => {
                    return Logo {
                        kind: LogoKind::Text,
                        value: logo_value.to_string(),
                    }
                }
                _ => {}
            }
        }
    }
    // fall back to the page title as a text logo
    Logo {
        kind: LogoKind::Text,
        value: title.to_string(),
    }
}
