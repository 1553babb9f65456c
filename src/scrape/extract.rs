use serde_json::Value;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::browser::{
    scripts, PageDriver, IMAGE_LOAD_TIMEOUT, SCROLL_BOTTOM_PAUSE, SCROLL_CYCLES, SCROLL_TOP_PAUSE,
};
use crate::error::ScrapeError;
use crate::scrape::normalize::normalize;
use crate::scrape::rank::dedup_and_rank;
use crate::scrape::resolver::{infer_format, is_inline_data, page_origin, resolve_url};
use crate::scrape::snapshot::{OriginKind, PageSnapshot, VisualCandidate, MAX_IMAGES};

/// Result of one extraction pass: a complete snapshot plus the warnings
/// recorded for every secondary step that failed and was downgraded.
#[derive(Debug)]
pub struct ScrapeOutcome {
    pub snapshot: PageSnapshot,
    pub warnings: Vec<String>,
}

/// Drive a live page through the full extraction sequence: navigate, wait
/// for dynamic content, dismiss overlays, scroll to force lazy loads, then
/// harvest candidates, page facts and a screenshot.
///
/// Only navigation failure aborts the pass. Every later step is caught,
/// logged, and replaced by a default so a partial snapshot always comes
/// back.
pub async fn scrape_page(
    driver: &dyn PageDriver,
    url: &str,
) -> Result<ScrapeOutcome, ScrapeError> {
    let mut warnings = Vec::new();

    driver.navigate(url).await?;

    wait_for_images(driver, &mut warnings).await;
    dismiss_overlays(driver, &mut warnings).await;
    trigger_lazy_loads(driver, &mut warnings).await;

    // Page-level facts; a failure here degrades every field to its default
    let facts = match driver.evaluate(scripts::COLLECT_FACTS).await {
        Ok(value) => value,
        Err(e) => {
            warn!("Page fact collection failed: {}", e);
            warnings.push(format!("page facts unavailable: {}", e));
            Value::Null
        }
    };
    let mut snapshot = normalize(url, &facts);

    let origin = page_origin(&snapshot.url)
        .or_else(|| page_origin(url))
        .unwrap_or_default();

    // Selector-union harvest and the separate computed-background scan;
    // each failure is independent
    let mut raw = match driver.evaluate(&scripts::collect_candidates_script()).await {
        Ok(value) => value,
        Err(e) => {
            warn!("Candidate harvest failed: {}", e);
            warnings.push(format!("image candidates unavailable: {}", e));
            Value::Null
        }
    };
    match driver.evaluate(scripts::COLLECT_BACKGROUNDS).await {
        Ok(Value::Array(extra)) => {
            if let Value::Array(entries) = &mut raw {
                entries.extend(extra);
            } else {
                raw = Value::Array(extra);
            }
        }
        Ok(_) => {}
        Err(e) => {
            warn!("Background-image scan failed: {}", e);
            warnings.push(format!("css backgrounds unavailable: {}", e));
        }
    }

    let candidates = parse_raw_candidates(&raw, &origin);
    debug!(
        "Harvested {} raw candidates from {}",
        candidates.len(),
        snapshot.url
    );

    let (images, total) = dedup_and_rank(candidates, MAX_IMAGES);
    snapshot.images = images;
    snapshot.total_images_found = total;

    match driver.screenshot().await {
        Ok(png) => {
            debug!("Captured {} byte screenshot", png.len());
            snapshot.screenshot_png = Some(png);
        }
        Err(e) => {
            warn!("Screenshot capture failed: {}", e);
            warnings.push(format!("screenshot unavailable: {}", e));
        }
    }

    info!(
        "Extraction pass complete for {}: {} images ({} found), {} warnings",
        snapshot.url,
        snapshot.images.len(),
        snapshot.total_images_found,
        warnings.len()
    );

    Ok(ScrapeOutcome { snapshot, warnings })
}

/// Poll until every image on the page reports complete, bounded by a hard
/// timeout. Best effort; a timeout is only a warning.
async fn wait_for_images(driver: &dyn PageDriver, warnings: &mut Vec<String>) {
    let deadline = Instant::now() + IMAGE_LOAD_TIMEOUT;
    loop {
        match driver.evaluate(scripts::IMAGES_COMPLETE).await {
            Ok(value) if value.as_bool() == Some(true) => return,
            Ok(_) => {}
            Err(e) => {
                warnings.push(format!("image-load wait failed: {}", e));
                return;
            }
        }
        if Instant::now() >= deadline {
            warn!("Not all images finished loading within {:?}", IMAGE_LOAD_TIMEOUT);
            warnings.push("image-load wait timed out".to_string());
            return;
        }
        sleep(std::time::Duration::from_millis(500)).await;
    }
}

async fn dismiss_overlays(driver: &dyn PageDriver, warnings: &mut Vec<String>) {
    match driver.evaluate(scripts::DISMISS_OVERLAYS).await {
        Ok(value) if value.as_bool() == Some(true) => {
            debug!("Dismissed a consent/close overlay");
            sleep(std::time::Duration::from_millis(500)).await;
        }
        Ok(_) => {}
        Err(e) => {
            warn!("Overlay dismissal failed: {}", e);
            warnings.push(format!("overlay dismissal failed: {}", e));
        }
    }
}

/// Bounded scroll-to-bottom-and-back cycles to nudge lazy-loaded assets
/// into materializing. Best effort, never a completeness guarantee.
async fn trigger_lazy_loads(driver: &dyn PageDriver, warnings: &mut Vec<String>) {
    for cycle in 0..SCROLL_CYCLES {
        if let Err(e) = driver.evaluate(scripts::SCROLL_TO_BOTTOM).await {
            warn!("Scroll cycle {} failed: {}", cycle + 1, e);
            warnings.push(format!("lazy-load scroll failed: {}", e));
            return;
        }
        sleep(SCROLL_BOTTOM_PAUSE).await;
        if let Err(e) = driver.evaluate(scripts::SCROLL_TO_TOP).await {
            warn!("Scroll cycle {} failed: {}", cycle + 1, e);
            warnings.push(format!("lazy-load scroll failed: {}", e));
            return;
        }
        sleep(SCROLL_TOP_PAUSE).await;
    }
}

/// Turn raw in-page candidate entries into resolved [`VisualCandidate`]s.
/// Entries with no resolvable source are skipped.
fn parse_raw_candidates(raw: &Value, origin: &str) -> Vec<VisualCandidate> {
    let entries = match raw.as_array() {
        Some(entries) => entries,
        None => return Vec::new(),
    };

    entries
        .iter()
        .filter_map(|entry| {
            let src = entry.get("src")?.as_str()?;
            let resolved = resolve_url(src, origin)?;
            let origin_kind = entry
                .get("kind")
                .cloned()
                .and_then(|kind| serde_json::from_value::<OriginKind>(kind).ok())
                .unwrap_or(OriginKind::DataAttribute);
            Some(VisualCandidate {
                format: infer_format(&resolved),
                is_inline_data: is_inline_data(&resolved),
                source_url: resolved,
                alt_text: entry
                    .get("alt")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string(),
                width: entry.get("width").and_then(Value::as_u64).unwrap_or(0) as u32,
                height: entry.get("height").and_then(Value::as_u64).unwrap_or(0) as u32,
                origin_kind,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_raw_candidates_resolves_and_classifies() {
        let raw = json!([
            { "src": "/hero.png", "alt": "Hero", "width": 800, "height": 600, "kind": "img-element" },
            { "src": "//cdn.example.com/bg.jpg", "alt": "", "width": 1920, "height": 400, "kind": "css-background" },
            { "src": "", "alt": "skipped", "width": 10, "height": 10, "kind": "img-element" },
            { "alt": "no src at all" },
        ]);
        let candidates = parse_raw_candidates(&raw, "https://site.test");

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].source_url, "https://site.test/hero.png");
        assert_eq!(candidates[0].format, "png");
        assert_eq!(candidates[0].origin_kind, OriginKind::ImgElement);
        assert_eq!(candidates[1].source_url, "https://cdn.example.com/bg.jpg");
        assert_eq!(candidates[1].origin_kind, OriginKind::CssBackground);
    }

    #[test]
    fn test_parse_raw_candidates_flags_inline_data() {
        let raw = json!([
            { "src": "data:image/webp;base64,AAAA", "alt": "", "width": 5, "height": 5, "kind": "canvas-element" },
        ]);
        let candidates = parse_raw_candidates(&raw, "https://site.test");
        assert!(candidates[0].is_inline_data);
        assert_eq!(candidates[0].format, "webp");
    }

    #[test]
    fn test_parse_raw_candidates_unknown_kind_defaults() {
        let raw = json!([
            { "src": "/x.png", "alt": "", "width": 1, "height": 1, "kind": "something-new" },
        ]);
        let candidates = parse_raw_candidates(&raw, "https://site.test");
        assert_eq!(candidates[0].origin_kind, OriginKind::DataAttribute);
    }

    #[test]
    fn test_parse_raw_candidates_non_array_input() {
        assert!(parse_raw_candidates(&Value::Null, "https://site.test").is_empty());
    }
}
