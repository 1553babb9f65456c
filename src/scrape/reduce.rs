use std::fmt::Write as _;

use tracing::debug;

use crate::scrape::snapshot::PageSnapshot;

/// Images itemized in the model context; the rest are summarized as a count.
pub const MAX_CONTEXT_IMAGES: usize = 20;
/// Navigation entries itemized in the model context.
pub const MAX_CONTEXT_NAV: usize = 6;
/// Headings itemized in the model context.
pub const MAX_CONTEXT_HEADINGS: usize = 5;
/// Character ceiling for the visible-text excerpt.
pub const BODY_TEXT_CEILING: usize = 500;
/// Character ceiling for the cleaned-HTML preview.
pub const HTML_PREVIEW_CEILING: usize = 4000;

/// Project a snapshot into a bounded textual context for the model request.
///
/// Purely a projection: selects and truncates existing snapshot fields,
/// never invents new facts. The binary screenshot never enters the text;
/// it is referenced by presence and size only.
pub fn reduce_snapshot(snapshot: &PageSnapshot) -> String {
    let mut ctx = String::new();

    let _ = writeln!(ctx, "TARGET PAGE: {}", snapshot.url);
    let _ = writeln!(ctx, "TITLE: {}", snapshot.title);
    let _ = writeln!(ctx, "BACKGROUND: {}", snapshot.background_color);
    let _ = writeln!(ctx, "TEXT COLOR: {}", snapshot.text_color);
    let _ = writeln!(ctx, "FONT: {}", snapshot.font_family);
    let _ = writeln!(
        ctx,
        "THEME: {}",
        if snapshot.is_dark { "dark" } else { "light" }
    );

    if let Some(logo) = &snapshot.logo {
        let _ = writeln!(ctx, "LOGO ({:?}): {}", logo.kind, logo.value);
    }

    let _ = writeln!(ctx, "\nNAVIGATION:");
    for item in snapshot.navigation.iter().take(MAX_CONTEXT_NAV) {
        let _ = writeln!(ctx, "- {} ({})", item.text, item.href);
    }
    if snapshot.navigation.len() > MAX_CONTEXT_NAV {
        let _ = writeln!(
            ctx,
            "...and {} more navigation items",
            snapshot.navigation.len() - MAX_CONTEXT_NAV
        );
    }

    let _ = writeln!(ctx, "\nHEADINGS:");
    for heading in snapshot.headings.iter().take(MAX_CONTEXT_HEADINGS) {
        let _ = writeln!(ctx, "- h{}: {}", heading.level, heading.text);
    }
    if snapshot.headings.len() > MAX_CONTEXT_HEADINGS {
        let _ = writeln!(
            ctx,
            "...and {} more headings",
            snapshot.headings.len() - MAX_CONTEXT_HEADINGS
        );
    }

    let _ = writeln!(
        ctx,
        "\nIMAGES ({} itemized of {} found):",
        snapshot.images.len().min(MAX_CONTEXT_IMAGES),
        snapshot.total_images_found
    );
    for (i, image) in snapshot.images.iter().take(MAX_CONTEXT_IMAGES).enumerate() {
        let _ = write!(ctx, "{}. {}", i + 1, image.source_url);
        if !image.alt_text.is_empty() {
            let _ = write!(ctx, " (alt: {})", image.alt_text);
        }
        let _ = writeln!(
            ctx,
            " - {}x{} - {}",
            image.width,
            image.height,
            serde_json::to_value(image.origin_kind)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default()
        );
    }
    if snapshot.images.len() > MAX_CONTEXT_IMAGES {
        let _ = writeln!(
            ctx,
            "...and {} more images available",
            snapshot.images.len() - MAX_CONTEXT_IMAGES
        );
    }

    if !snapshot.body_text.is_empty() {
        let _ = writeln!(
            ctx,
            "\nVISIBLE TEXT (excerpt):\n{}",
            truncate_chars(&snapshot.body_text, BODY_TEXT_CEILING)
        );
    }
    if !snapshot.html_preview.is_empty() {
        let _ = writeln!(
            ctx,
            "\nCLEANED HTML (preview):\n{}",
            truncate_chars(&snapshot.html_preview, HTML_PREVIEW_CEILING)
        );
    }

    if snapshot.has_search {
        let _ = writeln!(ctx, "\nThe page has a search input.");
    }
    if snapshot.has_video {
        let _ = writeln!(ctx, "The page embeds video content.");
    }

    // The raw capture stays out of the text budget; only note its presence.
    match &snapshot.screenshot_png {
        Some(png) => {
            let _ = writeln!(
                ctx,
                "\nSCREENSHOT: captured, {} KB (not inlined)",
                png.len() / 1024
            );
        }
        None => {
            let _ = writeln!(ctx, "\nSCREENSHOT: not available");
        }
    }

    debug!(context_chars = ctx.len(), "Reduced snapshot to model context");
    ctx
}

fn truncate_chars(text: &str, ceiling: usize) -> String {
    if text.chars().count() <= ceiling {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(ceiling).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::normalize::normalize;
    use crate::scrape::snapshot::{OriginKind, VisualCandidate};
    use serde_json::json;

    fn snapshot_with_images(count: usize) -> PageSnapshot {
        let mut snapshot = normalize("https://site.test", &json!({"title": "Sample"}));
        snapshot.images = (0..count)
            .map(|i| VisualCandidate {
                source_url: format!("https://site.test/{}.png", i),
                alt_text: String::new(),
                width: 100,
                height: 100,
                format: "png".to_string(),
                origin_kind: OriginKind::ImgElement,
                is_inline_data: false,
            })
            .collect();
        snapshot.total_images_found = count;
        snapshot
    }

    #[test]
    fn test_overflow_is_noted() {
        let snapshot = snapshot_with_images(25);
        let ctx = reduce_snapshot(&snapshot);
        assert!(ctx.contains("...and 5 more images available"));
        // itemization stops at the cap
        assert!(ctx.contains("20. https://site.test/19.png"));
        assert!(!ctx.contains("21. "));
    }

    #[test]
    fn test_no_overflow_note_when_under_cap() {
        let snapshot = snapshot_with_images(3);
        let ctx = reduce_snapshot(&snapshot);
        assert!(!ctx.contains("more images available"));
    }

    #[test]
    fn test_body_text_truncated() {
        let mut snapshot = snapshot_with_images(0);
        snapshot.body_text = "x".repeat(2000);
        let ctx = reduce_snapshot(&snapshot);
        let excerpt = ctx
            .split("VISIBLE TEXT (excerpt):\n")
            .nth(1)
            .unwrap()
            .lines()
            .next()
            .unwrap();
        assert_eq!(excerpt.chars().count(), BODY_TEXT_CEILING + 3);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn test_screenshot_never_inlined() {
        let mut snapshot = snapshot_with_images(0);
        snapshot.screenshot_png = Some(vec![0u8; 4096]);
        let ctx = reduce_snapshot(&snapshot);
        assert!(ctx.contains("SCREENSHOT: captured, 4 KB (not inlined)"));
    }

    #[test]
    fn test_reduction_is_projection_only() {
        // every URL in the context must come from the snapshot itself
        let snapshot = snapshot_with_images(2);
        let ctx = reduce_snapshot(&snapshot);
        assert!(ctx.contains("https://site.test/0.png"));
        assert!(ctx.contains("https://site.test/1.png"));
        assert!(ctx.contains("TARGET PAGE: https://site.test"));
    }
}
