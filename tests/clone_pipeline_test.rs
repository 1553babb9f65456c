use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use clone_api::api::config::{ApiConfig, Capabilities};
use clone_api::api::models::{CloneRequest, ImageExtractRequest};
use clone_api::api::processor::{process_clone, process_extract};
use clone_api::browser::{DriverFactory, PageDriver};
use clone_api::error::ScrapeError;
use clone_api::llm::{LlmClient, LlmResponse};

/// Serves canned results for every script the pipeline runs, keyed on
/// distinctive fragments of each script.
struct FakePage {
    navigation_fails: bool,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl PageDriver for FakePage {
    async fn navigate(&self, url: &str) -> Result<(), ScrapeError> {
        if self.navigation_fails {
            Err(ScrapeError::Navigation(format!(
                "all navigation strategies exhausted for {}",
                url
            )))
        } else {
            Ok(())
        }
    }

    async fn evaluate(&self, script: &str) -> Result<Value, ScrapeError> {
        if script.contains("img.complete") {
            return Ok(json!(true));
        }
        if script.contains("attrSelectors") {
            return Ok(json!(false));
        }
        if script.contains("scrollTo") {
            return Ok(json!(true));
        }
        if script.contains("urlPattern") {
            return Ok(json!([
                { "src": "/assets/bg-texture.png", "alt": "", "width": 1920, "height": 600, "kind": "css-background" },
            ]));
        }
        if script.contains("bodyStyles") {
            return Ok(json!({
                "url": "https://fake.test/",
                "title": "Fake Storefront",
                "backgroundColor": "#fafafa",
                "textColor": "#222222",
                "fontFamily": "Inter, sans-serif",
                "isDark": false,
                "logo": { "kind": "text", "value": "Fake Storefront" },
                "navigation": [
                    { "text": "Shop", "href": "/shop" },
                    { "text": "Contact", "href": "/contact" },
                ],
                "headings": [
                    { "text": "New arrivals", "level": 1 },
                ],
                "bodyText": "Everything in the fake storefront ships tomorrow.",
                "htmlPreview": "<header>Fake Storefront</header>",
                "hasSearch": true,
                "hasVideo": false,
            }));
        }
        // candidate harvest
        Ok(json!([
            { "src": "/img/hero.jpg", "alt": "Hero", "width": 1200, "height": 800, "kind": "img-element" },
            { "src": "/img/hero.jpg", "alt": "duplicate", "width": 9999, "height": 9999, "kind": "img-element" },
            { "src": "/img/thumb.png", "alt": "Thumb", "width": 64, "height": 64, "kind": "img-element" },
        ]))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, ScrapeError> {
        Ok(vec![0x89, 0x50, 0x4e, 0x47])
    }

    async fn close(self: Box<Self>) -> Result<(), ScrapeError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeFactory {
    navigation_fails: bool,
    closed: Arc<AtomicUsize>,
}

impl FakeFactory {
    fn new(navigation_fails: bool) -> Self {
        Self {
            navigation_fails,
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl DriverFactory for FakeFactory {
    async fn open(&self) -> Result<Box<dyn PageDriver>, ScrapeError> {
        Ok(Box::new(FakePage {
            navigation_fails: self.navigation_fails,
            closed: self.closed.clone(),
        }))
    }
}

struct FakeModel {
    reply: String,
}

#[async_trait]
impl LlmClient for FakeModel {
    async fn generate(
        &self,
        _prompt: &str,
        _system_prompt: Option<&str>,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<LlmResponse, ScrapeError> {
        Ok(LlmResponse {
            text: self.reply.clone(),
            model: Some("fake-model".to_string()),
        })
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

fn test_config() -> ApiConfig {
    ApiConfig {
        screenshot_dir: std::env::temp_dir()
            .join("clone_api_test_screens")
            .to_string_lossy()
            .into_owned(),
        ..ApiConfig::default()
    }
}

fn full_caps() -> Capabilities {
    Capabilities {
        browser_available: true,
        agent_available: true,
    }
}

#[tokio::test]
async fn clone_pipeline_produces_document_from_model_reply() {
    let factory = FakeFactory::new(false);
    let model = FakeModel {
        reply: "Here is your replica:\n```html\n<html><body><h1>Fake Storefront</h1></body></html>\n```\nEnjoy!"
            .to_string(),
    };

    let response = process_clone(
        CloneRequest {
            url: "fake.test".to_string(),
        },
        &test_config(),
        &factory,
        Some(&model),
        full_caps(),
    )
    .await;

    assert!(response.success);
    assert_eq!(response.original_url, "https://fake.test");
    assert!(response.error_message.is_none());
    assert!(response.generated_html.starts_with("<!DOCTYPE html>"));
    assert!(response.generated_html.contains("<h1>Fake Storefront</h1>"));
    assert!(response.generated_html.ends_with("</html>"));
    assert!(!response.generated_html.contains("Enjoy"));
    assert_eq!(factory.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn clone_failure_returns_wellformed_fallback_page() {
    let factory = FakeFactory::new(true);
    let model = FakeModel {
        reply: "<html></html>".to_string(),
    };

    let response = process_clone(
        CloneRequest {
            url: "https://unreachable.test".to_string(),
        },
        &test_config(),
        &factory,
        Some(&model),
        full_caps(),
    )
    .await;

    assert!(!response.success);
    let message = response.error_message.as_deref().unwrap_or("");
    assert!(!message.is_empty());
    assert!(message.contains("navigation"));
    assert!(response.generated_html.contains("<html"));
    assert!(response.generated_html.ends_with("</html>"));
    assert!(response.generated_html.contains("unreachable.test"));
    // session still torn down after the failed pass
    assert_eq!(factory.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn clone_without_model_backend_fails_cleanly() {
    let factory = FakeFactory::new(false);

    let response = process_clone(
        CloneRequest {
            url: "fake.test".to_string(),
        },
        &test_config(),
        &factory,
        None,
        Capabilities {
            browser_available: true,
            agent_available: false,
        },
    )
    .await;

    assert!(!response.success);
    assert!(response
        .error_message
        .as_deref()
        .unwrap_or("")
        .contains("not configured"));
    assert!(response.generated_html.contains("Model backend: not configured"));
}

#[tokio::test]
async fn extract_filters_dedups_and_encodes_screenshot() {
    let factory = FakeFactory::new(false);

    let response = process_extract(
        ImageExtractRequest {
            url: "fake.test".to_string(),
            image_limit: 100,
            min_width: 10,
            min_height: 10,
            include_small: true,
        },
        &test_config(),
        &factory,
    )
    .await;

    assert!(response.success);
    assert_eq!(response.url, "https://fake.test");
    // duplicate hero URL collapsed; background + hero + thumb remain
    assert_eq!(response.images.len(), 3);
    assert_eq!(response.total_images, 3);
    // largest area first
    assert_eq!(response.images[0].source_url, "https://fake.test/assets/bg-texture.png");
    assert_eq!(response.images[1].source_url, "https://fake.test/img/hero.jpg");
    // first-discovered metadata kept for the deduplicated hero
    assert_eq!(response.images[1].alt_text, "Hero");
    assert!(response.screenshot_base64.is_some());
    assert!(response.error_message.is_none());
}

#[tokio::test]
async fn extract_excluding_small_drops_sub_hundred_pixel_images() {
    let factory = FakeFactory::new(false);

    let response = process_extract(
        ImageExtractRequest {
            url: "fake.test".to_string(),
            image_limit: 100,
            min_width: 10,
            min_height: 10,
            include_small: false,
        },
        &test_config(),
        &factory,
    )
    .await;

    assert!(response.success);
    assert!(response
        .images
        .iter()
        .all(|image| image.width >= 100 && image.height >= 100));
    assert_eq!(response.images.len(), 2);
}

#[tokio::test]
async fn extract_failure_reports_error_without_images() {
    let factory = FakeFactory::new(true);

    let response = process_extract(
        ImageExtractRequest {
            url: "https://unreachable.test".to_string(),
            image_limit: 100,
            min_width: 10,
            min_height: 10,
            include_small: true,
        },
        &test_config(),
        &factory,
    )
    .await;

    assert!(!response.success);
    assert!(response.images.is_empty());
    assert_eq!(response.total_images, 0);
    assert!(response.screenshot_base64.is_none());
    assert!(!response.error_message.unwrap_or_default().is_empty());
}
