use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::scrape::snapshot::VisualCandidate;

/// Request to clone a website into a standalone HTML replica
#[derive(Debug, Deserialize, Clone)]
pub struct CloneRequest {
    /// URL to clone; a missing scheme is auto-corrected to https
    pub url: String,
}

/// Response for a clone request. On total failure `generated_html` is a
/// deterministic error page, never model output.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CloneResponse {
    pub success: bool,
    pub generated_html: String,
    pub original_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

fn default_image_limit() -> usize {
    100
}

fn default_min_dimension() -> u32 {
    10
}

fn default_include_small() -> bool {
    true
}

/// Request to extract every discoverable image from a page
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ImageExtractRequest {
    pub url: String,

    /// Maximum candidates returned after filtering
    #[serde(default = "default_image_limit")]
    pub image_limit: usize,

    #[serde(default = "default_min_dimension")]
    pub min_width: u32,

    #[serde(default = "default_min_dimension")]
    pub min_height: u32,

    /// When false, candidates must be at least 100x100
    #[serde(default = "default_include_small")]
    pub include_small: bool,
}

/// Response for an image extraction request
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ImageExtractResponse {
    pub success: bool,
    pub url: String,
    pub total_images: usize,
    pub images: Vec<VisualCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Health status response for the /health endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// Status indicator: healthy or degraded
    pub status: String,

    pub browser_available: bool,

    pub agent_available: bool,

    /// Human-readable capability summary
    pub features: Vec<String>,
}

/// Internal job representation for the worker queue
#[derive(Debug)]
pub enum ScrapeJob {
    Clone {
        request: CloneRequest,
        response_tx: oneshot::Sender<CloneResponse>,
    },
    ExtractImages {
        request: ImageExtractRequest,
        response_tx: oneshot::Sender<ImageExtractResponse>,
    },
}

impl ScrapeJob {
    pub fn url(&self) -> &str {
        match self {
            ScrapeJob::Clone { request, .. } => &request.url,
            ScrapeJob::ExtractImages { request, .. } => &request.url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::snapshot::OriginKind;
    use serde_json::json;

    #[test]
    fn test_clone_response_wire_field_names() {
        let response = CloneResponse {
            success: true,
            generated_html: "<!DOCTYPE html><html></html>".to_string(),
            original_url: "https://site.test".to_string(),
            error_message: None,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "success": true,
                "generatedHtml": "<!DOCTYPE html><html></html>",
                "originalUrl": "https://site.test",
            })
        );
    }

    #[test]
    fn test_clone_response_error_message_included_when_set() {
        let response = CloneResponse {
            success: false,
            generated_html: String::new(),
            original_url: "https://site.test".to_string(),
            error_message: Some("navigation failed".to_string()),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["errorMessage"], "navigation failed");
    }

    #[test]
    fn test_extract_response_wire_field_names() {
        let response = ImageExtractResponse {
            success: true,
            url: "https://site.test".to_string(),
            total_images: 1,
            images: vec![VisualCandidate {
                source_url: "https://site.test/a.png".to_string(),
                alt_text: "Logo".to_string(),
                width: 200,
                height: 100,
                format: "png".to_string(),
                origin_kind: OriginKind::ImgElement,
                is_inline_data: false,
            }],
            screenshot_base64: Some("iVBOR".to_string()),
            error_message: None,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "success": true,
                "url": "https://site.test",
                "totalImages": 1,
                "images": [{
                    "sourceUrl": "https://site.test/a.png",
                    "altText": "Logo",
                    "width": 200,
                    "height": 100,
                    "format": "png",
                    "originKind": "img-element",
                    "isInlineData": false,
                }],
                "screenshotBase64": "iVBOR",
            })
        );
    }

    #[test]
    fn test_health_status_wire_field_names() {
        let status = HealthStatus {
            status: "healthy".to_string(),
            browser_available: true,
            agent_available: false,
            features: vec!["image-extraction".to_string()],
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "healthy",
                "browserAvailable": true,
                "agentAvailable": false,
                "features": ["image-extraction"],
            })
        );
    }

    #[test]
    fn test_extract_request_defaults_applied() {
        let request: ImageExtractRequest =
            serde_json::from_value(json!({ "url": "https://site.test" })).unwrap();
        assert_eq!(request.image_limit, 100);
        assert_eq!(request.min_width, 10);
        assert_eq!(request.min_height, 10);
        assert!(request.include_small);
    }

    #[test]
    fn test_extract_request_accepts_camel_case_overrides() {
        let request: ImageExtractRequest = serde_json::from_value(json!({
            "url": "https://site.test",
            "imageLimit": 5,
            "minWidth": 50,
            "minHeight": 60,
            "includeSmall": false,
        }))
        .unwrap();
        assert_eq!(request.image_limit, 5);
        assert_eq!(request.min_width, 50);
        assert_eq!(request.min_height, 60);
        assert!(!request.include_small);
    }
}
