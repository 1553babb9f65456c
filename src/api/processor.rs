use base64::Engine;
use tracing::{error, info, warn};

use crate::api::config::{ApiConfig, Capabilities};
use crate::api::models::{CloneRequest, CloneResponse, ImageExtractRequest, ImageExtractResponse};
use crate::browser::{DriverFactory, PageDriver};
use crate::llm::{HtmlSynthesizer, LlmClient};
use crate::scrape::rank::{filter_by_size, SizeFilter};
use crate::scrape::{scrape_page, ScrapeOutcome};
use crate::utils::archive_screenshot;

/// Prefix a scheme-less URL with https. Anything already carrying an
/// explicit scheme passes through unchanged.
pub fn ensure_scheme(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Run the full clone pipeline for one request: scrape the page, feed the
/// reduced snapshot to the model, and return the synthesized document.
/// Any failure collapses into a `success: false` response carrying the
/// deterministic error page; this function never errors outward.
pub async fn process_clone(
    request: CloneRequest,
    config: &ApiConfig,
    factory: &dyn DriverFactory,
    llm: Option<&dyn LlmClient>,
    caps: Capabilities,
) -> CloneResponse {
    let url = ensure_scheme(&request.url);
    info!("Processing clone request for {}", url);

    let outcome = match scrape_once(factory, &url).await {
        Ok(outcome) => outcome,
        Err(message) => {
            error!("Clone scrape failed for {}: {}", url, message);
            return clone_failure(&url, &message, caps);
        }
    };

    for warning in &outcome.warnings {
        warn!("Clone extraction warning for {}: {}", url, warning);
    }

    if let Some(png) = &outcome.snapshot.screenshot_png {
        match archive_screenshot(&config.screenshot_dir, &url, png) {
            Ok(path) => info!("Archived screenshot to {}", path.display()),
            Err(e) => warn!("Screenshot archive failed for {}: {:#}", url, e),
        }
    }

    let client = match llm {
        Some(client) => client,
        None => {
            return clone_failure(&url, "model backend not configured", caps);
        }
    };

    match HtmlSynthesizer::new(client).synthesize(&outcome.snapshot).await {
        Ok(html) => {
            info!("Clone complete for {}: {} chars of HTML", url, html.len());
            CloneResponse {
                success: true,
                generated_html: html,
                original_url: url,
                error_message: None,
            }
        }
        Err(e) => {
            error!("HTML synthesis failed for {}: {}", url, e);
            clone_failure(&url, &e.to_string(), caps)
        }
    }
}

/// Run the extraction pipeline for one request and apply the caller's size
/// filter. Like [`process_clone`], failures come back as a domain response.
pub async fn process_extract(
    request: ImageExtractRequest,
    config: &ApiConfig,
    factory: &dyn DriverFactory,
) -> ImageExtractResponse {
    let url = ensure_scheme(&request.url);
    info!("Processing image extraction for {}", url);

    let outcome = match scrape_once(factory, &url).await {
        Ok(outcome) => outcome,
        Err(message) => {
            error!("Extraction scrape failed for {}: {}", url, message);
            return ImageExtractResponse {
                success: false,
                url,
                total_images: 0,
                images: Vec::new(),
                screenshot_base64: None,
                error_message: Some(message),
            };
        }
    };

    for warning in &outcome.warnings {
        warn!("Extraction warning for {}: {}", url, warning);
    }

    if let Some(png) = &outcome.snapshot.screenshot_png {
        if let Err(e) = archive_screenshot(&config.screenshot_dir, &url, png) {
            warn!("Screenshot archive failed for {}: {:#}", url, e);
        }
    }

    let filter = SizeFilter {
        min_width: request.min_width,
        min_height: request.min_height,
        include_small: request.include_small,
    };
    let images = filter_by_size(&outcome.snapshot.images, filter, request.image_limit);
    let screenshot_base64 = outcome
        .snapshot
        .screenshot_png
        .as_deref()
        .map(|png| base64::engine::general_purpose::STANDARD.encode(png));

    info!(
        "Extraction complete for {}: {} images after filtering ({} discovered)",
        url,
        images.len(),
        outcome.snapshot.total_images_found
    );

    ImageExtractResponse {
        success: true,
        url,
        total_images: images.len(),
        images,
        screenshot_base64,
        error_message: None,
    }
}

/// Open one scoped browser session, run the extraction pass, and close the
/// session on every path. Errors are flattened to their display form.
async fn scrape_once(factory: &dyn DriverFactory, url: &str) -> Result<ScrapeOutcome, String> {
    let driver: Box<dyn PageDriver> = factory
        .open()
        .await
        .map_err(|e| format!("browser session unavailable: {}", e))?;

    let result = scrape_page(driver.as_ref(), url).await;

    if let Err(e) = driver.close().await {
        warn!("Browser session teardown failed: {}", e);
    }

    result.map_err(|e| e.to_string())
}

fn clone_failure(url: &str, message: &str, caps: Capabilities) -> CloneResponse {
    CloneResponse {
        success: false,
        generated_html: fallback_error_page(url, message, caps),
        original_url: url.to_string(),
        error_message: Some(message.to_string()),
    }
}

/// Deterministic, well-formed error page returned when cloning fails. Built
/// entirely from the request URL, the error text, and the probed
/// capabilities; the model is never involved.
pub fn fallback_error_page(url: &str, message: &str, caps: Capabilities) -> String {
    let browser_line = if caps.browser_available {
        "Browser automation: available"
    } else {
        "Browser automation: unavailable"
    };
    let agent_line = if caps.agent_available {
        "Model backend: ready"
    } else {
        "Model backend: not configured"
    };

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>Clone Failed</title>\n\
         <style>\n\
         body {{ font-family: system-ui, sans-serif; background: #f5f5f5; color: #333333; \
         display: flex; justify-content: center; align-items: center; min-height: 100vh; margin: 0; }}\n\
         .card {{ background: #ffffff; border-radius: 8px; padding: 2rem 3rem; max-width: 40rem; \
         box-shadow: 0 2px 8px rgba(0,0,0,0.1); }}\n\
         h1 {{ margin-top: 0; font-size: 1.5rem; }}\n\
         .error {{ background: #fdf0f0; border-left: 4px solid #c0392b; padding: 0.75rem 1rem; \
         margin: 1rem 0; word-break: break-word; }}\n\
         .status {{ color: #666666; font-size: 0.9rem; }}\n\
         </style>\n\
         </head>\n\
         <body>\n\
         <div class=\"card\">\n\
         <h1>Unable to clone this website</h1>\n\
         <p>The request for <strong>{url}</strong> could not be completed.</p>\n\
         <div class=\"error\">{message}</div>\n\
         <p class=\"status\">{browser_line}<br>{agent_line}</p>\n\
         </div>\n\
         </body>\n\
         </html>",
        url = html_escape(url),
        message = html_escape(message),
        browser_line = browser_line,
        agent_line = agent_line,
    )
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
