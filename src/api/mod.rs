pub mod config;
pub mod handlers;
pub mod models;
pub mod processor;
pub mod workers;

use actix_web::{web, App, HttpServer};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

use crate::api::config::{ApiConfig, Capabilities, QUEUE_SIZE};
use crate::api::models::ScrapeJob;
use crate::browser::webdriver::WebDriverFactory;
use crate::browser::DriverFactory;
use crate::llm::anthropic::AnthropicClient;
use crate::llm::LlmClient;

/// Starts the API server with the specified configuration.
///
/// Probes the WebDriver endpoint and the model credential once at startup,
/// spawns the worker pool, and serves /health, /clone and /extract-images.
/// Missing capabilities degrade the service rather than aborting it: the
/// endpoints stay up and report failures through their response schemas.
#[instrument(skip(config))]
pub async fn start_server(host: &str, port: u16, config: Option<ApiConfig>) -> Result<()> {
    info!("Starting clone API server on {}:{}", host, port);
    let config = config.unwrap_or_default();

    let factory = Arc::new(WebDriverFactory::new(
        config.webdriver_url.as_deref(),
        (config.viewport_width, config.viewport_height),
        config.headless,
    ));
    let browser_available = factory.probe().await;
    if !browser_available {
        warn!("WebDriver endpoint unreachable; requests will fail until it comes back");
    }

    let llm: Option<Arc<dyn LlmClient>> = match &config.anthropic_api_key {
        Some(key) => match AnthropicClient::new(key.clone(), config.model.clone()) {
            Ok(client) => {
                info!("Model backend configured: {}", client.model_name());
                Some(Arc::new(client))
            }
            Err(e) => {
                warn!("Model backend init failed, /clone disabled: {}", e);
                None
            }
        },
        None => {
            warn!("No model credential found; /clone will return fallback pages");
            None
        }
    };

    let caps = Capabilities {
        browser_available,
        agent_available: llm.is_some(),
    };

    let (job_tx, job_rx) = mpsc::channel::<ScrapeJob>(QUEUE_SIZE);
    let factory: Arc<dyn DriverFactory> = factory;
    workers::start_workers(job_rx, factory, llm, config.clone(), caps);

    let config_data = web::Data::new(config);
    let caps_data = web::Data::new(caps);
    let job_tx_data = web::Data::new(job_tx);

    info!("Starting HTTP server at {}:{}", host, port);
    HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(caps_data.clone())
            .app_data(job_tx_data.clone())
            .service(web::resource("/health").route(web::get().to(handlers::health_check)))
            .service(web::resource("/clone").route(web::post().to(handlers::clone_handler)))
            .service(
                web::resource("/extract-images")
                    .route(web::post().to(handlers::extract_images_handler)),
            )
    })
    .bind((host, port))
    .map_err(|e| {
        error!("Failed to bind to {}:{}: {}", host, port, e);
        e
    })?
    .run()
    .await?;

    info!("Server shutdown complete");
    Ok(())
}
