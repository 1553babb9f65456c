use actix_web::{web, HttpResponse, Responder};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, instrument, warn};

use crate::api::config::{ApiConfig, Capabilities};
use crate::api::models::{
    CloneRequest, CloneResponse, HealthStatus, ImageExtractRequest, ImageExtractResponse,
    ScrapeJob,
};
use crate::api::processor::{ensure_scheme, fallback_error_page};

const ENQUEUE_ATTEMPTS: usize = 3;
const ENQUEUE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// HTTP handler for clone requests.
///
/// Submits the job to the worker queue with a brief retry when the queue is
/// full, then awaits the result under the configured timeout. Every outcome
/// maps to the clone response schema; a failed request still carries a
/// well-formed fallback document.
#[instrument(skip(config, caps, job_tx), fields(url = %request.url))]
pub async fn clone_handler(
    request: web::Json<CloneRequest>,
    config: web::Data<ApiConfig>,
    caps: web::Data<Capabilities>,
    job_tx: web::Data<mpsc::Sender<ScrapeJob>>,
) -> impl Responder {
    info!("Received clone request for URL: {}", request.url);
    let request = request.into_inner();
    let url = ensure_scheme(&request.url);

    let response_rx = match enqueue(
        &job_tx,
        |response_tx| ScrapeJob::Clone {
            request: request.clone(),
            response_tx,
        },
    )
    .await
    {
        Ok(rx) => rx,
        Err(rejection) => {
            return rejection
                .status()
                .json(failed_clone(&url, rejection.message(), *caps.get_ref()));
        }
    };

    debug!("Job enqueued, waiting up to {:?}", config.request_timeout);
    match timeout(config.request_timeout, response_rx).await {
        Ok(Ok(response)) => {
            info!("Clone request for {} finished (success: {})", url, response.success);
            HttpResponse::Ok().json(response)
        }
        Ok(Err(_)) => {
            error!("Worker channel closed unexpectedly");
            HttpResponse::InternalServerError()
                .json(failed_clone(&url, "worker dropped", *caps.get_ref()))
        }
        Err(_) => {
            error!("Clone request timed out after {:?}", config.request_timeout);
            HttpResponse::RequestTimeout()
                .json(failed_clone(&url, "request timed out", *caps.get_ref()))
        }
    }
}

/// HTTP handler for image extraction requests. Same queue discipline as
/// [`clone_handler`] with the extraction response schema.
#[instrument(skip(config, job_tx), fields(url = %request.url))]
pub async fn extract_images_handler(
    request: web::Json<ImageExtractRequest>,
    config: web::Data<ApiConfig>,
    job_tx: web::Data<mpsc::Sender<ScrapeJob>>,
) -> impl Responder {
    info!("Received image extraction request for URL: {}", request.url);
    let request = request.into_inner();
    let url = ensure_scheme(&request.url);

    let response_rx = match enqueue(
        &job_tx,
        |response_tx| ScrapeJob::ExtractImages {
            request: request.clone(),
            response_tx,
        },
    )
    .await
    {
        Ok(rx) => rx,
        Err(rejection) => {
            return rejection.status().json(failed_extract(&url, rejection.message()));
        }
    };

    debug!("Job enqueued, waiting up to {:?}", config.request_timeout);
    match timeout(config.request_timeout, response_rx).await {
        Ok(Ok(response)) => {
            info!(
                "Extraction request for {} finished (success: {}, images: {})",
                url,
                response.success,
                response.images.len()
            );
            HttpResponse::Ok().json(response)
        }
        Ok(Err(_)) => {
            error!("Worker channel closed unexpectedly");
            HttpResponse::InternalServerError().json(failed_extract(&url, "worker dropped"))
        }
        Err(_) => {
            error!("Extraction request timed out after {:?}", config.request_timeout);
            HttpResponse::RequestTimeout().json(failed_extract(&url, "request timed out"))
        }
    }
}

/// Health check endpoint. Reports the capabilities probed at startup; the
/// service is degraded when either the browser or the model backend is
/// missing, since /clone needs both.
#[instrument(skip(caps))]
pub async fn health_check(caps: web::Data<Capabilities>) -> impl Responder {
    let caps = *caps.get_ref();
    let status = if caps.browser_available && caps.agent_available {
        "healthy"
    } else {
        "degraded"
    };

    let mut features = vec!["image-extraction".to_string()];
    if caps.browser_available {
        features.push("browser-automation".to_string());
    }
    if caps.agent_available {
        features.push("html-synthesis".to_string());
    }

    info!(
        "Health check: status={}, browser={}, agent={}",
        status, caps.browser_available, caps.agent_available
    );
    HttpResponse::Ok().json(HealthStatus {
        status: status.to_string(),
        browser_available: caps.browser_available,
        agent_available: caps.agent_available,
        features,
    })
}

enum Rejection {
    Busy,
    ShuttingDown,
}

impl Rejection {
    fn message(&self) -> &'static str {
        match self {
            Rejection::Busy => "server is busy, try again later",
            Rejection::ShuttingDown => "service is shutting down",
        }
    }

    fn status(&self) -> actix_web::HttpResponseBuilder {
        match self {
            Rejection::Busy => HttpResponse::TooManyRequests(),
            Rejection::ShuttingDown => HttpResponse::ServiceUnavailable(),
        }
    }
}

/// Try to enqueue a job a few times with a short delay between attempts.
/// Returns the oneshot receiver for the eventual response, or the reason
/// the job could not be accepted.
async fn enqueue<T>(
    job_tx: &mpsc::Sender<ScrapeJob>,
    make_job: impl Fn(oneshot::Sender<T>) -> ScrapeJob,
) -> Result<oneshot::Receiver<T>, Rejection> {
    for attempt in 1..=ENQUEUE_ATTEMPTS {
        let (response_tx, response_rx) = oneshot::channel();
        match job_tx.try_send(make_job(response_tx)) {
            Ok(()) => {
                debug!("Job enqueued after {} attempt(s)", attempt);
                return Ok(response_rx);
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                if attempt < ENQUEUE_ATTEMPTS {
                    warn!("Queue full, retrying (attempt {}/{})", attempt, ENQUEUE_ATTEMPTS);
                    sleep(ENQUEUE_RETRY_DELAY).await;
                } else {
                    warn!("Queue full after {} attempts, rejecting request", ENQUEUE_ATTEMPTS);
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("Worker queue has been closed");
                return Err(Rejection::ShuttingDown);
            }
        }
    }
    Err(Rejection::Busy)
}

fn failed_clone(url: &str, message: &str, caps: Capabilities) -> CloneResponse {
    CloneResponse {
        success: false,
        generated_html: fallback_error_page(url, message, caps),
        original_url: url.to_string(),
        error_message: Some(message.to_string()),
    }
}

fn failed_extract(url: &str, message: &str) -> ImageExtractResponse {
    ImageExtractResponse {
        success: false,
        url: url.to_string(),
        total_images: 0,
        images: Vec::new(),
        screenshot_base64: None,
        error_message: Some(message.to_string()),
    }
}
