use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, trace, warn};

use crate::api::config::{ApiConfig, Capabilities};
use crate::api::models::ScrapeJob;
use crate::api::processor::{process_clone, process_extract};
use crate::browser::DriverFactory;
use crate::llm::LlmClient;

/// Spawn the worker tasks that drain the job queue. All workers share one
/// receiver behind a mutex; each job opens and closes its own browser
/// session, so the worker count caps concurrent sessions.
pub fn start_workers(
    job_rx: mpsc::Receiver<ScrapeJob>,
    factory: Arc<dyn DriverFactory>,
    llm: Option<Arc<dyn LlmClient>>,
    config: ApiConfig,
    caps: Capabilities,
) {
    let job_rx = Arc::new(Mutex::new(job_rx));

    info!("Spawning {} worker tasks", config.worker_count);
    for worker_id in 0..config.worker_count {
        let job_rx = job_rx.clone();
        let factory = factory.clone();
        let llm = llm.clone();
        let config = config.clone();

        tokio::spawn(async move {
            debug!("Worker {} started", worker_id);
            loop {
                trace!("Worker {} waiting for job", worker_id);
                let job_opt = { job_rx.lock().await.recv().await };

                match job_opt {
                    Some(job) => {
                        debug!("Worker {} processing job for URL: {}", worker_id, job.url());
                        match job {
                            ScrapeJob::Clone {
                                request,
                                response_tx,
                            } => {
                                let response = process_clone(
                                    request,
                                    &config,
                                    factory.as_ref(),
                                    llm.as_deref(),
                                    caps,
                                )
                                .await;
                                if response_tx.send(response).is_err() {
                                    warn!(
                                        "Worker {} failed to send response - receiver dropped",
                                        worker_id
                                    );
                                }
                            }
                            ScrapeJob::ExtractImages {
                                request,
                                response_tx,
                            } => {
                                let response =
                                    process_extract(request, &config, factory.as_ref()).await;
                                if response_tx.send(response).is_err() {
                                    warn!(
                                        "Worker {} failed to send response - receiver dropped",
                                        worker_id
                                    );
                                }
                            }
                        }
                    }
                    None => {
                        info!("Worker {} shutting down - channel closed", worker_id);
                        break;
                    }
                }
            }
        });
    }
}
