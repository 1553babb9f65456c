use thiserror::Error;

/// Failure taxonomy for the scrape/clone pipeline.
///
/// `Navigation` and `Model` abort the request that raised them; `Extraction`
/// is always caught by the aggregator and downgraded to a warning plus a
/// default value for the affected field. `Browser` covers session setup and
/// teardown problems.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("extraction step failed: {0}")]
    Extraction(String),

    #[error("model call failed: {0}")]
    Model(String),

    #[error("browser session error: {0}")]
    Browser(String),
}
