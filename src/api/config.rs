use std::time::Duration;

/// Capacity of the job queue shared by all workers
pub const QUEUE_SIZE: usize = 100;

/// Default number of worker tasks draining the queue; each job opens its
/// own browser session, so this bounds concurrent sessions too
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Configuration for the API, constructed once at process start and passed
/// by reference to every handler and worker.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Directory the screenshot archive is written to
    pub screenshot_dir: String,

    /// Directory the timestamped log file is written to
    pub log_dir: String,

    /// Width of the browser viewport
    pub viewport_width: u32,

    /// Height of the browser viewport
    pub viewport_height: u32,

    /// Whether to run the browser in headless mode
    pub headless: bool,

    /// Optional WebDriver URL (uses default if None)
    pub webdriver_url: Option<String>,

    /// Timeout for API requests
    pub request_timeout: Duration,

    /// Worker tasks draining the job queue
    pub worker_count: usize,

    /// Model backend credential; absence disables /clone synthesis
    pub anthropic_api_key: Option<String>,

    /// Model override; the adapter default applies when None
    pub model: Option<String>,
}

impl ApiConfig {
    /// Default configuration with credentials picked up from the
    /// environment (`ANTHROPIC_API_KEY`, `CLONE_MODEL`).
    pub fn from_env() -> Self {
        Self {
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            model: std::env::var("CLONE_MODEL").ok(),
            ..Self::default()
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: "screenshots".to_string(),
            log_dir: "logs".to_string(),
            viewport_width: 1920,
            viewport_height: 1080,
            headless: true,
            webdriver_url: None,
            request_timeout: Duration::from_secs(300),
            worker_count: DEFAULT_WORKER_COUNT,
            anthropic_api_key: None,
            model: None,
        }
    }
}

/// Capabilities probed once at startup. A missing credential or an
/// unreachable WebDriver endpoint shows up here rather than in a global.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub browser_available: bool,
    pub agent_available: bool,
}
