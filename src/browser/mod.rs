pub mod scripts;
pub mod webdriver;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ScrapeError;

/// Narrow capability interface over a live browser page. All pipeline logic
/// depends only on this trait; the fantoccini adapter in [`webdriver`] is
/// the single concrete implementation, and tests substitute a fake.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to `url`, trying each fixed strategy once and surfacing the
    /// last failure when all are exhausted.
    async fn navigate(&self, url: &str) -> Result<(), ScrapeError>;

    /// Run a script against the live DOM and return its structured result.
    async fn evaluate(&self, script: &str) -> Result<Value, ScrapeError>;

    /// Capture a full-page PNG.
    async fn screenshot(&self) -> Result<Vec<u8>, ScrapeError>;

    /// Tear down the underlying session.
    async fn close(self: Box<Self>) -> Result<(), ScrapeError>;
}

/// Opens one scoped [`PageDriver`] per request. The session must be closed
/// before the request returns, on every path.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageDriver>, ScrapeError>;
}

/// How long a navigation attempt keeps waiting after the document body
/// appears. Each later strategy demands less of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyWait {
    /// `document.readyState === "complete"` plus a settle pause for
    /// client-rendered frameworks
    Settled,
    /// `document.readyState` past `"loading"` (DOMContentLoaded fired)
    Interactive,
    /// A present `<body>` is enough
    Body,
}

impl ReadyWait {
    /// Whether a polled `document.readyState` value satisfies this wait.
    pub fn reached(&self, ready_state: &str) -> bool {
        match self {
            ReadyWait::Settled => ready_state == "complete",
            ReadyWait::Interactive => ready_state != "loading",
            ReadyWait::Body => true,
        }
    }
}

/// One fixed navigation attempt: a readiness level and a hard deadline.
#[derive(Debug, Clone, Copy)]
pub struct NavStrategy {
    pub name: &'static str,
    pub timeout: Duration,
    pub wait: ReadyWait,
}

/// The ordered strategy list. Each is tried once, in order, demanding
/// progressively less page readiness under a shorter deadline; there is no
/// backoff and no repeat.
pub const NAV_STRATEGIES: [NavStrategy; 3] = [
    NavStrategy {
        name: "settled",
        timeout: Duration::from_secs(30),
        wait: ReadyWait::Settled,
    },
    NavStrategy {
        name: "dom-content-loaded",
        timeout: Duration::from_secs(20),
        wait: ReadyWait::Interactive,
    },
    NavStrategy {
        name: "body-present",
        timeout: Duration::from_secs(15),
        wait: ReadyWait::Body,
    },
];

/// Hard deadline for the every-image-complete wait after navigation.
pub const IMAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Scroll-to-bottom-and-back cycles used to nudge lazy-loaded assets.
pub const SCROLL_CYCLES: usize = 6;

/// Pause after scrolling to the bottom of the page.
pub const SCROLL_BOTTOM_PAUSE: Duration = Duration::from_millis(400);

/// Pause after scrolling back to the top.
pub const SCROLL_TOP_PAUSE: Duration = Duration::from_millis(150);
