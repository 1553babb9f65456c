use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::Value;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::browser::{scripts, DriverFactory, NavStrategy, PageDriver, ReadyWait, NAV_STRATEGIES};
use crate::error::ScrapeError;

const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";
const READY_STATE_POLL: Duration = Duration::from_millis(250);
const DYNAMIC_CONTENT_SETTLE: Duration = Duration::from_millis(1500);
const MAX_CAPTURE_HEIGHT: u32 = 6000;

/// Opens one WebDriver session per request.
pub struct WebDriverFactory {
    webdriver_url: String,
    viewport: (u32, u32),
    headless: bool,
}

impl WebDriverFactory {
    pub fn new(webdriver_url: Option<&str>, viewport: (u32, u32), headless: bool) -> Self {
        Self {
            webdriver_url: webdriver_url.unwrap_or(DEFAULT_WEBDRIVER_URL).to_string(),
            viewport,
            headless,
        }
    }

    /// Open and immediately close a session to verify the WebDriver endpoint
    /// is reachable. Used for the startup capability probe.
    pub async fn probe(&self) -> bool {
        match self.open().await {
            Ok(driver) => {
                if let Err(e) = driver.close().await {
                    warn!("Probe session failed to close cleanly: {}", e);
                }
                true
            }
            Err(e) => {
                warn!("WebDriver probe failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl DriverFactory for WebDriverFactory {
    async fn open(&self) -> Result<Box<dyn PageDriver>, ScrapeError> {
        let page = WebDriverPage::connect(&self.webdriver_url, self.viewport, self.headless)
            .await
            .map_err(|e| ScrapeError::Browser(format!("WebDriver connect failed: {}", e)))?;
        Ok(Box::new(page))
    }
}

/// Concrete [`PageDriver`] backed by a fantoccini WebDriver client.
pub struct WebDriverPage {
    client: Client,
    viewport: (u32, u32),
}

impl WebDriverPage {
    pub async fn connect(
        webdriver_url: &str,
        viewport: (u32, u32),
        headless: bool,
    ) -> anyhow::Result<Self> {
        let mut caps = serde_json::map::Map::new();
        let mut chrome_opts = serde_json::map::Map::new();

        let args: Vec<String> = vec![
            "--no-sandbox",
            "--disable-gpu",
            "--disable-dev-shm-usage",
            "--disable-extensions",
            "--disable-notifications",
            "--disable-infobars",
            "--disable-popup-blocking",
            "--disable-background-networking",
            "--disable-background-timer-throttling",
            "--disable-backgrounding-occluded-windows",
            "--disable-breakpad",
            "--disable-component-extensions-with-background-pages",
            "--disable-features=TranslateUI",
            "--disable-ipc-flooding-protection",
            "--disable-renderer-backgrounding",
            "--enable-features=NetworkService,NetworkServiceInProcess",
            "--force-color-profile=srgb",
            "--metrics-recording-only",
            "--mute-audio",
            if headless { "--headless=new" } else { "" },
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

        chrome_opts.insert(
            "args".to_string(),
            Value::Array(args.into_iter().map(Value::String).collect()),
        );

        // Images and JavaScript stay enabled; plugins, popups, geolocation
        // and media streams are blocked.
        let mut prefs = serde_json::map::Map::new();
        prefs.insert(
            "profile.default_content_setting_values.images".to_string(),
            1.into(),
        );
        prefs.insert(
            "profile.managed_default_content_settings.javascript".to_string(),
            1.into(),
        );
        prefs.insert(
            "profile.managed_default_content_settings.plugins".to_string(),
            2.into(),
        );
        prefs.insert(
            "profile.managed_default_content_settings.popups".to_string(),
            2.into(),
        );
        prefs.insert(
            "profile.managed_default_content_settings.geolocation".to_string(),
            2.into(),
        );
        prefs.insert(
            "profile.managed_default_content_settings.media_stream".to_string(),
            2.into(),
        );
        chrome_opts.insert("prefs".to_string(), Value::Object(prefs));

        caps.insert("goog:chromeOptions".to_string(), Value::Object(chrome_opts));

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(webdriver_url)
            .await?;

        client.set_window_size(viewport.0, viewport.1).await?;

        Ok(Self { client, viewport })
    }

    async fn attempt_navigation(&self, url: &str, strategy: NavStrategy) -> anyhow::Result<()> {
        self.client.goto(url).await?;
        self.client
            .wait()
            .forever()
            .for_element(Locator::Css("body"))
            .await?;

        if strategy.wait != ReadyWait::Body {
            // Bounded by the caller's strategy deadline
            loop {
                let state = self
                    .client
                    .execute("return document.readyState;", vec![])
                    .await?;
                if strategy.wait.reached(state.as_str().unwrap_or("loading")) {
                    break;
                }
                sleep(READY_STATE_POLL).await;
            }
        }
        if strategy.wait == ReadyWait::Settled {
            // Grace period for client-rendered frameworks to paint
            sleep(DYNAMIC_CONTENT_SETTLE).await;
        }
        Ok(())
    }
}

#[async_trait]
impl PageDriver for WebDriverPage {
    async fn navigate(&self, url: &str) -> Result<(), ScrapeError> {
        let mut last_failure = String::from("no strategies attempted");

        for (i, strategy) in NAV_STRATEGIES.iter().enumerate() {
            debug!(
                "Navigation attempt {} ({}, timeout {:?}): {}",
                i + 1,
                strategy.name,
                strategy.timeout,
                url
            );
            match timeout(strategy.timeout, self.attempt_navigation(url, *strategy)).await {
                Ok(Ok(())) => {
                    info!("Navigation succeeded with {} strategy: {}", strategy.name, url);
                    return Ok(());
                }
                Ok(Err(e)) => {
                    last_failure = format!("{} strategy failed: {}", strategy.name, e);
                }
                Err(_) => {
                    last_failure = format!(
                        "{} strategy timed out after {:?}",
                        strategy.name, strategy.timeout
                    );
                }
            }
            warn!("{}", last_failure);
        }

        Err(ScrapeError::Navigation(format!(
            "all navigation strategies exhausted for {}: {}",
            url, last_failure
        )))
    }

    async fn evaluate(&self, script: &str) -> Result<Value, ScrapeError> {
        self.client
            .execute(script, vec![])
            .await
            .map_err(|e| ScrapeError::Extraction(format!("script evaluation failed: {}", e)))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, ScrapeError> {
        // WebDriver captures the viewport, so grow the window to the
        // document height (capped) to approximate a full-page capture.
        let height = self
            .evaluate(scripts::DOCUMENT_HEIGHT)
            .await
            .ok()
            .and_then(|v| v.as_u64())
            .map(|h| h as u32)
            .unwrap_or(self.viewport.1)
            .clamp(self.viewport.1, MAX_CAPTURE_HEIGHT);

        if height > self.viewport.1 {
            if let Err(e) = self.client.set_window_size(self.viewport.0, height).await {
                warn!("Failed to grow window for full-page capture: {}", e);
            } else {
                sleep(Duration::from_millis(200)).await;
            }
        }

        self.client
            .screenshot()
            .await
            .map_err(|e| ScrapeError::Extraction(format!("screenshot capture failed: {}", e)))
    }

    async fn close(self: Box<Self>) -> Result<(), ScrapeError> {
        self.client
            .close()
            .await
            .map_err(|e| ScrapeError::Browser(format!("session close failed: {}", e)))
    }
}
