//! Removal by driving the site's save dialog in a browser

use std::io::BufRead;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

use wl_core::config::UiConfig;
use wl_core::task::{ContentId, Outcome};

use super::driver::{BrowserDriver, DriverLauncher};
use super::machine::UiFlow;
use crate::error::{RemovalError, Result};
use crate::strategy::RemovalStrategy;

/// Browser-driven removal holding one session for the whole run
pub struct UiAutomationRemoval {
    launcher: Arc<dyn DriverLauncher>,
    config: UiConfig,
    session: Mutex<Option<Box<dyn BrowserDriver>>>,
}

impl UiAutomationRemoval {
    pub fn new(launcher: Arc<dyn DriverLauncher>, config: UiConfig) -> Self {
        Self {
            launcher,
            config,
            session: Mutex::new(None),
        }
    }

    pub async fn is_open(&self) -> bool {
        self.session.lock().await.is_some()
    }

    async fn wait_for_login(&self, driver: &dyn BrowserDriver) -> Result<()> {
        driver.navigate(&self.config.site_url).await?;
        info!("Log in to {} in the browser window, then press Enter", self.config.site_url);
        tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| ())
        })
        .await
        .map_err(|e| RemovalError::webdriver("login", e.to_string()))??;
        Ok(())
    }
}

#[async_trait]
impl RemovalStrategy for UiAutomationRemoval {
    fn name(&self) -> &'static str {
        "ui"
    }

    async fn open(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        if session.is_some() {
            return Ok(());
        }

        let driver = self.launcher.launch().await?;
        if self.config.manual_login {
            if let Err(e) = self.wait_for_login(driver.as_ref()).await {
                let _ = driver.quit().await;
                return Err(e);
            }
        }
        *session = Some(driver);
        Ok(())
    }

    async fn remove(&self, content_id: &ContentId) -> Outcome {
        let session = self.session.lock().await;
        let Some(driver) = session.as_ref() else {
            return Outcome::failed(RemovalError::SessionClosed.into_failure("page_requested"));
        };

        let mut flow = UiFlow::new(&**driver, &self.config);
        let outcome = flow.run(content_id).await;
        info!("UI removal of {}: {} (last state {:?})", content_id, outcome, flow.state());
        outcome
    }

    async fn close(&self) {
        if let Some(driver) = self.session.lock().await.take() {
            if let Err(e) = driver.quit().await {
                warn!("Failed to close browser session: {}", e);
            }
        }
    }
}
