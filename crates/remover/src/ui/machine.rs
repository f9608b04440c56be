//! Save-dialog interaction flow for one watch page

use std::fmt;

use tokio::time::sleep;
use tracing::{debug, info};

use wl_core::config::{Locator, UiConfig};
use wl_core::task::{ContentId, Outcome};

use super::driver::{BrowserDriver, ElementRef};
use super::wait::{wait_for, WaitSpec};
use crate::error::{RemovalError, Result};

/// Position of the flow on the watch page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState {
    /// Navigation issued
    PageRequested,
    /// Page container present and settled
    ContentLoaded,
    /// Video metadata rendered
    MetadataReady,
    /// Page reports the video as unavailable
    Unavailable,
    OverflowMenuOpen,
    SaveDialogOpen,
    /// Watch-later checkbox located and its state read
    CheckboxStateRead { checked: bool },
    /// Checkbox clicked to remove the entry
    Toggled,
    /// Checkbox already unchecked, nothing clicked
    AlreadyUnset,
    Done,
}

impl UiState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageRequested => "page_requested",
            Self::ContentLoaded => "content_loaded",
            Self::MetadataReady => "metadata_ready",
            Self::Unavailable => "unavailable",
            Self::OverflowMenuOpen => "overflow_menu_open",
            Self::SaveDialogOpen => "save_dialog_open",
            Self::CheckboxStateRead { .. } => "checkbox_state_read",
            Self::Toggled => "toggled",
            Self::AlreadyUnset => "already_unset",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for UiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

enum PageContent {
    Metadata,
    Unavailable,
}

/// Drives one removal through the watch page
///
/// Every transition waits for its element with the configured timeout.
/// A failed step ends the flow with a failure naming the state it was
/// trying to reach.
pub struct UiFlow<'a> {
    driver: &'a dyn BrowserDriver,
    config: &'a UiConfig,
    history: Vec<UiState>,
}

impl<'a> UiFlow<'a> {
    pub fn new(driver: &'a dyn BrowserDriver, config: &'a UiConfig) -> Self {
        Self {
            driver,
            config,
            history: Vec::new(),
        }
    }

    /// States reached so far, in order
    pub fn history(&self) -> &[UiState] {
        &self.history
    }

    pub fn state(&self) -> Option<UiState> {
        self.history.last().copied()
    }

    pub async fn run(&mut self, content_id: &ContentId) -> Outcome {
        match self.drive(content_id).await {
            Ok(outcome) => outcome,
            Err((target, e)) => {
                info!(
                    "UI flow for {} stopped before {}: {}",
                    content_id, target, e
                );
                Outcome::failed(e.into_failure(target.as_str()))
            }
        }
    }

    async fn drive(
        &mut self,
        content_id: &ContentId,
    ) -> std::result::Result<Outcome, (UiState, RemovalError)> {
        let config = self.config;
        let selectors = &config.selectors;

        let url = config.watch_url(content_id.as_str());
        self.driver
            .navigate(&url)
            .await
            .map_err(|e| (UiState::PageRequested, e))?;
        self.enter(UiState::PageRequested);

        self.present(&selectors.page_container, "page container")
            .await
            .map_err(|e| (UiState::ContentLoaded, e))?;
        sleep(config.load_settle()).await;
        self.enter(UiState::ContentLoaded);

        match self
            .content()
            .await
            .map_err(|e| (UiState::MetadataReady, e))?
        {
            PageContent::Metadata => self.enter(UiState::MetadataReady),
            PageContent::Unavailable => {
                self.enter(UiState::Unavailable);
                info!("{} is unavailable", content_id);
                return Ok(Outcome::NotFound);
            }
        }

        self.click_when_ready(&selectors.overflow_menu, "overflow menu")
            .await
            .map_err(|e| (UiState::OverflowMenuOpen, e))?;
        self.enter(UiState::OverflowMenuOpen);

        self.click_when_ready(&selectors.save_entry, "save menu entry")
            .await
            .map_err(|e| (UiState::SaveDialogOpen, e))?;
        self.enter(UiState::SaveDialogOpen);

        let read = UiState::CheckboxStateRead { checked: false };
        let checkbox = self
            .present(&selectors.watch_later_checkbox, "watch later checkbox")
            .await
            .map_err(|e| (read, e))?;
        let state = self
            .driver
            .attribute(&checkbox, &selectors.checked_attribute)
            .await
            .map_err(|e| (read, e))?;
        let checked = match state.as_deref() {
            Some("true") => true,
            Some("false") => false,
            other => {
                let what = format!(
                    "checked state ({} = {:?})",
                    selectors.checked_attribute, other
                );
                return Err((read, RemovalError::element_missing(what)));
            }
        };
        self.enter(UiState::CheckboxStateRead { checked });

        if !checked {
            self.enter(UiState::AlreadyUnset);
            self.enter(UiState::Done);
            return Ok(Outcome::AlreadyAbsent);
        }

        self.driver
            .click(&checkbox)
            .await
            .map_err(|e| (UiState::Toggled, e))?;
        sleep(config.click_settle()).await;
        self.enter(UiState::Toggled);
        self.enter(UiState::Done);
        Ok(Outcome::Removed)
    }

    fn enter(&mut self, state: UiState) {
        debug!("UI state -> {}", state);
        self.history.push(state);
    }

    fn wait_spec(&self) -> WaitSpec {
        WaitSpec::new(self.config.element_timeout(), self.config.poll_interval())
    }

    async fn present(&self, locator: &Locator, what: &str) -> Result<ElementRef> {
        let driver = self.driver;
        wait_for(what, self.wait_spec(), move || driver.find(locator)).await
    }

    async fn content(&self) -> Result<PageContent> {
        let driver = self.driver;
        let selectors = &self.config.selectors;
        wait_for("video metadata", self.wait_spec(), move || async move {
            if driver.find(&selectors.metadata).await?.is_some() {
                return Ok(Some(PageContent::Metadata));
            }
            if driver.find(&selectors.unavailable).await?.is_some() {
                return Ok(Some(PageContent::Unavailable));
            }
            Ok::<_, RemovalError>(None)
        })
        .await
    }

    async fn click_when_ready(&self, locator: &Locator, what: &str) -> Result<()> {
        let driver = self.driver;
        let element = wait_for(what, self.wait_spec(), move || async move {
            let Some(element) = driver.find(locator).await? else {
                return Ok(None);
            };
            let clickable = driver.is_clickable(&element).await?;
            Ok::<_, RemovalError>(clickable.then_some(element))
        })
        .await?;
        driver.click(&element).await?;
        sleep(self.config.click_settle()).await;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use wl_core::task::FailureReason;

    /// Page model keyed by locator text
    #[derive(Default)]
    pub(crate) struct FakePage {
        pub elements: Mutex<HashMap<String, String>>,
        pub disabled: Mutex<HashSet<String>>,
        pub attributes: Mutex<HashMap<(String, String), String>>,
        pub navigations: Mutex<Vec<String>>,
        pub clicks: Mutex<Vec<String>>,
        pub quits: Mutex<u32>,
    }

    impl FakePage {
        /// Watch page with every element of the save flow present
        pub fn watch_page(config: &UiConfig, checked: bool) -> Self {
            let page = Self::default();
            let s = &config.selectors;
            for (locator, id) in [
                (&s.page_container, "container"),
                (&s.metadata, "metadata"),
                (&s.overflow_menu, "overflow"),
                (&s.save_entry, "save"),
                (&s.watch_later_checkbox, "checkbox"),
            ] {
                page.add(locator, id);
            }
            page.attributes.lock().unwrap().insert(
                ("checkbox".to_string(), s.checked_attribute.clone()),
                checked.to_string(),
            );
            page
        }

        pub fn add(&self, locator: &Locator, id: &str) {
            self.elements
                .lock()
                .unwrap()
                .insert(locator.to_string(), id.to_string());
        }

        pub fn remove(&self, locator: &Locator) {
            self.elements.lock().unwrap().remove(&locator.to_string());
        }

        pub fn clicks(&self) -> Vec<String> {
            self.clicks.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BrowserDriver for FakePage {
        async fn navigate(&self, url: &str) -> Result<()> {
            self.navigations.lock().unwrap().push(url.to_string());
            Ok(())
        }

        async fn find(&self, locator: &Locator) -> Result<Option<ElementRef>> {
            Ok(self
                .elements
                .lock()
                .unwrap()
                .get(&locator.to_string())
                .map(|id| ElementRef(id.clone())))
        }

        async fn is_clickable(&self, element: &ElementRef) -> Result<bool> {
            Ok(!self.disabled.lock().unwrap().contains(&element.0))
        }

        async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
            Ok(self
                .attributes
                .lock()
                .unwrap()
                .get(&(element.0.clone(), name.to_string()))
                .cloned())
        }

        async fn click(&self, element: &ElementRef) -> Result<()> {
            self.clicks.lock().unwrap().push(element.0.clone());
            Ok(())
        }

        async fn execute(&self, _script: &str) -> Result<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }

        async fn quit(&self) -> Result<()> {
            *self.quits.lock().unwrap() += 1;
            Ok(())
        }
    }

    pub(crate) fn fast_config() -> UiConfig {
        UiConfig {
            element_timeout_ms: 30,
            poll_interval_ms: 5,
            load_settle_ms: 0,
            click_settle_ms: 0,
            ..UiConfig::default()
        }
    }

    fn id() -> ContentId {
        ContentId::new("abc123").unwrap()
    }

    #[tokio::test]
    async fn test_checked_box_is_toggled() {
        let config = fast_config();
        let page = FakePage::watch_page(&config, true);
        let mut flow = UiFlow::new(&page, &config);

        assert_eq!(flow.run(&id()).await, Outcome::Removed);
        assert_eq!(page.clicks(), vec!["overflow", "save", "checkbox"]);
        assert_eq!(
            page.navigations.lock().unwrap().as_slice(),
            ["https://www.youtube.com/watch?v=abc123".to_string()]
        );
        assert_eq!(
            flow.history(),
            &[
                UiState::PageRequested,
                UiState::ContentLoaded,
                UiState::MetadataReady,
                UiState::OverflowMenuOpen,
                UiState::SaveDialogOpen,
                UiState::CheckboxStateRead { checked: true },
                UiState::Toggled,
                UiState::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_unchecked_box_is_left_alone() {
        let config = fast_config();
        let page = FakePage::watch_page(&config, false);
        let mut flow = UiFlow::new(&page, &config);

        assert_eq!(flow.run(&id()).await, Outcome::AlreadyAbsent);
        assert_eq!(page.clicks(), vec!["overflow", "save"]);
        assert!(flow.history().contains(&UiState::AlreadyUnset));
        assert!(!flow.history().contains(&UiState::Toggled));
        assert_eq!(flow.state(), Some(UiState::Done));
    }

    #[tokio::test]
    async fn test_missing_overflow_menu_times_out() {
        let config = fast_config();
        let page = FakePage::watch_page(&config, true);
        page.remove(&config.selectors.overflow_menu);
        let mut flow = UiFlow::new(&page, &config);

        let outcome = flow.run(&id()).await;
        match &outcome {
            Outcome::Failed {
                reason: FailureReason::TimeoutOrElementMissing { step, .. },
            } => assert_eq!(step, "overflow_menu_open"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(outcome.is_retryable());
        assert_eq!(flow.state(), Some(UiState::MetadataReady));
        assert!(page.clicks().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_save_entry_times_out() {
        let config = fast_config();
        let page = FakePage::watch_page(&config, true);
        page.disabled.lock().unwrap().insert("save".to_string());
        let mut flow = UiFlow::new(&page, &config);

        let outcome = flow.run(&id()).await;
        assert!(matches!(
            outcome,
            Outcome::Failed {
                reason: FailureReason::TimeoutOrElementMissing { ref step, .. }
            } if step == "save_dialog_open"
        ));
        assert_eq!(page.clicks(), vec!["overflow"]);
    }

    #[tokio::test]
    async fn test_checkbox_without_state_is_not_read_as_unchecked() {
        let config = fast_config();
        let page = FakePage::watch_page(&config, true);
        page.attributes.lock().unwrap().clear();
        let mut flow = UiFlow::new(&page, &config);

        let outcome = flow.run(&id()).await;
        assert!(matches!(
            outcome,
            Outcome::Failed {
                reason: FailureReason::TimeoutOrElementMissing { ref step, .. }
            } if step == "checkbox_state_read"
        ));
        assert!(!outcome.is_success());
        assert_eq!(page.clicks(), vec!["overflow", "save"]);
        assert_eq!(flow.state(), Some(UiState::SaveDialogOpen));
    }

    #[tokio::test]
    async fn test_unexpected_checkbox_state_fails() {
        let config = fast_config();
        let page = FakePage::watch_page(&config, true);
        page.attributes.lock().unwrap().insert(
            ("checkbox".to_string(), config.selectors.checked_attribute.clone()),
            "mixed".to_string(),
        );
        let mut flow = UiFlow::new(&page, &config);

        let outcome = flow.run(&id()).await;
        assert!(outcome.is_retryable());
        assert!(!page.clicks().contains(&"checkbox".to_string()));
    }

    #[tokio::test]
    async fn test_unavailable_page_is_not_found() {
        let config = fast_config();
        let page = FakePage::watch_page(&config, true);
        page.remove(&config.selectors.metadata);
        page.add(&config.selectors.unavailable, "reason");
        let mut flow = UiFlow::new(&page, &config);

        assert_eq!(flow.run(&id()).await, Outcome::NotFound);
        assert_eq!(flow.state(), Some(UiState::Unavailable));
        assert!(page.clicks().is_empty());
    }

    #[test]
    fn test_state_names() {
        assert_eq!(UiState::CheckboxStateRead { checked: true }.as_str(), "checkbox_state_read");
        assert_eq!(UiState::OverflowMenuOpen.to_string(), "overflow_menu_open");
    }
}
