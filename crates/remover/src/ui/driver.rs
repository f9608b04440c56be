//! Browser automation driver interface

use async_trait::async_trait;

use wl_core::config::Locator;

use crate::error::Result;

/// Opaque handle to an element in the current page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

/// Commands the UI flow needs from a browser session
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Load a URL in the current window
    async fn navigate(&self, url: &str) -> Result<()>;

    /// First element matching the locator, `None` when absent
    async fn find(&self, locator: &Locator) -> Result<Option<ElementRef>>;

    /// Displayed and enabled
    async fn is_clickable(&self, element: &ElementRef) -> Result<bool>;

    async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>>;

    /// Click through script, bypassing overlays that intercept pointer events
    async fn click(&self, element: &ElementRef) -> Result<()>;

    async fn execute(&self, script: &str) -> Result<serde_json::Value>;

    /// End the session; further commands fail
    async fn quit(&self) -> Result<()>;
}

/// Starts browser sessions
#[async_trait]
pub trait DriverLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserDriver>>;
}
