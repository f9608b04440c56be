//! W3C WebDriver client
//!
//! Talks to a running driver server (chromedriver or compatible) over HTTP.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use tracing::{debug, info};

use wl_core::config::{Locator, UiConfig};

use super::driver::{BrowserDriver, DriverLauncher, ElementRef};
use crate::error::{RemovalError, Result};

/// Key of an element reference in W3C payloads
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f71ee0a4f5c";
const HIDE_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";
const CLICK_SCRIPT: &str = "arguments[0].click();";

fn http_client() -> Result<Client> {
    Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(|e| RemovalError::webdriver("client", e.to_string()))
}

async fn send_command(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request
        .send()
        .await
        .map_err(|e| RemovalError::webdriver("connection", format!("{}: {}", url, e)))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| RemovalError::webdriver("connection", e.to_string()))?;
    let payload: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text)?
    };

    if status.is_success() {
        return Ok(payload.get("value").cloned().unwrap_or(Value::Null));
    }

    let value = &payload["value"];
    let error = value["error"].as_str().unwrap_or("unknown error").to_string();
    let message = value["message"]
        .as_str()
        .map(|m| m.lines().next().unwrap_or_default().to_string())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    Err(RemovalError::WebDriver { error, message })
}

fn locator_payload(locator: &Locator) -> Value {
    let (using, value) = match locator {
        Locator::Css(v) => ("css selector", v),
        Locator::Xpath(v) => ("xpath", v),
        Locator::Tag(v) => ("tag name", v),
    };
    json!({ "using": using, "value": value })
}

/// An open WebDriver session
pub struct WebDriverClient {
    client: Client,
    session_url: String,
    closed: AtomicBool,
}

impl WebDriverClient {
    /// Start a session with the given capabilities
    pub async fn connect(server_url: &str, capabilities: Value) -> Result<Self> {
        let client = http_client()?;
        let base = server_url.trim_end_matches('/');
        let value = send_command(
            &client,
            Method::POST,
            &format!("{}/session", base),
            Some(json!({ "capabilities": capabilities })),
        )
        .await?;

        let session_id = value["sessionId"]
            .as_str()
            .ok_or_else(|| RemovalError::webdriver("session not created", "response has no sessionId"))?;
        info!("Started WebDriver session {}", session_id);

        Ok(Self {
            client,
            session_url: format!("{}/session/{}", base, session_id),
            closed: AtomicBool::new(false),
        })
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RemovalError::SessionClosed);
        }
        let url = format!("{}{}", self.session_url, path);
        send_command(&self.client, method, &url, body).await
    }

    fn element_path(element: &ElementRef, suffix: &str) -> String {
        format!("/element/{}/{}", urlencoding::encode(&element.0), suffix)
    }
}

#[async_trait]
impl BrowserDriver for WebDriverClient {
    async fn navigate(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn find(&self, locator: &Locator) -> Result<Option<ElementRef>> {
        match self
            .command(Method::POST, "/element", Some(locator_payload(locator)))
            .await
        {
            Ok(value) => Ok(value[ELEMENT_KEY].as_str().map(|id| ElementRef(id.to_string()))),
            Err(RemovalError::WebDriver { error, .. }) if error == "no such element" => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn is_clickable(&self, element: &ElementRef) -> Result<bool> {
        let displayed = self
            .command(Method::GET, &Self::element_path(element, "displayed"), None)
            .await?;
        if !displayed.as_bool().unwrap_or(false) {
            return Ok(false);
        }
        let enabled = self
            .command(Method::GET, &Self::element_path(element, "enabled"), None)
            .await?;
        Ok(enabled.as_bool().unwrap_or(false))
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        let path = Self::element_path(element, &format!("attribute/{}", urlencoding::encode(name)));
        let value = self.command(Method::GET, &path, None).await?;
        Ok(match value {
            Value::String(s) => Some(s),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({
                "script": CLICK_SCRIPT,
                "args": [{ ELEMENT_KEY: element.0 }]
            })),
        )
        .await
        .map(|_| ())
    }

    async fn execute(&self, script: &str) -> Result<Value> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": [] })),
        )
        .await
    }

    async fn quit(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let url = self.session_url.clone();
        send_command(&self.client, Method::DELETE, &url, None).await?;
        info!("Closed WebDriver session");
        Ok(())
    }
}

/// Launches Chrome sessions through a WebDriver server
pub struct WebDriverLauncher {
    config: UiConfig,
}

impl WebDriverLauncher {
    pub fn new(config: UiConfig) -> Self {
        Self { config }
    }

    /// Session capabilities for the configured browser profile
    pub fn capabilities(&self) -> Value {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-extensions".to_string(),
            "--disable-popup-blocking".to_string(),
            format!(
                "--window-size={},{}",
                self.config.window_size.0, self.config.window_size.1
            ),
        ];
        if let Some(dir) = &self.config.user_data_dir {
            let dir = std::path::absolute(dir).unwrap_or_else(|_| dir.clone());
            args.push(format!("--user-data-dir={}", dir.display()));
        }
        if let Some(profile) = &self.config.profile_directory {
            args.push(format!("--profile-directory={}", profile));
        }
        if self.config.headless {
            args.push("--headless=new".to_string());
        }

        json!({
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": {
                    "args": args,
                    "excludeSwitches": ["enable-automation"]
                }
            }
        })
    }
}

#[async_trait]
impl DriverLauncher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserDriver>> {
        let client = WebDriverClient::connect(&self.config.webdriver_url, self.capabilities()).await?;
        if let Err(e) = client.execute(HIDE_WEBDRIVER_SCRIPT).await {
            let _ = client.quit().await;
            return Err(e);
        }
        Ok(Box::new(client))
    }
}
