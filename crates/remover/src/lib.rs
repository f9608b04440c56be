//! Watch Later remover - removal strategies and the reconciliation engine
//!
//! This crate takes pending tasks from a task source and removes the
//! referenced videos from the Watch Later playlist, either through the
//! playlist API or by driving the site in a browser.

pub mod api;
mod engine;
mod error;
mod retry;
mod strategy;
pub mod ui;

pub use api::{ApiRemoval, Credentials, PlaylistScanner, YouTubeClient};
pub use engine::ReconciliationEngine;
pub use error::{RemovalError, Result};
pub use retry::RetryPolicy;
pub use strategy::RemovalStrategy;
pub use ui::{UiAutomationRemoval, WebDriverLauncher};
