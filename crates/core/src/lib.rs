//! Core library for the Watch Later reconciler
//!
//! This crate contains the shared domain model and the task source:
//! - Run configuration
//! - Task, content id and outcome types
//! - The run report
//! - The Notion-backed task source

pub mod config;
pub mod error;
pub mod notion;
pub mod report;
pub mod task;

pub use config::{ReconcileConfig, StrategyKind};
pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
