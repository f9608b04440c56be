//! Browser automation removal strategy

mod driver;
mod machine;
mod removal;
mod wait;
mod webdriver;

pub use driver::{BrowserDriver, DriverLauncher, ElementRef};
pub use machine::{UiFlow, UiState};
pub use removal::UiAutomationRemoval;
pub use wait::{wait_for, WaitSpec};
pub use webdriver::{WebDriverClient, WebDriverLauncher};
