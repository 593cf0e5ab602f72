//! Nodeharness browser automation
//!
//! Drives the admin console through an opaque page capability:
//!
//! - [`driver::PageDriver`] — the capability itself (fill, click, visibility,
//!   text/value extraction, waits).
//! - [`bridge::BrowserSession`] — production implementation: a persistent
//!   Playwright bridge subprocess speaking newline-delimited JSON, with
//!   guaranteed teardown on drop.
//! - [`auth::Authenticator`] — bounded-retry login and rejection detection.
//! - [`nodes::NodeWizard`] — node resource lifecycle (delete, create,
//!   endpoint and API-key extraction).
//! - [`testing::MockPageDriver`] — scripted driver for exercising the retry
//!   loops without a browser.

pub mod auth;
pub mod bridge;
pub mod driver;
pub mod error;
pub mod nodes;
pub mod selectors;
pub mod testing;

pub use auth::{AuthSettings, Authenticator, Credentials, LoginOutcome, RejectionOutcome};
pub use bridge::{BrowserConfig, BrowserSession};
pub use driver::PageDriver;
pub use error::{BrowserError, Result};
pub use nodes::{NodeEndpoints, NodeWizard, WizardSettings};
pub use selectors::ConsoleSelectors;
