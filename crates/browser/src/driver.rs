//! The page capability the scenarios are written against
//!
//! The browser engine and its protocol stay behind this trait: scenarios and
//! the retry loops only fill named fields, click named controls, and test
//! visibility or text of named elements. Selectors are plain strings owned
//! by [`crate::selectors::ConsoleSelectors`]; the console's DOM is an
//! unstable external contract, not something this crate models.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate the page to `url`.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Fill an input identified by `selector` with `value`.
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    /// Click the element identified by `selector`; the element must exist.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Click an element that may legitimately be absent (consent dialogs).
    /// Returns whether a click happened; absence is not an error.
    async fn try_click(&self, selector: &str) -> Result<bool>;

    /// Whether the first element matching `selector` is currently visible.
    async fn is_visible(&self, selector: &str) -> Result<bool>;

    /// Text contents of every element matching `selector`.
    async fn texts(&self, selector: &str) -> Result<Vec<String>>;

    /// Current value of the first matching input, if it is rendered.
    async fn input_value(&self, selector: &str) -> Result<Option<String>>;

    /// Select `value` in a `<select>` element.
    async fn select_option(&self, selector: &str, value: &str) -> Result<()>;

    /// Wait until an element matching `selector` is visible, bounded by
    /// `timeout`. A timeout is an error.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Evaluate a JavaScript expression in the page and return its value.
    async fn evaluate(&self, script: &str) -> Result<Value>;

    /// Scroll the page vertically by `y` pixels.
    async fn scroll_by(&self, y: i64) -> Result<()>;
}
