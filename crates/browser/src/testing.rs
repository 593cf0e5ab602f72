//! Scripted page driver for tests
//!
//! [`MockPageDriver`] plays back visibility and text schedules so the retry
//! loops can be exercised deterministically without a browser. Every
//! interaction is recorded for assertions.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::driver::PageDriver;
use crate::error::{BrowserError, Result};

#[derive(Debug)]
enum Visibility {
    Constant(bool),
    /// Invisible for the first `n` checks, visible afterwards.
    AfterChecks(u32),
    /// Visible for the first `n` checks, gone afterwards.
    ForChecks(u32),
}

impl Visibility {
    fn check(&mut self) -> bool {
        match self {
            Visibility::Constant(v) => *v,
            Visibility::AfterChecks(n) => {
                if *n == 0 {
                    true
                } else {
                    *n -= 1;
                    false
                }
            }
            Visibility::ForChecks(n) => {
                if *n == 0 {
                    false
                } else {
                    *n -= 1;
                    true
                }
            }
        }
    }

    /// Non-consuming peek for interactions that only need presence.
    fn peek(&self) -> bool {
        match self {
            Visibility::Constant(v) => *v,
            Visibility::AfterChecks(n) => *n == 0,
            Visibility::ForChecks(n) => *n > 0,
        }
    }
}

#[derive(Default)]
struct MockState {
    visibility: HashMap<String, Visibility>,
    /// Successive `texts()` results per selector; the last entry repeats.
    texts: HashMap<String, (usize, Vec<Vec<String>>)>,
    input_values: HashMap<String, String>,
    eval_results: HashMap<String, Value>,
    clicks: Vec<String>,
    fills: Vec<(String, String)>,
    selections: Vec<(String, String)>,
    visited: Vec<String>,
}

/// Deterministic [`PageDriver`] for unit tests.
#[derive(Default)]
pub struct MockPageDriver {
    state: Mutex<MockState>,
}

impl MockPageDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Element is always (in)visible.
    pub fn set_visible(&self, selector: &str, visible: bool) {
        self.state
            .lock()
            .visibility
            .insert(selector.to_string(), Visibility::Constant(visible));
    }

    /// Element becomes visible after `checks` visibility checks.
    pub fn visible_after(&self, selector: &str, checks: u32) {
        self.state
            .lock()
            .visibility
            .insert(selector.to_string(), Visibility::AfterChecks(checks));
    }

    /// Element stays visible for `checks` visibility checks, then vanishes.
    pub fn visible_for(&self, selector: &str, checks: u32) {
        self.state
            .lock()
            .visibility
            .insert(selector.to_string(), Visibility::ForChecks(checks));
    }

    /// Successive `texts()` results for a selector; the last entry repeats.
    pub fn texts_schedule(&self, selector: &str, schedule: Vec<Vec<String>>) {
        self.state
            .lock()
            .texts
            .insert(selector.to_string(), (0, schedule));
    }

    pub fn set_input_value(&self, selector: &str, value: &str) {
        self.state
            .lock()
            .input_values
            .insert(selector.to_string(), value.to_string());
    }

    pub fn set_eval_result(&self, script: &str, value: Value) {
        self.state
            .lock()
            .eval_results
            .insert(script.to_string(), value);
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().clicks.clone()
    }

    pub fn click_count(&self, selector: &str) -> usize {
        self.state
            .lock()
            .clicks
            .iter()
            .filter(|s| s.as_str() == selector)
            .count()
    }

    pub fn fills(&self) -> Vec<(String, String)> {
        self.state.lock().fills.clone()
    }

    pub fn selections(&self) -> Vec<(String, String)> {
        self.state.lock().selections.clone()
    }

    pub fn visited(&self) -> Vec<String> {
        self.state.lock().visited.clone()
    }
}

#[async_trait]
impl PageDriver for MockPageDriver {
    async fn goto(&self, url: &str) -> Result<()> {
        self.state.lock().visited.push(url.to_string());
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.state
            .lock()
            .fills
            .push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.state.lock().clicks.push(selector.to_string());
        Ok(())
    }

    async fn try_click(&self, selector: &str) -> Result<bool> {
        let mut state = self.state.lock();
        let present = state
            .visibility
            .get(selector)
            .map(Visibility::peek)
            .unwrap_or(false);
        if present {
            state.clicks.push(selector.to_string());
        }
        Ok(present)
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        let mut state = self.state.lock();
        Ok(state
            .visibility
            .get_mut(selector)
            .map(Visibility::check)
            .unwrap_or(false))
    }

    async fn texts(&self, selector: &str) -> Result<Vec<String>> {
        let mut state = self.state.lock();
        Ok(match state.texts.get_mut(selector) {
            Some((cursor, schedule)) => {
                let entry = schedule
                    .get(*cursor)
                    .or_else(|| schedule.last())
                    .cloned()
                    .unwrap_or_default();
                *cursor += 1;
                entry
            }
            None => Vec::new(),
        })
    }

    async fn input_value(&self, selector: &str) -> Result<Option<String>> {
        Ok(self.state.lock().input_values.get(selector).cloned())
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        self.state
            .lock()
            .selections
            .push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        // Consume visibility checks the way a polling wait would.
        for _ in 0..50 {
            if self.is_visible(selector).await? {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Err(BrowserError::timeout(selector.to_string(), timeout))
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        Ok(self
            .state
            .lock()
            .eval_results
            .get(script)
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn scroll_by(&self, _y: i64) -> Result<()> {
        Ok(())
    }
}
