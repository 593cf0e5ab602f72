//! Bounded-retry authentication against the console login form
//!
//! The login flow cannot observe why the console is slow: wrong credentials
//! and transient delay both look like "the success indicator has not appeared
//! yet", so the success-oriented flow only retries under a fixed budget and
//! reports what it saw. A separate rejection flow exists for asserting that
//! invalid credentials surface an explicit "Unauthorized" message.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::driver::PageDriver;
use crate::error::Result;
use crate::selectors::ConsoleSelectors;

/// Login credentials for one attempt. Immutable for a test run.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Retry budgets and pacing for the login flows.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Attempts in the success-oriented loop.
    pub max_retries: u32,
    /// Attempts in the rejection loop; larger, since failure is the
    /// expected terminal state there.
    pub rejection_retries: u32,
    /// Delay between retry attempts.
    pub attempt_delay: Duration,
    /// Settling delay between form-fill steps.
    pub step_delay: Duration,
    /// Settling delay right after the first submit.
    pub submit_settle: Duration,
    /// Substring that marks an explicit rejection message.
    pub rejection_marker: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            max_retries: 10,
            rejection_retries: 30,
            attempt_delay: Duration::from_millis(2_200),
            step_delay: Duration::from_millis(1_000),
            submit_settle: Duration::from_millis(700),
            rejection_marker: "Unauthorized".to_string(),
        }
    }
}

/// What the success-oriented login loop observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The success indicator became visible.
    Authenticated,
    /// The submit control disappeared before the success indicator was
    /// seen. A navigation probably happened, but the caller must re-verify;
    /// this is never treated as success here.
    Ambiguous,
    /// The retry budget ran out with the form still on screen.
    RetriesExhausted,
}

/// What the rejection loop observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionOutcome {
    /// An error message containing the rejection marker was rendered.
    Rejected,
    /// The budget ran out without an explicit rejection. Callers decide how
    /// hard to fail on this.
    Inconclusive,
}

/// Drives the login form through a [`PageDriver`].
pub struct Authenticator<'a, D: PageDriver + ?Sized> {
    driver: &'a D,
    selectors: ConsoleSelectors,
    settings: AuthSettings,
}

impl<'a, D: PageDriver + ?Sized> Authenticator<'a, D> {
    pub fn new(driver: &'a D) -> Self {
        Self {
            driver,
            selectors: ConsoleSelectors::default(),
            settings: AuthSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: AuthSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_selectors(mut self, selectors: ConsoleSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Fill and submit the form. The consent dialog may or may not exist;
    /// its absence is a no-op.
    async fn submit_form(&self, credentials: &Credentials) -> Result<()> {
        let d = self.driver;
        let s = &self.selectors;

        d.scroll_by(400).await?;
        if !d.try_click(&s.cookie_accept).await? {
            debug!("cookie dialog not present, continuing");
        }

        d.fill(&s.email_field, &credentials.email).await?;
        sleep(self.settings.step_delay).await;
        d.fill(&s.password_field, &credentials.password).await?;
        sleep(self.settings.step_delay).await;

        d.scroll_by(400).await?;
        sleep(self.settings.step_delay).await;

        d.click(&s.submit_button).await?;
        sleep(self.settings.submit_settle).await;
        Ok(())
    }

    /// Log in and report what was observed. The budgets are counted, not
    /// timed: each attempt may re-click the submit control.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome> {
        let d = self.driver;
        let s = &self.selectors;

        self.submit_form(credentials).await?;

        for attempt in 1..=self.settings.max_retries {
            sleep(self.settings.attempt_delay).await;

            if d.is_visible(&s.dashboard_indicator).await? {
                info!(attempt, "login confirmed by dashboard indicator");
                return Ok(LoginOutcome::Authenticated);
            }

            if d.is_visible(&s.submit_button).await? {
                info!(attempt, "login not confirmed yet, resubmitting");
                d.click(&s.submit_button).await?;
            } else {
                warn!(attempt, "submit control gone before dashboard appeared");
                return Ok(LoginOutcome::Ambiguous);
            }
        }

        warn!(
            retries = self.settings.max_retries,
            "login retry budget exhausted"
        );
        Ok(LoginOutcome::RetriesExhausted)
    }

    /// Submit credentials that must be rejected, and wait for an explicit
    /// rejection message.
    pub async fn expect_rejection(&self, credentials: &Credentials) -> Result<RejectionOutcome> {
        let d = self.driver;
        let s = &self.selectors;
        let marker = &self.settings.rejection_marker;

        self.submit_form(credentials).await?;

        for attempt in 1..=self.settings.rejection_retries {
            sleep(self.settings.attempt_delay).await;

            let messages = d.texts(&s.login_error_message).await?;
            if let Some(found) = messages.iter().find(|m| m.contains(marker)) {
                info!(attempt, message = %found, "rejection message found");
                return Ok(RejectionOutcome::Rejected);
            }
            debug!(attempt, rendered = messages.len(), "rejection message not found yet");

            // Resubmit; the control may already be gone, which is fine.
            let _ = d.try_click(&s.submit_button).await?;
        }

        warn!(
            retries = self.settings.rejection_retries,
            "no explicit rejection within the retry budget"
        );
        Ok(RejectionOutcome::Inconclusive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPageDriver;

    fn fast_settings() -> AuthSettings {
        AuthSettings {
            max_retries: 4,
            rejection_retries: 6,
            attempt_delay: Duration::from_millis(10),
            step_delay: Duration::from_millis(1),
            submit_settle: Duration::from_millis(1),
            ..AuthSettings::default()
        }
    }

    fn creds() -> Credentials {
        Credentials::new("qa@example.com", "hunter2")
    }

    #[tokio::test(start_paused = true)]
    async fn authenticates_when_indicator_appears_within_budget() {
        let driver = MockPageDriver::new();
        let selectors = ConsoleSelectors::default();
        driver.set_visible(&selectors.submit_button, true);
        // Dashboard shows up on the third visibility check.
        driver.visible_after(&selectors.dashboard_indicator, 2);

        let auth = Authenticator::new(&driver).with_settings(fast_settings());
        let outcome = auth.login(&creds()).await.unwrap();

        assert_eq!(outcome, LoginOutcome::Authenticated);
        // Initial submit plus two retries before the indicator appeared.
        assert_eq!(driver.click_count(&selectors.submit_button), 3);
        assert_eq!(
            driver.fills(),
            vec![
                (selectors.email_field.clone(), "qa@example.com".to_string()),
                (selectors.password_field.clone(), "hunter2".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_budget_when_indicator_never_appears() {
        let driver = MockPageDriver::new();
        let selectors = ConsoleSelectors::default();
        driver.set_visible(&selectors.submit_button, true);

        let auth = Authenticator::new(&driver).with_settings(fast_settings());
        let outcome = auth.login(&creds()).await.unwrap();

        assert_eq!(outcome, LoginOutcome::RetriesExhausted);
        // Initial submit plus one re-click per attempt.
        assert_eq!(driver.click_count(&selectors.submit_button), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn vanished_submit_control_is_ambiguous_not_success() {
        let driver = MockPageDriver::new();
        let selectors = ConsoleSelectors::default();
        // Submit control disappears after the initial submission.
        driver.visible_for(&selectors.submit_button, 1);

        let auth = Authenticator::new(&driver).with_settings(fast_settings());
        let outcome = auth.login(&creds()).await.unwrap();

        assert_eq!(outcome, LoginOutcome::Ambiguous);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_cookie_dialog_is_not_an_error() {
        let driver = MockPageDriver::new();
        let selectors = ConsoleSelectors::default();
        driver.set_visible(&selectors.submit_button, true);
        driver.visible_after(&selectors.dashboard_indicator, 0);
        // No cookie_accept element registered: try_click reports false.

        let auth = Authenticator::new(&driver).with_settings(fast_settings());
        let outcome = auth.login(&creds()).await.unwrap();
        assert_eq!(outcome, LoginOutcome::Authenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn rejection_found_among_error_messages() {
        let driver = MockPageDriver::new();
        let selectors = ConsoleSelectors::default();
        driver.set_visible(&selectors.submit_button, true);
        driver.texts_schedule(
            &selectors.login_error_message,
            vec![
                vec![],
                vec!["Something went wrong".to_string()],
                vec![
                    "Something went wrong".to_string(),
                    "Unauthorized".to_string(),
                ],
            ],
        );

        let auth = Authenticator::new(&driver).with_settings(fast_settings());
        let outcome = auth
            .expect_rejection(&Credentials::new("bad@example.com", "nope"))
            .await
            .unwrap();

        assert_eq!(outcome, RejectionOutcome::Rejected);
    }

    #[tokio::test(start_paused = true)]
    async fn rejection_budget_exhaustion_is_inconclusive() {
        let driver = MockPageDriver::new();
        let selectors = ConsoleSelectors::default();
        driver.set_visible(&selectors.submit_button, true);
        driver.texts_schedule(&selectors.login_error_message, vec![vec![]]);

        let auth = Authenticator::new(&driver).with_settings(fast_settings());
        let outcome = auth
            .expect_rejection(&Credentials::new("bad@example.com", "nope"))
            .await
            .unwrap();

        assert_eq!(outcome, RejectionOutcome::Inconclusive);
    }
}
