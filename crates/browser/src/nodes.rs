//! Node resource lifecycle
//!
//! Idempotently ensures a single managed node exists: any pre-existing node
//! is deleted, then a fresh one is created through the console's wizard and
//! its generated endpoints are read back. Element waits are bounded polls,
//! not fixed sleep counts.

use std::time::Duration;

use nodeharness_common::{poll_until, PollOutcome};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::driver::PageDriver;
use crate::error::{BrowserError, Result};
use crate::selectors::ConsoleSelectors;

/// Wizard option values as the console renders them.
pub const PLATFORM_ETHEREUM: &str = "Ethereum";
pub const NETWORK_SEPOLIA: &str = "0xaa36a7-Sepolia";

/// Empty-state text shown once no nodes remain. The apostrophe is the
/// console's typographic one.
const NO_NODES_MARKER: &str = "You don’t have any Nodes yet";

/// Generated endpoint URLs read back from the wizard's result panel.
#[derive(Debug, Clone, Default)]
pub struct NodeEndpoints {
    pub site1: Option<String>,
    pub site2: Option<String>,
}

/// Pacing for the lifecycle script.
#[derive(Debug, Clone)]
pub struct WizardSettings {
    /// Interval between visibility polls.
    pub poll_interval: Duration,
    /// How long to wait for the nodes view to list an existing node before
    /// concluding there is none.
    pub view_wait: Duration,
    /// Settling delay for menu/dialog animations.
    pub animation_settle: Duration,
    /// Settling delay after choosing wizard options.
    pub wizard_settle: Duration,
    /// Upper bound for deletion confirmation and endpoint rendering.
    pub page_timeout: Duration,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            view_wait: Duration::from_secs(10),
            animation_settle: Duration::from_secs(2),
            wizard_settle: Duration::from_secs(5),
            page_timeout: Duration::from_secs(60),
        }
    }
}

/// Drives the node management view through a [`PageDriver`].
pub struct NodeWizard<'a, D: PageDriver + ?Sized> {
    driver: &'a D,
    selectors: ConsoleSelectors,
    settings: WizardSettings,
}

impl<'a, D: PageDriver + ?Sized> NodeWizard<'a, D> {
    pub fn new(driver: &'a D) -> Self {
        Self {
            driver,
            selectors: ConsoleSelectors::default(),
            settings: WizardSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: WizardSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_selectors(mut self, selectors: ConsoleSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Poll until `selector` is visible, bounded by `max_wait`.
    async fn wait_visible(&self, selector: &str, max_wait: Duration) -> PollOutcome<()> {
        let driver = self.driver;
        poll_until(self.settings.poll_interval, max_wait, || async move {
            driver
                .is_visible(selector)
                .await
                .unwrap_or(false)
                .then_some(())
        })
        .await
    }

    /// Navigate to the Nodes view.
    pub async fn open_nodes_view(&self) -> Result<()> {
        if self.driver.try_click(&self.selectors.nodes_button).await? {
            info!("opened the nodes view");
        } else {
            warn!("nodes button not visible; assuming the view is already open");
        }
        Ok(())
    }

    /// Delete the pre-existing node, if one is listed. Returns whether a
    /// deletion happened.
    pub async fn delete_existing_node(&self) -> Result<bool> {
        let s = &self.selectors;

        if self
            .wait_visible(&s.node_row_subtitle, self.settings.view_wait)
            .await
            .is_timed_out()
        {
            info!("no existing node listed");
            return Ok(false);
        }

        info!("existing node found, deleting");
        if !self.driver.try_click(&s.node_menu_button).await? {
            warn!("node action menu not visible");
        }
        sleep(self.settings.animation_settle).await;

        if !self.driver.try_click(&s.node_delete_button).await? {
            warn!("delete control not visible");
        }
        sleep(self.settings.animation_settle).await;

        if !self.driver.try_click(&s.confirm_delete_button).await? {
            warn!("delete confirmation not visible");
        }

        // Deletion is only done once the empty-state text renders.
        let driver = self.driver;
        let empty_indicator = s.empty_nodes_indicator.as_str();
        let empty_seen = poll_until(
            self.settings.poll_interval,
            self.settings.page_timeout,
            || async move {
                let texts = driver.texts(empty_indicator).await.unwrap_or_default();
                texts.iter().any(|t| t.contains(NO_NODES_MARKER)).then_some(())
            },
        )
        .await;

        match empty_seen {
            PollOutcome::Completed(()) => {
                info!("node deletion confirmed");
                Ok(true)
            }
            PollOutcome::TimedOut => Err(BrowserError::timeout(
                "node deletion confirmation",
                self.settings.page_timeout,
            )),
        }
    }

    /// Run the creation wizard and wait for the generated endpoints to
    /// render.
    pub async fn create_node(&self, platform: &str, network: &str) -> Result<()> {
        let s = &self.selectors;

        if !self.driver.try_click(&s.create_node_button).await? {
            warn!("create node button not visible");
        }

        self.driver.select_option(&s.platform_select, platform).await?;
        info!(platform, "selected platform");
        self.driver.select_option(&s.network_select, network).await?;
        info!(network, "selected network");

        sleep(self.settings.wizard_settle).await;
        self.driver.click(&s.wizard_submit_button).await?;

        match self
            .wait_visible(&s.site1_endpoint_input, self.settings.page_timeout)
            .await
        {
            PollOutcome::Completed(()) => {
                info!("generated endpoints rendered");
                Ok(())
            }
            PollOutcome::TimedOut => Err(BrowserError::timeout(
                "generated endpoint inputs",
                self.settings.page_timeout,
            )),
        }
    }

    /// Delete any pre-existing node and create a fresh Ethereum/Sepolia one.
    pub async fn ensure_fresh_node(&self) -> Result<()> {
        self.open_nodes_view().await?;
        self.delete_existing_node().await?;
        self.create_node(PLATFORM_ETHEREUM, NETWORK_SEPOLIA).await
    }

    /// Read both generated endpoint URLs from the result panel. Either may
    /// be absent; callers log and skip what is missing.
    pub async fn extract_endpoints(&self) -> Result<NodeEndpoints> {
        let s = &self.selectors;
        let site1 = self.driver.input_value(&s.site1_endpoint_input).await?;
        let site2 = self.driver.input_value(&s.site2_endpoint_input).await?;

        match &site1 {
            Some(url) => info!(%url, "site 1 endpoint"),
            None => warn!("site 1 endpoint input not visible"),
        }
        match &site2 {
            Some(url) => info!(%url, "site 2 endpoint"),
            None => warn!("site 2 endpoint input not visible"),
        }

        Ok(NodeEndpoints { site1, site2 })
    }

    /// Reveal and read the account API key.
    pub async fn reveal_api_key(&self) -> Result<Option<String>> {
        let s = &self.selectors;

        if !self.driver.try_click(&s.reveal_api_key_button).await? {
            warn!("reveal button not visible");
        }
        sleep(self.settings.animation_settle).await;

        let key = self.driver.input_value(&s.api_key_input).await?;
        match &key {
            Some(_) => info!("API key revealed"),
            None => warn!("API key input not visible"),
        }
        Ok(key)
    }
}
