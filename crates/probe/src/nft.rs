//! API-key-gated NFT index query

use std::time::Duration;

use tracing::{info, warn};

use crate::error::Result;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Outcome of one NFT fetch. Non-2xx statuses are data, not errors: the
/// caller decides what to assert.
#[derive(Debug, Clone)]
pub struct NftFetch {
    pub status: u16,
    pub body: String,
}

impl NftFetch {
    /// The check the load test and scenarios apply: HTTP 200 with a
    /// non-empty body.
    pub fn passed(&self) -> bool {
        self.status == 200 && !self.body.is_empty()
    }
}

/// Client for the NFT-indexing REST API.
#[derive(Debug, Clone)]
pub struct NftClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl NftClient {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.into(),
            api_key: api_key.into(),
        })
    }

    /// `GET {apiBase}/{wallet}/nft?chain=eth&format=decimal&media_items=false`
    /// with the `X-API-Key` header. A transport failure is an error; any
    /// HTTP status comes back in the fetch result.
    pub async fn fetch_wallet_nfts(&self, wallet: &str) -> Result<NftFetch> {
        let url = format!(
            "{}/{}/nft?chain=eth&format=decimal&media_items=false",
            self.api_base, wallet
        );
        info!(%url, "fetching NFTs");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        if status == 200 {
            info!(status, bytes = body.len(), "NFT fetch succeeded");
        } else {
            warn!(status, "NFT fetch returned non-success status");
        }

        Ok(NftFetch { status, body })
    }
}
