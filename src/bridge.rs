//! Bridge-status backend client
//!
//! The bridge runs as a separate deployment; the monitor only proxies its
//! public status endpoint for the presentation layer. Unknown response
//! fields pass through untouched since the backend evolves independently.

use std::time::Duration;

use eyre::{eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};

/// Status payload from the bridge backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeStatus {
    pub status: String,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub pending_transfers: u64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub struct BridgeStatusClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl BridgeStatusClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub async fn fetch_status(&self) -> Result<BridgeStatus> {
        let url = format!("{}/status", self.base_url);

        let request = async {
            self.http
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .json::<BridgeStatus>()
                .await
                .wrap_err("Malformed bridge status response")
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(eyre!(
                "Bridge status request timed out after {}ms",
                self.timeout.as_millis()
            )),
        }
    }
}
