use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use std::time::Duration;

use crate::tokens::types::TokenList;

/// Some list APIs reject requests that do not look like a browser.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";
const BROWSER_ONLY_HOSTS: [&str; 2] = ["api.portals.fi", "api.1inch.io"];

/// Retrieves an upstream token list.
#[async_trait]
pub trait ListFetcher: Send + Sync {
    /// The list at `uri`, or an empty list when it cannot be retrieved.
    async fn fetch(&self, uri: &str) -> TokenList;
}

pub struct HttpListFetcher {
    client: reqwest::Client,
}

impl HttpListFetcher {
    pub fn new() -> eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| eyre::eyre!("Failed to build HTTP client: {}", e))?;
        Ok(Self { client })
    }

    async fn get(&self, uri: &str) -> Result<TokenList, reqwest::Error> {
        let mut request = self.client.get(uri);
        if needs_browser_agent(uri) {
            request = request.header(USER_AGENT, BROWSER_USER_AGENT);
        }
        request.send().await?.error_for_status()?.json::<TokenList>().await
    }
}

fn needs_browser_agent(uri: &str) -> bool {
    BROWSER_ONLY_HOSTS.iter().any(|host| uri.contains(host))
}

#[async_trait]
impl ListFetcher for HttpListFetcher {
    async fn fetch(&self, uri: &str) -> TokenList {
        match self.get(uri).await {
            Ok(list) => {
                tracing::debug!(uri, tokens = list.tokens.len(), "Fetched token list");
                list
            }
            Err(e) if e.is_status() => {
                tracing::warn!(uri, status = ?e.status(), "Token list request rejected");
                TokenList::default()
            }
            Err(e) => {
                tracing::error!(uri, error = %e, "Failed to fetch token list");
                TokenList::default()
            }
        }
    }
}
