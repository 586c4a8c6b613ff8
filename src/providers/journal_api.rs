use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::core::cache::Cache;
use crate::core::series::{AccountHistoryProvider, RawAccountSeries, RawSeriesPoint};
use crate::providers::util::with_retry;

/// Thin client for the trade-journal HTTP API: one request for the account
/// list, then one per account for its history, fetched concurrently.
/// Fetching is all this layer does; validation and merging happen in the
/// core engine.
pub struct JournalApiProvider {
    base_url: String,
    cache: Arc<Cache<String, Vec<RawAccountSeries>>>,
}

impl JournalApiProvider {
    pub fn new(base_url: &str, cache: Arc<Cache<String, Vec<RawAccountSeries>>>) -> Self {
        JournalApiProvider {
            base_url: base_url.to_string(),
            cache,
        }
    }

    async fn fetch_history(
        &self,
        client: &reqwest::Client,
        meta: AccountMeta,
    ) -> Result<RawAccountSeries> {
        let url = format!("{}/api/accounts/{}/history", self.base_url, meta.account_id);
        debug!("Requesting account history from {}", url);

        let response = with_retry(|| client.get(&url).send(), 2, 250)
            .await
            .map_err(|e| anyhow!("Request error: {} for URL: {}", e, url))?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for account {} history",
                response.status(),
                meta.account_id
            ));
        }

        let text = response.text().await?;
        let history: HistoryResponse = serde_json::from_str(&text).map_err(|e| {
            anyhow!(
                "Failed to parse history response for account {}: {}",
                meta.account_id,
                e
            )
        })?;

        Ok(RawAccountSeries {
            account_id: meta.account_id,
            account_name: meta.account_name,
            currency: meta.currency,
            data: history.data,
        })
    }
}

#[derive(Deserialize, Debug)]
struct AccountListResponse {
    accounts: Vec<AccountMeta>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AccountMeta {
    account_id: i64,
    account_name: String,
    currency: Option<String>,
}

#[derive(Deserialize, Debug)]
struct HistoryResponse {
    data: Vec<RawSeriesPoint>,
}

#[async_trait]
impl AccountHistoryProvider for JournalApiProvider {
    #[instrument(name = "JournalAccountsFetch", skip(self))]
    async fn fetch_accounts(&self) -> Result<Vec<RawAccountSeries>> {
        if let Some(cached) = self.cache.get(&self.base_url).await {
            return Ok(cached);
        }

        let url = format!("{}/api/accounts", self.base_url);
        debug!("Requesting account list from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("tradelens/0.2")
            .build()?;
        let response = with_retry(|| client.get(&url).send(), 2, 250)
            .await
            .map_err(|e| anyhow!("Request error: {} for URL: {}", e, url))?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} from journal API at {}",
                response.status(),
                url
            ));
        }

        let text = response.text().await?;
        let list: AccountListResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse account list response: {}", e))?;
        debug!(accounts = list.accounts.len(), "Received account list");

        let history_futures = list
            .accounts
            .into_iter()
            .map(|meta| self.fetch_history(&client, meta));
        let accounts: Vec<RawAccountSeries> = join_all(history_futures)
            .await
            .into_iter()
            .collect::<Result<_>>()?;

        self.cache
            .put(self.base_url.clone(), accounts.clone())
            .await;

        Ok(accounts)
    }
}
