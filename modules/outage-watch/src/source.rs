use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use pge_outage_client::{FetchResult, OutageClient};

/// Where outage lists come from. One call is one network attempt.
#[async_trait]
pub trait OutageSource: Send + Sync {
    async fn fetch(
        &self,
        now: NaiveDateTime,
        city_sym: &str,
        lookback_days: u32,
        timeout: Duration,
    ) -> FetchResult;
}

#[async_trait]
impl OutageSource for OutageClient {
    async fn fetch(
        &self,
        now: NaiveDateTime,
        city_sym: &str,
        lookback_days: u32,
        timeout: Duration,
    ) -> FetchResult {
        OutageClient::fetch(self, now, city_sym, lookback_days, timeout).await
    }
}
