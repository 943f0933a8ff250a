pub mod error;
pub mod types;

pub use error::{ClientError, Result};
pub use types::{FetchResult, TIMESTAMP_FORMAT};

use std::time::Duration;

use chrono::{Days, NaiveDateTime, NaiveTime};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT};
use url::Url;

pub const BASE_URL: &str = "https://power-outage.gkpge.pl/api/power-outage";

/// Outage type id for electricity outages in the `types[]` filter.
const POWER_OUTAGE_TYPE: &str = "2";

const USER_AGENT_VALUE: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36";

pub struct OutageClient {
    client: reqwest::Client,
    base_url: String,
}

impl OutageClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(BASE_URL)
    }

    /// Point the client at a different endpoint (staging, local stub).
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full request URL for the given query params.
    pub fn request_url(&self, params: &[(String, String)]) -> Result<Url> {
        Ok(Url::parse_with_params(&self.base_url, params)?)
    }

    /// Fetch outages for `city_sym` whose window overlaps
    /// `[now, end-of-day(now + lookback_days)]`.
    ///
    /// Never fails: transport problems and unreadable bodies are reported
    /// inside the returned [`FetchResult`].
    pub async fn fetch(
        &self,
        now: NaiveDateTime,
        city_sym: &str,
        lookback_days: u32,
        timeout: Duration,
    ) -> FetchResult {
        let params = build_params(now, city_sym, lookback_days);
        let url = match self.request_url(&params) {
            Ok(url) => url,
            Err(e) => {
                return FetchResult::transport_error(self.base_url.clone(), e.to_string(), now);
            }
        };

        tracing::debug!(url = %url, "Requesting outage list");

        let resp = match self.client.get(url.clone()).timeout(timeout).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Outage request failed");
                return FetchResult::transport_error(url.to_string(), e.to_string(), now);
            }
        };

        let status = resp.status().as_u16();
        match resp.text().await {
            Ok(text) => {
                tracing::debug!(status, bytes = text.len(), "Outage response received");
                FetchResult::response(url.to_string(), status, text, now)
            }
            Err(e) => {
                tracing::warn!(url = %url, status, error = %e, "Failed to read outage response body");
                FetchResult::transport_error(url.to_string(), e.to_string(), now)
            }
        }
    }
}

/// Query params selecting power outages overlapping the lookback window.
pub fn build_params(now: NaiveDateTime, city_sym: &str, lookback_days: u32) -> Vec<(String, String)> {
    let end_at = end_of_day(now.checked_add_days(Days::new(lookback_days.into())).unwrap_or(now));
    vec![
        ("type".to_string(), "teryt".to_string()),
        ("startAtTo".to_string(), end_at.format(TIMESTAMP_FORMAT).to_string()),
        ("stopAtFrom".to_string(), now.format(TIMESTAMP_FORMAT).to_string()),
        ("citySym".to_string(), city_sym.to_string()),
        ("types[]".to_string(), POWER_OUTAGE_TYPE.to_string()),
    ]
}

fn end_of_day(value: NaiveDateTime) -> NaiveDateTime {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default();
    value.date().and_time(last_second)
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("pl-PL,pl;q=0.9,en-US;q=0.8,en;q=0.7"),
    );
    headers.insert(ORIGIN, HeaderValue::from_static("https://pgedystrybucja.pl"));
    headers.insert(REFERER, HeaderValue::from_static("https://pgedystrybucja.pl/"));
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, 26)
            .unwrap()
            .and_hms_opt(7, 15, 30)
            .unwrap()
    }

    fn param<'a>(params: &'a [(String, String)], key: &str) -> &'a str {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn window_ends_at_end_of_day_after_lookback() {
        let params = build_params(now(), "0986283", 7);
        assert_eq!(param(&params, "stopAtFrom"), "2025-02-26 07:15:30");
        assert_eq!(param(&params, "startAtTo"), "2025-03-05 23:59:59");
        assert_eq!(param(&params, "citySym"), "0986283");
        assert_eq!(param(&params, "type"), "teryt");
        assert_eq!(param(&params, "types[]"), "2");
    }

    #[test]
    fn request_url_encodes_params() {
        let client = OutageClient::new().unwrap();
        let url = client.request_url(&build_params(now(), "0986283", 1)).unwrap();
        let s = url.as_str();
        assert!(s.starts_with(BASE_URL));
        assert!(s.contains("citySym=0986283"));
        assert!(s.contains("types%5B%5D=2"));
        assert!(s.contains("stopAtFrom=2025-02-26+07%3A15%3A30"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = OutageClient::with_base_url("http://localhost:9000/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000/api");
    }

    #[tokio::test]
    async fn unreachable_host_is_reported_as_transport_error() {
        let client = OutageClient::with_base_url("http://127.0.0.1:1/api/power-outage").unwrap();
        let result = client
            .fetch(now(), "0986283", 7, Duration::from_secs(2))
            .await;

        assert!(result.status_code.is_none());
        assert!(result.error.is_some());
        assert!(result.url.contains("citySym=0986283"));
        assert_eq!(result.requested_at, now());
    }
}
