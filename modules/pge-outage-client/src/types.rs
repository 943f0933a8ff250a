use chrono::NaiveDateTime;
use serde_json::Value;

/// Local timestamp format used by the outage API, both in query params and in
/// `startAt` / `stopAt` fields of the response.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of a single request attempt against the outage API.
///
/// `status_code` is `None` exactly when the attempt failed at the transport
/// level, in which case `error` carries the cause and neither body is set.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub url: String,
    pub status_code: Option<u16>,
    pub json_body: Option<Value>,
    pub text_body: Option<String>,
    pub error: Option<String>,
    pub requested_at: NaiveDateTime,
}

impl FetchResult {
    /// A completed HTTP exchange. The body is decoded as JSON when possible;
    /// the raw text is always kept for the fallback parse and the journal.
    pub fn response(url: String, status_code: u16, text: String, requested_at: NaiveDateTime) -> Self {
        let json_body = serde_json::from_str::<Value>(&text).ok();
        Self {
            url,
            status_code: Some(status_code),
            json_body,
            text_body: Some(text),
            error: None,
            requested_at,
        }
    }

    /// A request that never produced a response.
    pub fn transport_error(url: String, error: String, requested_at: NaiveDateTime) -> Self {
        Self {
            url,
            status_code: None,
            json_body: None,
            text_body: None,
            error: Some(error),
            requested_at,
        }
    }

    pub fn is_transport_error(&self) -> bool {
        self.error.is_some() || self.status_code.is_none()
    }

    /// Anything the journal should flag at ERROR level: no response at all, or
    /// a 4xx/5xx status.
    pub fn is_failure(&self) -> bool {
        if self.error.is_some() {
            return true;
        }
        self.status_code.map_or(true, |status| status >= 400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn json_response_keeps_both_bodies() {
        let result = FetchResult::response("u".into(), 200, "[]".into(), at());
        assert_eq!(result.json_body, Some(serde_json::json!([])));
        assert_eq!(result.text_body.as_deref(), Some("[]"));
        assert!(!result.is_failure());
    }

    #[test]
    fn html_response_keeps_only_text() {
        let result = FetchResult::response("u".into(), 502, "<html>bad gateway</html>".into(), at());
        assert!(result.json_body.is_none());
        assert!(result.text_body.is_some());
        assert!(result.is_failure());
        assert!(!result.is_transport_error());
    }

    #[test]
    fn transport_error_has_no_status() {
        let result = FetchResult::transport_error("u".into(), "timed out".into(), at());
        assert!(result.status_code.is_none());
        assert!(result.is_transport_error());
        assert!(result.is_failure());
    }
}
