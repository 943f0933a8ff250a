//! Strict decoding of the outage API response into [`OutageRecord`]s.
//!
//! The payload is untrusted and loosely shaped, so every field is checked by
//! hand against the expected schema. Any violation rejects the whole payload.

use chrono::NaiveDateTime;
use pge_outage_client::{FetchResult, TIMESTAMP_FORMAT};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::types::{Address, AddressTeryt, OutageRecord};

const ROOT: &str = "response";

/// Input to [`validate`]: either raw response text or an already-decoded body.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Text(&'a str),
    Decoded(&'a Value),
}

/// Decode a full response payload. All-or-nothing.
pub fn validate(payload: Payload<'_>) -> Result<Vec<OutageRecord>, ValidationError> {
    match payload {
        Payload::Decoded(value) => parse_records(value),
        Payload::Text(text) => {
            let value: Value =
                serde_json::from_str(text).map_err(|e| ValidationError::Decode {
                    path: ROOT.to_string(),
                    message: e.to_string(),
                })?;
            parse_records(&value)
        }
    }
}

/// Validate the decoded body first and fall back to the raw text body.
///
/// Returns the error of the last attempt when neither body yields records.
pub fn validate_fetch(result: &FetchResult) -> Result<Vec<OutageRecord>, ValidationError> {
    let primary = match &result.json_body {
        Some(value) => validate(Payload::Decoded(value)),
        None => Err(ValidationError::Missing {
            path: ROOT.to_string(),
        }),
    };

    match (primary, result.text_body.as_deref()) {
        (Ok(records), _) => Ok(records),
        (Err(err), None) => Err(err),
        (Err(err), Some(text)) => {
            tracing::debug!(error = %err, "Decoded body rejected, retrying with raw text");
            validate(Payload::Text(text))
        }
    }
}

fn parse_records(value: &Value) -> Result<Vec<OutageRecord>, ValidationError> {
    let items = require_array(value, ROOT)?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_record(item, &format!("{ROOT}[{i}]")))
        .collect()
}

fn parse_record(value: &Value, path: &str) -> Result<OutageRecord, ValidationError> {
    let data = require_object(value, path)?;

    let description = required_str(data, "description", path)?;
    let start_at = required_timestamp(data, "startAt", path)?;
    let stop_at = required_timestamp(data, "stopAt", path)?;
    let revoked = required_bool(data, "revoked", path)?;
    let revoked_description = optional_str(data, "revokedDescription", path)?;

    let addresses_path = field_path(path, "addresses");
    let addresses = match present(data, "addresses") {
        Some(v) => require_array(v, &addresses_path)?,
        None => return Err(ValidationError::Missing { path: addresses_path }),
    };
    let addresses = addresses
        .iter()
        .enumerate()
        .map(|(i, item)| parse_address(item, &format!("{addresses_path}[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OutageRecord {
        description,
        start_at,
        stop_at,
        revoked,
        revoked_description,
        addresses,
    })
}

fn parse_address(value: &Value, path: &str) -> Result<Address, ValidationError> {
    let data = require_object(value, path)?;
    let numbers = optional_str(data, "numbers", path)?;

    let teryt = match present(data, "teryt") {
        Some(v) => {
            let teryt_path = field_path(path, "teryt");
            let teryt = require_object(v, &teryt_path)?;
            Some(AddressTeryt {
                street_name: optional_str(teryt, "streetName", &teryt_path)?,
            })
        }
        None => None,
    };

    Ok(Address { numbers, teryt })
}

fn field_path(parent: &str, key: &str) -> String {
    format!("{parent}.{key}")
}

/// A key that is missing or explicitly `null` counts as absent.
fn present<'v>(data: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    data.get(key).filter(|v| !v.is_null())
}

fn require_object<'v>(value: &'v Value, path: &str) -> Result<&'v Map<String, Value>, ValidationError> {
    value.as_object().ok_or_else(|| ValidationError::WrongType {
        path: path.to_string(),
        expected: "an object",
    })
}

fn require_array<'v>(value: &'v Value, path: &str) -> Result<&'v Vec<Value>, ValidationError> {
    value.as_array().ok_or_else(|| ValidationError::WrongType {
        path: path.to_string(),
        expected: "a list",
    })
}

fn optional_str(
    data: &Map<String, Value>,
    key: &str,
    parent: &str,
) -> Result<Option<String>, ValidationError> {
    match present(data, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationError::WrongType {
            path: field_path(parent, key),
            expected: "a string",
        }),
    }
}

fn required_str(data: &Map<String, Value>, key: &str, parent: &str) -> Result<String, ValidationError> {
    optional_str(data, key, parent)?.ok_or_else(|| ValidationError::Missing {
        path: field_path(parent, key),
    })
}

fn required_bool(data: &Map<String, Value>, key: &str, parent: &str) -> Result<bool, ValidationError> {
    match present(data, key) {
        None => Err(ValidationError::Missing {
            path: field_path(parent, key),
        }),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ValidationError::WrongType {
            path: field_path(parent, key),
            expected: "a boolean",
        }),
    }
}

fn required_timestamp(
    data: &Map<String, Value>,
    key: &str,
    parent: &str,
) -> Result<NaiveDateTime, ValidationError> {
    let raw = required_str(data, key, parent)?;
    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(|_| ValidationError::Timestamp {
        path: field_path(parent, key),
        value: raw,
    })
}
