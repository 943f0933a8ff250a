use thiserror::Error;

/// Startup configuration errors. Fatal: the binary exits before the loop starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to load env file {path}: {message}")]
    EnvFile { path: String, message: String },

    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} must be an integer, got {value:?}")]
    NotInteger { name: &'static str, value: String },

    #[error("{name} out of range ({min}..={max}), got {value}")]
    OutOfRange {
        name: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("{name} must be a boolean, got {value:?}")]
    NotBool { name: &'static str, value: String },

    #[error("Invalid hour value: {0:?}")]
    InvalidHour(String),

    #[error("Hour out of range: {0}")]
    HourOutOfRange(u64),

    #[error("No valid HOURS provided")]
    NoHours,

    #[error("CITY_SYM must be numeric, got {0:?}")]
    CitySymNotNumeric(String),
}

/// Why an outage payload was rejected. Always carries the path of the
/// offending field, e.g. `response[1].addresses[0].teryt.streetName`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{path}: not valid JSON: {message}")]
    Decode { path: String, message: String },

    #[error("{path} is required")]
    Missing { path: String },

    #[error("{path} must be {expected}")]
    WrongType { path: String, expected: &'static str },

    #[error("{path}: invalid timestamp {value:?}")]
    Timestamp { path: String, value: String },
}

impl ValidationError {
    pub fn path(&self) -> &str {
        match self {
            Self::Decode { path, .. }
            | Self::Missing { path }
            | Self::WrongType { path, .. }
            | Self::Timestamp { path, .. } => path,
        }
    }
}

/// Delivery failures from a notify backend.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid mailbox {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("no recipients configured")]
    NoRecipients,

    #[error("{0}")]
    Other(String),
}
