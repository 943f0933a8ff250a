pub mod config;
pub mod dedup;
pub mod dispatch;
pub mod error;
pub mod journal;
pub mod matcher;
pub mod notify;
pub mod scheduler;
pub mod source;
pub mod testing;
pub mod types;
pub mod validate;

pub use config::{Config, SmtpSettings};
pub use error::{ConfigError, NotifyError, ValidationError};
pub use scheduler::{CheckOutcome, Scheduler, TickReport};
pub use types::{Address, AddressTeryt, OutageRecord};
