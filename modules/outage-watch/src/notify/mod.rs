pub mod backend;
pub mod noop;
pub mod smtp;

pub use backend::{Notification, NotifyBackend};
pub use noop::NoopBackend;
pub use smtp::SmtpMailer;
