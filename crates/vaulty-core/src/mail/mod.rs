//! Received mail records and their processing logs.

mod log;
mod model;
mod repository;

pub use log::{Log, LogLevel, LogRepository};
pub use model::{Mail, MailFilter, MailId, MailStatus};
pub use repository::MailRepository;
