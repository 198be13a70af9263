//! # vaulty-web
//!
//! The Vaulty marketing site: landing, pricing and FAQ pages, the launch
//! mailing list signup, a read-only admin listing and Dropbox social login.
//!
//! ## Routes
//!
//! | Path | Handler |
//! |---|---|
//! | `GET /`, `/pricing`, `/faq` | static pages |
//! | `POST /mailing-list` | launch list signup (405 for other methods) |
//! | `GET /admin/`, `/admin/{model}/` | admin listings behind basic auth |
//! | `GET /social/login/dropbox`, `/social/complete/dropbox` | Dropbox login |
//! | `GET /health_check` | liveness |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod admin;
pub mod config;
mod error;
pub mod mailer;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod templates;

pub use config::{Config, ConfigError};
pub use error::{WebError, WebResult};
pub use mailer::Mailer;
pub use startup::{AppState, DropboxLogin, run};
