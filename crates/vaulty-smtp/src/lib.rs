//! # vaulty-smtp
//!
//! A small async SMTP submission client (RFC 5321) for transactional mail
//! such as launch list confirmations.
//!
//! ## Features
//!
//! - **Type-state session**: compile-time enforcement of the
//!   EHLO / AUTH / MAIL / RCPT / DATA order
//! - **TLS**: implicit TLS (port 465) and STARTTLS, via rustls
//! - **Authentication**: PLAIN and LOGIN
//! - **Transport**: one call to deliver a [`Message`] with [`SmtpSettings`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use vaulty_smtp::{Message, Security, SmtpSettings, Transport};
//!
//! let settings = SmtpSettings::new("smtp.example.com", 587, Security::StartTls)
//!     .with_credentials("user", "secret");
//! let message = Message::new("noreply@vaulty.net", "Hello", "Body")
//!     .to("someone@example.com");
//! Transport::new(settings).send(&message).await?;
//! ```
//!
//! ## Session States
//!
//! ```text
//! Connected ── auth_plain() / auth_login() ──→ Authenticated
//!     │                                              │
//!     └──────────────── mail_from() ─────────────────┘
//!                           │
//!                    MailTransaction ── rcpt_to() ──→ RecipientAdded ── data() ──→ Data
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod command;
pub mod connection;
mod error;
mod extension;
mod message;
pub mod reply;
mod transport;

pub use command::Command;
pub use connection::{
    Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded, ServerInfo,
    SmtpStream,
};
pub use error::{Error, Result};
pub use extension::{AuthMechanism, Extension};
pub use message::{Address, Message};
pub use reply::{Reply, ReplyCode};
pub use transport::{Credentials, Security, SmtpSettings, Transport};
