//! # vaulty-core
//!
//! Core domain and storage layer for the Vaulty email archiving service.
//!
//! This crate provides:
//! - Domain models for users, provisioned addresses, received mail, mail
//!   processing logs, aliases and the launch mailing list
//! - Local storage (`SQLite`) with the persisted `vaulty_*` schema
//! - Sender whitelisting and quota rules for provisioned addresses
//! - Validation of the launch mailing list signup form

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod address;
pub mod alias;
mod db;
mod error;
pub mod mail;
pub mod mailing_list;
pub mod signup;
pub mod social;
pub mod user;

pub use address::{
    Address, AddressFilter, AddressId, AddressRepository, QuotaViolation, StorageBackend,
    Whitelist,
};
pub use alias::{Alias, AliasId, AliasRepository};
pub use db::Database;
pub use error::{Error, Result};
pub use mail::{
    Log, LogLevel, LogRepository, Mail, MailFilter, MailId, MailRepository, MailStatus,
};
pub use mailing_list::{LaunchSignup, MailingListRepository};
pub use signup::{EMAIL_MAX_LENGTH, FormError, SignupForm};
pub use social::{SocialAuth, SocialAuthRepository};
pub use user::{User, UserFilter, UserId, UserRepository};
