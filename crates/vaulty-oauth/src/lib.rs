//! # vaulty-oauth
//!
//! `OAuth2` support for linking cloud storage accounts to Vaulty users.
//!
//! ## Features
//!
//! - **Authorization code flow with PKCE** (RFC 7636), split across the two
//!   web requests of a login: build the authorization URL, then exchange the
//!   returned code
//! - **Token handling**: expiry tracking; the refresh token is kept for storage
//! - **Dropbox**: provider endpoints and the current-account lookup
//!
//! ## Quick Start
//!
//! ```ignore
//! use vaulty_oauth::{OAuthClient, PkceChallenge, Provider, random_state};
//!
//! let client = OAuthClient::new("client_id", Provider::dropbox()?)
//!     .with_client_secret("secret")
//!     .with_redirect_uri("https://vaulty.net/social/complete/dropbox");
//!
//! // Request 1: remember state and verifier, redirect the browser
//! let pkce = PkceChallenge::generate();
//! let state = random_state();
//! let url = client.authorization_url(&state, Some(&pkce))?;
//!
//! // Request 2: exchange the code and look the account up
//! let token = client.exchange_code(code, Some(pkce.verifier())).await?;
//! let account = DropboxApi::new()?.current_account(&token).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
pub mod dropbox;
mod error;
mod pkce;
mod provider;
mod token;

pub use client::OAuthClient;
pub use dropbox::{DropboxAccount, DropboxApi};
pub use error::{Error, Result};
pub use pkce::{PkceChallenge, random_state};
pub use provider::Provider;
pub use token::{ErrorResponse, Token, TokenResponse};
