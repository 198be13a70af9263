//! Tracing setup for the server binary.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "vaulty_web=info,vaulty_core=info,actix_web=info";

/// Installs the global subscriber.
///
/// `log` records (actix-web's access logger among them) are forwarded to
/// tracing as well.
pub fn init() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
