//! Provisioned inbound addresses with quotas, storage destinations and
//! sender whitelisting.

mod model;
mod repository;
mod whitelist;

pub use model::{Address, AddressFilter, AddressId, QuotaViolation, StorageBackend};
pub use repository::AddressRepository;
pub use whitelist::Whitelist;
