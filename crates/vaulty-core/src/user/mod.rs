//! Account holders.

mod model;
mod repository;

pub use model::{User, UserFilter, UserId};
pub use repository::UserRepository;
