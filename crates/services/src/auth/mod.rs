//! Signed-in identity: token storage and decoded claims.

mod claims;
mod context;
mod store;

pub use crate::error::AuthError;
pub use claims::{Claims, FEDERATED_ROLE_CLAIM, Role};
pub use context::SessionContext;
pub use store::{FileTokenStore, InMemoryTokenStore, TokenStore};
