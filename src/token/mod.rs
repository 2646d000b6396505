mod coordinator;
pub mod expiry;
mod refresher;
mod store;

pub use coordinator::RefreshCoordinator;
pub use expiry::{DEFAULT_EXPIRY_SKEW, is_expired};
pub use refresher::TokenRefresher;
pub use store::{CredentialPair, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub(crate) use store::write_json_atomic;
