mod api;
pub mod models;
mod session;
pub mod signing;
mod user_store;

pub use api::AuthenticationApi;
pub use models::{AuthResult, LoginRequest, LoginStatus, TokenPair, User, UserAppStatus};
pub use session::AuthSession;
pub use user_store::{FileUserStore, MemoryUserStore, UserStore};
