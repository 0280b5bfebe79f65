//! Authentication and session management.
//!
//! - `token`: access-token expiry inspection
//! - `session`: persisted token pair and the shared `SessionGuard`
//! - `credentials`: optional remembered password in the OS keychain

pub mod credentials;
pub mod session;
pub mod token;

pub use credentials::CredentialStore;
pub use session::{Session, SessionData, SessionGuard};
