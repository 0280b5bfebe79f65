//! REST client for the admin backend.

pub mod client;
pub mod error;

pub use client::{ApiClient, TokenPair};
pub use error::ApiError;
