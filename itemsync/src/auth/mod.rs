//! Bearer token providers for the admin API.

mod base;
pub mod client_credentials;
pub mod static_token;

pub use base::{ConfiguredTokenProvider, TokenProvider};
