//! tipwarden - keyword rule engine and self-expiring tip notices for chat groups.
//!
//! The library holds everything the daemon runs so integration tests can drive
//! a [`Warden`] against their own [`platform::Platform`].

pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod metrics;
pub mod platform;
pub mod services;
pub mod state;
pub mod store;
pub mod warden;

pub use warden::Warden;
