//! driftgate gateway — interval-token authentication and per-device rate
//! limiting in front of business handlers.

pub mod auth;
pub mod cleanup;
pub mod config;
pub mod gate;
pub mod ratelimit;
pub mod server;
pub mod state;
pub mod store;
