//! Shared protocol pieces for the driftgate client and gateway.

pub mod error;
pub mod token;
pub mod wire;

pub use error::ProtoError;
pub use token::{Secret, TokenScheme};
