//! driftgate client — clock synchronization, device identity, and the
//! secure request wrapper.

pub mod clock;
pub mod device;
pub mod fetch;
pub mod storage;
