//! Dialer configuration captured from the process environment
//!
//! The environment is read exactly once into an immutable [`ProxyEnv`];
//! everything downstream works from that value so tests can build their
//! own without touching process state.

pub mod env;
pub mod trace;

pub use env::ProxyEnv;
pub use trace::{DIALER_FACILITY, facility_enabled};
