pub mod classification;
pub mod constructors;
pub mod types;

// Re-export main types and functions
pub use constructors::*;
pub use types::{Error, Inner, Kind, Result};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;
