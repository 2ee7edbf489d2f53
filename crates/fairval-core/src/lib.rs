pub mod discount;
pub mod error;
pub mod projection;
pub mod snapshot;
pub mod types;

#[cfg(feature = "dcf")]
pub mod dcf;

#[cfg(feature = "dcf")]
pub mod sensitivity;

#[cfg(feature = "ddm")]
pub mod ddm;

#[cfg(feature = "comps")]
pub mod comps;

pub use error::FairvalError;
pub use types::*;

/// Standard result type for all valuation operations
pub type FairvalResult<T> = Result<T, FairvalError>;
