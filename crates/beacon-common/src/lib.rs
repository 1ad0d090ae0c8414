//! Common types for Beacon: CRDs, errors, and shared constants

#![deny(missing_docs)]

pub mod crd;
pub mod error;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Label recording the name of the Beacon that owns a generated resource
pub const OWNING_BEACON_NAME_LABEL: &str = "beacon.dev/owning-beacon-name";

/// Label recording the namespace of the Beacon that owns a generated resource
pub const OWNING_BEACON_NS_LABEL: &str = "beacon.dev/owning-beacon-namespace";

/// Finalizer placed on a Beacon while resources generated for it exist
pub const BEACON_FINALIZER: &str = "beacon.dev/finalizer";
