//! Network publishing for Beacon
//!
//! This crate turns a Beacon's publishing configuration into the Kubernetes
//! Service that exposes the data-plane proxy, and converges a live Service
//! toward that definition:
//!
//! - **Ports**: derives the listener port plan for a publishing strategy
//! - **Annotations**: computes provider-specific load balancer annotations
//! - **Service**: compiles the desired proxy and xDS discovery Services
//! - **Converge**: decides whether a live Service needs to be replaced
//!
//! Everything here is a pure computation over its inputs. The surrounding
//! reconciler reads the live Service, calls into this crate, and applies
//! the returned replacement (if any) with its own retry and conflict
//! handling.

pub mod annotations;
pub mod converge;
pub mod ports;
pub mod service;

pub use converge::{converge, Convergence};
pub use ports::{PlannedPort, PortPlan};
pub use service::ServiceCompiler;

// Bridge beacon_common types into this crate's namespace.
// Internal modules use `crate::crd` and `crate::Error`.
pub(crate) use beacon_common::{crd, Error};
