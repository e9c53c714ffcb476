//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (palaver-infra) implements. The core crate never depends on any specific
//! storage technology. Implementations must bind every caller-supplied value
//! as a query parameter.

pub mod user;
