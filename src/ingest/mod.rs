//! Ingestion adapters: each one normalizes a distinct source into registry
//! calls. Adapters translate and validate; they never own state, and a
//! malformed payload comes back as an error without touching the registry.

pub mod admin;
pub mod location;
pub mod presence;
