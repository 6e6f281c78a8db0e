//! Issuer-facing descriptors (endpoints, secret parameter names) and the error-code taxonomy.
//!
//! `descriptor` exposes validated metadata ([`IssuerDescriptor`]) covering the token
//! endpoint, the API base used to complete request templates, and the query parameters that
//! carry the two long-lived secrets. `code` defines the issuer's structured error envelope and
//! how codes split into success, credential expiry, and terminal failures.

pub mod code;
pub mod descriptor;

pub use code::*;
pub use descriptor::*;
