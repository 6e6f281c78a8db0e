//! Auth-domain identifiers, redacted secrets, and the issued credential model.

pub mod credential;
pub mod id;
pub mod secret;

pub use credential::*;
pub use id::*;
pub use secret::*;
