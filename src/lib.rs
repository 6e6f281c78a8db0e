//! Shared access-token broker for rate-limited APIs.
//!
//! A [`broker::CredentialBroker`] fetches a credential eagerly, renews it in the background
//! before the issuer expires it, and debounces explicit refreshes. [`client::ApiClient`]
//! attaches the current credential to every API call and retries exactly once when the issuer
//! reports the credential as expired, so a burst of rejected callers settles on one upstream
//! refresh instead of stampeding the issuer.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod broker;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod issuer;
pub mod obs;
pub mod source;
pub mod store;

mod _prelude {
	pub use std::{
		collections::BTreeSet,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
