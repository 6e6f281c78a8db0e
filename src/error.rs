//! Broker-level error types shared across sources, the broker, and the request wrapper.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Issuer reported a structured error code inside a successful HTTP response.
	#[error(transparent)]
	Issuer(#[from] IssuerError),

	/// Issuer answered with a non-success HTTP status.
	#[error("Issuer answered with HTTP status {status}.")]
	HttpStatus {
		/// HTTP status code returned by the issuer.
		status: u16,
	},
	/// Response body could not be decoded as the expected JSON shape.
	#[error("Issuer returned malformed JSON.")]
	Decode {
		/// Structured parsing failure, including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response that failed to parse.
		status: u16,
	},
	/// Issuer advertised a validity that is non-positive or past the representable date range.
	#[error("The advertised expires_in value {expires_in} is not a usable validity.")]
	InvalidExpiry {
		/// Raw validity in seconds as returned by the issuer.
		expires_in: i64,
	},
	/// The credential store currently holds an error instead of a credential.
	#[error("No valid credential is available: {0}")]
	CredentialUnavailable(#[source] Arc<Error>),
}
impl Error {
	/// Returns the issuer error code when the failure carries one.
	///
	/// Looks through [`Error::CredentialUnavailable`] so callers see the code of the fetch
	/// that poisoned the store.
	pub fn issuer_code(&self) -> Option<i64> {
		match self {
			Self::Issuer(err) => Some(err.code),
			Self::CredentialUnavailable(inner) => inner.issuer_code(),
			_ => None,
		}
	}
}

/// Structured error envelope returned by the issuer (`errcode` + `errmsg`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("Issuer returned error code {code}: {message}.")]
pub struct IssuerError {
	/// Issuer error code (`errcode`).
	pub code: i64,
	/// Issuer error description (`errmsg`).
	pub message: String,
}
impl IssuerError {
	/// Creates a new issuer error.
	pub fn new(code: i64, message: impl Into<String>) -> Self {
		Self { code, message: message.into() }
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// A URL assembled from a template or descriptor is invalid.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL text.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// URL template does not end with the credential parameter placeholder.
	#[error("URL template `{template}` must end with `=` so the credential can be appended.")]
	InvalidUrlTemplate {
		/// Offending template text.
		template: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the issuer.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The HTTP client gave up waiting for the issuer.
	#[error("Request timed out while calling the issuer.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the issuer.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
