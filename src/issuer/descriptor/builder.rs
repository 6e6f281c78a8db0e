// std
use std::net::IpAddr;
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, IssuerId},
	issuer::{CredentialParams, IssuerCodes, IssuerDescriptor},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum IssuerDescriptorError {
	/// Descriptor identifier failed validation.
	#[error(transparent)]
	InvalidId(#[from] IdentifierError),
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Endpoint text could not be parsed.
	#[error("Endpoint `{url}` is not a valid URL.")]
	InvalidEndpoint {
		/// Offending endpoint text.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Secret-carrying query parameter names must be non-empty.
	#[error("The {param} parameter name must not be empty.")]
	EmptyParameterName {
		/// Which parameter failed validation.
		param: &'static str,
	},
	/// The success code cannot double as an expiry code.
	#[error("Code {code} cannot be both the success code and an expiry code.")]
	OkCodeMarkedExpired {
		/// Conflicting code.
		code: i64,
	},
}

/// Builder for [`IssuerDescriptor`] values.
#[derive(Debug)]
pub struct IssuerDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: IssuerId,
	/// Credential endpoint.
	pub token_endpoint: Option<Url>,
	/// Optional API base; defaults to the token endpoint's origin.
	pub api_base: Option<Url>,
	/// Query parameter carrying the application id.
	pub app_id_param: String,
	/// Query parameter carrying the application secret.
	pub app_secret_param: String,
	/// Error codes driving the retry decision.
	pub codes: IssuerCodes,
}
impl IssuerDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: IssuerId) -> Self {
		Self {
			id,
			token_endpoint: None,
			api_base: None,
			app_id_param: "appid".into(),
			app_secret_param: "secret".into(),
			codes: IssuerCodes::default(),
		}
	}

	/// Sets the credential endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the API base used to resolve request templates.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Overrides the application id parameter name (defaults to `appid`).
	pub fn app_id_param(mut self, name: impl Into<String>) -> Self {
		self.app_id_param = name.into();

		self
	}

	/// Overrides the application secret parameter name (defaults to `secret`).
	pub fn app_secret_param(mut self, name: impl Into<String>) -> Self {
		self.app_secret_param = name.into();

		self
	}

	/// Overrides the success code (defaults to `0`).
	pub fn ok_code(mut self, code: i64) -> Self {
		self.codes.ok = code;

		self
	}

	/// Marks an additional code as signalling an expired credential.
	pub fn expiry_code(mut self, code: i64) -> Self {
		self.codes.expired.insert(code);

		self
	}

	/// Replaces the whole code table.
	pub fn codes(mut self, codes: IssuerCodes) -> Self {
		self.codes = codes;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<IssuerDescriptor, IssuerDescriptorError> {
		let token_endpoint =
			self.token_endpoint.ok_or(IssuerDescriptorError::MissingTokenEndpoint)?;
		let api_base = match self.api_base {
			Some(url) => url,
			None => origin_of(&token_endpoint),
		};
		let descriptor = IssuerDescriptor {
			id: self.id,
			token_endpoint,
			api_base,
			credential_params: CredentialParams {
				app_id: self.app_id_param,
				app_secret: self.app_secret_param,
			},
			codes: self.codes,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl IssuerDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), IssuerDescriptorError> {
		validate_endpoint("token", &self.token_endpoint)?;
		validate_endpoint("api base", &self.api_base)?;

		if self.credential_params.app_id.is_empty() {
			return Err(IssuerDescriptorError::EmptyParameterName { param: "app id" });
		}
		if self.credential_params.app_secret.is_empty() {
			return Err(IssuerDescriptorError::EmptyParameterName { param: "app secret" });
		}
		if self.codes.expired.contains(&self.codes.ok) {
			return Err(IssuerDescriptorError::OkCodeMarkedExpired { code: self.codes.ok });
		}

		Ok(())
	}
}

fn origin_of(url: &Url) -> Url {
	let mut origin = url.clone();

	origin.set_path("/");
	origin.set_query(None);
	origin.set_fragment(None);

	origin
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), IssuerDescriptorError> {
	if url.scheme() == "https" || is_loopback(url) {
		Ok(())
	} else {
		Err(IssuerDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

// Plain HTTP is tolerated for loopback hosts so local mocks and sidecars work.
fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}
