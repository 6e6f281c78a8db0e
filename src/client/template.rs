//! Incomplete API URLs awaiting a credential.

// crates.io
use url::form_urlencoded;
// self
use crate::{_prelude::*, error::ConfigError};

/// API URL whose final query parameter is the credential, left empty.
///
/// `https://host/cgi-bin/menu/create?access_token=` is completed per attempt with whatever
/// credential the broker currently holds, so a retry always carries the newer value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UrlTemplate(String);
impl UrlTemplate {
	/// Validates a template; it must parse as a URL and end with `=`.
	pub fn new(template: impl Into<String>) -> Result<Self> {
		let template = template.into();

		if !template.ends_with('=') {
			return Err(ConfigError::InvalidUrlTemplate { template }.into());
		}

		Url::parse(&template)
			.map_err(|source| ConfigError::InvalidUrl { url: template.clone(), source })?;

		Ok(Self(template))
	}

	/// Borrows the raw template text.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Appends the (percent-encoded) credential and parses the result.
	pub fn complete(&self, credential: &str) -> Result<Url> {
		let mut url = self.0.clone();

		url.extend(form_urlencoded::byte_serialize(credential.as_bytes()));

		Url::parse(&url).map_err(|source| ConfigError::InvalidUrl { url, source }.into())
	}
}
impl Display for UrlTemplate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for UrlTemplate {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
