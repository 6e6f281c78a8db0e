//! Issuer descriptor data structures and the presets for known issuers.
//!
//! A descriptor captures everything the broker needs to know about an issuer that is not a
//! secret: where credentials come from, which query parameters carry the application id and
//! secret, where the rest of the API lives, and which error codes mean "your credential is
//! no longer accepted".

/// Builder API for assembling issuer descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{
	_prelude::*,
	auth::{AppId, AppSecret, IssuerId},
	client::UrlTemplate,
	error::ConfigError,
	issuer::{IssuerCodeClass, IssuerCodes},
};

/// Query parameter names that carry the long-lived application secrets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialParams {
	/// Parameter carrying the [`AppId`] (`appid`, `corpid`, ...).
	pub app_id: String,
	/// Parameter carrying the [`AppSecret`] (`secret`, `corpsecret`, ...).
	pub app_secret: String,
}

/// Immutable issuer descriptor consumed by credential sources and request wrappers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerDescriptor {
	/// Descriptor identifier.
	pub id: IssuerId,
	/// Credential endpoint, including any fixed query parameters.
	pub token_endpoint: Url,
	/// Base URL that API paths are resolved against.
	pub api_base: Url,
	/// Names of the secret-carrying query parameters.
	pub credential_params: CredentialParams,
	/// Error codes driving the request wrapper's retry decision.
	pub codes: IssuerCodes,
}
impl IssuerDescriptor {
	const PUBLIC_ACCOUNT_TOKEN_ENDPOINT: &str =
		"https://api.weixin.qq.com/cgi-bin/token?grant_type=client_credential";
	const ENTERPRISE_TOKEN_ENDPOINT: &str = "https://qyapi.weixin.qq.com/cgi-bin/gettoken";

	/// Creates a new builder for the provided identifier.
	pub fn builder(id: IssuerId) -> IssuerDescriptorBuilder {
		IssuerDescriptorBuilder::new(id)
	}

	/// Descriptor for the public-account issuer (`appid` + `secret`).
	pub fn public_account() -> Result<Self, IssuerDescriptorError> {
		Self::preset("public-account", Self::PUBLIC_ACCOUNT_TOKEN_ENDPOINT, "appid", "secret")
	}

	/// Descriptor for the enterprise issuer (`corpid` + `corpsecret`).
	pub fn enterprise() -> Result<Self, IssuerDescriptorError> {
		Self::preset("enterprise", Self::ENTERPRISE_TOKEN_ENDPOINT, "corpid", "corpsecret")
	}

	fn preset(
		id: &str,
		endpoint: &str,
		app_id_param: &str,
		app_secret_param: &str,
	) -> Result<Self, IssuerDescriptorError> {
		let id = IssuerId::new(id)?;
		let token_endpoint = Url::parse(endpoint).map_err(|source| {
			IssuerDescriptorError::InvalidEndpoint { url: endpoint.into(), source }
		})?;

		Self::builder(id)
			.token_endpoint(token_endpoint)
			.app_id_param(app_id_param)
			.app_secret_param(app_secret_param)
			.build()
	}

	/// Classifies an issuer error code.
	pub fn classify(&self, code: i64) -> IssuerCodeClass {
		self.codes.classify(code)
	}

	/// Builds the credential request URL for a pair of application secrets.
	pub fn token_request_url(&self, app_id: &AppId, app_secret: &AppSecret) -> Url {
		let mut url = self.token_endpoint.clone();

		url.query_pairs_mut()
			.append_pair(&self.credential_params.app_id, app_id.as_str())
			.append_pair(&self.credential_params.app_secret, app_secret.expose());

		url
	}

	/// Resolves an API path (ending in the credential parameter) against the API base.
	pub fn api_template(&self, path: &str) -> Result<UrlTemplate> {
		let url = self.api_base.join(path).map_err(|source| ConfigError::InvalidUrl {
			url: format!("{}{path}", self.api_base),
			source,
		})?;

		UrlTemplate::new(url.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn public_account_preset_builds_credential_urls() {
		let descriptor =
			IssuerDescriptor::public_account().expect("Public-account preset should be valid.");
		let app_id = AppId::new("wx123").expect("App id fixture should be valid.");
		let url = descriptor.token_request_url(&app_id, &AppSecret::new("s3cr3t"));

		assert_eq!(
			url.as_str(),
			"https://api.weixin.qq.com/cgi-bin/token?grant_type=client_credential&appid=wx123&secret=s3cr3t",
		);
		assert_eq!(descriptor.api_base.as_str(), "https://api.weixin.qq.com/");
		assert_eq!(descriptor.classify(40001), IssuerCodeClass::CredentialExpired);
	}

	#[test]
	fn enterprise_preset_uses_corp_parameters() {
		let descriptor = IssuerDescriptor::enterprise().expect("Enterprise preset should be valid.");
		let app_id = AppId::new("corp1").expect("App id fixture should be valid.");
		let url = descriptor.token_request_url(&app_id, &AppSecret::new("a b"));

		assert_eq!(
			url.as_str(),
			"https://qyapi.weixin.qq.com/cgi-bin/gettoken?corpid=corp1&corpsecret=a+b",
		);
	}

	#[test]
	fn api_templates_resolve_against_the_base() {
		let descriptor =
			IssuerDescriptor::public_account().expect("Public-account preset should be valid.");
		let template = descriptor
			.api_template("cgi-bin/ticket/getticket?type=jsapi&access_token=")
			.expect("Ticket template should be valid.");

		assert_eq!(
			template.as_str(),
			"https://api.weixin.qq.com/cgi-bin/ticket/getticket?type=jsapi&access_token=",
		);
	}
}
