//! Transport primitives for issuer calls.
//!
//! The module exposes [`ApiHttpClient`], the broker's only dependency on an HTTP stack,
//! together with the [`HttpRequest`]/[`HttpResponse`] aliases built on the `http` crate so
//! downstream crates can plug in custom clients (or in-process fakes) without pulling in
//! reqwest.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
};

/// Outbound request handed to an [`ApiHttpClient`].
pub type HttpRequest = ::http::Request<Vec<u8>>;
/// Buffered response returned by an [`ApiHttpClient`].
pub type HttpResponse = ::http::Response<Vec<u8>>;
/// Boxed future returned by [`ApiHttpClient::execute`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing issuer calls.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by
/// the credential fetcher and every request wrapper behind an `Arc`. The returned future
/// must be `Send` so broker tasks can hop executors. Implementations execute the request
/// exactly once; retries are the request wrapper's business, and timeouts are whatever
/// the underlying client is configured with.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Executes `request` and buffers the full response body.
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_>;
}
impl<T> ApiHttpClient for Arc<T>
where
	T: ?Sized + ApiHttpClient,
{
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		(**self).execute(request)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Configure timeouts on the wrapped client; the broker adds no timeout layer of its own.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request = reqwest::Request::try_from(request).map_err(TransportError::from)?;
			let response = client.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Builds an issuer request; a present body is sent as JSON.
pub(crate) fn build_request(
	method: ::http::Method,
	url: &Url,
	body: Option<Vec<u8>>,
) -> Result<HttpRequest> {
	let builder = ::http::Request::builder().method(method).uri(url.as_str());
	let request = match body {
		Some(body) => builder
			.header(::http::header::CONTENT_TYPE, "application/json; charset=utf-8")
			.body(body),
		None => builder.body(Vec::new()),
	};

	request.map_err(|e| ConfigError::from(e).into())
}

/// Decodes a JSON body, keeping the failing path for diagnostics.
pub(crate) fn decode_json<T>(body: &[u8], status: u16) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::Decode { source, status })
}

/// Rejects responses outside the 2xx range.
pub(crate) fn ensure_success(response: &HttpResponse) -> Result<()> {
	let status = response.status();

	if status.is_success() { Ok(()) } else { Err(Error::HttpStatus { status: status.as_u16() }) }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn post_requests_carry_json_content_type() {
		let url = Url::parse("https://api.example.com/cgi-bin/menu/create?access_token=abc")
			.expect("Fixture URL should parse.");
		let request = build_request(::http::Method::POST, &url, Some(b"{}".to_vec()))
			.expect("POST request should build.");

		assert_eq!(request.method(), ::http::Method::POST);
		assert_eq!(
			request.headers().get(::http::header::CONTENT_TYPE).map(|v| v.as_bytes()),
			Some(&b"application/json; charset=utf-8"[..]),
		);
		assert_eq!(request.uri().to_string(), url.as_str());
	}

	#[test]
	fn decode_errors_report_the_offending_path() {
		#[derive(Debug, Deserialize)]
		struct Grant {
			#[allow(dead_code)]
			expires_in: i64,
		}

		let err = decode_json::<Grant>(br#"{"expires_in":"soon"}"#, 200)
			.expect_err("String validity should fail to decode.");

		match err {
			Error::Decode { source, status } => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "expires_in");
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn non_success_statuses_are_rejected() {
		let mut response = HttpResponse::new(Vec::new());

		assert!(ensure_success(&response).is_ok());

		*response.status_mut() = ::http::StatusCode::BAD_GATEWAY;

		assert!(matches!(ensure_success(&response), Err(Error::HttpStatus { status: 502 })));
	}

	#[test]
	fn get_requests_have_empty_bodies() {
		let url = Url::parse("https://api.example.com/cgi-bin/token?grant_type=client_credential")
			.expect("Fixture URL should parse.");
		let request =
			build_request(::http::Method::GET, &url, None).expect("GET request should build.");

		assert_eq!(request.method(), ::http::Method::GET);
		assert!(request.body().is_empty());
		assert!(request.headers().get(::http::header::CONTENT_TYPE).is_none());
	}
}
