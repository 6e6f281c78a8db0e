//! Fakes shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	sync::atomic::{AtomicBool, AtomicUsize, Ordering},
	time::Duration as StdDuration,
};
// crates.io
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime};
// self
use token_broker::{
	auth::{Credential, IssuerId},
	error::{Result, TransportError},
	http::{ApiHttpClient, HttpFuture, HttpRequest, HttpResponse},
	issuer::IssuerDescriptor,
	source::{CredentialSource, SourceFuture},
	url::Url,
};

/// API template used by the scripted issuer.
pub const MENU_TEMPLATE: &str = "https://issuer.example.com/cgi-bin/menu/get?access_token=";

/// Descriptor for an issuer that only exists inside the scripted transports.
pub fn scripted_descriptor() -> IssuerDescriptor {
	let id = IssuerId::new("scripted").expect("Scripted issuer id should be valid.");
	let endpoint = Url::parse("https://issuer.example.com/cgi-bin/token")
		.expect("Scripted token endpoint should parse.");

	IssuerDescriptor::builder(id)
		.token_endpoint(endpoint)
		.build()
		.expect("Scripted descriptor should be valid.")
}

/// Scripted [`CredentialSource`] that counts upstream calls.
///
/// Each fetch pops the next scripted outcome; once the script runs dry the source mints
/// `token-N` credentials (where `N` is the call number) valid for `lifetime`.
#[derive(Debug)]
pub struct ScriptedSource {
	calls: AtomicUsize,
	script: Mutex<VecDeque<Result<Credential>>>,
	lifetime: Duration,
	failing: AtomicBool,
	delay: StdDuration,
}
impl ScriptedSource {
	/// Source that always succeeds with sequentially numbered tokens.
	pub fn sequential(lifetime: Duration) -> Self {
		Self {
			calls: AtomicUsize::new(0),
			script: Mutex::new(VecDeque::new()),
			lifetime,
			failing: AtomicBool::new(false),
			delay: StdDuration::ZERO,
		}
	}

	/// Source whose every fetch fails with a transport error.
	pub fn always_failing() -> Self {
		let source = Self::sequential(Duration::hours(2));

		source.set_failing(true);

		source
	}

	/// Queues an explicit outcome ahead of the sequential fallback.
	pub fn push(&self, outcome: Result<Credential>) {
		self.script.lock().push_back(outcome);
	}

	/// Makes every fetch sleep for `delay` before resolving.
	pub fn with_delay(mut self, delay: StdDuration) -> Self {
		self.delay = delay;

		self
	}

	/// Switches the failing flag at runtime.
	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	/// Number of upstream fetches performed so far.
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl CredentialSource for ScriptedSource {
	fn fetch(&self) -> SourceFuture<'_> {
		Box::pin(async move {
			let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

			if !self.delay.is_zero() {
				tokio::time::sleep(self.delay).await;
			}

			let scripted = self.script.lock().pop_front();

			if let Some(outcome) = scripted {
				return outcome;
			}
			if self.failing.load(Ordering::SeqCst) {
				return Err(TransportError::network(std::io::Error::other(
					"scripted issuer is unreachable",
				))
				.into());
			}

			Credential::new(format!("token-{call}"), OffsetDateTime::now_utc(), self.lifetime)
		})
	}
}

/// Request captured by a scripted transport.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
	pub method: ::http::Method,
	pub uri: String,
	pub content_type: Option<String>,
	pub body: Vec<u8>,
}
impl RecordedRequest {
	fn capture(request: &HttpRequest) -> Self {
		Self {
			method: request.method().clone(),
			uri: request.uri().to_string(),
			content_type: request
				.headers()
				.get(::http::header::CONTENT_TYPE)
				.and_then(|value| value.to_str().ok())
				.map(str::to_owned),
			body: request.body().clone(),
		}
	}
}

/// Scripted [`ApiHttpClient`] that answers with canned bodies and records every request.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
	responses: Mutex<VecDeque<(u16, String)>>,
	requests: Mutex<Vec<RecordedRequest>>,
}
impl ScriptedHttpClient {
	/// Queues a response with the given status and JSON body.
	pub fn push(&self, status: u16, body: impl Into<String>) {
		self.responses.lock().push_back((status, body.into()));
	}

	/// Requests received so far, in order.
	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.requests.lock().clone()
	}

	/// URLs requested so far, in order.
	pub fn requested_urls(&self) -> Vec<String> {
		self.requests.lock().iter().map(|request| request.uri.clone()).collect()
	}
}
impl ApiHttpClient for ScriptedHttpClient {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		Box::pin(async move {
			self.requests.lock().push(RecordedRequest::capture(&request));

			let next = self.responses.lock().pop_front();
			let Some((status, body)) = next else {
				return Err(TransportError::network(std::io::Error::other(
					"scripted transport has no response queued",
				)));
			};

			Ok(response(status, body))
		})
	}
}

/// Transport that rejects one credential value with `40001` and accepts everything else.
#[derive(Debug)]
pub struct RejectingHttpClient {
	rejected: String,
	requests: AtomicUsize,
}
impl RejectingHttpClient {
	/// Rejects requests carrying `rejected`.
	pub fn new(rejected: impl Into<String>) -> Self {
		Self { rejected: rejected.into(), requests: AtomicUsize::new(0) }
	}

	/// Number of requests served.
	pub fn requests(&self) -> usize {
		self.requests.load(Ordering::SeqCst)
	}
}
impl ApiHttpClient for RejectingHttpClient {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		Box::pin(async move {
			self.requests.fetch_add(1, Ordering::SeqCst);

			let stale = request
				.uri()
				.query()
				.is_some_and(|query| query.ends_with(&format!("access_token={}", self.rejected)));
			let body = if stale {
				r#"{"errcode":40001,"errmsg":"invalid credential"}"#
			} else {
				r#"{"errcode":0,"errmsg":"ok","button":[]}"#
			};

			Ok(response(200, body))
		})
	}
}

fn response(status: u16, body: impl Into<String>) -> HttpResponse {
	let mut response = HttpResponse::new(body.into().into_bytes());

	*response.status_mut() =
		::http::StatusCode::from_u16(status).expect("Scripted status codes should be valid.");

	response
}

