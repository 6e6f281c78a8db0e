//! Request wrapper used by every higher-level API call.
//!
//! [`ApiClient`] completes a [`UrlTemplate`] with the current credential, executes the call
//! once, and inspects the issuer's error envelope. Expiry codes trigger exactly one retry with
//! a credential obtained from [`TokenService::resolve_new`]; everything else (other codes,
//! HTTP status failures, transport failures) is returned to the caller unchanged.

mod template;

pub use template::UrlTemplate;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	broker::TokenService,
	error::{ConfigError, IssuerError},
	http::{self, ApiHttpClient, HttpResponse},
	issuer::{IssuerCodeClass, IssuerDescriptor, IssuerStatus},
	obs::{self, OpKind, OpOutcome, OpSpan},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Thread-safe counters for wrapped calls.
#[derive(Debug, Default)]
pub struct ClientMetrics {
	calls: AtomicU64,
	attempts: AtomicU64,
	expiry_retries: AtomicU64,
}
impl ClientMetrics {
	/// Returns the number of wrapped calls.
	pub fn calls(&self) -> u64 {
		self.calls.load(Ordering::Relaxed)
	}

	/// Returns the number of requests sent to the issuer (at most two per call).
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of calls retried after an expiry code.
	pub fn expiry_retries(&self) -> u64 {
		self.expiry_retries.load(Ordering::Relaxed)
	}
}

enum Attempt {
	Done(HttpResponse),
	Expired(IssuerError),
}

/// Issuer API client that attaches credentials and retries once on expiry.
pub struct ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	tokens: Arc<dyn TokenService>,
	http_client: Arc<C>,
	descriptor: IssuerDescriptor,
	metrics: Arc<ClientMetrics>,
}
impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_http_client(
		tokens: impl TokenService,
		descriptor: IssuerDescriptor,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			tokens: Arc::new(tokens),
			http_client: http_client.into(),
			descriptor,
			metrics: Default::default(),
		}
	}

	/// Issuer metadata used for code classification.
	pub fn descriptor(&self) -> &IssuerDescriptor {
		&self.descriptor
	}

	/// Counters shared by all clones of this client.
	pub fn metrics(&self) -> &ClientMetrics {
		&self.metrics
	}

	/// Returns the credential wrapped calls would currently attach.
	pub fn current_token(&self) -> Result<Arc<Credential>> {
		self.tokens.current_token()
	}

	/// Forces a debounced refresh through the token service.
	///
	/// **Dangerous under load**; see
	/// [`CredentialBroker::force_refresh`](crate::broker::CredentialBroker::force_refresh).
	pub async fn force_refresh(&self) -> Result<Arc<Credential>> {
		self.tokens.force_refresh().await
	}

	/// Issues a GET and decodes the response body.
	pub async fn get_json<T>(&self, template: &UrlTemplate) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.call(::http::Method::GET, template, None).await?;

		http::decode_json(response.body(), response.status().as_u16())
	}

	/// Issues a JSON POST and decodes the response body.
	pub async fn post_json<B, T>(&self, template: &UrlTemplate, body: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		let body = serde_json::to_vec(body)
			.map_err(|source| Error::from(ConfigError::RequestBody { source }))?;
		let response = self.call(::http::Method::POST, template, Some(body)).await?;

		http::decode_json(response.body(), response.status().as_u16())
	}

	/// Executes a wrapped call and returns the response once the issuer reports success.
	///
	/// `body`, when present, is sent as JSON. The call is attempted at most twice.
	pub async fn call(
		&self,
		method: ::http::Method,
		template: &UrlTemplate,
		body: Option<Vec<u8>>,
	) -> Result<HttpResponse> {
		const KIND: OpKind = OpKind::Call;

		let span = OpSpan::new(KIND, "call");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		self.metrics.calls.fetch_add(1, Ordering::Relaxed);

		let result = span.instrument(self.call_with_retry(&method, template, body)).await;

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}

	async fn call_with_retry(
		&self,
		method: &::http::Method,
		template: &UrlTemplate,
		body: Option<Vec<u8>>,
	) -> Result<HttpResponse> {
		let credential = self.tokens.current_token()?;
		let rejected = match self.attempt(method, template, body.clone(), &credential).await? {
			Attempt::Done(response) => return Ok(response),
			Attempt::Expired(err) => err,
		};

		self.metrics.expiry_retries.fetch_add(1, Ordering::Relaxed);
		obs::expiry_retry(rejected.code);

		let newer = self.tokens.resolve_new(credential.secret().expose()).await?;

		match self.attempt(method, template, body, &newer).await? {
			Attempt::Done(response) => Ok(response),
			Attempt::Expired(err) => Err(err.into()),
		}
	}

	async fn attempt(
		&self,
		method: &::http::Method,
		template: &UrlTemplate,
		body: Option<Vec<u8>>,
		credential: &Credential,
	) -> Result<Attempt> {
		let url = template.complete(credential.secret().expose())?;
		let request = http::build_request(method.clone(), &url, body)?;

		self.metrics.attempts.fetch_add(1, Ordering::Relaxed);

		let response = self.http_client.execute(request).await?;

		self.inspect(response)
	}

	fn inspect(&self, response: HttpResponse) -> Result<Attempt> {
		http::ensure_success(&response)?;

		let status = response.status().as_u16();
		let envelope = http::decode_json::<IssuerStatus>(response.body(), status)?;

		match self.descriptor.classify(envelope.errcode) {
			IssuerCodeClass::Ok => Ok(Attempt::Done(response)),
			IssuerCodeClass::CredentialExpired => Ok(Attempt::Expired(envelope.into_error())),
			IssuerCodeClass::Terminal => Err(envelope.into_error().into()),
		}
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestHttpClient> {
	/// Creates a client backed by a default reqwest client.
	pub fn new(tokens: impl TokenService, descriptor: IssuerDescriptor) -> Self {
		Self::with_http_client(tokens, descriptor, ReqwestHttpClient::default())
	}
}
impl<C> Clone for ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			tokens: self.tokens.clone(),
			http_client: self.http_client.clone(),
			descriptor: self.descriptor.clone(),
			metrics: self.metrics.clone(),
		}
	}
}
impl<C> Debug for ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("descriptor", &self.descriptor.id)
			.field("metrics", &self.metrics)
			.finish_non_exhaustive()
	}
}
