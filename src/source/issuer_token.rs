// self
use crate::{
	_prelude::*,
	auth::{AppId, AppSecret, Credential},
	http::{self, ApiHttpClient},
	issuer::{IssuerCodeClass, IssuerDescriptor, IssuerStatus},
	obs::{self, OpKind, OpOutcome, OpSpan},
	source::{self, CredentialSource, SourceFuture},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[derive(Deserialize)]
struct TokenGrant {
	access_token: String,
	expires_in: i64,
}

/// Exchanges an application id + secret for an access token at the issuer's token endpoint.
#[derive(Clone)]
pub struct IssuerTokenSource<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// HTTP client used for the token call.
	pub http_client: Arc<C>,
	/// Issuer metadata (endpoint, parameter names, codes).
	pub descriptor: IssuerDescriptor,
	app_id: AppId,
	app_secret: AppSecret,
}
impl<C> IssuerTokenSource<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a source that reuses the caller-provided transport.
	pub fn with_http_client(
		descriptor: IssuerDescriptor,
		app_id: AppId,
		app_secret: AppSecret,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self { http_client: http_client.into(), descriptor, app_id, app_secret }
	}

	/// Application id sent to the issuer.
	pub fn app_id(&self) -> &AppId {
		&self.app_id
	}

	async fn fetch_token(&self) -> Result<Credential> {
		let url = self.descriptor.token_request_url(&self.app_id, &self.app_secret);
		let request = http::build_request(::http::Method::GET, &url, None)?;
		let response = self.http_client.execute(request).await?;

		http::ensure_success(&response)?;

		let status = response.status().as_u16();
		let body = response.body();
		let envelope = http::decode_json::<IssuerStatus>(body, status)?;

		// Expiry codes are terminal here; only wrapped API calls retry them.
		if self.descriptor.classify(envelope.errcode) != IssuerCodeClass::Ok {
			return Err(envelope.into_error().into());
		}

		let grant = http::decode_json::<TokenGrant>(body, status)?;

		source::credential_from_grant(grant.access_token, grant.expires_in)
	}
}
#[cfg(feature = "reqwest")]
impl IssuerTokenSource<ReqwestHttpClient> {
	/// Creates a source backed by a default reqwest client.
	pub fn new(descriptor: IssuerDescriptor, app_id: AppId, app_secret: AppSecret) -> Self {
		Self::with_http_client(descriptor, app_id, app_secret, ReqwestHttpClient::default())
	}
}
impl<C> CredentialSource for IssuerTokenSource<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fetch(&self) -> SourceFuture<'_> {
		Box::pin(async move {
			const KIND: OpKind = OpKind::Fetch;

			let span = OpSpan::new(KIND, "issuer_token");

			obs::record_op_outcome(KIND, OpOutcome::Attempt);

			let result = span.instrument(self.fetch_token()).await;

			obs::record_op_outcome(KIND, OpOutcome::of(&result));

			result
		})
	}
}
impl<C> Debug for IssuerTokenSource<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssuerTokenSource")
			.field("descriptor", &self.descriptor.id)
			.field("app_id", &self.app_id)
			.field("app_secret", &self.app_secret)
			.finish()
	}
}
