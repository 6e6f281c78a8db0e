// self
use crate::{
	_prelude::*,
	auth::Credential,
	client::{ApiClient, UrlTemplate},
	http::ApiHttpClient,
	obs::{self, OpKind, OpOutcome, OpSpan},
	source::{self, CredentialSource, SourceFuture},
};

#[derive(Deserialize)]
struct TicketGrant {
	ticket: String,
	expires_in: i64,
}

/// Derives a ticket (such as `jsapi_ticket`) from the access token held by an [`ApiClient`].
///
/// Fetches go through the request wrapper, so a ticket request made with a freshly rotated
/// access token is retried once like any other API call. Wrap the source in its own
/// [`CredentialBroker`](crate::broker::CredentialBroker) to keep tickets renewed.
#[derive(Clone, Debug)]
pub struct TicketSource<C>
where
	C: ?Sized + ApiHttpClient,
{
	client: ApiClient<C>,
	template: UrlTemplate,
}
impl<C> TicketSource<C>
where
	C: ?Sized + ApiHttpClient,
{
	const JSAPI_PATH: &str = "cgi-bin/ticket/getticket?type=jsapi&access_token=";

	/// Creates a source that fetches tickets from `template`.
	pub fn new(client: ApiClient<C>, template: UrlTemplate) -> Self {
		Self { client, template }
	}

	/// Creates a `jsapi_ticket` source rooted at the client's issuer API base.
	pub fn jsapi(client: ApiClient<C>) -> Result<Self> {
		let template = client.descriptor().api_template(Self::JSAPI_PATH)?;

		Ok(Self::new(client, template))
	}

	/// Ticket endpoint template.
	pub fn template(&self) -> &UrlTemplate {
		&self.template
	}

	async fn fetch_ticket(&self) -> Result<Credential> {
		let grant = self.client.get_json::<TicketGrant>(&self.template).await?;

		source::credential_from_grant(grant.ticket, grant.expires_in)
	}
}
impl<C> CredentialSource for TicketSource<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fetch(&self) -> SourceFuture<'_> {
		Box::pin(async move {
			const KIND: OpKind = OpKind::Fetch;

			let span = OpSpan::new(KIND, "ticket");

			obs::record_op_outcome(KIND, OpOutcome::Attempt);

			let result = span.instrument(self.fetch_ticket()).await;

			obs::record_op_outcome(KIND, OpOutcome::of(&result));

			result
		})
	}
}
