//! Demonstrates a credential broker keeping a public-account access token fresh while an
//! `ApiClient` transparently retries a call after the issuer invalidates that token.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use url::Url;
// self
use token_broker::{
	auth::{AppId, AppSecret},
	broker::CredentialBroker,
	client::ApiClient,
	config::BrokerConfig,
	issuer::{IssuerDescriptor, IssuerStatus},
	source::IssuerTokenSource,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let mut token_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token").query_param("appid", "wx-demo");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"demo-first","expires_in":7200}"#);
		})
		.await;
	// Same parameter names and codes as the real public-account issuer, pointed at the mock.
	let preset = IssuerDescriptor::public_account()?;
	let descriptor = IssuerDescriptor::builder(preset.id)
		.token_endpoint(Url::parse(&server.url("/cgi-bin/token?grant_type=client_credential"))?)
		.codes(preset.codes)
		.build()?;
	let source = IssuerTokenSource::new(
		descriptor.clone(),
		AppId::new("wx-demo")?,
		AppSecret::new("demo-secret"),
	);
	let broker = CredentialBroker::new(source, BrokerConfig::default()).await;

	println!("Eagerly fetched token valid until {}.", broker.current_token()?.valid_until());

	// The issuer rotates the token out of band; only the new one is accepted from now on.
	token_mock.delete_async().await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token");
			then.status(200).body(r#"{"access_token":"demo-second","expires_in":7200}"#);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/cgi-bin/menu/create").query_param("access_token", "demo-first");
			then.status(200).body(r#"{"errcode":40001,"errmsg":"invalid credential"}"#);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/cgi-bin/menu/create").query_param("access_token", "demo-second");
			then.status(200).body(r#"{"errcode":0,"errmsg":"ok"}"#);
		})
		.await;

	let client = ApiClient::new(broker.clone(), descriptor);
	let template = client.descriptor().api_template("cgi-bin/menu/create?access_token=")?;
	let status = client
		.post_json::<_, IssuerStatus>(
			&template,
			&json!({ "button": [{ "type": "view", "name": "Docs", "url": "https://example.com" }] }),
		)
		.await?;

	println!(
		"Menu created with errcode {} after {} attempt(s); broker fetched {} time(s).",
		status.errcode,
		client.metrics().attempts(),
		broker.metrics().upstream_fetches(),
	);

	Ok(())
}
