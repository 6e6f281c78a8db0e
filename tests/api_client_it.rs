mod support;

// std
use std::sync::Arc;
// crates.io
use serde_json::{Value, json};
use time::Duration;
// self
use support::{MENU_TEMPLATE, RejectingHttpClient, ScriptedHttpClient, ScriptedSource};
use token_broker::{
	broker::CredentialBroker,
	client::{ApiClient, UrlTemplate},
	config::BrokerConfig,
	error::{Error, TransportError},
	http::ApiHttpClient,
};

type Broker = CredentialBroker<Arc<ScriptedSource>>;

async fn client_over<C>(
	source: ScriptedSource,
	http_client: Arc<C>,
) -> (Arc<ScriptedSource>, Broker, ApiClient<C>)
where
	C: ApiHttpClient,
{
	let source = Arc::new(source);
	let broker = CredentialBroker::new(source.clone(), BrokerConfig::default()).await;
	let client =
		ApiClient::with_http_client(broker.clone(), support::scripted_descriptor(), http_client);

	(source, broker, client)
}

fn menu_template() -> UrlTemplate {
	UrlTemplate::new(MENU_TEMPLATE).expect("Menu template should be valid.")
}

#[tokio::test(start_paused = true)]
async fn expiry_code_retries_once_with_a_newer_credential() {
	let http_client = Arc::new(ScriptedHttpClient::default());

	http_client.push(200, r#"{"errcode":40001,"errmsg":"invalid credential"}"#);
	http_client.push(200, r#"{"errcode":0,"errmsg":"ok","menu":{"button":[]}}"#);

	let (source, broker, client) =
		client_over(ScriptedSource::sequential(Duration::hours(2)), http_client.clone()).await;
	let menu =
		client.get_json::<Value>(&menu_template()).await.expect("Retried call should succeed.");

	assert_eq!(menu["menu"]["button"], json!([]));
	assert_eq!(
		http_client.requested_urls(),
		[format!("{MENU_TEMPLATE}token-1"), format!("{MENU_TEMPLATE}token-2")],
	);
	assert_eq!(source.calls(), 2);
	assert_eq!(client.metrics().attempts(), 2);
	assert_eq!(client.metrics().expiry_retries(), 1);
	assert_eq!(broker.metrics().resolver_fall_throughs(), 1);
}

#[tokio::test(start_paused = true)]
async fn second_expiry_is_returned_without_a_third_attempt() {
	let http_client = Arc::new(ScriptedHttpClient::default());

	http_client.push(200, r#"{"errcode":42001,"errmsg":"access_token expired"}"#);
	http_client.push(200, r#"{"errcode":42001,"errmsg":"access_token expired"}"#);
	http_client.push(200, r#"{"errcode":0,"errmsg":"ok"}"#);

	let (_, _broker, client) =
		client_over(ScriptedSource::sequential(Duration::hours(2)), http_client.clone()).await;
	let err = client
		.get_json::<Value>(&menu_template())
		.await
		.expect_err("A second expiry code should be terminal.");

	assert_eq!(err.issuer_code(), Some(42001));
	assert_eq!(http_client.requests().len(), 2);
	assert_eq!(client.metrics().attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn other_issuer_codes_are_not_retried() {
	let http_client = Arc::new(ScriptedHttpClient::default());

	http_client.push(200, r#"{"errcode":40013,"errmsg":"invalid appid"}"#);

	let (source, _broker, client) =
		client_over(ScriptedSource::sequential(Duration::hours(2)), http_client.clone()).await;
	let err = client
		.get_json::<Value>(&menu_template())
		.await
		.expect_err("Terminal issuer codes should surface.");

	match err {
		Error::Issuer(err) => {
			assert_eq!(err.code, 40013);
			assert_eq!(err.message, "invalid appid");
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert_eq!(http_client.requests().len(), 1);
	assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn http_and_transport_failures_are_not_retried() {
	let http_client = Arc::new(ScriptedHttpClient::default());

	http_client.push(503, "Service Unavailable");

	let (_, _broker, client) =
		client_over(ScriptedSource::sequential(Duration::hours(2)), http_client.clone()).await;
	let err = client
		.get_json::<Value>(&menu_template())
		.await
		.expect_err("HTTP status failures should surface.");

	assert!(matches!(err, Error::HttpStatus { status: 503 }));

	// Nothing queued: the scripted transport fails at the network layer.
	let err = client
		.get_json::<Value>(&menu_template())
		.await
		.expect_err("Transport failures should surface.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
	assert_eq!(http_client.requests().len(), 2);
	assert_eq!(client.metrics().expiry_retries(), 0);
}

#[tokio::test(start_paused = true)]
async fn malformed_bodies_surface_as_decode_errors() {
	let http_client = Arc::new(ScriptedHttpClient::default());

	http_client.push(200, "<xml>not json</xml>");

	let (_, _broker, client) =
		client_over(ScriptedSource::sequential(Duration::hours(2)), http_client.clone()).await;
	let err = client
		.get_json::<Value>(&menu_template())
		.await
		.expect_err("Non-JSON bodies should fail to decode.");

	assert!(matches!(err, Error::Decode { status: 200, .. }));
}

#[tokio::test(start_paused = true)]
async fn unavailable_credentials_fail_before_any_request() {
	let http_client = Arc::new(ScriptedHttpClient::default());
	let (_, _broker, client) =
		client_over(ScriptedSource::always_failing(), http_client.clone()).await;
	let err = client
		.get_json::<Value>(&menu_template())
		.await
		.expect_err("Calls should fail while the store holds an error.");

	assert!(matches!(err, Error::CredentialUnavailable(_)));
	assert!(http_client.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn post_json_sends_the_serialized_body() {
	let http_client = Arc::new(ScriptedHttpClient::default());

	http_client.push(200, r#"{"errcode":0,"errmsg":"ok","msgid":42}"#);

	let (_, _broker, client) =
		client_over(ScriptedSource::sequential(Duration::hours(2)), http_client.clone()).await;
	let payload = json!({ "touser": "user-1", "msgtype": "text", "text": { "content": "hi" } });
	let response = client
		.post_json::<_, Value>(&menu_template(), &payload)
		.await
		.expect("POST call should succeed.");
	let requests = http_client.requests();
	let sent = serde_json::from_slice::<Value>(&requests[0].body)
		.expect("Recorded body should be JSON.");

	assert_eq!(response["msgid"], 42);
	assert_eq!(requests[0].method, ::http::Method::POST);
	assert_eq!(requests[0].content_type.as_deref(), Some("application/json; charset=utf-8"));
	assert_eq!(sent, payload);
	assert!(
		client.current_token().expect("Client should expose the current token.").matches("token-1")
	);
}

#[tokio::test(start_paused = true)]
async fn concurrent_rejections_collapse_into_one_refresh() {
	let http_client = Arc::new(RejectingHttpClient::new("token-1"));
	let (source, broker, client) =
		client_over(ScriptedSource::sequential(Duration::hours(2)), http_client.clone()).await;
	let callers = (0..50)
		.map(|_| {
			let client = client.clone();

			tokio::spawn(async move { client.get_json::<Value>(&menu_template()).await })
		})
		.collect::<Vec<_>>();

	for caller in callers {
		caller.await.expect("Caller task should not panic.").expect("Caller should recover.");
	}

	let metrics = broker.metrics();

	assert_eq!(source.calls(), 2);
	assert_eq!(client.metrics().expiry_retries(), 50);
	assert_eq!(http_client.requests(), 100);
	assert_eq!(metrics.resolver_poll_hits() + metrics.resolver_fall_throughs(), 50);
	assert_eq!(metrics.forced_refreshes() - metrics.debounced_refreshes(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rejections_stay_bounded_across_threads() {
	let http_client = Arc::new(RejectingHttpClient::new("token-1"));
	let (source, _broker, client) =
		client_over(ScriptedSource::sequential(Duration::hours(2)), http_client.clone()).await;
	let callers = (0..50)
		.map(|_| {
			let client = client.clone();

			tokio::spawn(async move { client.get_json::<Value>(&menu_template()).await })
		})
		.collect::<Vec<_>>();

	for caller in callers {
		caller.await.expect("Caller task should not panic.").expect("Caller should recover.");
	}

	assert!(source.calls() <= 3, "Upstream fetched {} times.", source.calls());
}
