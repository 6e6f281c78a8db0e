//! Process-wide credential broker: eager fetch, scheduled renewal, debounced refresh, and
//! staleness resolution over a single [`CredentialStore`].
//!
//! A [`CredentialBroker`] fetches once at construction, then keeps a background task that
//! renews the credential when its (margin-adjusted) validity runs out. Explicit refreshes
//! and scheduled renewals serialize on one async lock, so at most one upstream fetch is in
//! flight at any time; a refresh that lands re-arms the renewal timer with the new
//! credential's lifetime. Callers that saw a credential rejected go through
//! [`CredentialBroker::resolve_new`], which polls the store with a randomized budget before
//! falling back to the debounced refresh.

mod metrics;
mod refresh;
mod renewal;
mod staleness;

pub use metrics::BrokerMetrics;

// crates.io
use tokio::{sync::watch, task::JoinHandle, time::Instant};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	config::BrokerConfig,
	obs::{self, OpKind, OpOutcome, OpSpan},
	source::CredentialSource,
	store::{CredentialState, CredentialStore},
};

/// Boxed future returned by [`TokenService`] methods.
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<Arc<Credential>>> + 'a + Send>>;

/// Credential accessor consumed by [`ApiClient`](crate::client::ApiClient).
///
/// [`CredentialBroker`] is the in-process implementation; other implementations can front a
/// broker that runs elsewhere, as long as they honor the same contract.
pub trait TokenService
where
	Self: 'static + Send + Sync,
{
	/// Returns the current credential without blocking, or the error the store holds.
	fn current_token(&self) -> Result<Arc<Credential>>;

	/// Forces a (debounced) upstream refresh.
	fn force_refresh(&self) -> TokenFuture<'_>;

	/// Returns a credential different from `failed`, refreshing only when polling gives up.
	fn resolve_new<'a>(&'a self, failed: &'a str) -> TokenFuture<'a>;
}
impl<T> TokenService for Arc<T>
where
	T: ?Sized + TokenService,
{
	fn current_token(&self) -> Result<Arc<Credential>> {
		(**self).current_token()
	}

	fn force_refresh(&self) -> TokenFuture<'_> {
		(**self).force_refresh()
	}

	fn resolve_new<'a>(&'a self, failed: &'a str) -> TokenFuture<'a> {
		(**self).resolve_new(failed)
	}
}

/// Shared credential broker.
///
/// Clones share the same store, lock, and renewal task. The renewal task is cancelled when
/// the last clone is dropped.
pub struct CredentialBroker<S>
where
	S: CredentialSource,
{
	inner: Arc<BrokerInner<S>>,
	renewal: Arc<RenewalTask>,
}
impl<S> CredentialBroker<S>
where
	S: CredentialSource,
{
	/// Fetches the first credential and starts the renewal task.
	///
	/// Construction never fails: if the eager fetch fails, the store holds that error and the
	/// renewal task retries on the fallback interval.
	///
	/// # Panics
	///
	/// Panics when called outside a Tokio runtime.
	pub async fn new(source: S, config: BrokerConfig) -> Self {
		let metrics = BrokerMetrics::default();
		let store = CredentialStore::new(fetch_from(&source, &metrics, "eager").await);
		let initial = store.read();
		let interval = next_interval(&config, &initial);

		if let Err(err) = &initial {
			obs::renewal_failed(err, interval);
		}

		let (reschedule, receiver) = watch::channel(interval);
		let inner = Arc::new(BrokerInner {
			source,
			store,
			config,
			metrics,
			refresh: AsyncMutex::new(RefreshState::default()),
			reschedule,
		});
		let task = tokio::spawn(renewal::run(inner.clone(), receiver));

		Self { inner, renewal: Arc::new(RenewalTask(task)) }
	}

	/// Returns the current credential, or [`Error::CredentialUnavailable`] when the last
	/// fetch failed. Never blocks and never calls upstream.
	pub fn current_token(&self) -> Result<Arc<Credential>> {
		self.inner.store.current()
	}

	/// Fetches a new credential unless another refresh ran within the debounce window.
	///
	/// **Dangerous under load.** The issuer rate-limits this call tightly; every caller that
	/// reaches the upstream fetch spends quota. Prefer [`resolve_new`](Self::resolve_new) after
	/// a rejected credential, which only refreshes when polling the store fails to surface a
	/// newer value.
	pub async fn force_refresh(&self) -> Result<Arc<Credential>> {
		const KIND: OpKind = OpKind::Refresh;

		let span = OpSpan::new(KIND, "force_refresh");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.inner.refresh()).await;

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}

	/// Returns a credential whose value differs from `failed`.
	pub async fn resolve_new(&self, failed: &str) -> Result<Arc<Credential>> {
		const KIND: OpKind = OpKind::Resolve;

		let span = OpSpan::new(KIND, "resolve_new");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.inner.resolve_new(failed)).await;

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}

	/// In-process counters.
	pub fn metrics(&self) -> &BrokerMetrics {
		&self.inner.metrics
	}

	/// Active configuration.
	pub fn config(&self) -> &BrokerConfig {
		&self.inner.config
	}

	/// Underlying credential store.
	pub fn store(&self) -> &CredentialStore {
		&self.inner.store
	}

	/// Credential source the broker fetches from.
	pub fn source(&self) -> &S {
		&self.inner.source
	}
}
impl<S> Clone for CredentialBroker<S>
where
	S: CredentialSource,
{
	fn clone(&self) -> Self {
		Self { inner: self.inner.clone(), renewal: self.renewal.clone() }
	}
}
impl<S> Debug for CredentialBroker<S>
where
	S: CredentialSource,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialBroker")
			.field("config", &self.inner.config)
			.field("metrics", &self.inner.metrics)
			.finish_non_exhaustive()
	}
}
impl<S> TokenService for CredentialBroker<S>
where
	S: CredentialSource,
{
	fn current_token(&self) -> Result<Arc<Credential>> {
		CredentialBroker::current_token(self)
	}

	fn force_refresh(&self) -> TokenFuture<'_> {
		Box::pin(CredentialBroker::force_refresh(self))
	}

	fn resolve_new<'a>(&'a self, failed: &'a str) -> TokenFuture<'a> {
		Box::pin(CredentialBroker::resolve_new(self, failed))
	}
}

struct BrokerInner<S> {
	source: S,
	store: CredentialStore,
	config: BrokerConfig,
	metrics: BrokerMetrics,
	// Serializes every upstream fetch after construction.
	refresh: AsyncMutex<RefreshState>,
	reschedule: watch::Sender<StdDuration>,
}
impl<S> BrokerInner<S>
where
	S: CredentialSource,
{
	async fn fetch_and_store(&self, stage: &'static str) -> CredentialState {
		self.store.write(fetch_from(&self.source, &self.metrics, stage).await)
	}
}

#[derive(Debug, Default)]
struct RefreshState {
	last_refresh_at: Option<Instant>,
}

struct RenewalTask(JoinHandle<()>);
impl Drop for RenewalTask {
	fn drop(&mut self) {
		self.0.abort();
	}
}

async fn fetch_from<S>(
	source: &S,
	metrics: &BrokerMetrics,
	stage: &'static str,
) -> Result<Credential>
where
	S: CredentialSource,
{
	const KIND: OpKind = OpKind::Fetch;

	let span = OpSpan::new(KIND, stage);

	metrics.record_upstream_fetch();

	span.instrument(source.fetch()).await
}

/// Renewal interval after a fetch: the credential's lifetime, or the fallback on failure.
fn next_interval(config: &BrokerConfig, state: &CredentialState) -> StdDuration {
	state
		.as_ref()
		.ok()
		.and_then(|credential| StdDuration::try_from(credential.lifetime()).ok())
		.filter(|interval| !interval.is_zero())
		.unwrap_or(config.fallback_interval)
}
