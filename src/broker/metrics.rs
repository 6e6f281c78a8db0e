// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing how hard the broker leans on its source.
#[derive(Debug, Default)]
pub struct BrokerMetrics {
	upstream_fetches: AtomicU64,
	renewals: AtomicU64,
	renewal_failures: AtomicU64,
	forced_refreshes: AtomicU64,
	debounced_refreshes: AtomicU64,
	resolver_poll_hits: AtomicU64,
	resolver_fall_throughs: AtomicU64,
}
impl BrokerMetrics {
	/// Returns the number of calls made to the credential source (eager, renewal, refresh).
	pub fn upstream_fetches(&self) -> u64 {
		self.upstream_fetches.load(Ordering::Relaxed)
	}

	/// Returns the number of fetches driven by the renewal timer.
	pub fn renewals(&self) -> u64 {
		self.renewals.load(Ordering::Relaxed)
	}

	/// Returns the number of timer-driven fetches that failed.
	pub fn renewal_failures(&self) -> u64 {
		self.renewal_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of explicit refresh requests (debounced or not).
	pub fn forced_refreshes(&self) -> u64 {
		self.forced_refreshes.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh requests absorbed by the debounce window.
	pub fn debounced_refreshes(&self) -> u64 {
		self.debounced_refreshes.load(Ordering::Relaxed)
	}

	/// Returns the number of resolver runs satisfied by polling the store.
	pub fn resolver_poll_hits(&self) -> u64 {
		self.resolver_poll_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of resolver runs that fell through to an explicit refresh.
	pub fn resolver_fall_throughs(&self) -> u64 {
		self.resolver_fall_throughs.load(Ordering::Relaxed)
	}

	pub(crate) fn record_upstream_fetch(&self) {
		self.upstream_fetches.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_renewal(&self) {
		self.renewals.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_renewal_failure(&self) {
		self.renewal_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_forced_refresh(&self) {
		self.forced_refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_debounced_refresh(&self) {
		self.debounced_refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_resolver_poll_hit(&self) {
		self.resolver_poll_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_resolver_fall_through(&self) {
		self.resolver_fall_throughs.fetch_add(1, Ordering::Relaxed);
	}
}
