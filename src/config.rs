//! Tunable timing knobs for the broker's renewal, refresh, and staleness paths.
//!
//! None of the defaults are load-bearing for correctness; they only shape how hard the
//! broker leans on the issuer. The poll jitter in particular exists purely to keep many
//! callers that tripped over the same stale credential from reaching the refresh path at
//! the same instant.

// crates.io
use rand::Rng;
// self
use crate::_prelude::*;

/// Half-open range `[min, max)` from which the staleness resolver draws its poll budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollJitter {
	/// Smallest poll count (inclusive, at least 1).
	pub min: u32,
	/// Largest poll count (exclusive).
	pub max: u32,
}
impl PollJitter {
	/// Creates a range, normalizing degenerate input.
	///
	/// `min` is raised to 1, and a range with `max <= min` collapses to exactly `min` polls.
	pub fn new(min: u32, max: u32) -> Self {
		let min = min.max(1);

		Self { min, max: max.max(min.saturating_add(1)) }
	}

	/// Draws a poll budget for a single resolver run.
	pub fn sample(&self) -> u32 {
		let normalized = Self::new(self.min, self.max);

		// `u32::MAX` has no exclusive upper bound.
		if normalized.min >= normalized.max {
			return normalized.min;
		}

		rand::rng().random_range(normalized.min..normalized.max)
	}
}
impl Default for PollJitter {
	fn default() -> Self {
		Self { min: 3, max: 10 }
	}
}

/// Broker configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
	/// Minimum spacing between two upstream fetches triggered by explicit refreshes.
	pub debounce_window: StdDuration,
	/// Renewal interval used after a failed fetch.
	pub fallback_interval: StdDuration,
	/// Sleep between two staleness-resolver polls of the credential store.
	pub poll_interval: StdDuration,
	/// Randomized poll budget for the staleness resolver.
	pub poll_jitter: PollJitter,
}
impl BrokerConfig {
	const DEFAULT_DEBOUNCE_WINDOW: StdDuration = StdDuration::from_secs(5);
	// Anything above ~44s keeps a 2000 calls/day quota safe even when every renewal fails.
	const DEFAULT_FALLBACK_INTERVAL: StdDuration = StdDuration::from_secs(60);
	const DEFAULT_POLL_INTERVAL: StdDuration = StdDuration::from_millis(50);

	/// Overrides the debounce window (defaults to 5 seconds).
	pub fn with_debounce_window(mut self, window: StdDuration) -> Self {
		self.debounce_window = window;

		self
	}

	/// Overrides the failure fallback interval (defaults to 60 seconds).
	///
	/// A zero interval would spin the renewal task, so it is raised to one second.
	pub fn with_fallback_interval(mut self, interval: StdDuration) -> Self {
		self.fallback_interval = interval.max(StdDuration::from_secs(1));

		self
	}

	/// Overrides the resolver poll interval (defaults to 50 milliseconds).
	pub fn with_poll_interval(mut self, interval: StdDuration) -> Self {
		self.poll_interval = interval;

		self
	}

	/// Overrides the resolver poll budget range (defaults to `[3, 10)`).
	pub fn with_poll_jitter(mut self, min: u32, max: u32) -> Self {
		self.poll_jitter = PollJitter::new(min, max);

		self
	}
}
impl Default for BrokerConfig {
	fn default() -> Self {
		Self {
			debounce_window: Self::DEFAULT_DEBOUNCE_WINDOW,
			fallback_interval: Self::DEFAULT_FALLBACK_INTERVAL,
			poll_interval: Self::DEFAULT_POLL_INTERVAL,
			poll_jitter: PollJitter::default(),
		}
	}
}
