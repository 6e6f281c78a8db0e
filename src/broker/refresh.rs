// crates.io
use tokio::time::Instant;
// self
use crate::{
	_prelude::*,
	auth::Credential,
	broker::{self, BrokerInner},
	obs,
	source::CredentialSource,
};

impl<S> BrokerInner<S>
where
	S: CredentialSource,
{
	/// Debounced refresh.
	///
	/// Callers queue on the refresh lock. The first one through fetches, stores the result,
	/// re-arms the renewal timer, and stamps the refresh time; anyone arriving within the
	/// debounce window after that gets the stored result without an upstream call.
	pub(super) async fn refresh(&self) -> Result<Arc<Credential>> {
		self.metrics.record_forced_refresh();

		let mut state = self.refresh.lock().await;
		let since_last =
			state.last_refresh_at.map(|at| Instant::now().saturating_duration_since(at));

		if let Some(since_last) = since_last.filter(|since| *since < self.config.debounce_window)
		{
			self.metrics.record_debounced_refresh();
			obs::refresh_debounced(since_last);

			return self.store.current();
		}

		let outcome = self.fetch_and_store("refresh").await;

		self.reschedule.send_replace(broker::next_interval(&self.config, &outcome));
		// Stamped after failed fetches as well.
		state.last_refresh_at = Some(Instant::now());

		outcome.map_err(Error::CredentialUnavailable)
	}
}
