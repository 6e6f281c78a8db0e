// crates.io
use tokio::time;
// self
use crate::{_prelude::*, auth::Credential, broker::BrokerInner, obs, source::CredentialSource};

impl<S> BrokerInner<S>
where
	S: CredentialSource,
{
	/// Polls the store for a credential other than `failed`, then falls back to a refresh.
	///
	/// Store errors count as "not yet different". There is no sleep after the final poll.
	pub(super) async fn resolve_new(&self, failed: &str) -> Result<Arc<Credential>> {
		let polls = self.config.poll_jitter.sample();

		for poll in 1..=polls {
			if let Some(current) = self.store.read().ok().filter(|current| !current.matches(failed))
			{
				self.metrics.record_resolver_poll_hit();

				return Ok(current);
			}
			if poll < polls {
				time::sleep(self.config.poll_interval).await;
			}
		}

		self.metrics.record_resolver_fall_through();
		obs::resolver_fell_through(polls);

		self.refresh().await
	}
}
