// crates.io
use tokio::{sync::watch, time};
// self
use crate::{
	_prelude::*,
	broker::{self, BrokerInner},
	obs::{self, OpKind, OpOutcome, OpSpan},
	source::CredentialSource,
};

/// Drives scheduled renewals until the reschedule channel closes or the task is aborted.
///
/// The loop waits on two events: the timer for the current interval, and a reschedule
/// published by a refresh. A reschedule replaces the timer without fetching.
pub(super) async fn run<S>(
	inner: Arc<BrokerInner<S>>,
	mut reschedule: watch::Receiver<StdDuration>,
) where
	S: CredentialSource,
{
	let mut interval = *reschedule.borrow_and_update();

	loop {
		tokio::select! {
			changed = reschedule.changed() => {
				if changed.is_err() {
					return;
				}

				interval = *reschedule.borrow_and_update();

				continue;
			},
			_ = time::sleep(interval) => {},
		}

		if let Some(next) = inner.renew(&mut reschedule).await {
			interval = next;
		}
	}
}

impl<S> BrokerInner<S>
where
	S: CredentialSource,
{
	/// Performs one timer-driven fetch and returns the next interval.
	///
	/// Returns `None` without fetching when a refresh published a new schedule while this
	/// timer waited for the refresh lock; the pending reschedule then re-arms the timer.
	async fn renew(&self, reschedule: &mut watch::Receiver<StdDuration>) -> Option<StdDuration> {
		const KIND: OpKind = OpKind::Renewal;

		let _refresh = self.refresh.lock().await;

		if reschedule.has_changed().unwrap_or(true) {
			return None;
		}

		let span = OpSpan::new(KIND, "scheduled");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		self.metrics.record_renewal();

		let state = span.instrument(self.fetch_and_store("renewal")).await;
		let interval = broker::next_interval(&self.config, &state);

		match &state {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(err) => {
				self.metrics.record_renewal_failure();
				obs::renewal_failed(err, interval);
				obs::record_op_outcome(KIND, OpOutcome::Failure);
			},
		}

		Some(interval)
	}
}
