// self
use crate::{_prelude::*, obs::OpKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by broker operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("token_broker.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits the event for a failed renewal and the interval the scheduler falls back to.
pub(crate) fn renewal_failed(err: &Error, retry_in: StdDuration) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(error = %err, retry_in_secs = retry_in.as_secs(), "Credential renewal failed.");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (err, retry_in);
	}
}

/// Emits the event for a refresh absorbed by the debounce window.
pub(crate) fn refresh_debounced(since_last: StdDuration) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			since_last_ms = u64::try_from(since_last.as_millis()).unwrap_or(u64::MAX),
			"Refresh debounced; returning the current credential."
		);
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = since_last;
	}
}

/// Emits the event for a resolver that exhausted its poll budget.
pub(crate) fn resolver_fell_through(polls: u32) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(polls, "Credential unchanged after polling; forcing a refresh.");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = polls;
	}
}

/// Emits the event for a wrapped call retried after an expiry code.
pub(crate) fn expiry_retry(code: i64) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(code, "Issuer rejected the credential; retrying once with a newer one.");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = code;
	}
}
