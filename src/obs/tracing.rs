// self
use crate::{_prelude::*, error::RefreshFailure, obs::OutcomeKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRefresh<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRefresh<F> = F;

/// Span wrapper used by refresher invocations.
#[derive(Clone, Debug)]
pub struct RefreshSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RefreshSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("token_refresher.refresh", stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRefresh<Fut>
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

/// Emits the log event for a terminal state; fresh-token reuse stays silent.
pub fn log_outcome(outcome: OutcomeKind, failure: Option<&RefreshFailure>) {
	#[cfg(feature = "tracing")]
	{
		let status = failure.and_then(RefreshFailure::status);

		match outcome {
			OutcomeKind::Valid => {},
			OutcomeKind::Refreshed => tracing::info!("Token refreshed successfully."),
			OutcomeKind::NoRefreshToken =>
				tracing::warn!("No refresh token present, cannot refresh."),
			OutcomeKind::Revoked =>
				tracing::warn!(status, "Refresh token rejected, credential cookies cleared."),
			OutcomeKind::FailedTransient => tracing::warn!(
				status,
				error = failure.map(tracing::field::display),
				"Refresh token failed."
			),
		}
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (outcome, failure);
	}
}
