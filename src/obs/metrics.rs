// self
use crate::obs::OutcomeKind;

/// Records an invocation outcome via the global metrics recorder (when enabled).
pub fn record_refresh_outcome(outcome: OutcomeKind) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("token_refresher_refresh_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
