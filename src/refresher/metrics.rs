// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::OutcomeKind;

/// Thread-safe per-refresher counters.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	cache_hits: AtomicU64,
	attempts: AtomicU64,
	successes: AtomicU64,
	revocations: AtomicU64,
	failures: AtomicU64,
	missing_refresh_token: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the number of invocations answered from the cached access token.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of outbound refresh calls.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of successful token rotations.
	pub fn successes(&self) -> u64 {
		self.successes.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh calls rejected with 401/403.
	pub fn revocations(&self) -> u64 {
		self.revocations.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh calls that failed transiently.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Returns the number of invocations without a refresh token.
	pub fn missing_refresh_token(&self) -> u64 {
		self.missing_refresh_token.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record(&self, outcome: OutcomeKind) {
		let counter = match outcome {
			OutcomeKind::Valid => &self.cache_hits,
			OutcomeKind::Refreshed => &self.successes,
			OutcomeKind::NoRefreshToken => &self.missing_refresh_token,
			OutcomeKind::Revoked => &self.revocations,
			OutcomeKind::FailedTransient => &self.failures,
		};

		counter.fetch_add(1, Ordering::Relaxed);
	}
}
