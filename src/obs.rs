//! Optional observability helpers for the refresher.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to run every invocation inside a span named
//!   `token_refresher.refresh` with a `stage` field, and to emit the warning/info events for
//!   each terminal state.
//! - Enable `metrics` to increment the `token_refresher_refresh_total` counter once per
//!   invocation, labeled by `outcome`.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Terminal state reached by one refresher invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
	/// Cached access token was still fresh.
	Valid,
	/// Tokens were rotated through the refresh endpoint.
	Refreshed,
	/// Request carried no refresh token.
	NoRefreshToken,
	/// Refresh endpoint rejected the refresh token; cookies were purged.
	Revoked,
	/// Refresh call failed for any other reason; cookies were left untouched.
	FailedTransient,
}
impl OutcomeKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OutcomeKind::Valid => "valid",
			OutcomeKind::Refreshed => "refreshed",
			OutcomeKind::NoRefreshToken => "no_refresh_token",
			OutcomeKind::Revoked => "revoked",
			OutcomeKind::FailedTransient => "failed_transient",
		}
	}

	/// Returns `true` when the invocation produced a usable access token.
	pub const fn is_success(self) -> bool {
		matches!(self, OutcomeKind::Valid | OutcomeKind::Refreshed)
	}
}
impl Display for OutcomeKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
