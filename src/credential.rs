//! Credential state carried by request cookies: the redacted secret wrapper, the
//! per-request credential bundle, and the cookie store seam.

pub mod jar;

pub use jar::*;

// self
use crate::{_prelude::*, config::CookieNames};

/// Credential string whose formatters never print the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a token value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Borrows the raw token; keep it out of logs.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Unwraps the raw token.
	pub fn into_inner(self) -> String {
		self.0
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenSecret(<redacted>)")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Snapshot of the credential cookies attached to one request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialBundle {
	/// Bearer credential for downstream API calls.
	pub access_token: Option<TokenSecret>,
	/// Long-lived credential used to mint new access tokens.
	pub refresh_token: Option<TokenSecret>,
	/// Absolute expiry of the access token in epoch milliseconds (`0` when unknown).
	pub expires_at_ms: i64,
}
impl CredentialBundle {
	/// Reads the bundle from the context's cookies.
	///
	/// Empty cookie values count as absent. A missing or unparsable expiry reads as `0`,
	/// which always forces a refresh.
	pub fn read<R>(ctx: &R, names: &CookieNames) -> Self
	where
		R: ?Sized + RequestContext,
	{
		Self {
			access_token: non_empty(ctx.cookie(&names.access_token)).map(TokenSecret::new),
			refresh_token: non_empty(ctx.cookie(&names.refresh_token)).map(TokenSecret::new),
			expires_at_ms: parse_expiry(ctx.cookie(&names.expires_at)),
		}
	}

	/// Returns `true` while the access token is present and
	/// `now_ms < expires_at_ms - skew_ms`.
	pub fn is_fresh_at(&self, now_ms: i64, skew_ms: i64) -> bool {
		self.access_token.is_some() && now_ms < self.expires_at_ms.saturating_sub(skew_ms)
	}
}

/// Parses an expiry cookie value from its leading integer prefix (optional sign, then
/// ASCII digits), ignoring any trailing characters.
///
/// Defaults to `0` when the cookie is absent or carries no leading digits. Values beyond
/// the `i64` range saturate.
pub fn parse_expiry(raw: Option<&str>) -> i64 {
	let Some(value) = raw.map(str::trim_start) else { return 0 };
	let (negative, unsigned) = match value.as_bytes().first() {
		Some(b'-') => (true, &value[1..]),
		Some(b'+') => (false, &value[1..]),
		_ => (false, value),
	};
	let digits_len = unsigned.bytes().take_while(u8::is_ascii_digit).count();

	if digits_len == 0 {
		return 0;
	}

	let digits = &unsigned[..digits_len];

	match (digits.parse::<i64>(), negative) {
		(Ok(parsed), true) => -parsed,
		(Ok(parsed), false) => parsed,
		(Err(_), true) => i64::MIN,
		(Err(_), false) => i64::MAX,
	}
}

/// Converts an instant to epoch milliseconds.
pub fn epoch_millis(instant: OffsetDateTime) -> i64 {
	i64::try_from(instant.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
	value.filter(|value| !value.is_empty())
}
