//! Refresher configuration: the authentication service location, credential cookie names,
//! and the freshness skew margin.
//!
//! Configuration is always handed to [`TokenRefresher`](crate::refresher::TokenRefresher)
//! explicitly; nothing is read from process-wide state.

/// Builder API for assembling refresher configuration.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Path appended to the base URL to reach the refresh endpoint.
pub const REFRESH_TOKEN_PATH: &str = "/auth/refresh-token";
/// Margin subtracted from the expiry so a token never expires mid-request.
pub const DEFAULT_SKEW_MARGIN: Duration = Duration::milliseconds(10_000);

/// Names of the three credential cookies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieNames {
	/// Cookie carrying the access token.
	pub access_token: String,
	/// Cookie carrying the refresh token.
	pub refresh_token: String,
	/// Cookie carrying the access token expiry, in epoch milliseconds.
	pub expires_at: String,
}
impl CookieNames {
	/// Creates a custom cookie name set.
	pub fn new(
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
		expires_at: impl Into<String>,
	) -> Self {
		Self {
			access_token: access_token.into(),
			refresh_token: refresh_token.into(),
			expires_at: expires_at.into(),
		}
	}

	/// Iterates over the names in access/refresh/expiry order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		[self.access_token.as_str(), self.refresh_token.as_str(), self.expires_at.as_str()]
			.into_iter()
	}

	fn validate(&self) -> Result<(), ConfigError> {
		let roles = [
			("access token", &self.access_token),
			("refresh token", &self.refresh_token),
			("expiry", &self.expires_at),
		];

		for (role, name) in roles {
			if !is_valid_cookie_name(name) {
				return Err(ConfigError::InvalidCookieName { role, name: name.clone() });
			}
		}
		for (idx, (_, name)) in roles.iter().enumerate() {
			if roles[idx + 1..].iter().any(|(_, other)| other == name) {
				return Err(ConfigError::DuplicateCookieName { name: (*name).clone() });
			}
		}

		Ok(())
	}
}
impl Default for CookieNames {
	fn default() -> Self {
		Self::new("access_token", "refresh_token", "exp_time")
	}
}

/// Validated refresher configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefresherConfig {
	/// Base URL of the authentication service.
	pub base_url: Url,
	/// Fully resolved refresh endpoint.
	pub refresh_endpoint: Url,
	/// Credential cookie names.
	pub cookie_names: CookieNames,
	/// Margin subtracted from the expiry when judging freshness.
	pub skew_margin: Duration,
}
impl RefresherConfig {
	/// Creates a builder seeded with the provided base URL.
	pub fn builder(base_url: Url) -> RefresherConfigBuilder {
		RefresherConfigBuilder::new(base_url)
	}

	/// Parses `base_url` and builds a configuration with default cookie names and skew margin.
	pub fn new(base_url: &str) -> Result<Self, ConfigError> {
		let base_url =
			Url::parse(base_url).map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		Self::builder(base_url).build()
	}

	/// Returns the skew margin in whole milliseconds.
	pub fn skew_margin_millis(&self) -> i64 {
		i64::try_from(self.skew_margin.whole_milliseconds()).unwrap_or(i64::MAX)
	}
}

fn is_valid_cookie_name(name: &str) -> bool {
	!name.is_empty()
		&& name.chars().all(|c| c.is_ascii_graphic() && !matches!(c, '=' | ';' | ',' | '"'))
}

/// Joins the base URL and refresh path the way string concatenation would, so any path
/// prefix on the base URL is preserved.
fn resolve_refresh_endpoint(base_url: &Url) -> Result<Url, ConfigError> {
	let base = base_url.as_str().trim_end_matches('/');

	Url::parse(&format!("{base}{REFRESH_TOKEN_PATH}"))
		.map_err(|source| ConfigError::InvalidBaseUrl { source })
}
