// self
use crate::{
	_prelude::*,
	config::{CookieNames, DEFAULT_SKEW_MARGIN, RefresherConfig},
	error::ConfigError,
};

/// Builder for [`RefresherConfig`] values.
#[derive(Debug)]
pub struct RefresherConfigBuilder {
	/// Base URL of the authentication service.
	pub base_url: Url,
	/// Credential cookie names.
	pub cookie_names: CookieNames,
	/// Margin subtracted from the expiry when judging freshness.
	pub skew_margin: Duration,
}
impl RefresherConfigBuilder {
	/// Creates a new builder seeded with the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self { base_url, cookie_names: CookieNames::default(), skew_margin: DEFAULT_SKEW_MARGIN }
	}

	/// Overrides the credential cookie names.
	pub fn cookie_names(mut self, names: CookieNames) -> Self {
		self.cookie_names = names;

		self
	}

	/// Overrides the skew margin (defaults to 10 seconds).
	pub fn skew_margin(mut self, margin: Duration) -> Self {
		self.skew_margin = margin;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<RefresherConfig, ConfigError> {
		match self.base_url.scheme() {
			"http" | "https" => {},
			scheme => return Err(ConfigError::UnsupportedScheme { scheme: scheme.to_owned() }),
		}

		if self.skew_margin.is_negative() {
			return Err(ConfigError::NegativeSkewMargin);
		}

		self.cookie_names.validate()?;

		let refresh_endpoint = super::resolve_refresh_endpoint(&self.base_url)?;

		Ok(RefresherConfig {
			base_url: self.base_url,
			refresh_endpoint,
			cookie_names: self.cookie_names,
			skew_margin: self.skew_margin,
		})
	}
}
