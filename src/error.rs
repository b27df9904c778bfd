//! Refresher error types: configuration failures plus the tagged refresh-failure taxonomy.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Refresh endpoint call failed.
	#[error(transparent)]
	Refresh(#[from] RefreshFailure),

	/// Request carries no refresh token, so no refresh can be attempted.
	#[error("Request carries no refresh token.")]
	MissingRefreshToken,
}

/// Configuration and validation failures raised while assembling a refresher.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Authentication service base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than HTTP(S).
	#[error("Authentication service base URL must use http or https, got `{scheme}`.")]
	UnsupportedScheme {
		/// Rejected scheme.
		scheme: String,
	},
	/// Cookie name is empty or contains characters that cannot appear in a cookie name.
	#[error("The {role} cookie name `{name}` is invalid.")]
	InvalidCookieName {
		/// Which credential the cookie carries.
		role: &'static str,
		/// Rejected name.
		name: String,
	},
	/// Two credential cookies share a name.
	#[error("Credential cookies must use distinct names, `{name}` is used twice.")]
	DuplicateCookieName {
		/// Name used more than once.
		name: String,
	},
	/// Skew margin must not be negative.
	#[error("The skew margin must not be negative.")]
	NegativeSkewMargin,
	/// Request timeout must be positive.
	#[error("The request timeout must be positive.")]
	NonPositiveTimeout,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Tagged outcome of a failed refresh call, decided once at the HTTP boundary.
#[derive(Debug, ThisError)]
pub enum RefreshFailure {
	/// Authentication service rejected the refresh token (HTTP 401 or 403).
	#[error("Refresh endpoint rejected the refresh token with HTTP {status}.")]
	AuthRejected {
		/// HTTP status code returned by the endpoint.
		status: u16,
	},
	/// Any other failure; the same refresh token may be retried by a later request.
	#[error(transparent)]
	Transient(#[from] TransientError),
}
impl RefreshFailure {
	/// Returns the HTTP status attached to the failure, when a response was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::AuthRejected { status } => Some(*status),
			Self::Transient(err) => err.status(),
		}
	}

	/// Returns `true` when the refresh token must be discarded.
	pub fn is_auth_rejected(&self) -> bool {
		matches!(self, Self::AuthRejected { .. })
	}
}

/// Failures that leave the stored credentials intact.
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Endpoint answered with a non-success status other than 401/403.
	#[error("Refresh endpoint returned HTTP {status}: {message}.")]
	Endpoint {
		/// HTTP status code.
		status: u16,
		/// Truncated response body preview.
		message: String,
	},
	/// Endpoint answered 2xx with a body that does not match the expected shape.
	#[error("Refresh endpoint returned a malformed body.")]
	ResponseParse {
		/// Structured parsing failure, including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
	},
	/// Request body could not be encoded.
	#[error("Refresh request body could not be encoded.")]
	RequestEncode(#[source] serde_json::Error),
	/// Request timed out inside the HTTP client.
	#[error("Request timed out while calling the refresh endpoint.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the refresh endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransientError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}

	/// Returns the HTTP status code, when a response was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Endpoint { status, .. } | Self::ResponseParse { status, .. } => Some(*status),
			Self::RequestEncode(_) | Self::Timeout { .. } | Self::Network { .. } => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransientError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
