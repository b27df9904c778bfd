//! Transport primitives for the refresh endpoint call.
//!
//! [`RefreshHttpClient`] is the refresher's only dependency on an HTTP stack. Every
//! implementation funnels the raw status and body through [`decode_refresh_response`], so
//! the 401/403 versus transient split is decided in exactly one place and the refresher
//! only ever sees a tagged [`RefreshFailure`].

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE};
// self
use crate::{
	_prelude::*,
	credential::TokenSecret,
	error::{RefreshFailure, TransientError},
};

/// Boxed future returned by [`RefreshHttpClient::post_refresh`].
pub type RefreshFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RefreshedTokens, RefreshFailure>> + 'a + Send>>;

const BODY_PREVIEW_LIMIT: usize = 256;

/// JSON body sent to the refresh endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
	/// Refresh token read from the request's cookies.
	pub refresh_token: TokenSecret,
}

/// JSON body returned by the refresh endpoint on success.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedTokens {
	/// Newly minted access token.
	pub access_token: TokenSecret,
	/// Rotated refresh token.
	pub refresh_token: TokenSecret,
	/// Expiry of the new access token in epoch milliseconds.
	///
	/// Accepts any JSON number with no fractional part, so `1700000900000.0` reads the same
	/// as `1700000900000`.
	#[serde(deserialize_with = "deserialize_epoch_millis")]
	pub exp_time: i64,
}

fn deserialize_epoch_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
	D: serde::Deserializer<'de>,
{
	let number = serde_json::Number::deserialize(deserializer)?;

	if let Some(millis) = number.as_i64() {
		return Ok(millis);
	}

	let in_range = |value: f64| value >= i64::MIN as f64 && value < i64::MAX as f64;

	match number.as_f64() {
		Some(value) if value.fract() == 0.0 && in_range(value) => Ok(value as i64),
		_ => Err(serde::de::Error::custom(format!(
			"expected an integral epoch millisecond value, got {number}"
		))),
	}
}

/// HTTP transport capable of calling the refresh endpoint.
///
/// Implementations must be `Send + Sync + 'static` so a single client can be shared by
/// every request handler, and the returned future must be `Send` so handlers can run on a
/// multi-threaded executor. Timeouts, if any, belong to the implementation.
pub trait RefreshHttpClient
where
	Self: 'static + Send + Sync,
{
	/// POSTs `request` as JSON to `endpoint`, forwarding `cookie_header` verbatim as the
	/// `Cookie` header.
	fn post_refresh<'a>(
		&'a self,
		endpoint: &'a Url,
		cookie_header: &'a str,
		request: &'a RefreshRequest,
	) -> RefreshFuture<'a>;
}

/// Classifies a raw refresh endpoint response.
///
/// 401 and 403 mean the refresh token was rejected; any other non-2xx status or a 2xx body
/// that does not match [`RefreshedTokens`] is transient.
pub fn decode_refresh_response(
	status: u16,
	body: &[u8],
) -> Result<RefreshedTokens, RefreshFailure> {
	match status {
		401 | 403 => return Err(RefreshFailure::AuthRejected { status }),
		200..=299 => {},
		_ => return Err(TransientError::Endpoint { status, message: body_preview(body) }.into()),
	}

	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| TransientError::ResponseParse { source, status }.into())
}

fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	match trimmed.char_indices().nth(BODY_PREVIEW_LIMIT) {
		Some((cut, _)) => format!("{}...", &trimmed[..cut]),
		None => trimmed.to_owned(),
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client whose every request is bounded by `timeout`.
	pub fn with_timeout(timeout: Duration) -> Result<Self, crate::error::ConfigError> {
		let timeout = std::time::Duration::try_from(timeout)
			.ok()
			.filter(|timeout| !timeout.is_zero())
			.ok_or(crate::error::ConfigError::NonPositiveTimeout)?;
		let client = ReqwestClient::builder().timeout(timeout).build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl RefreshHttpClient for ReqwestHttpClient {
	fn post_refresh<'a>(
		&'a self,
		endpoint: &'a Url,
		cookie_header: &'a str,
		request: &'a RefreshRequest,
	) -> RefreshFuture<'a> {
		Box::pin(async move {
			let body = serde_json::to_vec(request).map_err(TransientError::RequestEncode)?;
			let response = self
				.0
				.post(endpoint.clone())
				.header(COOKIE, cookie_header)
				.header(CONTENT_TYPE, "application/json")
				.header(ACCEPT, "application/json")
				.body(body)
				.send()
				.await
				.map_err(TransientError::from)?;
			let status = response.status().as_u16();
			let bytes = response.bytes().await.map_err(TransientError::from)?;

			decode_refresh_response(status, &bytes)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn unauthorized_and_forbidden_are_auth_rejections() {
		for status in [401, 403] {
			let err = decode_refresh_response(status, b"{\"message\":\"revoked\"}")
				.expect_err("Auth rejections should fail decoding.");

			assert!(matches!(err, RefreshFailure::AuthRejected { status: s } if s == status));
		}
	}

	#[test]
	fn other_statuses_are_transient_with_preview() {
		let err = decode_refresh_response(500, b"  upstream exploded  ")
			.expect_err("Server errors should fail decoding.");

		match err {
			RefreshFailure::Transient(TransientError::Endpoint { status, message }) => {
				assert_eq!(status, 500);
				assert_eq!(message, "upstream exploded");
			},
			other => panic!("Unexpected failure: {other:?}."),
		}

		let err = decode_refresh_response(400, b"").expect_err("Bad requests should fail.");

		assert!(!err.is_auth_rejected());
		assert_eq!(err.status(), Some(400));
	}

	#[test]
	fn malformed_success_body_reports_json_path() {
		let err = decode_refresh_response(
			200,
			b"{\"accessToken\":\"A2\",\"refreshToken\":\"R2\",\"expTime\":\"later\"}",
		)
		.expect_err("String expiry should fail decoding.");

		match err {
			RefreshFailure::Transient(TransientError::ResponseParse { source, status }) => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "expTime");
			},
			other => panic!("Unexpected failure: {other:?}."),
		}
	}

	#[test]
	fn success_body_decodes_camel_case_fields() {
		let tokens = decode_refresh_response(
			201,
			b"{\"accessToken\":\"A2\",\"refreshToken\":\"R2\",\"expTime\":1700000000000}",
		)
		.expect("Well-formed body should decode.");

		assert_eq!(tokens.access_token.expose(), "A2");
		assert_eq!(tokens.refresh_token.expose(), "R2");
		assert_eq!(tokens.exp_time, 1_700_000_000_000);
	}

	#[test]
	fn integral_float_expiry_is_accepted() {
		let tokens = decode_refresh_response(
			200,
			b"{\"accessToken\":\"A2\",\"refreshToken\":\"R2\",\"expTime\":1700000900000.0}",
		)
		.expect("Integral float expiry should decode.");

		assert_eq!(tokens.exp_time, 1_700_000_900_000);

		let tokens = decode_refresh_response(
			200,
			b"{\"accessToken\":\"A2\",\"refreshToken\":\"R2\",\"expTime\":1.7e12}",
		)
		.expect("Exponent-form expiry should decode.");

		assert_eq!(tokens.exp_time, 1_700_000_000_000);
	}

	#[test]
	fn fractional_expiry_is_a_parse_failure() {
		let err = decode_refresh_response(
			200,
			b"{\"accessToken\":\"A2\",\"refreshToken\":\"R2\",\"expTime\":12.5}",
		)
		.expect_err("Fractional expiry should fail decoding.");

		match err {
			RefreshFailure::Transient(TransientError::ResponseParse { source, .. }) =>
				assert_eq!(source.path().to_string(), "expTime"),
			other => panic!("Unexpected failure: {other:?}."),
		}
	}

	#[test]
	fn request_body_uses_refresh_token_field() {
		let body = serde_json::to_string(&RefreshRequest { refresh_token: TokenSecret::new("R1") })
			.expect("Request body should serialize.");

		assert_eq!(body, "{\"refreshToken\":\"R1\"}");
	}

	#[test]
	fn long_bodies_are_truncated() {
		let body = "x".repeat(BODY_PREVIEW_LIMIT + 10);
		let preview = body_preview(body.as_bytes());

		assert_eq!(preview.len(), BODY_PREVIEW_LIMIT + 3);
		assert!(preview.ends_with("..."));
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn zero_timeout_is_rejected() {
		let err = ReqwestHttpClient::with_timeout(Duration::ZERO)
			.expect_err("Zero timeout should be rejected.");

		assert!(matches!(err, crate::error::ConfigError::NonPositiveTimeout));
	}
}
