//! Cookie-backed access token refresher for HTTP request handlers: reuse a fresh access
//! token, rotate a stale one through the authentication service, and purge revoked
//! credentials.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod config;
pub mod credential;
pub mod error;
pub mod http;
pub mod obs;
pub mod refresher;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::{CookieNames, RefresherConfig},
		credential::{CookieContext, RequestContext},
		error::RefreshFailure,
		http::{RefreshFuture, RefreshHttpClient, RefreshRequest, RefreshedTokens},
	};

	/// Cookie names used across the test suites.
	pub fn test_cookie_names() -> CookieNames {
		CookieNames::default()
	}

	/// Builds a request context carrying the provided credential cookies.
	pub fn test_context(
		access: Option<&str>,
		refresh: Option<&str>,
		expires_at: Option<&str>,
	) -> CookieContext {
		let names = test_cookie_names();
		let mut pairs = Vec::new();

		if let Some(access) = access {
			pairs.push(format!("{}={access}", names.access_token));
		}
		if let Some(refresh) = refresh {
			pairs.push(format!("{}={refresh}", names.refresh_token));
		}
		if let Some(expires_at) = expires_at {
			pairs.push(format!("{}={expires_at}", names.expires_at));
		}

		CookieContext::from_cookie_header(pairs.join("; "))
	}

	/// Returns the current value of every credential cookie, in access/refresh/expiry order.
	pub fn cookie_values(ctx: &CookieContext) -> [Option<String>; 3] {
		let names = test_cookie_names();

		[
			ctx.cookie(&names.access_token).map(str::to_owned),
			ctx.cookie(&names.refresh_token).map(str::to_owned),
			ctx.cookie(&names.expires_at).map(str::to_owned),
		]
	}

	/// Builds a config pointing at `base_url` with default cookie names and skew margin.
	pub fn test_config(base_url: &str) -> RefresherConfig {
		RefresherConfig::new(base_url).expect("Test base URL should produce a valid config.")
	}

	/// Recorded outbound refresh call.
	#[derive(Clone, Debug, PartialEq, Eq)]
	pub struct RecordedCall {
		/// Endpoint the call targeted.
		pub endpoint: String,
		/// Forwarded `Cookie` header.
		pub cookie_header: String,
		/// Refresh token sent in the body.
		pub refresh_token: String,
	}

	/// Scripted reply returned by [`ScriptedHttpClient`].
	#[derive(Clone, Debug)]
	pub enum ScriptedReply {
		/// Raw HTTP status + body decoded through the production decoder.
		Response {
			/// HTTP status code.
			status: u16,
			/// Response body bytes.
			body: String,
		},
		/// Simulated network failure.
		NetworkFailure,
	}

	/// In-process [`RefreshHttpClient`] that records every call and replays a scripted reply.
	#[derive(Debug)]
	pub struct ScriptedHttpClient {
		reply: ScriptedReply,
		calls: Mutex<Vec<RecordedCall>>,
	}
	impl ScriptedHttpClient {
		/// Replies with the given status and body.
		pub fn responding(status: u16, body: impl Into<String>) -> Self {
			Self::new(ScriptedReply::Response { status, body: body.into() })
		}

		/// Replies with a successful token rotation.
		pub fn rotating(access: &str, refresh: &str, exp_time: i64) -> Self {
			Self::responding(
				200,
				format!(
					"{{\"accessToken\":\"{access}\",\"refreshToken\":\"{refresh}\",\"expTime\":{exp_time}}}"
				),
			)
		}

		/// Fails every call at the transport level.
		pub fn unreachable() -> Self {
			Self::new(ScriptedReply::NetworkFailure)
		}

		/// Returns every call recorded so far.
		pub fn calls(&self) -> Vec<RecordedCall> {
			self.calls.lock().clone()
		}

		fn new(reply: ScriptedReply) -> Self {
			Self { reply, calls: Mutex::new(Vec::new()) }
		}
	}
	impl RefreshHttpClient for ScriptedHttpClient {
		fn post_refresh<'a>(
			&'a self,
			endpoint: &'a Url,
			cookie_header: &'a str,
			request: &'a RefreshRequest,
		) -> RefreshFuture<'a> {
			Box::pin(async move {
				self.calls.lock().push(RecordedCall {
					endpoint: endpoint.to_string(),
					cookie_header: cookie_header.to_owned(),
					refresh_token: request.refresh_token.expose().to_owned(),
				});

				match &self.reply {
					ScriptedReply::Response { status, body } =>
						crate::http::decode_refresh_response(*status, body.as_bytes()),
					ScriptedReply::NetworkFailure => Err(RefreshFailure::from(
						crate::error::TransientError::network(std::io::Error::new(
							std::io::ErrorKind::ConnectionRefused,
							"scripted connection refused",
						)),
					)),
				}
			})
		}
	}

	/// Captures every event emitted on the current thread while alive.
	#[cfg(all(test, feature = "tracing"))]
	pub struct LogCapture {
		buffer: Arc<Mutex<Vec<u8>>>,
		_guard: tracing::subscriber::DefaultGuard,
	}
	#[cfg(all(test, feature = "tracing"))]
	impl LogCapture {
		/// Installs a thread-local subscriber writing plain-text events into a buffer.
		pub fn start() -> Self {
			let buffer = Arc::new(Mutex::new(Vec::new()));
			let writer = CaptureWriter(buffer.clone());
			let subscriber = tracing_subscriber::fmt()
				.with_writer(move || writer.clone())
				.with_ansi(false)
				.with_max_level(tracing::Level::TRACE)
				.finish();
			let _guard = tracing::subscriber::set_default(subscriber);

			Self { buffer, _guard }
		}

		/// Returns everything captured so far.
		pub fn output(&self) -> String {
			String::from_utf8_lossy(&self.buffer.lock()).into_owned()
		}

		/// Returns the captured lines logged at `level` (e.g. `"WARN"`).
		pub fn lines_at(&self, level: &str) -> Vec<String> {
			self.output()
				.lines()
				.filter(|line| line.split_whitespace().any(|word| word == level))
				.map(str::to_owned)
				.collect()
		}
	}

	#[cfg(all(test, feature = "tracing"))]
	#[derive(Clone)]
	struct CaptureWriter(Arc<Mutex<Vec<u8>>>);
	#[cfg(all(test, feature = "tracing"))]
	impl std::io::Write for CaptureWriter {
		fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
			self.0.lock().extend_from_slice(buf);

			Ok(buf.len())
		}

		fn flush(&mut self) -> std::io::Result<()> {
			Ok(())
		}
	}

	/// Decodes a successful response body; panics on malformed fixtures.
	pub fn decode_tokens(body: &str) -> RefreshedTokens {
		crate::http::decode_refresh_response(200, body.as_bytes())
			.expect("Token fixture should decode successfully.")
	}
}

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use cookie;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tracing_subscriber as _};
