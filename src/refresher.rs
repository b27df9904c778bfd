//! Per-request access token refresh.
//!
//! [`TokenRefresher::refresh`] reads the credential cookies from a [`RequestContext`],
//! returns the cached access token while it is fresh, and otherwise performs exactly one
//! call to the refresh endpoint. A successful call rewrites the three credential cookies; a
//! 401/403 purges them; any other failure leaves them untouched so a later request can retry
//! with the same refresh token. No failure escapes: callers see `None` and must treat the
//! request as unauthenticated.
//!
//! Invocations share no mutable state beyond counters. Concurrent requests carrying the same
//! refresh token each perform their own refresh.

mod metrics;

pub use self::metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	config::RefresherConfig,
	credential::{self, CredentialBundle, RequestContext, TokenSecret},
	error::RefreshFailure,
	http::{RefreshHttpClient, RefreshRequest, RefreshedTokens},
	obs::{self, OutcomeKind, RefreshSpan},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Refresher specialized for the crate's default reqwest transport.
pub type ReqwestTokenRefresher = TokenRefresher<ReqwestHttpClient>;

/// Terminal state of one refresher invocation.
#[derive(Debug)]
pub enum RefreshOutcome {
	/// Cached access token is still fresh; nothing was changed.
	Valid(TokenSecret),
	/// Tokens were rotated and the credential cookies rewritten.
	Refreshed(TokenSecret),
	/// Request carried no refresh token; no call was made.
	NoRefreshToken,
	/// Refresh endpoint rejected the refresh token; the credential cookies were removed.
	Revoked {
		/// HTTP status returned by the endpoint (401 or 403).
		status: u16,
	},
	/// Refresh call failed for any other reason; the credential cookies were left untouched.
	Failed(RefreshFailure),
}
impl RefreshOutcome {
	/// Returns the label of the terminal state.
	pub fn kind(&self) -> OutcomeKind {
		match self {
			Self::Valid(_) => OutcomeKind::Valid,
			Self::Refreshed(_) => OutcomeKind::Refreshed,
			Self::NoRefreshToken => OutcomeKind::NoRefreshToken,
			Self::Revoked { .. } => OutcomeKind::Revoked,
			Self::Failed(_) => OutcomeKind::FailedTransient,
		}
	}

	/// Borrows the usable access token, if the invocation produced one.
	pub fn access_token(&self) -> Option<&TokenSecret> {
		match self {
			Self::Valid(token) | Self::Refreshed(token) => Some(token),
			_ => None,
		}
	}

	/// Collapses the outcome into the caller-facing result.
	pub fn into_access_token(self) -> Option<String> {
		match self {
			Self::Valid(token) | Self::Refreshed(token) => Some(token.into_inner()),
			_ => None,
		}
	}

	/// Converts the outcome into a [`Result`] that names why no token is available.
	pub fn into_result(self) -> Result<TokenSecret> {
		match self {
			Self::Valid(token) | Self::Refreshed(token) => Ok(token),
			Self::NoRefreshToken => Err(Error::MissingRefreshToken),
			Self::Revoked { status } => Err(RefreshFailure::AuthRejected { status }.into()),
			Self::Failed(failure) => Err(failure.into()),
		}
	}
}

/// Refreshes cookie-held credentials against the authentication service.
pub struct TokenRefresher<C>
where
	C: ?Sized + RefreshHttpClient,
{
	/// HTTP client used for the refresh call.
	pub http_client: Arc<C>,
	/// Service location, cookie names, and skew margin.
	pub config: RefresherConfig,
	/// Counters shared by every invocation of this refresher.
	pub metrics: Arc<RefreshMetrics>,
}
impl<C> TokenRefresher<C>
where
	C: ?Sized + RefreshHttpClient,
{
	/// Creates a refresher that reuses the caller-provided transport.
	pub fn with_http_client(config: RefresherConfig, http_client: impl Into<Arc<C>>) -> Self {
		Self { http_client: http_client.into(), config, metrics: Default::default() }
	}

	/// Returns a usable access token for the request, refreshing it when stale.
	///
	/// `None` means no valid access token could be established for this request.
	pub async fn refresh<R>(&self, ctx: &mut R) -> Option<String>
	where
		R: ?Sized + RequestContext,
	{
		self.refresh_at(ctx, OffsetDateTime::now_utc()).await.into_access_token()
	}

	/// Runs the refresh decision against an explicit clock reading.
	pub async fn refresh_at<R>(&self, ctx: &mut R, now: OffsetDateTime) -> RefreshOutcome
	where
		R: ?Sized + RequestContext,
	{
		let span = RefreshSpan::new("refresh_at");
		let outcome = span.instrument(self.run(ctx, now)).await;
		let kind = outcome.kind();

		self.metrics.record(kind);
		obs::record_refresh_outcome(kind);

		outcome
	}

	async fn run<R>(&self, ctx: &mut R, now: OffsetDateTime) -> RefreshOutcome
	where
		R: ?Sized + RequestContext,
	{
		let bundle = CredentialBundle::read(ctx, &self.config.cookie_names);
		let Some(refresh_token) = bundle.refresh_token.clone() else {
			obs::log_outcome(OutcomeKind::NoRefreshToken, None);

			return RefreshOutcome::NoRefreshToken;
		};

		let fresh =
			bundle.is_fresh_at(credential::epoch_millis(now), self.config.skew_margin_millis());

		if let (true, Some(access_token)) = (fresh, bundle.access_token) {
			return RefreshOutcome::Valid(access_token);
		}

		let request = RefreshRequest { refresh_token };
		let cookie_header = ctx.cookie_header().unwrap_or_default().to_owned();

		self.metrics.record_attempt();

		match self
			.http_client
			.post_refresh(&self.config.refresh_endpoint, &cookie_header, &request)
			.await
		{
			Ok(tokens) => {
				let access_token = self.store_tokens(ctx, tokens);

				obs::log_outcome(OutcomeKind::Refreshed, None);

				RefreshOutcome::Refreshed(access_token)
			},
			Err(RefreshFailure::AuthRejected { status }) => {
				self.clear_tokens(ctx);
				obs::log_outcome(
					OutcomeKind::Revoked,
					Some(&RefreshFailure::AuthRejected { status }),
				);

				RefreshOutcome::Revoked { status }
			},
			Err(failure) => {
				obs::log_outcome(OutcomeKind::FailedTransient, Some(&failure));

				RefreshOutcome::Failed(failure)
			},
		}
	}

	fn store_tokens<R>(&self, ctx: &mut R, tokens: RefreshedTokens) -> TokenSecret
	where
		R: ?Sized + RequestContext,
	{
		let names = &self.config.cookie_names;
		let RefreshedTokens { access_token, refresh_token, exp_time } = tokens;

		ctx.set_cookie(credential::session_cookie(
			names.access_token.clone(),
			access_token.expose(),
		));
		ctx.set_cookie(credential::session_cookie(
			names.refresh_token.clone(),
			refresh_token.into_inner(),
		));
		ctx.set_cookie(credential::session_cookie(names.expires_at.clone(), exp_time.to_string()));

		access_token
	}

	fn clear_tokens<R>(&self, ctx: &mut R)
	where
		R: ?Sized + RequestContext,
	{
		for name in self.config.cookie_names.iter() {
			ctx.remove_cookie(name);
		}
	}
}
#[cfg(feature = "reqwest")]
impl TokenRefresher<ReqwestHttpClient> {
	/// Creates a refresher backed by a default reqwest client.
	pub fn new(config: RefresherConfig) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default())
	}
}
impl<C> Clone for TokenRefresher<C>
where
	C: ?Sized + RefreshHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: Arc::clone(&self.http_client),
			config: self.config.clone(),
			metrics: Arc::clone(&self.metrics),
		}
	}
}
impl<C> Debug for TokenRefresher<C>
where
	C: ?Sized + RefreshHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRefresher")
			.field("refresh_endpoint", &self.config.refresh_endpoint.as_str())
			.field("cookie_names", &self.config.cookie_names)
			.field("skew_margin", &self.config.skew_margin)
			.finish()
	}
}
