#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::{Duration, OffsetDateTime};
// self
use cookie_token_refresher::{
	config::RefresherConfig,
	credential::{CookieContext, RequestContext},
	error::{RefreshFailure, TransientError},
	http::ReqwestHttpClient,
	refresher::{RefreshOutcome, ReqwestTokenRefresher, TokenRefresher},
};

fn refresher_for(base_url: &str) -> ReqwestTokenRefresher {
	let config = RefresherConfig::new(base_url).expect("Mock base URL should build a config.");
	let client = ReqwestHttpClient::with_timeout(Duration::seconds(5))
		.expect("Reqwest client with timeout should build.");

	TokenRefresher::with_http_client(config, client)
}

fn values(ctx: &CookieContext) -> [Option<&str>; 3] {
	[ctx.cookie("access_token"), ctx.cookie("refresh_token"), ctx.cookie("exp_time")]
}

fn far_future_expiry() -> String {
	let expiry = OffsetDateTime::now_utc() + Duration::hours(1);

	(expiry.unix_timestamp() * 1_000).to_string()
}

#[tokio::test]
async fn stale_token_is_rotated_through_refresh_endpoint() {
	let server = MockServer::start_async().await;
	let header = "access_token=A1; refresh_token=R1; exp_time=0; theme=dark";
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/refresh-token")
				.header("cookie", header)
				.json_body(json!({ "refreshToken": "R1" }));
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({
					"accessToken": "A2",
					"refreshToken": "R2",
					"expTime": 1_700_000_900_000_i64,
				}));
		})
		.await;
	let refresher = refresher_for(&server.base_url());
	let mut ctx = CookieContext::from_cookie_header(header);
	let token = refresher.refresh(&mut ctx).await;

	mock.assert_async().await;

	assert_eq!(token.as_deref(), Some("A2"));
	assert_eq!(values(&ctx), [Some("A2"), Some("R2"), Some("1700000900000")]);
	assert_eq!(ctx.cookie("theme"), Some("dark"));

	let set_cookies = ctx.set_cookie_headers();

	assert_eq!(set_cookies.len(), 3);

	for value in &set_cookies {
		assert!(value.contains("HttpOnly"));
		assert!(value.contains("Secure"));
		assert!(value.contains("SameSite=Lax"));
		assert!(value.contains("Path=/"));
		assert!(!value.contains("Max-Age"));
		assert!(!value.contains("Expires"));
	}
}

#[tokio::test]
async fn fresh_token_never_reaches_the_network() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(500);
		})
		.await;
	let refresher = refresher_for(&server.base_url());
	let header = format!("access_token=A1; refresh_token=R1; exp_time={}", far_future_expiry());
	let mut ctx = CookieContext::from_cookie_header(header);

	assert_eq!(refresher.refresh(&mut ctx).await.as_deref(), Some("A1"));
	assert_eq!(refresher.refresh(&mut ctx).await.as_deref(), Some("A1"));
	assert!(ctx.is_unchanged());

	mock.assert_calls_async(0).await;

	assert_eq!(refresher.metrics.cache_hits(), 2);
	assert_eq!(refresher.metrics.attempts(), 0);
}

#[tokio::test]
async fn missing_refresh_token_skips_the_call() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200);
		})
		.await;
	let refresher = refresher_for(&server.base_url());
	let mut ctx = CookieContext::from_cookie_header("access_token=A1; exp_time=0");

	assert_eq!(refresher.refresh(&mut ctx).await, None);
	assert!(ctx.is_unchanged());

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn rejected_refresh_token_purges_credential_cookies() {
	for status in [401_u16, 403] {
		let server = MockServer::start_async().await;
		let mock = server
			.mock_async(|when, then| {
				when.method(POST).path("/auth/refresh-token");
				then.status(status).body("{\"message\":\"refresh token revoked\"}");
			})
			.await;
		let refresher = refresher_for(&server.base_url());
		let mut ctx =
			CookieContext::from_cookie_header("access_token=A1; refresh_token=R1; exp_time=12");
		let outcome = refresher.refresh_at(&mut ctx, OffsetDateTime::now_utc()).await;

		mock.assert_async().await;

		assert!(matches!(outcome, RefreshOutcome::Revoked { status: s } if s == status));
		assert_eq!(values(&ctx), [None, None, None]);
		assert!(
			ctx.set_cookie_headers()
				.iter()
				.all(|value| value.contains("Max-Age=0"))
		);
	}
}

#[tokio::test]
async fn server_error_keeps_cookies_for_a_later_retry() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(500).body("upstream unavailable");
		})
		.await;
	let refresher = refresher_for(&server.base_url());
	let mut ctx =
		CookieContext::from_cookie_header("access_token=A1; refresh_token=R1; exp_time=12");
	let outcome = refresher.refresh_at(&mut ctx, OffsetDateTime::now_utc()).await;

	mock.assert_async().await;

	match outcome {
		RefreshOutcome::Failed(RefreshFailure::Transient(TransientError::Endpoint {
			status,
			message,
		})) => {
			assert_eq!(status, 500);
			assert_eq!(message, "upstream unavailable");
		},
		other => panic!("Unexpected outcome: {other:?}."),
	}

	assert_eq!(values(&ctx), [Some("A1"), Some("R1"), Some("12")]);
	assert!(ctx.is_unchanged());
}

#[tokio::test]
async fn client_timeout_is_a_transient_failure() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200).delay(std::time::Duration::from_secs(3));
		})
		.await;
	let config =
		RefresherConfig::new(&server.base_url()).expect("Mock base URL should build a config.");
	let client = ReqwestHttpClient::with_timeout(Duration::milliseconds(200))
		.expect("Reqwest client with timeout should build.");
	let refresher: ReqwestTokenRefresher = TokenRefresher::with_http_client(config, client);
	let mut ctx = CookieContext::from_cookie_header("refresh_token=R1");
	let outcome = refresher.refresh_at(&mut ctx, OffsetDateTime::now_utc()).await;

	assert!(matches!(
		outcome,
		RefreshOutcome::Failed(RefreshFailure::Transient(TransientError::Timeout { .. }))
	));
	assert_eq!(ctx.cookie("refresh_token"), Some("R1"));
	assert!(ctx.is_unchanged());
}

#[tokio::test]
async fn base_path_prefix_is_preserved() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh-token").header("cookie", "refresh_token=R1");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"A2\",\"refreshToken\":\"R2\",\"expTime\":42}");
		})
		.await;
	let refresher = refresher_for(&server.url("/api/"));
	let mut ctx = CookieContext::from_cookie_header("refresh_token=R1");

	assert_eq!(refresher.refresh(&mut ctx).await.as_deref(), Some("A2"));

	mock.assert_async().await;

	assert_eq!(values(&ctx), [Some("A2"), Some("R2"), Some("42")]);
}
