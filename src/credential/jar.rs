//! Cookie store seam between the refresher and the hosting web framework.
//!
//! [`RequestContext`] is the only contract the refresher needs from a request: read a
//! cookie by name, see the raw `Cookie` header for forwarding, and queue cookie writes or
//! removals for the response. [`CookieContext`] is the bundled implementation backed by
//! [`CookieJar`], suitable for any framework that exposes request headers and accepts
//! `Set-Cookie` values.

// crates.io
use cookie::{Cookie, CookieJar, SameSite};
#[cfg(feature = "reqwest")] use reqwest::header::{COOKIE, HeaderMap};
// self
use crate::_prelude::*;

/// Cookie access for a single inbound request.
pub trait RequestContext {
	/// Returns the current value of the named cookie, reflecting writes made on this context.
	fn cookie(&self, name: &str) -> Option<&str>;

	/// Returns the raw inbound `Cookie` header, exactly as received.
	fn cookie_header(&self) -> Option<&str>;

	/// Queues a cookie write for the response.
	fn set_cookie(&mut self, cookie: Cookie<'static>);

	/// Queues removal of the named cookie.
	fn remove_cookie(&mut self, name: &str);
}

/// Builds a credential cookie with the fixed attribute set: `HttpOnly`, `Secure`,
/// `SameSite=Lax`, `Path=/`, and no `Expires`/`Max-Age`.
pub fn session_cookie(name: impl Into<String>, value: impl Into<String>) -> Cookie<'static> {
	let (name, value): (String, String) = (name.into(), value.into());

	Cookie::build((name, value))
		.http_only(true)
		.secure(true)
		.same_site(SameSite::Lax)
		.path("/")
		.build()
}

/// [`RequestContext`] backed by a [`CookieJar`] seeded from the inbound `Cookie` header.
#[derive(Clone, Debug, Default)]
pub struct CookieContext {
	jar: CookieJar,
	raw_header: Option<String>,
}
impl CookieContext {
	/// Parses the raw `Cookie` header; malformed pairs are skipped and the first occurrence of
	/// a repeated name wins.
	pub fn from_cookie_header(header: impl Into<String>) -> Self {
		let header = header.into();
		let mut jar = CookieJar::new();

		for cookie in Cookie::split_parse(header.clone()).filter_map(|parsed| parsed.ok()) {
			if jar.get(cookie.name()).is_none() {
				jar.add_original(cookie.into_owned());
			}
		}

		let raw_header = if header.is_empty() { None } else { Some(header) };

		Self { jar, raw_header }
	}

	/// Builds a context from request headers, joining repeated `Cookie` headers.
	#[cfg(feature = "reqwest")]
	pub fn from_headers(headers: &HeaderMap) -> Self {
		let joined = headers
			.get_all(COOKIE)
			.iter()
			.filter_map(|value| value.to_str().ok())
			.collect::<Vec<_>>()
			.join("; ");

		Self::from_cookie_header(joined)
	}

	/// Returns the underlying jar.
	pub fn jar(&self) -> &CookieJar {
		&self.jar
	}

	/// Returns `true` when no cookie has been written or removed on this context.
	pub fn is_unchanged(&self) -> bool {
		self.jar.delta().next().is_none()
	}

	/// Renders every pending cookie change as a `Set-Cookie` header value.
	pub fn set_cookie_headers(&self) -> Vec<String> {
		self.jar.delta().map(|cookie| cookie.to_string()).collect()
	}
}
impl RequestContext for CookieContext {
	fn cookie(&self, name: &str) -> Option<&str> {
		self.jar.get(name).map(|cookie| cookie.value())
	}

	fn cookie_header(&self) -> Option<&str> {
		self.raw_header.as_deref()
	}

	fn set_cookie(&mut self, cookie: Cookie<'static>) {
		self.jar.add(cookie);
	}

	fn remove_cookie(&mut self, name: &str) {
		self.jar.remove(Cookie::build((name.to_owned(), "")).path("/").build());
	}
}
