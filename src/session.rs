//! Session Delivery
//!
//! Hands an issued token pair to the client over two channels: HTTP-only
//! cookies for browsers and the JSON body for clients that replay tokens in
//! an `Authorization` header. Each channel is a [`TokenSink`].

use crate::config::AuthConfig;
use crate::models::TokenBody;
use crate::token::TokenPair;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Cookie attributes derived from configuration
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    pub secure: bool,
    pub same_site: SameSite,
    pub access_max_age: time::Duration,
    pub refresh_max_age: time::Duration,
}

impl CookiePolicy {
    /// Production serves API and UI from different origins, so cookies must
    /// travel cross-site over TLS. Elsewhere they stay same-site.
    pub fn from_config(config: &AuthConfig) -> Self {
        let (secure, same_site) = if config.environment.is_production() {
            (true, SameSite::None)
        } else {
            (false, SameSite::Lax)
        };

        Self {
            secure,
            same_site,
            access_max_age: time::Duration::seconds(config.access_token_expiration),
            refresh_max_age: time::Duration::seconds(config.refresh_token_expiration),
        }
    }

    fn cookie(
        &self,
        name: &'static str,
        value: String,
        max_age: time::Duration,
    ) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .max_age(max_age)
            .build()
    }
}

/// A destination for an issued token pair
pub trait TokenSink {
    fn deliver(&mut self, tokens: &TokenPair);
}

/// Writes tokens into the response cookie jar
pub struct CookieSink<'a> {
    jar: CookieJar,
    policy: &'a CookiePolicy,
}

impl<'a> CookieSink<'a> {
    pub fn new(jar: CookieJar, policy: &'a CookiePolicy) -> Self {
        Self { jar, policy }
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }

    fn set(&mut self, cookie: Cookie<'static>) {
        let jar = std::mem::take(&mut self.jar);
        self.jar = jar.add(cookie);
    }
}

impl TokenSink for CookieSink<'_> {
    fn deliver(&mut self, tokens: &TokenPair) {
        let access = self.policy.cookie(
            ACCESS_TOKEN_COOKIE,
            tokens.access_token.clone(),
            self.policy.access_max_age,
        );
        let refresh = self.policy.cookie(
            REFRESH_TOKEN_COOKIE,
            tokens.refresh_token.clone(),
            self.policy.refresh_max_age,
        );
        self.set(access);
        self.set(refresh);
    }
}

/// Captures tokens for the JSON response body
#[derive(Debug, Default)]
pub struct BodySink {
    body: TokenBody,
}

impl BodySink {
    pub fn into_body(self) -> TokenBody {
        self.body
    }
}

impl TokenSink for BodySink {
    fn deliver(&mut self, tokens: &TokenPair) {
        self.body = TokenBody {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
        };
    }
}

/// Deliver a pair to every sink
pub fn deliver(tokens: &TokenPair, sinks: &mut [&mut dyn TokenSink]) {
    for sink in sinks.iter_mut() {
        sink.deliver(tokens);
    }
}

/// Set both token cookies and return the tokens for the response body
pub fn attach(
    jar: CookieJar,
    policy: &CookiePolicy,
    tokens: &TokenPair,
) -> (CookieJar, TokenBody) {
    let mut cookies = CookieSink::new(jar, policy);
    let mut body = BodySink::default();
    {
        let mut sinks: [&mut dyn TokenSink; 2] = [&mut cookies, &mut body];
        deliver(tokens, &mut sinks);
    }
    (cookies.into_jar(), body.into_body())
}

/// Expire both token cookies immediately.
///
/// Only the caller's cookie jar is affected; the signed tokens themselves
/// remain valid until their own expiry.
pub fn clear(jar: CookieJar, policy: &CookiePolicy) -> CookieJar {
    jar.add(policy.cookie(ACCESS_TOKEN_COOKIE, String::new(), time::Duration::ZERO))
        .add(policy.cookie(REFRESH_TOKEN_COOKIE, String::new(), time::Duration::ZERO))
}
