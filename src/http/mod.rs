use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, Request, RequestBuilder, Response};
use tracing::warn;

use crate::store::TokenStore;

/// Endpoints that must never receive an injected Authorization header. This
/// is the structural break that keeps auth calls from recursing through the
/// interceptor: they would otherwise need a token that only these calls can
/// produce or refresh. `/auth/admin-reset-password` is deliberately not in
/// this set; it is an ordinary authenticated call.
pub const AUTH_ENDPOINTS: [&str; 6] = [
    "/auth/login",
    "/auth/register",
    "/auth/logout",
    "/auth/restore-session",
    "/auth/renew-token",
    "/auth/change-password",
];

/// Marker header set by the session controller on every auth call it issues
/// directly. Second, independent protection against interceptor recursion;
/// stripped before the request leaves the client.
pub const SKIP_AUTH_HEADER: &str = "x-skip-auth-interceptor";

/// Downstream sender the interceptor forwards to.
#[async_trait]
pub trait Forward: Send + Sync {
    async fn forward(&self, req: Request) -> reqwest::Result<Response>;
}

#[async_trait]
impl Forward for reqwest::Client {
    async fn forward(&self, req: Request) -> reqwest::Result<Response> {
        self.execute(req).await
    }
}

pub fn is_auth_request(req: &Request) -> bool {
    let path = req.url().path();
    AUTH_ENDPOINTS.iter().any(|suffix| path.ends_with(suffix))
}

/// Attaches bearer credentials to an outgoing request, then forwards it.
///
/// Decision order (the internal skip marker is always stripped first):
/// 1. auth endpoint suffix match: pass through;
/// 2. skip marker was present: pass through;
/// 3. no stored token: pass through;
/// 4. otherwise inject `Authorization: Bearer <token>` and forward.
///
/// No side effects beyond header manipulation, and never calls back into the
/// session controller.
pub async fn intercept<N: Forward + ?Sized>(
    mut req: Request,
    store: &TokenStore,
    next: &N,
) -> reqwest::Result<Response> {
    // The marker is internal; strip it before anything leaves the client,
    // whichever rule ends up forwarding the request.
    let skip_marker = req.headers_mut().remove(SKIP_AUTH_HEADER).is_some();

    if is_auth_request(&req) {
        return next.forward(req).await;
    }

    if skip_marker {
        return next.forward(req).await;
    }

    let Some(token) = store.get_token() else {
        return next.forward(req).await;
    };

    match HeaderValue::try_from(format!("Bearer {}", token)) {
        Ok(value) => {
            req.headers_mut().insert(AUTHORIZATION, value);
        }
        Err(_) => {
            warn!("stored token is not a valid header value, forwarding without credentials");
        }
    }

    next.forward(req).await
}

/// HTTP client that routes every request through the auth interceptor.
#[derive(Clone)]
pub struct AuthHttpClient {
    inner: reqwest::Client,
    store: Arc<TokenStore>,
}

impl AuthHttpClient {
    pub fn new(inner: reqwest::Client, store: Arc<TokenStore>) -> Self {
        Self { inner, store }
    }

    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.inner.request(method, url)
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.inner.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.inner.post(url)
    }

    pub fn put(&self, url: &str) -> RequestBuilder {
        self.inner.put(url)
    }

    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.inner.delete(url)
    }

    /// POST carrying the skip marker, for auth calls issued by the session
    /// controller itself.
    pub fn post_bypass(&self, url: &str) -> RequestBuilder {
        self.inner.post(url).header(SKIP_AUTH_HEADER, "1")
    }

    pub async fn send(&self, builder: RequestBuilder) -> reqwest::Result<Response> {
        let req = builder.build()?;
        intercept(req, &self.store, &self.inner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> Request {
        Request::new(Method::POST, url.parse().expect("Failed to parse url"))
    }

    #[test]
    fn test_auth_endpoints_match_by_suffix() {
        for suffix in AUTH_ENDPOINTS {
            let url = format!("http://localhost:3000/api{}", suffix);
            assert!(is_auth_request(&request(&url)), "{} should match", suffix);
        }
    }

    #[test]
    fn test_regular_endpoints_do_not_match() {
        for url in [
            "http://localhost:3000/api/users",
            "http://localhost:3000/api/appointments/7",
            "http://localhost:3000/api/resources",
            // an /auth path, but outside the excluded suffix set
            "http://localhost:3000/api/auth/admin-reset-password",
        ] {
            assert!(!is_auth_request(&request(url)), "{} should not match", url);
        }
    }
}
