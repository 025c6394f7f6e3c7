//! Responses that can be evaluated for freshness.
//!
//! Anything exposing a status and mutable headers implements [`ResponseHead`];
//! [`CachedResponse`] pairs such a response with its [`Freshness`].

use std::ops::Deref;

use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Response, StatusCode};

use crate::clock::{Clock, SystemClock};
use crate::freshness::Freshness;

pub trait ResponseHead {
    fn status(&self) -> StatusCode;
    fn headers(&self) -> &HeaderMap;
    fn headers_mut(&mut self) -> &mut HeaderMap;
}

impl<B> ResponseHead for Response<B> {
    fn status(&self) -> StatusCode {
        Response::status(self)
    }

    fn headers(&self) -> &HeaderMap {
        Response::headers(self)
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        Response::headers_mut(self)
    }
}

/// In-memory response for tests and offline evaluation.
#[derive(Debug, Clone, Default)]
pub struct MockResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl MockResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}

impl ResponseHead for MockResponse {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}

/// A response together with the freshness state computed from it.
///
/// Freshness is computed on construction, which may add `Date` and `Age`
/// headers to the wrapped response.
#[derive(Debug)]
pub struct CachedResponse<R, C = SystemClock> {
    inner: R,
    clock: C,
    freshness: Freshness,
}

impl<R: ResponseHead> CachedResponse<R> {
    pub fn new(inner: R) -> Self {
        Self::with_clock(inner, SystemClock)
    }
}

impl<R: ResponseHead, C: Clock> CachedResponse<R, C> {
    pub fn with_clock(mut inner: R, clock: C) -> Self {
        let status = inner.status();
        let freshness = Freshness::compute(status, inner.headers_mut(), clock.now());
        Self {
            inner,
            clock,
            freshness,
        }
    }

    /// Re-evaluates against the clock, e.g. after an `Age` header was added.
    pub fn recalculate_freshness(&mut self) {
        let now = self.clock.now();
        self.freshness.recalculate(self.inner.headers_mut(), now);
    }

    pub fn freshness(&self) -> &Freshness {
        &self.freshness
    }

    pub fn freshness_mut(&mut self) -> &mut Freshness {
        &mut self.freshness
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    /// Hands back the response with the headers written during evaluation.
    pub fn persist(self) -> R {
        self.inner
    }
}

impl<R, C> Deref for CachedResponse<R, C> {
    type Target = Freshness;

    fn deref(&self) -> &Freshness {
        &self.freshness
    }
}
