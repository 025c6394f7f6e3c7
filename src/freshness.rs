//! Freshness and cacheability of a single response.
//!
//! [`Freshness`] is computed from a status, the response headers and an
//! externally supplied "now". Computing it may write the `Date` and `Age`
//! headers back; nothing else in the headers is touched.

use chrono::{DateTime, Timelike, Utc};
use hyper::header::{HeaderName, HeaderValue, AGE, DATE, EXPIRES};
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;
use tracing::{debug, trace};

use crate::directives::CacheControl;
use crate::http_date::{format_http_date, parse_http_date};

/// Statuses a response may be stored under.
pub const CACHEABLE_STATUS_CODES: [u16; 7] = [200, 203, 300, 301, 302, 404, 410];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Freshness {
    status: StatusCode,
    cache_control: CacheControl,
    expires: Option<DateTime<Utc>>,
    date: DateTime<Utc>,
    now: DateTime<Utc>,
    age: i64,
    // Set once an incoming Age header has been turned into `age`.
    age_derived: bool,
    max_age_override: Option<i64>,
}

impl Freshness {
    /// Evaluates a response for the first time.
    pub fn compute(status: StatusCode, headers: &mut HeaderMap, now: DateTime<Utc>) -> Self {
        let now = whole_seconds(now);
        let mut freshness = Self {
            status,
            cache_control: CacheControl::default(),
            expires: None,
            date: now,
            now,
            age: 0,
            age_derived: false,
            max_age_override: None,
        };
        freshness.recalculate(headers, now);
        freshness
    }

    /// Re-reads the headers and re-establishes `date`, `now` and `age`.
    ///
    /// A missing or unreadable `Date` is replaced by `now`. The first time an
    /// `Age` header is seen the age becomes `now - date`; afterwards that age
    /// is kept. Without an `Age` header the response counts as generated right
    /// now with age zero. The resulting age is written back into `Age`.
    pub fn recalculate(&mut self, headers: &mut HeaderMap, now: DateTime<Utc>) {
        let now = whole_seconds(now);

        self.cache_control = CacheControl::from_headers(headers);
        self.expires = header_str(headers, &EXPIRES).and_then(|value| {
            let parsed = parse_http_date(value);
            if parsed.is_none() {
                trace!("Ignoring unparseable Expires header: {:?}", value);
            }
            parsed
        });

        self.date = match header_str(headers, &DATE).and_then(parse_http_date) {
            Some(date) => date,
            None => {
                if let Ok(value) = HeaderValue::from_str(&format_http_date(now)) {
                    headers.insert(DATE, value);
                }
                now
            }
        };

        if headers.contains_key(AGE) {
            if !self.age_derived {
                self.age_derived = true;
                self.now = now.max(self.date);
                self.age = (self.now - self.date).num_seconds();
            }
        } else {
            self.age_derived = false;
            self.now = self.date;
            self.age = 0;
        }

        headers.insert(AGE, HeaderValue::from(self.age));

        debug!(
            status = self.status.as_u16(),
            age = self.age,
            date = %self.date,
            derived = self.age_derived,
            "Recalculated freshness"
        );
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn cache_control(&self) -> &CacheControl {
        &self.cache_control
    }

    /// When the response was generated.
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// The instant the response was evaluated at.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Seconds between `date` and `now`.
    pub fn age(&self) -> i64 {
        self.age
    }

    /// `Expires`, or `date` when the header is missing or unparseable.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires.unwrap_or(self.date)
    }

    /// Freshness lifetime in seconds. Negative when the response expired
    /// before it was generated.
    pub fn max_age(&self) -> i64 {
        self.max_age_override
            .or_else(|| self.cache_control.max_age())
            .unwrap_or_else(|| (self.expires_at() - self.date).num_seconds())
    }

    /// Forces the freshness lifetime regardless of headers.
    pub fn set_max_age(&mut self, max_age: i64) {
        self.max_age_override = Some(max_age);
    }

    /// Remaining freshness in seconds.
    pub fn ttl(&self) -> i64 {
        self.max_age().saturating_sub(self.age)
    }

    /// Sets the lifetime so that `ttl` seconds remain from the current age.
    pub fn set_ttl(&mut self, ttl: i64) {
        self.set_max_age(self.age.saturating_add(ttl));
    }

    pub fn is_fresh(&self) -> bool {
        self.ttl() > 0
    }

    /// A response with zero seconds left is already stale.
    pub fn is_stale(&self) -> bool {
        self.ttl() <= 0
    }

    pub fn is_original(&self) -> bool {
        self.age == 0
    }

    pub fn must_revalidate(&self) -> bool {
        self.cache_control.must_revalidate()
    }

    pub fn no_cache(&self) -> bool {
        self.cache_control.no_cache()
    }

    pub fn no_store(&self) -> bool {
        self.cache_control.no_store()
    }

    pub fn is_cacheable(&self) -> bool {
        CACHEABLE_STATUS_CODES.contains(&self.status.as_u16()) && !self.no_store() && !self.no_cache()
    }

    /// Whether the headers state a lifetime through `max-age=<n>` or a valid `Expires`.
    pub fn has_explicit_lifetime(&self) -> bool {
        self.cache_control.max_age().is_some() || self.expires.is_some()
    }

    /// Gives a cacheable response without any stated lifetime `default_ttl`
    /// seconds of freshness. Returns whether the lifetime was changed.
    pub fn apply_default_ttl(&mut self, default_ttl: u64) -> bool {
        if default_ttl == 0
            || self.max_age_override.is_some()
            || self.has_explicit_lifetime()
            || !self.is_cacheable()
        {
            return false;
        }

        let ttl = i64::try_from(default_ttl).unwrap_or(i64::MAX);
        self.set_ttl(ttl);
        debug!(ttl, "Applied default ttl");
        true
    }

    pub fn report(&self) -> FreshnessReport {
        FreshnessReport {
            status: self.status.as_u16(),
            cacheable: self.is_cacheable(),
            fresh: self.is_fresh(),
            stale: self.is_stale(),
            original: self.is_original(),
            date: self.date,
            now: self.now,
            age: self.age,
            expires_at: self.expires_at(),
            max_age: self.max_age(),
            ttl: self.ttl(),
            must_revalidate: self.must_revalidate(),
            no_cache: self.no_cache(),
            no_store: self.no_store(),
            directives: self.cache_control.clone(),
        }
    }
}

/// Serializable snapshot of a [`Freshness`].
#[derive(Debug, Clone, Serialize)]
pub struct FreshnessReport {
    pub status: u16,
    pub cacheable: bool,
    pub fresh: bool,
    pub stale: bool,
    pub original: bool,
    pub date: DateTime<Utc>,
    pub now: DateTime<Utc>,
    pub age: i64,
    pub expires_at: DateTime<Utc>,
    pub max_age: i64,
    pub ttl: i64,
    pub must_revalidate: bool,
    pub no_cache: bool,
    pub no_store: bool,
    pub directives: CacheControl,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

// HTTP dates carry whole seconds only.
fn whole_seconds(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.with_nanosecond(0).unwrap_or(instant)
}
