//! Cache-Control directive parsing.
//!
//! Parsing is permissive: it never fails, tokens without a name are dropped and
//! a repeated directive keeps its last value.

use std::collections::BTreeMap;
use std::fmt;

use hyper::header::CACHE_CONTROL;
use hyper::HeaderMap;
use serde::{Serialize, Serializer};
use tracing::trace;

/// Value carried by a single directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveValue {
    /// Valueless directive such as `no-store`.
    Present,
    /// `name=value`, with surrounding whitespace and quotes removed.
    Value(String),
}

impl DirectiveValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DirectiveValue::Present => None,
            DirectiveValue::Value(value) => Some(value.as_str()),
        }
    }

    /// Integer reading of the value: leading sign and digits are used, anything
    /// after them is ignored, and a value without digits reads as zero.
    /// Valueless directives have no integer reading.
    pub fn as_seconds(&self) -> Option<i64> {
        self.as_str().map(coerce_integer)
    }
}

impl Serialize for DirectiveValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DirectiveValue::Present => serializer.serialize_bool(true),
            DirectiveValue::Value(value) => serializer.serialize_str(value),
        }
    }
}

/// Parsed `Cache-Control` header keyed by lowercase directive name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CacheControl {
    directives: BTreeMap<String, DirectiveValue>,
}

impl CacheControl {
    pub fn parse(header: &str) -> Self {
        let mut directives = BTreeMap::new();

        for token in header.split(',') {
            let (name, value) = match token.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (token, None),
            };

            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() {
                if !token.trim().is_empty() {
                    trace!("Dropping Cache-Control token without a name: {:?}", token);
                }
                continue;
            }

            let value = match value {
                Some(value) => DirectiveValue::Value(unquote(value.trim()).to_string()),
                None => DirectiveValue::Present,
            };
            directives.insert(name, value);
        }

        Self { directives }
    }

    /// Parses every `Cache-Control` field line of `headers` as one list.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let joined = headers
            .get_all(CACHE_CONTROL)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join(",");
        Self::parse(&joined)
    }

    pub fn get(&self, name: &str) -> Option<&DirectiveValue> {
        self.directives.get(&name.to_ascii_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DirectiveValue)> {
        self.directives.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// `max-age` in seconds. A bare `max-age` without a value counts as absent.
    pub fn max_age(&self) -> Option<i64> {
        self.get("max-age").and_then(DirectiveValue::as_seconds)
    }

    pub fn must_revalidate(&self) -> bool {
        self.contains("must-revalidate")
    }

    pub fn proxy_revalidate(&self) -> bool {
        self.contains("proxy-revalidate")
    }

    pub fn no_cache(&self) -> bool {
        self.contains("no-cache")
    }

    pub fn no_store(&self) -> bool {
        self.contains("no-store")
    }

    pub fn public(&self) -> bool {
        self.contains("public")
    }

    pub fn private(&self) -> bool {
        self.contains("private")
    }
}

/// Renders the directives as a header value. Values that are not plain tokens
/// are written as quoted strings.
impl fmt::Display for CacheControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (name, value)) in self.directives.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            match value {
                DirectiveValue::Present => f.write_str(name)?,
                DirectiveValue::Value(value) if is_token(value) => write!(f, "{}={}", name, value)?,
                DirectiveValue::Value(value) => {
                    write!(f, "{}=\"", name)?;
                    for c in value.chars() {
                        if c == '"' || c == '\\' {
                            f.write_str("\\")?;
                        }
                        write!(f, "{}", c)?;
                    }
                    f.write_str("\"")?;
                }
            }
        }
        Ok(())
    }
}

// RFC 7230 tchar.
fn is_token(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c))
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

fn coerce_integer(raw: &str) -> i64 {
    let raw = raw.trim_start();
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude = digits[..end].bytes().fold(0i64, |acc, digit| {
        acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
    });

    if negative {
        -magnitude
    } else {
        magnitude
    }
}
