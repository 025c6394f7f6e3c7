pub mod clock;
pub mod config;
pub mod directives;
pub mod error;
pub mod freshness;
pub mod http_date;
pub mod logger;
pub mod response;

pub use error::{CacheError, Result};

pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::Config;
    pub use crate::directives::{CacheControl, DirectiveValue};
    pub use crate::freshness::{Freshness, FreshnessReport, CACHEABLE_STATUS_CODES};
    pub use crate::response::{CachedResponse, MockResponse, ResponseHead};
}
