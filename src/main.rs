use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;
use http_freshness::http_date::parse_http_date;
use http_freshness::logger::init_logger;
use http_freshness::prelude::*;
use http_freshness::{CacheError, Result};
use hyper::header::{HeaderName, HeaderValue};
use hyper::StatusCode;
use serde::Serialize;
use tracing::{debug, info};

/// Evaluate the freshness of an HTTP response described on the command line.
#[derive(Parser, Debug)]
#[command(name = "http-freshness", version)]
struct Cli {
    /// Response status code.
    #[arg(short, long, default_value_t = 200)]
    status: u16,

    /// Response header, repeatable.
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
    headers: Vec<String>,

    /// Evaluation instant as an HTTP-date. Defaults to the wall clock.
    #[arg(long, value_name = "HTTP-DATE")]
    now: Option<String>,

    /// Recalculate once more at this HTTP-date after the first evaluation.
    #[arg(long, value_name = "HTTP-DATE")]
    recalculate_at: Option<String>,

    /// TOML config file. Overrides HTTP_FRESHNESS_CONFIG.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Serialize)]
struct Output {
    freshness: FreshnessReport,
    headers: BTreeMap<String, String>,
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    init_logger(&config.log.filter);
    debug!("Loaded config: {:?}", config);

    let output = evaluate(&cli, &config)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn evaluate(cli: &Cli, config: &Config) -> Result<Output> {
    let status = StatusCode::from_u16(cli.status)
        .map_err(|e| CacheError::InvalidInput(format!("status {}: {}", cli.status, e)))?;

    let mut response = MockResponse::new(status);
    for raw in &cli.headers {
        let (name, value) = parse_header(raw)?;
        response = response.with_header(name, value);
    }

    let now = match &cli.now {
        Some(raw) => parse_instant(raw)?,
        None => SystemClock.now(),
    };
    let clock = ManualClock::new(now);

    let mut cached = CachedResponse::with_clock(response, &clock);
    if cached.freshness_mut().apply_default_ttl(config.cache.default_ttl) {
        info!("No lifetime in headers, using default ttl of {}s", config.cache.default_ttl);
    }

    if let Some(raw) = &cli.recalculate_at {
        clock.set(parse_instant(raw)?);
        cached.recalculate_freshness();
    }

    let freshness = cached.report();
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in cached.headers() {
        let value = String::from_utf8_lossy(value.as_bytes());
        headers
            .entry(name.as_str().to_string())
            .and_modify(|joined| {
                joined.push_str(", ");
                joined.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }

    Ok(Output { freshness, headers })
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| CacheError::InvalidInput(format!("header without ':': {}", raw)))?;
    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|e| CacheError::InvalidInput(format!("header name {:?}: {}", name, e)))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|e| CacheError::InvalidInput(format!("header value {:?}: {}", value, e)))?;
    Ok((name, value))
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    parse_http_date(raw).ok_or_else(|| CacheError::InvalidInput(format!("not an HTTP-date: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("http-freshness").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_header() {
        let (name, value) = parse_header("Cache-Control:  max-age=60 ").unwrap();
        assert_eq!(name, hyper::header::CACHE_CONTROL);
        assert_eq!(value, "max-age=60");

        assert!(matches!(parse_header("no colon"), Err(CacheError::InvalidInput(_))));
        assert!(matches!(parse_header("bad name: x"), Err(CacheError::InvalidInput(_))));
    }

    #[test]
    fn test_evaluate_with_recalculation() {
        let cli = cli(&[
            "-H",
            "Cache-Control: max-age=100",
            "--now",
            "Fri, 01 Mar 2024 12:00:00 GMT",
            "--recalculate-at",
            "Fri, 01 Mar 2024 12:00:40 GMT",
        ]);
        let output = evaluate(&cli, &Config::default()).unwrap();

        assert_eq!(output.freshness.age, 40);
        assert_eq!(output.freshness.ttl, 60);
        assert!(output.freshness.fresh);
        assert_eq!(output.headers["age"], "40");
        assert_eq!(output.headers["date"], "Fri, 01 Mar 2024 12:00:00 GMT");
    }

    #[test]
    fn test_evaluate_joins_repeated_headers() {
        let cli = cli(&[
            "-H",
            "Cache-Control: public",
            "-H",
            "Cache-Control: max-age=60",
            "--now",
            "Fri, 01 Mar 2024 12:00:00 GMT",
        ]);
        let output = evaluate(&cli, &Config::default()).unwrap();

        assert_eq!(output.headers["cache-control"], "public, max-age=60");
        assert_eq!(output.freshness.max_age, 60);
    }

    #[test]
    fn test_evaluate_defaults_to_wall_clock() {
        let before = SystemClock.now();
        let output = evaluate(&cli(&[]), &Config::default()).unwrap();
        assert!(output.freshness.now >= before - chrono::Duration::seconds(1));
        assert_eq!(output.freshness.age, 0);
    }

    #[test]
    fn test_evaluate_applies_default_ttl() {
        let cli = cli(&["--now", "Fri, 01 Mar 2024 12:00:00 GMT"]);
        let mut config = Config::default();
        config.cache.default_ttl = 30;

        let output = evaluate(&cli, &config).unwrap();
        assert_eq!(output.freshness.ttl, 30);
        assert!(output.freshness.fresh);
    }

    #[test]
    fn test_evaluate_rejects_bad_input() {
        let config = Config::default();
        assert!(evaluate(&cli(&["--status", "1000"]), &config).is_err());
        assert!(evaluate(&cli(&["--now", "tomorrow"]), &config).is_err());
    }
}
