use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, USER_AGENT};
use thiserror::Error;

const AGENT: &str = concat!("d2-pvp-advisor/", env!("CARGO_PKG_VERSION"));

/// Non-2xx answer; the body is kept so callers can decode an error envelope.
#[derive(Debug, Error)]
#[error("http {status}: {}", truncate(.body, 200))]
pub struct StatusError {
    pub status: StatusCode,
    pub body: String,
}

/// `None` disables the blocking client's built-in 30s default.
pub fn http_client(timeout: Option<Duration>) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build http client")
}

/// GETs `url` and returns the body of a 2xx response. No caching.
pub fn fetch_json(client: &Client, url: &str, extra_headers: &[(&str, &str)]) -> Result<String> {
    let mut req = client
        .get(url)
        .header(USER_AGENT, AGENT)
        .header(ACCEPT, "application/json");
    for (name, value) in extra_headers {
        req = req.header(*name, *value);
    }

    let resp = req.send().context("request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(StatusError { status, body }.into());
    }
    Ok(body)
}

fn truncate(raw: &str, max: usize) -> &str {
    match raw.char_indices().nth(max) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}
