//! Shared blocking HTTP plumbing for the page source and the geocoder.

use std::time::Duration;

use tracing::warn;

const USER_AGENT: &str = concat!("ncov-inventory/", env!("CARGO_PKG_VERSION"));

pub fn client(timeout: Duration) -> reqwest::Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Runs `op` once plus up to `retries` more times while it fails with a
/// transport error. HTTP status failures are returned as-is by `op` and
/// are not retried.
pub fn with_retry<T>(
    what: &str,
    retries: u32,
    mut op: impl FnMut() -> reqwest::Result<T>,
) -> reqwest::Result<T> {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retries && is_transient(&e) => {
                attempt += 1;
                warn!(target: "net", "{what}: attempt {attempt} failed ({e}), retrying");
            }
            Err(e) => return Err(e),
        }
    }
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request()
}
