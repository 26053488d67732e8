//! Thin `reqwest` wrapper shared by every CLI subcommand that talks to a
//! running `capfox` instance over HTTP.

use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub fn build() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .expect("building the CLI http client should never fail")
}
