use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::Client;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client shared by feed fetching, the model API, image rendering and the GitHub store.
pub(crate) fn http_client() -> anyhow::Result<Client> {
    Client::builder()
        .user_agent(concat!("newsroom/", env!("CARGO_PKG_VERSION")))
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("failed to build HTTP client")
}
