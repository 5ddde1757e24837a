use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

const APP_USER_AGENT: &str = concat!("mrpack-realizer/", env!("CARGO_PKG_VERSION"));

/// Client shared by every fetch. Bodies must arrive uncompressed; manifest
/// digests cover the raw bytes.
pub fn build_http_client(connect_timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(connect_timeout)
        .build()
}
