//! A single-GET HTTP client with an optional connect/transfer deadline.

use std::time::Duration;

use crate::error::FetchError;

/// Low-speed/connect timeout applied unless the engine is built with
/// `no_timeouts`. `reqwest` has no separate libcurl-style "low speed limit"
/// knob, so this single deadline stands in for both the connect and
/// low-speed policies the distilled spec names; see DESIGN.md.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Performs single GET requests, classifying network and HTTP-status
/// failures for the caller.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::blocking::Client,
}

impl Fetcher {
    pub fn new(no_timeouts: bool) -> Self {
        let mut builder = reqwest::blocking::Client::builder();
        if !no_timeouts {
            builder = builder.timeout(DEFAULT_TIMEOUT).connect_timeout(DEFAULT_TIMEOUT);
        }
        let client = builder
            .build()
            .expect("reqwest client builder with a fixed timeout never fails");
        Fetcher { client }
    }

    /// Fetches `url`, returning its full response body.
    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })
    }
}
