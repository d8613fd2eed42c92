//! Synchronous request execution against the Cube REST API.
//!
//! [`CubeClient`] wraps every call in the same protocol: attach the current
//! token, long-poll while the backend reports the continue-wait sentinel, and
//! reauthenticate exactly once on a 403. Every transport and protocol
//! condition is normalized into a [`CubeResponse`] value; only a fatal token
//! refresh failure escapes as an error.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::cast::cast_numerics;
use crate::config::CubeCredentials;
use crate::error::{CubeError, CubeResult};
use crate::sanitize::sanitize_headers;
use crate::token::TokenManager;
use crate::types::{CubeResponse, Query};

const TIMEOUT_MESSAGE: &str =
    "Request timed out. Something may have gone wrong or the request may be too complex.";
const AUTH_FAILED_MESSAGE: &str = "Authentication failed. Please check your API token.";

/// Backend routes this client can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Meta,
    Load,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Route::Meta => "meta",
            Route::Load => "load",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
struct PollSettings {
    /// Per-attempt socket timeout. This exceeds `max_wait`, so a single slow
    /// attempt can consume the whole poll budget before any retry happens.
    request_timeout: Duration,
    /// Cumulative budget for the continue-wait loop, measured from the first
    /// attempt.
    max_wait: Duration,
    /// Fixed delay between poll retries.
    backoff: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_wait: Duration::from_secs(10),
            backoff: Duration::from_secs(1),
        }
    }
}

pub struct CubeClient {
    endpoint: Url,
    http: reqwest::blocking::Client,
    tokens: TokenManager,
    settings: PollSettings,
    /// Dataset description fetched once at construction, never refreshed.
    meta: CubeResponse,
}

impl CubeClient {
    /// Builds the client, mints the initial token (fatal if it does not
    /// validate), and eagerly fetches the dataset description. A `meta` call
    /// that comes back error-shaped is cached as-is rather than failing
    /// construction.
    pub fn connect(credentials: CubeCredentials) -> CubeResult<Self> {
        Self::with_settings(credentials, PollSettings::default())
    }

    fn with_settings(credentials: CubeCredentials, settings: PollSettings) -> CubeResult<Self> {
        let endpoint = Url::parse(&credentials.endpoint).map_err(|e| {
            CubeError::Config(format!("invalid endpoint `{}`: {e}", credentials.endpoint))
        })?;
        let http = reqwest::blocking::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| CubeError::Config(format!("failed to build HTTP client: {e}")))?;
        let tokens = TokenManager::new(credentials.api_secret, credentials.token_claims)?;

        let mut client = Self {
            endpoint,
            http,
            tokens,
            settings,
            meta: CubeResponse::default(),
        };
        client.meta = client.execute(Route::Meta, &Map::new())?;
        info!("connected to Cube endpoint {}", client.endpoint);
        Ok(client)
    }

    /// The cached dataset description.
    pub fn meta(&self) -> &CubeResponse {
        &self.meta
    }

    /// Returns the dataset description cached at construction.
    pub fn describe(&self) -> CubeResponse {
        self.meta.clone()
    }

    /// Runs a query against the `load` route, optionally normalizing numeric
    /// cells per the response annotation.
    pub fn query(&self, query: &Query, cast: bool) -> CubeResult<CubeResponse> {
        let value = match serde_json::to_value(query) {
            Ok(value) => value,
            Err(e) => return Ok(CubeResponse::from_error(format!("Request failed: {e}"))),
        };
        let mut params = Map::new();
        params.insert("query".to_string(), value);

        let mut response = self.execute(Route::Load, &params)?;
        if cast {
            cast_numerics(&mut response);
        }
        Ok(response)
    }

    /// Issues one authenticated call with the full polling and
    /// reauthentication protocol.
    ///
    /// Each parameter value is serialized to JSON independently, one
    /// query-string entry per key. Never returns `Err` for transport,
    /// polling, or authentication-retry conditions; those come back as
    /// error-shaped responses. Only [`CubeError::Auth`] from a failed token
    /// refresh propagates.
    pub fn execute(&self, route: Route, params: &Map<String, Value>) -> CubeResult<CubeResponse> {
        let url = self.route_url(route);

        let mut serialized = Vec::with_capacity(params.len());
        for (key, value) in params {
            match serde_json::to_string(value) {
                Ok(text) => serialized.push((key.clone(), text)),
                Err(e) => return Ok(CubeResponse::from_error(format!("Request failed: {e}"))),
            }
        }

        let headers = match auth_headers(&self.tokens.current()) {
            Ok(headers) => headers,
            Err(message) => {
                return Ok(CubeResponse::from_error(format!(
                    "Request failed: {message}"
                )))
            }
        };
        debug!(
            "making request to {url} with headers: {:?}",
            sanitize_headers(&headers)
        );

        let started = Instant::now();
        let mut outcome = self.send(&url, &serialized, &headers);

        // The backend signals "still computing" through a data-shaped
        // sentinel, not an HTTP status.
        while matches!(&outcome, Ok((_, body)) if body.is_continue_wait()) {
            if started.elapsed() > self.settings.max_wait {
                error!("request timed out after {:?}", self.settings.max_wait);
                return Ok(CubeResponse::from_error(TIMEOUT_MESSAGE));
            }
            warn!(
                "request incomplete, polling again in {:?}",
                self.settings.backoff
            );
            thread::sleep(self.settings.backoff);
            outcome = self.send(&url, &serialized, &headers);
        }

        let (status, body) = match outcome {
            Ok(pair) => pair,
            Err(message) => {
                error!("request failed with error: {message}");
                return Ok(CubeResponse::from_error(format!(
                    "Request failed: {message}"
                )));
            }
        };

        if status == StatusCode::FORBIDDEN {
            if self.tokens.pregenerated() {
                error!("authentication failed with pre-generated token");
                return Ok(CubeResponse::from_error(AUTH_FAILED_MESSAGE));
            }
            warn!("received 403, attempting token refresh");
            self.tokens.refresh()?;
            let headers = match auth_headers(&self.tokens.current()) {
                Ok(headers) => headers,
                Err(message) => {
                    return Ok(CubeResponse::from_error(format!(
                        "Request failed: {message}"
                    )))
                }
            };
            debug!(
                "retrying request with refreshed token: {:?}",
                sanitize_headers(&headers)
            );
            // Single retry, returned verbatim; no second refresh and no
            // re-entry into the poll loop.
            return Ok(match self.send(&url, &serialized, &headers) {
                Ok((_, body)) => body,
                Err(message) => {
                    error!("request failed with error: {message}");
                    CubeResponse::from_error(format!("Request failed: {message}"))
                }
            });
        }

        if status != StatusCode::OK {
            error!("request failed with error: {:?}", body.error);
        }
        Ok(body)
    }

    /// Endpoint and route joined with exactly one `/`, regardless of a
    /// trailing slash on the configured endpoint.
    fn route_url(&self, route: Route) -> String {
        format!(
            "{}/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            route
        )
    }

    fn send(
        &self,
        url: &str,
        params: &[(String, String)],
        headers: &HeaderMap,
    ) -> Result<(StatusCode, CubeResponse), String> {
        let response = self
            .http
            .get(url)
            .headers(headers.clone())
            .query(params)
            .send()
            .map_err(|e| e.to_string())?;
        let status = response.status();
        let body = response
            .json::<CubeResponse>()
            .map_err(|e| e.to_string())?;
        Ok((status, body))
    }
}

/// The `Authorization` header carries the bare token, no scheme prefix.
fn auth_headers(token: &str) -> Result<HeaderMap, String> {
    let value = HeaderValue::from_str(token).map_err(|e| e.to_string())?;
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}
