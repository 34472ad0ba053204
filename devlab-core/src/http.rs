//! Blocking HTTP transport for the devlab API.
//!
//! Bearer auth, typed status mapping, GET retry with exponential backoff,
//! and a chunked line stream for log tailing. Mutating calls are never
//! retried. All rate-limit and ban handling goes through the circuit
//! breaker so the TUI worker and the CLI share one request gate.

use std::io::{BufRead, BufReader};
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::breaker::CircuitBreaker;
use crate::config::Config;
use crate::error::ApiError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const STREAM_TIMEOUT: Duration = Duration::from_secs(3600);

pub struct ApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("devlab/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            breaker: Arc::new(CircuitBreaker::default_api()),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a JSON resource, retrying transient failures with backoff.
    pub fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ApiError> {
        if !self.breaker.allow() {
            return Err(ApiError::CircuitBreakerTripped);
        }

        let url = self.url(path);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                std::thread::sleep(self.base_delay * 2u32.pow(attempt - 1));
                if !self.breaker.allow() {
                    return Err(ApiError::CircuitBreakerTripped);
                }
            }

            tracing::debug!(%url, attempt, "GET");

            let resp = match self.http.get(&url).bearer_auth(&self.api_key).query(query).send()
            {
                Ok(resp) => resp,
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(ApiError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(ApiError::NetworkUnreachable(e.to_string()));
                }
            };

            match self.classify(resp) {
                Outcome::Ok(resp) => {
                    let value = resp
                        .json()
                        .map_err(|e| ApiError::Decode(format!("{url}: {e}")))?;
                    self.breaker.note_success();
                    return Ok(value);
                }
                Outcome::Retry(err) => last_error = Some(err),
                Outcome::Fail(err) => return Err(err),
            }
        }

        Err(last_error.unwrap_or_else(|| ApiError::Api {
            status: 0,
            message: "max retries exceeded".into(),
        }))
    }

    /// POST a JSON body and decode a JSON response. Single attempt.
    pub fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let resp = self.post_raw(path, body)?;
        let url = self.url(path);
        resp.json()
            .map_err(|e| ApiError::Decode(format!("{url}: {e}")))
    }

    /// POST a JSON body, discarding the response body.
    pub fn post_discard<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        self.post_raw(path, body).map(|_| ())
    }

    /// POST a JSON body, returning the raw response text.
    pub fn post_text<B: Serialize>(&self, path: &str, body: &B) -> Result<String, ApiError> {
        let resp = self.post_raw(path, body)?;
        let url = self.url(path);
        resp.text()
            .map_err(|e| ApiError::Decode(format!("{url}: {e}")))
    }

    /// POST a JSON body and copy the response body into `writer` (file
    /// downloads). Returns the number of bytes written.
    pub fn post_stream_to<B: Serialize, W: std::io::Write>(
        &self,
        path: &str,
        body: &B,
        writer: &mut W,
    ) -> Result<u64, ApiError> {
        let mut resp = self.post_raw(path, body)?;
        resp.copy_to(writer)
            .map_err(|e| ApiError::NetworkUnreachable(e.to_string()))
    }

    fn post_raw<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::blocking::Response, ApiError> {
        if !self.breaker.allow() {
            return Err(ApiError::CircuitBreakerTripped);
        }

        let url = self.url(path);
        tracing::debug!(%url, "POST");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .map_err(|e| ApiError::NetworkUnreachable(e.to_string()))?;

        match self.classify(resp) {
            Outcome::Ok(resp) => {
                self.breaker.note_success();
                Ok(resp)
            }
            Outcome::Retry(err) | Outcome::Fail(err) => Err(err),
        }
    }

    /// Open a long-lived line stream (newline-delimited JSON). The caller
    /// owns reconnect/fallback policy; a dead stream surfaces as
    /// `StreamClosed` from the iterator.
    pub fn stream_lines(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<LineStream, ApiError> {
        if !self.breaker.allow() {
            return Err(ApiError::CircuitBreakerTripped);
        }

        let url = self.url(path);
        tracing::debug!(%url, "GET (stream)");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(query)
            .timeout(STREAM_TIMEOUT)
            .send()
            .map_err(|e| ApiError::NetworkUnreachable(e.to_string()))?;

        match self.classify(resp) {
            Outcome::Ok(resp) => {
                self.breaker.note_success();
                Ok(LineStream {
                    lines: BufReader::new(resp).lines(),
                })
            }
            Outcome::Retry(err) | Outcome::Fail(err) => Err(err),
        }
    }

    /// Map a response status onto retry/fail/ok, feeding the breaker.
    fn classify(&self, resp: reqwest::blocking::Response) -> Outcome {
        let status = resp.status();

        if status.is_success() {
            return Outcome::Ok(resp);
        }

        if status == StatusCode::FORBIDDEN {
            self.breaker.trip_now();
            return Outcome::Fail(ApiError::CircuitBreakerTripped);
        }

        if status == StatusCode::UNAUTHORIZED {
            return Outcome::Fail(ApiError::AuthenticationFailed);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            self.breaker.note_failure();
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Outcome::Retry(ApiError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let err = ApiError::Api {
            status: status.as_u16(),
            message: error_message(resp),
        };

        if status.is_server_error() {
            self.breaker.note_failure();
            Outcome::Retry(err)
        } else {
            Outcome::Fail(err)
        }
    }
}

enum Outcome {
    Ok(reqwest::blocking::Response),
    Retry(ApiError),
    Fail(ApiError),
}

/// Pull a human-readable message out of an error response body.
fn error_message(resp: reqwest::blocking::Response) -> String {
    let text = resp.text().unwrap_or_default();
    parse_error_message(&text)
}

fn parse_error_message(text: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        let msg = value
            .pointer("/error/message")
            .or_else(|| value.pointer("/message"))
            .and_then(|v| v.as_str());
        if let Some(msg) = msg {
            return msg.to_string();
        }
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        "(no response body)".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

/// Iterator over the lines of a chunked response body.
pub struct LineStream {
    lines: std::io::Lines<BufReader<reqwest::blocking::Response>>,
}

impl Iterator for LineStream {
    type Item = Result<String, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.lines.next()? {
            Ok(line) => Some(Ok(line)),
            Err(e) => Some(Err(ApiError::StreamClosed(e.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_nested_error() {
        let msg = parse_error_message(r#"{"error": {"message": "devbox is suspended"}}"#);
        assert_eq!(msg, "devbox is suspended");
    }

    #[test]
    fn error_message_falls_back_to_flat_message() {
        let msg = parse_error_message(r#"{"message": "invalid cursor"}"#);
        assert_eq!(msg, "invalid cursor");
    }

    #[test]
    fn error_message_falls_back_to_raw_text() {
        assert_eq!(parse_error_message("bad gateway"), "bad gateway");
        assert_eq!(parse_error_message("  "), "(no response body)");
    }

    #[test]
    fn error_message_truncates_long_bodies() {
        let long = "x".repeat(500);
        assert_eq!(parse_error_message(&long).len(), 200);
    }
}
