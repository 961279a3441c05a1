//! Uniform request/response bridge to the remote services.
//!
//! Every remote operation goes through [`ApiBridge::call`]: build the two
//! headers from the credential, issue the request with a bounded timeout and
//! classify the outcome into a [`CallResult`]. Nothing is retried or cached.

use std::fmt;
use std::time::{Duration, Instant};

use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const JSON_MIME: &str = "application/json";

/// Outcome of a single bridge call: the parsed JSON payload or a classified error.
pub type CallResult = Result<Value, BridgeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The service answered with a status other than 200/201.
    #[error("Error {code}: {body}")]
    HttpStatus { code: u16, body: String },

    #[error("Timeout: no response within {after:?}")]
    Timeout { after: Duration },

    #[error("Connection Error: {detail}")]
    Connection { detail: String },

    /// A success status whose body is empty or not JSON.
    #[error("Malformed Response: {detail}")]
    MalformedResponse { detail: String },

    /// The request could not be built (bad URL, header or body shape).
    #[error("Invalid Request: {detail}")]
    InvalidRequest { detail: String },
}

impl BridgeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BridgeError::Timeout { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            BridgeError::HttpStatus { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        BridgeError::MalformedResponse {
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid(detail: impl Into<String>) -> Self {
        BridgeError::InvalidRequest {
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Key <secret>` (Pipio services).
    Key,
    /// `Authorization: Bearer <secret>` (chat completion).
    Bearer,
}

impl AuthScheme {
    fn prefix(&self) -> &'static str {
        match self {
            AuthScheme::Key => "Key",
            AuthScheme::Bearer => "Bearer",
        }
    }
}

/// An opaque user-supplied secret. Only ever rendered into the Authorization header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    scheme: AuthScheme,
    secret: String,
}

impl Credential {
    pub fn new(scheme: AuthScheme, secret: impl Into<String>) -> Self {
        Self {
            scheme,
            secret: secret.into(),
        }
    }

    pub fn key(secret: impl Into<String>) -> Self {
        Self::new(AuthScheme::Key, secret)
    }

    pub fn bearer(secret: impl Into<String>) -> Self {
        Self::new(AuthScheme::Bearer, secret)
    }

    pub fn is_blank(&self) -> bool {
        self.secret.trim().is_empty()
    }

    fn header_value(&self) -> Result<HeaderValue, BridgeError> {
        let mut value =
            HeaderValue::from_str(&format!("{} {}", self.scheme.prefix(), self.secret.trim()))
                .map_err(|_| BridgeError::invalid("credential contains characters not allowed in a header"))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("scheme", &self.scheme)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <redacted>", self.scheme.prefix())
    }
}

/// Authorization plus the content-negotiation header matching the verb.
pub fn request_headers(method: Method, credential: &Credential) -> Result<HeaderMap, BridgeError> {
    let mut headers = HeaderMap::with_capacity(2);
    headers.insert(AUTHORIZATION, credential.header_value()?);
    match method {
        Method::Get => headers.insert(ACCEPT, HeaderValue::from_static(JSON_MIME)),
        Method::Post => headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_MIME)),
    };
    Ok(headers)
}

#[derive(Debug, Clone)]
pub struct ApiBridge {
    client: Client,
    timeout: Duration,
}

impl Default for ApiBridge {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ApiBridge {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    pub async fn get(&self, url: &Url, credential: &Credential) -> CallResult {
        self.call(Method::Get, url, credential, None).await
    }

    pub async fn post(&self, url: &Url, credential: &Credential, body: &Value) -> CallResult {
        self.call(Method::Post, url, credential, Some(body)).await
    }

    /// Perform one request and classify the outcome. `body` is required for
    /// POST and rejected for GET.
    pub async fn call(
        &self,
        method: Method,
        url: &Url,
        credential: &Credential,
        body: Option<&Value>,
    ) -> CallResult {
        let headers = request_headers(method, credential)?;
        let request = match (method, body) {
            (Method::Get, None) => self.client.get(url.clone()),
            (Method::Post, Some(payload)) => {
                let bytes = serde_json::to_vec(payload)
                    .map_err(|e| BridgeError::invalid(format!("unserializable body: {}", e)))?;
                self.client.post(url.clone()).body(bytes)
            }
            (Method::Get, Some(_)) => return Err(BridgeError::invalid("GET requests carry no body")),
            (Method::Post, None) => return Err(BridgeError::invalid("POST requires a JSON body")),
        };

        let started = Instant::now();
        debug!("{} {}", method, redact_query(url));

        let response = request
            .headers(headers)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify_transport(method, url, e))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| self.classify_transport(method, url, e))?;

        debug!(
            "{} {} -> {} in {}ms",
            method,
            redact_query(url),
            status,
            started.elapsed().as_millis()
        );

        classify_response(status, text)
    }

    fn classify_transport(&self, method: Method, url: &Url, err: reqwest::Error) -> BridgeError {
        // reqwest renders the full URL, query included.
        let err = err.without_url();
        let classified = if err.is_timeout() {
            BridgeError::Timeout {
                after: self.timeout,
            }
        } else {
            BridgeError::Connection {
                detail: error_chain(&err),
            }
        };
        warn!("{} {} failed: {}", method, redact_query(url), classified);
        classified
    }
}

/// Map a status code and raw body onto the success/failure contract.
pub fn classify_response(status: u16, body: String) -> CallResult {
    if !matches!(status, 200 | 201) {
        return Err(BridgeError::HttpStatus { code: status, body });
    }
    if body.trim().is_empty() {
        return Err(BridgeError::malformed(format!(
            "status {} with an empty body",
            status
        )));
    }
    match serde_json::from_str::<Value>(&body) {
        Ok(Value::Null) => Err(BridgeError::malformed(format!(
            "status {} with a null body",
            status
        ))),
        Ok(payload) => Ok(payload),
        Err(e) => Err(BridgeError::malformed(format!(
            "status {} with a non-JSON body ({})",
            status, e
        ))),
    }
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !detail.contains(&cause_text) {
            detail.push_str(": ");
            detail.push_str(&cause_text);
        }
        source = cause.source();
    }
    detail
}

fn redact_query(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    match url.query() {
        Some(_) => format!("{}?…", shown),
        None => shown.to_string(),
    }
}
