//! HTTP transport for the LMS endpoints.
//!
//! Each action is POSTed to its target, resolved against the configured base
//! URL, with the CSRF token attached the way the web front end attaches it.

use reqwest::blocking::Client;
use reqwest::Url;
use tracing::debug;

use super::Transport;
use crate::config::{BodyEncoding, EndpointConfig};
use crate::error::SyncError;
use crate::queue::QueuedAction;

/// Header carrying the CSRF token.
const CSRF_HEADER: &str = "X-CSRFToken";

/// POSTs actions over HTTP.
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    csrf_token: Option<String>,
    encoding: BodyEncoding,
}

impl HttpTransport {
    /// Build a transport from endpoint settings.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Config` if the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &EndpointConfig) -> Result<Self, SyncError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            SyncError::Config(format!("Invalid base URL '{}': {e}", config.base_url))
        })?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            csrf_token: config.csrf_token.clone(),
            encoding: config.body_encoding,
        })
    }

    /// The URL relative targets are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an action target to an absolute URL.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidTarget` if the target cannot be joined onto
    /// the base URL.
    pub fn resolve(&self, target: &str) -> Result<Url, SyncError> {
        self.base_url
            .join(target)
            .map_err(|e| SyncError::InvalidTarget {
                target: target.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Transport for HttpTransport {
    fn deliver(&self, action: &QueuedAction) -> Result<serde_json::Value, SyncError> {
        let url = self.resolve(&action.target)?;

        let mut request = self
            .client
            .post(url.clone())
            .header("X-Requested-With", "XMLHttpRequest");

        if let Some(token) = &self.csrf_token {
            request = request.header(CSRF_HEADER, token);
        }

        request = match self.encoding {
            BodyEncoding::Form => request.form(&action.payload),
            BodyEncoding::Json => request.json(&action.payload),
        };

        debug!(%url, kind = %action.kind, "posting action");

        let response = request
            .send()
            .map_err(|e| SyncError::Delivery(format!("POST {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Delivery(format!(
                "POST {url}: HTTP {}",
                status.as_u16()
            )));
        }

        response
            .json()
            .map_err(|e| SyncError::Delivery(format!("POST {url}: invalid JSON response: {e}")))
    }
}
