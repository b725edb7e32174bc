/*
[INPUT]:  HTTP configuration (base URL, timeouts, session credentials)
[OUTPUT]: Configured reqwest client ready for console calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use crate::http::{ConsoleError, Result};
use reqwest::header::COOKIE;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use std::time::Duration;
use tracing::debug;

/// Default console address (Django development server)
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";

/// Cookie Django stores the session key in
pub const DEFAULT_SESSION_COOKIE: &str = "sessionid";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Session credentials sent with every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub cookie_name: String,
    pub session_id: String,
}

impl Credentials {
    pub fn session(session_id: impl Into<String>) -> Self {
        Self {
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            session_id: session_id.into(),
        }
    }

    fn cookie_header(&self) -> String {
        format!("{}={}", self.cookie_name, self.session_id)
    }
}

/// HTTP client for a Chaperone-family console backend
#[derive(Debug, Clone)]
pub struct ConsoleClient {
    http_client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
}

impl ConsoleClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_config_and_base_url(config, DEFAULT_BASE_URL)
    }

    /// Create a new client pointed at a specific console
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|err| ConsoleError::Config(err.to_string()))?;

        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ConsoleError::Config(format!(
                "base URL cannot carry paths: {base_url}"
            )));
        }

        Ok(Self {
            http_client,
            base_url,
            credentials: None,
        })
    }

    /// Set credentials for authenticated requests
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    /// Get credentials if set
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build full URL from path segments, escaping each one
    pub(crate) fn endpoint_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ConsoleError::Config(format!("invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build request builder carrying the session cookie
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http_client.request(method, url);
        match &self.credentials {
            Some(credentials) => builder.header(COOKIE, credentials.cookie_header()),
            None => builder,
        }
    }

    /// Send a request and return the body as text
    pub(crate) async fn send_text(&self, builder: RequestBuilder) -> Result<String> {
        let response = check_status(builder.send().await?)?;
        Ok(response.text().await?)
    }

    /// Send a request whose body is ignored
    pub(crate) async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        check_status(builder.send().await?)?;
        Ok(())
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    debug!(status = status.as_u16(), url = %response.url(), "console returned error status");
    Err(ConsoleError::from_status(status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_escapes_segments() {
        let client = ConsoleClient::new().expect("client init");
        let url = client
            .endpoint_url(&["configure", "tail", "nsx edge"])
            .expect("url");
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/configure/tail/nsx%20edge");
    }

    #[test]
    fn test_endpoint_url_keeps_base_prefix() {
        let client = ConsoleClient::with_config_and_base_url(
            ClientConfig::default(),
            "https://console.local/vmos/",
        )
        .expect("client init");
        let url = client.endpoint_url(&["deploy", "tail", "sddc"]).expect("url");
        assert_eq!(url.as_str(), "https://console.local/vmos/deploy/tail/sddc");
    }

    #[test]
    fn test_rejects_non_base_url() {
        let err = ConsoleClient::with_config_and_base_url(ClientConfig::default(), "mailto:ops@x")
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Config(_)));
    }

    #[test]
    fn test_session_cookie_header() {
        let credentials = Credentials::session("abc123");
        assert_eq!(credentials.cookie_header(), "sessionid=abc123");
    }
}
