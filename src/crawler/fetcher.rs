//! HTTP fetcher implementation
//!
//! This module handles all network access for the crawler:
//! - Building HTTP clients with the configured user agent and timeout
//! - GET requests for page bodies and image downloads
//! - HEAD requests for resource size and Content-Type
//! - Logging into a site so later requests carry the session cookie

use crate::config::{AuthConfig, UserAgentConfig};
use crate::TrawlError;
use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Response};
use std::path::Path;
use std::time::Duration;

/// Login credentials posted to a login endpoint
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Form field name for the username
    pub username_field: String,
    /// Form field name for the password
    pub password_field: String,
}

impl From<&AuthConfig> for Credentials {
    fn from(config: &AuthConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
            username_field: config.username_field.clone(),
            password_field: config.password_field.clone(),
        }
    }
}

/// Retrieves pages and binary resources over some transport
///
/// Timeouts are the fetcher's business: a request that stalls must come back
/// as an error, which the engine treats like any other failed fetch.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches a resource body
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TrawlError>;

    /// Fetches a resource and writes it to `dest`
    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<(), TrawlError>;

    /// Declared size of a resource in bytes, if the server reports one
    async fn head_size(&self, url: &str) -> Result<Option<u64>, TrawlError>;

    /// Declared Content-Type of a resource, if the server reports one
    async fn content_type(&self, url: &str) -> Result<Option<String>, TrawlError>;

    /// Establishes a logged-in session used by every later request
    async fn start_authenticated_session(
        &self,
        credentials: &Credentials,
        endpoint: &str,
    ) -> Result<(), TrawlError> {
        let _ = credentials;
        Err(TrawlError::Auth(format!(
            "this fetcher cannot log in to {}",
            endpoint
        )))
    }
}

/// Builds an HTTP client with proper configuration
///
/// The client keeps a cookie store so a login session survives across
/// requests.
///
/// # Example
///
/// ```no_run
/// use sumi_trawl::config::UserAgentConfig;
/// use sumi_trawl::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SumiTrawl".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, 30).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`Fetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &UserAgentConfig, timeout_secs: u64) -> Result<Self, TrawlError> {
        Ok(Self {
            client: build_http_client(config, timeout_secs)?,
        })
    }

    async fn get(&self, url: &str) -> Result<Response, TrawlError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| TrawlError::Http {
                url: url.to_string(),
                source,
            })?;
        check_status(url, response)
    }

    async fn head(&self, url: &str) -> Result<Response, TrawlError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|source| TrawlError::Http {
                url: url.to_string(),
                source,
            })?;
        check_status(url, response)
    }
}

fn check_status(url: &str, response: Response) -> Result<Response, TrawlError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(TrawlError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

fn header_string(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TrawlError> {
        let response = self.get(url).await?;
        let body = response.bytes().await.map_err(|source| TrawlError::Http {
            url: url.to_string(),
            source,
        })?;
        Ok(body.to_vec())
    }

    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<(), TrawlError> {
        let body = self.fetch(url).await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &body).await?;
        tracing::debug!("Saved {} ({} bytes) to {}", url, body.len(), dest.display());
        Ok(())
    }

    async fn head_size(&self, url: &str) -> Result<Option<u64>, TrawlError> {
        let response = self.head(url).await?;
        // Read the header directly: the body of a HEAD response is always empty
        Ok(header_string(&response, CONTENT_LENGTH).and_then(|v| v.parse().ok()))
    }

    async fn content_type(&self, url: &str) -> Result<Option<String>, TrawlError> {
        let response = self.head(url).await?;
        Ok(header_string(&response, CONTENT_TYPE))
    }

    async fn start_authenticated_session(
        &self,
        credentials: &Credentials,
        endpoint: &str,
    ) -> Result<(), TrawlError> {
        let form = [
            (credentials.username_field.as_str(), credentials.username.as_str()),
            (credentials.password_field.as_str(), credentials.password.as_str()),
        ];

        let response = self
            .client
            .post(endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| TrawlError::Auth(format!("login request to {} failed: {}", endpoint, e)))?;

        let status = response.status();
        if !status.is_success() && !status.is_redirection() {
            return Err(TrawlError::Auth(format!(
                "login to {} returned HTTP {}",
                endpoint,
                status.as_u16()
            )));
        }

        tracing::info!("Started authenticated session at {}", endpoint);
        Ok(())
    }
}
