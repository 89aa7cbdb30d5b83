use serde::Deserialize;

/// Main configuration structure for Sumi-Trawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    #[serde(default)]
    pub images: Option<ImageConfig>,
    /// URLs inserted at depth 0 if the store does not know them yet
    #[serde(default)]
    pub seeds: Vec<String>,
}

impl Config {
    /// Returns the auth section only when it is switched on
    pub fn active_auth(&self) -> Option<&AuthConfig> {
        self.auth.as_ref().filter(|auth| auth.enabled)
    }

    /// Returns the image section only when capture is switched on
    pub fn active_images(&self) -> Option<&ImageConfig> {
        self.images.as_ref().filter(|images| images.enabled)
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of frontier rounds to run (0 = until the frontier is empty)
    #[serde(rename = "max-depth", default)]
    pub max_depth: u32,

    /// Maximum records pulled into one frontier (0 = all uncrawled records)
    #[serde(rename = "batch-size", default)]
    pub batch_size: u32,

    /// Failed fetches after which a page leaves the frontier (0 = never)
    #[serde(rename = "max-fetch-attempts", default)]
    pub max_fetch_attempts: u32,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_request_timeout() -> u64 {
    30
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Login settings for sites that hide content behind a session
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Endpoint the login form is posted to
    #[serde(rename = "login-endpoint")]
    pub login_endpoint: String,

    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Form field name carrying the username
    #[serde(rename = "username-field", default = "default_username_field")]
    pub username_field: String,

    /// Form field name carrying the password
    #[serde(rename = "password-field", default = "default_password_field")]
    pub password_field: String,
}

fn default_username_field() -> String {
    "username".to_string()
}

fn default_password_field() -> String {
    "password".to_string()
}

/// Image capture configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Smallest resource size in bytes worth downloading
    #[serde(rename = "min-size", default)]
    pub min_size: Option<u64>,

    /// Directory downloaded images are written to
    #[serde(rename = "media-dir", default = "default_media_dir")]
    pub media_dir: String,
}

fn default_media_dir() -> String {
    "./media".to_string()
}
