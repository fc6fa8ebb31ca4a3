use serde::Deserialize;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub crawler: CrawlerConfig,
    pub scanner: ScannerConfig,
    pub output: OutputConfig,
}

/// Target server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Host name, also used for TLS verification and the Host header
    pub host: String,

    /// TCP port
    pub port: u16,

    /// Wrap each connection in a TLS client handshake
    pub tls: bool,

    /// Pause between connection attempts (milliseconds)
    pub connect_retry_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "proj5.3700.network".to_string(),
            port: 443,
            tls: true,
            connect_retry_delay_ms: 50,
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of concurrent worker tasks
    pub workers: usize,

    /// Number of distinct flags that ends the crawl
    pub target_flags: usize,

    /// Page fetched right after login to seed the frontier
    pub start_path: String,

    /// Login form endpoint (GET for the form, POST for credentials)
    pub login_path: String,

    /// Size of the first read, which must cover the status line and headers
    pub read_chunk_size: usize,

    /// Maximum redirects followed per request (0 = unlimited)
    pub max_redirects: u32,

    /// Maximum 503 retries per request (0 = unlimited)
    pub max_unavailable_retries: u32,

    /// Maximum times a failing identifier is put back on the frontier (0 = unlimited)
    pub max_page_attempts: u32,

    /// Overall crawl deadline in seconds
    pub deadline_secs: Option<u64>,

    /// Log progress every this many completed identifiers
    pub progress_interval: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            target_flags: 5,
            start_path: "/fakebook/".to_string(),
            login_path: "/accounts/login/?next=/fakebook/".to_string(),
            read_chunk_size: 1000,
            max_redirects: 10,
            max_unavailable_retries: 0,
            max_page_attempts: 0,
            deadline_secs: None,
            progress_interval: 100,
        }
    }
}

/// Markup scanner configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScannerConfig {
    /// Links must contain this path prefix to be followed
    pub profile_prefix: String,

    /// Links containing this segment are never followed
    pub excluded_segment: String,

    /// Tag of the element that announces a flag
    pub marker_tag: String,

    /// Class of the element that announces a flag
    pub marker_class: String,

    /// Characters stripped from the front of the flag text ("FLAG: ")
    pub payload_prefix_len: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            profile_prefix: "/fakebook/".to_string(),
            excluded_segment: "friends".to_string(),
            marker_tag: "h2".to_string(),
            marker_class: "secret_flag".to_string(),
            payload_prefix_len: 6,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// File receiving one flag per line
    pub flags_path: String,

    /// Optional markdown summary file
    pub summary_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            flags_path: "secret_flags".to_string(),
            summary_path: None,
        }
    }
}
