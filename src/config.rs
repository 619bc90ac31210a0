//! Deployment modes and browser launch configuration
//!
//! The launch configuration is a static lookup keyed by [`DeploymentMode`].
//! It is resolved once at startup and handed to the renderer; nothing here is
//! re-evaluated per request.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::Error;

/// Chrome binary used in development when no explicit path is given.
pub const DEFAULT_CHROME_PATH: &str = "/opt/google/chrome/google-chrome";

/// Switches for Chrome in constrained serverless sandboxes.
const SERVERLESS_ARGS: &[&str] = &[
    "--autoplay-policy=user-gesture-required",
    "--disable-background-networking",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-client-side-phishing-detection",
    "--disable-component-update",
    "--disable-default-apps",
    "--disable-dev-shm-usage",
    "--disable-domain-reliability",
    "--disable-extensions",
    "--disable-features=AudioServiceOutOfProcess",
    "--disable-gpu",
    "--disable-hang-monitor",
    "--disable-ipc-flooding-protection",
    "--disable-notifications",
    "--disable-offer-store-unmasked-wallet-cards",
    "--disable-popup-blocking",
    "--disable-print-preview",
    "--disable-prompt-on-repost",
    "--disable-renderer-backgrounding",
    "--disable-setuid-sandbox",
    "--disable-speech-api",
    "--disable-sync",
    "--hide-scrollbars",
    "--ignore-gpu-blacklist",
    "--metrics-recording-only",
    "--mute-audio",
    "--no-default-browser-check",
    "--no-first-run",
    "--no-pings",
    "--no-sandbox",
    "--no-zygote",
    "--password-store=basic",
    "--use-gl=swiftshader",
    "--use-mock-keychain",
    "--single-process",
];

/// Switches for a desktop Chrome: the serverless set without
/// `--single-process`, plus a maximized window.
fn desktop_args() -> Vec<String> {
    SERVERLESS_ARGS
        .iter()
        .filter(|arg| **arg != "--single-process")
        .chain(std::iter::once(&"--start-maximized"))
        .map(|arg| arg.to_string())
        .collect()
}

/// Where the service is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    /// Local machine with a system-installed Chrome
    Development,
    /// Packaged deployment with a bundled, serverless-friendly Chrome
    #[default]
    Production,
    /// Automated tests: browser defaults, no extra switches
    Test,
}

impl DeploymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentMode::Development => "development",
            DeploymentMode::Production => "production",
            DeploymentMode::Test => "test",
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(DeploymentMode::Development),
            "production" | "prod" => Ok(DeploymentMode::Production),
            "test" => Ok(DeploymentMode::Test),
            other => Err(Error::ConfigError(format!("unknown deployment mode '{}'", other))),
        }
    }
}

/// How to start the browser for one deployment mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LaunchProfile {
    /// Explicit Chrome binary; `None` lets headless_chrome locate or fetch one
    pub executable: Option<PathBuf>,
    /// Extra command line switches
    pub args: Vec<String>,
    /// Run without a visible window
    pub headless: bool,
    /// Keep Chrome's sandbox enabled
    pub sandbox: bool,
}

impl LaunchProfile {
    /// Look up the launch profile for `mode`.
    ///
    /// `chrome_path` only applies to [`DeploymentMode::Development`], where it
    /// defaults to [`DEFAULT_CHROME_PATH`].
    pub fn for_mode(mode: DeploymentMode, chrome_path: Option<PathBuf>) -> Self {
        match mode {
            DeploymentMode::Development => Self {
                executable: Some(chrome_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CHROME_PATH))),
                args: desktop_args(),
                headless: true,
                sandbox: false,
            },
            DeploymentMode::Production => Self {
                executable: chrome_path,
                args: SERVERLESS_ARGS.iter().map(|s| s.to_string()).collect(),
                headless: true,
                sandbox: false,
            },
            DeploymentMode::Test => Self {
                executable: None,
                args: Vec::new(),
                headless: true,
                sandbox: true,
            },
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    /// The usual social preview size.
    fn default() -> Self {
        Self {
            width: 1200,
            height: 630,
        }
    }
}

/// Configuration for one engine instance
///
/// # Examples
///
/// ```
/// let cfg = ogpshot::EngineConfig::default();
/// assert_eq!(cfg.viewport.width, 1200);
/// assert_eq!(cfg.accept_language, "ja-JP");
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Browser launch settings
    pub launch: LaunchProfile,
    /// Viewport dimensions
    pub viewport: Viewport,
    /// Value of the `Accept-Language` header sent by the page
    pub accept_language: String,
    /// Additional HTTP headers sent by the page
    pub headers: HashMap<String, String>,
    /// Timeout for individual browser operations in milliseconds
    pub timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            launch: LaunchProfile::for_mode(DeploymentMode::Test, None),
            viewport: Viewport::default(),
            accept_language: "ja-JP".to_string(),
            headers: HashMap::new(),
            timeout_ms: 30000,
        }
    }
}

impl EngineConfig {
    /// All extra headers the page should send, `Accept-Language` included.
    pub fn request_headers(&self) -> HashMap<&str, &str> {
        let mut headers: HashMap<&str, &str> = self
            .headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        headers.insert("Accept-Language", self.accept_language.as_str());
        headers
    }
}
