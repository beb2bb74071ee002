//! Configuration management with environment variable support.
//!
//! This module provides centralized configuration for the exerciser, supporting:
//! - Environment variables for all configurable values
//! - Named defaults for every settle window
//! - A zero-delay preset so tests do not sleep
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `UI_EXERCISER_WEBDRIVER_URL` | WebDriver endpoint URL | `http://localhost:4444` |
//! | `UI_EXERCISER_BROWSER` | Browser behind the WebDriver (`firefox`, `chrome`) | `firefox` |
//! | `UI_EXERCISER_SESSION_DIR` | Base directory for report sessions | `/tmp/ui-exerciser` |
//! | `UI_EXERCISER_SCROLL_SETTLE_MS` | Wait after scrolling an element into view | `500` |
//! | `UI_EXERCISER_HIGHLIGHT_MS` | Wait after highlighting, before activation | `500` |
//! | `UI_EXERCISER_REACTION_MS` | Wait after activation before observing | `1500` |
//! | `UI_EXERCISER_OVERLAY_MS` | Extra wait before looking for dialogs/toasts | `500` |
//! | `UI_EXERCISER_INTER_PROBE_MS` | Pause between two probes | `1200` |
//!
//! # Example
//!
//! ```bash
//! # Point at a chromedriver and shorten the reaction window
//! export UI_EXERCISER_WEBDRIVER_URL="http://localhost:9515"
//! export UI_EXERCISER_BROWSER="chrome"
//! export UI_EXERCISER_REACTION_MS=800
//! ```

use std::env;
use std::sync::OnceLock;
use std::time::Duration;

// ============================================================================
// Default Values
// ============================================================================

/// Default WebDriver endpoint (geckodriver's default port)
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

/// Default browser name
pub const DEFAULT_BROWSER: &str = "firefox";

/// Default session base directory
pub const DEFAULT_SESSION_DIR: &str = "/tmp/ui-exerciser";

/// Default wait after scroll-into-view (milliseconds)
pub const DEFAULT_SCROLL_SETTLE_MS: u64 = 500;

/// Default wait between highlight and activation (milliseconds)
pub const DEFAULT_HIGHLIGHT_MS: u64 = 500;

/// Default settle window after activation (milliseconds)
pub const DEFAULT_REACTION_MS: u64 = 1500;

/// Default extra wait before the overlay check (milliseconds)
pub const DEFAULT_OVERLAY_MS: u64 = 500;

/// Default pause between probes (milliseconds)
pub const DEFAULT_INTER_PROBE_MS: u64 = 1200;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the WebDriver endpoint
pub const ENV_WEBDRIVER_URL: &str = "UI_EXERCISER_WEBDRIVER_URL";

/// Environment variable for the browser name
pub const ENV_BROWSER: &str = "UI_EXERCISER_BROWSER";

/// Environment variable for session directory
pub const ENV_SESSION_DIR: &str = "UI_EXERCISER_SESSION_DIR";

/// Environment variable for the scroll settle window
pub const ENV_SCROLL_SETTLE_MS: &str = "UI_EXERCISER_SCROLL_SETTLE_MS";

/// Environment variable for the highlight window
pub const ENV_HIGHLIGHT_MS: &str = "UI_EXERCISER_HIGHLIGHT_MS";

/// Environment variable for the reaction window
pub const ENV_REACTION_MS: &str = "UI_EXERCISER_REACTION_MS";

/// Environment variable for the overlay window
pub const ENV_OVERLAY_MS: &str = "UI_EXERCISER_OVERLAY_MS";

/// Environment variable for the inter-probe pause
pub const ENV_INTER_PROBE_MS: &str = "UI_EXERCISER_INTER_PROBE_MS";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized configuration for the exerciser
#[derive(Debug, Clone)]
pub struct Config {
    /// WebDriver connection settings
    pub webdriver: WebDriverSettings,
    /// Session configuration
    pub session: SessionSettings,
    /// Settle windows used by the prober and the run loop
    pub timings: TimingSettings,
}

/// WebDriver-related settings
#[derive(Debug, Clone)]
pub struct WebDriverSettings {
    /// WebDriver server URL
    pub url: String,
    /// Browser name (`firefox` or `chrome`)
    pub browser: String,
    /// Run the browser without a window
    pub headless: bool,
}

/// Session-related settings
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Base directory for session storage
    pub base_dir: String,
}

/// Fixed waits, in milliseconds.
///
/// The page under test offers no "settled" signal, so every observation is
/// preceded by one of these bounded windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingSettings {
    /// After scroll-into-view
    pub scroll_settle_ms: u64,
    /// After applying the highlight, before the activation
    pub highlight_ms: u64,
    /// After the activation, before the first observation
    pub reaction_ms: u64,
    /// Before checking for dialogs and toasts
    pub overlay_ms: u64,
    /// Between two consecutive probes
    pub inter_probe_ms: u64,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            webdriver: WebDriverSettings::from_env(),
            session: SessionSettings::from_env(),
            timings: TimingSettings::from_env(),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            webdriver: WebDriverSettings::defaults(),
            session: SessionSettings::defaults(),
            timings: TimingSettings::defaults(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl WebDriverSettings {
    /// Create WebDriver settings from environment variables
    pub fn from_env() -> Self {
        Self {
            url: env::var(ENV_WEBDRIVER_URL).unwrap_or_else(|_| DEFAULT_WEBDRIVER_URL.to_string()),
            browser: env::var(ENV_BROWSER).unwrap_or_else(|_| DEFAULT_BROWSER.to_string()),
            headless: false,
        }
    }

    /// Create WebDriver settings with defaults
    pub fn defaults() -> Self {
        Self {
            url: DEFAULT_WEBDRIVER_URL.to_string(),
            browser: DEFAULT_BROWSER.to_string(),
            headless: false,
        }
    }
}

impl SessionSettings {
    /// Create session settings from environment variables
    pub fn from_env() -> Self {
        Self {
            base_dir: env::var(ENV_SESSION_DIR).unwrap_or_else(|_| DEFAULT_SESSION_DIR.to_string()),
        }
    }

    /// Create session settings with defaults
    pub fn defaults() -> Self {
        Self {
            base_dir: DEFAULT_SESSION_DIR.to_string(),
        }
    }
}

impl TimingSettings {
    /// Create timing settings from environment variables
    pub fn from_env() -> Self {
        Self {
            scroll_settle_ms: env_millis(ENV_SCROLL_SETTLE_MS, DEFAULT_SCROLL_SETTLE_MS),
            highlight_ms: env_millis(ENV_HIGHLIGHT_MS, DEFAULT_HIGHLIGHT_MS),
            reaction_ms: env_millis(ENV_REACTION_MS, DEFAULT_REACTION_MS),
            overlay_ms: env_millis(ENV_OVERLAY_MS, DEFAULT_OVERLAY_MS),
            inter_probe_ms: env_millis(ENV_INTER_PROBE_MS, DEFAULT_INTER_PROBE_MS),
        }
    }

    /// Create timing settings with defaults
    pub fn defaults() -> Self {
        Self {
            scroll_settle_ms: DEFAULT_SCROLL_SETTLE_MS,
            highlight_ms: DEFAULT_HIGHLIGHT_MS,
            reaction_ms: DEFAULT_REACTION_MS,
            overlay_ms: DEFAULT_OVERLAY_MS,
            inter_probe_ms: DEFAULT_INTER_PROBE_MS,
        }
    }

    /// Every window set to zero. Meant for tests and in-memory pages.
    pub fn immediate() -> Self {
        Self {
            scroll_settle_ms: 0,
            highlight_ms: 0,
            reaction_ms: 0,
            overlay_ms: 0,
            inter_probe_ms: 0,
        }
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn highlight(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }

    pub fn reaction(&self) -> Duration {
        Duration::from_millis(self.reaction_ms)
    }

    pub fn overlay(&self) -> Duration {
        Duration::from_millis(self.overlay_ms)
    }

    pub fn inter_probe(&self) -> Duration {
        Duration::from_millis(self.inter_probe_ms)
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self::defaults()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn env_millis(name: &str, default: u64) -> u64 {
    parse_millis(env::var(name).ok().as_deref()).unwrap_or(default)
}

/// Parse a millisecond value, rejecting anything that is not a plain integer
fn parse_millis(raw: Option<&str>) -> Option<u64> {
    raw.map(str::trim).and_then(|s| s.parse().ok())
}

/// Get session base directory (convenience function)
pub fn session_base_dir() -> String {
    get().session.base_dir.clone()
}
