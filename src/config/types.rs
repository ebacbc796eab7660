use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// REST endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the SkillBridge backend (e.g., "http://localhost:8080").
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Fixed per-call timeout in milliseconds (default: 8000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Connection timeout in milliseconds (default: 3000).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Fall back to the legacy response adapters when strict decoding fails.
    #[serde(default)]
    pub accept_legacy_shapes: bool,
}

/// Backoff policy for transient failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per call, including the first (default: 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt in milliseconds (default: 1000).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Growth factor applied to the delay after each retry (default: 1.5).
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

/// Pacing of the per-widget request queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Trailing-edge debounce window in milliseconds (default: 100).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Pause after each successful request in milliseconds (default: 300).
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

/// Signed-in user to start the session with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    /// Role as issued by the backend (e.g., "ROLE_USER", "ROLE_ADMIN").
    #[serde(default)]
    pub role: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_ms() -> u64 {
    8000
}

fn default_connect_timeout_ms() -> u64 {
    3000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_multiplier() -> f64 {
    1.5
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_pacing_ms() -> u64 {
    300
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl QueueConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            accept_legacy_shapes: false,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            pacing_ms: default_pacing_ms(),
        }
    }
}
