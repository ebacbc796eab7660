//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_backend;

use skillbridge::config::{ApiConfig, Config, QueueConfig, RetryConfig};

/// Config pointing at `base_url` with timings shortened for tests.
pub fn fast_config(base_url: &str) -> Config {
    Config {
        api: ApiConfig {
            base_url: base_url.to_string(),
            request_timeout_ms: 500,
            connect_timeout_ms: 500,
            accept_legacy_shapes: false,
        },
        retry: RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 100,
            multiplier: 1.5,
        },
        queue: QueueConfig {
            debounce_ms: 100,
            pacing_ms: 50,
        },
        ..Config::default()
    }
}
