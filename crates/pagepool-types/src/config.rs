//! Pool launch configuration and process-wide service configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Target platform string baked into the launch args.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

/// Browser family used to pick a randomized user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserFamily {
    Chrome,
    Safari,
    Firefox,
    Edge,
}

/// The pool launch-configuration template (`PoolAdminCreateReq` in the HTTP
/// surface). Unknown fields are rejected so a client typo surfaces as a
/// `bad_params` error rather than being silently ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    #[serde(default)]
    pub headless: bool,
    #[serde(default)]
    pub incognito: bool,
    #[serde(default)]
    pub gpu: bool,
    #[serde(default)]
    pub privacy: bool,
    #[serde(default)]
    pub ignore_http_errors: bool,
    #[serde(default)]
    pub spa_mode: bool,
    #[serde(default)]
    pub proxy_server: Option<String>,
    #[serde(default)]
    pub platform: Option<Platform>,
    #[serde(default)]
    pub browser: Option<BrowserFamily>,
}

impl PoolConfig {
    /// Canonical JSON used as the PoolId hash input: serde_json's map
    /// serialization is key-order-stable for a fixed struct, so two configs
    /// that deserialize equal always canonicalize to the same bytes.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(self).expect("PoolConfig serializes infallibly")
    }
}

/// Autoscaling thresholds. Kept as named constants rather than inlined
/// magic numbers, per the design notes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingThresholds {
    pub scale_up_load_fraction: f64,
    pub scale_up_cpu_fraction: f64,
    pub scale_down_load_fraction: f64,
    pub scale_down_cpu_fraction: f64,
}

impl Default for ScalingThresholds {
    fn default() -> Self {
        Self {
            scale_up_load_fraction: 0.6,
            scale_up_cpu_fraction: 0.7,
            scale_down_load_fraction: 0.3,
            scale_down_cpu_fraction: 0.3,
        }
    }
}

/// Process-wide configuration, overridable via environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub default_timeout: Duration,
    pub max_pools: usize,
    pub browser_pool_max_size: usize,
    pub browser_max_cached_items: usize,
    pub page_idle_timeout: Duration,
    pub cache_ttl: Duration,
    pub rate_limit_requests: u32,
    pub rate_limit_window: Duration,
    pub limit_concurrency: usize,
    pub idle_pool_deletion_interval: Duration,
    pub pools_scaling_check_interval: Duration,
    pub cache_cleanup_interval: Duration,
    pub scaling: ScalingThresholds,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9123,
            default_timeout: Duration::from_secs(60),
            max_pools: 10,
            browser_pool_max_size: 1,
            browser_max_cached_items: 100,
            page_idle_timeout: Duration::from_secs(180),
            cache_ttl: Duration::from_secs(300),
            rate_limit_requests: 100,
            rate_limit_window: Duration::from_secs(60),
            limit_concurrency: 100,
            idle_pool_deletion_interval: Duration::from_secs(30),
            pools_scaling_check_interval: Duration::from_secs(60),
            cache_cleanup_interval: Duration::from_secs(60),
            scaling: ScalingThresholds::default(),
        }
    }
}

impl ServiceConfig {
    /// Overlay environment variables on top of the defaults. Unset or
    /// unparsable variables are silently skipped, matching the
    /// `ApiConfig::from_env` merge pattern.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("PAGEPOOL_HOST") {
            config.host = val;
        }
        if let Some(val) = parse_env("PAGEPOOL_PORT") {
            config.port = val;
        }
        if let Some(val) = parse_env::<u64>("PAGEPOOL_DEFAULT_TIMEOUT_SECS") {
            config.default_timeout = Duration::from_secs(val);
        }
        if let Some(val) = parse_env("PAGEPOOL_MAX_POOLS") {
            config.max_pools = val;
        }
        if let Some(val) = parse_env("PAGEPOOL_BROWSER_POOL_MAX_SIZE") {
            config.browser_pool_max_size = val;
        }
        if let Some(val) = parse_env("PAGEPOOL_BROWSER_MAX_CACHED_ITEMS") {
            config.browser_max_cached_items = val;
        }
        if let Some(val) = parse_env::<u64>("PAGEPOOL_PAGE_IDLE_TIMEOUT_SECS") {
            config.page_idle_timeout = Duration::from_secs(val);
        }
        if let Some(val) = parse_env::<u64>("PAGEPOOL_CACHE_TTL_SECS") {
            config.cache_ttl = Duration::from_secs(val);
        }
        if let Some(val) = parse_env("PAGEPOOL_RATE_LIMIT_REQUESTS") {
            config.rate_limit_requests = val;
        }
        if let Some(val) = parse_env::<u64>("PAGEPOOL_RATE_LIMIT_WINDOW_SECS") {
            config.rate_limit_window = Duration::from_secs(val);
        }
        if let Some(val) = parse_env("PAGEPOOL_LIMIT_CONCURRENCY") {
            config.limit_concurrency = val;
        }
        if let Some(val) = parse_env::<u64>("PAGEPOOL_IDLE_POOL_DELETION_INTERVAL_SECS") {
            config.idle_pool_deletion_interval = Duration::from_secs(val);
        }
        if let Some(val) = parse_env::<u64>("PAGEPOOL_POOLS_SCALING_CHECK_INTERVAL_SECS") {
            config.pools_scaling_check_interval = Duration::from_secs(val);
        }
        if let Some(val) = parse_env::<u64>("PAGEPOOL_CACHE_CLEANUP_INTERVAL_SECS") {
            config.cache_cleanup_interval = Duration::from_secs(val);
        }

        config
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = r#"{"headless": true, "nonsense_field": 1}"#;
        let result: Result<PoolConfig, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn equal_configs_canonicalize_identically() {
        let a = PoolConfig {
            headless: true,
            browser: Some(BrowserFamily::Firefox),
            ..Default::default()
        };
        let b = PoolConfig {
            headless: true,
            browser: Some(BrowserFamily::Firefox),
            ..Default::default()
        };
        assert_eq!(a.canonical_json(), b.canonical_json());
    }
}
