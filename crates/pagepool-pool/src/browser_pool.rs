//! Bounded set of `LeasedBrowser`s sharing a launch-config template.

use crate::leased_browser::LeasedBrowser;
use pagepool_driver::BrowserDriver;
use pagepool_types::{BrowserId, PoolConfig, PoolError, PoolId, PoolResult, ScalingThresholds};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Per-pool sizing and lifetime knobs, lifted out of `ServiceConfig` at
/// pool-creation time so `BrowserPool::new` takes one bundle instead of
/// five scalars.
#[derive(Debug, Clone, Copy)]
pub struct BrowserPoolLimits {
    pub max_browsers: usize,
    pub max_pages_per_browser: usize,
    pub page_cache_ttl: Duration,
    pub page_idle_timeout: Duration,
    pub scaling: ScalingThresholds,
}

pub struct BrowserPool {
    pool_id: PoolId,
    config: PoolConfig,
    driver: Arc<dyn BrowserDriver>,
    browsers: RwLock<Vec<Arc<LeasedBrowser>>>,
    limits: BrowserPoolLimits,
    active: AtomicBool,
}

#[derive(Debug, Clone)]
pub struct PoolDescriptor {
    pub pool_id: String,
    pub browser_count: usize,
    pub active: bool,
}

impl BrowserPool {
    pub fn new(pool_id: PoolId, config: PoolConfig, driver: Arc<dyn BrowserDriver>, limits: BrowserPoolLimits) -> Self {
        Self {
            pool_id,
            config,
            driver,
            browsers: RwLock::new(Vec::new()),
            limits,
            active: AtomicBool::new(true),
        }
    }

    pub fn pool_id(&self) -> &PoolId {
        &self.pool_id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// One-way transition; subsequently all admission paths fail with `pool_inactive`.
    pub fn mark_inactive(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// A pool with no browsers, or whose every browser is idle, is a
    /// candidate for reaping once marked inactive.
    pub async fn is_idle(&self) -> bool {
        let browsers = self.browsers.read().await.clone();
        if browsers.is_empty() {
            return true;
        }
        for browser in &browsers {
            if !browser.is_idle().await {
                return false;
            }
        }
        true
    }

    pub async fn descriptor(&self) -> PoolDescriptor {
        PoolDescriptor {
            pool_id: self.pool_id.to_string(),
            browser_count: self.browsers.read().await.len(),
            active: self.is_active(),
        }
    }

    pub async fn create_browser(&self) -> PoolResult<Arc<LeasedBrowser>> {
        if !self.is_active() {
            return Err(PoolError::PoolInactive);
        }
        let mut browsers = self.browsers.write().await;
        if browsers.len() >= self.limits.max_browsers {
            return Err(PoolError::PoolCapacityReached {
                max_browsers: self.limits.max_browsers,
            });
        }
        let browser = Arc::new(LeasedBrowser::new(
            BrowserId::new_random(),
            self.config.clone(),
            self.driver.clone(),
            self.limits.max_pages_per_browser,
            self.limits.page_cache_ttl,
            self.limits.page_idle_timeout,
        ));
        browsers.push(browser.clone());
        tracing::info!(pool_id = %self.pool_id, browser_id = %browser.id(), "browser created");
        Ok(browser)
    }

    pub async fn get_browser(&self, id: &BrowserId) -> Option<Arc<LeasedBrowser>> {
        self.browsers.read().await.iter().find(|b| b.id() == id).cloned()
    }

    /// Refuses if the browser still has pages and `force` is false.
    pub async fn remove_browser(&self, id: &BrowserId, force: bool) -> PoolResult<bool> {
        let mut browsers = self.browsers.write().await;
        let Some(index) = browsers.iter().position(|b| b.id() == id) else {
            return Ok(false);
        };
        if !force && browsers[index].page_count().await > 0 {
            return Ok(false);
        }
        let browser = browsers.remove(index);
        browser.close().await?;
        tracing::info!(pool_id = %self.pool_id, browser_id = %id, "browser removed");
        Ok(true)
    }

    /// `least_busy_browser` selection policy: the browser with the smallest
    /// positive page count among non-idle browsers, ties broken by
    /// insertion order; falls back to scale-up when the pool is empty or
    /// the chosen browser is at capacity.
    pub async fn least_busy_browser(&self, create_if_none: bool) -> PoolResult<Arc<LeasedBrowser>> {
        if !self.is_active() {
            return Err(PoolError::PoolInactive);
        }

        let snapshot = self.browsers.read().await.clone();
        if snapshot.is_empty() {
            return if create_if_none {
                self.create_browser().await
            } else {
                Err(PoolError::NoAvailableBrowser)
            };
        }
        if snapshot.len() == 1 {
            let only = snapshot.into_iter().next().unwrap();
            return self.ensure_capacity_or_scale(only).await;
        }

        let mut best: Option<(usize, Arc<LeasedBrowser>)> = None;
        for browser in &snapshot {
            let count = browser.page_count().await;
            if count == 0 {
                continue;
            }
            if best.as_ref().map(|(c, _)| count < *c).unwrap_or(true) {
                best = Some((count, browser.clone()));
            }
        }
        let chosen = match best {
            Some((_, browser)) => browser,
            None => snapshot[0].clone(),
        };

        self.ensure_capacity_or_scale(chosen).await
    }

    async fn ensure_capacity_or_scale(&self, chosen: Arc<LeasedBrowser>) -> PoolResult<Arc<LeasedBrowser>> {
        if chosen.has_capacity().await {
            Ok(chosen)
        } else {
            self.create_browser().await
        }
    }

    async fn cap_and_load(&self) -> (usize, usize, f64) {
        let browsers = self.browsers.read().await.clone();
        let cap = self.limits.max_pages_per_browser * browsers.len();
        let mut load = 0usize;
        let mut cpu_sum = 0.0;
        for browser in &browsers {
            load += browser.page_count().await;
            let (cpu, _) = browser.monitor().await;
            cpu_sum += cpu;
        }
        let avg_cpu = if browsers.is_empty() {
            0.0
        } else {
            cpu_sum / browsers.len() as f64
        };
        (cap, load, avg_cpu)
    }

    pub async fn auto_scale_up(&self) {
        if !self.is_active() {
            return;
        }
        let browsers_len = self.browsers.read().await.len();
        if browsers_len >= self.limits.max_browsers {
            return;
        }
        let (cap, load, avg_cpu) = self.cap_and_load().await;
        let should_scale_up = load > 0
            && (cap == 0
                || load as f64 >= self.limits.scaling.scale_up_load_fraction * cap as f64
                || avg_cpu >= self.limits.scaling.scale_up_cpu_fraction);

        if should_scale_up {
            match self.create_browser().await {
                Ok(browser) => {
                    tracing::info!(pool_id = %self.pool_id, browser_id = %browser.id(), "auto-scaled up");
                }
                Err(e) => {
                    tracing::warn!(pool_id = %self.pool_id, error = %e, "auto scale-up failed");
                }
            }
        }
    }

    pub async fn auto_scale_down(&self) {
        let (cap, load, avg_cpu) = self.cap_and_load().await;
        if cap == 0 {
            return;
        }
        let should_scale_down = load as f64 <= self.limits.scaling.scale_down_load_fraction * cap as f64
            || avg_cpu <= self.limits.scaling.scale_down_cpu_fraction;
        if !should_scale_down {
            return;
        }

        let browsers = self.browsers.read().await.clone();
        let mut candidates = Vec::new();
        for browser in browsers {
            let empty = browser.page_count().await == 0;
            if empty || browser.is_idle().await {
                candidates.push(browser);
            }
        }

        let removals = candidates.into_iter().map(|browser| async move {
            let id = browser.id().clone();
            match self.remove_browser(&id, true).await {
                Ok(true) => tracing::info!(pool_id = %self.pool_id, browser_id = %id, "auto-scaled down"),
                Ok(false) => {}
                Err(e) => tracing::warn!(pool_id = %self.pool_id, browser_id = %id, error = %e, "auto scale-down failed"),
            }
        });
        futures::future::join_all(removals).await;
    }

    /// Sweeps expired page sessions from every browser's cache.
    pub async fn expire_page_caches(&self) {
        let browsers = self.browsers.read().await.clone();
        for browser in &browsers {
            browser.expire_pages().await;
        }
    }
}
