//! Process-wide registry of pools; resolves composite session ids.

use crate::browser_pool::{BrowserPool, BrowserPoolLimits, PoolDescriptor};
use crate::session::{PageSession, SessionMetrics};
use pagepool_driver::BrowserDriver;
use pagepool_types::{BrowserId, PoolConfig, PoolError, PoolId, PoolResult, ServiceConfig, SessionId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub struct PoolAdmin {
    pools: RwLock<HashMap<PoolId, Arc<BrowserPool>>>,
    deletion_candidates: Mutex<Vec<PoolId>>,
    driver: Arc<dyn BrowserDriver>,
    config: ServiceConfig,
}

impl PoolAdmin {
    pub fn new(driver: Arc<dyn BrowserDriver>, config: ServiceConfig) -> Self {
        Self {
            pools: RwLock::new(HashMap::new()),
            deletion_candidates: Mutex::new(Vec::new()),
            driver,
            config,
        }
    }

    /// `PoolId` = stable hash of the canonicalized config. Collision fails
    /// with `pool_already_exists`.
    pub async fn create_pool(&self, pool_config: PoolConfig) -> PoolResult<PoolId> {
        let pool_id = PoolId::from_canonical_json(&pool_config.canonical_json());
        let mut pools = self.pools.write().await;
        if pools.contains_key(&pool_id) {
            return Err(PoolError::pool_already_exists(pool_id.to_string()));
        }
        if pools.len() >= self.config.max_pools {
            return Err(PoolError::PoolCapacityReached {
                max_browsers: self.config.max_pools,
            });
        }

        let limits = BrowserPoolLimits {
            max_browsers: self.config.browser_pool_max_size,
            max_pages_per_browser: self.config.browser_max_cached_items,
            page_cache_ttl: self.config.cache_ttl,
            page_idle_timeout: self.config.page_idle_timeout,
            scaling: self.config.scaling,
        };
        let pool = Arc::new(BrowserPool::new(pool_id.clone(), pool_config, self.driver.clone(), limits));
        pools.insert(pool_id.clone(), pool);
        tracing::info!(pool_id = %pool_id, "pool created");
        Ok(pool_id)
    }

    pub async fn get_pool(&self, id: &PoolId) -> Option<Arc<BrowserPool>> {
        self.pools.read().await.get(id).cloned()
    }

    pub async fn list_pools(&self) -> Vec<PoolDescriptor> {
        let pools = self.pools.read().await.clone();
        let mut out = Vec::with_capacity(pools.len());
        for pool in pools.values() {
            out.push(pool.descriptor().await);
        }
        out
    }

    /// If `force`, remove immediately; else mark inactive and defer to the reaper.
    pub async fn delete_pool(&self, id: &PoolId, force: bool) -> PoolResult<()> {
        let pool = {
            let pools = self.pools.read().await;
            pools
                .get(id)
                .cloned()
                .ok_or_else(|| PoolError::pool_not_found(id.to_string()))?
        };

        pool.mark_inactive();
        if force {
            self.pools.write().await.remove(id);
            tracing::info!(pool_id = %id, "pool force-deleted");
        } else {
            self.deletion_candidates.lock().await.push(id.clone());
            tracing::info!(pool_id = %id, "pool marked inactive, queued for reaping");
        }
        Ok(())
    }

    async fn find_pool(&self, pool_id: &PoolId) -> PoolResult<Arc<BrowserPool>> {
        self.pools
            .read()
            .await
            .get(pool_id)
            .cloned()
            .ok_or_else(|| PoolError::pool_not_found(pool_id.to_string()))
    }

    async fn find_browser(
        &self,
        session_id: &str,
        parsed: &SessionId,
    ) -> PoolResult<(Arc<BrowserPool>, BrowserId, Arc<crate::leased_browser::LeasedBrowser>)> {
        let pool_id = PoolId::from_raw(&parsed.pool_id);
        let pool = self
            .find_pool(&pool_id)
            .await
            .map_err(|_| PoolError::page_session_not_found(session_id))?;
        let browser_id = BrowserId::from_raw(&parsed.browser_id);
        let browser = pool
            .get_browser(&browser_id)
            .await
            .ok_or_else(|| PoolError::page_session_not_found(session_id))?;
        Ok((pool, browser_id, browser))
    }

    /// Pops the page out of its browser's cache; the caller must
    /// `put_page_session` it back after use.
    pub async fn take_page_session(&self, session_id: &str) -> PoolResult<(BrowserId, PageSession)> {
        let parsed = SessionId::parse(session_id)?;
        let (_, browser_id, browser) = self.find_browser(session_id, &parsed).await?;
        let session = browser
            .pop_page_session(parsed.page_id)
            .await
            .ok_or_else(|| PoolError::page_session_not_found(session_id))?;
        Ok((browser_id, session))
    }

    pub async fn put_page_session(&self, session_id: &str, session: PageSession) -> PoolResult<()> {
        let parsed = SessionId::parse(session_id)?;
        let (_, _, browser) = self.find_browser(session_id, &parsed).await?;
        browser.put_page_session(parsed.page_id, session).await;
        Ok(())
    }

    /// Non-removing lookup used by `GET /sessions/{id}`.
    pub async fn session_metrics(&self, session_id: &str) -> PoolResult<SessionMetrics> {
        let parsed = SessionId::parse(session_id)?;
        let (_, _, browser) = self.find_browser(session_id, &parsed).await?;
        browser
            .session_metrics(parsed.page_id)
            .await
            .ok_or_else(|| PoolError::page_session_not_found(session_id))
    }

    pub async fn close_session(&self, session_id: &str) -> PoolResult<()> {
        let parsed = SessionId::parse(session_id)?;
        let (_, _, browser) = self.find_browser(session_id, &parsed).await?;
        browser.close_page_session(parsed.page_id).await
    }

    /// New session on `pool_id`: resolve the pool, obtain its least-busy
    /// browser (creating one if needed), and open a page on it.
    pub async fn new_session(&self, pool_id_str: &str) -> PoolResult<String> {
        let pool = self.find_pool(&PoolId::from_raw(pool_id_str)).await?;
        let browser = pool.least_busy_browser(true).await?;
        let prefix = format!("{}_{}", pool.pool_id(), browser.id());
        browser.start_page_session(&prefix).await
    }

    /// Periodically called: physically removes inactive, idle pools.
    pub async fn reap_deletion_candidates(&self) {
        let candidates = {
            let mut guard = self.deletion_candidates.lock().await;
            std::mem::take(&mut *guard)
        };
        let mut still_pending = Vec::new();

        for pool_id in candidates {
            let pool = self.pools.read().await.get(&pool_id).cloned();
            match pool {
                None => {}
                Some(pool) => {
                    if pool.is_idle().await {
                        self.pools.write().await.remove(&pool_id);
                        tracing::info!(pool_id = %pool_id, "reaped inactive pool");
                    } else {
                        still_pending.push(pool_id);
                    }
                }
            }
        }

        if !still_pending.is_empty() {
            self.deletion_candidates.lock().await.extend(still_pending);
        }
    }

    /// Periodically called: scale every pool up then down.
    pub async fn manage_scaling(&self) {
        let pools = self.pools.read().await.clone();
        for pool in pools.values() {
            pool.auto_scale_up().await;
            pool.auto_scale_down().await;
        }
    }

    /// Sweeps expired page sessions out of every pool's browsers.
    pub async fn expire_caches(&self) {
        let pools = self.pools.read().await.clone();
        for pool in pools.values() {
            pool.expire_page_caches().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagepool_driver::MemoryDriver;
    use std::time::Duration;

    #[tokio::test]
    async fn expire_caches_evicts_page_sessions_past_their_ttl() {
        let config = ServiceConfig {
            cache_ttl: Duration::from_millis(1),
            ..ServiceConfig::default()
        };
        let admin = PoolAdmin::new(Arc::new(MemoryDriver::default()), config);
        let pool_id = admin.create_pool(PoolConfig::default()).await.unwrap();
        let session_id = admin.new_session(pool_id.as_str()).await.unwrap();

        assert!(admin.session_metrics(&session_id).await.is_ok());

        tokio::time::sleep(Duration::from_millis(20)).await;
        admin.expire_caches().await;

        assert!(matches!(
            admin.session_metrics(&session_id).await,
            Err(PoolError::PageSessionNotFound { .. })
        ));
    }
}
