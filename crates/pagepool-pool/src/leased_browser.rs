//! One live browser process and its TTL-cached pages.

use crate::session::{PageSession, SessionMetrics};
use crate::ttl_cache::TTLCache;
use pagepool_driver::{BrowserDriver, BrowserHandle};
use pagepool_types::{BrowserId, PageId, PoolConfig, PoolResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub struct LeasedBrowser {
    id: BrowserId,
    config: PoolConfig,
    driver: Arc<dyn BrowserDriver>,
    handle: Mutex<Option<Box<dyn BrowserHandle>>>,
    pages: Mutex<TTLCache<PageId, PageSession>>,
    next_page_id: AtomicU64,
    max_pages: usize,
    page_idle_timeout: Duration,
}

impl LeasedBrowser {
    pub fn new(
        id: BrowserId,
        config: PoolConfig,
        driver: Arc<dyn BrowserDriver>,
        max_pages: usize,
        page_cache_ttl: Duration,
        page_idle_timeout: Duration,
    ) -> Self {
        Self {
            id,
            config,
            driver,
            handle: Mutex::new(None),
            pages: Mutex::new(TTLCache::new(max_pages, page_cache_ttl)),
            next_page_id: AtomicU64::new(0),
            max_pages,
            page_idle_timeout,
        }
    }

    pub fn id(&self) -> &BrowserId {
        &self.id
    }

    async fn ensure_launched(&self) -> PoolResult<()> {
        let mut guard = self.handle.lock().await;
        if guard.is_none() {
            let launched = self.driver.launch(&self.config).await?;
            *guard = Some(launched);
        }
        Ok(())
    }

    /// Lazily launches the process on first call. Returns the composite
    /// session id `"<prefix>_<page_id>"`.
    pub async fn start_page_session(&self, prefix: &str) -> PoolResult<String> {
        self.ensure_launched().await?;
        let page_id = self.next_page_id.fetch_add(1, Ordering::SeqCst);

        let page_handle = {
            let guard = self.handle.lock().await;
            guard.as_ref().expect("launched above").new_page().await?
        };

        let session = PageSession::new(page_handle);
        self.pages.lock().await.set(page_id, session);
        Ok(pagepool_types::SessionId::from_prefix(prefix, page_id))
    }

    pub async fn pop_page_session(&self, page_id: PageId) -> Option<PageSession> {
        self.pages.lock().await.pop(&page_id)
    }

    pub async fn put_page_session(&self, page_id: PageId, session: PageSession) {
        self.pages.lock().await.set(page_id, session);
    }

    pub async fn session_metrics(&self, page_id: PageId) -> Option<SessionMetrics> {
        self.pages
            .lock()
            .await
            .get(&page_id)
            .map(|s| s.metrics(self.page_idle_timeout))
    }

    pub async fn close_page_session(&self, page_id: PageId) -> PoolResult<()> {
        let popped = self.pages.lock().await.pop(&page_id);
        if let Some(session) = popped {
            if let Err(e) = session.close().await {
                tracing::warn!(browser_id = %self.id, page_id, error = %e, "error closing page");
            }
        }
        Ok(())
    }

    /// Idempotent.
    pub async fn close(&self) -> PoolResult<()> {
        let mut guard = self.handle.lock().await;
        if let Some(handle) = guard.take() {
            handle.close().await?;
        }
        Ok(())
    }

    pub async fn page_count(&self) -> usize {
        self.pages.lock().await.len()
    }

    pub async fn has_capacity(&self) -> bool {
        self.page_count().await < self.max_pages
    }

    pub async fn is_idle(&self) -> bool {
        let mut pages = self.pages.lock().await;
        let idle = pages.iter_live().all(|(_, session)| session.is_idle(self.page_idle_timeout));
        idle
    }

    /// Evicts expired page sessions from this browser's cache, closing
    /// their driver-side pages. Run periodically by the cache-cleanup task.
    pub async fn expire_pages(&self) {
        let expired = self.pages.lock().await.expire();
        for (page_id, session) in expired {
            tracing::debug!(browser_id = %self.id, page_id, "expiring idle page session");
            if let Err(e) = session.close().await {
                tracing::warn!(browser_id = %self.id, page_id, error = %e, "error closing expired page");
            }
        }
    }

    /// Best-effort OS resource sample: CPU fraction, RSS in MB. No driver
    /// implementation here is backed by a real OS process, so this always
    /// reports zero; a real `BrowserDriver` plugs in its own sampling here.
    pub async fn monitor(&self) -> (f64, u64) {
        (0.0, 0)
    }
}
