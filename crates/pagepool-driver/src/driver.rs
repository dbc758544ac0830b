//! Trait boundary a real Chrome DevTools Protocol client would implement.
//!
//! `BrowserPool` talks only to these traits, never to a concrete automation
//! crate, so the orchestration core is testable without a real browser and
//! swappable onto a different backend without touching pool logic.

use async_trait::async_trait;
use pagepool_types::{ActionRequest, PoolConfig, PoolResult};
use serde_json::Value;

/// Launches browser processes for a given pool configuration.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn launch(&self, config: &PoolConfig) -> PoolResult<Box<dyn BrowserHandle>>;
}

/// A single running browser instance.
#[async_trait]
pub trait BrowserHandle: Send + Sync {
    async fn new_page(&self) -> PoolResult<Box<dyn PageHandle>>;

    /// Tear the browser process down. Idempotent.
    async fn close(&self) -> PoolResult<()>;

    /// Cheap liveness check used by the pool's health-check tiers.
    fn is_connected(&self) -> bool;
}

/// A single page/tab within a browser.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Execute one `PageAction` and return its JSON result payload.
    async fn perform(&self, request: &ActionRequest) -> PoolResult<Value>;

    /// Snapshot of the page's current contents, used when an action's
    /// `returnPageContents` option is set.
    async fn extract_page_contents(&self) -> PoolResult<String>;

    /// Close this page. Idempotent.
    async fn close(&self) -> PoolResult<()>;
}
