//! The pool / browser / page-session orchestration core.

pub mod admin;
pub mod browser_pool;
pub mod leased_browser;
pub mod session;
pub mod ttl_cache;

pub use admin::PoolAdmin;
pub use browser_pool::{BrowserPool, PoolDescriptor};
pub use leased_browser::LeasedBrowser;
pub use session::{PageSession, SessionMetrics};
pub use ttl_cache::TTLCache;
