//! In-memory `BrowserDriver` used by tests and as the default backend until
//! a real CDP client is wired in. Records every action it receives instead
//! of talking to an actual browser.

use crate::driver::{BrowserDriver, BrowserHandle, PageHandle};
use async_trait::async_trait;
use pagepool_types::{ActionRequest, PageAction, PoolConfig, PoolError, PoolResult};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryDriver {
    launches: AtomicU64,
}

#[async_trait]
impl BrowserDriver for MemoryDriver {
    async fn launch(&self, config: &PoolConfig) -> PoolResult<Box<dyn BrowserHandle>> {
        if config.proxy_server.as_deref() == Some("fail") {
            return Err(PoolError::launch_failed("proxy_server 'fail' forces a launch error"));
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryBrowser::default()))
    }
}

#[derive(Debug)]
struct MemoryBrowser {
    alive: AtomicBool,
    next_page: AtomicU64,
}

impl Default for MemoryBrowser {
    fn default() -> Self {
        Self {
            alive: AtomicBool::new(true),
            next_page: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl BrowserHandle for MemoryBrowser {
    async fn new_page(&self) -> PoolResult<Box<dyn PageHandle>> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(PoolError::launch_failed("browser already closed"));
        }
        self.next_page.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryPage::default()))
    }

    async fn close(&self) -> PoolResult<()> {
        self.alive.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct MemoryPage {
    log: Mutex<Vec<PageAction>>,
    content: Mutex<String>,
    closed: AtomicBool,
}

#[async_trait]
impl PageHandle for MemoryPage {
    async fn perform(&self, request: &ActionRequest) -> PoolResult<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PoolError::action_failure(
                "memory-page",
                request.action.as_str(),
                "page already closed",
            ));
        }
        self.log.lock().unwrap().push(request.action);

        let result = match request.action {
            PageAction::Goto => {
                let url = request.required_str("url")?;
                *self.content.lock().unwrap() = format!("<html><body>{url}</body></html>");
                json!({ "url": url })
            }
            PageAction::SetContent => {
                let html = request.required_str("html")?;
                *self.content.lock().unwrap() = html;
                Value::Null
            }
            PageAction::Screenshot => json!({ "image": "" }),
            PageAction::ExtractPageContents => {
                json!({ "html": self.content.lock().unwrap().clone() })
            }
            PageAction::GetPageMetrics => json!({ "timestamp": 0, "documents": 1 }),
            _ => Value::Null,
        };
        Ok(result)
    }

    async fn extract_page_contents(&self) -> PoolResult<String> {
        Ok(self.content.lock().unwrap().clone())
    }

    async fn close(&self) -> PoolResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
