//! One page within a browser: dispatches `PageAction`s and tracks idleness.

use pagepool_driver::PageHandle;
use pagepool_types::{ActionRequest, PageAction, PoolError, PoolResult};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

const DEFAULT_WAIT_FOR_TEXT_TIMEOUT: Duration = Duration::from_secs(30);
const WAIT_FOR_TEXT_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct PageSession {
    page: Box<dyn PageHandle>,
    last_used: Instant,
}

/// Idleness snapshot returned by a non-removing lookup (`GET /sessions/{id}`).
#[derive(Debug, Clone, Copy)]
pub struct SessionMetrics {
    pub idle_for: Duration,
    pub is_idle: bool,
}

impl PageSession {
    pub fn new(page: Box<dyn PageHandle>) -> Self {
        Self {
            page,
            last_used: Instant::now(),
        }
    }

    pub fn is_idle(&self, page_idle_timeout: Duration) -> bool {
        self.last_used.elapsed() >= page_idle_timeout
    }

    pub fn metrics(&self, page_idle_timeout: Duration) -> SessionMetrics {
        SessionMetrics {
            idle_for: self.last_used.elapsed(),
            is_idle: self.is_idle(page_idle_timeout),
        }
    }

    /// Runs one action's full contract: validate params, dispatch to the
    /// driver, apply `returnPageContents`, honor `goto`'s `waitForText`
    /// poll, and unconditionally refresh `last_used` on the way out.
    pub async fn perform_action(
        &mut self,
        session_id: &str,
        request: &ActionRequest,
    ) -> PoolResult<Value> {
        request.validate()?;

        let dispatch = self.page.perform(request).await;
        self.last_used = Instant::now();

        let mut value = match dispatch {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(
                    session_id,
                    action = request.action.as_str(),
                    error = %e,
                    "page action failed"
                );
                return Err(PoolError::action_failure(
                    session_id,
                    request.action.as_str(),
                    e.to_string(),
                ));
            }
        };

        if request.action == PageAction::Goto {
            if let Some(needle) = request.optional_str("waitForText") {
                self.wait_for_text(session_id, request, &needle).await?;
            }
        }

        if request.return_page_contents && request.action != PageAction::ExtractPageContents {
            let html = self.page.extract_page_contents().await.map_err(|e| {
                PoolError::action_failure(session_id, request.action.as_str(), e.to_string())
            })?;
            value = json!({ "result": value, "pageContents": html });
        }

        Ok(value)
    }

    async fn wait_for_text(
        &mut self,
        session_id: &str,
        request: &ActionRequest,
        needle: &str,
    ) -> PoolResult<()> {
        let timeout = request
            .optional_u64("waitForTextTimeoutMs")
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_WAIT_FOR_TEXT_TIMEOUT);
        let deadline = Instant::now() + timeout;

        loop {
            let content = self.page.extract_page_contents().await.map_err(|e| {
                PoolError::action_failure(session_id, request.action.as_str(), e.to_string())
            })?;
            if content.contains(needle) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PoolError::Timeout {
                    elapsed_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(WAIT_FOR_TEXT_POLL_INTERVAL).await;
        }
    }

    /// Idempotent.
    pub async fn close(&self) -> PoolResult<()> {
        self.page.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagepool_driver::MemoryDriver;
    use pagepool_driver::{BrowserDriver, BrowserHandle};
    use pagepool_types::PoolConfig;
    use serde_json::Map;

    async fn new_page() -> Box<dyn PageHandle> {
        let driver = MemoryDriver::default();
        let browser: Box<dyn BrowserHandle> = driver.launch(&PoolConfig::default()).await.unwrap();
        browser.new_page().await.unwrap()
    }

    fn request(action: PageAction, params: Value, return_page_contents: bool) -> ActionRequest {
        ActionRequest {
            action,
            return_page_contents,
            params: params.as_object().cloned().unwrap_or_else(Map::new),
        }
    }

    #[tokio::test]
    async fn action_updates_last_used() {
        let mut session = PageSession::new(new_page().await);
        let before = session.last_used;
        tokio::time::sleep(Duration::from_millis(5)).await;
        session
            .perform_action("s1", &request(PageAction::Screenshot, json!({}), false))
            .await
            .unwrap();
        assert!(session.last_used > before);
    }

    #[tokio::test]
    async fn return_page_contents_wraps_result() {
        let mut session = PageSession::new(new_page().await);
        session
            .perform_action(
                "s1",
                &request(PageAction::Goto, json!({"url": "https://x.test"}), false),
            )
            .await
            .unwrap();

        let out = session
            .perform_action("s1", &request(PageAction::Screenshot, json!({}), true))
            .await
            .unwrap();
        assert!(out.get("pageContents").unwrap().as_str().unwrap().contains("x.test"));
    }

    #[tokio::test]
    async fn bad_params_surface_without_touching_driver() {
        let mut session = PageSession::new(new_page().await);
        let err = session
            .perform_action("s1", &request(PageAction::Click, json!({}), false))
            .await
            .unwrap_err();
        assert!(matches!(err, PoolError::BadParams { .. }));
    }
}
