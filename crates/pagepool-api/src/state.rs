use crate::rate_limit::RateLimiter;
use pagepool_pool::PoolAdmin;
use pagepool_types::ServiceConfig;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub admin: Arc<PoolAdmin>,
    pub config: Arc<ServiceConfig>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(admin: Arc<PoolAdmin>, config: ServiceConfig) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit_requests, config.rate_limit_window));
        Self {
            admin,
            config: Arc::new(config),
            rate_limiter,
        }
    }
}
