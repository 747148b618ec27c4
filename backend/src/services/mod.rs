pub mod comments;
pub mod enricher;
pub mod paginator;
pub mod rate_limiter;
pub mod search_cache;
pub mod search_service;
pub mod selection;
pub mod state_store;
pub mod transcript;
pub mod usage;
pub mod youtube;
