//! Trending
//!
//! Process-wide, TTL-bounded ranking of recent posts.

pub mod cache;

pub use cache::{TrendingCache, TrendingSettings, TrendingSnapshot, TRENDING_CACHE_KEY};
