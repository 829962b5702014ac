//! # Panel Cache
//!
//! 增量面板快取：抓取調度、狀態管理與實例登記

pub mod cache;
pub mod observer;
pub mod registry;
pub mod source;

#[cfg(test)]
mod testing;

// Re-export 主要類型
pub use cache::{CacheStateSummary, FetchPlan, FetchRequest, PanelCache};
pub use observer::{CacheObserver, FetchRecord, NoopObserver, RecordingObserver, ReconcileReport};
pub use registry::{InstanceRegistry, SharedCache};
pub use source::PanelSource;
