//! # Panel Calculation
//!
//! 增量對帳與合併算法：期間對帳、實體集合對帳、合併、投影

pub mod entities;
pub mod interval;
pub mod merge;
pub mod projection;

// Re-export 主要函數
pub use entities::{reconcile_entities, EntityReconciliation};
pub use interval::{reconcile_period, PeriodReconciliation};
pub use merge::merge;
pub use projection::project;
