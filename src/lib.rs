//! # Panel
//!
//! 增量面板資料快取：只抓取尚未持有的實體 × 期間，並合併進持有資料

pub use panel_cache::{
    CacheObserver, CacheStateSummary, FetchPlan, FetchRecord, FetchRequest, InstanceRegistry,
    NoopObserver, PanelCache, PanelSource, RecordingObserver, ReconcileReport, SharedCache,
};
pub use panel_calc::{
    merge, project, reconcile_entities, reconcile_period, EntityReconciliation,
    PeriodReconciliation,
};
pub use panel_core::{
    deep_merge, normalize, Appendability, BoxError, Entity, EntityKeySet, EntityValue, FetchMode,
    PanelError, PanelValue, ParamSpec, Period, Result, SourceParams,
};
