//! 可注入的觀測掛鉤

use panel_core::{EntityKeySet, FetchMode, Period};
use std::sync::{Arc, Mutex};

use crate::CacheStateSummary;

/// 單次請求的對帳結果
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReport<T> {
    /// 新增實體
    pub incremental_entities: Option<EntityKeySet>,
    /// 是否有已持有但未請求的實體組合
    pub decremental: bool,
    /// 已持有但未請求的組合數量
    pub stale_combinations: usize,
    /// 新增期間
    pub incremental_period: Option<Period<T>>,
    /// 對帳後的實體
    pub total_entities: Option<EntityKeySet>,
    /// 對帳後的期間
    pub total_period: Option<Period<T>>,
}

/// 快取觀測者
///
/// 所有方法都有空的預設實現，只需覆寫關心的事件。
pub trait CacheObserver<T>: Send {
    /// 對帳完成（尚未抓取）
    fn on_reconcile(&mut self, _report: &ReconcileReport<T>) {}

    /// 即將呼叫資料源
    fn on_fetch(&mut self, _mode: FetchMode, _entities: Option<&EntityKeySet>, _period: Option<&Period<T>>) {}

    /// 抓取結果已寫入快取
    fn on_commit(&mut self, _state: &CacheStateSummary<T>) {}

    /// 快取已重置
    fn on_reset(&mut self) {}
}

/// 不做任何事的觀測者
#[derive(Debug, Default)]
pub struct NoopObserver;

impl<T> CacheObserver<T> for NoopObserver {}

/// 一次資料源呼叫
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRecord<T> {
    pub mode: FetchMode,
    pub entities: Option<EntityKeySet>,
    pub period: Option<Period<T>>,
}

/// 記錄事件的觀測者（可複製，副本共享同一份紀錄）
#[derive(Debug)]
pub struct RecordingObserver<T> {
    fetches: Arc<Mutex<Vec<FetchRecord<T>>>>,
    reports: Arc<Mutex<Vec<ReconcileReport<T>>>>,
    resets: Arc<Mutex<usize>>,
}

impl<T> Clone for RecordingObserver<T> {
    fn clone(&self) -> Self {
        Self {
            fetches: Arc::clone(&self.fetches),
            reports: Arc::clone(&self.reports),
            resets: Arc::clone(&self.resets),
        }
    }
}

impl<T> Default for RecordingObserver<T> {
    fn default() -> Self {
        Self {
            fetches: Arc::new(Mutex::new(Vec::new())),
            reports: Arc::new(Mutex::new(Vec::new())),
            resets: Arc::new(Mutex::new(0)),
        }
    }
}

impl<T: Clone> RecordingObserver<T> {
    /// 創建新的觀測者
    pub fn new() -> Self {
        Self::default()
    }

    /// 到目前為止的所有資料源呼叫
    pub fn fetches(&self) -> Vec<FetchRecord<T>> {
        self.fetches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// 到目前為止的資料源呼叫模式
    pub fn modes(&self) -> Vec<FetchMode> {
        self.fetches().into_iter().map(|record| record.mode).collect()
    }

    /// 到目前為止的對帳結果
    pub fn reports(&self) -> Vec<ReconcileReport<T>> {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// 重置次數
    pub fn resets(&self) -> usize {
        *self.resets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 清空所有紀錄（含重置次數）
    pub fn clear(&self) {
        self.fetches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
        *self.resets.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = 0;
    }
}

impl<T: Clone + Send> CacheObserver<T> for RecordingObserver<T> {
    fn on_reconcile(&mut self, report: &ReconcileReport<T>) {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(report.clone());
    }

    fn on_fetch(&mut self, mode: FetchMode, entities: Option<&EntityKeySet>, period: Option<&Period<T>>) {
        self.fetches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(FetchRecord {
                mode,
                entities: entities.cloned(),
                period: period.cloned(),
            });
    }

    fn on_reset(&mut self) {
        *self.resets.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) += 1;
    }
}
