//! 面板快取與抓取調度

use panel_calc::{merge, project, reconcile_entities, reconcile_period, EntityReconciliation};
use panel_core::{Appendability, EntityKeySet, FetchMode, PanelError, PanelValue, Period, Result};
use std::fmt;
use uuid::Uuid;

use crate::observer::{CacheObserver, NoopObserver, ReconcileReport};
use crate::PanelSource;

/// 一次資料源呼叫的請求
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest<T> {
    pub mode: FetchMode,
    pub entities: Option<EntityKeySet>,
    pub period: Option<Period<T>>,
}

/// 抓取計劃
///
/// 由持有狀態與本次請求算出；執行全部步驟成功後才寫入快取。
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPlan<T> {
    /// 依序執行的資料源呼叫
    pub steps: Vec<FetchRequest<T>>,
    /// 是否以抓取結果取代持有資料（否則合併）
    pub replace: bool,
    /// 執行後持有的實體
    pub next_entities: Option<EntityKeySet>,
    /// 執行後持有的期間
    pub next_period: Option<Period<T>>,
}

impl<T> FetchPlan<T> {
    /// 不需要抓取
    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }

    /// 各步驟的模式
    pub fn modes(&self) -> Vec<FetchMode> {
        self.steps.iter().map(|step| step.mode).collect()
    }
}

/// 快取狀態摘要（唯讀）
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStateSummary<T> {
    /// 是否持有資料
    pub populated: bool,
    /// 持有的實體
    pub entities: Option<EntityKeySet>,
    /// 持有的期間
    pub period: Option<Period<T>>,
    /// 持有的記錄數
    pub records: usize,
    /// 累計資料源呼叫次數
    pub fetch_count: usize,
}

/// 增量面板快取
///
/// 持有（資料, 實體, 期間）三元組。每次請求只抓取尚未持有的最小範圍，
/// 並把結果合併進持有資料。單一寫入者；跨執行緒共享時請經由
/// [`InstanceRegistry`](crate::InstanceRegistry) 取得的互斥鎖句柄。
pub struct PanelCache<S: PanelSource> {
    id: Uuid,
    source: S,
    appendability: Appendability,
    value: Option<PanelValue<S::Point, S::Value>>,
    entities: Option<EntityKeySet>,
    period: Option<Period<S::Point>>,
    fetch_count: usize,
    observer: Box<dyn CacheObserver<S::Point>>,
}

impl<S: PanelSource> PanelCache<S> {
    /// 創建新的快取（可追加性在此讀取一次，之後不變）
    pub fn new(source: S) -> Self {
        let appendability = source.appendability();
        let cache = Self {
            id: Uuid::new_v4(),
            source,
            appendability,
            value: None,
            entities: None,
            period: None,
            fetch_count: 0,
            observer: Box::new(NoopObserver),
        };
        tracing::info!("建立快取 {}", cache);
        cache
    }

    /// 建構器模式：設置觀測者
    pub fn with_observer(mut self, observer: impl CacheObserver<S::Point> + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// 實例ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 資料源參數
    pub fn params(&self) -> &S::Params {
        self.source.params()
    }

    /// 資料源
    pub fn source(&self) -> &S {
        &self.source
    }

    /// 各軸可追加性
    pub fn appendability(&self) -> Appendability {
        self.appendability
    }

    /// 狀態摘要
    pub fn state(&self) -> CacheStateSummary<S::Point> {
        CacheStateSummary {
            populated: self.value.is_some(),
            entities: self.entities.clone(),
            period: self.period.clone(),
            records: self.value.as_ref().map(PanelValue::len).unwrap_or(0),
            fetch_count: self.fetch_count,
        }
    }

    /// 主入口：確保請求範圍已持有，返回該範圍的副本
    ///
    /// `entities` 為 `None` 表示實體不變，`period` 為 `None` 表示期間不變。
    /// 資料源失敗時快取狀態完全不變，錯誤原樣向上傳遞。
    pub fn fetch(
        &mut self,
        entities: Option<&EntityKeySet>,
        period: Option<&Period<S::Point>>,
    ) -> Result<PanelValue<S::Point, S::Value>> {
        tracing::info!("執行 {}", self);

        let (plan, report) = self.reconcile(entities, period)?;
        self.observer.on_reconcile(&report);

        if plan.is_noop() {
            tracing::debug!("請求範圍已完整持有，不需抓取");
        } else {
            self.execute_plan(plan)?;
        }

        let projected = self
            .value
            .as_ref()
            .map(|value| project(value, entities, period))
            .unwrap_or_default();

        tracing::info!("完成 {}，返回 {} 筆記錄", self, projected.len());
        Ok(projected)
    }

    /// 預覽抓取計劃（不呼叫資料源，不改變狀態）
    pub fn plan(
        &self,
        entities: Option<&EntityKeySet>,
        period: Option<&Period<S::Point>>,
    ) -> Result<FetchPlan<S::Point>> {
        self.reconcile(entities, period).map(|(plan, _)| plan)
    }

    /// 從持有資料投影（不抓取）；尚未持有資料時返回 `None`
    pub fn subset(
        &self,
        entities: Option<&EntityKeySet>,
        period: Option<&Period<S::Point>>,
    ) -> Option<PanelValue<S::Point, S::Value>> {
        self.value
            .as_ref()
            .map(|value| project(value, entities, period))
    }

    /// 清除持有狀態，下一次請求視為首次
    pub fn reset(&mut self) {
        tracing::info!("重置 {}", self);
        self.value = None;
        self.entities = None;
        self.period = None;
        self.observer.on_reset();
    }

    /// 對帳並決定抓取計劃
    fn reconcile(
        &self,
        entities: Option<&EntityKeySet>,
        period: Option<&Period<S::Point>>,
    ) -> Result<(FetchPlan<S::Point>, ReconcileReport<S::Point>)> {
        if self.value.is_none() {
            let plan = FetchPlan {
                steps: vec![FetchRequest {
                    mode: FetchMode::Initial,
                    entities: entities.cloned(),
                    period: period.cloned(),
                }],
                replace: true,
                next_entities: entities.cloned(),
                next_period: period.cloned(),
            };
            let report = ReconcileReport {
                incremental_entities: entities.cloned(),
                decremental: false,
                stale_combinations: 0,
                incremental_period: period.cloned(),
                total_entities: entities.cloned(),
                total_period: period.cloned(),
            };
            return Ok((plan, report));
        }

        let period_rec = reconcile_period(self.period.as_ref(), period);
        let entity_rec = match entities {
            Some(requested) => reconcile_entities(self.entities.as_ref(), requested)?,
            None => EntityReconciliation {
                incremental: None,
                decremental: false,
                stale_combinations: 0,
                total: self.entities.clone().unwrap_or_default(),
            },
        };
        let total_entities = match (entities, &self.entities) {
            (None, None) => None,
            _ => Some(entity_rec.total.clone()),
        };

        let report = ReconcileReport {
            incremental_entities: entity_rec.incremental.clone(),
            decremental: entity_rec.decremental,
            stale_combinations: entity_rec.stale_combinations,
            incremental_period: period_rec.incremental.clone(),
            total_entities: total_entities.clone(),
            total_period: period_rec.total.clone(),
        };
        tracing::debug!(
            "對帳結果: 新增實體 {:?}，需縮減 {}（{} 個組合），新增期間 {:?}，總期間 {:?}",
            report.incremental_entities.as_ref().map(ToString::to_string),
            report.decremental,
            report.stale_combinations,
            report.incremental_period,
            report.total_period,
        );

        let mut steps = Vec::new();
        let mut replace = false;
        let has_new_entities = entity_rec.incremental.is_some();
        let has_new_period = period_rec.incremental.is_some();

        match (self.appendability.entities, self.appendability.period) {
            (true, true) => {
                if let Some(incremental) = entity_rec.incremental {
                    steps.push(FetchRequest {
                        mode: FetchMode::IncrementalEntities,
                        entities: Some(incremental),
                        period: self.period.clone(),
                    });
                }
                // 期間補抓使用已更新的實體集合
                if let Some(incremental) = period_rec.incremental {
                    steps.push(FetchRequest {
                        mode: FetchMode::IncrementalPeriod,
                        entities: total_entities.clone(),
                        period: Some(incremental),
                    });
                }
            }
            (false, true) if !has_new_entities && !entity_rec.decremental => {
                if let Some(incremental) = period_rec.incremental {
                    steps.push(FetchRequest {
                        mode: FetchMode::IncrementalPeriod,
                        entities: self.entities.clone(),
                        period: Some(incremental),
                    });
                }
            }
            _ => {
                if has_new_entities || has_new_period {
                    steps.push(FetchRequest {
                        mode: FetchMode::Total,
                        entities: total_entities.clone(),
                        period: period_rec.total.clone(),
                    });
                    replace = true;
                }
            }
        }

        let plan = FetchPlan {
            steps,
            replace,
            next_entities: total_entities,
            next_period: period_rec.total,
        };
        Ok((plan, report))
    }

    /// 依序呼叫資料源，全部成功才寫入
    fn execute_plan(&mut self, plan: FetchPlan<S::Point>) -> Result<()> {
        let mut fetched_xs = None;
        let mut fetched_ts = None;
        let mut replacement = None;

        for step in &plan.steps {
            tracing::info!(
                "抓取 {}: 實體 {:?}，期間 {:?}",
                step.mode,
                step.entities.as_ref().map(ToString::to_string),
                step.period
            );
            self.observer
                .on_fetch(step.mode, step.entities.as_ref(), step.period.as_ref());

            let data = self
                .source
                .execute(step.mode, step.entities.as_ref(), step.period.as_ref())
                .map_err(|source| {
                    tracing::warn!("抓取 {} 失敗，快取狀態不變", step.mode);
                    PanelError::fetch(step.mode, source)
                })?;
            tracing::debug!("抓取 {} 取得 {} 筆記錄", step.mode, data.len());

            match step.mode {
                FetchMode::Initial | FetchMode::Total => replacement = Some(data),
                FetchMode::IncrementalEntities => fetched_xs = Some(data),
                FetchMode::IncrementalPeriod => fetched_ts = Some(data),
            }
        }

        self.fetch_count += plan.steps.len();
        self.value = if plan.replace {
            replacement
        } else {
            merge(self.value.take(), fetched_xs, fetched_ts)
        };
        self.entities = plan.next_entities;
        self.period = plan.next_period;

        let state = self.state();
        self.observer.on_commit(&state);
        Ok(())
    }
}

impl<S: PanelSource> fmt::Display for PanelCache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = std::any::type_name::<S>()
            .rsplit("::")
            .next()
            .unwrap_or("PanelSource");
        let params = serde_json::to_string(self.source.params()).unwrap_or_default();
        write!(f, "{} {}", name, params)
    }
}

impl<S: PanelSource> fmt::Debug for PanelCache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelCache")
            .field("id", &self.id)
            .field("params", self.source.params())
            .field("appendability", &self.appendability)
            .field("entities", &self.entities)
            .field("period", &self.period)
            .field("records", &self.value.as_ref().map(PanelValue::len))
            .finish()
    }
}
