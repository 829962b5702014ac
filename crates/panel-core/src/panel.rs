//! 面板資料模型（期間點 × 實體組合 → 記錄）

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::{Entity, Period};

/// 面板資料
///
/// 以（期間點, 實體組合）為鍵的表格。每個位置至多一筆記錄。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelValue<T: Ord, V> {
    rows: BTreeMap<T, BTreeMap<Entity, V>>,
}

impl<T: Ord, V> Default for PanelValue<T, V> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Ord + Clone, V> PanelValue<T, V> {
    /// 創建空的面板
    pub fn new() -> Self {
        Self::default()
    }

    /// 寫入記錄（覆蓋既有值），返回舊值
    pub fn insert(&mut self, point: T, entity: Entity, value: V) -> Option<V> {
        self.rows.entry(point).or_default().insert(entity, value)
    }

    /// 只在該位置尚無記錄時寫入，返回是否寫入
    pub fn insert_if_absent(&mut self, point: T, entity: Entity, value: V) -> bool {
        let row = self.rows.entry(point).or_default();
        if row.contains_key(&entity) {
            return false;
        }
        row.insert(entity, value);
        true
    }

    /// 讀取某位置的記錄
    pub fn get(&self, point: &T, entity: &Entity) -> Option<&V> {
        self.rows.get(point).and_then(|row| row.get(entity))
    }

    /// 檢查某位置是否已有記錄
    pub fn contains(&self, point: &T, entity: &Entity) -> bool {
        self.get(point, entity).is_some()
    }

    /// 記錄總數
    pub fn len(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// 是否沒有任何記錄
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 所有期間點（遞增）
    pub fn points(&self) -> impl Iterator<Item = &T> {
        self.rows
            .iter()
            .filter(|(_, row)| !row.is_empty())
            .map(|(point, _)| point)
    }

    /// 出現過的所有實體組合
    pub fn entities(&self) -> BTreeSet<&Entity> {
        self.rows.values().flat_map(BTreeMap::keys).collect()
    }

    /// 實際資料所涵蓋的期間（首個期間點到最後一個期間點）
    pub fn span(&self) -> Option<Period<T>> {
        let mut points = self.points();
        let first = points.next()?.clone();
        let last = points.last().cloned().unwrap_or_else(|| first.clone());
        Some(Period::new(first, last))
    }

    /// 遍歷所有記錄（期間點遞增，同一期間點內依實體排序）
    pub fn iter(&self) -> impl Iterator<Item = (&T, &Entity, &V)> {
        self.rows
            .iter()
            .flat_map(|(point, row)| row.iter().map(move |(entity, value)| (point, entity, value)))
    }

    /// 依條件保留記錄
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T, &Entity, &V) -> bool,
    {
        for (point, row) in self.rows.iter_mut() {
            row.retain(|entity, value| keep(point, entity, value));
        }
        self.rows.retain(|_, row| !row.is_empty());
    }

    /// 取出所有記錄
    pub fn into_records(self) -> impl Iterator<Item = (T, Entity, V)> {
        self.rows.into_iter().flat_map(|(point, row)| {
            row.into_iter()
                .map(move |(entity, value)| (point.clone(), entity, value))
        })
    }
}

impl<T: Ord + Clone, V> FromIterator<(T, Entity, V)> for PanelValue<T, V> {
    fn from_iter<I: IntoIterator<Item = (T, Entity, V)>>(iter: I) -> Self {
        let mut panel = PanelValue::new();
        for (point, entity, value) in iter {
            panel.insert(point, entity, value);
        }
        panel
    }
}
