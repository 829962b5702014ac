//! 投影：從持有資料中取出請求的子矩形

use panel_core::{EntityKeySet, PanelValue, Period};

/// 取出請求範圍的副本
///
/// 期間兩端皆含；給定實體集合時只保留屬於其笛卡兒積的組合。
/// 返回的是獨立副本，呼叫端無法經由它修改持有資料。
pub fn project<T: Ord + Clone, V: Clone>(
    held: &PanelValue<T, V>,
    entities: Option<&EntityKeySet>,
    period: Option<&Period<T>>,
) -> PanelValue<T, V> {
    held.iter()
        .filter(|(point, _, _)| period.map(|period| period.contains(point)).unwrap_or(true))
        .filter(|(_, entity, _)| entities.map(|set| set.contains(entity)).unwrap_or(true))
        .map(|(point, entity, value)| (point.clone(), entity.clone(), value.clone()))
        .collect()
}
