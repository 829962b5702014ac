//! 實體集合對帳

use panel_core::{Entity, EntityKeySet, PanelError, Result};
use rayon::prelude::*;
use std::collections::HashSet;

/// 組合數超過此值時改用並行集合差
const PARALLEL_THRESHOLD: usize = 4096;

/// 實體集合對帳結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityReconciliation {
    /// 需要補抓的實體（由新增組合反推的各層級值）；`None` 表示沒有新增組合
    pub incremental: Option<EntityKeySet>,
    /// 是否存在已持有但本次未請求的組合（只偵測，不移除）
    pub decremental: bool,
    /// 已持有但本次未請求的組合數量
    pub stale_combinations: usize,
    /// 對帳後應持有的實體集合（逐層級聯集）
    pub total: EntityKeySet,
}

/// 比對持有實體與請求實體
///
/// 兩者層級必須一致，否則在展開笛卡兒積之前返回 `SchemaMismatch`。
/// 請求在每個層級都是持有的子集時，直接以層級運算得出結果，不展開組合。
pub fn reconcile_entities(
    held: Option<&EntityKeySet>,
    requested: &EntityKeySet,
) -> Result<EntityReconciliation> {
    let held = match held {
        Some(held) => held,
        None => {
            return Ok(EntityReconciliation {
                incremental: Some(requested.clone()),
                decremental: false,
                stale_combinations: 0,
                total: requested.clone(),
            })
        }
    };

    if !held.same_schema(requested) {
        return Err(PanelError::schema_mismatch(held, requested));
    }

    if requested.is_levelwise_subset(held) {
        let stale = held
            .combination_count()
            .saturating_sub(requested.combination_count());
        return Ok(EntityReconciliation {
            incremental: None,
            decremental: stale > 0,
            stale_combinations: stale,
            total: held.clone(),
        });
    }

    let total = held.union(requested);
    let total_combos = total.combinations();
    let held_combos: HashSet<Entity> = held.combinations().into_iter().collect();
    let requested_combos: HashSet<Entity> = requested.combinations().into_iter().collect();

    let (incremental_combos, stale) = if total_combos.len() > PARALLEL_THRESHOLD {
        let incremental: Vec<&Entity> = total_combos
            .par_iter()
            .filter(|combo| !held_combos.contains(*combo))
            .collect();
        let stale = total_combos
            .par_iter()
            .filter(|combo| !requested_combos.contains(*combo))
            .count();
        (incremental, stale)
    } else {
        let incremental: Vec<&Entity> = total_combos
            .iter()
            .filter(|combo| !held_combos.contains(*combo))
            .collect();
        let stale = total_combos
            .iter()
            .filter(|combo| !requested_combos.contains(*combo))
            .count();
        (incremental, stale)
    };

    tracing::debug!(
        "實體對帳: 總組合 {} 個，新增 {} 個，過期 {} 個",
        total_combos.len(),
        incremental_combos.len(),
        stale
    );

    let incremental = if incremental_combos.is_empty() {
        None
    } else {
        Some(EntityKeySet::from_combinations(
            &total,
            incremental_combos.iter().copied(),
        ))
    };

    Ok(EntityReconciliation {
        incremental,
        decremental: stale > 0,
        stale_combinations: stale,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_core::EntityValue;

    fn sectors(values: &[&str]) -> EntityKeySet {
        EntityKeySet::new().with_level("sector", values.iter().copied())
    }

    fn strings(values: &[EntityValue]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_nothing_held() {
        let requested = sectors(&["A", "B"]);
        let result = reconcile_entities(None, &requested).unwrap();

        assert_eq!(result.incremental, Some(requested.clone()));
        assert!(!result.decremental);
        assert_eq!(result.total, requested);
    }

    #[test]
    fn test_overlapping_sets() {
        let held = sectors(&["A", "B"]);
        let requested = sectors(&["B", "C"]);

        let result = reconcile_entities(Some(&held), &requested).unwrap();

        assert_eq!(strings(result.total.values("sector").unwrap()), vec!["A", "B", "C"]);
        let incremental = result.incremental.unwrap();
        assert_eq!(strings(incremental.values("sector").unwrap()), vec!["C"]);
        assert!(result.decremental);
        assert_eq!(result.stale_combinations, 1);
    }

    #[test]
    fn test_identical_sets() {
        let held = sectors(&["A", "B"]);
        let result = reconcile_entities(Some(&held), &held.clone()).unwrap();

        assert_eq!(result.incremental, None);
        assert!(!result.decremental);
        assert_eq!(result.total, held);
    }

    #[test]
    fn test_subset_request_is_decremental_only() {
        let held = sectors(&["A", "B", "C"]);
        let requested = sectors(&["B"]);

        let result = reconcile_entities(Some(&held), &requested).unwrap();

        assert_eq!(result.incremental, None);
        assert!(result.decremental);
        assert_eq!(result.stale_combinations, 2);
        assert_eq!(result.total, held);
    }

    #[test]
    fn test_deserialized_duplicates_do_not_inflate_counts() {
        let held = EntityKeySet::new().with_level("id", [1, 2]);
        let requested: EntityKeySet = serde_json::from_str(r#"{"id":[1,1,1]}"#).unwrap();

        let result = reconcile_entities(Some(&held), &requested).unwrap();

        assert_eq!(result.incremental, None);
        assert!(result.decremental);
        assert_eq!(result.stale_combinations, 1);
    }

    #[test]
    fn test_multi_level_incremental_combinations() {
        // 持有 {A,B} × {1}，請求 {A} × {1,2}
        // 總計 {A,B} × {1,2}，新增組合為 (A,2) 與 (B,2)
        let held = EntityKeySet::new()
            .with_level("sector", ["A", "B"])
            .with_level("id", [1]);
        let requested = EntityKeySet::new()
            .with_level("sector", ["A"])
            .with_level("id", [1, 2]);

        let result = reconcile_entities(Some(&held), &requested).unwrap();

        assert_eq!(result.total.combination_count(), 4);
        let incremental = result.incremental.unwrap();
        assert_eq!(strings(incremental.values("sector").unwrap()), vec!["A", "B"]);
        assert_eq!(strings(incremental.values("id").unwrap()), vec!["2"]);
        // (B,1) 與 (B,2) 不在請求中
        assert_eq!(result.stale_combinations, 2);
    }

    #[test]
    fn test_schema_mismatch() {
        let held = sectors(&["A"]);
        let requested = EntityKeySet::new().with_level("id", [1]);

        let err = reconcile_entities(Some(&held), &requested).unwrap_err();
        assert!(matches!(err, PanelError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_large_sets_use_same_semantics() {
        let held = EntityKeySet::new()
            .with_level("id", 0..100)
            .with_level("field", 0..50);
        let requested = EntityKeySet::new()
            .with_level("id", 50..150)
            .with_level("field", 0..50);

        let result = reconcile_entities(Some(&held), &requested).unwrap();

        assert_eq!(result.total.combination_count(), 150 * 50);
        let incremental = result.incremental.unwrap();
        assert_eq!(incremental.values("id").unwrap().len(), 50);
        assert_eq!(incremental.values("field").unwrap().len(), 50);
        assert_eq!(result.stale_combinations, 50 * 50);
    }
}
