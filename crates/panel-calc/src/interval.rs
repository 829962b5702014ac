//! 期間對帳

use panel_core::Period;

/// 期間對帳結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodReconciliation<T> {
    /// 需要補抓的期間；`None` 表示已完整涵蓋
    pub incremental: Option<Period<T>>,
    /// 對帳後應持有的期間
    pub total: Option<Period<T>>,
}

/// 比對持有期間與請求期間，算出最小補抓期間與合併後期間
///
/// 只處理區間向一端或兩端擴張的情況。持有期間假設永遠連續，
/// 不會偵測或補齊內部缺口。
///
/// 兩端同時擴張時，補抓期間是整個外包區間（含已持有部分）。
pub fn reconcile_period<T: Ord + Clone>(
    held: Option<&Period<T>>,
    requested: Option<&Period<T>>,
) -> PeriodReconciliation<T> {
    let requested = match requested {
        Some(requested) => requested,
        None => {
            return PeriodReconciliation {
                incremental: None,
                total: held.cloned(),
            }
        }
    };

    let held = match held {
        Some(held) => held,
        None => {
            return PeriodReconciliation {
                incremental: Some(requested.clone()),
                total: Some(requested.clone()),
            }
        }
    };

    let total = held.hull(requested);

    let incremental = if total.start < held.start {
        if total.end > held.end {
            Some(total.clone())
        } else {
            Some(Period::new(total.start.clone(), held.start.clone()))
        }
    } else if total.end > held.end {
        Some(Period::new(held.end.clone(), total.end.clone()))
    } else {
        None
    };

    PeriodReconciliation {
        incremental,
        total: Some(total),
    }
}
