//! 合併引擎（保留既有值，只填補空缺）

use panel_core::PanelValue;

/// 將新抓取的資料合併進持有資料
///
/// 已持有的位置一律保留原值，只有空缺位置取新值。兩份新資料依序套用：
/// 先時間序列（`new_ts`），再橫截面（`new_xs`）。尚未持有資料時以 `new_ts`
/// 為底，再由 `new_xs` 填補。
pub fn merge<T: Ord + Clone, V>(
    held: Option<PanelValue<T, V>>,
    new_xs: Option<PanelValue<T, V>>,
    new_ts: Option<PanelValue<T, V>>,
) -> Option<PanelValue<T, V>> {
    let (mut merged, passes) = match (held, new_ts) {
        (Some(held), ts) => (held, [ts, new_xs]),
        (None, Some(ts)) => (ts, [new_xs, None]),
        (None, None) => return new_xs,
    };

    for update in passes.into_iter().flatten() {
        let added = fill_gaps(&mut merged, update);
        tracing::debug!("合併新增 {} 筆記錄", added);
    }

    Some(merged)
}

/// 以 `update` 填補 `target` 的空缺，返回新增筆數
fn fill_gaps<T: Ord + Clone, V>(target: &mut PanelValue<T, V>, update: PanelValue<T, V>) -> usize {
    update
        .into_records()
        .map(|(point, entity, value)| target.insert_if_absent(point, entity, value))
        .filter(|added| *added)
        .count()
}
