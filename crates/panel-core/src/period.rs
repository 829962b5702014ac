//! 期間模型（閉區間）

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 期間：有序軸上的閉區間 `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period<T> {
    /// 起點（含）
    pub start: T,
    /// 終點（含）
    pub end: T,
}

impl<T: Ord> Period<T> {
    /// 創建新的期間
    pub fn new(start: T, end: T) -> Self {
        Self { start, end }
    }

    /// 檢查時間點是否落在期間內（兩端皆含）
    pub fn contains(&self, point: &T) -> bool {
        *point >= self.start && *point <= self.end
    }

    /// 檢查是否完整涵蓋另一個期間
    pub fn covers(&self, other: &Period<T>) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

impl<T: Ord + Clone> Period<T> {
    /// 兩個期間的外包區間
    pub fn hull(&self, other: &Period<T>) -> Period<T> {
        Period {
            start: self.start.clone().min(other.start.clone()),
            end: self.end.clone().max(other.end.clone()),
        }
    }
}

impl<T> From<(T, T)> for Period<T> {
    fn from((start, end): (T, T)) -> Self {
        Self { start, end }
    }
}

impl<T: fmt::Display> fmt::Display for Period<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

impl Period<NaiveDate> {
    /// 期間內的天數（含兩端）
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// 逐日列舉期間內的日期
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start
            .iter_days()
            .take_while(move |date| *date <= self.end)
    }
}
