//! 資料源介面（外部抓取協作者）

use panel_core::{Appendability, BoxError, EntityKeySet, FetchMode, PanelValue, Period, Result, SourceParams};
use std::fmt::Debug;

/// 面板資料源
///
/// 實際產生資料的領域邏輯。快取只依賴此介面，依模式呼叫 `execute`。
pub trait PanelSource: Send + 'static {
    /// 期間軸上的點（如日期）
    type Point: Ord + Clone + Debug + Send + Sync + 'static;

    /// 單筆記錄
    type Value: Clone + Send + Sync + 'static;

    /// 識別參數；相同參數在實例登記中對應同一個快取
    type Params: SourceParams + Debug + Send + Sync + 'static;

    /// 由標準化後的參數建立資料源
    fn from_params(params: Self::Params) -> Result<Self>
    where
        Self: Sized;

    /// 識別參數
    fn params(&self) -> &Self::Params;

    /// 各軸是否可追加（建構快取時讀取一次）
    fn appendability(&self) -> Appendability;

    /// 抓取資料
    ///
    /// 回傳的資料至少涵蓋請求的實體與期間；多出的部分只會填補空缺。
    fn execute(
        &mut self,
        mode: FetchMode,
        entities: Option<&EntityKeySet>,
        period: Option<&Period<Self::Point>>,
    ) -> std::result::Result<PanelValue<Self::Point, Self::Value>, BoxError>;
}
