//! # Panel Core
//!
//! 面板快取的核心資料模型與類型定義

pub mod config;
pub mod entity;
pub mod panel;
pub mod period;

// Re-export 主要類型
pub use config::{deep_merge, normalize, Appendability, FetchMode, ParamSpec, SourceParams};
pub use entity::{Entity, EntityKeySet, EntityValue};
pub use panel::PanelValue;
pub use period::Period;

/// 資料源回傳的錯誤
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 面板快取錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("無效的參數: {0}")]
    InvalidParameters(String),

    #[error("資料抓取失敗（{mode}）: {source}")]
    Fetch {
        mode: FetchMode,
        #[source]
        source: BoxError,
    },

    #[error("實體層級不一致: 持有 {held:?}，請求 {requested:?}")]
    SchemaMismatch {
        held: Vec<String>,
        requested: Vec<String>,
    },

    #[error("序列化錯誤: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("實例登記類型不符: {0}")]
    RegistryTypeMismatch(String),

    #[error("鎖已中毒: {0}")]
    LockPoisoned(String),
}

impl PanelError {
    /// 包裝資料源錯誤
    pub fn fetch(mode: FetchMode, source: impl Into<BoxError>) -> Self {
        PanelError::Fetch {
            mode,
            source: source.into(),
        }
    }

    /// 由兩個實體鍵集合建立層級不一致錯誤
    pub fn schema_mismatch(held: &EntityKeySet, requested: &EntityKeySet) -> Self {
        PanelError::SchemaMismatch {
            held: held.levels().map(str::to_string).collect(),
            requested: requested.levels().map(str::to_string).collect(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PanelError>;
