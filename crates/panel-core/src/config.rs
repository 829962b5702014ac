//! 快取配置與資料源參數標準化

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::{PanelError, Result};

/// 各軸是否可追加
///
/// 可追加表示已持有的資料在該軸上擴展時仍然有效，只需補抓新增部分。
/// 建構時決定，之後不可變。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appendability {
    /// 實體軸（橫截面）
    pub entities: bool,
    /// 期間軸（時間序列）
    pub period: bool,
}

impl Appendability {
    /// 兩軸皆不可追加（每次變動都整體重抓）
    pub fn none() -> Self {
        Self::default()
    }

    /// 兩軸皆可追加
    pub fn both() -> Self {
        Self {
            entities: true,
            period: true,
        }
    }

    /// 只有期間軸可追加
    pub fn period_only() -> Self {
        Self {
            entities: false,
            period: true,
        }
    }

    /// 只有實體軸可追加
    pub fn entities_only() -> Self {
        Self {
            entities: true,
            period: false,
        }
    }
}

/// 抓取模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchMode {
    /// 首次載入整個請求範圍
    Initial,
    /// 新增實體 × 已持有期間
    IncrementalEntities,
    /// 全部實體 × 新增期間
    IncrementalPeriod,
    /// 整體重抓（取代持有資料）
    Total,
}

impl FetchMode {
    /// 模式名稱
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMode::Initial => "INITIAL",
            FetchMode::IncrementalEntities => "INCREMENTAL-XS",
            FetchMode::IncrementalPeriod => "INCREMENTAL-TS",
            FetchMode::Total => "TOTAL",
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 原始參數描述
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ParamSpec {
    /// 未提供：使用預設參數
    #[default]
    Absent,
    /// 具名預設組
    Name(String),
    /// 覆蓋鍵值（套用在預設參數上）
    Map(Map<String, Value>),
    /// 具名預設組 + 覆蓋鍵值
    Pair(String, Map<String, Value>),
}

impl ParamSpec {
    /// 預設組名稱（如果有）
    pub fn name(&self) -> Option<&str> {
        match self {
            ParamSpec::Name(name) | ParamSpec::Pair(name, _) => Some(name),
            ParamSpec::Absent | ParamSpec::Map(_) => None,
        }
    }

    /// 覆蓋鍵值（如果有）
    pub fn overrides(&self) -> Option<&Map<String, Value>> {
        match self {
            ParamSpec::Map(map) | ParamSpec::Pair(_, map) => Some(map),
            ParamSpec::Absent | ParamSpec::Name(_) => None,
        }
    }
}

impl From<&str> for ParamSpec {
    fn from(name: &str) -> Self {
        ParamSpec::Name(name.to_string())
    }
}

impl From<Map<String, Value>> for ParamSpec {
    fn from(map: Map<String, Value>) -> Self {
        ParamSpec::Map(map)
    }
}

impl TryFrom<Value> for ParamSpec {
    type Error = PanelError;

    /// 接受 `null`、字串、物件、或 `[字串, 物件]`；其他形狀一律拒絕
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(ParamSpec::Absent),
            Value::String(name) => Ok(ParamSpec::Name(name)),
            Value::Object(map) => Ok(ParamSpec::Map(map)),
            Value::Array(items) => match <[Value; 2]>::try_from(items) {
                Ok([Value::String(name), Value::Object(map)]) => Ok(ParamSpec::Pair(name, map)),
                Ok(other) => Err(PanelError::InvalidParameters(format!(
                    "參數配對必須是 [名稱, 物件]，收到: {}",
                    Value::Array(other.to_vec())
                ))),
                Err(items) => Err(PanelError::InvalidParameters(format!(
                    "參數配對長度必須為 2，收到 {} 個元素",
                    items.len()
                ))),
            },
            other => Err(PanelError::InvalidParameters(format!(
                "參數必須是 null、字串、物件或配對，收到: {}",
                other
            ))),
        }
    }
}

/// 資料源參數
///
/// 每個資料源以明確的結構體列出可識別的鍵，`standard` 提供具名預設組。
pub trait SourceParams: Serialize + DeserializeOwned + Clone {
    /// 具名預設參數；`None` 為基本預設
    fn standard(name: Option<&str>) -> Result<Self>;

    /// 以深度合併套用覆蓋鍵值，返回新的參數（不修改自身）
    fn with_overrides(&self, overrides: &Map<String, Value>) -> Result<Self> {
        let mut base = serde_json::to_value(self)?;
        deep_merge(&mut base, &Value::Object(overrides.clone()));
        Ok(serde_json::from_value(base)?)
    }
}

/// 標準化參數描述為資料源參數
pub fn normalize<P: SourceParams>(spec: &ParamSpec) -> Result<P> {
    let base = P::standard(spec.name())?;
    match spec.overrides() {
        Some(overrides) => base.with_overrides(overrides),
        None => Ok(base),
    }
}

/// 深度合併：將 `overlay` 疊加到 `base`
///
/// 兩邊都是物件時逐鍵遞迴合併，未提及的巢狀鍵保留；其餘情況以 `overlay` 取代。
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}
