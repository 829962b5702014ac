//! 測試用資料源

use chrono::NaiveDate;
use panel_core::{
    Appendability, BoxError, EntityKeySet, EntityValue, FetchMode, PanelError, PanelValue, Period,
    Result, SourceParams,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::PanelSource;

pub fn ids(values: &[i64]) -> EntityKeySet {
    EntityKeySet::new().with_level("id", values.iter().copied())
}

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, day).unwrap()
}

fn id_of(entity: &panel_core::Entity) -> i64 {
    match entity.get("id") {
        Some(EntityValue::Int(id)) => *id,
        _ => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridParams {
    pub label: String,
    pub appendable: Appendability,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            label: "daily".to_string(),
            appendable: Appendability::both(),
        }
    }
}

impl SourceParams for GridParams {
    fn standard(name: Option<&str>) -> Result<Self> {
        let appendable = match name {
            None | Some("both") => Appendability::both(),
            Some("period") => Appendability::period_only(),
            Some("none") => Appendability::none(),
            Some(other) => {
                return Err(PanelError::InvalidParameters(format!("未知的預設組: {}", other)))
            }
        };
        Ok(Self {
            label: name.unwrap_or("both").to_string(),
            appendable,
        })
    }
}

/// 每個（期間點, id）產生一筆記錄，值編碼了第幾次呼叫
#[derive(Debug)]
pub struct GridSource {
    params: GridParams,
    calls: i64,
}

impl GridSource {
    pub fn new(appendable: Appendability) -> Self {
        Self {
            params: GridParams {
                label: "grid".to_string(),
                appendable,
            },
            calls: 0,
        }
    }

    pub fn record(id: i64, point: i64, call: i64) -> Decimal {
        Decimal::from(id * 1_000_000 + point * 1_000 + call)
    }
}

impl PanelSource for GridSource {
    type Point = i64;
    type Value = Decimal;
    type Params = GridParams;

    fn from_params(params: GridParams) -> Result<Self> {
        Ok(Self { params, calls: 0 })
    }

    fn params(&self) -> &GridParams {
        &self.params
    }

    fn appendability(&self) -> Appendability {
        self.params.appendable
    }

    fn execute(
        &mut self,
        _mode: FetchMode,
        entities: Option<&EntityKeySet>,
        period: Option<&Period<i64>>,
    ) -> std::result::Result<PanelValue<i64, Decimal>, BoxError> {
        self.calls += 1;
        let (Some(entities), Some(period)) = (entities, period) else {
            return Ok(PanelValue::new());
        };

        let mut panel = PanelValue::new();
        for point in period.start..=period.end {
            for entity in entities.combinations() {
                let value = Self::record(id_of(&entity), point, self.calls);
                panel.insert(point, entity, value);
            }
        }
        Ok(panel)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("upstream unavailable")]
pub struct Unavailable;

/// 在第 N 次呼叫時失敗的資料源
#[derive(Debug)]
pub struct FlakySource {
    inner: GridSource,
    fail_on: i64,
}

impl FlakySource {
    pub fn failing_on(call: i64) -> Self {
        Self {
            inner: GridSource::new(Appendability::both()),
            fail_on: call,
        }
    }
}

impl PanelSource for FlakySource {
    type Point = i64;
    type Value = Decimal;
    type Params = GridParams;

    fn from_params(params: GridParams) -> Result<Self> {
        Ok(Self {
            inner: GridSource::from_params(params)?,
            fail_on: 0,
        })
    }

    fn params(&self) -> &GridParams {
        self.inner.params()
    }

    fn appendability(&self) -> Appendability {
        self.inner.appendability()
    }

    fn execute(
        &mut self,
        mode: FetchMode,
        entities: Option<&EntityKeySet>,
        period: Option<&Period<i64>>,
    ) -> std::result::Result<PanelValue<i64, Decimal>, BoxError> {
        let data = self.inner.execute(mode, entities, period)?;
        if self.inner.calls == self.fail_on {
            return Err(Box::new(Unavailable));
        }
        Ok(data)
    }
}

/// 以日期為期間軸，值為當月日數
#[derive(Debug, Default)]
pub struct DailySource {
    params: GridParams,
}

impl PanelSource for DailySource {
    type Point = NaiveDate;
    type Value = Decimal;
    type Params = GridParams;

    fn from_params(params: GridParams) -> Result<Self> {
        Ok(Self { params })
    }

    fn params(&self) -> &GridParams {
        &self.params
    }

    fn appendability(&self) -> Appendability {
        self.params.appendable
    }

    fn execute(
        &mut self,
        _mode: FetchMode,
        entities: Option<&EntityKeySet>,
        period: Option<&Period<NaiveDate>>,
    ) -> std::result::Result<PanelValue<NaiveDate, Decimal>, BoxError> {
        let (Some(entities), Some(period)) = (entities, period) else {
            return Ok(PanelValue::new());
        };

        let mut panel = PanelValue::new();
        for day in period.days() {
            for entity in entities.combinations() {
                panel.insert(day, entity, Decimal::from(chrono::Datelike::day(&day)));
            }
        }
        Ok(panel)
    }
}
