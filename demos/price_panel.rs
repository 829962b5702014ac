//! 價格面板快取示例

use chrono::NaiveDate;
use panel::{
    Appendability, BoxError, EntityKeySet, EntityValue, FetchMode, InstanceRegistry, PanelSource,
    PanelValue, ParamSpec, Period, Result, SourceParams,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 收盤價資料源參數
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CloseParams {
    /// 價格欄位
    field: String,
    /// 價格縮放（小數位數）
    scale: u32,
}

impl SourceParams for CloseParams {
    fn standard(name: Option<&str>) -> Result<Self> {
        Ok(Self {
            field: name.unwrap_or("close").to_string(),
            scale: 2,
        })
    }
}

/// 模擬的收盤價資料源（實務上會呼叫資料庫或行情 API）
struct CloseSource {
    params: CloseParams,
}

impl PanelSource for CloseSource {
    type Point = NaiveDate;
    type Value = Decimal;
    type Params = CloseParams;

    fn from_params(params: CloseParams) -> Result<Self> {
        Ok(Self { params })
    }

    fn params(&self) -> &CloseParams {
        &self.params
    }

    fn appendability(&self) -> Appendability {
        Appendability::both()
    }

    fn execute(
        &mut self,
        mode: FetchMode,
        entities: Option<&EntityKeySet>,
        period: Option<&Period<NaiveDate>>,
    ) -> std::result::Result<PanelValue<NaiveDate, Decimal>, BoxError> {
        let (Some(entities), Some(period)) = (entities, period) else {
            return Ok(PanelValue::new());
        };
        println!("  -> 資料源 {}: {} × {}", mode, entities, period);

        let mut panel = PanelValue::new();
        for day in period.days() {
            for entity in entities.combinations() {
                let ticker = match entity.get("ticker") {
                    Some(EntityValue::Int(ticker)) => *ticker,
                    _ => return Err(format!("無效的代號: {}", entity).into()),
                };
                let offset = chrono::Datelike::ordinal(&day) as i64;
                panel.insert(day, entity, Decimal::new(ticker * 10 + offset, self.params.scale));
            }
        }
        Ok(panel)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!("=== 價格面板快取示例 ===\n");

    let cache = InstanceRegistry::global().get_or_create::<CloseSource>(&ParamSpec::Absent)?;
    let mut cache = cache
        .lock()
        .map_err(|_| anyhow::anyhow!("快取鎖已中毒"))?;

    let date = |month, day| NaiveDate::from_ymd_opt(2025, month, day).ok_or_else(|| anyhow::anyhow!("無效的日期"));

    let tech = EntityKeySet::new()
        .with_level("sector", ["TECH"])
        .with_level("ticker", [2330, 2454]);
    let october = Period::new(date(10, 1)?, date(10, 31)?);

    println!("第一次請求: {} × {}", tech, october);
    let value = cache.fetch(Some(&tech), Some(&october))?;
    println!("  返回 {} 筆記錄\n", value.len());

    let wider = tech.union(&EntityKeySet::new().with_level("sector", ["TECH"]).with_level("ticker", [3711]));
    let two_months = Period::new(date(10, 1)?, date(11, 30)?);

    println!("第二次請求: {} × {}", wider, two_months);
    let value = cache.fetch(Some(&wider), Some(&two_months))?;
    println!("  返回 {} 筆記錄\n", value.len());

    println!("第三次請求（已完整持有）");
    let value = cache.fetch(Some(&tech), Some(&Period::new(date(11, 1)?, date(11, 7)?)))?;
    println!("  返回 {} 筆記錄", value.len());

    let state = cache.state();
    println!(
        "\n快取狀態: {} 筆記錄，累計 {} 次資料源呼叫",
        state.records, state.fetch_count
    );

    Ok(())
}
