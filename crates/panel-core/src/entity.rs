//! 實體鍵模型（多層級橫截面鍵）

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// 單一層級上的實體鍵值
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityValue {
    /// 整數鍵（如證券代號）
    Int(i64),
    /// 字串鍵（如產業別）
    Str(String),
}

impl fmt::Display for EntityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityValue::Int(v) => write!(f, "{}", v),
            EntityValue::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for EntityValue {
    fn from(value: i64) -> Self {
        EntityValue::Int(value)
    }
}

impl From<i32> for EntityValue {
    fn from(value: i32) -> Self {
        EntityValue::Int(value as i64)
    }
}

impl From<&str> for EntityValue {
    fn from(value: &str) -> Self {
        EntityValue::Str(value.to_string())
    }
}

impl From<String> for EntityValue {
    fn from(value: String) -> Self {
        EntityValue::Str(value)
    }
}

/// 實體組合：每個層級各取一個值
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(BTreeMap<String, EntityValue>);

impl Entity {
    /// 創建空的實體組合
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// 建構器模式：設置層級值
    pub fn with(mut self, level: impl Into<String>, value: impl Into<EntityValue>) -> Self {
        self.0.insert(level.into(), value.into());
        self
    }

    /// 獲取某層級的值
    pub fn get(&self, level: &str) -> Option<&EntityValue> {
        self.0.get(level)
    }

    /// 遍歷（層級, 值）
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityValue)> {
        self.0.iter().map(|(level, value)| (level.as_str(), value))
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(level, value)| format!("{}={}", level, value))
            .collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// 實體鍵集合：層級名稱 → 該層級的有序不重複值
///
/// 邏輯上代表各層級值的笛卡兒積，每一種組合都視為「持有」或「請求」的實體。
///
/// 反序列化時同樣去除重複值。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Vec<EntityValue>>",
    into = "BTreeMap<String, Vec<EntityValue>>"
)]
pub struct EntityKeySet {
    levels: BTreeMap<String, Vec<EntityValue>>,
}

impl From<BTreeMap<String, Vec<EntityValue>>> for EntityKeySet {
    fn from(levels: BTreeMap<String, Vec<EntityValue>>) -> Self {
        levels
            .into_iter()
            .fold(EntityKeySet::new(), |set, (level, values)| {
                set.with_level(level, values)
            })
    }
}

impl From<EntityKeySet> for BTreeMap<String, Vec<EntityValue>> {
    fn from(set: EntityKeySet) -> Self {
        set.levels
    }
}

impl EntityKeySet {
    /// 創建空的實體鍵集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置層級值（重複值只保留第一次出現）
    pub fn with_level<I, V>(mut self, level: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<EntityValue>,
    {
        let mut distinct: Vec<EntityValue> = Vec::new();
        for value in values {
            let value = value.into();
            if !distinct.contains(&value) {
                distinct.push(value);
            }
        }
        self.levels.insert(level.into(), distinct);
        self
    }

    /// 層級名稱（依字典序）
    pub fn levels(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(String::as_str)
    }

    /// 獲取某層級的值
    pub fn values(&self, level: &str) -> Option<&[EntityValue]> {
        self.levels.get(level).map(Vec::as_slice)
    }

    /// 是否沒有任何層級
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// 檢查兩個集合的層級結構是否一致
    pub fn same_schema(&self, other: &EntityKeySet) -> bool {
        self.levels.len() == other.levels.len()
            && self.levels.keys().all(|level| other.levels.contains_key(level))
    }

    /// 組合數量（各層級數量的乘積）
    pub fn combination_count(&self) -> usize {
        self.levels.values().map(Vec::len).product()
    }

    /// 展開為所有實體組合（笛卡兒積）
    pub fn combinations(&self) -> Vec<Entity> {
        let mut combos = vec![Entity::new()];
        for (level, values) in &self.levels {
            let mut next = Vec::with_capacity(combos.len() * values.len());
            for combo in &combos {
                for value in values {
                    next.push(combo.clone().with(level.clone(), value.clone()));
                }
            }
            combos = next;
        }
        combos
    }

    /// 檢查實體組合是否屬於此集合的笛卡兒積
    pub fn contains(&self, entity: &Entity) -> bool {
        entity.0.len() == self.levels.len()
            && self.levels.iter().all(|(level, values)| {
                entity
                    .get(level)
                    .map(|value| values.contains(value))
                    .unwrap_or(false)
            })
    }

    /// 逐層級檢查是否為另一集合的子集
    ///
    /// 各層級皆為子集時，笛卡兒積必然也是子集。
    pub fn is_levelwise_subset(&self, other: &EntityKeySet) -> bool {
        self.levels.iter().all(|(level, values)| {
            other
                .levels
                .get(level)
                .map(|theirs| values.iter().all(|value| theirs.contains(value)))
                .unwrap_or(false)
        })
    }

    /// 逐層級聯集：保留本集合的順序，新值依序附加在後
    pub fn union(&self, other: &EntityKeySet) -> EntityKeySet {
        let mut levels = self.levels.clone();
        for (level, values) in &other.levels {
            let merged = levels.entry(level.clone()).or_default();
            for value in values {
                if !merged.contains(value) {
                    merged.push(value.clone());
                }
            }
        }
        EntityKeySet { levels }
    }

    /// 從實體組合反推各層級出現過的不重複值
    ///
    /// 層級取自 `schema`；值的順序依 `schema` 中的順序排列。
    pub fn from_combinations<'a, I>(schema: &EntityKeySet, combos: I) -> EntityKeySet
    where
        I: IntoIterator<Item = &'a Entity>,
    {
        let mut seen: BTreeMap<&str, HashSet<&EntityValue>> = BTreeMap::new();
        for combo in combos {
            for (level, value) in combo.iter() {
                seen.entry(level).or_default().insert(value);
            }
        }

        let levels = schema
            .levels
            .iter()
            .map(|(level, values)| {
                let present = seen.get(level.as_str());
                let kept = values
                    .iter()
                    .filter(|value| present.map(|set| set.contains(value)).unwrap_or(false))
                    .cloned()
                    .collect();
                (level.clone(), kept)
            })
            .collect();

        EntityKeySet { levels }
    }
}

impl fmt::Display for EntityKeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .levels
            .iter()
            .map(|(level, values)| {
                let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                format!("{}: [{}]", level, values.join(", "))
            })
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_level_dedups() {
        let set = EntityKeySet::new().with_level("sector", ["A", "B", "A"]);
        assert_eq!(set.values("sector").unwrap().len(), 2);
    }

    #[test]
    fn test_deserialize_dedups() {
        let set: EntityKeySet = serde_json::from_str(r#"{"id":[1,1,2,1],"sector":["A"]}"#).unwrap();

        assert_eq!(set, EntityKeySet::new().with_level("id", [1, 2]).with_level("sector", ["A"]));
        assert_eq!(set.combination_count(), 2);
        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            r#"{"id":[1,2],"sector":["A"]}"#
        );
    }

    #[test]
    fn test_combinations_cartesian() {
        let set = EntityKeySet::new()
            .with_level("sector", ["A", "B"])
            .with_level("id", [1, 2, 3]);

        assert_eq!(set.combination_count(), 6);
        let combos = set.combinations();
        assert_eq!(combos.len(), 6);
        assert!(combos.contains(&Entity::new().with("sector", "B").with("id", 3)));
        assert!(combos.iter().all(|combo| set.contains(combo)));
    }

    #[test]
    fn test_contains_requires_full_schema() {
        let set = EntityKeySet::new()
            .with_level("sector", ["A"])
            .with_level("id", [1]);

        assert!(!set.contains(&Entity::new().with("sector", "A")));
        assert!(set.contains(&Entity::new().with("sector", "A").with("id", 1)));
    }

    #[test]
    fn test_union_keeps_order() {
        let held = EntityKeySet::new().with_level("sector", ["A", "B"]);
        let requested = EntityKeySet::new().with_level("sector", ["C", "B"]);

        let total = held.union(&requested);
        let values: Vec<String> = total
            .values("sector")
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(values, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_from_combinations() {
        let schema = EntityKeySet::new()
            .with_level("sector", ["A", "B"])
            .with_level("id", [1, 2]);
        let combos = vec![
            Entity::new().with("sector", "B").with("id", 1),
            Entity::new().with("sector", "B").with("id", 2),
        ];

        let rebuilt = EntityKeySet::from_combinations(&schema, &combos);
        assert_eq!(rebuilt.values("sector").unwrap(), &[EntityValue::from("B")]);
        assert_eq!(rebuilt.values("id").unwrap().len(), 2);
    }

    #[test]
    fn test_same_schema() {
        let a = EntityKeySet::new().with_level("id", [1]);
        let b = EntityKeySet::new().with_level("id", [2, 3]);
        let c = EntityKeySet::new().with_level("sector", ["A"]);

        assert!(a.same_schema(&b));
        assert!(!a.same_schema(&c));
    }

    #[test]
    fn test_serde_shape() {
        let set = EntityKeySet::new().with_level("id", [1, 2]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"id":[1,2]}"#);
    }
}
