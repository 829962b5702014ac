//! 實例登記：相同識別參數共用同一個快取

use panel_core::{normalize, PanelError, ParamSpec, Result};
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::{PanelCache, PanelSource};

/// 共享的快取句柄
pub type SharedCache<S> = Arc<Mutex<PanelCache<S>>>;

type Instance = Arc<dyn Any + Send + Sync>;

/// 快取實例登記表
///
/// 以「資料源類型 + 標準化參數的正規 JSON」為鍵。建立實例時持有登記表的鎖，
/// 同一鍵在競爭下也只會建立一個實例。登記項目存活到行程結束。
#[derive(Default)]
pub struct InstanceRegistry {
    instances: Mutex<HashMap<String, Instance>>,
}

impl InstanceRegistry {
    /// 創建新的登記表
    pub fn new() -> Self {
        Self::default()
    }

    /// 行程全域的登記表
    pub fn global() -> &'static InstanceRegistry {
        static GLOBAL: OnceLock<InstanceRegistry> = OnceLock::new();
        GLOBAL.get_or_init(InstanceRegistry::new)
    }

    /// 由參數推導登記鍵
    ///
    /// `serde_json::Map` 的鍵依字典序排列，同樣的參數必得同樣的鍵。
    pub fn instance_key<S: PanelSource>(params: &S::Params) -> Result<String> {
        let canonical = serde_json::to_value(params)?;
        Ok(format!("{}{}", type_name::<S>(), serde_json::to_string(&canonical)?))
    }

    /// 取得既有實例，不存在時建立
    pub fn get_or_create<S: PanelSource>(&self, spec: &ParamSpec) -> Result<SharedCache<S>> {
        let params: S::Params = normalize(spec)?;
        let key = Self::instance_key::<S>(&params)?;

        let mut instances = self.lock()?;
        if let Some(existing) = instances.get(&key) {
            tracing::debug!("沿用既有實例: {}", key);
            return Arc::clone(existing)
                .downcast::<Mutex<PanelCache<S>>>()
                .map_err(|_| PanelError::RegistryTypeMismatch(key));
        }

        let cache: SharedCache<S> = Arc::new(Mutex::new(PanelCache::new(S::from_params(params)?)));
        tracing::info!("登記新實例: {}", key);
        instances.insert(key, cache.clone());
        Ok(cache)
    }

    /// 檢查某參數是否已有實例
    pub fn contains<S: PanelSource>(&self, spec: &ParamSpec) -> Result<bool> {
        let params: S::Params = normalize(spec)?;
        let key = Self::instance_key::<S>(&params)?;
        Ok(self.lock()?.contains_key(&key))
    }

    /// 已登記的實例數
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// 是否沒有任何實例
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Instance>>> {
        self.instances
            .lock()
            .map_err(|_| PanelError::LockPoisoned("instance registry".to_string()))
    }
}
