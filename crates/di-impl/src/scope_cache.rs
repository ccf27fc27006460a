//! 作用域缓存
//!
//! 在作用域生命周期内为每个提供者键保存至多一个实例

use chrono::{DateTime, Utc};
use di_abstractions::Instance;
use di_common::{ProviderKey, ScopeId};
use std::collections::HashMap;
use tracing::debug;

/// 缓存项
#[derive(Debug, Clone)]
pub struct CacheItem {
    /// 缓存的实例
    pub instance: Instance,
    /// 所属提供者
    pub provider: ProviderKey,
    /// 缓存时间
    pub cached_at: DateTime<Utc>,
}

/// 作用域缓存
///
/// 可被多个提供者共享。条目只在所属提供者的 0↔1 转换时插入和移除。
#[derive(Debug)]
pub(crate) struct ScopeCache {
    id: ScopeId,
    name: String,
    items: HashMap<ProviderKey, CacheItem>,
}

impl ScopeCache {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ScopeId::new(),
            name: name.into(),
            items: HashMap::new(),
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find(&self, key: &ProviderKey) -> Option<&CacheItem> {
        self.items.get(key)
    }

    pub fn cache(&mut self, key: &ProviderKey, instance: Instance) {
        debug!("缓存实例: {} -> {}", key, self.name);
        let previous = self.items.insert(
            key.clone(),
            CacheItem {
                instance,
                provider: key.clone(),
                cached_at: Utc::now(),
            },
        );
        debug_assert!(previous.is_none(), "作用域缓存中已存在 {key}");
    }

    pub fn evict(&mut self, key: &ProviderKey) -> Option<CacheItem> {
        debug!("移除缓存实例: {} <- {}", key, self.name);
        self.items.remove(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_abstractions::wrap_instance;
    use std::sync::Arc;

    #[test]
    fn test_cache_and_evict() {
        let mut cache = ScopeCache::new("module");
        let key = ProviderKey::of::<String>(None);
        let instance = wrap_instance(Arc::new(String::from("cached")));

        assert!(cache.find(&key).is_none());
        cache.cache(&key, instance.clone());

        let item = cache.find(&key).unwrap();
        assert!(Arc::ptr_eq(&item.instance, &instance));
        assert_eq!(item.provider, key);
        assert_eq!(cache.len(), 1);

        assert!(cache.evict(&key).is_some());
        assert_eq!(cache.len(), 0);
        assert!(cache.evict(&key).is_none());
    }
}
