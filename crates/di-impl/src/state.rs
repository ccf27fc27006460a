//! 依赖图状态
//!
//! 注册表、作用域缓存与监听器。所有引用计数变化、缓存插入移除和级联释放都在这里完成，
//! 调用方必须持有依赖图锁。

use crate::provider::{HeldEdge, Provider};
use crate::registry::{ProviderRegistry, Registration};
use crate::scope_cache::ScopeCache;
use di_abstractions::{Instance, ListenerId, Module, OnFreedListener};
use di_common::{
    DependencyError, DependencyResult, GraphConfig, Lifetime, ProviderKey, ScopeId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub(crate) struct GraphState {
    pub config: GraphConfig,
    pub registry: ProviderRegistry,
    pub caches: HashMap<ScopeId, ScopeCache>,
    module_scopes: HashMap<String, ScopeId>,
    listeners: Vec<(ListenerId, Arc<dyn OnFreedListener>)>,
    next_listener_id: u64,
}

impl GraphState {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            registry: ProviderRegistry::new(),
            caches: HashMap::new(),
            module_scopes: HashMap::new(),
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    pub fn create_scope(&mut self, name: impl Into<String>) -> ScopeId {
        let cache = ScopeCache::new(name);
        let id = cache.id();
        debug!("创建作用域缓存: {} ({})", cache.name(), id);
        self.caches.insert(id, cache);
        id
    }

    /// 注册模块，返回模块自身的作用域缓存
    ///
    /// 先校验全部绑定再写入，任一绑定冲突时整个模块都不会被注册。
    pub fn register_module(&mut self, module: &dyn Module) -> DependencyResult<ScopeId> {
        let name = module.name().to_string();
        let (module_scope, new_cache) = match self.module_scopes.get(&name) {
            Some(scope) => (*scope, None),
            None => {
                let cache = ScopeCache::new(name.clone());
                (cache.id(), Some(cache))
            }
        };

        let mut providers: Vec<Provider> = Vec::new();
        let mut positions: HashMap<ProviderKey, usize> = HashMap::new();
        for binding in module.bindings() {
            let scope = match binding.lifetime {
                Lifetime::Singleton => Some(module_scope),
                Lifetime::Scoped(scope) => {
                    if !self.caches.contains_key(&scope) {
                        return Err(DependencyError::ScopeNotFound { scope });
                    }
                    Some(scope)
                }
                Lifetime::Transient => None,
            };
            let provider = Provider::new(binding.key, binding.factory, binding.lifetime, scope);

            if let Some(&position) = positions.get(provider.key()) {
                let first = &providers[position];
                if first.is_identical(&provider) {
                    debug!("模块 {} 内重复绑定，保留第一个: {}", name, provider.key());
                    continue;
                }
                return Err(DependencyError::ProviderConflict {
                    key: provider.key().clone(),
                    existing: first.implementation_name(),
                    incoming: provider.implementation_name(),
                });
            }
            self.registry.check(&provider, self.config.allow_override)?;
            positions.insert(provider.key().clone(), providers.len());
            providers.push(provider);
        }

        if let Some(cache) = new_cache {
            debug!("创建模块作用域缓存: {} ({})", name, module_scope);
            self.module_scopes.insert(name.clone(), module_scope);
            self.caches.insert(module_scope, cache);
        }

        let mut added = 0;
        for provider in providers {
            if self.registry.register(provider, self.config.allow_override)? != Registration::Unchanged {
                added += 1;
            }
        }

        info!("注册模块: {}, 新增提供者 {} 个", name, added);
        Ok(module_scope)
    }

    pub fn add_listener(&mut self, listener: Arc<dyn OnFreedListener>) -> ListenerId {
        let id = self.allocate_listener_id();
        self.listeners.push((id, listener));
        id
    }

    pub fn add_provider_listener(
        &mut self,
        key: &ProviderKey,
        listener: Arc<dyn OnFreedListener>,
    ) -> DependencyResult<ListenerId> {
        let provider = self.registry.lookup_mut(key)?;
        let id = ListenerId(self.next_listener_id + 1);
        provider.add_listener(id, listener);
        self.next_listener_id = id.0;
        Ok(id)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        let removed_global = self.listeners.len() != before;

        let removed_local = self
            .registry
            .providers_mut()
            .fold(false, |removed, provider| provider.remove_listener(id) || removed);

        removed_global || removed_local
    }

    /// 清除全部监听器，包括提供者自身的
    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
        for provider in self.registry.providers_mut() {
            provider.clear_listeners();
        }
    }

    fn allocate_listener_id(&mut self) -> ListenerId {
        self.next_listener_id += 1;
        ListenerId(self.next_listener_id)
    }

    /// 缓存提供者当前存活的实例
    ///
    /// 提供者未注册时返回 `ProviderMissing`；瞬时提供者或未存活时返回 `None`。
    pub fn live_instance(&self, key: &ProviderKey) -> DependencyResult<Option<Instance>> {
        let provider = self.registry.lookup(key)?;
        let Some(scope) = provider.scope() else {
            return Ok(None);
        };
        if !provider.is_live() {
            return Ok(None);
        }

        self.caches
            .get(&scope)
            .and_then(|cache| cache.find(key))
            .map(|item| Some(Arc::clone(&item.instance)))
            .ok_or_else(|| DependencyError::provide(key.clone(), "存活提供者的缓存项缺失"))
    }

    fn is_cached(&self, key: &ProviderKey) -> bool {
        self.registry
            .lookup(key)
            .map(|provider| provider.scope().is_some())
            .unwrap_or(false)
    }

    /// 提交新构造的实例：记录持有边、计数加一、缓存提供者写入作用域缓存
    pub fn commit(
        &mut self,
        key: &ProviderKey,
        instance: Instance,
        edges: Vec<HeldEdge>,
    ) -> DependencyResult<()> {
        let provider = self.registry.lookup_mut(key)?;
        provider.attach(Arc::clone(&instance), edges);
        let count = provider.increment_ref();
        let scope = provider.scope();
        self.log_count(key, count);

        if let Some(scope) = scope {
            let cache = self
                .caches
                .get_mut(&scope)
                .ok_or(DependencyError::ScopeNotFound { scope })?;
            cache.cache(key, instance);
        }
        Ok(())
    }

    /// 再次引用已存活的缓存提供者
    ///
    /// 其持有的缓存提供者随之各加一，保证每个依赖的计数等于持有它的存活路径数。
    pub fn retain(&mut self, key: &ProviderKey) -> DependencyResult<()> {
        let provider = self.registry.lookup_mut(key)?;
        let count = provider.increment_ref();
        let edges = provider.held_edge_keys();
        self.log_count(key, count);

        for edge in edges {
            if self.is_cached(&edge) {
                self.retain(&edge)?;
            }
        }
        Ok(())
    }

    /// 释放一次引用
    ///
    /// 计数归零时移除缓存、同步通知监听器，然后按深度优先顺序级联释放持有边。
    /// 瞬时提供者每次释放都是一个实例的归零。
    pub fn release(&mut self, key: &ProviderKey, instance: Option<&Instance>) -> DependencyResult<()> {
        let provider = self.registry.lookup_mut(key)?;
        if !provider.is_live() {
            return Err(DependencyError::ReferenceUnderflow { key: key.clone() });
        }

        let Some(scope) = provider.scope() else {
            let detached = provider
                .detach(instance)
                .ok_or_else(|| DependencyError::ReferenceUnderflow { key: key.clone() })?;
            let count = provider.decrement_ref();
            self.log_count(key, count);
            self.notify_freed(key)?;
            return self.cascade(detached.edges);
        };

        let count = provider.decrement_ref();
        if count > 0 {
            let edges = provider.held_edge_keys();
            self.log_count(key, count);
            for edge in edges {
                if self.is_cached(&edge) {
                    self.release(&edge, None)?;
                }
            }
            return Ok(());
        }

        let edges = provider.take_held_edges();
        self.log_count(key, count);
        if let Some(cache) = self.caches.get_mut(&scope) {
            cache.evict(key);
        }
        self.notify_freed(key)?;
        self.cascade(edges)
    }

    fn cascade(&mut self, edges: Vec<HeldEdge>) -> DependencyResult<()> {
        for edge in edges {
            self.release(&edge.key, Some(&edge.instance))?;
        }
        Ok(())
    }

    fn notify_freed(&self, key: &ProviderKey) -> DependencyResult<()> {
        let provider = self.registry.lookup(key)?;
        let descriptor = provider.descriptor();
        info!("提供者实例已释放: {}", key);

        let listeners = provider
            .listeners()
            .into_iter()
            .chain(self.listeners.iter().map(|(_, listener)| Arc::clone(listener)));
        for listener in listeners {
            listener.on_freed(&descriptor);
        }
        Ok(())
    }

    fn log_count(&self, key: &ProviderKey, count: usize) {
        if self.config.log_reference_changes {
            debug!("引用计数变化: {} -> {}", key, count);
        }
    }
}
