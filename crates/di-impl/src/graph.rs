//! 依赖图
//!
//! 引擎的公共入口。每个依赖图只有一把锁，在整个顶层操作期间持有，
//! 引用计数、缓存与注册表的中间状态不会被其他线程观察到。

use crate::resolution::Resolution;
use crate::scope_cache::CacheItem;
use crate::state::GraphState;
use di_abstractions::{
    downcast_instance, Injectable, Instance, ListenerId, Module, OnFreedListener,
    ProviderDescriptor,
};
use di_common::{DependencyResult, GraphConfig, ProviderKey, Qualifier, ScopeId};
use parking_lot::Mutex;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// 依赖图统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphStats {
    /// 已注册的提供者数量
    pub providers: usize,
    /// 引用计数大于 0 的提供者数量
    pub live_providers: usize,
    /// 所有作用域缓存中的缓存项数量
    pub cached_items: usize,
    /// 作用域缓存数量
    pub scopes: usize,
}

/// 引用计数依赖图
///
/// 克隆得到的句柄共享同一个依赖图。
#[derive(Clone)]
pub struct Graph {
    state: Arc<Mutex<GraphState>>,
}

impl Graph {
    /// 使用默认配置创建依赖图
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// 使用指定配置创建依赖图
    pub fn with_config(config: GraphConfig) -> Self {
        debug!("创建依赖图: {:?}", config);
        Self {
            state: Arc::new(Mutex::new(GraphState::new(config))),
        }
    }

    pub fn config(&self) -> GraphConfig {
        self.state.lock().config.clone()
    }

    /// 注册模块
    ///
    /// 同名模块共享作用域缓存；任一绑定冲突时整个模块都不会被注册。
    pub fn register(&self, module: &dyn Module) -> DependencyResult<ScopeCacheHandle> {
        let scope = self.state.lock().register_module(module)?;
        Ok(ScopeCacheHandle {
            id: scope,
            name: module.name().to_string(),
            state: Arc::clone(&self.state),
        })
    }

    /// 创建可被多个模块的绑定共享的作用域缓存
    pub fn create_scope(&self, name: impl Into<String>) -> ScopeCacheHandle {
        let name = name.into();
        let id = self.state.lock().create_scope(name.clone());
        ScopeCacheHandle {
            id,
            name,
            state: Arc::clone(&self.state),
        }
    }

    /// 注入消费者的全部注入点
    ///
    /// 失败时本次调用中的所有引用都会被回滚，已赋值的槽位被清空。
    pub fn inject(&self, consumer: &mut dyn Injectable) -> DependencyResult<()> {
        let mut state = self.state.lock();
        Resolution::new(&mut state).inject_points(consumer)
    }

    /// 释放消费者的注入点
    ///
    /// 只处理当前持有实例的注入点：对应提供者引用计数减一，槽位被清空。
    ///
    /// 按声明顺序逐个释放，遇到第一个错误即返回：此前的槽位已被清空且计数已减，
    /// 出错的槽位同样已被清空，之后的槽位保持不变，可以再次调用 `release` 释放。
    pub fn release(&self, consumer: &mut dyn Injectable) -> DependencyResult<()> {
        let mut state = self.state.lock();
        for point in consumer.injection_points() {
            let key = point.key();
            if let Some(instance) = point.take() {
                state.release(&key, Some(&instance))?;
            }
        }
        Ok(())
    }

    /// 不经过注入点直接引用一个实例
    pub fn reference<T>(&self, qualifier: Option<Qualifier>) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ProviderKey::of::<T>(qualifier);
        let mut state = self.state.lock();
        let instance = Resolution::new(&mut state).acquire(&key)?;

        match downcast_instance::<T>(&key, &instance) {
            Ok(value) => Ok(value),
            Err(err) => {
                state.release(&key, Some(&instance))?;
                Err(err)
            }
        }
    }

    /// 释放一次 [`Graph::reference`] 获取的引用
    ///
    /// 实例与提供者当前持有的实例不符时仍按调用方的声明释放，并记录警告。
    pub fn dereference<T>(&self, instance: &Arc<T>, qualifier: Option<Qualifier>) -> DependencyResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ProviderKey::of::<T>(qualifier);
        let mut state = self.state.lock();

        let provider = state.registry.lookup(&key)?;
        let matched = if provider.scope().is_some() {
            state
                .live_instance(&key)?
                .filter(|live| is_same_instance(live, instance))
        } else {
            provider
                .detached_instances()
                .find(|candidate| is_same_instance(candidate, instance))
                .cloned()
        };

        if matched.is_none() && provider.is_live() {
            warn!("释放的实例与提供者持有的实例不符: {}", key);
        }
        state.release(&key, matched.as_ref())
    }

    /// 查找提供者，用于检查引用计数与存活实例
    pub fn get_provider<T>(&self, qualifier: Option<Qualifier>) -> DependencyResult<ProviderHandle<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ProviderKey::of::<T>(qualifier);
        self.state.lock().registry.lookup(&key)?;
        Ok(ProviderHandle {
            key,
            state: Arc::clone(&self.state),
            contract: PhantomData,
        })
    }

    /// 注册全图范围的释放监听器
    pub fn register_provider_freed_listener<L>(&self, listener: L) -> ListenerId
    where
        L: OnFreedListener + 'static,
    {
        self.state.lock().add_listener(Arc::new(listener))
    }

    /// 注册单个提供者的释放监听器，先于全图范围的监听器调用
    pub fn add_on_freed_listener<T, L>(&self, qualifier: Option<Qualifier>, listener: L) -> DependencyResult<ListenerId>
    where
        T: ?Sized + Send + Sync + 'static,
        L: OnFreedListener + 'static,
    {
        let key = ProviderKey::of::<T>(qualifier);
        self.state.lock().add_provider_listener(&key, Arc::new(listener))
    }

    /// 注销监听器，返回是否找到
    pub fn unregister_provider_freed_listener(&self, id: ListenerId) -> bool {
        self.state.lock().remove_listener(id)
    }

    /// 清除全部监听器
    pub fn clear_provider_freed_listeners(&self) {
        self.state.lock().clear_listeners();
    }

    pub fn stats(&self) -> GraphStats {
        let state = self.state.lock();
        GraphStats {
            providers: state.registry.len(),
            live_providers: state.registry.providers().filter(|p| p.is_live()).count(),
            cached_items: state.caches.values().map(|cache| cache.len()).sum(),
            scopes: state.caches.len(),
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph").field("stats", &self.stats()).finish()
    }
}

fn is_same_instance<T>(candidate: &Instance, instance: &Arc<T>) -> bool
where
    T: ?Sized + Send + Sync + 'static,
{
    candidate
        .downcast_ref::<Arc<T>>()
        .is_some_and(|value| Arc::ptr_eq(value, instance))
}

/// 提供者检查句柄
pub struct ProviderHandle<T>
where
    T: ?Sized,
{
    key: ProviderKey,
    state: Arc<Mutex<GraphState>>,
    contract: PhantomData<fn() -> Arc<T>>,
}

impl<T> ProviderHandle<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    pub fn key(&self) -> &ProviderKey {
        &self.key
    }

    pub fn reference_count(&self) -> usize {
        self.state
            .lock()
            .registry
            .lookup(&self.key)
            .map_or(0, |provider| provider.reference_count())
    }

    pub fn is_live(&self) -> bool {
        self.reference_count() > 0
    }

    /// 提供者当前状态的快照
    pub fn descriptor(&self) -> DependencyResult<ProviderDescriptor> {
        Ok(self.state.lock().registry.lookup(&self.key)?.descriptor())
    }

    /// 缓存的存活实例；瞬时提供者总是返回 `None`
    pub fn instance(&self) -> Option<Arc<T>> {
        let instance = self.state.lock().live_instance(&self.key).ok().flatten()?;
        downcast_instance::<T>(&self.key, &instance).ok()
    }
}

impl<T: ?Sized> fmt::Debug for ProviderHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle").field("key", &self.key).finish()
    }
}

/// 作用域缓存检查句柄
#[derive(Clone)]
pub struct ScopeCacheHandle {
    id: ScopeId,
    name: String,
    state: Arc<Mutex<GraphState>>,
}

impl ScopeCacheHandle {
    /// 作用域标识，可用于 `Lifetime::Scoped`
    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 查找缓存的实例
    pub fn find<T>(&self, qualifier: Option<Qualifier>) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ProviderKey::of::<T>(qualifier);
        let item = self.item(&key)?;
        downcast_instance::<T>(&key, &item.instance).ok()
    }

    /// 按提供者键查找缓存项
    pub fn item(&self, key: &ProviderKey) -> Option<CacheItem> {
        let state = self.state.lock();
        state.caches.get(&self.id)?.find(key).cloned()
    }

    pub fn contains(&self, key: &ProviderKey) -> bool {
        self.item(key).is_some()
    }

    pub fn len(&self) -> usize {
        let state = self.state.lock();
        state.caches.get(&self.id).map_or(0, |cache| cache.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ScopeCacheHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeCacheHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
