//! 提供者
//!
//! 将提供者键绑定到工厂，持有引用计数、持有边与释放监听器

use di_abstractions::{Instance, ListenerId, OnFreedListener, ProviderDescriptor, ProviderFactory};
use di_common::{Lifetime, ProviderKey, ScopeId};
use std::fmt;
use std::sync::Arc;

/// 持有边
///
/// 实例构造期间代其获取的依赖，释放该实例时级联释放。
#[derive(Debug, Clone)]
pub(crate) struct HeldEdge {
    pub key: ProviderKey,
    pub instance: Instance,
}

/// 瞬时提供者交出的实例及其持有边
#[derive(Debug)]
pub(crate) struct DetachedInstance {
    pub instance: Instance,
    pub edges: Vec<HeldEdge>,
}

/// 提供者
pub(crate) struct Provider {
    key: ProviderKey,
    factory: Arc<dyn ProviderFactory>,
    lifetime: Lifetime,
    /// 作用域缓存，瞬时提供者为 `None`
    scope: Option<ScopeId>,
    reference_count: usize,
    /// 缓存实例的持有边
    held_edges: Vec<HeldEdge>,
    /// 瞬时实例，每个都是独立的计数域
    detached: Vec<DetachedInstance>,
    listeners: Vec<(ListenerId, Arc<dyn OnFreedListener>)>,
}

impl Provider {
    pub fn new(
        key: ProviderKey,
        factory: Arc<dyn ProviderFactory>,
        lifetime: Lifetime,
        scope: Option<ScopeId>,
    ) -> Self {
        debug_assert_eq!(lifetime.is_cached(), scope.is_some());
        Self {
            key,
            factory,
            lifetime,
            scope,
            reference_count: 0,
            held_edges: Vec::new(),
            detached: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn key(&self) -> &ProviderKey {
        &self.key
    }

    pub fn factory(&self) -> Arc<dyn ProviderFactory> {
        Arc::clone(&self.factory)
    }

    pub fn implementation_name(&self) -> &'static str {
        self.factory.implementation_name()
    }

    pub fn scope(&self) -> Option<ScopeId> {
        self.scope
    }

    pub fn reference_count(&self) -> usize {
        self.reference_count
    }

    pub fn is_live(&self) -> bool {
        self.reference_count > 0
    }

    /// 是否与另一个提供者等同（同一实现、同一生命周期）
    pub fn is_identical(&self, other: &Self) -> bool {
        self.factory.implementation() == other.factory.implementation()
            && self.lifetime == other.lifetime
    }

    pub fn increment_ref(&mut self) -> usize {
        self.reference_count += 1;
        self.reference_count
    }

    pub fn decrement_ref(&mut self) -> usize {
        assert!(
            self.reference_count > 0,
            "提供者 {} 的引用计数已经为 0",
            self.key
        );
        self.reference_count -= 1;
        self.reference_count
    }

    /// 记录新构造实例的持有边
    ///
    /// 缓存提供者只会在 0→1 时调用；瞬时提供者每次构造都会调用。
    pub fn attach(&mut self, instance: Instance, edges: Vec<HeldEdge>) {
        if self.scope.is_some() {
            debug_assert!(self.held_edges.is_empty(), "缓存实例的持有边只记录一次");
            self.held_edges = edges;
        } else {
            self.detached.push(DetachedInstance { instance, edges });
        }
    }

    /// 缓存实例持有边指向的提供者
    pub fn held_edge_keys(&self) -> Vec<ProviderKey> {
        self.held_edges.iter().map(|edge| edge.key.clone()).collect()
    }

    pub fn take_held_edges(&mut self) -> Vec<HeldEdge> {
        std::mem::take(&mut self.held_edges)
    }

    /// 取出一个瞬时实例；未指定或找不到时取最近交出的一个
    pub fn detach(&mut self, instance: Option<&Instance>) -> Option<DetachedInstance> {
        let index = instance
            .and_then(|wanted| {
                self.detached
                    .iter()
                    .position(|detached| Arc::ptr_eq(&detached.instance, wanted))
            })
            .or_else(|| self.detached.len().checked_sub(1))?;
        Some(self.detached.remove(index))
    }

    pub fn detached_instances(&self) -> impl Iterator<Item = &Instance> {
        self.detached.iter().map(|detached| &detached.instance)
    }

    pub fn add_listener(&mut self, id: ListenerId, listener: Arc<dyn OnFreedListener>) {
        self.listeners.push((id, listener));
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn listeners(&self) -> Vec<Arc<dyn OnFreedListener>> {
        self.listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    pub fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            key: self.key.clone(),
            lifetime: self.lifetime,
            reference_count: self.reference_count,
            implementation: self.implementation_name(),
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("key", &self.key)
            .field("lifetime", &self.lifetime)
            .field("scope", &self.scope)
            .field("reference_count", &self.reference_count)
            .field("held_edges", &self.held_edge_keys())
            .field("detached", &self.detached.len())
            .field("implementation", &self.implementation_name())
            .finish()
    }
}
