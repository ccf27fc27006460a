//! 模块声明
//!
//! 模块列出其贡献的绑定（提供者键 → 工厂，生命周期），注册时一次性交给注册表

use crate::factory::{FnFactory, InjectedFactory, ProviderFactory};
use crate::injection::Injectable;
use crate::resolver::DependencyResolver;
use di_common::{DependencyResult, Lifetime, ProviderKey, Qualifier};
use std::fmt;
use std::sync::Arc;

/// 单个绑定
#[derive(Clone)]
pub struct Binding {
    /// 提供者键
    pub key: ProviderKey,
    /// 工厂
    pub factory: Arc<dyn ProviderFactory>,
    /// 生命周期
    pub lifetime: Lifetime,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("lifetime", &self.lifetime)
            .field("factory", &self.factory.implementation_name())
            .finish()
    }
}

/// 模块 trait
pub trait Module: Send + Sync {
    /// 模块名称，同名模块共享同一个作用域缓存
    fn name(&self) -> &str;

    /// 模块贡献的绑定
    fn bindings(&self) -> Vec<Binding>;
}

/// 由构建器声明的模块
#[derive(Debug, Clone)]
pub struct DeclaredModule {
    name: String,
    bindings: Vec<Binding>,
}

impl Module for DeclaredModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn bindings(&self) -> Vec<Binding> {
        self.bindings.clone()
    }
}

/// 模块构建器
///
/// ```ignore
/// let module = ModuleBuilder::new("app")
///     .provide::<dyn Service, _>(Lifetime::Singleton, |_| Ok(Arc::new(ServiceImpl) as Arc<dyn Service>))
///     .provide_injected::<dyn Controller, ControllerImpl>(Lifetime::Singleton, |c| Arc::new(c))
///     .build();
/// ```
pub struct ModuleBuilder {
    name: String,
    bindings: Vec<Binding>,
}

impl ModuleBuilder {
    /// 创建新的模块构建器
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: Vec::new(),
        }
    }

    /// 添加无限定符的闭包绑定
    pub fn provide<T, F>(self, lifetime: Lifetime, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&mut dyn DependencyResolver) -> DependencyResult<Arc<T>> + Send + Sync + 'static,
    {
        self.provide_factory(
            ProviderKey::of::<T>(None),
            lifetime,
            Arc::new(FnFactory::<T, F>::new(factory)),
        )
    }

    /// 添加带限定符的闭包绑定
    pub fn provide_qualified<T, F>(self, qualifier: Qualifier, lifetime: Lifetime, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&mut dyn DependencyResolver) -> DependencyResult<Arc<T>> + Send + Sync + 'static,
    {
        self.provide_factory(
            ProviderKey::of::<T>(Some(qualifier)),
            lifetime,
            Arc::new(FnFactory::<T, F>::new(factory)),
        )
    }

    /// 添加注入式绑定：实现类型自身的注入点在构造时被注入
    pub fn provide_injected<T, C>(self, lifetime: Lifetime, convert: fn(C) -> Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        C: Injectable + Default + 'static,
    {
        self.provide_factory(
            ProviderKey::of::<T>(None),
            lifetime,
            Arc::new(InjectedFactory::<T, C>::new(convert)),
        )
    }

    /// 添加自定义工厂绑定
    pub fn provide_factory(
        mut self,
        key: ProviderKey,
        lifetime: Lifetime,
        factory: Arc<dyn ProviderFactory>,
    ) -> Self {
        self.bindings.push(Binding {
            key,
            factory,
            lifetime,
        });
        self
    }

    /// 构建模块
    pub fn build(self) -> DeclaredModule {
        DeclaredModule {
            name: self.name,
            bindings: self.bindings,
        }
    }
}
