//! 提供者工厂抽象接口
//!
//! 工厂负责按提供者键创建新实例，引擎只通过此接口调用工厂

use crate::injection::Injectable;
use crate::resolver::DependencyResolver;
use di_common::{DependencyError, DependencyResult, ProviderKey};
use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// 类型擦除后的实例
///
/// 内部保存契约类型的 `Arc<T>`，`T` 通常是 `dyn Trait`。
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 将契约类型的实例包装为类型擦除的实例
pub fn wrap_instance<T>(value: Arc<T>) -> Instance
where
    T: ?Sized + Send + Sync + 'static,
{
    Arc::new(value)
}

/// 将类型擦除的实例还原为契约类型
pub fn downcast_instance<T>(key: &ProviderKey, instance: &Instance) -> DependencyResult<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    instance.downcast_ref::<Arc<T>>().cloned().ok_or_else(|| {
        DependencyError::provide(
            key.clone(),
            format!("实例类型与契约不匹配, 期望: {}", std::any::type_name::<T>()),
        )
    })
}

/// 提供者工厂 trait
///
/// 用于创建契约类型的新实例
pub trait ProviderFactory: Send + Sync {
    /// 创建新实例
    ///
    /// 工厂通过 `resolver` 解析的每个依赖都会记录为新实例的持有边。
    fn create(&self, resolver: &mut dyn DependencyResolver) -> DependencyResult<Instance>;

    /// 实现标识，相同标识的重复注册视为同一提供者
    fn implementation(&self) -> TypeId;

    /// 实现名称
    fn implementation_name(&self) -> &'static str;
}

/// 闭包工厂包装器
pub struct FnFactory<T, F>
where
    T: ?Sized,
{
    factory_fn: F,
    contract: PhantomData<fn() -> Arc<T>>,
}

impl<T, F> FnFactory<T, F>
where
    T: ?Sized + Send + Sync + 'static,
    F: Fn(&mut dyn DependencyResolver) -> DependencyResult<Arc<T>> + Send + Sync + 'static,
{
    pub fn new(factory_fn: F) -> Self {
        Self {
            factory_fn,
            contract: PhantomData,
        }
    }
}

impl<T, F> ProviderFactory for FnFactory<T, F>
where
    T: ?Sized + Send + Sync + 'static,
    F: Fn(&mut dyn DependencyResolver) -> DependencyResult<Arc<T>> + Send + Sync + 'static,
{
    fn create(&self, resolver: &mut dyn DependencyResolver) -> DependencyResult<Instance> {
        (self.factory_fn)(resolver).map(wrap_instance)
    }

    fn implementation(&self) -> TypeId {
        TypeId::of::<F>()
    }

    fn implementation_name(&self) -> &'static str {
        std::any::type_name::<F>()
    }
}

/// 注入式工厂
///
/// 使用 `Default` 构造实现类型，将其自身的注入点交给解析器注入，
/// 最后转换为契约类型。实现标识即实现类型本身。
pub struct InjectedFactory<T, C>
where
    T: ?Sized,
{
    convert: fn(C) -> Arc<T>,
}

impl<T, C> InjectedFactory<T, C>
where
    T: ?Sized + Send + Sync + 'static,
    C: Injectable + Default + 'static,
{
    pub fn new(convert: fn(C) -> Arc<T>) -> Self {
        Self { convert }
    }
}

impl<T, C> ProviderFactory for InjectedFactory<T, C>
where
    T: ?Sized + Send + Sync + 'static,
    C: Injectable + Default + 'static,
{
    fn create(&self, resolver: &mut dyn DependencyResolver) -> DependencyResult<Instance> {
        let mut value = C::default();
        resolver.inject(&mut value)?;
        debug!("注入式构造完成: {}", std::any::type_name::<C>());
        Ok(wrap_instance((self.convert)(value)))
    }

    fn implementation(&self) -> TypeId {
        TypeId::of::<C>()
    }

    fn implementation_name(&self) -> &'static str {
        std::any::type_name::<C>()
    }
}
