//! 依赖解析器抽象接口
//!
//! 工厂在构造实例时通过解析器获取嵌套依赖，解析共享同一个解析栈

use crate::factory::{downcast_instance, Instance};
use crate::injection::Injectable;
use di_common::{DependencyResult, ProviderKey, Qualifier};
use std::sync::Arc;

/// 依赖解析器 trait
///
/// 每次解析都会让对应提供者的引用计数加一，并记录为当前构造中实例的持有边。
pub trait DependencyResolver {
    /// 按提供者键解析实例
    fn resolve_instance(&mut self, key: &ProviderKey) -> DependencyResult<Instance>;

    /// 注入目标对象的所有注入点
    ///
    /// 任一注入点失败时，本次调用中已经完成的引用会被回滚。
    fn inject(&mut self, target: &mut dyn Injectable) -> DependencyResult<()>;

    /// 当前正在构造中的提供者数量
    fn depth(&self) -> usize;
}

/// 解析器扩展方法
pub trait ResolverExt: DependencyResolver {
    /// 解析指定契约类型的实例
    fn resolve<T>(&mut self, qualifier: Option<Qualifier>) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ProviderKey::of::<T>(qualifier);
        let instance = self.resolve_instance(&key)?;
        downcast_instance::<T>(&key, &instance)
    }
}

impl<R: DependencyResolver + ?Sized> ResolverExt for R {}
