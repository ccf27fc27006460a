//! 注入点抽象
//!
//! 消费者通过 [`Injectable`] 暴露其注入点，引擎只在注入和释放期间临时访问消费者

use crate::factory::{downcast_instance, Instance};
use di_common::{DependencyResult, ProviderKey, Qualifier};
use std::fmt;
use std::sync::Arc;

/// 注入点 trait
///
/// 一个按契约类型和可选限定符声明的字段槽位
pub trait InjectionPoint {
    /// 注入点对应的提供者键
    fn key(&self) -> ProviderKey;

    /// 将实例赋值到槽位
    fn assign(&mut self, instance: &Instance) -> DependencyResult<()>;

    /// 清空槽位并返回原先持有的实例
    fn take(&mut self) -> Option<Instance>;

    /// 槽位是否持有实例
    fn is_injected(&self) -> bool;
}

/// 可注入对象 trait
///
/// 按声明顺序返回所有注入点
pub trait Injectable {
    /// 枚举注入点
    fn injection_points(&mut self) -> Vec<&mut dyn InjectionPoint>;
}

/// 类型化注入槽位
pub struct Inject<T>
where
    T: ?Sized,
{
    qualifier: Option<Qualifier>,
    value: Option<(Arc<T>, Instance)>,
}

impl<T> Inject<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    /// 创建无限定符的注入槽位
    pub fn new() -> Self {
        Self {
            qualifier: None,
            value: None,
        }
    }

    /// 创建带限定符的注入槽位
    pub fn qualified(qualifier: Qualifier) -> Self {
        Self {
            qualifier: Some(qualifier),
            value: None,
        }
    }

    /// 创建命名限定的注入槽位
    pub fn named(name: impl Into<String>) -> Self {
        Self::qualified(Qualifier::named(name))
    }

    /// 获取已注入的实例
    pub fn get(&self) -> Option<&Arc<T>> {
        self.value.as_ref().map(|(value, _)| value)
    }

    /// 获取已注入实例的克隆
    pub fn cloned(&self) -> Option<Arc<T>> {
        self.get().cloned()
    }
}

impl<T> Default for Inject<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Inject<T>
where
    T: ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("contract", &std::any::type_name::<T>())
            .field("qualifier", &self.qualifier)
            .field("injected", &self.value.is_some())
            .finish()
    }
}

impl<T> InjectionPoint for Inject<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn key(&self) -> ProviderKey {
        ProviderKey::of::<T>(self.qualifier.clone())
    }

    fn assign(&mut self, instance: &Instance) -> DependencyResult<()> {
        let value = downcast_instance::<T>(&self.key(), instance)?;
        self.value = Some((value, instance.clone()));
        Ok(())
    }

    fn take(&mut self) -> Option<Instance> {
        self.value.take().map(|(_, instance)| instance)
    }

    fn is_injected(&self) -> bool {
        self.value.is_some()
    }
}
