//! 提供者释放监听

use di_common::{Lifetime, ProviderKey};
use std::fmt;

/// 提供者描述符
///
/// 监听器与检查接口看到的提供者快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    /// 提供者键
    pub key: ProviderKey,
    /// 声明的生命周期
    pub lifetime: Lifetime,
    /// 当前引用计数
    pub reference_count: usize,
    /// 实现名称
    pub implementation: &'static str,
}

/// 监听器标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// 提供者释放监听器
///
/// 在提供者引用计数从 1 变为 0 时同步调用，先于级联释放其持有边。
/// 回调在依赖图锁内执行，不应再调用依赖图。
pub trait OnFreedListener: Send + Sync {
    /// 提供者实例已被释放
    fn on_freed(&self, provider: &ProviderDescriptor);
}

impl<F> OnFreedListener for F
where
    F: Fn(&ProviderDescriptor) + Send + Sync,
{
    fn on_freed(&self, provider: &ProviderDescriptor) {
        self(provider);
    }
}
