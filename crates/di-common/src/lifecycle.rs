//! 提供者生命周期

use std::fmt;

/// 作用域缓存标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(uuid::Uuid);

impl ScopeId {
    /// 生成新的作用域标识
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope-{}", self.0)
    }
}

/// 提供者生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// 单例模式 - 在所属模块的作用域缓存内共享实例
    Singleton,
    /// 作用域模式 - 在指定的作用域缓存内共享实例
    Scoped(ScopeId),
    /// 瞬时模式 - 每次解析都创建新实例
    #[default]
    Transient,
}

impl Lifetime {
    /// 是否缓存实例
    pub fn is_cached(&self) -> bool {
        !matches!(self, Self::Transient)
    }
}
