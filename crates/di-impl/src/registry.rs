//! 提供者注册表

use crate::provider::Provider;
use di_common::{DependencyError, DependencyResult, ProviderKey};
use std::collections::HashMap;
use tracing::{info, warn};

/// 注册结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Registration {
    /// 新注册
    Added,
    /// 与已注册提供者等同，保留原提供者
    Unchanged,
    /// 覆盖了没有存活实例的提供者
    Replaced,
}

/// 提供者注册表
///
/// 提供者一旦注册就在依赖图的整个生命周期内存在
#[derive(Debug, Default)]
pub(crate) struct ProviderRegistry {
    providers: HashMap<ProviderKey, Provider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 检查提供者能否注册
    pub fn check(&self, candidate: &Provider, allow_override: bool) -> DependencyResult<Registration> {
        let Some(existing) = self.providers.get(candidate.key()) else {
            return Ok(Registration::Added);
        };

        if existing.is_identical(candidate) {
            return Ok(Registration::Unchanged);
        }

        if allow_override && !existing.is_live() {
            return Ok(Registration::Replaced);
        }

        Err(DependencyError::ProviderConflict {
            key: candidate.key().clone(),
            existing: existing.implementation_name(),
            incoming: candidate.implementation_name(),
        })
    }

    /// 注册提供者
    pub fn register(&mut self, provider: Provider, allow_override: bool) -> DependencyResult<Registration> {
        let registration = self.check(&provider, allow_override)?;
        match registration {
            Registration::Added => {
                info!("注册提供者: {} ({})", provider.key(), provider.implementation_name());
                self.providers.insert(provider.key().clone(), provider);
            }
            Registration::Replaced => {
                warn!("覆盖提供者: {} ({})", provider.key(), provider.implementation_name());
                self.providers.insert(provider.key().clone(), provider);
            }
            Registration::Unchanged => {}
        }
        Ok(registration)
    }

    /// 查找提供者
    pub fn lookup(&self, key: &ProviderKey) -> DependencyResult<&Provider> {
        self.providers
            .get(key)
            .ok_or_else(|| DependencyError::ProviderMissing { key: key.clone() })
    }

    /// 查找提供者（可变）
    pub fn lookup_mut(&mut self, key: &ProviderKey) -> DependencyResult<&mut Provider> {
        self.providers
            .get_mut(key)
            .ok_or_else(|| DependencyError::ProviderMissing { key: key.clone() })
    }

    pub fn providers(&self) -> impl Iterator<Item = &Provider> {
        self.providers.values()
    }

    pub fn providers_mut(&mut self) -> impl Iterator<Item = &mut Provider> {
        self.providers.values_mut()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }
}
