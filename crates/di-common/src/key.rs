//! 提供者键定义
//!
//! 契约类型信息、限定符以及由二者组成的提供者键

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 契约类型信息
///
/// 相等性与哈希只取决于 `TypeId`，名称仅用于诊断输出。
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    /// 类型ID
    pub id: TypeId,
    /// 完整类型名称
    pub name: &'static str,
}

impl TypeInfo {
    /// 从类型获取类型信息，支持 `dyn Trait` 等动态大小类型
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &'static str {
        let name = self.name.strip_prefix("dyn ").unwrap_or(self.name);
        name.rsplit("::").next().unwrap_or(name)
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 限定符
///
/// 由限定符标记和限定值组成，例如 `Named("blue")`。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Qualifier {
    token: &'static str,
    value: String,
}

impl Qualifier {
    /// 默认的命名限定符标记
    pub const NAMED: &'static str = "Named";

    /// 创建新的限定符
    pub fn new(token: &'static str, value: impl Into<String>) -> Self {
        Self {
            token,
            value: value.into(),
        }
    }

    /// 创建命名限定符
    pub fn named(value: impl Into<String>) -> Self {
        Self::new(Self::NAMED, value)
    }

    /// 限定符标记
    pub fn token(&self) -> &'static str {
        self.token
    }

    /// 限定值
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}({})", self.token, self.value)
    }
}

/// 提供者键
///
/// 唯一标识一个提供者槽位：契约类型加可选限定符。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderKey {
    contract: TypeInfo,
    qualifier: Option<Qualifier>,
}

impl ProviderKey {
    /// 创建新的提供者键
    pub fn new(contract: TypeInfo, qualifier: Option<Qualifier>) -> Self {
        Self {
            contract,
            qualifier,
        }
    }

    /// 从契约类型创建提供者键
    pub fn of<T: ?Sized + 'static>(qualifier: Option<Qualifier>) -> Self {
        Self::new(TypeInfo::of::<T>(), qualifier)
    }

    /// 契约类型信息
    pub fn contract(&self) -> &TypeInfo {
        &self.contract
    }

    /// 限定符
    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }

    /// 是否为指定契约类型的键
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.contract.id == TypeId::of::<T>()
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}{}", self.contract, qualifier),
            None => write!(f, "{}", self.contract),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    trait Service {}

    #[test]
    fn test_keys_compare_by_contract_and_qualifier() {
        let plain = ProviderKey::of::<dyn Service>(None);
        let blue = ProviderKey::of::<dyn Service>(Some(Qualifier::named("blue")));
        let red = ProviderKey::of::<dyn Service>(Some(Qualifier::named("red")));

        assert_eq!(plain, ProviderKey::of::<dyn Service>(None));
        assert_ne!(plain, blue);
        assert_ne!(blue, red);
        assert_ne!(plain, ProviderKey::of::<String>(None));

        let set: HashSet<_> = [plain.clone(), blue.clone(), plain].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_key_display() {
        let key = ProviderKey::of::<dyn Service>(Some(Qualifier::named("blue")));
        let text = key.to_string();
        assert!(text.starts_with("dyn "));
        assert!(text.ends_with("Service@Named(blue)"));
        assert_eq!(key.contract().short_name(), "Service");
        assert!(key.is::<dyn Service>());
    }
}
