//! 服务注册表
//!
//! 单张表，按名称存储带标签的注册项；同名重复注册时后者覆盖前者。

use super::error::ContainerError;
use super::producer::{Callable, ClassType, Service};
use super::RegistrationKind;
use dashmap::DashMap;
use std::sync::Arc;

/// 注册项的生产者
#[derive(Clone, Debug)]
pub(crate) enum Producer {
    Value(Service),
    Callable(Callable),
    Singleton(ClassType),
    Instance(ClassType),
}

/// 服务注册信息
#[derive(Clone, Debug)]
pub(crate) struct Registration {
    pub(crate) dependencies: Arc<[String]>,
    pub(crate) producer: Producer,
}

impl Registration {
    pub(crate) fn value(value: Service) -> Self {
        Self {
            dependencies: Arc::from(Vec::new()),
            producer: Producer::Value(value),
        }
    }

    pub(crate) fn kind(&self) -> RegistrationKind {
        match self.producer {
            Producer::Value(_) => RegistrationKind::Value,
            Producer::Callable(_) => RegistrationKind::Callable,
            Producer::Singleton(_) => RegistrationKind::Singleton,
            Producer::Instance(_) => RegistrationKind::Instance,
        }
    }
}

#[derive(Default)]
pub(crate) struct Registry {
    entries: DashMap<String, Registration>,
}

impl Registry {
    /// 校验并构造注册项，生产者缺失时返回 `InvalidRegistration`
    ///
    /// 名称是不透明的键，与 `register_value` 一样不做任何限制。
    pub(crate) fn build(
        name: &str,
        kind: RegistrationKind,
        dependencies: &[&str],
        producer: Option<Producer>,
    ) -> Result<Registration, ContainerError> {
        let producer = producer.ok_or_else(|| {
            ContainerError::invalid(name, format!("you are trying to register an undefined {}", kind))
        })?;

        Ok(Registration {
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            producer,
        })
    }

    pub(crate) fn insert(&self, name: &str, registration: Registration) -> Option<RegistrationKind> {
        self.entries
            .insert(name.to_string(), registration)
            .map(|previous| previous.kind())
    }

    pub(crate) fn get(&self, name: &str) -> Option<Registration> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callable() -> Option<Producer> {
        Some(Producer::Callable(Callable::from_fn(|_| Ok(1u8))))
    }

    #[test]
    fn test_build_rejects_missing_producer() {
        let err = Registry::build("db", RegistrationKind::Singleton, &[], None).unwrap_err();
        match err {
            ContainerError::InvalidRegistration { name, reason } => {
                assert_eq!(name, "db");
                assert!(reason.contains("undefined singleton"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_build_accepts_any_name() {
        let blank = Registry::build("", RegistrationKind::Callable, &["a", ""], callable()).unwrap();
        assert_eq!(blank.dependencies.to_vec(), vec!["a".to_string(), String::new()]);
    }

    #[test]
    fn test_insert_overwrites_and_reports_previous_kind() {
        let registry = Registry::default();
        let first = Registry::build("svc", RegistrationKind::Callable, &["a"], callable()).unwrap();
        assert_eq!(registry.insert("svc", first), None);

        let second = Registration::value(Arc::new(3u8));
        assert_eq!(registry.insert("svc", second), Some(RegistrationKind::Callable));

        assert_eq!(registry.get("svc").unwrap().kind(), RegistrationKind::Value);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("svc"));
    }
}
