//! 依赖注入容器
//!
//! 按名称注册生产者并递归解析依赖，支持：
//! - 值、工厂函数、单例、实例四种注册方式
//! - 并发请求下同名服务最多构造一次
//! - 循环依赖检测
//! - 别名

mod error;
mod producer;
mod registry;
mod service_container;
mod stats;

use std::fmt;

pub use error::{BoxError, ContainerError, SharedError};
pub use producer::{Arguments, Callable, ClassType, Construct, Service};
pub use service_container::{Resolution, ServiceContainer};
pub use stats::ContainerStats;

/// 注册方式，决定构造与缓存策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationKind {
    /// 直接提供的值
    Value,
    /// 工厂函数，结果缓存
    Callable,
    /// 类型只构造一次
    Singleton,
    /// 每次解析都构造新实例
    Instance,
}

impl RegistrationKind {
    /// 解析结果是否写入缓存
    pub fn caches(self) -> bool {
        !matches!(self, RegistrationKind::Instance)
    }
}

impl fmt::Display for RegistrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegistrationKind::Value => "value",
            RegistrationKind::Callable => "callable",
            RegistrationKind::Singleton => "singleton",
            RegistrationKind::Instance => "instance",
        };
        f.write_str(name)
    }
}
