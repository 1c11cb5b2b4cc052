//! 容器错误类型
//!
//! 解析结果通过共享 future 分发给所有等待者，因此错误必须可以克隆。

use std::sync::Arc;
use thiserror::Error;

/// 生产者返回的错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 可在多个等待者之间共享的底层错误
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// 依赖注入容器错误
#[derive(Debug, Clone, Error)]
pub enum ContainerError {
    /// 注册参数无效（生产者缺失、名称为空等）
    #[error("Invalid registration for '{name}': {reason}")]
    InvalidRegistration { name: String, reason: String },

    /// 服务未注册
    #[error("Can't resolve '{name}': not registered")]
    NotRegistered { name: String },

    /// 循环依赖检测
    #[error("Circular dependency at '{name}' (chain: {})", .chain.join(" -> "))]
    CircularDependency { name: String, chain: Vec<String> },

    /// 解析链超出配置的最大深度
    #[error("Resolving '{name}' exceeds the maximum dependency depth of {limit}")]
    DepthLimitExceeded { name: String, limit: usize },

    /// 生产者自身失败
    #[error("Failed to create service '{name}': {source}")]
    CreationFailed {
        name: String,
        #[source]
        source: SharedError,
    },

    /// 类型转换失败
    #[error("Type cast failed for '{name}': expected {expected}")]
    TypeCastFailed { name: String, expected: &'static str },

    /// 生产者按名称读取了一个没有声明为依赖的参数
    #[error("Argument '{name}' is not a declared dependency")]
    ArgumentNotDeclared { name: String },

    /// 参数下标越界
    #[error("Argument index {index} out of range ({len} dependencies)")]
    ArgumentOutOfRange { index: usize, len: usize },
}

impl ContainerError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ContainerError::InvalidRegistration {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn creation_failed(name: &str, source: BoxError) -> Self {
        ContainerError::CreationFailed {
            name: name.to_string(),
            source: Arc::from(source),
        }
    }

    /// 错误所关联的服务名称
    pub fn name(&self) -> Option<&str> {
        match self {
            ContainerError::InvalidRegistration { name, .. }
            | ContainerError::NotRegistered { name }
            | ContainerError::CircularDependency { name, .. }
            | ContainerError::DepthLimitExceeded { name, .. }
            | ContainerError::CreationFailed { name, .. }
            | ContainerError::TypeCastFailed { name, .. }
            | ContainerError::ArgumentNotDeclared { name } => Some(name),
            ContainerError::ArgumentOutOfRange { .. } => None,
        }
    }
}
