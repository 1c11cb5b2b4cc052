//! 生产者实现
//!
//! 提供两类可注册的生产者：
//! - `Callable`: 以解析好的依赖为参数调用的工厂函数
//! - `ClassType`: 实现了 [`Construct`] 的服务类型，按依赖构造新对象

use super::error::{BoxError, ContainerError};
use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// 解析后的服务值
pub type Service = Arc<dyn Any + Send + Sync>;

type ProduceFn = Arc<dyn Fn(Arguments) -> BoxFuture<'static, Result<Service, BoxError>> + Send + Sync>;

/// 按声明顺序排列的已解析依赖
#[derive(Clone)]
pub struct Arguments {
    names: Arc<[String]>,
    values: Vec<Service>,
}

impl Arguments {
    pub(crate) fn new(names: Arc<[String]>, values: Vec<Service>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 依赖名称，与值一一对应
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// 按位置获取并向下转型
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>, ContainerError> {
        let value = self
            .values
            .get(index)
            .ok_or(ContainerError::ArgumentOutOfRange {
                index,
                len: self.values.len(),
            })?;

        value
            .clone()
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeCastFailed {
                name: self.names[index].clone(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// 按依赖名称获取并向下转型
    pub fn by_name<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, ContainerError> {
        let index = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| ContainerError::ArgumentNotDeclared {
                name: name.to_string(),
            })?;
        self.get(index)
    }

    /// 未转型的原始值
    pub fn raw(&self, index: usize) -> Option<&Service> {
        self.values.get(index)
    }

    pub fn into_values(self) -> Vec<Service> {
        self.values
    }
}

impl Default for Arguments {
    fn default() -> Self {
        Self::new(Arc::from(Vec::new()), Vec::new())
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments").field("names", &self.names).finish()
    }
}

/// 工厂函数生产者
#[derive(Clone)]
pub struct Callable {
    func: ProduceFn,
}

impl Callable {
    /// 异步工厂函数，返回值即解析结果
    pub fn new<F, Fut, T>(func: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
        T: Any + Send + Sync,
    {
        Self {
            func: Arc::new(move |args: Arguments| {
                let fut = func(args);
                async move {
                    let value = fut.await?;
                    Ok::<Service, BoxError>(Arc::new(value))
                }
                .boxed()
            }),
        }
    }

    /// 同步工厂函数
    pub fn from_fn<F, T>(func: F) -> Self
    where
        F: Fn(Arguments) -> Result<T, BoxError> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        Self {
            func: Arc::new(move |args: Arguments| {
                let result = func(args).map(|value| Arc::new(value) as Service);
                futures_util::future::ready(result).boxed()
            }),
        }
    }

    pub(crate) fn call(&self, args: Arguments) -> BoxFuture<'static, Result<Service, BoxError>> {
        (self.func)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callable")
    }
}

/// 可由容器构造的服务类型
///
/// `args` 中的依赖顺序与注册时声明的顺序一致。
#[async_trait]
pub trait Construct: Sized + Send + Sync + 'static {
    async fn construct(args: Arguments) -> Result<Self, BoxError>;
}

/// 类型擦除后的 [`Construct`] 实现
#[derive(Clone)]
pub struct ClassType {
    type_name: &'static str,
    construct: ProduceFn,
}

impl ClassType {
    pub fn of<T: Construct>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            construct: Arc::new(|args: Arguments| {
                async move {
                    let value = T::construct(args).await?;
                    Ok::<Service, BoxError>(Arc::new(value))
                }
                .boxed()
            }),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn construct(&self, args: Arguments) -> BoxFuture<'static, Result<Service, BoxError>> {
        (self.construct)(args)
    }
}

impl fmt::Debug for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassType").field(&self.type_name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(pairs: Vec<(&str, Service)>) -> Arguments {
        let names: Arc<[String]> = pairs.iter().map(|(n, _)| n.to_string()).collect();
        let values = pairs.into_iter().map(|(_, v)| v).collect();
        Arguments::new(names, values)
    }

    #[test]
    fn test_arguments_typed_access() {
        let args = args_of(vec![
            ("port", Arc::new(8080u16) as Service),
            ("host", Arc::new("localhost".to_string()) as Service),
        ]);

        assert_eq!(*args.get::<u16>(0).unwrap(), 8080);
        assert_eq!(args.by_name::<String>("host").unwrap().as_str(), "localhost");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_arguments_type_mismatch() {
        let args = args_of(vec![("port", Arc::new(8080u16) as Service)]);

        let err = args.get::<String>(0).unwrap_err();
        assert!(matches!(err, ContainerError::TypeCastFailed { ref name, .. } if name == "port"));

        let err = args.get::<u16>(3).unwrap_err();
        assert!(matches!(err, ContainerError::ArgumentOutOfRange { index: 3, len: 1 }));
    }

    #[test]
    fn test_by_name_requires_declared_dependency() {
        let args = args_of(vec![("port", Arc::new(8080u16) as Service)]);

        let err = args.by_name::<u16>("host").unwrap_err();
        assert!(matches!(err, ContainerError::ArgumentNotDeclared { ref name } if name == "host"));
        assert_eq!(err.to_string(), "Argument 'host' is not a declared dependency");
    }

    #[tokio::test]
    async fn test_callable_wraps_return_value() {
        let callable = Callable::from_fn(|args: Arguments| Ok(args.len() * 10));
        let value = callable.call(Arguments::default()).await.unwrap();
        assert_eq!(*value.downcast::<usize>().unwrap(), 0);
    }

    struct Greeter {
        greeting: String,
    }

    #[async_trait]
    impl Construct for Greeter {
        async fn construct(args: Arguments) -> Result<Self, BoxError> {
            let name = args.get::<String>(0)?;
            Ok(Greeter {
                greeting: format!("hello {}", name),
            })
        }
    }

    #[tokio::test]
    async fn test_class_type_constructs() {
        let class = ClassType::of::<Greeter>();
        assert!(class.type_name().ends_with("Greeter"));

        let args = args_of(vec![("name", Arc::new("wirebox".to_string()) as Service)]);
        let value = class.construct(args).await.unwrap();
        assert_eq!(value.downcast::<Greeter>().unwrap().greeting, "hello wirebox");
    }
}
