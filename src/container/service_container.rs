//! 服务容器
//!
//! 解析分两个阶段：
//! 1. 同步下降：查缓存、查注册表、检测循环依赖、构建 future，并在返回前把
//!    可缓存的 future 写入缓存；
//! 2. 异步执行：构造 future 立即交给当前 tokio 运行时驱动，调用方只是等待者之一。
//!
//! 缓存写入发生在任何挂起点之前，因此紧接着发出的第二个解析请求一定命中缓存，
//! 复用同一个进行中的构造。构造一旦开始就会运行到成功或失败：调用方丢弃 future、
//! 或兄弟依赖的 join 提前失败，都不会中断它。

use super::error::{BoxError, ContainerError};
use super::producer::{Arguments, Callable, ClassType, Service};
use super::registry::{Producer, Registration, Registry};
use super::stats::{ContainerStats, InnerStats};
use super::RegistrationKind;
use crate::config::ContainerConfig;
use dashmap::DashMap;
use futures_util::future::{self, BoxFuture, FutureExt, Shared, TryFutureExt};
use parking_lot::ReentrantMutex;
use std::any::Any;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

/// 解析结果（可能仍在进行中）
pub type Resolution = BoxFuture<'static, Result<Service, ContainerError>>;

type SharedResolution = Shared<Resolution>;

/// 依赖注入容器
///
/// 克隆开销很小，所有克隆共享同一份注册表和缓存。
#[derive(Clone)]
pub struct ServiceContainer {
    /// 服务注册表
    registry: Arc<Registry>,
    /// 解析缓存：名称 -> 共享的解析结果
    resolved: Arc<DashMap<String, SharedResolution>>,
    /// 保证同步下降阶段的查缓存与写缓存不被其他线程打断
    descent: Arc<ReentrantMutex<()>>,
    config: Arc<ContainerConfig>,
    stats: Arc<InnerStats>,
}

impl ServiceContainer {
    /// 创建新的容器实例
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            resolved: Arc::new(DashMap::new()),
            descent: Arc::new(ReentrantMutex::new(())),
            config: Arc::new(config),
            stats: Arc::new(InnerStats::default()),
        }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// 注册值，直接写入解析缓存
    pub fn register_value<T: Any + Send + Sync>(&self, name: &str, value: T) {
        let service: Service = Arc::new(value);
        let _guard = self.descent.lock();

        self.registry.insert(name, Registration::value(service.clone()));
        self.resolved
            .insert(name.to_string(), future::ready(Ok(service)).boxed().shared());

        debug!(name, "Value registered");
    }

    /// 注册工厂函数，结果只计算一次
    pub fn register_callable(
        &self,
        name: &str,
        dependencies: &[&str],
        func: impl Into<Option<Callable>>,
    ) -> Result<(), ContainerError> {
        let producer = func.into().map(Producer::Callable);
        self.register(name, RegistrationKind::Callable, dependencies, producer)
    }

    /// 注册单例，类型只构造一次
    pub fn register_singleton(
        &self,
        name: &str,
        dependencies: &[&str],
        class: impl Into<Option<ClassType>>,
    ) -> Result<(), ContainerError> {
        let producer = class.into().map(Producer::Singleton);
        self.register(name, RegistrationKind::Singleton, dependencies, producer)
    }

    /// 注册实例，每次解析都构造新对象
    pub fn register_instance(
        &self,
        name: &str,
        dependencies: &[&str],
        class: impl Into<Option<ClassType>>,
    ) -> Result<(), ContainerError> {
        let producer = class.into().map(Producer::Instance);
        self.register(name, RegistrationKind::Instance, dependencies, producer)
    }

    fn register(
        &self,
        name: &str,
        kind: RegistrationKind,
        dependencies: &[&str],
        producer: Option<Producer>,
    ) -> Result<(), ContainerError> {
        let registration = match Registry::build(name, kind, dependencies, producer) {
            Ok(registration) => registration,
            Err(err) => {
                warn!(name, %kind, error = %err, "Registration rejected");
                return Err(err);
            }
        };

        match self.registry.insert(name, registration) {
            Some(previous) => debug!(name, %previous, %kind, "Registration overwritten"),
            None => debug!(name, %kind, ?dependencies, "Service registered"),
        }
        Ok(())
    }

    /// 别名：把 `old_name` 的注册项与已缓存的结果复制到 `new_name`
    ///
    /// 之后对 `old_name` 的修改不会反映到 `new_name`。
    pub fn same(&self, new_name: &str, old_name: &str) {
        let _guard = self.descent.lock();
        let mut copied = false;

        let cached = self.resolved.get(old_name).map(|entry| entry.value().clone());
        if let Some(cached) = cached {
            self.resolved.insert(new_name.to_string(), cached);
            copied = true;
        }

        if let Some(registration) = self.registry.get(old_name) {
            self.registry.insert(new_name, registration);
            copied = true;
        }

        if copied {
            debug!(new_name, old_name, "Alias created");
        } else {
            warn!(new_name, old_name, "Alias source is neither registered nor resolved");
        }
    }

    /// 解析服务 - 主要API
    ///
    /// 所有失败（未注册、循环依赖、生产者错误）都通过返回的 future 传递。
    pub fn resolve(&self, name: &str) -> Resolution {
        self.resolve_with_callers(name, &[])
    }

    /// 解析并向下转型
    pub async fn resolve_as<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, ContainerError> {
        let service = self.resolve(name).await?;
        service.downcast::<T>().map_err(|_| ContainerError::TypeCastFailed {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// 并发解析一组依赖，结果保持声明顺序
    pub fn resolve_dependencies(&self, names: &[&str]) -> BoxFuture<'static, Result<Vec<Service>, ContainerError>> {
        let _guard = self.descent.lock();
        let dependencies: Arc<[String]> = names.iter().map(|name| name.to_string()).collect();

        match self.join_dependencies(&dependencies, &[]) {
            Ok(joined) => joined.map_ok(Arguments::into_values).boxed(),
            Err(err) => future::ready(Err(err)).boxed(),
        }
    }

    fn resolve_with_callers(&self, name: &str, callers: &[String]) -> Resolution {
        let _guard = self.descent.lock();
        self.stats.record_resolution();

        let cached = self.resolved.get(name).map(|entry| entry.value().clone());
        if let Some(cached) = cached {
            self.stats.record_hit();
            trace!(name, "Cache hit");
            return cached.boxed();
        }
        self.stats.record_miss();

        match self.dispatch(name, callers) {
            Ok(resolution) => resolution,
            Err(err) => {
                self.stats.record_failure();
                warn!(name, error = %err, "Resolution failed");
                future::ready(Err(err)).boxed()
            }
        }
    }

    fn dispatch(&self, name: &str, callers: &[String]) -> Result<Resolution, ContainerError> {
        if let Some(limit) = self.config.max_depth {
            if callers.len() > limit {
                return Err(ContainerError::DepthLimitExceeded {
                    name: name.to_string(),
                    limit,
                });
            }
        }

        let registration = self
            .registry
            .get(name)
            .ok_or_else(|| ContainerError::NotRegistered {
                name: name.to_string(),
            })?;
        let kind = registration.kind();
        debug!(name, %kind, depth = callers.len(), "Cache miss, resolving");

        let Registration {
            dependencies,
            producer,
        } = registration;

        let resolution = match producer {
            Producer::Value(value) => future::ready(Ok(value)).boxed().shared(),
            Producer::Callable(func) => {
                self.construct(name, &dependencies, callers, move |args| func.call(args))?
            }
            Producer::Singleton(class) | Producer::Instance(class) => {
                self.construct(name, &dependencies, callers, move |args| class.construct(args))?
            }
        };

        // 必须在返回（即任何 await）之前写入缓存
        if kind.caches() {
            self.resolved.insert(name.to_string(), resolution.clone());
        }
        Ok(resolution.boxed())
    }

    /// 构造策略：先解析依赖（调用链追加自身名称），再以解析结果调用生产者
    ///
    /// 返回的共享 future 已经在运行时上启动；没有运行时（例如在 tokio 之外调用）
    /// 时退化为由第一个等待者驱动。
    fn construct<F>(
        &self,
        name: &str,
        dependencies: &Arc<[String]>,
        callers: &[String],
        produce: F,
    ) -> Result<SharedResolution, ContainerError>
    where
        F: FnOnce(Arguments) -> BoxFuture<'static, Result<Service, BoxError>> + Send + 'static,
    {
        let mut chain = callers.to_vec();
        chain.push(name.to_string());
        let arguments = self.join_dependencies(dependencies, &chain)?;

        let stats = self.stats.clone();
        let name = name.to_string();
        let construction = async move {
            let args = arguments.await?;
            stats.record_construction();
            debug!(name = %name, "Constructing service");

            produce(args).await.map_err(|source| {
                stats.record_failure();
                ContainerError::creation_failed(&name, source)
            })
        }
        .boxed()
        .shared();

        if let Ok(runtime) = Handle::try_current() {
            runtime.spawn(construction.clone());
        }
        Ok(construction)
    }

    /// 依次发起每个依赖的解析（不等待），然后并发等待全部结果
    ///
    /// 某个依赖已在调用链中时立即返回 `CircularDependency`；在它之前发起的解析保持原样。
    fn join_dependencies(
        &self,
        dependencies: &Arc<[String]>,
        callers: &[String],
    ) -> Result<BoxFuture<'static, Result<Arguments, ContainerError>>, ContainerError> {
        let mut pending = Vec::with_capacity(dependencies.len());

        for dependency in dependencies.iter() {
            if callers.contains(dependency) {
                let mut chain = callers.to_vec();
                chain.push(dependency.clone());
                warn!(name = %dependency, chain = ?chain, "Circular dependency detected");
                return Err(ContainerError::CircularDependency {
                    name: dependency.clone(),
                    chain,
                });
            }
            pending.push(self.resolve_with_callers(dependency, callers));
        }

        let names = dependencies.clone();
        Ok(async move {
            let values = future::try_join_all(pending).await?;
            Ok::<Arguments, ContainerError>(Arguments::new(names, values))
        }
        .boxed())
    }

    /// 检查服务是否已注册
    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// 检查服务是否已有缓存的解析结果（可能仍在进行中）
    pub fn is_resolved(&self, name: &str) -> bool {
        self.resolved.contains_key(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<RegistrationKind> {
        self.registry.get(name).map(|registration| registration.kind())
    }

    /// 获取容器统计信息
    pub fn get_stats(&self) -> ContainerStats {
        self.stats.snapshot(self.registry.len(), self.resolved.len())
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_callable(counter: &Arc<AtomicUsize>) -> Callable {
        let counter = counter.clone();
        Callable::from_fn(move |_| Ok(counter.fetch_add(1, Ordering::SeqCst) + 1))
    }

    #[tokio::test]
    async fn test_cache_written_before_first_poll() {
        let container = ServiceContainer::new();
        let counter = Arc::new(AtomicUsize::new(0));
        container
            .register_callable("svc", &[], counting_callable(&counter))
            .unwrap();

        let first = container.resolve("svc");
        assert!(container.is_resolved("svc"));
        let second = container.resolve("svc");
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        let (a, b) = futures_util::future::join(first, second).await;
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_outside_runtime_first_awaiter_drives_construction() {
        let container = ServiceContainer::new();
        let counter = Arc::new(AtomicUsize::new(0));
        container
            .register_callable("svc", &[], counting_callable(&counter))
            .unwrap();

        let pending = container.resolve("svc");
        assert!(container.is_resolved("svc"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let value = runtime.block_on(pending).unwrap();
        assert_eq!(*value.downcast::<usize>().unwrap(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cycle_is_not_cached_on_detecting_name() {
        let container = ServiceContainer::new();
        container
            .register_callable("a", &["b"], Callable::from_fn(|_| Ok(())))
            .unwrap();
        container
            .register_callable("b", &["a"], Callable::from_fn(|_| Ok(())))
            .unwrap();

        let err = container.resolve("a").await.unwrap_err();
        assert!(matches!(err, ContainerError::CircularDependency { ref name, .. } if name == "a"));

        // "b" 的构造在下降阶段失败，没有写入缓存；"a" 缓存了失败的 join
        assert!(container.is_resolved("a"));
        assert!(!container.is_resolved("b"));
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let config = ContainerConfig {
            max_depth: Some(1),
            ..ContainerConfig::default()
        };
        let container = ServiceContainer::with_config(config);
        container.register_value("c", 3u8);
        container
            .register_callable("b", &["c"], Callable::from_fn(|_| Ok(2u8)))
            .unwrap();
        container
            .register_callable("a", &["b"], Callable::from_fn(|_| Ok(1u8)))
            .unwrap();

        // a -> b 深度 1；c 已缓存，直接命中
        assert!(container.resolve("a").await.is_ok());

        container.register_callable("x", &["y"], Callable::from_fn(|_| Ok(0u8))).unwrap();
        container.register_callable("y", &["z"], Callable::from_fn(|_| Ok(0u8))).unwrap();
        container.register_callable("z", &[], Callable::from_fn(|_| Ok(0u8))).unwrap();
        let err = container.resolve("x").await.unwrap_err();
        assert!(matches!(err, ContainerError::DepthLimitExceeded { ref name, limit: 1 } if name == "z"));
    }

    #[tokio::test]
    async fn test_stats() {
        let container = ServiceContainer::new();
        let counter = Arc::new(AtomicUsize::new(0));
        container
            .register_callable("svc", &[], counting_callable(&counter))
            .unwrap();

        for _ in 0..10 {
            container.resolve("svc").await.unwrap();
        }

        let stats = container.get_stats();
        assert_eq!(stats.total(), 10);
        assert_eq!(stats.cache_hits, 9);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.constructions, 1);
        assert_eq!(stats.registered_services, 1);
        assert!(stats.hit_rate() > 0.8);
    }
}
