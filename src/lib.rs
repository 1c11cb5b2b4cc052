//! wirebox: a name-keyed dependency resolution container.
//!
//! Producers are registered under string names together with the names of the
//! dependencies they need. Resolving a name resolves its dependencies first,
//! concurrently, and passes them to the producer in declaration order.
//!
//! ```no_run
//! use wirebox::{Arguments, Callable, ServiceContainer};
//!
//! # async fn demo() -> Result<(), wirebox::ContainerError> {
//! let container = ServiceContainer::new();
//! container.register_value("port", 8080u16);
//! container.register_callable(
//!     "address",
//!     &["port"],
//!     Callable::from_fn(|args: Arguments| Ok(format!("127.0.0.1:{}", args.get::<u16>(0)?))),
//! )?;
//!
//! let address = container.resolve_as::<String>("address").await?;
//! assert_eq!(address.as_str(), "127.0.0.1:8080");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod container;
pub mod errors;
pub mod logging;

pub use config::ContainerConfig;
pub use container::{
    Arguments, BoxError, Callable, ClassType, Construct, ContainerError, ContainerStats,
    RegistrationKind, Resolution, Service, ServiceContainer,
};
pub use errors::{ConfigError, LoggingError};
