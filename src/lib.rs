//! Lazily-resolving, name-keyed dependency injection.
//!
//! Register factories under names, declare which names each factory needs, and
//! let the [`Container`] build the graph on demand. Singletons are built once
//! per container; transient services are built on every request.

pub mod config;
pub mod container;
pub mod errors;
pub mod logging;

// Re-export commonly used items for convenience
pub use config::ContainerConfig;
pub use container::{
    create_container, env, process_env, transient, Args, Argument, Container, ContainerStats,
    Factories, Factory, FactoryKind, Group, Injector, ModuleDescriptor, ParameterSpec,
    ResolutionContext, Service, ServiceLifetime, INJECT, MODULE,
};
pub use errors::{ConfigError, ContainerError};
