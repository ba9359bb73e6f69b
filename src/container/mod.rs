//! Name-keyed dependency injection container
//!
//! Services are registered as [`Factory`] definitions under a name and built
//! lazily on first access. Each factory declares the names it depends on; the
//! resolver builds those first, recursively, and hands them to the factory as
//! positional [`Args`].
//!
//! ```
//! use ioc::{create_container, Factories, Factory};
//! use std::sync::Arc;
//!
//! let container = create_container(
//!     Factories::new()
//!         .register("x", Factory::value(|_, _| Ok(1_i64)))
//!         .register("y", Factory::value(|_, _| Ok(2_i64)))
//!         .register(
//!             "sum",
//!             Factory::value(|args, _| Ok(*args.get::<i64>(0)? + *args.get::<i64>(1)?))
//!                 .params(["x", "y"]),
//!         ),
//! )
//! .unwrap();
//!
//! let sum = container.get::<i64>("sum").unwrap();
//! assert_eq!(*sum, 3);
//! assert!(Arc::ptr_eq(&sum, &container.get::<i64>("sum").unwrap()));
//! ```

pub mod env;
pub mod factory;
pub mod inject;
pub mod module;
pub mod resolver;
pub mod stats;

pub use env::{env, process_env};
pub use factory::{
    transient, Args, Argument, Factory, FactoryKind, Group, ParameterSpec, INJECT, MODULE,
};
pub use inject::Injector;
pub use module::{ModuleDescriptor, INJECT_MODULE, ROOT_MODULE};
pub use resolver::ResolutionContext;
pub use stats::ContainerStats;

use crate::config::ContainerConfig;
use crate::errors::ContainerError;
use dashmap::DashMap;
use factory::{downcast, is_reserved};
use resolver::{ResolutionPath, Resolver};
use stats::InnerStats;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A constructed service value.
pub type Service = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceLifetime {
    /// Built once per container, then served from the instance cache
    Singleton,
    /// Built anew on every resolution
    Transient,
}

/// Factory definitions keyed by service name, in registration order.
///
/// Registering a name again replaces the earlier factory but keeps its position.
#[derive(Clone, Default)]
pub struct Factories {
    order: Vec<String>,
    entries: HashMap<String, Factory>,
}

impl Factories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, name: impl Into<String>, factory: Factory) -> Self {
        self.insert(name, factory);
        self
    }

    /// Returns the factory previously registered under `name`, if any.
    pub fn insert(&mut self, name: impl Into<String>, factory: Factory) -> Option<Factory> {
        let name = name.into();
        let previous = self.entries.insert(name.clone(), factory);
        if previous.is_none() {
            self.order.push(name);
        }
        previous
    }

    /// Adds every entry of `other`; its factories win on conflicting names.
    pub fn merge(mut self, other: Factories) -> Self {
        self.extend(other);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Factory> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Extend<(String, Factory)> for Factories {
    fn extend<I: IntoIterator<Item = (String, Factory)>>(&mut self, iter: I) {
        for (name, factory) in iter {
            self.insert(name, factory);
        }
    }
}

impl FromIterator<(String, Factory)> for Factories {
    fn from_iter<I: IntoIterator<Item = (String, Factory)>>(iter: I) -> Self {
        let mut factories = Factories::new();
        factories.extend(iter);
        factories
    }
}

impl IntoIterator for Factories {
    type Item = (String, Factory);
    type IntoIter = std::vec::IntoIter<(String, Factory)>;

    fn into_iter(mut self) -> Self::IntoIter {
        self.order
            .into_iter()
            .filter_map(|name| self.entries.remove(&name).map(|factory| (name, factory)))
            .collect::<Vec<_>>()
            .into_iter()
    }
}

impl fmt::Debug for Factories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.order.iter().filter_map(|name| self.entries.get_key_value(name)))
            .finish()
    }
}

pub(crate) struct ContainerInner {
    pub(crate) factories: Factories,
    /// Singleton instance cache, written once per name.
    pub(crate) instances: DashMap<String, Service>,
    pub(crate) stats: InnerStats,
    pub(crate) config: ContainerConfig,
}

/// Lazily builds and caches the services described by a [`Factories`] registry.
///
/// Cloning is cheap; clones share factories and the instance cache.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

/// Creates a container with the default [`ContainerConfig`].
pub fn create_container(factories: Factories) -> Result<Container, ContainerError> {
    Container::new(factories)
}

impl Container {
    pub fn new(factories: Factories) -> Result<Self, ContainerError> {
        Self::with_config(factories, ContainerConfig::default())
    }

    /// Fails with [`ContainerError::ReservedName`] if `module` or `inject` is registered.
    pub fn with_config(factories: Factories, config: ContainerConfig) -> Result<Self, ContainerError> {
        if let Some(name) = factories.names().find(|name| is_reserved(name)) {
            return Err(ContainerError::ReservedName(name.to_string()));
        }

        tracing::debug!(
            services = factories.len(),
            detect_cycles = config.detect_cycles,
            "container created"
        );

        let inner = ContainerInner {
            stats: InnerStats::new(config.collect_stats),
            factories,
            instances: DashMap::new(),
            config,
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Resolves `name` on behalf of the root requester `(root)`.
    pub fn resolve(&self, name: &str) -> Result<Service, ContainerError> {
        let root = Arc::new(ModuleDescriptor::root());
        let mut path = ResolutionPath::new(self.inner.config.detect_cycles);
        Resolver::new(&self.inner).resolve(name, &root, &mut path)
    }

    /// [`resolve`](Self::resolve) followed by a downcast to `T`.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, ContainerError> {
        downcast(name, self.resolve(name)?)
    }

    /// The descriptor a root access passes as `module`.
    pub fn module(&self) -> Arc<ModuleDescriptor> {
        Arc::new(ModuleDescriptor::root())
    }

    pub fn inject(&self) -> Injector {
        Injector::new(Arc::downgrade(&self.inner), Vec::new())
    }

    /// Registered service names, in registration order. Reserved names are not listed.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.factories.names()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.factories.contains(name)
    }

    /// Whether a singleton instance for `name` is already cached.
    pub fn is_resolved(&self, name: &str) -> bool {
        self.inner.instances.contains_key(name)
    }

    pub fn stats(&self) -> ContainerStats {
        self.inner
            .stats
            .snapshot(self.inner.factories.len(), self.inner.instances.len())
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("services", &self.inner.factories.order)
            .field("resolved", &self.inner.instances.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct TestService {
        id: usize,
    }

    fn counting(counter: &Arc<AtomicUsize>) -> Factory {
        let counter = counter.clone();
        Factory::value(move |_, _| {
            let id = counter.fetch_add(1, Ordering::SeqCst);
            Ok(TestService { id })
        })
    }

    #[test]
    fn test_singleton_service() {
        let counter = Arc::new(AtomicUsize::new(0));
        let container = create_container(Factories::new().register("svc", counting(&counter))).unwrap();

        let service1 = container.get::<TestService>("svc").unwrap();
        let service2 = container.get::<TestService>("svc").unwrap();
        let service3 = container.get::<TestService>("svc").unwrap();

        assert!(Arc::ptr_eq(&service1, &service2));
        assert_eq!(service2.id, service3.id);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(container.is_resolved("svc"));
    }

    #[test]
    fn test_transient_service() {
        let counter = Arc::new(AtomicUsize::new(0));
        let container =
            create_container(Factories::new().register("svc", transient(counting(&counter)))).unwrap();

        let service1 = container.get::<TestService>("svc").unwrap();
        let service2 = container.get::<TestService>("svc").unwrap();

        assert!(!Arc::ptr_eq(&service1, &service2));
        assert_ne!(service1.id, service2.id);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(!container.is_resolved("svc"));
    }

    #[test]
    fn test_service_not_registered() {
        let container = create_container(Factories::new()).unwrap();

        let result = container.resolve("missing");

        match result {
            Err(ContainerError::UnknownDependency { name, requester }) => {
                assert_eq!(name, "missing");
                assert_eq!(requester, "(root)");
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_type_cast_error() {
        let container =
            create_container(Factories::new().register("svc", Factory::value(|_, _| Ok("wrong type")))).unwrap();

        let result = container.get::<TestService>("svc");

        assert!(matches!(result, Err(ContainerError::TypeMismatch { .. })));
    }

    #[test]
    fn test_reserved_names_are_rejected() {
        for reserved in [MODULE, INJECT] {
            let factories = Factories::new().register(reserved, Factory::value(|_, _| Ok(())));
            let err = create_container(factories).unwrap_err();
            assert!(matches!(err, ContainerError::ReservedName(name) if name == reserved));
        }
    }

    #[test]
    fn test_factories_keep_registration_order() {
        let factories = Factories::new()
            .register("b", Factory::value(|_, _| Ok(1_u8)))
            .register("a", Factory::value(|_, _| Ok(2_u8)))
            .register("b", Factory::value(|_, _| Ok(3_u8)));

        assert_eq!(factories.names().collect::<Vec<_>>(), ["b", "a"]);

        let container = create_container(factories).unwrap();
        assert_eq!(container.names().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(*container.get::<u8>("b").unwrap(), 3);
    }

    #[test]
    fn test_container_stats() {
        let container =
            create_container(Factories::new().register("svc", Factory::value(|_, _| Ok(TestService { id: 42 }))))
                .unwrap();

        for _ in 0..10 {
            let _ = container.get::<TestService>("svc").unwrap();
        }

        let stats = container.stats();
        assert_eq!(stats.total_resolutions, 10);
        assert_eq!(stats.cache_hits, 9);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.registered_services, 1);
        assert_eq!(stats.active_singletons, 1);
        assert!(stats.hit_rate() > 0.8);
    }

    #[test]
    fn test_concurrent_resolution() {
        let counter = Arc::new(AtomicUsize::new(0));
        let container = create_container(Factories::new().register("svc", counting(&counter))).unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let container = container.clone();
                std::thread::spawn(move || container.get::<TestService>("svc").unwrap())
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let first = &results[0];
        for result in &results {
            assert!(Arc::ptr_eq(first, result));
        }
    }
}
