use super::factory::{downcast, Factory};
use super::module::{ModuleDescriptor, INJECT_MODULE};
use super::resolver::{Frame, ResolutionPath, Resolver};
use super::{ContainerInner, Service};
use crate::errors::ContainerError;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

/// Invokes factories that were never registered, using the services of the
/// container it came from.
///
/// Obtained through [`Container::inject`](super::Container::inject), by
/// declaring an `inject` parameter, or from
/// [`ResolutionContext::injector`](super::ResolutionContext::injector).
/// Every call constructs anew; the result is never cached.
///
/// # Example
/// ```
/// use ioc::{create_container, Factories, Factory};
///
/// let container = create_container(
///     Factories::new()
///         .register("x", Factory::value(|_, _| Ok(20_i64)))
///         .register("y", Factory::value(|_, _| Ok(22_i64))),
/// )
/// .unwrap();
///
/// let answer = Factory::value(|args, _| Ok(*args.get::<i64>(0)? + *args.get::<i64>(1)?))
///     .params(["x", "y"]);
///
/// let value = container.inject().call_as::<i64>(&answer).unwrap();
/// assert_eq!(*value, 42);
/// ```
#[derive(Clone)]
pub struct Injector {
    container: Weak<ContainerInner>,
    /// Resolution path at the point the injector was handed out. Frames whose
    /// construction has since finished are ignored.
    path: Vec<Frame>,
}

impl Injector {
    pub(crate) fn new(container: Weak<ContainerInner>, path: Vec<Frame>) -> Self {
        Self { container, path }
    }

    /// Resolves `factory`'s parameters and invokes it with `(inject)` as the requester.
    pub fn call(&self, factory: &Factory) -> Result<Service, ContainerError> {
        let inner = self
            .container
            .upgrade()
            .ok_or(ContainerError::ContainerDropped)?;
        inner.stats.injection();

        let module = Arc::new(ModuleDescriptor::inject());
        let mut path = ResolutionPath::resume(self.path.clone(), inner.config.detect_cycles);
        tracing::debug!(depth = path.depth(), params = factory.param_specs().len(), "manual injection");

        Resolver::new(&inner).construct(INJECT_MODULE, factory, &module, &module, &mut path)
    }

    pub fn call_as<T: Any + Send + Sync>(&self, factory: &Factory) -> Result<Arc<T>, ContainerError> {
        downcast(INJECT_MODULE, self.call(factory)?)
    }

    /// Whether the owning container is still alive.
    pub fn is_bound(&self) -> bool {
        self.container.strong_count() > 0
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("bound", &self.is_bound())
            .field("path", &ResolutionPath::resume(self.path.clone(), true).names())
            .finish()
    }
}
