//! Resolution engine
//!
//! Turns a service name into a constructed value: reserved names first, then
//! the instance cache, then the factory with its declared dependencies
//! resolved recursively.

use super::factory::{Argument, Args, Factory, Group, ParameterSpec, INJECT, MODULE};
use super::inject::Injector;
use super::module::ModuleDescriptor;
use super::{ContainerInner, Service};
use crate::errors::ContainerError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Passed to every factory body next to its arguments.
pub struct ResolutionContext {
    module: Arc<ModuleDescriptor>,
    service: String,
    injector: Injector,
}

impl ResolutionContext {
    /// Whoever requested the service being built.
    pub fn module(&self) -> &Arc<ModuleDescriptor> {
        &self.module
    }

    /// Name the service is being built under, `(inject)` for manual injection.
    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn injector(&self) -> &Injector {
        &self.injector
    }
}

/// One name under construction. `active` is cleared once its construction ends,
/// so copies held by injectors stop counting it.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    name: String,
    active: Arc<AtomicBool>,
}

impl Frame {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Names currently under construction on one resolution call stack.
#[derive(Debug, Clone)]
pub(crate) struct ResolutionPath {
    frames: Vec<Frame>,
    detect_cycles: bool,
}

impl ResolutionPath {
    pub(crate) fn new(detect_cycles: bool) -> Self {
        Self::resume(Vec::new(), detect_cycles)
    }

    /// Continues a path captured earlier, keeping only frames still being built.
    pub(crate) fn resume(mut frames: Vec<Frame>, detect_cycles: bool) -> Self {
        frames.retain(Frame::is_active);
        Self {
            frames,
            detect_cycles,
        }
    }

    pub(crate) fn enter(&mut self, name: &str) -> Result<(), ContainerError> {
        if self.detect_cycles
            && self
                .frames
                .iter()
                .any(|frame| frame.name == name && frame.is_active())
        {
            let mut chain = self.names();
            chain.push(name.to_string());
            tracing::warn!(chain = %chain.join(" -> "), "cyclic dependency detected");
            return Err(ContainerError::CyclicDependency { chain });
        }
        self.frames.push(Frame {
            name: name.to_string(),
            active: Arc::new(AtomicBool::new(true)),
        });
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        if let Some(frame) = self.frames.pop() {
            frame.active.store(false, Ordering::Release);
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<Frame> {
        self.frames.clone()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.frames.iter().map(|frame| frame.name.clone()).collect()
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }
}

pub(crate) struct Resolver<'a> {
    inner: &'a Arc<ContainerInner>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(inner: &'a Arc<ContainerInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn resolve(
        &self,
        name: &str,
        from: &Arc<ModuleDescriptor>,
        path: &mut ResolutionPath,
    ) -> Result<Service, ContainerError> {
        self.inner.stats.resolution();

        match name {
            MODULE => return Ok(from.clone() as Service),
            INJECT => return Ok(Arc::new(self.injector(path)) as Service),
            _ => {}
        }

        if let Some(cached) = self.inner.instances.get(name) {
            self.inner.stats.cache_hit();
            tracing::trace!(service = name, requester = %from, "instance cache hit");
            return Ok(cached.value().clone());
        }

        let factory = self.inner.factories.get(name).ok_or_else(|| {
            tracing::warn!(service = name, requester = %from, "unknown dependency");
            ContainerError::UnknownDependency {
                name: name.to_string(),
                requester: from.display_name().to_string(),
            }
        })?;

        path.enter(name)?;
        tracing::debug!(
            service = name,
            requester = %from,
            lifetime = ?factory.lifetime(),
            depth = path.depth(),
            "constructing service"
        );
        let own = Arc::new(ModuleDescriptor::new(name));
        let constructed = self.construct(name, factory, from, &own, path);
        path.leave();
        let value = constructed?;

        if factory.is_transient() {
            self.inner.stats.transient_creation();
            return Ok(value);
        }

        self.inner.stats.cache_miss();
        // A concurrent resolution may have stored this name first; keep its value.
        let cached = self
            .inner
            .instances
            .entry(name.to_string())
            .or_insert(value)
            .value()
            .clone();
        Ok(cached)
    }

    /// Resolves the factory's declared parameters and invokes it. Never touches
    /// the cache entry of `service` itself.
    pub(crate) fn construct(
        &self,
        service: &str,
        factory: &Factory,
        requester: &Arc<ModuleDescriptor>,
        own: &Arc<ModuleDescriptor>,
        path: &mut ResolutionPath,
    ) -> Result<Service, ContainerError> {
        let mut values = Vec::with_capacity(factory.param_specs().len());
        for spec in factory.param_specs() {
            let argument = match spec {
                ParameterSpec::Name(name) => {
                    Argument::Service(self.resolve_parameter(name, requester, own, path)?)
                }
                ParameterSpec::Group(names) => {
                    let mut members = BTreeMap::new();
                    for name in names {
                        let value = self.resolve_parameter(name, requester, own, path)?;
                        members.insert(name.clone(), value);
                    }
                    Argument::Group(Group::new(service, members))
                }
            };
            values.push(argument);
        }

        let args = Args::new(service, values);
        let ctx = ResolutionContext {
            module: requester.clone(),
            service: service.to_string(),
            injector: self.injector(path),
        };

        factory.invoke(&args, &ctx).map_err(|err| {
            tracing::debug!(service, error = %err, "factory failed");
            ContainerError::from_factory(err)
        })
    }

    /// `module` is answered with the requester of the service being built,
    /// every other name is requested on behalf of the service itself.
    fn resolve_parameter(
        &self,
        name: &str,
        requester: &Arc<ModuleDescriptor>,
        own: &Arc<ModuleDescriptor>,
        path: &mut ResolutionPath,
    ) -> Result<Service, ContainerError> {
        let from = if name == MODULE { requester } else { own };
        self.resolve(name, from, path)
    }

    fn injector(&self, path: &ResolutionPath) -> Injector {
        Injector::new(Arc::downgrade(self.inner), path.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_detects_repeated_name() {
        let mut path = ResolutionPath::new(true);
        path.enter("a").unwrap();
        path.enter("b").unwrap();

        let err = path.enter("a").unwrap_err();
        match err {
            ContainerError::CyclicDependency { chain } => assert_eq!(chain, ["a", "b", "a"]),
            other => panic!("unexpected error: {other}"),
        }

        path.leave();
        path.leave();
        assert_eq!(path.depth(), 0);
    }

    #[test]
    fn test_path_without_detection_only_tracks() {
        let mut path = ResolutionPath::new(false);
        path.enter("a").unwrap();
        path.enter("a").unwrap();
        assert_eq!(path.names(), ["a", "a"]);
    }

    #[test]
    fn test_resumed_path_drops_finished_frames() {
        let mut path = ResolutionPath::new(true);
        path.enter("outer").unwrap();
        path.enter("inner").unwrap();
        let captured = path.snapshot();

        path.leave();
        let mut resumed = ResolutionPath::resume(captured.clone(), true);
        assert_eq!(resumed.names(), ["outer"]);
        assert!(resumed.enter("inner").is_ok());
        assert!(resumed.enter("outer").unwrap_err().is_cyclic_dependency());

        path.leave();
        let mut resumed = ResolutionPath::resume(captured, true);
        assert_eq!(resumed.depth(), 0);
        assert!(resumed.enter("outer").is_ok());
    }
}
