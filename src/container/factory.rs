//! Factory definitions
//!
//! A [`Factory`] pairs a callable body with the ordered list of names it needs.
//! The names are declared explicitly when the factory is built; the resolver
//! trusts the declaration position for position.

use super::resolver::ResolutionContext;
use super::{Service, ServiceLifetime};
use crate::errors::ContainerError;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Injects the descriptor of whoever requested the service being built.
pub const MODULE: &str = "module";
/// Injects an [`Injector`](super::Injector) bound to the container.
pub const INJECT: &str = "inject";

pub(crate) fn is_reserved(name: &str) -> bool {
    name == MODULE || name == INJECT
}

/// One positional parameter of a factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterSpec {
    /// A single dependency resolved by name.
    Name(String),
    /// Several dependencies bundled into one [`Group`] argument.
    Group(Vec<String>),
}

impl From<&str> for ParameterSpec {
    fn from(name: &str) -> Self {
        ParameterSpec::Name(name.to_string())
    }
}

impl From<String> for ParameterSpec {
    fn from(name: String) -> Self {
        ParameterSpec::Name(name)
    }
}

/// How the factory body produces its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryKind {
    /// The body returns the value.
    Value,
    /// The body fills in a blank `Default` receiver which becomes the value.
    Receiver,
}

type FactoryFn = dyn Fn(&Args, &ResolutionContext) -> anyhow::Result<Service> + Send + Sync;

/// A registered (or ad-hoc) constructor of a service.
#[derive(Clone)]
pub struct Factory {
    params: Vec<ParameterSpec>,
    lifetime: ServiceLifetime,
    kind: FactoryKind,
    body: Arc<FactoryFn>,
}

impl Factory {
    /// Creates a factory whose body returns the service value.
    ///
    /// ```
    /// use ioc::Factory;
    ///
    /// let sum = Factory::value(|args, _| {
    ///     let x = args.get::<i64>(0)?;
    ///     let y = args.get::<i64>(1)?;
    ///     Ok(*x + *y)
    /// })
    /// .params(["x", "y"]);
    /// assert_eq!(sum.param_specs().len(), 2);
    /// ```
    pub fn value<T, F>(body: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Args, &ResolutionContext) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            params: Vec::new(),
            lifetime: ServiceLifetime::Singleton,
            kind: FactoryKind::Value,
            body: Arc::new(move |args, ctx| {
                let value = body(args, ctx)?;
                Ok(Arc::new(value) as Service)
            }),
        }
    }

    /// Creates a factory that mutates a fresh `T::default()` receiver.
    pub fn receiver<T, F>(body: F) -> Self
    where
        T: Default + Send + Sync + 'static,
        F: Fn(&mut T, &Args, &ResolutionContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            params: Vec::new(),
            lifetime: ServiceLifetime::Singleton,
            kind: FactoryKind::Receiver,
            body: Arc::new(move |args, ctx| {
                let mut receiver = T::default();
                body(&mut receiver, args, ctx)?;
                Ok(Arc::new(receiver) as Service)
            }),
        }
    }

    /// Appends one parameter.
    pub fn param(mut self, spec: impl Into<ParameterSpec>) -> Self {
        self.params.push(spec.into());
        self
    }

    /// Appends several single-name parameters, in order.
    pub fn params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params
            .extend(names.into_iter().map(|name| ParameterSpec::Name(name.into())));
        self
    }

    /// Appends one grouped parameter made of `names`.
    pub fn group<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members = names.into_iter().map(Into::into).collect();
        self.params.push(ParameterSpec::Group(members));
        self
    }

    /// Marks the factory transient: a new value on every resolution.
    pub fn transient(mut self) -> Self {
        self.lifetime = ServiceLifetime::Transient;
        self
    }

    pub fn param_specs(&self) -> &[ParameterSpec] {
        &self.params
    }

    pub fn lifetime(&self) -> ServiceLifetime {
        self.lifetime
    }

    pub fn is_transient(&self) -> bool {
        self.lifetime == ServiceLifetime::Transient
    }

    pub fn kind(&self) -> FactoryKind {
        self.kind
    }

    pub(crate) fn invoke(&self, args: &Args, ctx: &ResolutionContext) -> anyhow::Result<Service> {
        (self.body)(args, ctx)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("params", &self.params)
            .field("lifetime", &self.lifetime)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Marks `factory` transient and hands it back, for inline use at registration.
pub fn transient(factory: Factory) -> Factory {
    factory.transient()
}

/// A resolved positional argument.
#[derive(Clone)]
pub enum Argument {
    Service(Service),
    Group(Group),
}

/// Resolved members of a grouped parameter, keyed by name.
#[derive(Clone, Default)]
pub struct Group {
    owner: String,
    members: BTreeMap<String, Service>,
}

impl Group {
    pub(crate) fn new(owner: &str, members: BTreeMap<String, Service>) -> Self {
        Self {
            owner: owner.to_string(),
            members,
        }
    }

    pub fn get<T: Any + Send + Sync>(&self, member: &str) -> Result<Arc<T>, ContainerError> {
        let service = self.get_raw(member)?;
        downcast(member, service.clone())
    }

    pub fn get_raw(&self, member: &str) -> Result<&Service, ContainerError> {
        self.members
            .get(member)
            .ok_or_else(|| ContainerError::MissingGroupMember {
                service: self.owner.clone(),
                member: member.to_string(),
            })
    }

    pub fn contains(&self, member: &str) -> bool {
        self.members.contains_key(member)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Arguments handed to a factory body, in declared order.
pub struct Args {
    service: String,
    values: Vec<Argument>,
}

impl Args {
    pub(crate) fn new(service: &str, values: Vec<Argument>) -> Self {
        Self {
            service: service.to_string(),
            values,
        }
    }

    /// Downcasts the single service at `index`.
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>, ContainerError> {
        match self.argument(index)? {
            Argument::Service(service) => downcast(&self.label(index), service.clone()),
            Argument::Group(_) => Err(ContainerError::NotAService {
                service: self.service.clone(),
                index,
            }),
        }
    }

    /// The grouped argument at `index`.
    pub fn group(&self, index: usize) -> Result<&Group, ContainerError> {
        match self.argument(index)? {
            Argument::Group(group) => Ok(group),
            Argument::Service(_) => Err(ContainerError::NotAGroup {
                service: self.service.clone(),
                index,
            }),
        }
    }

    pub fn argument(&self, index: usize) -> Result<&Argument, ContainerError> {
        self.values
            .get(index)
            .ok_or_else(|| ContainerError::ArgumentOutOfRange {
                service: self.service.clone(),
                index,
                len: self.values.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn label(&self, index: usize) -> String {
        format!("{}#{}", self.service, index)
    }
}

pub(crate) fn downcast<T: Any + Send + Sync>(
    name: &str,
    service: Service,
) -> Result<Arc<T>, ContainerError> {
    service
        .downcast::<T>()
        .map_err(|_| ContainerError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
        })
}
