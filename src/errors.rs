use thiserror::Error;

/// Errors raised while resolving services out of a [`Container`](crate::Container).
#[derive(Debug, Error)]
pub enum ContainerError {
    /// No factory is registered under `name` and it is not a reserved name.
    #[error("Unknown dependency: {requester} -> {name}.")]
    UnknownDependency { name: String, requester: String },

    /// `chain` lists the names under construction, ending with the repeated one.
    #[error("Cyclic dependency: {}", chain.join(" -> "))]
    CyclicDependency { chain: Vec<String> },

    #[error("Service '{name}' is not a {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("'{service}' asked for argument {index} but only {len} were declared")]
    ArgumentOutOfRange {
        service: String,
        index: usize,
        len: usize,
    },

    #[error("Argument {index} of '{service}' is a single service, not a group")]
    NotAGroup { service: String, index: usize },

    #[error("Argument {index} of '{service}' is a group, not a single service")]
    NotAService { service: String, index: usize },

    #[error("Group requested by '{service}' has no member '{member}'")]
    MissingGroupMember { service: String, member: String },

    #[error("'{0}' is a reserved name and cannot be registered")]
    ReservedName(String),

    #[error("The container behind this injector has been dropped")]
    ContainerDropped,

    /// A factory body failed. The factory's own error is kept as is.
    #[error(transparent)]
    Factory(anyhow::Error),
}

impl ContainerError {
    /// Converts an error returned by a factory body.
    ///
    /// Container errors raised inside a body (for example from a nested
    /// [`Injector`](crate::Injector) call) surface as themselves instead of
    /// being wrapped in [`ContainerError::Factory`].
    pub fn from_factory(err: anyhow::Error) -> Self {
        match err.downcast::<ContainerError>() {
            Ok(container_err) => container_err,
            Err(other) => ContainerError::Factory(other),
        }
    }

    pub fn is_unknown_dependency(&self) -> bool {
        matches!(self, ContainerError::UnknownDependency { .. })
    }

    pub fn is_cyclic_dependency(&self) -> bool {
        matches!(self, ContainerError::CyclicDependency { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

/// Helper used by the config loader when an override cannot be parsed.
pub fn invalid_value(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
