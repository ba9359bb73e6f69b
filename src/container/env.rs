//! Environment adaptation
//!
//! Turns flat string pairs into zero-argument factories so configuration
//! values can be injected like any other service.

use super::factory::Factory;
use super::Factories;

/// One factory per pair, each resolving to the value verbatim as a `String`.
///
/// ```
/// use ioc::{create_container, env};
///
/// let container = create_container(env([("A", "1"), ("B", "2")])).unwrap();
/// assert_eq!(*container.get::<String>("A").unwrap(), "1");
/// assert_eq!(*container.get::<String>("B").unwrap(), "2");
/// ```
pub fn env<I, K, V>(values: I) -> Factories
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    values
        .into_iter()
        .map(|(key, value)| {
            let key: String = key.into();
            let value: String = value.into();
            (key, Factory::value(move |_, _| Ok(value.clone())))
        })
        .collect()
}

/// [`env`] over the variables of the current process.
pub fn process_env() -> Factories {
    env(std::env::vars())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_creates_zero_argument_factories() {
        let factories = env([("A", "1"), ("B", "2")]);

        assert_eq!(factories.len(), 2);
        for name in ["A", "B"] {
            let factory = factories.get(name).unwrap();
            assert!(factory.param_specs().is_empty());
            assert!(!factory.is_transient());
        }
    }

    #[test]
    fn test_process_env_sees_current_variables() {
        let expected: Vec<String> = std::env::vars().map(|(key, _)| key).collect();
        let factories = process_env();
        for key in &expected {
            assert!(factories.contains(key));
        }
    }
}
