//! Module descriptors
//!
//! Identifies whoever is asking for a dependency. Used in diagnostics and as
//! the value of the reserved `module` parameter.

use std::fmt;

/// Name of the requester for accesses made directly on the container.
pub const ROOT_MODULE: &str = "(root)";
/// Name of the requester for manual injection.
pub const INJECT_MODULE: &str = "(inject)";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleDescriptor {
    name: String,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn root() -> Self {
        Self::new(ROOT_MODULE)
    }

    pub fn inject() -> Self {
        Self::new(INJECT_MODULE)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name used in messages; an unnamed requester shows up as `()`.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "()"
        } else {
            &self.name
        }
    }

    pub fn is_root(&self) -> bool {
        self.name == ROOT_MODULE
    }
}

impl fmt::Display for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
