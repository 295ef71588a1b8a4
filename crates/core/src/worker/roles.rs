//! Generation roles and their version-qualified names.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// What a generation holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The application shell, precached at install.
    Shell,
    /// Everything fetched at runtime, populated lazily.
    Runtime,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Shell, Role::Runtime];

    /// Segment used in generation names.
    pub fn label(self) -> &'static str {
        match self {
            Role::Shell => "static",
            Role::Runtime => "dynamic",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Registry of the current generation name for each role.
///
/// Names have the form `{prefix}-{label}-{version}`, so generations left by
/// another version never compare equal to a current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationNames {
    version: String,
    names: BTreeMap<Role, String>,
}

impl GenerationNames {
    pub fn new(prefix: &str, version: &str) -> Self {
        let names = Role::ALL
            .into_iter()
            .map(|role| (role, format!("{prefix}-{}-{version}", role.label())))
            .collect();
        Self { version: version.to_string(), names }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn name(&self, role: Role) -> &str {
        &self.names[&role]
    }

    pub fn shell(&self) -> &str {
        self.name(Role::Shell)
    }

    pub fn runtime(&self) -> &str {
        self.name(Role::Runtime)
    }

    /// Every current name; anything else in the store is stale.
    pub fn current(&self) -> Vec<String> {
        self.names.values().cloned().collect()
    }

    pub fn is_current(&self, name: &str) -> bool {
        self.names.values().any(|n| n == name)
    }
}
