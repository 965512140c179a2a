use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One monitored target: where to probe and what to call it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub address: String,
    pub name: String,
}

impl Target {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}

/// Public resolvers probed on every run, in probe order.
pub const DEFAULT_TARGETS: &[(&str, &str)] = &[
    ("9.9.9.9", "Quad9"),
    ("1.1.1.1", "Cloudflare"),
    ("8.8.8.8", "Google"),
];

/// The fixed, ordered list of targets for one run. Built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRegistry {
    targets: Vec<Target>,
}

impl HostRegistry {
    pub fn with_defaults() -> Self {
        Self {
            targets: DEFAULT_TARGETS
                .iter()
                .map(|(address, name)| Target::new(*address, *name))
                .collect(),
        }
    }

    /// Defaults followed by operator-supplied `ADDRESS NAME` pairs.
    pub fn with_extras(extra: &[String]) -> Result<Self, ConfigError> {
        let mut registry = Self::with_defaults();
        registry.targets.extend(parse_extra_hosts(extra)?);
        Ok(registry)
    }

    pub fn from_targets(targets: Vec<Target>) -> Self {
        Self { targets }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Parse a flat `[address, name, address, name, ...]` list into targets.
///
/// An odd number of values, or a blank address or name, is a configuration
/// error.
pub fn parse_extra_hosts(values: &[String]) -> Result<Vec<Target>, ConfigError> {
    if values.len() % 2 != 0 {
        return Err(ConfigError::UnpairedExtraHost {
            count: values.len(),
        });
    }

    let mut out = Vec::with_capacity(values.len() / 2);
    for (idx, pair) in values.chunks_exact(2).enumerate() {
        let index = idx + 1;
        let address = pair[0].trim();
        let name = pair[1].trim();
        if address.is_empty() {
            return Err(ConfigError::EmptyField {
                index,
                field: "address",
            });
        }
        if name.is_empty() {
            return Err(ConfigError::EmptyField {
                index,
                field: "name",
            });
        }
        out.push(Target::new(address, name));
    }
    Ok(out)
}
