use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

pub const MODULE_KEY_FORMAT: &str = "{provider}/{namespace}/{name}";
pub const MODULE_VERSION_KEY_FORMAT: &str = "{provider}/{namespace}/{name}@{version}";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseKeyError {
    #[error("could not parse '{value}' as a {target}: value is empty")]
    Empty { target: &'static str, value: String },

    #[error("could not parse '{value}' as a {target}: invalid format, expected {expected}")]
    InvalidFormat {
        target: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Natural key of a module: `{provider}/{namespace}/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleKey {
    pub provider: String,
    pub namespace: String,
    pub name: String,
}

impl ModuleKey {
    pub fn new(
        provider: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn with_version(self, version: impl Into<String>) -> ModuleVersionKey {
        ModuleVersionKey {
            module: self,
            version: version.into(),
        }
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.provider, self.namespace, self.name)
    }
}

impl FromStr for ModuleKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const TARGET: &str = "module key";

        if s.is_empty() {
            return Err(ParseKeyError::Empty {
                target: TARGET,
                value: s.to_string(),
            });
        }

        match s.split('/').collect::<Vec<_>>()[..] {
            [provider, namespace, name] => Ok(Self::new(provider, namespace, name)),
            _ => Err(ParseKeyError::InvalidFormat {
                target: TARGET,
                value: s.to_string(),
                expected: MODULE_KEY_FORMAT,
            }),
        }
    }
}

/// Natural key of a module version: `{module key}@{version}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleVersionKey {
    #[serde(flatten)]
    pub module: ModuleKey,
    pub version: String,
}

impl fmt::Display for ModuleVersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.module, self.version)
    }
}

impl FromStr for ModuleVersionKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const TARGET: &str = "module version key";

        let invalid = || ParseKeyError::InvalidFormat {
            target: TARGET,
            value: s.to_string(),
            expected: MODULE_VERSION_KEY_FORMAT,
        };

        if s.is_empty() {
            return Err(ParseKeyError::Empty {
                target: TARGET,
                value: s.to_string(),
            });
        }

        match s.split('@').collect::<Vec<_>>()[..] {
            [module, version] => {
                let module = module.parse::<ModuleKey>().map_err(|_| invalid())?;
                Ok(module.with_version(version))
            }
            _ => Err(invalid()),
        }
    }
}

/// An entity reference as supplied by a caller: either the opaque id or the
/// natural key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier<K> {
    ById(Uuid),
    ByKey(K),
}

impl<K: FromStr> Identifier<K> {
    /// Natural-key parsing goes first; its delimiters never appear in a
    /// hyphenated UUID.
    pub fn resolve(input: &str) -> Option<Self> {
        if let Ok(key) = input.parse::<K>() {
            return Some(Self::ByKey(key));
        }

        parse_uuid(input).map(Self::ById)
    }
}

/// Accepts only the hyphenated 36 character form.
pub fn parse_uuid(input: &str) -> Option<Uuid> {
    if input.len() != 36 {
        return None;
    }

    Uuid::try_parse(input).ok()
}
