//! Shared record types for the symdex index store.
//!
//! These are the plain values the indexer extracts from a Symfony project and
//! the DAOs in `symdex-db` persist. Every record carries the `path` of the
//! project file it was indexed from, which is the key used to purge stale
//! entries when that file changes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A service definition from the dependency-injection container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Service identifier (e.g. `"mailer"` or `"app.user_manager"`).
    pub id: String,
    /// Fully qualified PHP class, if the definition declares one.
    pub class_name: Option<String>,
    /// Whether the service is public (retrievable from the container).
    pub public: bool,
    /// Tag names attached to the definition.
    pub tags: Vec<String>,
    /// Project file the definition was indexed from.
    pub path: String,
}

/// A container parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter key (e.g. `"kernel.debug"`).
    pub key: String,
    /// Raw parameter value as written in the source file.
    pub value: String,
    /// Project file the parameter was indexed from.
    pub path: String,
}

/// A route definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Route name (e.g. `"blog_show"`).
    pub name: String,
    /// URL pattern (e.g. `"/blog/{slug}"`).
    pub pattern: String,
    /// Controller reference, if the route declares one.
    pub controller: Option<String>,
    /// Project file the route was indexed from.
    pub path: String,
}

/// The kind of an imported resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// A routing file import.
    Routing,
    /// A service container file import.
    Services,
    /// A translation catalogue.
    Translation,
    /// Anything the indexer could not classify.
    Other,
}

impl ResourceKind {
    /// Returns the storage label for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Routing => "routing",
            Self::Services => "services",
            Self::Translation => "translation",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`ResourceKind`] label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown resource kind: {0}")]
pub struct UnknownResourceKind(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownResourceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "routing" => Ok(Self::Routing),
            "services" => Ok(Self::Services),
            "translation" => Ok(Self::Translation),
            "other" => Ok(Self::Other),
            _ => Err(UnknownResourceKind(s.to_string())),
        }
    }
}

/// A resource imported by a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// The imported resource as referenced (e.g. `"@AppBundle/Resources/config/routing.yml"`).
    pub resource: String,
    /// What kind of resource this is.
    pub kind: ResourceKind,
    /// Route prefix applied to the import, for routing resources.
    pub prefix: Option<String>,
    /// Project file that declares the import.
    pub path: String,
}

/// A single translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransUnit {
    /// Translation key.
    pub name: String,
    /// Translated text.
    pub value: String,
    /// Language code (e.g. `"en"`, `"de_CH"`).
    pub language: String,
    /// Catalogue file the unit was indexed from.
    pub path: String,
}
