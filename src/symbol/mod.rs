//! Symbol identity.
//!
//! A [`Symbol`] is identified by its uri alone. The structured parts (scheme,
//! package, descriptor chain) are parsed once and shared behind an `Arc`, so
//! symbols are cheap to clone into graph nodes, map keys and search results.

mod error;
mod uri;

pub use error::{SymbolParseError, SymbolResult};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

/// Package coordinates of a symbol. `.` marks an empty field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SymbolPackage {
    pub manager: String,
    pub name: String,
    pub version: String,
}

impl SymbolPackage {
    pub fn new(
        manager: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            manager: manager.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for SymbolPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.manager, self.name, self.version)
    }
}

/// Syntactic kind of a descriptor, encoded by its suffix in the uri.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    Namespace,
    Type,
    Term,
    Method,
    Meta,
    Macro,
    Parameter,
    TypeParameter,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolDescriptor {
    pub name: String,
    pub kind: DescriptorKind,
    /// Only methods carry one (`name(disambiguator).`).
    pub disambiguator: Option<String>,
}

impl SymbolDescriptor {
    pub fn new(name: impl Into<String>, kind: DescriptorKind) -> Self {
        Self {
            name: name.into(),
            kind,
            disambiguator: None,
        }
    }

    pub fn method(name: impl Into<String>, disambiguator: Option<String>) -> Self {
        Self {
            name: name.into(),
            kind: DescriptorKind::Method,
            disambiguator,
        }
    }

    /// The descriptor as it appears inside a uri.
    pub fn unparse(&self) -> String {
        let mut out = String::new();
        uri::push_descriptor(&mut out, self);
        out
    }
}

/// Semantic kind of a symbol, derived from its last descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Local,
    Module,
    Class,
    Method,
    Value,
    Meta,
    Macro,
    Parameter,
    TypeParameter,
}

impl From<DescriptorKind> for SymbolKind {
    fn from(kind: DescriptorKind) -> Self {
        match kind {
            DescriptorKind::Namespace => SymbolKind::Module,
            DescriptorKind::Type => SymbolKind::Class,
            DescriptorKind::Term => SymbolKind::Value,
            DescriptorKind::Method => SymbolKind::Method,
            DescriptorKind::Meta => SymbolKind::Meta,
            DescriptorKind::Macro => SymbolKind::Macro,
            DescriptorKind::Parameter => SymbolKind::Parameter,
            DescriptorKind::TypeParameter => SymbolKind::TypeParameter,
            DescriptorKind::Local => SymbolKind::Local,
        }
    }
}

#[derive(Debug)]
struct SymbolData {
    uri: String,
    scheme: String,
    package: SymbolPackage,
    descriptors: Vec<SymbolDescriptor>,
}

/// An immutable code symbol. Equality, ordering and hashing use the uri only.
#[derive(Clone)]
pub struct Symbol(Arc<SymbolData>);

impl Symbol {
    /// Parse a symbol uri.
    pub fn parse(uri: &str) -> SymbolResult<Self> {
        let parsed = uri::parse_uri(uri)?;
        Ok(Self(Arc::new(SymbolData {
            uri: uri.to_string(),
            scheme: parsed.scheme,
            package: parsed.package,
            descriptors: parsed.descriptors,
        })))
    }

    /// Build a symbol from its parts; the uri is the canonical serialization.
    pub fn from_parts(
        scheme: impl Into<String>,
        package: SymbolPackage,
        descriptors: Vec<SymbolDescriptor>,
    ) -> Self {
        let scheme = scheme.into();
        let uri = uri::format_uri(&scheme, &package, &descriptors);
        Self(Arc::new(SymbolData {
            uri,
            scheme,
            package,
            descriptors,
        }))
    }

    /// The uri this symbol was parsed from.
    ///
    /// Indexers may escape names that need no escaping (`` `Greeter`# ``), so
    /// the parsed text is kept verbatim; see [`canonical_uri`](Self::canonical_uri)
    /// for the normalized form.
    pub fn unparse(&self) -> String {
        self.0.uri.clone()
    }

    /// Serialize the structured parts with minimal escaping.
    pub fn canonical_uri(&self) -> String {
        uri::format_uri(&self.0.scheme, &self.0.package, &self.0.descriptors)
    }

    pub fn uri(&self) -> &str {
        &self.0.uri
    }

    pub fn scheme(&self) -> &str {
        &self.0.scheme
    }

    pub fn package(&self) -> &SymbolPackage {
        &self.0.package
    }

    pub fn descriptors(&self) -> &[SymbolDescriptor] {
        &self.0.descriptors
    }

    /// Descriptor names joined with `.`, e.g. `automata.core.agent.Agent.run`.
    pub fn dotpath(&self) -> String {
        self.0
            .descriptors
            .iter()
            .map(|d| d.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Name of the first descriptor.
    pub fn module_name(&self) -> &str {
        self.0
            .descriptors
            .first()
            .map(|d| d.name.as_str())
            .unwrap_or_default()
    }

    /// Name of the last descriptor.
    pub fn display_name(&self) -> &str {
        self.0
            .descriptors
            .last()
            .map(|d| d.name.as_str())
            .unwrap_or_default()
    }

    pub fn kind(&self) -> SymbolKind {
        if self.is_local() {
            return SymbolKind::Local;
        }
        self.0
            .descriptors
            .last()
            .map(|d| d.kind.into())
            .unwrap_or(SymbolKind::Local)
    }

    /// The enclosing symbol, or `None` for single-descriptor and local symbols.
    pub fn parent(&self) -> Option<Symbol> {
        if self.is_local() || self.0.descriptors.len() < 2 {
            return None;
        }
        let descriptors = self.0.descriptors[..self.0.descriptors.len() - 1].to_vec();
        Some(Self::from_parts(
            self.0.scheme.clone(),
            self.0.package.clone(),
            descriptors,
        ))
    }

    pub fn is_local(&self) -> bool {
        matches!(self.0.descriptors.first(), Some(d) if d.kind == DescriptorKind::Local)
    }

    pub fn is_meta(&self) -> bool {
        matches!(self.0.descriptors.last(), Some(d) if d.kind == DescriptorKind::Meta)
    }

    pub fn is_parameter(&self) -> bool {
        matches!(
            self.0.descriptors.last(),
            Some(d) if matches!(d.kind, DescriptorKind::Parameter | DescriptorKind::TypeParameter)
        )
    }

    /// Symbols living in protobuf-generated modules (`*_pb2`, `*_pb2_grpc`).
    pub fn is_generated(&self) -> bool {
        let module = self.module_name();
        module.ends_with("pb2") || module.ends_with("pb2_grpc")
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.uri == other.0.uri
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.uri.hash(state);
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.uri.cmp(&other.0.uri)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Symbol").field(&self.0.uri).finish()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.uri)
    }
}

impl FromStr for Symbol {
    type Err = SymbolParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::parse(s)
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.uri())
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let uri = String::deserialize(deserializer)?;
        Symbol::parse(&uri).map_err(serde::de::Error::custom)
    }
}
