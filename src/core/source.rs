//! Declaration sources.
//!
//! The engine never talks to the host package manager directly. It sees a
//! root package, an ordered list of dependency packages and the root's
//! policy on which dependencies may declare libraries.

use serde_json::Value;

/// A package together with the raw library declarations in its manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclaringPackage {
    /// Package name
    pub name: String,

    /// `(library name, raw declaration)` pairs in declared order
    pub libraries: Vec<(String, Value)>,
}

impl DeclaringPackage {
    pub fn new(name: impl Into<String>) -> Self {
        DeclaringPackage {
            name: name.into(),
            libraries: Vec::new(),
        }
    }

    /// Add a raw declaration.
    pub fn declare(mut self, library: impl Into<String>, declaration: Value) -> Self {
        self.libraries.push((library.into(), declaration));
        self
    }

    pub fn has_libraries(&self) -> bool {
        !self.libraries.is_empty()
    }
}

/// Which dependency packages may contribute library declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DependencyPolicy {
    /// Only the root package declares libraries
    #[default]
    Disabled,

    /// Every installed package may declare libraries
    All,

    /// Only the named packages may declare libraries
    Only(Vec<String>),
}

impl DependencyPolicy {
    /// Read the policy from the root manifest's `extra` value.
    ///
    /// `true` allows all packages and a list of strings allows those
    /// packages. Anything else, including an empty list, disables
    /// dependency declarations.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(true)) => DependencyPolicy::All,
            Some(Value::Array(names)) if !names.is_empty() => DependencyPolicy::Only(
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => DependencyPolicy::Disabled,
        }
    }

    /// Check whether a package is allowed to declare libraries.
    pub fn allows(&self, package: &str) -> bool {
        match self {
            DependencyPolicy::Disabled => false,
            DependencyPolicy::All => true,
            DependencyPolicy::Only(names) => names.iter().any(|n| n == package),
        }
    }
}

/// The package graph the host exposes to the engine.
pub trait PackageGraph {
    /// The root package. Its declarations always take precedence.
    fn root_package(&self) -> &DeclaringPackage;

    /// Installed dependency packages in the host's enumeration order.
    fn dependency_packages(&self) -> &[DeclaringPackage];

    /// The root's allow-list for dependency declarations.
    fn dependency_policy(&self) -> &DependencyPolicy;
}

/// Packages to consult, in processing order.
///
/// The root package comes first, followed by every allowed dependency
/// that declares at least one library.
pub fn declaration_sources(graph: &dyn PackageGraph) -> Vec<&DeclaringPackage> {
    let policy = graph.dependency_policy();

    std::iter::once(graph.root_package())
        .chain(
            graph
                .dependency_packages()
                .iter()
                .filter(|pkg| policy.allows(&pkg.name) && pkg.has_libraries()),
        )
        .collect()
}

/// An in-memory package graph.
#[derive(Debug, Clone, Default)]
pub struct StaticGraph {
    pub root: DeclaringPackage,
    pub dependencies: Vec<DeclaringPackage>,
    pub policy: DependencyPolicy,
}

impl StaticGraph {
    pub fn new(root: DeclaringPackage) -> Self {
        StaticGraph {
            root,
            dependencies: Vec::new(),
            policy: DependencyPolicy::Disabled,
        }
    }

    pub fn with_dependency(mut self, package: DeclaringPackage) -> Self {
        self.dependencies.push(package);
        self
    }

    pub fn with_policy(mut self, policy: DependencyPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl PackageGraph for StaticGraph {
    fn root_package(&self) -> &DeclaringPackage {
        &self.root
    }

    fn dependency_packages(&self) -> &[DeclaringPackage] {
        &self.dependencies
    }

    fn dependency_policy(&self) -> &DependencyPolicy {
        &self.policy
    }
}
