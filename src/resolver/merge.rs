//! Declaration merging.
//!
//! Sources are consulted root first, then dependencies in enumeration
//! order. The first declaration of a name wins; later ones are dropped
//! with a debug log. Every declaration is normalized regardless, so a
//! broken declaration fails the run even when it would lose.

use crate::core::library::{DeclarationError, RawDeclaration};
use crate::core::source::{declaration_sources, DeclaringPackage, PackageGraph};
use crate::resolver::Resolution;

/// Merge one package's declarations into a resolution.
///
/// Returns how many libraries were added.
pub fn merge_into(
    resolution: &mut Resolution,
    package: &DeclaringPackage,
) -> Result<usize, DeclarationError> {
    let mut added = 0;

    for (library, value) in &package.libraries {
        let record = RawDeclaration::from_value(library, &package.name, value)?
            .normalize(library, &package.name)?;

        let url = record.url.clone();
        match resolution.try_insert(record) {
            Ok(()) => added += 1,
            Err(winner) => {
                tracing::debug!(
                    "Library `{}` from {} ({}) overrides the declaration from {} ({})",
                    library,
                    winner.package,
                    winner.url,
                    package.name,
                    url
                );
            }
        }
    }

    Ok(added)
}

/// Merge packages in the given order.
pub fn merge_declarations<'a, I>(packages: I) -> Result<Resolution, DeclarationError>
where
    I: IntoIterator<Item = &'a DeclaringPackage>,
{
    let mut resolution = Resolution::new();
    for package in packages {
        let added = merge_into(&mut resolution, package)?;
        if added > 0 {
            tracing::debug!("{} declares {} libraries", package.name, added);
        }
    }
    Ok(resolution)
}

/// Resolve every declaration reachable from a package graph.
pub fn resolve_declarations(graph: &dyn PackageGraph) -> Result<Resolution, DeclarationError> {
    merge_declarations(declaration_sources(graph))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::{DependencyPolicy, StaticGraph};
    use serde_json::json;

    #[test]
    fn test_root_wins_over_dependencies() {
        let graph = StaticGraph::new(
            DeclaringPackage::new("root").declare("chosen", json!("https://root/chosen-1.8.7.zip")),
        )
        .with_dependency(
            DeclaringPackage::new("acme/theme")
                .declare("chosen", json!("https://dep/chosen-1.0.0.zip"))
                .declare("slick", json!("https://dep/slick-1.8.1.zip")),
        )
        .with_policy(DependencyPolicy::All);

        let resolution = resolve_declarations(&graph).unwrap();

        assert_eq!(resolution.names().collect::<Vec<_>>(), vec!["chosen", "slick"]);
        let chosen = resolution.get("chosen").unwrap();
        assert_eq!(chosen.package, "root");
        assert_eq!(chosen.version, "1.8.7");
        assert_eq!(resolution.get("slick").unwrap().package, "acme/theme");
    }

    #[test]
    fn test_earlier_dependency_wins() {
        let graph = StaticGraph::new(DeclaringPackage::new("root"))
            .with_dependency(DeclaringPackage::new("b").declare("x", json!("https://b/x.zip")))
            .with_dependency(DeclaringPackage::new("a").declare("x", json!("https://a/x.zip")))
            .with_policy(DependencyPolicy::All);

        let resolution = resolve_declarations(&graph).unwrap();
        assert_eq!(resolution.get("x").unwrap().package, "b");
    }

    #[test]
    fn test_declared_order_is_kept() {
        let root = DeclaringPackage::new("root")
            .declare("zeta", json!("https://x/zeta.zip"))
            .declare("alpha", json!("https://x/alpha.zip"));

        let resolution = merge_declarations([&root]).unwrap();
        assert_eq!(resolution.names().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_disallowed_dependency_is_not_consulted() {
        let graph = StaticGraph::new(DeclaringPackage::new("root"))
            .with_dependency(DeclaringPackage::new("a").declare("x", json!("https://a/x.zip")))
            .with_policy(DependencyPolicy::Only(vec!["b".into()]));

        assert!(resolve_declarations(&graph).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_losing_declaration_still_fails() {
        let graph = StaticGraph::new(
            DeclaringPackage::new("root").declare("x", json!("https://root/x.zip")),
        )
        .with_dependency(DeclaringPackage::new("dep").declare("x", json!({ "version": "2" })))
        .with_policy(DependencyPolicy::All);

        let err = resolve_declarations(&graph).unwrap_err();
        match err {
            DeclarationError::MissingUrl { library, package } => {
                assert_eq!(library, "x");
                assert_eq!(package, "dep");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_merge_into_counts_added() {
        let mut resolution = Resolution::new();
        let first = DeclaringPackage::new("root")
            .declare("a", json!("https://x/a.zip"))
            .declare("b", json!("https://x/b.zip"));
        let second = DeclaringPackage::new("dep")
            .declare("b", json!("https://y/b.zip"))
            .declare("c", json!("https://y/c.zip"));

        assert_eq!(merge_into(&mut resolution, &first).unwrap(), 2);
        assert_eq!(merge_into(&mut resolution, &second).unwrap(), 1);
        assert_eq!(resolution.len(), 3);
    }
}
