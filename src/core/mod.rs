//! Core data structures for libinstall.
//!
//! This module contains the foundational types used throughout libinstall:
//! - Library declarations and canonical records
//! - Declaration sources and the package graph
//! - Composer manifests, projects and install layout

pub mod layout;
pub mod library;
pub mod manifest;
pub mod project;
pub mod source;

pub use layout::InstallLayout;
pub use library::{DeclarationError, DistributionType, LibraryRecord, RawDeclaration};
pub use manifest::{Manifest, MANIFEST_NAME};
pub use project::Project;
pub use source::{declaration_sources, DeclaringPackage, DependencyPolicy, PackageGraph, StaticGraph};
