//! Workspace and element model
//!
//! Two hierarchies live side by side: the resource tree (projects, folders,
//! files) and the logical source tree (source roots, packages, source units
//! and their structural children). The logical tree is derived from the
//! resource tree and never stored separately.
//!
//! # Module Organization
//!
//! - [`path`] - Normalized workspace paths
//! - [`element`] - Element handles and kinds
//! - [`workspace`] - Resource storage, project descriptors and change batches
//! - [`logical`] - Logical queries: existence, parents, children, containment
//! - [`loader`] - Loading from and writing back to a directory

pub mod element;
pub mod loader;
pub mod logical;
pub mod path;
pub mod workspace;

pub use element::{
	Element, ElementKind, ImportRef, MemberKind, MemberRef, MemberSegment, PackageRef, UnitRef,
};
pub use loader::WorkspaceDescriptor;
pub use logical::is_valid_identifier;
pub use path::ResourcePath;
pub use workspace::{
	BatchRecorder, DeltaKind, NodeKind, ProjectDescriptor, ResourceChangeListener, ResourceDelta,
	ResourceDeltaBatch, ResourceNode, ResourceSnapshot, Workspace,
};
