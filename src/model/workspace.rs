//! In-memory workspace: resources, project descriptors and change batches

use super::element::{PackageRef, UnitRef};
use super::path::ResourcePath;
use crate::config::{ComplianceLevel, ReorgConfig};
use crate::error::{ReorgError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
	Project,
	Folder,
	File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
	pub kind: NodeKind,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub content: String,
	#[serde(default)]
	pub read_only: bool,
}

impl ResourceNode {
	pub fn folder() -> Self {
		Self { kind: NodeKind::Folder, content: String::new(), read_only: false }
	}

	pub fn file(content: impl Into<String>) -> Self {
		Self { kind: NodeKind::File, content: content.into(), read_only: false }
	}

	pub fn is_container(&self) -> bool {
		matches!(self.kind, NodeKind::Project | NodeKind::Folder)
	}
}

/// Per-project settings kept in the workspace descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
	pub name: String,
	/// Project-relative folders; `""` is the project folder itself
	#[serde(default)]
	pub source_roots: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub compliance: Option<ComplianceLevel>,
}

impl ProjectDescriptor {
	pub fn new(name: &str) -> Self {
		Self { name: name.to_string(), source_roots: Vec::new(), compliance: None }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaKind {
	Added,
	Removed,
	Changed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDelta {
	pub path: ResourcePath,
	pub kind: DeltaKind,
}

/// Everything that changed during one workspace operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDeltaBatch {
	pub deltas: Vec<ResourceDelta>,
}

impl ResourceDeltaBatch {
	pub fn is_empty(&self) -> bool {
		self.deltas.is_empty()
	}

	pub fn len(&self) -> usize {
		self.deltas.len()
	}

	pub fn kind_of(&self, path: &ResourcePath) -> Option<DeltaKind> {
		self.deltas.iter().find(|d| &d.path == path).map(|d| d.kind)
	}

	/// Fold another delta in; opposite changes to the same path cancel out
	fn record(&mut self, path: ResourcePath, kind: DeltaKind) {
		let Some(index) = self.deltas.iter().position(|d| d.path == path) else {
			self.deltas.push(ResourceDelta { path, kind });
			return;
		};
		let merged = match (self.deltas[index].kind, kind) {
			(DeltaKind::Added, DeltaKind::Removed) => None,
			(DeltaKind::Added, _) => Some(DeltaKind::Added),
			(DeltaKind::Removed, DeltaKind::Added) => Some(DeltaKind::Changed),
			(DeltaKind::Removed, _) => Some(DeltaKind::Removed),
			(DeltaKind::Changed, DeltaKind::Removed) => Some(DeltaKind::Removed),
			(DeltaKind::Changed, _) => Some(DeltaKind::Changed),
		};
		match merged {
			Some(kind) => self.deltas[index].kind = kind,
			None => {
				self.deltas.remove(index);
			}
		}
	}
}

/// Receives one batch per top-level workspace operation
pub trait ResourceChangeListener: Send {
	fn resources_changed(&mut self, batch: &ResourceDeltaBatch);
}

/// Listener that keeps every batch it sees; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct BatchRecorder {
	batches: Arc<Mutex<Vec<ResourceDeltaBatch>>>,
}

impl BatchRecorder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn batches(&self) -> Vec<ResourceDeltaBatch> {
		self.batches.lock().map(|b| b.clone()).unwrap_or_default()
	}

	pub fn take(&self) -> Vec<ResourceDeltaBatch> {
		self.batches.lock().map(|mut b| std::mem::take(&mut *b)).unwrap_or_default()
	}
}

impl ResourceChangeListener for BatchRecorder {
	fn resources_changed(&mut self, batch: &ResourceDeltaBatch) {
		if let Ok(mut batches) = self.batches.lock() {
			batches.push(batch.clone());
		}
	}
}

/// Snapshot of a removed subtree, parents before children
pub type ResourceSnapshot = Vec<(ResourcePath, ResourceNode)>;

/// The resource tree the reorg engine works on
pub struct Workspace {
	pub(crate) nodes: BTreeMap<ResourcePath, ResourceNode>,
	pub(crate) projects: BTreeMap<String, ProjectDescriptor>,
	pub(crate) config: ReorgConfig,
	listeners: Vec<Box<dyn ResourceChangeListener>>,
	batch_depth: usize,
	pending: ResourceDeltaBatch,
}

impl Default for Workspace {
	fn default() -> Self {
		Self::new(ReorgConfig::default())
	}
}

impl std::fmt::Debug for Workspace {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Workspace")
			.field("nodes", &self.nodes.len())
			.field("projects", &self.projects.keys().collect::<Vec<_>>())
			.field("listeners", &self.listeners.len())
			.finish()
	}
}

impl Workspace {
	pub fn new(config: ReorgConfig) -> Self {
		Self {
			nodes: BTreeMap::new(),
			projects: BTreeMap::new(),
			config,
			listeners: Vec::new(),
			batch_depth: 0,
			pending: ResourceDeltaBatch::default(),
		}
	}

	pub fn config(&self) -> &ReorgConfig {
		&self.config
	}

	pub fn add_listener(&mut self, listener: impl ResourceChangeListener + 'static) {
		self.listeners.push(Box::new(listener));
	}

	/// Run `operation` as one batch: listeners see a single delta for all of it
	pub fn run_batch<T>(&mut self, operation: impl FnOnce(&mut Workspace) -> T) -> T {
		self.batch_depth += 1;
		let result = operation(self);
		self.batch_depth -= 1;
		if self.batch_depth == 0 {
			self.flush();
		}
		result
	}

	fn record(&mut self, path: ResourcePath, kind: DeltaKind) {
		self.pending.record(path, kind);
		if self.batch_depth == 0 {
			self.flush();
		}
	}

	fn flush(&mut self) {
		if self.pending.is_empty() {
			return;
		}
		let batch = std::mem::take(&mut self.pending);
		debug!("Notifying {} listeners of {} resource deltas", self.listeners.len(), batch.len());
		for listener in &mut self.listeners {
			listener.resources_changed(&batch);
		}
	}

	// --- resources ---

	pub fn node(&self, path: &ResourcePath) -> Option<&ResourceNode> {
		self.nodes.get(path)
	}

	pub fn contains(&self, path: &ResourcePath) -> bool {
		self.nodes.contains_key(path)
	}

	pub fn is_file(&self, path: &ResourcePath) -> bool {
		self.nodes.get(path).is_some_and(|n| n.kind == NodeKind::File)
	}

	pub fn is_folder(&self, path: &ResourcePath) -> bool {
		self.nodes.get(path).is_some_and(|n| n.kind == NodeKind::Folder)
	}

	pub fn is_container(&self, path: &ResourcePath) -> bool {
		self.nodes.get(path).is_some_and(ResourceNode::is_container)
	}

	pub fn content(&self, path: &ResourcePath) -> Result<&str> {
		match self.nodes.get(path) {
			Some(node) if node.kind == NodeKind::File => Ok(&node.content),
			_ => Err(ReorgError::resource_not_found(path)),
		}
	}

	/// Direct children of a container, in path order
	pub fn child_paths(&self, path: &ResourcePath) -> Vec<ResourcePath> {
		self.nodes
			.range(path.clone()..)
			.skip_while(|(p, _)| *p == path)
			.take_while(|(p, _)| p.starts_with(path))
			.filter(|(p, _)| p.len() == path.len() + 1)
			.map(|(p, _)| p.clone())
			.collect()
	}

	/// The subtree rooted at `path`, parents first
	pub fn subtree(&self, path: &ResourcePath) -> ResourceSnapshot {
		self.nodes
			.range(path.clone()..)
			.take_while(|(p, _)| p.starts_with(path))
			.map(|(p, n)| (p.clone(), n.clone()))
			.collect()
	}

	fn require_container(&self, path: &ResourcePath) -> Result<()> {
		if self.is_container(path) {
			Ok(())
		} else {
			Err(ReorgError::resource_not_found(path))
		}
	}

	fn require_absent(&self, path: &ResourcePath) -> Result<()> {
		if self.nodes.contains_key(path) {
			Err(ReorgError::resource_exists(path))
		} else {
			Ok(())
		}
	}

	pub fn create_project(&mut self, name: &str) -> Result<ResourcePath> {
		let path = ResourcePath::project(name);
		self.require_absent(&path)?;
		self.nodes.insert(
			path.clone(),
			ResourceNode { kind: NodeKind::Project, content: String::new(), read_only: false },
		);
		self.projects.entry(name.to_string()).or_insert_with(|| ProjectDescriptor::new(name));
		self.record(path.clone(), DeltaKind::Added);
		Ok(path)
	}

	/// Create a folder and any missing ancestors below the project
	pub fn create_folder(&mut self, path: &ResourcePath) -> Result<()> {
		if path.len() < 2 {
			return Err(ReorgError::invalid_operation(
				"create folder",
				&format!("{path} is not below a project"),
			));
		}
		self.require_absent(path)?;
		let project = ResourcePath::project(path.project_name().unwrap_or_default());
		self.require_container(&project)?;

		let mut current = project;
		for segment in &path.segments()[1..] {
			current = current.join(segment);
			match self.nodes.get(&current) {
				Some(node) if node.is_container() => continue,
				Some(_) => return Err(ReorgError::resource_exists(&current)),
				None => {
					self.nodes.insert(current.clone(), ResourceNode::folder());
					self.record(current.clone(), DeltaKind::Added);
				}
			}
		}
		Ok(())
	}

	pub fn create_file(&mut self, path: &ResourcePath, content: impl Into<String>) -> Result<()> {
		let parent = path.parent().ok_or_else(|| ReorgError::invalid_path(&path.to_string()))?;
		self.require_container(&parent)?;
		self.require_absent(path)?;
		self.nodes.insert(path.clone(), ResourceNode::file(content));
		self.record(path.clone(), DeltaKind::Added);
		Ok(())
	}

	/// Replace a file's content, returning the previous content
	pub fn set_content(&mut self, path: &ResourcePath, content: String) -> Result<String> {
		let node = match self.nodes.get_mut(path) {
			Some(node) if node.kind == NodeKind::File => node,
			_ => return Err(ReorgError::resource_not_found(path)),
		};
		let previous = std::mem::replace(&mut node.content, content);
		self.record(path.clone(), DeltaKind::Changed);
		Ok(previous)
	}

	pub fn set_read_only(&mut self, path: &ResourcePath, read_only: bool) -> Result<()> {
		let node = self.nodes.get_mut(path).ok_or_else(|| ReorgError::resource_not_found(path))?;
		node.read_only = read_only;
		Ok(())
	}

	/// Remove a resource and everything below it
	pub fn delete(&mut self, path: &ResourcePath) -> Result<ResourceSnapshot> {
		if path.is_root() || !self.nodes.contains_key(path) {
			return Err(ReorgError::resource_not_found(path));
		}
		let snapshot = self.subtree(path);
		for (removed, _) in snapshot.iter().rev() {
			self.nodes.remove(removed);
			self.record(removed.clone(), DeltaKind::Removed);
		}
		if path.is_project() {
			if let Some(name) = path.project_name() {
				self.projects.remove(name);
			}
		}
		Ok(snapshot)
	}

	/// Put a previously removed subtree back
	pub fn restore(&mut self, snapshot: &[(ResourcePath, ResourceNode)]) -> Result<()> {
		for (path, _) in snapshot {
			self.require_absent(path)?;
		}
		for (path, node) in snapshot {
			if node.kind == NodeKind::Project {
				if let Some(name) = path.project_name() {
					self.projects.entry(name.to_string()).or_insert_with(|| ProjectDescriptor::new(name));
				}
			}
			self.nodes.insert(path.clone(), node.clone());
			self.record(path.clone(), DeltaKind::Added);
		}
		Ok(())
	}

	pub fn move_resource(&mut self, source: &ResourcePath, destination: &ResourcePath) -> Result<()> {
		self.check_transfer(source, destination)?;
		let snapshot = self.delete(source)?;
		for (path, node) in snapshot {
			if let Some(target) = path.rebase(source, destination) {
				self.nodes.insert(target.clone(), node);
				self.record(target, DeltaKind::Added);
			}
		}
		Ok(())
	}

	pub fn copy_resource(&mut self, source: &ResourcePath, destination: &ResourcePath) -> Result<()> {
		self.check_transfer(source, destination)?;
		for (path, node) in self.subtree(source) {
			if let Some(target) = path.rebase(source, destination) {
				self.nodes.insert(target.clone(), node);
				self.record(target, DeltaKind::Added);
			}
		}
		Ok(())
	}

	fn check_transfer(&self, source: &ResourcePath, destination: &ResourcePath) -> Result<()> {
		if source.len() < 2 || !self.nodes.contains_key(source) {
			return Err(ReorgError::resource_not_found(source));
		}
		if destination.starts_with(source) {
			return Err(ReorgError::invalid_operation(
				"transfer",
				&format!("{destination} lies inside {source}"),
			));
		}
		let parent = destination.parent().ok_or_else(|| ReorgError::invalid_path(&destination.to_string()))?;
		self.require_container(&parent)?;
		self.require_absent(destination)
	}

	// --- projects ---

	pub fn project(&self, name: &str) -> Option<&ProjectDescriptor> {
		self.projects.get(name)
	}

	pub fn projects(&self) -> impl Iterator<Item = &ProjectDescriptor> {
		self.projects.values()
	}

	pub fn set_compliance(&mut self, project: &str, level: ComplianceLevel) -> Result<()> {
		let descriptor = self
			.projects
			.get_mut(project)
			.ok_or_else(|| ReorgError::resource_not_found(ResourcePath::project(project)))?;
		descriptor.compliance = Some(level);
		Ok(())
	}

	pub fn compliance(&self, project: &str) -> ComplianceLevel {
		self.projects
			.get(project)
			.and_then(|p| p.compliance)
			.unwrap_or(self.config.default_compliance)
	}

	/// Register a source root, creating its folder; returns the root path
	pub fn add_source_root(&mut self, project: &str, relative: &str) -> Result<ResourcePath> {
		let root = ResourcePath::project(project).join_relative(relative);
		let index = self.projects.get(project).map(|p| p.source_roots.len()).unwrap_or(0);
		self.insert_source_root(project, relative, index)?;
		Ok(root)
	}

	/// Insert a source root entry at `index`; the folder is created if missing
	pub fn insert_source_root(&mut self, project: &str, relative: &str, index: usize) -> Result<()> {
		let root = ResourcePath::project(project).join_relative(relative);
		if !root.is_project() && !self.contains(&root) {
			self.create_folder(&root)?;
		}
		let descriptor = self
			.projects
			.get_mut(project)
			.ok_or_else(|| ReorgError::resource_not_found(ResourcePath::project(project)))?;
		let relative = relative.trim_matches('/').to_string();
		if descriptor.source_roots.contains(&relative) {
			return Err(ReorgError::resource_exists(&root));
		}
		let index = index.min(descriptor.source_roots.len());
		descriptor.source_roots.insert(index, relative);
		self.record(ResourcePath::project(project), DeltaKind::Changed);
		Ok(())
	}

	/// Drop a source root entry, returning its former index; the folder is untouched
	pub fn remove_source_root(&mut self, project: &str, relative: &str) -> Result<usize> {
		let relative = relative.trim_matches('/');
		let descriptor = self
			.projects
			.get_mut(project)
			.ok_or_else(|| ReorgError::resource_not_found(ResourcePath::project(project)))?;
		let index = descriptor
			.source_roots
			.iter()
			.position(|r| r == relative)
			.ok_or_else(|| ReorgError::resource_not_found(ResourcePath::project(project).join_relative(relative)))?;
		descriptor.source_roots.remove(index);
		self.record(ResourcePath::project(project), DeltaKind::Changed);
		Ok(index)
	}

	/// Create a package folder chain below `root`
	pub fn create_package(&mut self, root: &ResourcePath, name: &str) -> Result<PackageRef> {
		let package = PackageRef::new(root.clone(), name);
		let folder = package.folder();
		if !self.contains(&folder) {
			self.create_folder(&folder)?;
		}
		Ok(package)
	}

	pub fn create_unit(&mut self, package: &PackageRef, name: &str, content: &str) -> Result<UnitRef> {
		let unit = UnitRef::new(package.clone(), name);
		self.create_file(&unit.file(), content)?;
		Ok(unit)
	}
}
