//! Loading a workspace from a directory and writing changes back
//!
//! A workspace directory holds one sub-directory per project plus a
//! descriptor (`reorg.json` by default) listing the projects with their
//! source roots and compliance levels.

use super::path::ResourcePath;
use super::workspace::{DeltaKind, NodeKind, ProjectDescriptor, ResourceDeltaBatch, Workspace};
use crate::config::ReorgConfig;
use crate::error::{ReorgError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceDescriptor {
	pub projects: Vec<ProjectDescriptor>,
}

impl Workspace {
	pub fn descriptor(&self) -> WorkspaceDescriptor {
		WorkspaceDescriptor { projects: self.projects().cloned().collect() }
	}

	/// Read the descriptor and every project directory below `dir`
	pub fn load(dir: &Path, config: ReorgConfig) -> Result<Workspace> {
		config
			.validate()
			.map_err(|reason| ReorgError::configuration_error("config", &reason, "valid configuration", "invalid"))?;

		let descriptor_path = dir.join(&config.descriptor_file);
		let descriptor: WorkspaceDescriptor = serde_json::from_str(&fs::read_to_string(&descriptor_path)?)?;

		let mut workspace = Workspace::new(config);
		for project in &descriptor.projects {
			let project_dir = dir.join(&project.name);
			if !project_dir.is_dir() {
				return Err(ReorgError::filesystem_error(
					"load project",
					&project_dir.display().to_string(),
					"project directory is missing",
				));
			}
			workspace.create_project(&project.name)?;
			let base = ResourcePath::project(&project.name);

			for entry in WalkDir::new(&project_dir).min_depth(1).sort_by_file_name() {
				let entry = entry.map_err(|e| {
					ReorgError::filesystem_error("walk", &project_dir.display().to_string(), &e.to_string())
				})?;
				let relative = entry.path().strip_prefix(&project_dir).map_err(|e| {
					ReorgError::filesystem_error("walk", &entry.path().display().to_string(), &e.to_string())
				})?;
				let path = base.join_relative(&relative.to_string_lossy().replace('\\', "/"));

				if entry.file_type().is_dir() {
					workspace.create_folder(&path)?;
				} else if entry.file_type().is_file() {
					let bytes = fs::read(entry.path())?;
					let content = match String::from_utf8(bytes) {
						Ok(text) => text,
						Err(e) => {
							warn!("{} is not valid UTF-8, loading it lossily", entry.path().display());
							String::from_utf8_lossy(e.as_bytes()).into_owned()
						}
					};
					workspace.create_file(&path, content)?;
					if entry.metadata().map(|m| m.permissions().readonly()).unwrap_or(false) {
						workspace.set_read_only(&path, true)?;
					}
				}
			}

			for root in &project.source_roots {
				workspace.add_source_root(&project.name, root)?;
			}
			if let Some(level) = project.compliance {
				workspace.set_compliance(&project.name, level)?;
			}
			debug!("Loaded project {} with {} source roots", project.name, project.source_roots.len());
		}

		info!("Loaded workspace from {} ({} projects)", dir.display(), descriptor.projects.len());
		Ok(workspace)
	}

	pub fn save_descriptor(&self, dir: &Path) -> Result<()> {
		let text = serde_json::to_string_pretty(&self.descriptor())?;
		fs::write(dir.join(&self.config.descriptor_file), text)?;
		Ok(())
	}

	/// Mirror one change batch onto the directory: removals first, then additions
	pub fn write_back(&self, dir: &Path, batch: &ResourceDeltaBatch) -> Result<()> {
		let mut removed: Vec<&ResourcePath> = batch
			.deltas
			.iter()
			.filter(|d| d.kind == DeltaKind::Removed)
			.map(|d| &d.path)
			.collect();
		removed.sort_by_key(|p| std::cmp::Reverse(p.len()));
		for path in removed {
			let target = path.to_fs_path(dir);
			let result = if target.is_dir() { fs::remove_dir_all(&target) } else { fs::remove_file(&target) };
			match result {
				Ok(()) => {}
				Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
				Err(e) => return Err(e.into()),
			}
		}

		let mut written: Vec<&ResourcePath> = batch
			.deltas
			.iter()
			.filter(|d| d.kind != DeltaKind::Removed)
			.map(|d| &d.path)
			.collect();
		written.sort();
		for path in written {
			let Some(node) = self.node(path) else {
				continue;
			};
			let target = path.to_fs_path(dir);
			match node.kind {
				NodeKind::Project | NodeKind::Folder => fs::create_dir_all(&target)?,
				NodeKind::File => {
					if let Some(parent) = target.parent() {
						fs::create_dir_all(parent)?;
					}
					fs::write(&target, &node.content)?;
				}
			}
		}

		self.save_descriptor(dir)?;
		debug!("Wrote {} deltas back to {}", batch.len(), dir.display());
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn test_load_reads_descriptor_and_files() {
		let dir = TempDir::new().unwrap();
		fs::create_dir_all(dir.path().join("P/src/p")).unwrap();
		fs::write(dir.path().join("P/src/p/A.java"), "package p;\nclass A {}\n").unwrap();
		fs::write(
			dir.path().join("reorg.json"),
			r#"{"projects":[{"name":"P","source_roots":["src"],"compliance":"1.4"}]}"#,
		)
		.unwrap();

		let ws = Workspace::load(dir.path(), ReorgConfig::default()).unwrap();
		let file = ResourcePath::parse("/P/src/p/A.java").unwrap();
		assert!(ws.unit_for_file(&file).is_some());
		assert_eq!(ws.compliance("P").to_string(), "1.4");
	}

	#[test]
	fn test_missing_project_directory() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("reorg.json"), r#"{"projects":[{"name":"Gone"}]}"#).unwrap();
		let error = Workspace::load(dir.path(), ReorgConfig::default()).unwrap_err();
		assert_eq!(error.category(), "filesystem");
	}
}
