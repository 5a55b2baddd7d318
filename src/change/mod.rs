//! Executable, undoable changes
//!
//! A [`Change`] is a tree of atomic workspace operations. Performing a change
//! returns its inverse, so undo is just another change. Composite changes
//! roll back the children they already performed when a later child fails or
//! the operation is cancelled, leaving the workspace in its prior state.
//!
//! # Module Organization
//!
//! - [`executor`] - Cancellation tokens and batched execution
//! - [`history`] - Undo/redo stacks persisted as JSON

pub mod executor;
pub mod history;

pub use executor::{execute, CancellationToken, ExecutionOutcome};
pub use history::{ChangeHistory, HistoryEntry};

use crate::error::{ReorgError, Result};
use crate::model::{ResourcePath, ResourceSnapshot, Workspace};
use crate::source::{apply_edits, fingerprint, TextEdit};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Change {
	Composite {
		name: String,
		children: Vec<Change>,
	},
	CreateFolder {
		path: ResourcePath,
	},
	CreateFile {
		path: ResourcePath,
		content: String,
		#[serde(default)]
		read_only: bool,
	},
	MoveResource {
		source: ResourcePath,
		destination: ResourcePath,
	},
	CopyResource {
		source: ResourcePath,
		destination: ResourcePath,
	},
	DeleteResource {
		path: ResourcePath,
	},
	RestoreResources {
		nodes: ResourceSnapshot,
	},
	/// Text edits against content whose fingerprint must still match
	EditSource {
		path: ResourcePath,
		edits: Vec<TextEdit>,
		fingerprint: u64,
		description: String,
	},
	AddSourceRoot {
		project: String,
		root: String,
		index: usize,
	},
	RemoveSourceRoot {
		project: String,
		root: String,
	},
	/// Change contributed by a participant; its failures are reported as participant errors
	Participant {
		participant: String,
		change: Box<Change>,
	},
}

impl Change {
	pub fn composite(name: impl Into<String>, children: Vec<Change>) -> Self {
		Change::Composite { name: name.into(), children }
	}

	pub fn empty(name: impl Into<String>) -> Self {
		Change::composite(name, Vec::new())
	}

	/// Edit change pinned to the current text of the file
	pub fn edit(path: ResourcePath, base: &str, edits: Vec<TextEdit>, description: impl Into<String>) -> Self {
		Change::EditSource { path, edits, fingerprint: fingerprint(base), description: description.into() }
	}

	pub fn name(&self) -> String {
		match self {
			Change::Composite { name, .. } => name.clone(),
			Change::CreateFolder { path } => format!("Create folder {path}"),
			Change::CreateFile { path, .. } => format!("Create file {path}"),
			Change::MoveResource { source, destination } => format!("Move {source} to {destination}"),
			Change::CopyResource { source, destination } => format!("Copy {source} to {destination}"),
			Change::DeleteResource { path } => format!("Delete {path}"),
			Change::RestoreResources { nodes } => match nodes.first() {
				Some((path, _)) => format!("Restore {path}"),
				None => "Restore resources".to_string(),
			},
			Change::EditSource { description, .. } => description.clone(),
			Change::AddSourceRoot { project, root, .. } => format!("Add source root '{root}' to {project}"),
			Change::RemoveSourceRoot { project, root } => {
				format!("Remove source root '{root}' from {project}")
			}
			Change::Participant { participant, change } => format!("{} ({participant})", change.name()),
		}
	}

	/// Number of atomic operations in the tree
	pub fn leaf_count(&self) -> usize {
		match self {
			Change::Composite { children, .. } => children.iter().map(Change::leaf_count).sum(),
			Change::Participant { change, .. } => change.leaf_count(),
			_ => 1,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.leaf_count() == 0
	}

	/// Depth-first atomic operations, participants unwrapped
	pub fn leaves(&self) -> Vec<&Change> {
		let mut leaves = Vec::new();
		self.collect_leaves(&mut leaves);
		leaves
	}

	fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Change>) {
		match self {
			Change::Composite { children, .. } => {
				for child in children {
					child.collect_leaves(out);
				}
			}
			Change::Participant { change, .. } => change.collect_leaves(out),
			leaf => out.push(leaf),
		}
	}

	/// Apply the change and return its inverse
	pub fn perform(&self, ws: &mut Workspace, token: &CancellationToken) -> Result<Change> {
		match self {
			Change::Composite { name, children } => {
				let mut undos: Vec<Change> = Vec::with_capacity(children.len());
				for child in children {
					if token.is_cancelled() {
						debug!("Cancelled during '{}' after {} steps", name, undos.len());
						rollback(ws, undos);
						return Err(ReorgError::Cancelled);
					}
					match child.perform(ws, token) {
						Ok(undo) => undos.push(undo),
						Err(e) => {
							warn!("'{}' failed: {}; rolling back {} steps", child.name(), e, undos.len());
							rollback(ws, undos);
							return Err(e);
						}
					}
				}
				undos.reverse();
				Ok(Change::composite(format!("Undo {name}"), undos))
			}
			Change::CreateFolder { path } => {
				if ws.is_container(path) {
					return Ok(Change::empty(format!("Undo create folder {path}")));
				}
				let mut first_missing = path.clone();
				while let Some(parent) = first_missing.parent() {
					if ws.contains(&parent) || parent.is_root() {
						break;
					}
					first_missing = parent;
				}
				ws.create_folder(path)?;
				Ok(Change::DeleteResource { path: first_missing })
			}
			Change::CreateFile { path, content, read_only } => {
				ws.create_file(path, content.clone())?;
				if *read_only {
					ws.set_read_only(path, true)?;
				}
				Ok(Change::DeleteResource { path: path.clone() })
			}
			Change::MoveResource { source, destination } => {
				ws.move_resource(source, destination)?;
				Ok(Change::MoveResource { source: destination.clone(), destination: source.clone() })
			}
			Change::CopyResource { source, destination } => {
				ws.copy_resource(source, destination)?;
				Ok(Change::DeleteResource { path: destination.clone() })
			}
			Change::DeleteResource { path } => {
				let nodes = ws.delete(path)?;
				Ok(Change::RestoreResources { nodes })
			}
			Change::RestoreResources { nodes } => {
				ws.restore(nodes)?;
				let tops: Vec<Change> = nodes
					.iter()
					.filter(|(path, _)| {
						path.parent().map_or(true, |parent| !nodes.iter().any(|(p, _)| *p == parent))
					})
					.map(|(path, _)| Change::DeleteResource { path: path.clone() })
					.collect();
				Ok(match tops.len() {
					1 => tops.into_iter().next().unwrap_or_else(|| Change::empty("Undo restore")),
					_ => Change::composite("Undo restore", tops),
				})
			}
			Change::EditSource { path, edits, fingerprint: expected, description } => {
				let current = ws.content(path)?;
				let actual = fingerprint(current);
				if actual != *expected {
					return Err(ReorgError::StaleModel { path: path.to_string(), expected: *expected, actual });
				}
				let (updated, undo_edits) = apply_edits(current, edits)?;
				let new_fingerprint = fingerprint(&updated);
				ws.set_content(path, updated)?;
				Ok(Change::EditSource {
					path: path.clone(),
					edits: undo_edits,
					fingerprint: new_fingerprint,
					description: format!("Undo {description}"),
				})
			}
			Change::AddSourceRoot { project, root, index } => {
				ws.insert_source_root(project, root, *index)?;
				Ok(Change::RemoveSourceRoot { project: project.clone(), root: root.clone() })
			}
			Change::RemoveSourceRoot { project, root } => {
				let index = ws.remove_source_root(project, root)?;
				Ok(Change::AddSourceRoot { project: project.clone(), root: root.clone(), index })
			}
			Change::Participant { participant, change } => match change.perform(ws, token) {
				Ok(undo) => Ok(Change::Participant { participant: participant.clone(), change: Box::new(undo) }),
				Err(ReorgError::Cancelled) => Err(ReorgError::Cancelled),
				Err(e) => Err(ReorgError::participant(participant, change.name(), &e.to_string())),
			},
		}
	}
}

/// Undo already performed steps, newest first; rollback itself is not cancellable
fn rollback(ws: &mut Workspace, undos: Vec<Change>) {
	let token = CancellationToken::new();
	for undo in undos.into_iter().rev() {
		if let Err(e) = undo.perform(ws, &token) {
			warn!("Rollback step '{}' failed: {}", undo.name(), e);
		}
	}
}
