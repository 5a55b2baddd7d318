use super::executor::{execute, CancellationToken, ExecutionOutcome};
use super::Change;
use crate::error::Result;
use crate::model::Workspace;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
	pub id: Uuid,
	pub label: String,
	pub performed_at: DateTime<Utc>,
	/// Change that reverts the recorded operation
	pub undo: Change,
}

impl HistoryEntry {
	pub fn new(label: impl Into<String>, undo: Change) -> Self {
		Self { id: Uuid::new_v4(), label: label.into(), performed_at: Utc::now(), undo }
	}
}

/// Undo and redo stacks of executed changes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeHistory {
	undo_stack: Vec<HistoryEntry>,
	redo_stack: Vec<HistoryEntry>,
}

impl ChangeHistory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record a performed operation; clears the redo stack
	pub fn record(&mut self, label: impl Into<String>, undo: Change) -> Uuid {
		let entry = HistoryEntry::new(label, undo);
		let id = entry.id;
		self.undo_stack.push(entry);
		self.redo_stack.clear();
		id
	}

	pub fn peek_undo(&self) -> Option<&HistoryEntry> {
		self.undo_stack.last()
	}

	pub fn peek_redo(&self) -> Option<&HistoryEntry> {
		self.redo_stack.last()
	}

	pub fn len(&self) -> usize {
		self.undo_stack.len()
	}

	pub fn is_empty(&self) -> bool {
		self.undo_stack.is_empty()
	}

	/// Revert the latest operation; `None` if there is nothing to undo
	pub fn undo(&mut self, ws: &mut Workspace, token: &CancellationToken) -> Option<ExecutionOutcome> {
		let entry = self.undo_stack.pop()?;
		let outcome = execute(ws, &entry.undo, token);
		match &outcome.undo {
			Some(redo) => {
				debug!("Undid '{}' ({})", entry.label, entry.id);
				self.redo_stack.push(HistoryEntry::new(entry.label.clone(), redo.clone()));
			}
			// Keep the entry so a later attempt can retry it
			None => self.undo_stack.push(entry),
		}
		Some(outcome)
	}

	pub fn redo(&mut self, ws: &mut Workspace, token: &CancellationToken) -> Option<ExecutionOutcome> {
		let entry = self.redo_stack.pop()?;
		let outcome = execute(ws, &entry.undo, token);
		match &outcome.undo {
			Some(undo) => {
				debug!("Redid '{}' ({})", entry.label, entry.id);
				self.undo_stack.push(HistoryEntry::new(entry.label.clone(), undo.clone()));
			}
			None => self.redo_stack.push(entry),
		}
		Some(outcome)
	}

	pub fn load(path: &Path) -> Result<ChangeHistory> {
		if !path.exists() {
			return Ok(ChangeHistory::default());
		}
		Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
	}

	pub fn save(&self, path: &Path) -> Result<()> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}
		fs::write(path, serde_json::to_string_pretty(self)?)?;
		Ok(())
	}
}
