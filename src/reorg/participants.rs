//! Participants: extensions told about every element a reorg touches
//!
//! Participants are registered per element kind. Each affected element is
//! announced once, in declaration order, together with the arguments of the
//! operation. A participant may veto with a status or contribute a change that
//! runs inside the same undoable composite.

use crate::change::Change;
use crate::error::Result;
use crate::model::{Element, ElementKind, Workspace};
use crate::status::RefactoringStatus;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveArguments {
	pub destination: Element,
	pub update_references: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyArguments {
	pub destination: Element,
	/// Name of the copy when it differs from the original
	pub new_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteArguments {
	pub delete_sub_packages: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum ParticipantArguments {
	Move(MoveArguments),
	Copy(CopyArguments),
	Delete(DeleteArguments),
}

/// One element handed to participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffectedElement {
	pub element: Element,
	pub arguments: ParticipantArguments,
}

pub trait ReorgParticipant: Send + Sync {
	fn name(&self) -> &str;

	fn check_conditions(
		&self, _ws: &Workspace, _element: &Element, _arguments: &ParticipantArguments,
	) -> RefactoringStatus {
		RefactoringStatus::new()
	}

	/// Extra work to run with the reorg; `None` when there is nothing to do
	fn create_change(
		&self, ws: &Workspace, element: &Element, arguments: &ParticipantArguments,
	) -> Result<Option<Change>>;
}

#[derive(Default, Clone)]
pub struct ParticipantRegistry {
	participants: HashMap<ElementKind, Vec<Arc<dyn ReorgParticipant>>>,
}

impl fmt::Debug for ParticipantRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut kinds: Vec<_> = self
			.participants
			.iter()
			.map(|(kind, list)| (kind, list.iter().map(|p| p.name().to_string()).collect::<Vec<_>>()))
			.collect();
		kinds.sort_by_key(|(kind, _)| **kind);
		f.debug_struct("ParticipantRegistry").field("participants", &kinds).finish()
	}
}

impl ParticipantRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register_for(&mut self, kind: ElementKind, participant: Arc<dyn ReorgParticipant>) {
		self.participants.entry(kind).or_default().push(participant);
	}

	/// Register one participant for several kinds
	pub fn register(&mut self, kinds: &[ElementKind], participant: Arc<dyn ReorgParticipant>) {
		for kind in kinds {
			self.register_for(*kind, participant.clone());
		}
	}

	pub fn participants_for(&self, kind: ElementKind) -> &[Arc<dyn ReorgParticipant>] {
		self.participants.get(&kind).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn is_empty(&self) -> bool {
		self.participants.values().all(Vec::is_empty)
	}
}

/// Remove repeated elements, keeping the first occurrence
pub(crate) fn dedup_affected(affected: Vec<AffectedElement>) -> Vec<AffectedElement> {
	let mut unique: Vec<AffectedElement> = Vec::with_capacity(affected.len());
	for entry in affected {
		if !unique.iter().any(|u| u.element == entry.element) {
			unique.push(entry);
		}
	}
	unique
}

/// Ask every registered participant about every affected element
///
/// A participant that fails to produce its change is reported as an ERROR
/// against the element; the others still run.
pub(crate) fn dispatch(
	ws: &Workspace, registry: &ParticipantRegistry, affected: &[AffectedElement],
) -> (RefactoringStatus, Vec<Change>) {
	let mut status = RefactoringStatus::new();
	let mut changes = Vec::new();

	for entry in affected {
		for participant in registry.participants_for(entry.element.kind()) {
			status.merge(participant.check_conditions(ws, &entry.element, &entry.arguments));
			match participant.create_change(ws, &entry.element, &entry.arguments) {
				Ok(Some(change)) => {
					debug!("Participant '{}' contributed '{}'", participant.name(), change.name());
					changes.push(Change::Participant {
						participant: participant.name().to_string(),
						change: Box::new(change),
					});
				}
				Ok(None) => {}
				Err(e) => {
					warn!("Participant '{}' failed on {}: {}", participant.name(), entry.element, e);
					status.add_error_for(
						format!("Participant '{}' failed: {}", participant.name(), e),
						&entry.element,
					);
				}
			}
		}
	}

	(status, changes)
}
