//! Move, Copy and Delete processors
//!
//! A processor owns one selection and walks it through
//! `Created → DestinationPending → DestinationValid → Executed | Cancelled`.
//! Destinations are re-validated on every proposal and again in the final
//! checks, where name conflicts and read-only resources are settled through
//! the query services.

use super::delete::create_delete_change;
use super::destination::{anchor_for, validate, Anchor, ReorgMode, ResolvedDestination};
use super::factory::{create_transfer_change, ReorgChange, Resolution, TransferRequest};
use super::participants::ParticipantRegistry;
use super::queries::{copy_name_suggestion, Confirmation, ConfirmationKind, Queries};
use super::selection::{classify, classify_for_delete, Selection, SelectionPolicy};
use crate::error::{ReorgError, Result};
use crate::model::{is_valid_identifier, Element, MemberKind, MemberRef, MemberSegment, PackageRef, ResourcePath, Workspace};
use crate::status::RefactoringStatus;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

const MAX_SUGGESTION_ATTEMPTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProcessorState {
	Created,
	DestinationPending,
	DestinationValid,
	Executed,
	Cancelled,
}

impl ProcessorState {
	pub fn is_terminal(self) -> bool {
		matches!(self, ProcessorState::Executed | ProcessorState::Cancelled)
	}
}

/// Common surface the engine drives
pub trait ReorgProcessor {
	fn label(&self) -> String;

	fn state(&self) -> ProcessorState;

	fn elements(&self) -> &[Element];

	/// Last checks before the change is computed; may ask the query services
	fn check_final_conditions(&mut self, ws: &Workspace, queries: &Queries<'_>) -> RefactoringStatus;

	fn create_change(&self, ws: &Workspace, registry: &ParticipantRegistry) -> Result<ReorgChange>;

	fn mark_executed(&mut self, cancelled: bool);

	/// Forget the destination; the processor cannot be used afterwards
	fn dispose(&mut self);
}

/// A slot an element would occupy at the destination
struct Slot {
	key: String,
	taken: bool,
}

#[derive(Debug, Clone)]
struct Transfer {
	mode: ReorgMode,
	selection: Selection,
	state: ProcessorState,
	target: Option<Element>,
	destination: Option<ResolvedDestination>,
	update_references: bool,
	resolutions: BTreeMap<Element, Resolution>,
}

impl Transfer {
	fn create(
		ws: &Workspace, resources: &[Option<ResourcePath>], elements: &[Option<Element>], mode: ReorgMode,
	) -> Option<Self> {
		let selection = classify(ws, resources, elements)?;
		debug!("Created {} processor for {} elements ({:?})", mode.verb(), selection.len(), selection.policy());
		Some(Self {
			mode,
			selection,
			state: ProcessorState::Created,
			target: None,
			destination: None,
			update_references: mode == ReorgMode::Move && ws.config().update_references,
			resolutions: BTreeMap::new(),
		})
	}

	fn set_destination(&mut self, ws: &Workspace, target: Option<Element>) -> RefactoringStatus {
		if self.state.is_terminal() {
			return RefactoringStatus::fatal("The operation has already finished");
		}
		self.resolutions.clear();
		let (status, destination) =
			validate(ws, &self.selection, target.as_ref(), self.mode, self.update_references);
		self.target = target;
		match destination {
			Some(destination) if !status.has_fatal_error() => {
				self.destination = Some(destination);
				self.state = ProcessorState::DestinationValid;
			}
			_ => {
				self.destination = None;
				self.state = ProcessorState::DestinationPending;
			}
		}
		debug!("Destination {:?} -> {:?} ({})", self.target, self.state, status.severity());
		status
	}

	fn cancel(&mut self, message: &str) -> RefactoringStatus {
		info!("{} cancelled: {}", self.mode.verb(), message);
		self.state = ProcessorState::Cancelled;
		RefactoringStatus::fatal(message)
	}

	fn check_final_conditions(&mut self, ws: &Workspace, queries: &Queries<'_>) -> RefactoringStatus {
		if self.state != ProcessorState::DestinationValid {
			return RefactoringStatus::fatal("No valid destination has been set");
		}
		let (mut status, destination) =
			validate(ws, &self.selection, self.target.as_ref(), self.mode, self.update_references);
		let destination = match destination {
			Some(destination) if !status.has_fatal_error() => destination,
			_ => {
				self.state = ProcessorState::DestinationPending;
				return status;
			}
		};
		self.destination = Some(destination.clone());
		self.resolutions.clear();

		if self.mode == ReorgMode::Move {
			let read_only: Vec<Element> =
				self.selection.elements().iter().filter(|e| ws.is_read_only(e)).cloned().collect();
			if !read_only.is_empty() {
				let query = queries.confirmations.create_confirm_query(ConfirmationKind::ReadOnly);
				for element in read_only {
					match query.confirm(&format!("'{element}' is read-only. Move it anyway?")) {
						Confirmation::Yes => status.add_warning(format!("Read-only '{}' will be moved", element.name())),
						Confirmation::No => self.selection.retain(|e| *e != element),
						Confirmation::Cancel => return self.cancel("Operation cancelled"),
					}
				}
			}
		}

		let mut claimed: Vec<String> = Vec::new();
		for element in self.selection.elements().to_vec() {
			let Some(original) = self.original_name(ws, &destination, &element) else {
				continue;
			};
			if self.merges_into_existing(ws, &destination, &element, &original) {
				continue;
			}
			let Some(slot) = self.slot(ws, &destination, &element, &original) else {
				continue;
			};
			if !slot.taken && !claimed.contains(&slot.key) {
				claimed.push(slot.key);
				continue;
			}

			let suggestion = self.suggestion(ws, &destination, &element, &original, &claimed);
			let query = queries.names.create_name_query(&element, &suggestion);
			let Some(new_name) = query.get_new_name() else {
				return self.cancel("Operation cancelled");
			};
			if let Err(message) = self.check_name(&element, &new_name) {
				return RefactoringStatus::fatal(message);
			}
			let Some(slot) = self.slot(ws, &destination, &element, &new_name) else {
				continue;
			};
			let renamed = (new_name != original).then(|| new_name.clone());

			if claimed.contains(&slot.key) {
				return RefactoringStatus::fatal(format!("Two elements would be named '{new_name}'"));
			}
			if slot.taken {
				let overwritable = self.mode == ReorgMode::Move
					&& matches!(self.selection.policy(), SelectionPolicy::ResourcesAndUnits | SelectionPolicy::SourceRoots);
				if !overwritable {
					return RefactoringStatus::fatal(format!("'{new_name}' already exists in the destination"));
				}
				let query = queries.confirmations.create_confirm_query(ConfirmationKind::Overwrite);
				match query.confirm(&format!("'{new_name}' already exists. Overwrite it?")) {
					Confirmation::Yes => {
						status.add_warning(format!("'{new_name}' will be overwritten"));
						self.resolutions.insert(element.clone(), Resolution { new_name: renamed, overwrite: true });
					}
					Confirmation::No => {
						self.selection.retain(|e| *e != element);
						continue;
					}
					Confirmation::Cancel => return self.cancel("Operation cancelled"),
				}
			} else {
				self.resolutions.insert(element.clone(), Resolution { new_name: renamed, overwrite: false });
			}
			claimed.push(slot.key);
		}

		if self.selection.is_empty() {
			return RefactoringStatus::fatal(format!("Nothing left to {}", self.mode.verb()));
		}
		debug!("Final checks for {}: {} ({} renamed)", self.mode.verb(), status.severity(), self.resolutions.len());
		status
	}

	/// Name the element would carry at the destination, if naming matters for it
	fn original_name(&self, ws: &Workspace, destination: &ResolvedDestination, element: &Element) -> Option<String> {
		match (destination, element) {
			(ResolvedDestination::PackageParent { .. }, Element::Package(package)) => {
				destination.package_name_for(package)
			}
			(ResolvedDestination::Structure { .. }, _) => match element.as_member() {
				Some(member) if !matches!(member.kind(), MemberKind::Method | MemberKind::Initializer) => {
					Some(member.name().to_string())
				}
				_ => None,
			},
			_ => ws.resource_of(element).and_then(|p| p.name().map(str::to_string)),
		}
	}

	/// A moved package may land in an existing one when none of its children collide
	fn merges_into_existing(
		&self, ws: &Workspace, destination: &ResolvedDestination, element: &Element, name: &str,
	) -> bool {
		let (ResolvedDestination::PackageParent { root, .. }, Element::Package(package)) = (destination, element) else {
			return false;
		};
		if self.mode != ReorgMode::Move {
			return false;
		}
		let target = PackageRef::new(root.clone(), name);
		if &target == package || !ws.package_exists(&target) {
			return false;
		}
		let folder = target.folder();
		let mut children: Vec<String> = ws.units(package).into_iter().map(|u| u.name).collect();
		for child in ws.non_package_children(package) {
			children.extend(child.name().map(str::to_string));
		}
		children.iter().all(|child| !ws.contains(&folder.join(child)))
	}

	fn slot(&self, ws: &Workspace, destination: &ResolvedDestination, element: &Element, name: &str) -> Option<Slot> {
		// A moved element never collides with itself
		let moving = self.mode == ReorgMode::Move;
		let own = if moving { ws.resource_of(element) } else { None };
		let resource_slot = |path: ResourcePath| {
			let taken = ws.contains(&path) && own.as_ref() != Some(&path);
			Slot { key: path.to_string(), taken }
		};
		match destination {
			ResolvedDestination::Folder { folder, .. } => Some(resource_slot(folder.join(name))),
			ResolvedDestination::Project { name: project } => Some(resource_slot(ResourcePath::project(project).join(name))),
			ResolvedDestination::PackageParent { root, .. } => {
				let Element::Package(package) = element else {
					return None;
				};
				let target = PackageRef::new(root.clone(), name);
				let taken = !(moving && &target == package) && (ws.package_exists(&target) || ws.contains(&target.folder()));
				Some(Slot { key: target.folder().to_string(), taken })
			}
			ResolvedDestination::Structure { target, .. } => member_slot(ws, target, element, name, moving),
		}
	}

	/// First suggestion that is free both in the workspace and among this pass's claims
	fn suggestion(
		&self, ws: &Workspace, destination: &ResolvedDestination, element: &Element, original: &str, claimed: &[String],
	) -> String {
		let mut attempt = 1;
		loop {
			let candidate = copy_name_suggestion(element, original, attempt);
			let free = self
				.slot(ws, destination, element, &candidate)
				.map_or(true, |slot| !slot.taken && !claimed.contains(&slot.key));
			if free || attempt >= MAX_SUGGESTION_ATTEMPTS {
				return candidate;
			}
			attempt += 1;
		}
	}

	fn check_name(&self, element: &Element, name: &str) -> std::result::Result<(), String> {
		let valid = match element {
			Element::Package(_) => name.split('.').all(is_valid_identifier),
			Element::Type(_) | Element::Field(_) => is_valid_identifier(name),
			_ => !name.trim().is_empty() && !name.contains('/') && name != "." && name != "..",
		};
		if valid {
			Ok(())
		} else {
			Err(format!("'{name}' is not a valid name for {} '{}'", element.kind(), element.name()))
		}
	}

	fn create_change(&self, ws: &Workspace, registry: &ParticipantRegistry) -> Result<ReorgChange> {
		let (Some(target), Some(destination)) = (&self.target, &self.destination) else {
			return Err(ReorgError::invalid_operation(self.mode.verb(), "no valid destination has been set"));
		};
		if self.state != ProcessorState::DestinationValid {
			return Err(ReorgError::invalid_operation(self.mode.verb(), "the processor is not ready"));
		}
		let request = TransferRequest {
			selection: &self.selection,
			destination,
			target,
			mode: self.mode,
			update_references: self.mode == ReorgMode::Move && self.update_references,
			resolutions: &self.resolutions,
		};
		create_transfer_change(ws, &request, registry)
	}

	fn mark_executed(&mut self, cancelled: bool) {
		self.state = if cancelled { ProcessorState::Cancelled } else { ProcessorState::Executed };
	}

	fn dispose(&mut self) {
		self.target = None;
		self.destination = None;
		self.resolutions.clear();
		if !self.state.is_terminal() {
			self.state = ProcessorState::Cancelled;
		}
	}

	fn label(&self) -> String {
		let verb = match self.mode {
			ReorgMode::Move => "Move",
			ReorgMode::Copy => "Copy",
		};
		match &self.target {
			Some(target) => format!("{verb} {} elements to '{target}'", self.selection.len()),
			None => format!("{verb} {} elements", self.selection.len()),
		}
	}
}

/// Slot of a member among the siblings it would join; methods and initializers never collide
fn member_slot(ws: &Workspace, target: &Element, element: &Element, name: &str, moving: bool) -> Option<Slot> {
	let member = element.as_member()?;
	if matches!(member.kind(), MemberKind::Method | MemberKind::Initializer) {
		return None;
	}
	let (unit, container) = match anchor_for(ws, target, element).ok()? {
		Anchor::UnitEnd(unit) => (unit, None),
		Anchor::TypeEnd(owner) => (owner.unit.clone(), Some(owner)),
		Anchor::After(sibling) => (sibling.unit.clone(), sibling.declaring_type()),
		Anchor::Imports(_) => return None,
	};
	let (_, structure) = ws.parse_unit(&unit).ok()?;
	let siblings = match &container {
		Some(owner) => structure.find(&owner.path)?.children_with_occurrence(),
		None => structure.types_with_occurrence(),
	};
	let taken = siblings.iter().any(|(occurrence, declaration)| {
		if declaration.kind != member.kind() || declaration.name != name {
			return false;
		}
		let segment = MemberSegment { kind: declaration.kind, name: declaration.name.clone(), occurrence: *occurrence };
		let sibling = match &container {
			Some(owner) => owner.child(segment.kind, &segment.name, segment.occurrence),
			None => MemberRef { unit: unit.clone(), path: vec![segment] },
		};
		!(moving && sibling == *member)
	});
	let scope = container.as_ref().map(MemberRef::dotted).unwrap_or_default();
	Some(Slot { key: format!("{}#{scope}/{:?}:{name}", unit.file(), member.kind()), taken })
}

macro_rules! transfer_processor {
	($name:ident, $mode:expr, $doc:literal) => {
		#[doc = $doc]
		#[derive(Debug, Clone)]
		pub struct $name {
			transfer: Transfer,
		}

		impl $name {
			/// Whether the selection can be handled at all
			pub fn is_available(ws: &Workspace, resources: &[Option<ResourcePath>], elements: &[Option<Element>]) -> bool {
				classify(ws, resources, elements).is_some()
			}

			pub fn create(ws: &Workspace, resources: &[Option<ResourcePath>], elements: &[Option<Element>]) -> Option<Self> {
				Transfer::create(ws, resources, elements, $mode).map(|transfer| Self { transfer })
			}

			/// Propose a destination; it is accepted unless the status is FATAL
			pub fn set_destination(&mut self, ws: &Workspace, target: Option<Element>) -> RefactoringStatus {
				self.transfer.set_destination(ws, target)
			}

			pub fn destination(&self) -> Option<&Element> {
				self.transfer.target.as_ref()
			}

			pub fn selection(&self) -> &Selection {
				&self.transfer.selection
			}

			/// Names chosen in the final checks, by element
			pub fn resolutions(&self) -> &BTreeMap<Element, Resolution> {
				&self.transfer.resolutions
			}
		}

		impl ReorgProcessor for $name {
			fn label(&self) -> String {
				self.transfer.label()
			}

			fn state(&self) -> ProcessorState {
				self.transfer.state
			}

			fn elements(&self) -> &[Element] {
				self.transfer.selection.elements()
			}

			fn check_final_conditions(&mut self, ws: &Workspace, queries: &Queries<'_>) -> RefactoringStatus {
				self.transfer.check_final_conditions(ws, queries)
			}

			fn create_change(&self, ws: &Workspace, registry: &ParticipantRegistry) -> Result<ReorgChange> {
				self.transfer.create_change(ws, registry)
			}

			fn mark_executed(&mut self, cancelled: bool) {
				self.transfer.mark_executed(cancelled)
			}

			fn dispose(&mut self) {
				self.transfer.dispose()
			}
		}
	};
}

transfer_processor!(MoveProcessor, ReorgMode::Move, "Moves a selection, updating references by default");
transfer_processor!(CopyProcessor, ReorgMode::Copy, "Copies a selection; conflicting copies are renamed");

impl MoveProcessor {
	pub fn update_references(&self) -> bool {
		self.transfer.update_references
	}

	pub fn set_update_references(&mut self, update: bool) {
		self.transfer.update_references = update;
	}
}

#[derive(Debug, Clone)]
pub struct DeleteProcessor {
	selection: Selection,
	state: ProcessorState,
	delete_sub_packages: bool,
}

impl DeleteProcessor {
	pub fn is_available(ws: &Workspace, resources: &[Option<ResourcePath>], elements: &[Option<Element>]) -> bool {
		classify_for_delete(ws, resources, elements).is_some()
	}

	pub fn create(ws: &Workspace, resources: &[Option<ResourcePath>], elements: &[Option<Element>]) -> Option<Self> {
		let selection = classify_for_delete(ws, resources, elements)?;
		debug!("Created delete processor for {} elements", selection.len());
		Some(Self { selection, state: ProcessorState::Created, delete_sub_packages: false })
	}

	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	pub fn delete_sub_packages(&self) -> bool {
		self.delete_sub_packages
	}

	/// Also delete every package nested below a selected package
	pub fn set_delete_sub_packages(&mut self, delete: bool) {
		self.delete_sub_packages = delete;
	}
}

impl ReorgProcessor for DeleteProcessor {
	fn label(&self) -> String {
		match self.selection.elements() {
			[single] => format!("Delete '{}'", single.name()),
			elements => format!("Delete {} elements", elements.len()),
		}
	}

	fn state(&self) -> ProcessorState {
		self.state
	}

	fn elements(&self) -> &[Element] {
		self.selection.elements()
	}

	fn check_final_conditions(&mut self, ws: &Workspace, queries: &Queries<'_>) -> RefactoringStatus {
		if self.state.is_terminal() {
			return RefactoringStatus::fatal("The operation has already finished");
		}
		let mut status = RefactoringStatus::new();
		for element in self.selection.elements() {
			if !ws.exists(element) {
				return RefactoringStatus::fatal(format!("'{element}' no longer exists"));
			}
		}

		let read_only: Vec<Element> =
			self.selection.elements().iter().filter(|e| ws.is_read_only(e)).cloned().collect();
		if !read_only.is_empty() {
			let query = queries.confirmations.create_confirm_query(ConfirmationKind::ReadOnly);
			for element in read_only {
				match query.confirm(&format!("'{element}' is read-only. Delete it anyway?")) {
					Confirmation::Yes => status.add_warning(format!("Read-only '{}' will be deleted", element.name())),
					Confirmation::No => self.selection.retain(|e| *e != element),
					Confirmation::Cancel => {
						self.state = ProcessorState::Cancelled;
						return RefactoringStatus::fatal("Operation cancelled");
					}
				}
			}
		}
		if self.selection.is_empty() {
			return RefactoringStatus::fatal("Nothing left to delete");
		}
		status
	}

	fn create_change(&self, ws: &Workspace, registry: &ParticipantRegistry) -> Result<ReorgChange> {
		if self.state.is_terminal() {
			return Err(ReorgError::invalid_operation("delete", "the operation has already finished"));
		}
		create_delete_change(ws, &self.selection, self.delete_sub_packages, registry)
	}

	fn mark_executed(&mut self, cancelled: bool) {
		self.state = if cancelled { ProcessorState::Cancelled } else { ProcessorState::Executed };
	}

	fn dispose(&mut self) {
		if !self.state.is_terminal() {
			self.state = ProcessorState::Cancelled;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::reorg::queries::{AcceptSuggestedNames, CancelNameQueries, ConfirmAll, FixedNameQueries};

	fn workspace() -> Workspace {
		let mut ws = Workspace::default();
		ws.create_project("P").unwrap();
		let root = ws.add_source_root("P", "src").unwrap();
		let p = ws.create_package(&root, "p").unwrap();
		ws.create_package(&root, "q").unwrap();
		ws.create_unit(&p, "A.java", "package p;\nclass A {\n\tint x;\n\tvoid run() {}\n}\n").unwrap();
		ws.create_file(&ResourcePath::parse("/P/src/p/a.txt").unwrap(), "123").unwrap();
		ws
	}

	fn element(ws: &Workspace, spec: &str) -> Option<Element> {
		Some(ws.resolve(spec).unwrap())
	}

	#[test]
	fn test_states() {
		let ws = workspace();
		let mut processor = MoveProcessor::create(&ws, &[], &[element(&ws, "/P/src/p/A.java")]).unwrap();
		assert_eq!(processor.state(), ProcessorState::Created);
		assert!(processor.update_references());

		let status = processor.set_destination(&ws, element(&ws, "/P/src/p"));
		assert!(status.has_fatal_error());
		assert_eq!(processor.state(), ProcessorState::DestinationPending);

		let status = processor.set_destination(&ws, element(&ws, "/P/src/q"));
		assert!(status.is_ok());
		assert_eq!(processor.state(), ProcessorState::DestinationValid);

		processor.dispose();
		assert_eq!(processor.state(), ProcessorState::Cancelled);
		assert!(processor.destination().is_none());
	}

	#[test]
	fn test_copy_conflict_uses_name_query() {
		let ws = workspace();
		let mut processor = CopyProcessor::create(&ws, &[], &[element(&ws, "/P/src/p/a.txt")]).unwrap();
		assert!(processor.set_destination(&ws, element(&ws, "/P/src/p")).is_ok());

		let names = FixedNameQueries::new().with_name("a.txt", "UnusedName.gif");
		let confirm = ConfirmAll::default();
		let status = processor.check_final_conditions(&ws, &Queries::new(&names, &confirm));
		assert!(status.is_ok());
		assert_eq!(names.asked(), vec!["a.txt"]);
		let file = element(&ws, "/P/src/p/a.txt").unwrap();
		assert_eq!(processor.resolutions()[&file].new_name.as_deref(), Some("UnusedName.gif"));
	}

	#[test]
	fn test_cancelled_name_query_is_fatal() {
		let ws = workspace();
		let mut processor = CopyProcessor::create(&ws, &[], &[element(&ws, "/P/src/p/A.java")]).unwrap();
		processor.set_destination(&ws, element(&ws, "/P/src/p"));
		let confirm = ConfirmAll::default();
		let status = processor.check_final_conditions(&ws, &Queries::new(&CancelNameQueries, &confirm));
		assert!(status.has_fatal_error());
		assert_eq!(processor.state(), ProcessorState::Cancelled);
	}

	#[test]
	fn test_field_copy_suggestion_and_method_overload() {
		let ws = workspace();
		let mut processor = CopyProcessor::create(
			&ws,
			&[],
			&[element(&ws, "/P/src/p/A.java#A.x"), element(&ws, "/P/src/p/A.java#A.run")],
		)
		.unwrap();
		assert!(processor.set_destination(&ws, element(&ws, "/P/src/p/A.java#A")).is_ok());
		let confirm = ConfirmAll::default();
		let status = processor.check_final_conditions(&ws, &Queries::new(&AcceptSuggestedNames, &confirm));
		assert!(status.is_ok());
		let field = element(&ws, "/P/src/p/A.java#A.x").unwrap();
		assert_eq!(processor.resolutions()[&field].new_name.as_deref(), Some("copyOfX"));
		assert_eq!(processor.resolutions().len(), 1);
	}

	#[test]
	fn test_read_only_skip_and_cancel() {
		let mut ws = workspace();
		ws.set_read_only(&ResourcePath::parse("/P/src/p/a.txt").unwrap(), true).unwrap();
		let confirm_no = ConfirmAll(Confirmation::No);
		let names = AcceptSuggestedNames;

		let mut processor = DeleteProcessor::create(&ws, &[], &[element(&ws, "/P/src/p/a.txt")]).unwrap();
		let status = processor.check_final_conditions(&ws, &Queries::new(&names, &confirm_no));
		assert!(status.has_fatal_error());

		let mut processor = MoveProcessor::create(
			&ws,
			&[],
			&[element(&ws, "/P/src/p/a.txt"), element(&ws, "/P/src/p/A.java")],
		)
		.unwrap();
		processor.set_destination(&ws, element(&ws, "/P/src/q"));
		let status = processor.check_final_conditions(&ws, &Queries::new(&names, &confirm_no));
		assert!(status.is_ok());
		assert_eq!(processor.elements().len(), 1);

		let cancel = ConfirmAll(Confirmation::Cancel);
		let status = processor.check_final_conditions(&ws, &Queries::new(&names, &cancel));
		assert!(status.is_ok());
		assert_eq!(processor.state(), ProcessorState::DestinationValid);
	}
}
