//! Change construction for Move and Copy
//!
//! The composite produced here always has the same shape: folder creation,
//! removal of overwritten resources, the transfers themselves, text edits on
//! the files' final locations, pruning of emptied folders, source root
//! entries, and finally participant changes. Every text edit is pinned to the
//! fingerprint of the text it was computed against.

use super::destination::{anchor_for, Anchor, ReorgMode, ResolvedDestination};
use super::participants::{
	dedup_affected, dispatch, AffectedElement, CopyArguments, MoveArguments, ParticipantArguments,
	ParticipantRegistry,
};
use super::pruning::plan_emptied_source;
use super::references::{plan_import_updates, ImportPlan, UnitRelocation};
use super::selection::{Selection, SelectionPolicy};
use crate::change::Change;
use crate::error::{ReorgError, Result};
use crate::model::{Element, MemberKind, PackageRef, ResourcePath, UnitRef, Workspace};
use crate::source::edit::line_start;
use crate::source::{reindent, removal_range, Declaration, ImportDecl, SourceStructure, TextEdit};
use crate::status::RefactoringStatus;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// How one selected element is placed, as settled by the final checks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
	/// Name at the destination; full dotted name for packages
	pub new_name: Option<String>,
	/// Delete whatever already sits at the destination first
	pub overwrite: bool,
}

/// A computed change plus what was learned while computing it
#[derive(Debug, Clone)]
pub struct ReorgChange {
	pub change: Change,
	/// Reference updates that could not be made, skipped duplicates, ...
	pub status: RefactoringStatus,
	pub participant_status: RefactoringStatus,
	/// Everything participants were told about, in order
	pub affected: Vec<AffectedElement>,
}

struct PendingEdit {
	base: String,
	edits: Vec<TextEdit>,
	descriptions: Vec<String>,
}

/// Collects atomic changes into their buckets
#[derive(Default)]
pub(crate) struct ChangeBuilder {
	creates: Vec<Change>,
	overwrites: Vec<Change>,
	transfers: Vec<Change>,
	edits: BTreeMap<ResourcePath, PendingEdit>,
	deletions: Vec<Change>,
	source_roots: Vec<Change>,
	participants: Vec<Change>,
	moved: Vec<(ResourcePath, ResourcePath)>,
	removed: Vec<ResourcePath>,
}

impl ChangeBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn create_folder(&mut self, path: ResourcePath) {
		let change = Change::CreateFolder { path };
		if !self.creates.contains(&change) {
			self.creates.push(change);
		}
	}

	pub fn overwrite(&mut self, path: ResourcePath) {
		self.removed.push(path.clone());
		self.overwrites.push(Change::DeleteResource { path });
	}

	pub fn transfer(&mut self, mode: ReorgMode, source: ResourcePath, destination: ResourcePath) {
		match mode {
			ReorgMode::Move => {
				self.moved.push((source.clone(), destination.clone()));
				self.transfers.push(Change::MoveResource { source, destination });
			}
			ReorgMode::Copy => self.transfers.push(Change::CopyResource { source, destination }),
		}
	}

	pub fn delete(&mut self, path: ResourcePath) {
		if self.removed.iter().any(|r| path.starts_with(r)) {
			return;
		}
		self.removed.push(path.clone());
		self.deletions.push(Change::DeleteResource { path });
	}

	pub fn source_root(&mut self, change: Change) {
		self.source_roots.push(change);
	}

	pub fn participants(&mut self, changes: Vec<Change>) {
		self.participants.extend(changes);
	}

	pub fn is_removed(&self, path: &ResourcePath) -> bool {
		self.removed.iter().any(|r| path.starts_with(r))
	}

	/// Where a resource sits once the transfers have run
	pub fn final_path(&self, path: &ResourcePath) -> ResourcePath {
		self.moved
			.iter()
			.find_map(|(from, to)| path.rebase(from, to))
			.unwrap_or_else(|| path.clone())
	}

	/// Queue edits for the file at `path`; all edits of one file share one base text
	pub fn edit(&mut self, path: ResourcePath, base: &str, edits: Vec<TextEdit>, description: &str) -> Result<()> {
		if edits.is_empty() {
			return Ok(());
		}
		match self.edits.entry(path) {
			Entry::Vacant(entry) => {
				entry.insert(PendingEdit {
					base: base.to_string(),
					edits,
					descriptions: vec![description.to_string()],
				});
			}
			Entry::Occupied(mut entry) => {
				if entry.get().base != base {
					return Err(ReorgError::invalid_operation(
						"edit",
						&format!("edits for {} were computed against different text", entry.key()),
					));
				}
				let pending = entry.get_mut();
				pending.edits.extend(edits);
				if !pending.descriptions.iter().any(|d| d == description) {
					pending.descriptions.push(description.to_string());
				}
			}
		}
		Ok(())
	}

	pub fn build(self, name: String) -> Change {
		let mut children = self.creates;
		children.extend(self.overwrites);
		children.extend(self.transfers);
		for (path, pending) in self.edits {
			let description = format!("{} in {}", pending.descriptions.join(", "), path);
			children.push(Change::edit(path, &pending.base, pending.edits, description));
		}
		children.extend(self.deletions);
		children.extend(self.source_roots);
		children.extend(self.participants);
		debug!("Built '{}' with {} steps", name, children.len());
		Change::composite(name, children)
	}
}

/// Edits bringing a unit's package declaration and imports up to date
///
/// `package_target` is `Some(None)` to drop the declaration, `Some(Some(name))`
/// to rewrite it, `None` to leave it.
pub(crate) fn unit_edits(
	text: &str, structure: &SourceStructure, package_target: Option<Option<&str>>, plan: Option<&ImportPlan>,
) -> Vec<TextEdit> {
	let mut edits = Vec::new();
	let mut package_removed = false;
	if let Some(target) = package_target {
		edits.extend(structure.package_rewrite(text, target));
		package_removed = target.is_none() && structure.package.is_some();
	}
	let Some(plan) = plan else {
		return edits;
	};

	for (index, written) in &plan.rewrites {
		if plan.removals.contains(index) {
			continue;
		}
		if let Some(import) = structure.imports.get(*index) {
			edits.push(TextEdit::replace(import.name_range.clone(), written.clone()));
		}
	}
	for index in &plan.removals {
		if let Some(import) = structure.imports.get(*index) {
			edits.push(TextEdit::delete(import.range.clone()));
		}
	}

	let kept: Vec<&ImportDecl> = structure
		.imports
		.iter()
		.enumerate()
		.filter(|(index, _)| !plan.removals.contains(index))
		.map(|(_, import)| import)
		.collect();
	let statements: Vec<String> = plan
		.additions
		.iter()
		.filter(|qualified| {
			!kept.iter().any(|i| i.imports_type(qualified)) && !plan.rewrites.values().any(|w| w == *qualified)
		})
		.map(|qualified| format!("import {qualified};"))
		.collect();
	if statements.is_empty() {
		return edits;
	}

	if structure.imports.is_empty() && package_removed {
		let mut block = statements.join("\n");
		block.push_str("\n\n");
		edits.push(TextEdit::insert(0, block));
	} else {
		edits.extend(structure.imports_insertion(text, &statements));
	}
	edits
}

/// Rename a top-level type and its constructors
pub(crate) fn type_rename_edits(structure: &SourceStructure, old: &str, new: &str) -> Vec<TextEdit> {
	let Some(declaration) = structure.types.iter().find(|t| t.name == old) else {
		return Vec::new();
	};
	let mut edits: Vec<TextEdit> =
		declaration.name_range.iter().map(|range| TextEdit::replace(range.clone(), new)).collect();
	for child in &declaration.children {
		if child.kind == MemberKind::Method && child.name == old {
			if let Some(range) = &child.name_range {
				edits.push(TextEdit::replace(range.clone(), new));
			}
		}
	}
	edits
}

/// Everything needed to compute a Move or Copy change
pub(crate) struct TransferRequest<'r> {
	pub selection: &'r Selection,
	pub destination: &'r ResolvedDestination,
	pub target: &'r Element,
	pub mode: ReorgMode,
	pub update_references: bool,
	pub resolutions: &'r BTreeMap<Element, Resolution>,
}

struct UnitTransfer {
	relocation: UnitRelocation,
	destination: ResourcePath,
}

struct TransferPlanner<'a, 'r> {
	ws: &'a Workspace,
	request: &'r TransferRequest<'r>,
	builder: ChangeBuilder,
	status: RefactoringStatus,
	affected: Vec<AffectedElement>,
	units: Vec<UnitTransfer>,
	package_renames: Vec<(String, String)>,
}

pub(crate) fn create_transfer_change(
	ws: &Workspace, request: &TransferRequest<'_>, registry: &ParticipantRegistry,
) -> Result<ReorgChange> {
	let mut planner = TransferPlanner {
		ws,
		request,
		builder: ChangeBuilder::new(),
		status: RefactoringStatus::new(),
		affected: Vec::new(),
		units: Vec::new(),
		package_renames: Vec::new(),
	};

	match (request.selection.policy(), request.destination) {
		(SelectionPolicy::ResourcesAndUnits, ResolvedDestination::Folder { folder, package }) => {
			planner.transfer_resources(folder, package.as_ref());
		}
		(SelectionPolicy::Packages, ResolvedDestination::PackageParent { root, .. }) => {
			planner.transfer_packages(root);
		}
		(SelectionPolicy::SourceRoots, ResolvedDestination::Project { name }) => {
			planner.transfer_source_roots(name);
		}
		(SelectionPolicy::Members, ResolvedDestination::Structure { target, unit }) => {
			planner.transfer_members(target, unit)?;
		}
		(policy, _) => {
			return Err(ReorgError::invalid_operation(
				request.mode.verb(),
				&format!("destination does not fit a {policy:?} selection"),
			));
		}
	}
	planner.update_units()?;

	let affected = dedup_affected(planner.affected);
	let (participant_status, participant_changes) = dispatch(ws, registry, &affected);
	planner.builder.participants(participant_changes);

	let name = describe(request.mode.verb(), request.selection.elements(), request.target);
	Ok(ReorgChange {
		change: planner.builder.build(name),
		status: planner.status,
		participant_status,
		affected,
	})
}

pub(crate) fn describe(verb: &str, elements: &[Element], target: &Element) -> String {
	let verb = capitalized(verb);
	match elements {
		[single] => format!("{verb} '{}' to '{target}'", single.name()),
		_ => format!("{verb} {} elements to '{target}'", elements.len()),
	}
}

impl<'a, 'r> TransferPlanner<'a, 'r> {
	fn resolution(&self, element: &Element) -> Resolution {
		self.request.resolutions.get(element).cloned().unwrap_or_default()
	}

	fn arguments(&self, element: &Element) -> ParticipantArguments {
		match self.request.mode {
			ReorgMode::Move => ParticipantArguments::Move(MoveArguments {
				destination: self.request.target.clone(),
				update_references: self.request.update_references,
			}),
			ReorgMode::Copy => ParticipantArguments::Copy(CopyArguments {
				destination: self.request.target.clone(),
				new_name: self.resolution(element).new_name,
			}),
		}
	}

	/// Announce an element and, for logical elements, the resource behind it
	fn announce(&mut self, element: &Element) {
		let arguments = self.arguments(element);
		self.affected.push(AffectedElement { element: element.clone(), arguments: arguments.clone() });
		let backing = match element {
			Element::SourceUnit(unit) => Some(Element::File(unit.file())),
			Element::Package(package) => Some(Element::Folder(package.folder())),
			Element::SourceRoot(root) => Some(Element::Folder(root.clone())),
			_ => None,
		};
		if let Some(backing) = backing {
			self.affected.push(AffectedElement { element: backing, arguments });
		}
	}

	fn transfer_resources(&mut self, folder: &ResourcePath, package: Option<&PackageRef>) {
		let mode = self.request.mode;
		let request = self.request;
		for element in request.selection.elements() {
			let Some(source) = self.ws.resource_of(element) else {
				continue;
			};
			let resolution = self.resolution(element);
			let name = match &resolution.new_name {
				Some(name) => name.clone(),
				None => source.name().unwrap_or_default().to_string(),
			};
			let destination = folder.join(&name);
			if mode == ReorgMode::Move && destination == source {
				continue;
			}
			if resolution.overwrite {
				self.builder.overwrite(destination.clone());
			}
			self.builder.transfer(mode, source, destination.clone());

			if let (Element::SourceUnit(unit), Some(package)) = (element, package) {
				let renamed = UnitRef::new(package.clone(), &name);
				let renamed_type = (renamed.type_name() != unit.type_name())
					.then(|| (unit.type_name().to_string(), renamed.type_name().to_string()));
				self.units.push(UnitTransfer {
					relocation: UnitRelocation { unit: unit.clone(), new_package: package.clone(), renamed_type },
					destination,
				});
			}
			self.announce(element);
		}
	}

	fn transfer_packages(&mut self, root: &ResourcePath) {
		let mode = self.request.mode;
		let mut protected = Vec::new();
		let mut emptied = Vec::new();

		let request = self.request;
		for element in request.selection.elements() {
			let Element::Package(package) = element else {
				continue;
			};
			let name = self
				.resolution(element)
				.new_name
				.or_else(|| self.request.destination.package_name_for(package))
				.unwrap_or_else(|| package.name.clone());
			let target = PackageRef::new(root.clone(), &name);
			if mode == ReorgMode::Move && &target == package {
				continue;
			}

			let folder = target.folder();
			if !self.ws.contains(&folder) {
				self.builder.create_folder(folder.clone());
			}
			protected.push(folder.clone());

			for unit in self.ws.units(package) {
				let destination = folder.join(&unit.name);
				self.builder.transfer(mode, unit.file(), destination.clone());
				self.units.push(UnitTransfer {
					relocation: UnitRelocation { unit, new_package: target.clone(), renamed_type: None },
					destination,
				});
			}
			for child in self.ws.non_package_children(package) {
				let destination = folder.join(child.name().unwrap_or_default());
				self.builder.transfer(mode, child, destination);
			}

			if package.name != name {
				self.package_renames.push((package.name.clone(), name));
			}
			emptied.push(package.clone());
			self.announce(element);
			for unit in self.ws.units(package) {
				self.announce(&Element::SourceUnit(unit));
			}
		}

		if mode == ReorgMode::Move {
			for package in emptied {
				for path in plan_emptied_source(self.ws, &package, &protected) {
					self.builder.delete(path);
				}
			}
		}
	}

	fn transfer_source_roots(&mut self, project: &str) {
		let mode = self.request.mode;
		let project_path = ResourcePath::project(project);
		let request = self.request;
		for element in request.selection.elements() {
			let Element::SourceRoot(root) = element else {
				continue;
			};
			let resolution = self.resolution(element);
			let name = match &resolution.new_name {
				Some(name) => name.clone(),
				None => root.name().unwrap_or_default().to_string(),
			};
			let destination = project_path.join(&name);
			if mode == ReorgMode::Move && &destination == root {
				continue;
			}
			let replaces_root = self.ws.is_source_root(&destination);
			if resolution.overwrite {
				self.builder.overwrite(destination.clone());
			}
			self.builder.transfer(mode, root.clone(), destination);

			let old_project = root.project_name().unwrap_or_default().to_string();
			let relative = root.relative_to(&ResourcePath::project(&old_project)).unwrap_or_default();
			if mode == ReorgMode::Move {
				self.builder.source_root(Change::RemoveSourceRoot { project: old_project, root: relative });
			}
			if !replaces_root {
				self.builder.source_root(Change::AddSourceRoot {
					project: project.to_string(),
					root: name,
					index: self.ws.source_roots(project).len(),
				});
			}
			self.announce(element);
		}
	}

	fn transfer_members(&mut self, target: &Element, destination_unit: &UnitRef) -> Result<()> {
		let mode = self.request.mode;
		let request = self.request;
		let elements = request.selection.elements();
		let Some(source_unit) = elements.first().and_then(Element::source_unit).cloned() else {
			return Ok(());
		};
		let (source_text, source_structure) = self.ws.parse_unit(&source_unit)?;
		let (target_text, target_structure) = self.ws.parse_unit(destination_unit)?;
		let same_unit = source_unit == *destination_unit;

		let mut insertions: Vec<TextEdit> = Vec::new();
		let mut removals: Vec<TextEdit> = Vec::new();
		let mut statements: Vec<String> = Vec::new();

		for element in elements {
			let anchor = anchor_for(self.ws, target, element)
				.map_err(|reason| ReorgError::invalid_operation(mode.verb(), &reason))?;

			if let Some(member) = element.as_member() {
				let declaration = source_structure
					.find(&member.path)
					.ok_or_else(|| ReorgError::element_not_found(element))?;
				let snippet = self.member_snippet(&source_text, declaration, element);
				insertions.push(insertion(&target_text, &target_structure, &anchor, declaration, &snippet)?);
				if mode == ReorgMode::Move {
					// Inserts into the same text may sit right at the blank line
					let range = if same_unit {
						declaration.range.clone()
					} else {
						removal_range(&source_text, declaration.range.clone())
					};
					removals.push(TextEdit::delete(range));
				}
				self.announce(element);
				continue;
			}

			let imports: Vec<&ImportDecl> = match element {
				Element::ImportContainer(_) => source_structure.imports.iter().collect(),
				Element::ImportDeclaration(import) => source_structure
					.imports
					.iter()
					.filter(|i| i.written_name() == import.name && i.is_static == import.is_static)
					.collect(),
				_ => Vec::new(),
			};
			for import in imports {
				let statement = import.statement();
				let present = target_structure
					.imports
					.iter()
					.any(|i| i.written_name() == import.written_name() && i.is_static == import.is_static);
				if present || statements.contains(&statement) {
					if !same_unit {
						self.status.add_info(format!(
							"'{}' is already imported by '{}'",
							import.written_name(),
							destination_unit.name
						));
					}
				} else {
					statements.push(statement);
				}
				if mode == ReorgMode::Move {
					removals.push(TextEdit::delete(import.range.clone()));
				}
			}
			self.announce(element);
		}
		insertions.extend(target_structure.imports_insertion(&target_text, &statements));

		let description = format!("{} members", capitalized(mode.verb()));
		if same_unit {
			insertions.extend(removals);
			self.builder.edit(destination_unit.file(), &target_text, insertions, &description)?;
		} else {
			self.builder.edit(destination_unit.file(), &target_text, insertions, &description)?;
			self.builder.edit(source_unit.file(), &source_text, removals, &description)?;
		}
		Ok(())
	}

	/// Declaration text, renamed when the final checks chose a new name
	fn member_snippet(&self, text: &str, declaration: &Declaration, element: &Element) -> String {
		let mut snippet = text[declaration.range.clone()].to_string();
		if let (Some(new_name), Some(name_range)) = (self.resolution(element).new_name, &declaration.name_range) {
			let start = name_range.start - declaration.range.start;
			let end = name_range.end - declaration.range.start;
			snippet.replace_range(start..end, &new_name);
		}
		if !snippet.ends_with('\n') {
			snippet.push('\n');
		}
		snippet
	}

	/// Package declarations of transferred units and imports of the units referring to them
	fn update_units(&mut self) -> Result<()> {
		if self.units.is_empty() {
			return Ok(());
		}
		let mode = self.request.mode;
		let relocations: Vec<UnitRelocation> = self.units.iter().map(|t| t.relocation.clone()).collect();
		let plans = if mode == ReorgMode::Move && self.request.update_references {
			let (plans, status) = plan_import_updates(self.ws, &relocations, &self.package_renames)?;
			self.status.merge(status);
			plans
		} else {
			BTreeMap::new()
		};

		for transfer in &self.units {
			let unit = &transfer.relocation.unit;
			let (text, structure) = match self.ws.parse_unit(unit) {
				Ok(parsed) => parsed,
				Err(e) => {
					warn!("Cannot rewrite {}: {}", unit.file(), e);
					self.status.add_error_for(
						format!("The package declaration of '{}' could not be updated: {}", unit.name, e),
						&Element::SourceUnit(unit.clone()),
					);
					continue;
				}
			};
			let new_package = &transfer.relocation.new_package;
			let target = (!new_package.is_default()).then_some(new_package.name.as_str());
			let mut edits = unit_edits(&text, &structure, Some(target), plans.get(unit));
			if let Some((old, new)) = &transfer.relocation.renamed_type {
				edits.extend(type_rename_edits(&structure, old, new));
			}
			self.builder.edit(transfer.destination.clone(), &text, edits, "Update package declaration")?;
		}

		for (unit, plan) in &plans {
			if self.units.iter().any(|t| t.relocation.unit == *unit) {
				continue;
			}
			let file = unit.file();
			if self.builder.is_removed(&file) {
				continue;
			}
			let (text, structure) = self.ws.parse_unit(unit)?;
			let edits = unit_edits(&text, &structure, None, Some(plan));
			let path = self.builder.final_path(&file);
			self.builder.edit(path, &text, edits, "Update imports")?;
		}
		Ok(())
	}
}

fn capitalized(word: &str) -> String {
	let mut chars = word.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
		None => String::new(),
	}
}

/// Edit inserting a member snippet at its anchor, reindented for its new place
fn insertion(
	text: &str, structure: &SourceStructure, anchor: &Anchor, declaration: &Declaration, snippet: &str,
) -> Result<TextEdit> {
	match anchor {
		Anchor::UnitEnd(_) => {
			let separator = if text.is_empty() || text.ends_with("\n\n") {
				""
			} else if text.ends_with('\n') {
				"\n"
			} else {
				"\n\n"
			};
			Ok(TextEdit::insert(text.len(), format!("{separator}{}", reindent(snippet, &declaration.indent, ""))))
		}
		Anchor::TypeEnd(owner) => {
			let owner_declaration = structure
				.find(&owner.path)
				.ok_or_else(|| ReorgError::element_not_found(Element::Type(owner.clone())))?;
			let body = owner_declaration.body.clone().ok_or_else(|| {
				ReorgError::invalid_operation("insert", &format!("type '{}' has no body", owner_declaration.name))
			})?;
			let indent = owner_declaration.member_indent();
			let moved = reindent(snippet, &declaration.indent, &indent);
			let close = body.end;
			let close_line = line_start(text, close);
			if close_line > body.start && text[close_line..close].trim().is_empty() {
				let separator = if owner_declaration.children.is_empty() { "" } else { "\n" };
				Ok(TextEdit::insert(close_line, format!("{separator}{moved}")))
			} else {
				Ok(TextEdit::insert(close, format!("\n{moved}{}", owner_declaration.indent)))
			}
		}
		Anchor::After(member) => {
			let previous = structure
				.find(&member.path)
				.ok_or_else(|| ReorgError::element_not_found(Element::member(member.clone())))?;
			let moved = reindent(snippet, &declaration.indent, &previous.indent);
			let offset = previous.range.end;
			let separator = if text[..offset].ends_with('\n') { "\n" } else { "\n\n" };
			Ok(TextEdit::insert(offset, format!("{separator}{moved}")))
		}
		Anchor::Imports(unit) => Err(ReorgError::invalid_operation(
			"insert",
			&format!("only imports can go to the import list of '{}'", unit.name),
		)),
	}
}
