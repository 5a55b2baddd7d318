//! Change construction for Delete
//!
//! Mixed selections are materialized first: every package, unit and member
//! is turned into the resources or text ranges that actually go away, and the
//! participant list is built from that expanded set.

use super::factory::{ChangeBuilder, ReorgChange};
use super::participants::{
	dedup_affected, dispatch, AffectedElement, DeleteArguments, ParticipantArguments, ParticipantRegistry,
};
use super::pruning::plan_package_deletion;
use super::selection::Selection;
use crate::change::Change;
use crate::error::Result;
use crate::model::{Element, MemberRef, PackageRef, ResourcePath, UnitRef, Workspace};
use crate::source::{removal_range, TextEdit};
use crate::status::RefactoringStatus;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use tracing::debug;

pub(crate) fn create_delete_change(
	ws: &Workspace, selection: &Selection, delete_sub_packages: bool, registry: &ParticipantRegistry,
) -> Result<ReorgChange> {
	let arguments = ParticipantArguments::Delete(DeleteArguments { delete_sub_packages });
	let mut builder = ChangeBuilder::new();
	let mut status = RefactoringStatus::new();
	let mut affected: Vec<AffectedElement> = Vec::new();
	let mut announce = |element: Element| {
		affected.push(AffectedElement { element, arguments: arguments.clone() });
	};

	let mut deletions: BTreeSet<ResourcePath> = BTreeSet::new();
	let mut packages: Vec<PackageRef> = Vec::new();
	let mut structural: BTreeMap<UnitRef, Vec<Element>> = BTreeMap::new();

	for element in selection.elements() {
		match element {
			Element::File(path) | Element::Folder(path) => {
				deletions.insert(path.clone());
				announce(element.clone());
			}
			Element::SourceUnit(unit) => {
				deletions.insert(unit.file());
				announce_unit(ws, unit, &mut announce);
			}
			Element::Package(package) => packages.push(package.clone()),
			Element::SourceRoot(root) => {
				deletions.insert(root.clone());
				let project = root.project_name().unwrap_or_default().to_string();
				let relative = root.relative_to(&ResourcePath::project(&project)).unwrap_or_default();
				builder.source_root(Change::RemoveSourceRoot { project, root: relative });
				announce(element.clone());
				announce(Element::Folder(root.clone()));
			}
			Element::Project(_) => {}
			_ => {
				if let Some(unit) = element.source_unit() {
					structural.entry(unit.clone()).or_default().push(element.clone());
				}
			}
		}
	}

	if !packages.is_empty() {
		let plan = plan_package_deletion(ws, &packages, delete_sub_packages, &[]);
		for package in &plan.cleaned {
			status.add_info(format!(
				"Package '{}' keeps its folder because it still has sub-packages",
				package.display_name()
			));
		}
		deletions.extend(plan.deletions.iter().cloned());
		let mut announced = packages.clone();
		announced.extend(plan.removed.iter().filter(|p| !packages.contains(p)).cloned());
		for package in announced {
			let removed_folder = plan.removed.contains(&package);
			announce(Element::Package(package.clone()));
			if removed_folder {
				announce(Element::Folder(package.folder()));
			}
			for unit in ws.units(&package) {
				announce_unit(ws, &unit, &mut announce);
			}
		}
	}

	for (unit, elements) in structural {
		let file = unit.file();
		if deletions.iter().any(|d| file.starts_with(d)) {
			continue;
		}
		let (text, structure) = ws.parse_unit(&unit)?;

		let selected_types: BTreeSet<&MemberRef> = elements
			.iter()
			.filter_map(Element::as_member)
			.filter(|m| m.is_top_level())
			.collect();
		if !structure.types.is_empty() && selected_types.len() == structure.types.len() {
			debug!("Every type of {} is deleted; deleting the unit", unit.name);
			deletions.insert(file);
			announce_unit(ws, &unit, &mut announce);
			continue;
		}

		let mut ranges: Vec<Range<usize>> = Vec::new();
		for element in &elements {
			match element {
				Element::ImportContainer(_) => ranges.extend(structure.imports.iter().map(|i| i.range.clone())),
				Element::ImportDeclaration(import) => ranges.extend(
					structure
						.imports
						.iter()
						.filter(|i| i.written_name() == import.name && i.is_static == import.is_static)
						.map(|i| i.range.clone()),
				),
				Element::PackageDeclaration(_) => ranges.extend(structure.package.iter().map(|p| p.range.clone())),
				_ => {
					if let Some(declaration) = element.as_member().and_then(|m| structure.find(&m.path)) {
						ranges.push(removal_range(&text, declaration.range.clone()));
					}
				}
			}
			announce(element.clone());
		}
		ranges.sort_by_key(|r| (r.start, r.end));
		ranges.dedup();
		let edits = ranges.into_iter().map(TextEdit::delete).collect();
		builder.edit(file, &text, edits, "Delete declarations")?;
	}

	// Outermost paths only; nested ones disappear with their ancestor
	let mut kept: Vec<ResourcePath> = Vec::new();
	for path in deletions {
		if !kept.iter().any(|k| path.starts_with(k)) {
			kept.push(path);
		}
	}
	for path in kept {
		builder.delete(path);
	}

	let affected = dedup_affected(affected);
	let (participant_status, participant_changes) = dispatch(ws, registry, &affected);
	builder.participants(participant_changes);

	let name = match selection.elements() {
		[single] => format!("Delete '{}'", single.name()),
		elements => format!("Delete {} elements", elements.len()),
	};
	Ok(ReorgChange { change: builder.build(name), status, participant_status, affected })
}

/// A unit, its file and its top-level types
fn announce_unit(ws: &Workspace, unit: &UnitRef, announce: &mut impl FnMut(Element)) {
	announce(Element::SourceUnit(unit.clone()));
	announce(Element::File(unit.file()));
	if let Ok((_, structure)) = ws.parse_unit(unit) {
		for (occurrence, declaration) in structure.types_with_occurrence() {
			let mut member = MemberRef::top_level_type(unit.clone(), &declaration.name);
			member.path[0].occurrence = occurrence;
			announce(Element::Type(member));
		}
	}
}
