//! Destination validation
//!
//! A proposed destination is first resolved into the container that will
//! actually receive the selection (a folder, a source root plus package
//! prefix, a project, or a position inside a source unit). The kind table
//! lives in [`resolve`]; containment, no-op moves and compliance notes are
//! checked by [`validate`].

use super::selection::{Selection, SelectionPolicy};
use crate::model::{Element, ElementKind, MemberRef, PackageRef, ResourcePath, UnitRef, Workspace};
use crate::status::RefactoringStatus;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReorgMode {
	Move,
	Copy,
}

impl ReorgMode {
	pub fn verb(self) -> &'static str {
		match self {
			ReorgMode::Move => "move",
			ReorgMode::Copy => "copy",
		}
	}
}

/// The container that receives the selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedDestination {
	/// Files, folders and units land in `folder`; `package` is set for package folders
	Folder { folder: ResourcePath, package: Option<PackageRef> },
	/// Packages land in `root`; with a prefix they become its sub-packages
	PackageParent { root: ResourcePath, prefix: Option<String> },
	/// Source roots land in a project
	Project { name: String },
	/// Structural children land next to or inside `target`
	Structure { target: Element, unit: UnitRef },
}

impl ResolvedDestination {
	/// Name of a package once it sits in this destination
	pub fn package_name_for(&self, package: &PackageRef) -> Option<String> {
		match self {
			ResolvedDestination::PackageParent { prefix: None, .. } => Some(package.name.clone()),
			ResolvedDestination::PackageParent { prefix: Some(prefix), .. } => {
				Some(format!("{prefix}.{}", package.simple_name()))
			}
			_ => None,
		}
	}
}

/// Where a structural child is inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
	/// After the last top-level type of a unit
	UnitEnd(UnitRef),
	/// At the end of a type body
	TypeEnd(MemberRef),
	/// Right after a member, inside its declaring type
	After(MemberRef),
	/// Into a unit's import list
	Imports(UnitRef),
}

/// Resolve `target` for a policy, or explain why it is not a valid destination
pub fn resolve(
	ws: &Workspace, policy: SelectionPolicy, target: &Element,
) -> Result<ResolvedDestination, String> {
	let invalid = || format!("{} '{}' is not a valid destination", target.kind(), target);
	match policy {
		SelectionPolicy::ResourcesAndUnits => {
			let folder = match target {
				Element::Project(name) => ResourcePath::project(name),
				Element::Folder(path) | Element::SourceRoot(path) => path.clone(),
				Element::Package(package) => package.folder(),
				Element::File(path) => path.parent().ok_or_else(invalid)?,
				Element::SourceUnit(unit) => unit.package.folder(),
				_ => return Err(invalid()),
			};
			let package = ws.package_for_folder(&folder);
			Ok(ResolvedDestination::Folder { folder, package })
		}
		SelectionPolicy::Packages => match target {
			Element::SourceRoot(root) => Ok(ResolvedDestination::PackageParent { root: root.clone(), prefix: None }),
			Element::Package(package) if package.is_default() => {
				Ok(ResolvedDestination::PackageParent { root: package.root.clone(), prefix: None })
			}
			Element::Package(package) => Ok(ResolvedDestination::PackageParent {
				root: package.root.clone(),
				prefix: Some(package.name.clone()),
			}),
			Element::Project(name) => match ws.source_roots(name).into_iter().next() {
				Some(root) => Ok(ResolvedDestination::PackageParent { root, prefix: None }),
				None => Err(format!("Project '{name}' has no source root to receive packages")),
			},
			_ => Err(invalid()),
		},
		SelectionPolicy::SourceRoots => match target {
			Element::Project(name) => Ok(ResolvedDestination::Project { name: name.clone() }),
			_ => Err(invalid()),
		},
		SelectionPolicy::Members => match target {
			Element::Type(member)
			| Element::Method(member)
			| Element::Field(member)
			| Element::Initializer(member) => {
				Ok(ResolvedDestination::Structure { target: target.clone(), unit: member.unit.clone() })
			}
			Element::SourceUnit(unit) => {
				Ok(ResolvedDestination::Structure { target: target.clone(), unit: unit.clone() })
			}
			_ => Err(invalid()),
		},
		SelectionPolicy::Delete => Err("Delete has no destination".to_string()),
	}
}

/// Insertion point for `element` when structural children go to `target`
pub fn anchor_for(ws: &Workspace, target: &Element, element: &Element) -> Result<Anchor, String> {
	if matches!(element.kind(), ElementKind::ImportContainer | ElementKind::ImportDeclaration) {
		return target
			.source_unit()
			.cloned()
			.map(Anchor::Imports)
			.ok_or_else(|| format!("'{target}' cannot receive imports"));
	}
	match target {
		Element::Type(member) => Ok(Anchor::TypeEnd(member.clone())),
		Element::Method(member) | Element::Field(member) | Element::Initializer(member) => {
			Ok(Anchor::After(member.clone()))
		}
		Element::SourceUnit(unit) if element.kind() == ElementKind::Type => Ok(Anchor::UnitEnd(unit.clone())),
		Element::SourceUnit(unit) => {
			let (_, structure) = ws.parse_unit(unit).map_err(|e| e.to_string())?;
			let primary = structure
				.primary_type(unit.type_name())
				.ok_or_else(|| format!("'{}' declares no type to receive {}", unit.name, element.kind()))?;
			Ok(Anchor::TypeEnd(MemberRef::top_level_type(unit.clone(), &primary.name)))
		}
		_ => Err(format!("'{target}' cannot receive {}", element.kind())),
	}
}

/// True if the element would end up in the container it already occupies
fn stays_in_place(ws: &Workspace, element: &Element, destination: &ResolvedDestination) -> bool {
	match destination {
		ResolvedDestination::Folder { folder, .. } => {
			ws.resource_of(element).and_then(|p| p.parent()).as_ref() == Some(folder)
		}
		ResolvedDestination::PackageParent { root, .. } => match element {
			Element::Package(package) => {
				&package.root == root && destination.package_name_for(package).as_deref() == Some(package.name.as_str())
			}
			_ => false,
		},
		ResolvedDestination::Project { name } => {
			ws.resource_of(element).and_then(|p| p.parent()) == Some(ResourcePath::project(name))
		}
		ResolvedDestination::Structure { target, .. } => match anchor_for(ws, target, element) {
			Ok(Anchor::Imports(unit)) => element.source_unit() == Some(&unit),
			Ok(Anchor::TypeEnd(declaring)) => {
				element.as_member().and_then(MemberRef::declaring_type).as_ref() == Some(&declaring)
			}
			Ok(Anchor::UnitEnd(unit)) => {
				element.as_member().is_some_and(|m| m.is_top_level() && m.unit == unit)
			}
			_ => false,
		},
	}
}

/// Check a proposed destination against the selection
pub fn validate(
	ws: &Workspace, selection: &Selection, target: Option<&Element>, mode: ReorgMode, update_references: bool,
) -> (RefactoringStatus, Option<ResolvedDestination>) {
	let Some(target) = target else {
		return (RefactoringStatus::fatal("No destination selected"), None);
	};
	if !ws.exists(target) {
		return (RefactoringStatus::fatal(format!("The destination '{target}' does not exist")), None);
	}

	let destination = match resolve(ws, selection.policy(), target) {
		Ok(destination) => destination,
		Err(message) => return (RefactoringStatus::fatal(message), None),
	};

	for element in selection.elements() {
		if ws.is_within(target, element) {
			return (
				RefactoringStatus::fatal(format!(
					"Cannot {} '{}' into itself or one of its children",
					mode.verb(),
					element
				)),
				None,
			);
		}
	}

	if let ResolvedDestination::Project { name } = &destination {
		let owns_all = selection
			.elements()
			.iter()
			.all(|e| ws.project_of(e).as_deref() == Some(name.as_str()));
		if !owns_all && ws.source_roots(name).is_empty() {
			return (RefactoringStatus::fatal(format!("Project '{name}' has no source roots")), None);
		}
	}

	if let ResolvedDestination::Folder { folder, .. } = &destination {
		if !ws.is_container(folder) {
			return (RefactoringStatus::fatal(format!("'{folder}' cannot hold resources")), None);
		}
	}

	if let ResolvedDestination::Structure { target, .. } = &destination {
		for element in selection.elements() {
			if let Err(message) = anchor_for(ws, target, element) {
				return (RefactoringStatus::fatal(message), None);
			}
		}
	}

	let in_place = selection.elements().iter().all(|e| stays_in_place(ws, e, &destination));
	if in_place && mode == ReorgMode::Move {
		return (
			RefactoringStatus::fatal(format!("The selected elements are already in '{target}'")),
			None,
		);
	}

	let mut status = RefactoringStatus::new();
	if let ResolvedDestination::Folder { package, .. } = &destination {
		for element in selection.elements() {
			let Element::SourceUnit(unit) = element else {
				continue;
			};
			match package {
				None => status.add_info(format!(
					"'{}' will be placed in a folder that is not a package",
					unit.name
				)),
				Some(package)
					if mode == ReorgMode::Move
						&& update_references
						&& unit.package.is_default()
						&& !package.is_default()
						&& ws.unit_compliance(unit).allows_default_package_imports() =>
				{
					status.add_warning(format!(
						"References to '{}' from the default package can only be updated on a best-effort basis at this compliance level",
						unit.type_name()
					));
				}
				_ => {}
			}
		}
	}

	(status, Some(destination))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::reorg::selection::classify;
	use crate::status::Severity;

	fn workspace() -> Workspace {
		let mut ws = Workspace::default();
		ws.create_project("P").unwrap();
		ws.create_project("Empty").unwrap();
		let root = ws.add_source_root("P", "src").unwrap();
		let p = ws.create_package(&root, "p").unwrap();
		ws.create_package(&root, "q").unwrap();
		ws.create_unit(&p, "A.java", "package p;\nclass A {\n\tvoid run() {}\n}\n").unwrap();
		ws
	}

	fn select(ws: &Workspace, spec: &str) -> Selection {
		classify(ws, &[], &[Some(ws.resolve(spec).unwrap())]).unwrap()
	}

	#[test]
	fn test_unit_destinations() {
		let ws = workspace();
		let selection = select(&ws, "/P/src/p/A.java");
		let to_q = ws.resolve("/P/src/q").unwrap();
		let (status, destination) = validate(&ws, &selection, Some(&to_q), ReorgMode::Move, true);
		assert!(status.is_ok());
		assert!(matches!(destination, Some(ResolvedDestination::Folder { package: Some(_), .. })));

		let method = ws.resolve("/P/src/p/A.java#A.run").unwrap();
		let (status, _) = validate(&ws, &selection, Some(&method), ReorgMode::Move, true);
		assert_eq!(status.severity(), Severity::Fatal);
	}

	#[test]
	fn test_move_to_parent_is_fatal_but_copy_is_not() {
		let ws = workspace();
		let selection = select(&ws, "/P/src/p/A.java");
		let parent = ws.resolve("/P/src/p").unwrap();
		let (status, _) = validate(&ws, &selection, Some(&parent), ReorgMode::Move, true);
		assert!(status.has_fatal_error());
		let (status, _) = validate(&ws, &selection, Some(&parent), ReorgMode::Copy, true);
		assert!(status.is_ok());
	}

	#[test]
	fn test_package_destinations() {
		let ws = workspace();
		let selection = select(&ws, "/P/src/p");
		let empty = Element::Project("Empty".into());
		let (status, _) = validate(&ws, &selection, Some(&empty), ReorgMode::Copy, true);
		assert!(status.has_fatal_error());

		let unit = ws.resolve("/P/src/p/A.java").unwrap();
		let (status, _) = validate(&ws, &selection, Some(&unit), ReorgMode::Copy, true);
		assert!(status.has_fatal_error());

		let q = ws.resolve("/P/src/q").unwrap();
		let (status, destination) = validate(&ws, &selection, Some(&q), ReorgMode::Move, true);
		assert!(status.is_ok());
		let package = PackageRef::new(ResourcePath::parse("/P/src").unwrap(), "p");
		assert_eq!(destination.unwrap().package_name_for(&package).as_deref(), Some("q.p"));
	}

	#[test]
	fn test_source_root_needs_a_project_with_roots() {
		let ws = workspace();
		let selection = select(&ws, "/P/src");
		let empty = Element::Project("Empty".into());
		let (status, _) = validate(&ws, &selection, Some(&empty), ReorgMode::Move, true);
		assert!(status.has_fatal_error());
		let own = Element::Project("P".into());
		let (status, _) = validate(&ws, &selection, Some(&own), ReorgMode::Copy, true);
		assert!(status.is_ok());
	}

	#[test]
	fn test_member_into_itself() {
		let ws = workspace();
		let selection = select(&ws, "/P/src/p/A.java#A.run");
		let same = ws.resolve("/P/src/p/A.java#A.run").unwrap();
		let (status, _) = validate(&ws, &selection, Some(&same), ReorgMode::Copy, true);
		assert!(status.has_fatal_error());
	}
}
