//! Which folders disappear when packages are deleted or moved away
//!
//! A package whose sub-packages survive is only cleaned: its units and other
//! files go, the folder stays. A package with nothing left below it loses its
//! folder, and so does every ancestor package folder that ends up empty, up
//! to (never including) the source root. Paths listed as protected, and their
//! ancestors, are never removed.

use crate::model::{PackageRef, ResourcePath, Workspace};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrunePlan {
	/// Outermost resources to delete, in path order
	pub deletions: Vec<ResourcePath>,
	/// Packages that keep their folder because sub-packages survive
	pub cleaned: Vec<PackageRef>,
	/// Packages whose folder goes away
	pub removed: Vec<PackageRef>,
}

/// Plan the deletion of `selected` packages
pub fn plan_package_deletion(
	ws: &Workspace, selected: &[PackageRef], delete_sub_packages: bool, protected: &[ResourcePath],
) -> PrunePlan {
	let mut doomed: Vec<PackageRef> = Vec::new();
	for package in selected {
		if !doomed.contains(package) {
			doomed.push(package.clone());
		}
		if delete_sub_packages {
			for sub in ws.sub_packages(package) {
				if !doomed.contains(&sub) {
					doomed.push(sub);
				}
			}
		}
	}

	let mut plan = PrunePlan::default();
	let mut removed: BTreeSet<ResourcePath> = BTreeSet::new();
	let mut emptied_folders = Vec::new();

	for package in &doomed {
		if package.is_default() {
			// The root folder itself always stays
			for unit in ws.units(package) {
				removed.insert(unit.file());
			}
			for child in ws.non_package_children(package) {
				if ws.is_file(&child) {
					removed.insert(child);
				}
			}
			continue;
		}

		let survivors = ws.sub_packages(package).into_iter().any(|sub| !doomed.contains(&sub));
		let folder = package.folder();
		if survivors || is_protected(&folder, protected) {
			debug!("Cleaning package {} instead of removing it", package.display_name());
			for unit in ws.units(package) {
				removed.insert(unit.file());
			}
			removed.extend(ws.non_package_children(package));
			plan.cleaned.push(package.clone());
		} else {
			removed.insert(folder.clone());
			emptied_folders.push((folder, package.root.clone()));
		}
	}

	for (folder, root) in emptied_folders {
		prune_ancestors(ws, &mut removed, &folder, &root, protected);
	}

	plan.deletions = outermost(removed);
	let roots: BTreeSet<ResourcePath> = doomed.iter().map(|p| p.root.clone()).collect();
	for root in roots {
		for package in ws.packages(&root) {
			if !package.is_default() && plan.deletions.iter().any(|d| package.folder().starts_with(d)) {
				plan.removed.push(package);
			}
		}
	}
	plan
}

/// Folders to delete once every child of `package` has been moved out
pub fn plan_emptied_source(ws: &Workspace, package: &PackageRef, protected: &[ResourcePath]) -> Vec<ResourcePath> {
	let folder = package.folder();
	if package.is_default() || !ws.sub_packages(package).is_empty() || is_protected(&folder, protected) {
		return Vec::new();
	}
	let mut removed = BTreeSet::from([folder.clone()]);
	prune_ancestors(ws, &mut removed, &folder, &package.root, protected);
	outermost(removed)
}

fn is_protected(folder: &ResourcePath, protected: &[ResourcePath]) -> bool {
	protected.iter().any(|p| p.starts_with(folder))
}

/// Walk up from `folder`, adding every ancestor below `root` whose children are all removed
fn prune_ancestors(
	ws: &Workspace, removed: &mut BTreeSet<ResourcePath>, folder: &ResourcePath, root: &ResourcePath,
	protected: &[ResourcePath],
) {
	let mut current = folder.clone();
	while let Some(parent) = current.parent() {
		if !parent.is_descendant_of(root) || removed.contains(&parent) || is_protected(&parent, protected) {
			break;
		}
		let empty = ws
			.child_paths(&parent)
			.iter()
			.all(|child| removed.iter().any(|r| child.starts_with(r)));
		if !empty {
			break;
		}
		debug!("Pruning emptied folder {}", parent);
		removed.insert(parent.clone());
		current = parent;
	}
}

/// Drop paths that lie below another path of the set
fn outermost(paths: BTreeSet<ResourcePath>) -> Vec<ResourcePath> {
	let mut result: Vec<ResourcePath> = Vec::new();
	// Path order puts ancestors before their descendants
	for path in paths {
		if !result.iter().any(|kept| path.starts_with(kept)) {
			result.push(path);
		}
	}
	result
}

#[cfg(test)]
mod tests {
	use super::*;

	fn path(s: &str) -> ResourcePath {
		ResourcePath::parse(s).unwrap()
	}

	fn workspace() -> (Workspace, ResourcePath) {
		let mut ws = Workspace::default();
		ws.create_project("P").unwrap();
		let root = ws.add_source_root("P", "src").unwrap();
		(ws, root)
	}

	#[test]
	fn test_chain_of_empty_packages_goes_away() {
		let (mut ws, root) = workspace();
		let leaf = ws.create_package(&root, "a0.a1.a2.a3").unwrap();
		ws.create_unit(&leaf, "A.java", "package a0.a1.a2.a3;\nclass A {}\n").unwrap();

		let plan = plan_package_deletion(&ws, &[leaf], false, &[]);
		assert_eq!(plan.deletions, vec![path("/P/src/a0")]);
		assert_eq!(plan.removed.len(), 4);
		assert!(plan.cleaned.is_empty());
	}

	#[test]
	fn test_package_with_surviving_sub_package_is_cleaned() {
		let (mut ws, root) = workspace();
		let parent = ws.create_package(&root, "a").unwrap();
		let child = ws.create_package(&root, "a.b").unwrap();
		ws.create_unit(&parent, "A.java", "package a;\nclass A {}\n").unwrap();
		ws.create_file(&path("/P/src/a/notes.txt"), "n").unwrap();
		ws.create_unit(&child, "B.java", "package a.b;\nclass B {}\n").unwrap();

		let plan = plan_package_deletion(&ws, &[parent.clone()], false, &[]);
		assert_eq!(plan.cleaned, vec![parent.clone()]);
		assert_eq!(plan.deletions, vec![path("/P/src/a/A.java"), path("/P/src/a/notes.txt")]);

		let plan = plan_package_deletion(&ws, &[parent], true, &[]);
		assert_eq!(plan.deletions, vec![path("/P/src/a")]);
		assert_eq!(plan.removed.len(), 2);
	}

	#[test]
	fn test_ancestor_with_content_stays() {
		let (mut ws, root) = workspace();
		let parent = ws.create_package(&root, "a").unwrap();
		let child = ws.create_package(&root, "a.b").unwrap();
		ws.create_unit(&parent, "A.java", "package a;\nclass A {}\n").unwrap();

		let plan = plan_package_deletion(&ws, &[child], false, &[]);
		assert_eq!(plan.deletions, vec![path("/P/src/a/b")]);
	}

	#[test]
	fn test_default_package_keeps_root() {
		let (mut ws, root) = workspace();
		let default = PackageRef::default_package(root.clone());
		ws.create_unit(&default, "Main.java", "class Main {}\n").unwrap();
		ws.create_package(&root, "p").unwrap();

		let plan = plan_package_deletion(&ws, &[default], false, &[]);
		assert_eq!(plan.deletions, vec![path("/P/src/Main.java")]);
	}

	#[test]
	fn test_emptied_source_respects_protected_destination() {
		let (mut ws, root) = workspace();
		let source = ws.create_package(&root, "a.b.c").unwrap();
		let plan = plan_emptied_source(&ws, &source, &[path("/P/src/a/c")]);
		assert_eq!(plan, vec![path("/P/src/a/b")]);
	}
}
