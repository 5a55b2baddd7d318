// Integration tests for deciding whether a selection can be moved, copied or deleted

use source_reorg::model::{Element, PackageRef};
use source_reorg::reorg::{DeleteProcessor, MoveProcessor, SelectionPolicy};
use source_reorg::{CopyProcessor, ElementKind};

mod common;
use common::*;

fn workspace() -> source_reorg::Workspace {
	let mut ws = java_workspace();
	add_unit(&mut ws, "p", "A.java", "package p;\n\nclass A {\n\tint x;\n\tvoid run() {}\n}\n");
	add_unit(&mut ws, "p", "B.java", "package p;\n\nclass B {}\n");
	add_unit(&mut ws, "", "Main.java", "class Main {}\n");
	ws.create_folder(&path("/P/doc")).unwrap();
	ws.create_file(&path("/P/doc/readme.txt"), "read me").unwrap();
	ws
}

#[test]
fn test_missing_or_empty_selection_is_unavailable() {
	let ws = workspace();
	assert!(!MoveProcessor::is_available(&ws, &[], &[]));
	assert!(!CopyProcessor::is_available(&ws, &[None], &[]));
	assert!(!DeleteProcessor::is_available(&ws, &[Some(path("/P/nothing"))], &[]));
}

#[test]
fn test_projects_are_never_available() {
	let ws = workspace();
	let project = vec![Some(Element::Project("P".to_string()))];
	assert!(!MoveProcessor::is_available(&ws, &[], &project));
	assert!(!CopyProcessor::is_available(&ws, &[], &project));
	assert!(!DeleteProcessor::is_available(&ws, &[], &project));
}

#[test]
fn test_default_package_alone() {
	let ws = workspace();
	let default = vec![Some(Element::Package(PackageRef::default_package(src())))];
	assert!(!MoveProcessor::is_available(&ws, &[], &default));
	assert!(!CopyProcessor::is_available(&ws, &[], &default));
	assert!(DeleteProcessor::is_available(&ws, &[], &default));
}

#[test]
fn test_element_with_its_container() {
	let ws = workspace();
	let nested = selection(&ws, &["/P/src/p", "/P/src/p/A.java"]);
	assert!(!MoveProcessor::is_available(&ws, &[], &nested));
	assert!(!CopyProcessor::is_available(&ws, &[], &nested));

	let processor = DeleteProcessor::create(&ws, &[], &nested).unwrap();
	assert_eq!(processor.selection().elements(), &[element(&ws, "/P/src/p")]);
}

#[test]
fn test_resources_and_units_share_a_policy() {
	let ws = workspace();
	let processor =
		MoveProcessor::create(&ws, &[Some(path("/P/doc/readme.txt"))], &selection(&ws, &["/P/src/p/A.java"])).unwrap();
	assert_eq!(processor.selection().policy(), SelectionPolicy::ResourcesAndUnits);
	assert_eq!(processor.selection().len(), 2);
}

#[test]
fn test_members_of_one_unit() {
	let ws = workspace();
	let members = selection(&ws, &["/P/src/p/A.java#A.x", "/P/src/p/A.java#A.run"]);
	let processor = CopyProcessor::create(&ws, &[], &members).unwrap();
	assert_eq!(processor.selection().policy(), SelectionPolicy::Members);
	assert_eq!(processor.selection().common_parent_kind(), Some(ElementKind::Type));

	let mixed = selection(&ws, &["/P/src/p/A.java#A.x", "/P/src/p/B.java#B"]);
	assert!(!MoveProcessor::is_available(&ws, &[], &mixed));
}

#[test]
fn test_packages_and_units_do_not_mix() {
	let mut ws = workspace();
	add_package(&mut ws, "q");
	let mixed = selection(&ws, &["/P/src/q", "/P/src/p/A.java"]);
	assert!(!MoveProcessor::is_available(&ws, &[], &mixed));
	assert!(DeleteProcessor::is_available(&ws, &[], &mixed));
}
