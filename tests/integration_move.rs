// Integration tests for Move: units, packages, source roots, members and reference updates

use source_reorg::config::ComplianceLevel;
use source_reorg::reorg::{ConfirmAll, Confirmation, FixedNameQueries, ParticipantRegistry, Queries};
use source_reorg::{perform, CancellationToken, MoveProcessor, Severity};

mod common;
use common::*;

#[test]
fn test_move_unit_rewrites_package_declaration() {
	let mut ws = java_workspace();
	add_unit(&mut ws, "p", "A.java", "package p;\n\npublic class A {}\n");
	add_package(&mut ws, "otherPackage");

	let mut processor = MoveProcessor::create(&ws, &[], &selection(&ws, &["/P/src/p/A.java"])).unwrap();
	assert!(processor.set_destination(&ws, Some(element(&ws, "/P/src/otherPackage"))).is_ok());
	let outcome = run(&mut ws, &mut processor);
	assert!(outcome.executed, "{:?}", outcome.status);

	assert!(!ws.contains(&path("/P/src/p/A.java")));
	assert_eq!(content(&ws, "/P/src/otherPackage/A.java"), "package otherPackage;\n\npublic class A {}\n");
}

#[test]
fn test_move_unit_updates_importers_only() {
	let mut ws = java_workspace();
	add_unit(&mut ws, "p", "A.java", "package p;\n\npublic class A {}\n");
	add_unit(
		&mut ws,
		"r",
		"User.java",
		"package r;\n\nimport java.util.List;\nimport p.A;\n\nclass User {\n\tA a;\n\tList<String> names;\n}\n",
	);
	add_unit(&mut ws, "s", "Other.java", "package s;\n\nclass Other {\n\tint A;\n}\n");
	add_package(&mut ws, "q");

	let mut processor = MoveProcessor::create(&ws, &[], &selection(&ws, &["/P/src/p/A.java"])).unwrap();
	processor.set_destination(&ws, Some(element(&ws, "/P/src/q")));
	let outcome = run(&mut ws, &mut processor);
	assert!(outcome.executed, "{:?}", outcome.status);

	assert_eq!(
		content(&ws, "/P/src/r/User.java"),
		"package r;\n\nimport java.util.List;\nimport q.A;\n\nclass User {\n\tA a;\n\tList<String> names;\n}\n"
	);
	assert_eq!(content(&ws, "/P/src/s/Other.java"), "package s;\n\nclass Other {\n\tint A;\n}\n");
}

#[test]
fn test_move_without_reference_updates() {
	let mut ws = java_workspace();
	add_unit(&mut ws, "p", "A.java", "package p;\n\npublic class A {}\n");
	add_unit(&mut ws, "r", "User.java", "package r;\n\nimport p.A;\n\nclass User { A a; }\n");
	add_package(&mut ws, "q");

	let mut processor = MoveProcessor::create(&ws, &[], &selection(&ws, &["/P/src/p/A.java"])).unwrap();
	processor.set_update_references(false);
	processor.set_destination(&ws, Some(element(&ws, "/P/src/q")));
	let outcome = run(&mut ws, &mut processor);
	assert!(outcome.executed);

	assert_eq!(content(&ws, "/P/src/q/A.java"), "package q;\n\npublic class A {}\n");
	assert!(content(&ws, "/P/src/r/User.java").contains("import p.A;"));
}

#[test]
fn test_left_behind_units_gain_import() {
	let mut ws = java_workspace();
	add_unit(&mut ws, "p", "A.java", "package p;\n\npublic class A {}\n");
	add_unit(&mut ws, "p", "B.java", "package p;\n\nclass B {\n\tA a;\n}\n");
	add_package(&mut ws, "q");

	let mut processor = MoveProcessor::create(&ws, &[], &selection(&ws, &["/P/src/p/A.java"])).unwrap();
	processor.set_destination(&ws, Some(element(&ws, "/P/src/q")));
	let outcome = run(&mut ws, &mut processor);
	assert!(outcome.executed, "{:?}", outcome.status);

	assert_eq!(content(&ws, "/P/src/p/B.java"), "package p;\n\nimport q.A;\n\nclass B {\n\tA a;\n}\n");
}

#[test]
fn test_move_into_default_package_reports_error_and_completes() {
	let mut ws = java_workspace();
	add_unit(&mut ws, "p", "A.java", "package p;\n\npublic class A {}\n");
	add_unit(&mut ws, "r", "User.java", "package r;\n\nimport p.A;\n\nclass User { A a; }\n");

	let mut processor = MoveProcessor::create(&ws, &[], &selection(&ws, &["/P/src/p/A.java"])).unwrap();
	assert!(!processor.set_destination(&ws, Some(element(&ws, "/P/src"))).has_fatal_error());
	let outcome = run(&mut ws, &mut processor);

	assert!(outcome.executed);
	assert_eq!(outcome.status.severity(), Severity::Error);
	assert!(!content(&ws, "/P/src/A.java").contains("package"));
	assert!(content(&ws, "/P/src/r/User.java").contains("import p.A;"));
}

#[test]
fn test_legacy_compliance_leaves_default_package_import() {
	let mut ws = java_workspace();
	ws.set_compliance("P", ComplianceLevel::new(1, 3)).unwrap();
	add_unit(&mut ws, "", "A.java", "public class A {}\n");
	add_unit(&mut ws, "r", "User.java", "package r;\n\nimport A;\n\nclass User { A a; }\n");
	add_package(&mut ws, "q");

	let mut processor = MoveProcessor::create(&ws, &[], &selection(&ws, &["/P/src/A.java"])).unwrap();
	let status = processor.set_destination(&ws, Some(element(&ws, "/P/src/q")));
	assert_eq!(status.severity(), Severity::Warning);
	let outcome = run(&mut ws, &mut processor);

	assert!(outcome.executed);
	assert_eq!(outcome.status.severity(), Severity::Error);
	assert_eq!(content(&ws, "/P/src/q/A.java"), "package q;\n\npublic class A {}\n");
	assert!(content(&ws, "/P/src/r/User.java").contains("import A;"));
}

#[test]
fn test_move_package_prunes_empty_parents_and_rewrites_imports() {
	let mut ws = java_workspace();
	add_unit(&mut ws, "a.b", "A.java", "package a.b;\n\npublic class A {}\n");
	add_unit(&mut ws, "r", "User.java", "package r;\n\nimport a.b.*;\n\nclass User { A a; }\n");
	add_package(&mut ws, "q");

	let mut processor = MoveProcessor::create(&ws, &[], &selection(&ws, &["/P/src/a/b"])).unwrap();
	processor.set_destination(&ws, Some(element(&ws, "/P/src/q")));
	let outcome = run(&mut ws, &mut processor);
	assert!(outcome.executed, "{:?}", outcome.status);

	assert_eq!(content(&ws, "/P/src/q/b/A.java"), "package q.b;\n\npublic class A {}\n");
	assert!(!ws.contains(&path("/P/src/a")));
	assert_eq!(content(&ws, "/P/src/r/User.java"), "package r;\n\nimport q.b.*;\n\nclass User { A a; }\n");
}

#[test]
fn test_move_source_root_between_projects() {
	let mut ws = java_workspace();
	ws.create_project("Q").unwrap();
	ws.add_source_root("Q", "main").unwrap();
	ws.add_source_root("P", "gen").unwrap();
	ws.create_package(&path("/P/gen"), "g").unwrap();

	let mut processor = MoveProcessor::create(&ws, &[], &selection(&ws, &["/P/gen"])).unwrap();
	processor.set_destination(&ws, Some(source_reorg::Element::Project("Q".to_string())));
	let outcome = run(&mut ws, &mut processor);
	assert!(outcome.executed, "{:?}", outcome.status);

	assert!(ws.contains(&path("/Q/gen/g")));
	assert_eq!(ws.project("P").unwrap().source_roots, vec!["src"]);
	assert_eq!(ws.project("Q").unwrap().source_roots, vec!["main", "gen"]);
}

#[test]
fn test_move_method_between_types() {
	let mut ws = java_workspace();
	add_unit(&mut ws, "p", "A.java", "package p;\n\nclass A {\n\tint x;\n\n\tvoid run() {\n\t\tx++;\n\t}\n}\n");
	add_unit(&mut ws, "p", "B.java", "package p;\n\nclass B {\n}\n");

	let mut processor = MoveProcessor::create(&ws, &[], &selection(&ws, &["/P/src/p/A.java#A.run"])).unwrap();
	processor.set_destination(&ws, Some(element(&ws, "/P/src/p/B.java#B")));
	let outcome = run(&mut ws, &mut processor);
	assert!(outcome.executed, "{:?}", outcome.status);

	assert_eq!(content(&ws, "/P/src/p/B.java"), "package p;\n\nclass B {\n\tvoid run() {\n\t\tx++;\n\t}\n}\n");
	assert_eq!(content(&ws, "/P/src/p/A.java"), "package p;\n\nclass A {\n\tint x;\n}\n");
}

#[test]
fn test_unparsable_neighbour_is_reported_not_fatal() {
	let mut ws = java_workspace();
	add_unit(&mut ws, "p", "A.java", "package p;\n\npublic class A {}\n");
	add_unit(&mut ws, "r", "Broken.java", "package r;\n@interface");
	add_package(&mut ws, "q");

	let mut processor = MoveProcessor::create(&ws, &[], &selection(&ws, &["/P/src/p/A.java"])).unwrap();
	processor.set_destination(&ws, Some(element(&ws, "/P/src/q")));
	let outcome = run(&mut ws, &mut processor);

	assert!(outcome.executed, "{:?}", outcome.status);
	assert_eq!(outcome.status.severity(), Severity::Warning);
	assert!(outcome.status.entries_with(Severity::Warning).any(|e| e.message.contains("Broken.java")));
	assert_eq!(content(&ws, "/P/src/q/A.java"), "package q;\n\npublic class A {}\n");
	assert_eq!(content(&ws, "/P/src/r/Broken.java"), "package r;\n@interface");
}

#[test]
fn test_overwrite_needs_confirmation() {
	let mut ws = java_workspace();
	ws.create_folder(&path("/P/a")).unwrap();
	ws.create_folder(&path("/P/b")).unwrap();
	ws.create_file(&path("/P/a/x.txt"), "new").unwrap();
	ws.create_file(&path("/P/b/x.txt"), "old").unwrap();
	let names = FixedNameQueries::new().with_name("x.txt", "x.txt");
	let registry = ParticipantRegistry::new();

	let mut processor = MoveProcessor::create(&ws, &[], &selection(&ws, &["/P/a/x.txt"])).unwrap();
	processor.set_destination(&ws, Some(element(&ws, "/P/b")));
	let cancel = ConfirmAll(Confirmation::Cancel);
	let outcome =
		perform(&mut ws, &mut processor, &Queries::new(&names, &cancel), &registry, &CancellationToken::new(), false);
	assert!(!outcome.executed);
	assert!(outcome.cancelled);
	assert_eq!(content(&ws, "/P/b/x.txt"), "old");

	let mut processor = MoveProcessor::create(&ws, &[], &selection(&ws, &["/P/a/x.txt"])).unwrap();
	processor.set_destination(&ws, Some(element(&ws, "/P/b")));
	let yes = ConfirmAll(Confirmation::Yes);
	let outcome =
		perform(&mut ws, &mut processor, &Queries::new(&names, &yes), &registry, &CancellationToken::new(), false);
	assert!(outcome.executed, "{:?}", outcome.status);
	assert_eq!(outcome.status.severity(), Severity::Warning);
	assert_eq!(content(&ws, "/P/b/x.txt"), "new");
	assert!(!ws.contains(&path("/P/a/x.txt")));
}
