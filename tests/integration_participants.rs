// Integration tests for participant notification and participant failures

use source_reorg::change::Change;
use source_reorg::model::{ElementKind, MemberRef, PackageRef, UnitRef};
use source_reorg::reorg::{AcceptSuggestedNames, ParticipantArguments, ParticipantRegistry};
use source_reorg::{DeleteProcessor, Element, MoveProcessor, ReorgProcessor, Severity};

mod common;
use common::*;

fn workspace() -> source_reorg::Workspace {
	let mut ws = java_workspace();
	add_unit(&mut ws, "p", "A.java", "package p;\n\nclass A {}\n");
	add_unit(&mut ws, "p", "B.java", "package p;\n\nclass B {}\n");
	add_package(&mut ws, "q");
	ws
}

#[test]
fn test_delete_announces_each_affected_element_once() {
	let mut ws = workspace();
	let recorder = RecordingParticipant::new("recorder");
	let registry = registry_with(recorder.clone());

	let unit = UnitRef::new(PackageRef::new(src(), "p"), "A.java");
	let mut processor = DeleteProcessor::create(
		&ws,
		&[],
		&selection(&ws, &["/P/src/p/A.java", "/P/src/p/A.java#A"]),
	)
	.unwrap();
	let outcome = run_with(&mut ws, &mut processor, &AcceptSuggestedNames, &registry);
	assert!(outcome.executed, "{:?}", outcome.status);

	assert_eq!(
		recorder.seen(),
		vec![
			Element::SourceUnit(unit.clone()),
			Element::File(unit.file()),
			Element::Type(MemberRef::top_level_type(unit, "A")),
		]
	);
	assert!(recorder
		.arguments()
		.iter()
		.all(|a| matches!(a, ParticipantArguments::Delete(d) if !d.delete_sub_packages)));
}

#[test]
fn test_move_arguments_carry_destination() {
	let mut ws = workspace();
	let recorder = RecordingParticipant::new("recorder");
	let mut registry = ParticipantRegistry::new();
	registry.register_for(ElementKind::SourceUnit, recorder.clone());

	let mut processor = MoveProcessor::create(&ws, &[], &selection(&ws, &["/P/src/p/A.java", "/P/src/p/B.java"])).unwrap();
	let destination = element(&ws, "/P/src/q");
	processor.set_destination(&ws, Some(destination.clone()));
	let outcome = run_with(&mut ws, &mut processor, &AcceptSuggestedNames, &registry);
	assert!(outcome.executed);

	assert_eq!(recorder.seen().len(), 2);
	for arguments in recorder.arguments() {
		match arguments {
			ParticipantArguments::Move(m) => {
				assert_eq!(m.destination, destination);
				assert!(m.update_references);
			}
			other => panic!("unexpected arguments {other:?}"),
		}
	}
}

#[test]
fn test_participant_failure_aborts_before_execution() {
	let mut ws = workspace();
	let registry = registry_with(RecordingParticipant::failing("broken"));

	let mut processor = MoveProcessor::create(&ws, &[], &selection(&ws, &["/P/src/p/A.java"])).unwrap();
	processor.set_destination(&ws, Some(element(&ws, "/P/src/q")));
	let outcome = run_with(&mut ws, &mut processor, &AcceptSuggestedNames, &registry);

	assert!(!outcome.executed);
	assert_eq!(outcome.status.severity(), Severity::Error);
	assert!(ws.contains(&path("/P/src/p/A.java")));
	assert!(!ws.contains(&path("/P/src/q/A.java")));
}

#[test]
fn test_failing_contribution_rolls_back_everything() {
	let mut ws = workspace();
	let contribution = Change::DeleteResource { path: path("/P/not-there") };
	let registry = registry_with(RecordingParticipant::contributing("cleanup", contribution));

	let mut processor = MoveProcessor::create(&ws, &[], &selection(&ws, &["/P/src/p/A.java"])).unwrap();
	processor.set_destination(&ws, Some(element(&ws, "/P/src/q")));
	let outcome = run_with(&mut ws, &mut processor, &AcceptSuggestedNames, &registry);

	assert!(!outcome.executed);
	assert!(outcome.undo.is_none());
	assert_eq!(outcome.status.severity(), Severity::Error);
	assert_eq!(content(&ws, "/P/src/p/A.java"), "package p;\n\nclass A {}\n");
	assert!(!ws.contains(&path("/P/src/q/A.java")));
}

#[test]
fn test_contribution_runs_and_undoes_with_the_reorg() {
	let mut ws = workspace();
	let contribution =
		Change::CreateFile { path: path("/P/moved.log"), content: "A moved".to_string(), read_only: false };
	let registry = registry_with(RecordingParticipant::contributing("log", contribution));

	let mut processor = MoveProcessor::create(&ws, &[], &selection(&ws, &["/P/src/p/A.java"])).unwrap();
	processor.set_destination(&ws, Some(element(&ws, "/P/src/q")));
	let outcome = run_with(&mut ws, &mut processor, &AcceptSuggestedNames, &registry);
	assert!(outcome.executed, "{:?}", outcome.status);
	assert_eq!(content(&ws, "/P/moved.log"), "A moved");

	let undo = outcome.undo.unwrap();
	let undone = source_reorg::execute(&mut ws, &undo, &source_reorg::CancellationToken::new());
	assert!(undone.succeeded());
	assert!(!ws.contains(&path("/P/moved.log")));
	assert!(ws.contains(&path("/P/src/p/A.java")));
	assert_eq!(processor.state(), source_reorg::ProcessorState::Executed);
}

#[test]
fn test_registry_lookup_by_kind() {
	let mut registry = ParticipantRegistry::new();
	assert!(registry.is_empty());
	registry.register(&[ElementKind::Type, ElementKind::Method], RecordingParticipant::new("members"));
	assert_eq!(registry.participants_for(ElementKind::Type).len(), 1);
	assert_eq!(registry.participants_for(ElementKind::Method)[0].name(), "members");
	assert!(registry.participants_for(ElementKind::Field).is_empty());
}
