//! Common test utilities for the source-reorg library

#![allow(unused_imports, dead_code)]

use source_reorg::change::{CancellationToken, Change};
use source_reorg::error::ReorgError;
use source_reorg::model::{Element, ElementKind, PackageRef, ResourcePath, UnitRef, Workspace};
use source_reorg::reorg::{
	perform, AcceptSuggestedNames, ConfirmAll, NameQueries, ParticipantArguments, ParticipantRegistry, Queries,
	ReorgOutcome, ReorgParticipant, ReorgProcessor,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn setup_temp_dir() -> TempDir {
	TempDir::new().expect("Failed to create temp directory")
}

pub fn path(s: &str) -> ResourcePath {
	ResourcePath::parse(s).expect("valid path")
}

/// Project `P` with the source root `src`
pub fn java_workspace() -> Workspace {
	let mut ws = Workspace::default();
	ws.create_project("P").expect("create project");
	ws.add_source_root("P", "src").expect("add source root");
	ws
}

pub fn src() -> ResourcePath {
	path("/P/src")
}

pub fn add_package(ws: &mut Workspace, name: &str) -> PackageRef {
	ws.create_package(&src(), name).expect("create package")
}

/// Add a unit, creating its package when missing; `""` is the default package
pub fn add_unit(ws: &mut Workspace, package: &str, name: &str, content: &str) -> UnitRef {
	let package = if package.is_empty() { PackageRef::default_package(src()) } else { add_package(ws, package) };
	ws.create_unit(&package, name, content).expect("create unit")
}

pub fn element(ws: &Workspace, spec: &str) -> Element {
	ws.resolve(spec).unwrap_or_else(|e| panic!("cannot resolve {spec}: {e}"))
}

pub fn selection(ws: &Workspace, specs: &[&str]) -> Vec<Option<Element>> {
	specs.iter().map(|spec| Some(element(ws, spec))).collect()
}

pub fn content(ws: &Workspace, p: &str) -> String {
	ws.content(&path(p)).unwrap_or_else(|e| panic!("no content for {p}: {e}")).to_string()
}

/// Run a processor with suggested names, confirmations answered yes, no participants
pub fn run(ws: &mut Workspace, processor: &mut dyn ReorgProcessor) -> ReorgOutcome {
	run_with(ws, processor, &AcceptSuggestedNames, &ParticipantRegistry::new())
}

pub fn run_with(
	ws: &mut Workspace, processor: &mut dyn ReorgProcessor, names: &dyn NameQueries, registry: &ParticipantRegistry,
) -> ReorgOutcome {
	let confirmations = ConfirmAll::default();
	perform(ws, processor, &Queries::new(names, &confirmations), registry, &CancellationToken::new(), false)
}

pub const ALL_KINDS: &[ElementKind] = &[
	ElementKind::Folder,
	ElementKind::File,
	ElementKind::SourceRoot,
	ElementKind::Package,
	ElementKind::SourceUnit,
	ElementKind::Type,
	ElementKind::Method,
	ElementKind::Field,
	ElementKind::Initializer,
	ElementKind::ImportContainer,
	ElementKind::ImportDeclaration,
	ElementKind::PackageDeclaration,
];

/// Participant that records what it is told and optionally contributes or fails
pub struct RecordingParticipant {
	name: String,
	seen: Mutex<Vec<(Element, ParticipantArguments)>>,
	contribution: Option<Change>,
	fail: bool,
}

impl RecordingParticipant {
	pub fn new(name: &str) -> Arc<Self> {
		Arc::new(Self { name: name.to_string(), seen: Mutex::new(Vec::new()), contribution: None, fail: false })
	}

	pub fn failing(name: &str) -> Arc<Self> {
		Arc::new(Self { name: name.to_string(), seen: Mutex::new(Vec::new()), contribution: None, fail: true })
	}

	/// Contributes `change` for the first element it hears about
	pub fn contributing(name: &str, change: Change) -> Arc<Self> {
		Arc::new(Self { name: name.to_string(), seen: Mutex::new(Vec::new()), contribution: Some(change), fail: false })
	}

	pub fn seen(&self) -> Vec<Element> {
		self.seen.lock().unwrap().iter().map(|(e, _)| e.clone()).collect()
	}

	pub fn arguments(&self) -> Vec<ParticipantArguments> {
		self.seen.lock().unwrap().iter().map(|(_, a)| a.clone()).collect()
	}
}

impl ReorgParticipant for RecordingParticipant {
	fn name(&self) -> &str {
		&self.name
	}

	fn create_change(
		&self, _ws: &Workspace, element: &Element, arguments: &ParticipantArguments,
	) -> source_reorg::Result<Option<Change>> {
		let mut seen = self.seen.lock().unwrap();
		seen.push((element.clone(), arguments.clone()));
		if self.fail {
			return Err(ReorgError::invalid_operation("record", "participant refused"));
		}
		Ok(if seen.len() == 1 { self.contribution.clone() } else { None })
	}
}

pub fn registry_with(participant: Arc<RecordingParticipant>) -> ParticipantRegistry {
	let mut registry = ParticipantRegistry::new();
	registry.register(ALL_KINDS, participant);
	registry
}
