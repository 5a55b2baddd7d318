//! Move, Copy and Delete of workspace elements
//!
//! A reorg starts with a selection, is checked against a destination, and ends
//! as one [`Change`] executed as a single batch. Everything a caller needs to
//! decide is answered through the query services; everything third parties
//! want to hear about goes through participants.
//!
//! # Module Organization
//!
//! - [`selection`] - Enablement and selection policies
//! - [`destination`] - Destination resolution and validation
//! - [`queries`] - Name and confirmation queries
//! - [`processor`] - Move, Copy and Delete processors
//! - [`factory`] - Change construction for Move and Copy
//! - [`delete`] - Change construction for Delete
//! - [`references`] - Import rewriting after units move
//! - [`pruning`] - Which package folders disappear
//! - [`participants`] - Participant registry and dispatch

pub mod delete;
pub mod destination;
pub mod factory;
pub mod participants;
pub mod processor;
pub mod pruning;
pub mod queries;
pub mod references;
pub mod selection;

pub use destination::{ReorgMode, ResolvedDestination};
pub use factory::{ReorgChange, Resolution};
pub use participants::{
	AffectedElement, CopyArguments, DeleteArguments, MoveArguments, ParticipantArguments, ParticipantRegistry,
	ReorgParticipant,
};
pub use processor::{CopyProcessor, DeleteProcessor, MoveProcessor, ProcessorState, ReorgProcessor};
pub use queries::{
	AcceptSuggestedNames, CancelNameQueries, ConfirmAll, ConfirmQuery, Confirmation, ConfirmationKind,
	FixedNameQueries, NameQueries, NameQuery, Queries, ReorgQueries,
};
pub use selection::{Selection, SelectionPolicy};

use crate::change::{execute, CancellationToken, Change};
use crate::model::Workspace;
use crate::status::{RefactoringStatus, Severity};
use tracing::{debug, info, warn};

/// What happened to one reorg
#[derive(Debug, Clone)]
pub struct ReorgOutcome {
	/// Everything reported along the way, final checks included
	pub status: RefactoringStatus,
	/// The change that was computed, executed or not
	pub change: Option<Change>,
	/// Inverse of the executed change
	pub undo: Option<Change>,
	pub executed: bool,
	pub cancelled: bool,
	/// Running the operation again may succeed
	pub retryable: bool,
}

impl ReorgOutcome {
	fn stopped(status: RefactoringStatus, change: Option<Change>, cancelled: bool) -> Self {
		Self { status, change, undo: None, executed: false, cancelled, retryable: false }
	}
}

/// Drive a processor from its final checks to execution
///
/// Stops before touching the workspace when the final checks do not allow
/// proceeding (FATAL always stops, ERROR unless `force`), when the change
/// cannot be built, or when a participant reports an ERROR. Reference updates
/// that could not be made are reported but do not stop the operation.
pub fn perform(
	ws: &mut Workspace, processor: &mut dyn ReorgProcessor, queries: &Queries<'_>, registry: &ParticipantRegistry,
	token: &CancellationToken, force: bool,
) -> ReorgOutcome {
	let label = processor.label();
	debug!("Checking final conditions for '{}'", label);
	let mut status = processor.check_final_conditions(ws, queries);
	if !status.can_proceed(force) {
		let cancelled = processor.state() == ProcessorState::Cancelled;
		info!("'{}' stopped by final checks ({})", label, status.severity());
		return ReorgOutcome::stopped(status, None, cancelled);
	}

	let reorg = match processor.create_change(ws, registry) {
		Ok(reorg) => reorg,
		Err(e) => {
			warn!("Could not create change for '{}' [{}]: {}", label, e.category(), e);
			status.merge(RefactoringStatus::from_error(&e));
			let mut outcome = ReorgOutcome::stopped(status, None, false);
			outcome.retryable = e.is_retryable();
			return outcome;
		}
	};
	debug!("Created '{}' with {} operations", reorg.change.name(), reorg.change.leaf_count());

	if reorg.participant_status.severity() >= Severity::Error {
		status.merge(reorg.participant_status);
		info!("'{}' aborted by participants", label);
		return ReorgOutcome::stopped(status, Some(reorg.change), false);
	}
	status.merge(reorg.participant_status);
	if reorg.status.has_fatal_error() {
		status.merge(reorg.status);
		return ReorgOutcome::stopped(status, Some(reorg.change), false);
	}
	status.merge(reorg.status);

	let outcome = execute(ws, &reorg.change, token);
	status.merge(outcome.status);
	let executed = outcome.undo.is_some();
	if executed || outcome.cancelled {
		processor.mark_executed(outcome.cancelled);
	}
	info!("'{}' finished: executed={}, cancelled={}, {}", label, executed, outcome.cancelled, status.severity());
	ReorgOutcome {
		status,
		change: Some(reorg.change),
		undo: outcome.undo,
		executed,
		cancelled: outcome.cancelled,
		retryable: outcome.retryable,
	}
}
