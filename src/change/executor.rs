use super::Change;
use crate::error::ReorgError;
use crate::model::Workspace;
use crate::status::RefactoringStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cooperative cancellation flag shared between the caller and an execution
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
	cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.cancelled.store(true, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancelled.load(Ordering::SeqCst)
	}
}

#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
	pub status: RefactoringStatus,
	/// Inverse of the performed change; `None` when nothing was left applied
	pub undo: Option<Change>,
	pub cancelled: bool,
	/// Recomputing the change and running it again may succeed
	pub retryable: bool,
}

impl ExecutionOutcome {
	pub fn succeeded(&self) -> bool {
		self.undo.is_some()
	}
}

/// Perform `change` as a single workspace batch
///
/// The workspace ends up either fully changed or exactly as before: a
/// cancellation before the first step does nothing, and a failure or
/// cancellation later rolls back the steps already taken.
pub fn execute(ws: &mut Workspace, change: &Change, token: &CancellationToken) -> ExecutionOutcome {
	if token.is_cancelled() {
		debug!("'{}' cancelled before it started", change.name());
		return ExecutionOutcome {
			status: RefactoringStatus::from_error(&ReorgError::Cancelled),
			undo: None,
			cancelled: true,
			retryable: true,
		};
	}

	let result = ws.run_batch(|ws| change.perform(ws, token));
	match result {
		Ok(undo) => {
			info!("Performed '{}' ({} operations)", change.name(), change.leaf_count());
			ExecutionOutcome {
				status: RefactoringStatus::new(),
				undo: Some(undo),
				cancelled: false,
				retryable: false,
			}
		}
		Err(ReorgError::Cancelled) => {
			info!("'{}' cancelled and rolled back", change.name());
			ExecutionOutcome {
				status: RefactoringStatus::from_error(&ReorgError::Cancelled),
				undo: None,
				cancelled: true,
				retryable: true,
			}
		}
		Err(e) => {
			warn!("'{}' failed [{}]: {}", change.name(), e.category(), e);
			ExecutionOutcome {
				status: RefactoringStatus::from_error(&e),
				undo: None,
				cancelled: false,
				retryable: e.is_retryable(),
			}
		}
	}
}
