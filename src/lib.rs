pub mod change;
pub mod config;
pub mod error;
pub mod model;
pub mod reorg;
pub mod source;
pub mod status;

pub use change::{execute, CancellationToken, Change, ChangeHistory, ExecutionOutcome};
pub use config::{ComplianceLevel, ReorgConfig};
pub use error::{ReorgError, Result};
pub use model::{Element, ElementKind, ResourcePath, Workspace};
pub use reorg::{
	perform, CopyProcessor, DeleteProcessor, MoveProcessor, ParticipantRegistry, ProcessorState, Queries,
	ReorgOutcome, ReorgParticipant, ReorgProcessor,
};
pub use status::{RefactoringStatus, Severity};
