use crate::source::SourceError;
use thiserror::Error;

/// Environment-level failures of the reorg engine
///
/// Expected precondition failures (invalid selection, invalid destination,
/// declined name queries) are never reported through this type; they are
/// `RefactoringStatus` entries. This enum covers what goes wrong underneath:
/// unreadable resources, a model that changed since a change was computed,
/// participant failures and I/O on the backing directory.
#[derive(Error, Debug)]
pub enum ReorgError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON serialization error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Source scan error: {0}")]
	Source(#[from] SourceError),

	#[error("Invalid path: {path}")]
	InvalidPath { path: String },

	#[error("Resource not found: {path}")]
	ResourceNotFound { path: String },

	#[error("Resource already exists: {path}")]
	ResourceExists { path: String },

	#[error("Element does not exist: {element}")]
	ElementNotFound { element: String },

	#[error("Model is stale: {path} changed since the change was computed (expected {expected:016x}, found {actual:016x})")]
	StaleModel { path: String, expected: u64, actual: u64 },

	#[error("Invalid operation: {operation} - {reason}")]
	InvalidOperation { operation: String, reason: String },

	#[error("Participant '{participant}' failed on {element}: {cause}")]
	Participant {
		participant: String,
		element: String,
		cause: String,
	},

	#[error("Operation cancelled")]
	Cancelled,

	#[error("Filesystem error: {operation} failed on {path} - {cause}")]
	FilesystemError {
		operation: String,
		path: String,
		cause: String,
	},

	#[error(
		"Configuration error: {parameter} - {reason} (expected: {expected}, actual: {actual})"
	)]
	ConfigurationError {
		parameter: String,
		reason: String,
		expected: String,
		actual: String,
	},
}

impl ReorgError {
	/// Check if recomputing the change and running it again may succeed
	pub fn is_retryable(&self) -> bool {
		match self {
			ReorgError::Io(io_err) => matches!(
				io_err.kind(),
				std::io::ErrorKind::TimedOut
					| std::io::ErrorKind::Interrupted
					| std::io::ErrorKind::WouldBlock
			),
			// A fresh change computed against the current model may apply cleanly
			ReorgError::StaleModel { .. } => true,
			ReorgError::Cancelled => true,
			ReorgError::FilesystemError { .. } => true,

			ReorgError::Json(_) => false,
			ReorgError::Source(_) => false,
			ReorgError::InvalidPath { .. } => false,
			ReorgError::ResourceNotFound { .. } => false,
			ReorgError::ResourceExists { .. } => false,
			ReorgError::ElementNotFound { .. } => false,
			ReorgError::InvalidOperation { .. } => false,
			ReorgError::Participant { .. } => false,
			ReorgError::ConfigurationError { .. } => false,
		}
	}

	/// Participant failures surface as ERROR; everything else is FATAL
	pub fn is_participant_failure(&self) -> bool {
		matches!(self, ReorgError::Participant { .. })
	}

	/// Get error category for logging
	pub fn category(&self) -> &'static str {
		match self {
			ReorgError::Io(_) => "io",
			ReorgError::Json(_) => "serialization",
			ReorgError::Source(_) => "source",
			ReorgError::InvalidPath { .. } => "path",
			ReorgError::ResourceNotFound { .. } => "resource",
			ReorgError::ResourceExists { .. } => "resource",
			ReorgError::ElementNotFound { .. } => "model",
			ReorgError::StaleModel { .. } => "stale_model",
			ReorgError::InvalidOperation { .. } => "operation",
			ReorgError::Participant { .. } => "participant",
			ReorgError::Cancelled => "cancelled",
			ReorgError::FilesystemError { .. } => "filesystem",
			ReorgError::ConfigurationError { .. } => "configuration",
		}
	}

	pub fn invalid_path(path: &str) -> Self {
		ReorgError::InvalidPath { path: path.to_string() }
	}

	pub fn resource_not_found(path: impl std::fmt::Display) -> Self {
		ReorgError::ResourceNotFound { path: path.to_string() }
	}

	pub fn resource_exists(path: impl std::fmt::Display) -> Self {
		ReorgError::ResourceExists { path: path.to_string() }
	}

	pub fn element_not_found(element: impl std::fmt::Display) -> Self {
		ReorgError::ElementNotFound { element: element.to_string() }
	}

	pub fn invalid_operation(operation: &str, reason: &str) -> Self {
		ReorgError::InvalidOperation {
			operation: operation.to_string(),
			reason: reason.to_string(),
		}
	}

	pub fn participant(participant: &str, element: impl std::fmt::Display, cause: &str) -> Self {
		ReorgError::Participant {
			participant: participant.to_string(),
			element: element.to_string(),
			cause: cause.to_string(),
		}
	}

	/// Create a filesystem error with path context
	pub fn filesystem_error(operation: &str, path: &str, cause: &str) -> Self {
		ReorgError::FilesystemError {
			operation: operation.to_string(),
			path: path.to_string(),
			cause: cause.to_string(),
		}
	}

	/// Create a configuration error
	pub fn configuration_error(
		parameter: &str, reason: &str, expected: &str, actual: &str,
	) -> Self {
		ReorgError::ConfigurationError {
			parameter: parameter.to_string(),
			reason: reason.to_string(),
			expected: expected.to_string(),
			actual: actual.to_string(),
		}
	}
}

pub type Result<T> = std::result::Result<T, ReorgError>;
