//! Status accumulator for precondition checks
//!
//! A `RefactoringStatus` is an ordered list of (severity, message) entries.
//! The highest severity decides whether an operation may proceed:
//!
//! - `Ok` proceeds silently
//! - `Info` and `Warning` proceed after the caller confirms
//! - `Error` blocks unless the caller forces the operation
//! - `Fatal` always blocks

use crate::error::ReorgError;
use crate::model::Element;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
	Ok = 0,
	Info = 1,
	Warning = 2,
	Error = 3,
	Fatal = 4,
}

impl Severity {
	/// Whether an operation with this severity may run
	pub fn allows_proceeding(self, force: bool) -> bool {
		match self {
			Severity::Ok | Severity::Info | Severity::Warning => true,
			Severity::Error => force,
			Severity::Fatal => false,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Severity::Ok => "OK",
			Severity::Info => "INFO",
			Severity::Warning => "WARNING",
			Severity::Error => "ERROR",
			Severity::Fatal => "FATAL",
		}
	}
}

impl fmt::Display for Severity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
	pub severity: Severity,
	pub message: String,
	/// Element the entry is about, when there is one
	pub element: Option<Element>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefactoringStatus {
	entries: Vec<StatusEntry>,
}

impl RefactoringStatus {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn fatal(message: impl Into<String>) -> Self {
		let mut status = Self::new();
		status.add_fatal(message);
		status
	}

	pub fn error(message: impl Into<String>) -> Self {
		let mut status = Self::new();
		status.add_error(message);
		status
	}

	pub fn warning(message: impl Into<String>) -> Self {
		let mut status = Self::new();
		status.add_warning(message);
		status
	}

	pub fn info(message: impl Into<String>) -> Self {
		let mut status = Self::new();
		status.add_info(message);
		status
	}

	/// Wrap an environment failure; participant failures become ERROR, the rest FATAL
	pub fn from_error(error: &ReorgError) -> Self {
		if error.is_participant_failure() {
			Self::error(error.to_string())
		} else {
			Self::fatal(error.to_string())
		}
	}

	pub fn add_entry(&mut self, severity: Severity, message: impl Into<String>, element: Option<Element>) {
		if severity == Severity::Ok {
			return;
		}
		self.entries.push(StatusEntry { severity, message: message.into(), element });
	}

	pub fn add_fatal(&mut self, message: impl Into<String>) {
		self.add_entry(Severity::Fatal, message, None);
	}

	pub fn add_error(&mut self, message: impl Into<String>) {
		self.add_entry(Severity::Error, message, None);
	}

	pub fn add_warning(&mut self, message: impl Into<String>) {
		self.add_entry(Severity::Warning, message, None);
	}

	pub fn add_info(&mut self, message: impl Into<String>) {
		self.add_entry(Severity::Info, message, None);
	}

	pub fn add_error_for(&mut self, message: impl Into<String>, element: &Element) {
		self.add_entry(Severity::Error, message, Some(element.clone()));
	}

	pub fn add_fatal_for(&mut self, message: impl Into<String>, element: &Element) {
		self.add_entry(Severity::Fatal, message, Some(element.clone()));
	}

	/// Append all entries of `other`, keeping their order
	pub fn merge(&mut self, other: RefactoringStatus) {
		self.entries.extend(other.entries);
	}

	pub fn severity(&self) -> Severity {
		self.entries.iter().map(|e| e.severity).max().unwrap_or(Severity::Ok)
	}

	pub fn is_ok(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn has_fatal_error(&self) -> bool {
		self.severity() == Severity::Fatal
	}

	pub fn has_error(&self) -> bool {
		self.severity() >= Severity::Error
	}

	pub fn has_warning(&self) -> bool {
		self.severity() >= Severity::Warning
	}

	pub fn can_proceed(&self, force: bool) -> bool {
		self.severity().allows_proceeding(force)
	}

	pub fn entries(&self) -> &[StatusEntry] {
		&self.entries
	}

	pub fn entries_with(&self, severity: Severity) -> impl Iterator<Item = &StatusEntry> {
		self.entries.iter().filter(move |e| e.severity == severity)
	}

	/// The first entry carrying the highest severity
	pub fn entry_with_highest_severity(&self) -> Option<&StatusEntry> {
		let severity = self.severity();
		self.entries.iter().find(|e| e.severity == severity)
	}

	/// Message of the most severe entry, if any
	pub fn message(&self) -> Option<&str> {
		self.entry_with_highest_severity().map(|e| e.message.as_str())
	}
}

impl fmt::Display for RefactoringStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.entries.is_empty() {
			return f.write_str("OK");
		}
		for (i, entry) in self.entries.iter().enumerate() {
			if i > 0 {
				writeln!(f)?;
			}
			write!(f, "{}: {}", entry.severity, entry.message)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_severity_ordering() {
		assert!(Severity::Ok < Severity::Info);
		assert!(Severity::Info < Severity::Warning);
		assert!(Severity::Warning < Severity::Error);
		assert!(Severity::Error < Severity::Fatal);
	}

	#[test]
	fn test_status_accumulates_highest_severity() {
		let mut status = RefactoringStatus::new();
		assert!(status.is_ok());
		assert_eq!(status.severity(), Severity::Ok);

		status.add_info("just so you know");
		status.add_error("reference not updated");
		status.add_warning("careful");

		assert_eq!(status.severity(), Severity::Error);
		assert_eq!(status.message(), Some("reference not updated"));
		assert_eq!(status.entries().len(), 3);
		assert!(!status.has_fatal_error());
		assert!(status.has_error());
	}

	#[test]
	fn test_proceed_contract() {
		assert!(RefactoringStatus::new().can_proceed(false));
		assert!(RefactoringStatus::warning("w").can_proceed(false));
		assert!(!RefactoringStatus::error("e").can_proceed(false));
		assert!(RefactoringStatus::error("e").can_proceed(true));
		assert!(!RefactoringStatus::fatal("f").can_proceed(true));
	}

	#[test]
	fn test_merge_keeps_order() {
		let mut first = RefactoringStatus::info("one");
		first.merge(RefactoringStatus::fatal("two"));
		let messages: Vec<_> = first.entries().iter().map(|e| e.message.as_str()).collect();
		assert_eq!(messages, vec!["one", "two"]);
		assert!(first.has_fatal_error());
	}

	#[test]
	fn test_from_error_tiers() {
		let participant = ReorgError::participant("p", "/P", "failed");
		assert_eq!(RefactoringStatus::from_error(&participant).severity(), Severity::Error);
		assert_eq!(
			RefactoringStatus::from_error(&ReorgError::Cancelled).severity(),
			Severity::Fatal
		);
	}
}
