//! Structural view of source unit text
//!
//! The reorg engine does not need a grammar. It needs to know where the
//! package declaration, the imports and the member declarations of a unit
//! start and end, so it can move them around as text while preserving
//! formatting.
//!
//! # Module Organization
//!
//! - [`scanner`] - Tokenizer that skips comments and literals
//! - [`parser`] - Declaration structure with source ranges
//! - [`edit`] - Text edits with undo, fingerprints and re-indentation

pub mod edit;
pub mod parser;
pub mod scanner;

pub use edit::{apply_edits, fingerprint, reindent, TextEdit};
pub use parser::{parse, removal_range, Declaration, ImportDecl, PackageDecl, SourceStructure};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
	#[error("Unterminated comment starting at offset {offset}")]
	UnterminatedComment { offset: usize },

	#[error("Unterminated literal starting at offset {offset}")]
	UnterminatedLiteral { offset: usize },

	#[error("Unbalanced '{delimiter}' at offset {offset}")]
	Unbalanced { delimiter: char, offset: usize },

	#[error("'{keyword}' at offset {offset} is not followed by a name")]
	MissingName { keyword: String, offset: usize },

	#[error("Overlapping edits at offset {offset}")]
	OverlappingEdits { offset: usize },

	#[error("Edit range {offset}..{end} is outside the text (length {len})")]
	EditOutOfBounds { offset: usize, end: usize, len: usize },
}
