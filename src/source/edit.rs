use super::SourceError;
use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use std::ops::Range;
use twox_hash::XxHash64;

/// Replace `length` bytes at `offset` with `text`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
	pub offset: usize,
	pub length: usize,
	pub text: String,
}

impl TextEdit {
	pub fn insert(offset: usize, text: impl Into<String>) -> Self {
		Self { offset, length: 0, text: text.into() }
	}

	pub fn delete(range: Range<usize>) -> Self {
		Self { offset: range.start, length: range.end - range.start, text: String::new() }
	}

	pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
		Self { offset: range.start, length: range.end - range.start, text: text.into() }
	}

	pub fn end(&self) -> usize {
		self.offset + self.length
	}
}

/// Apply non-overlapping edits given in original-text offsets
///
/// Returns the new text and the edits that restore the original, expressed in
/// new-text offsets. Inserts at the same offset keep their relative order.
pub fn apply_edits(content: &str, edits: &[TextEdit]) -> Result<(String, Vec<TextEdit>), SourceError> {
	let mut sorted: Vec<&TextEdit> = edits.iter().collect();
	sorted.sort_by_key(|e| (e.offset, e.length));

	let mut previous_end = 0;
	for edit in &sorted {
		if edit.end() > content.len() {
			return Err(SourceError::EditOutOfBounds {
				offset: edit.offset,
				end: edit.end(),
				len: content.len(),
			});
		}
		if !content.is_char_boundary(edit.offset) || !content.is_char_boundary(edit.end()) {
			return Err(SourceError::EditOutOfBounds {
				offset: edit.offset,
				end: edit.end(),
				len: content.len(),
			});
		}
		if edit.offset < previous_end {
			return Err(SourceError::OverlappingEdits { offset: edit.offset });
		}
		previous_end = edit.end();
	}

	let mut result = String::with_capacity(content.len());
	let mut undo = Vec::with_capacity(sorted.len());
	let mut cursor = 0;
	for edit in sorted {
		result.push_str(&content[cursor..edit.offset]);
		let new_offset = result.len();
		result.push_str(&edit.text);
		undo.push(TextEdit {
			offset: new_offset,
			length: edit.text.len(),
			text: content[edit.offset..edit.end()].to_string(),
		});
		cursor = edit.end();
	}
	result.push_str(&content[cursor..]);

	Ok((result, undo))
}

/// Content fingerprint used to detect edits computed against stale text
pub fn fingerprint(content: &str) -> u64 {
	let mut hasher = XxHash64::with_seed(0);
	hasher.write(content.as_bytes());
	hasher.finish()
}

/// Swap the leading `from` indentation of every line for `to`
pub fn reindent(text: &str, from: &str, to: &str) -> String {
	if from == to {
		return text.to_string();
	}
	let mut out = String::with_capacity(text.len());
	for line in text.split_inclusive('\n') {
		if let Some(rest) = line.strip_prefix(from) {
			out.push_str(to);
			out.push_str(rest);
		} else if line.trim().is_empty() {
			out.push_str(line);
		} else {
			// Under-indented line: keep what it has, relative to the new base
			out.push_str(to);
			out.push_str(line.trim_start_matches([' ', '\t']));
		}
	}
	out
}

/// Offset of the start of the line containing `offset`
pub fn line_start(text: &str, offset: usize) -> usize {
	text[..offset].rfind('\n').map(|p| p + 1).unwrap_or(0)
}
