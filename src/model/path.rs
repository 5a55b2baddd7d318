//! Normalized workspace paths
//!
//! A `ResourcePath` is an absolute, `/`-separated path inside the workspace.
//! The first segment names the project. The empty path is the workspace root.

use crate::error::ReorgError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourcePath {
	segments: Vec<String>,
}

impl ResourcePath {
	/// The workspace root
	pub fn root() -> Self {
		Self::default()
	}

	pub fn project(name: &str) -> Self {
		Self { segments: vec![name.to_string()] }
	}

	/// Parse `/Project/dir/file`; empty segments are ignored, `.` and `..` are rejected
	pub fn parse(path: &str) -> Result<Self, ReorgError> {
		let mut segments = Vec::new();
		for segment in path.split('/') {
			match segment {
				"" => continue,
				"." | ".." => return Err(ReorgError::invalid_path(path)),
				s if s.contains('\\') => return Err(ReorgError::invalid_path(path)),
				s => segments.push(s.to_string()),
			}
		}
		Ok(Self { segments })
	}

	pub fn segments(&self) -> &[String] {
		&self.segments
	}

	pub fn len(&self) -> usize {
		self.segments.len()
	}

	pub fn is_root(&self) -> bool {
		self.segments.is_empty()
	}

	pub fn is_project(&self) -> bool {
		self.segments.len() == 1
	}

	pub fn name(&self) -> Option<&str> {
		self.segments.last().map(String::as_str)
	}

	pub fn project_name(&self) -> Option<&str> {
		self.segments.first().map(String::as_str)
	}

	/// Extension of the last segment, including the dot
	pub fn extension(&self) -> Option<&str> {
		let name = self.name()?;
		let dot = name.rfind('.')?;
		if dot == 0 {
			return None;
		}
		Some(&name[dot..])
	}

	pub fn parent(&self) -> Option<ResourcePath> {
		if self.segments.is_empty() {
			return None;
		}
		Some(Self { segments: self.segments[..self.segments.len() - 1].to_vec() })
	}

	pub fn join(&self, name: &str) -> ResourcePath {
		let mut segments = self.segments.clone();
		segments.push(name.to_string());
		Self { segments }
	}

	/// Join a relative `a/b/c` path; empty input returns `self`
	pub fn join_relative(&self, relative: &str) -> ResourcePath {
		let mut segments = self.segments.clone();
		segments.extend(relative.split('/').filter(|s| !s.is_empty()).map(str::to_string));
		Self { segments }
	}

	pub fn join_all<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> ResourcePath {
		let mut segments = self.segments.clone();
		segments.extend(names.into_iter().map(str::to_string));
		Self { segments }
	}

	pub fn with_name(&self, name: &str) -> ResourcePath {
		match self.parent() {
			Some(parent) => parent.join(name),
			None => self.clone(),
		}
	}

	/// True if `self` is `other` or lies below it
	pub fn starts_with(&self, other: &ResourcePath) -> bool {
		self.segments.len() >= other.segments.len()
			&& self.segments[..other.segments.len()] == other.segments[..]
	}

	/// True if `self` lies strictly below `other`
	pub fn is_descendant_of(&self, other: &ResourcePath) -> bool {
		self.segments.len() > other.segments.len() && self.starts_with(other)
	}

	pub fn strip_prefix(&self, base: &ResourcePath) -> Option<&[String]> {
		if self.starts_with(base) {
			Some(&self.segments[base.segments.len()..])
		} else {
			None
		}
	}

	/// Relative `a/b` form below `base`
	pub fn relative_to(&self, base: &ResourcePath) -> Option<String> {
		self.strip_prefix(base).map(|rest| rest.join("/"))
	}

	/// Re-anchor a path that lies below `from` so it lies below `to`
	pub fn rebase(&self, from: &ResourcePath, to: &ResourcePath) -> Option<ResourcePath> {
		let rest = self.strip_prefix(from)?;
		let mut segments = to.segments.clone();
		segments.extend(rest.iter().cloned());
		Some(Self { segments })
	}

	/// Map onto a directory on disk
	pub fn to_fs_path(&self, base: &Path) -> PathBuf {
		let mut path = base.to_path_buf();
		for segment in &self.segments {
			path.push(segment);
		}
		path
	}
}

impl fmt::Display for ResourcePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.segments.is_empty() {
			return f.write_str("/");
		}
		for segment in &self.segments {
			write!(f, "/{segment}")?;
		}
		Ok(())
	}
}

impl TryFrom<String> for ResourcePath {
	type Error = ReorgError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		ResourcePath::parse(&value)
	}
}

impl From<ResourcePath> for String {
	fn from(path: ResourcePath) -> Self {
		path.to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_and_display() {
		let path = ResourcePath::parse("/P/src//p/A.java").unwrap();
		assert_eq!(path.len(), 4);
		assert_eq!(path.to_string(), "/P/src/p/A.java");
		assert_eq!(path.name(), Some("A.java"));
		assert_eq!(path.extension(), Some(".java"));
		assert_eq!(path.project_name(), Some("P"));
		assert_eq!(ResourcePath::root().to_string(), "/");
		assert!(ResourcePath::parse("/P/../etc").is_err());
	}

	#[test]
	fn test_prefix_relations() {
		let folder = ResourcePath::parse("/P/src/a").unwrap();
		let nested = ResourcePath::parse("/P/src/a/b/C.java").unwrap();
		let sibling = ResourcePath::parse("/P/src/ab").unwrap();

		assert!(nested.starts_with(&folder));
		assert!(nested.is_descendant_of(&folder));
		assert!(folder.starts_with(&folder));
		assert!(!folder.is_descendant_of(&folder));
		assert!(!sibling.starts_with(&folder));
		assert_eq!(nested.relative_to(&folder).as_deref(), Some("b/C.java"));
	}

	#[test]
	fn test_rebase() {
		let from = ResourcePath::parse("/P/src/a").unwrap();
		let to = ResourcePath::parse("/Q/lib/x").unwrap();
		let file = ResourcePath::parse("/P/src/a/b.txt").unwrap();
		assert_eq!(file.rebase(&from, &to).unwrap().to_string(), "/Q/lib/x/b.txt");
		assert!(to.rebase(&from, &to).is_none());
	}

	#[test]
	fn test_dotfile_has_no_extension() {
		let path = ResourcePath::parse("/P/.project").unwrap();
		assert_eq!(path.extension(), None);
	}
}
