//! Element handles
//!
//! Handles identify an element; they do not guarantee it exists. Existence,
//! parents and children are answered by the [`Workspace`](super::Workspace).

use super::path::ResourcePath;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElementKind {
	Project,
	Folder,
	File,
	SourceRoot,
	Package,
	SourceUnit,
	Type,
	Method,
	Field,
	Initializer,
	ImportContainer,
	ImportDeclaration,
	PackageDeclaration,
}

impl ElementKind {
	pub fn is_resource(self) -> bool {
		matches!(self, ElementKind::Project | ElementKind::Folder | ElementKind::File)
	}

	/// Lives inside a source unit's text and has no resource of its own
	pub fn is_structural(self) -> bool {
		matches!(
			self,
			ElementKind::Type
				| ElementKind::Method
				| ElementKind::Field
				| ElementKind::Initializer
				| ElementKind::ImportContainer
				| ElementKind::ImportDeclaration
				| ElementKind::PackageDeclaration
		)
	}

	pub fn label(self) -> &'static str {
		match self {
			ElementKind::Project => "project",
			ElementKind::Folder => "folder",
			ElementKind::File => "file",
			ElementKind::SourceRoot => "source root",
			ElementKind::Package => "package",
			ElementKind::SourceUnit => "source unit",
			ElementKind::Type => "type",
			ElementKind::Method => "method",
			ElementKind::Field => "field",
			ElementKind::Initializer => "initializer",
			ElementKind::ImportContainer => "import container",
			ElementKind::ImportDeclaration => "import declaration",
			ElementKind::PackageDeclaration => "package declaration",
		}
	}
}

impl fmt::Display for ElementKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// A package inside a source root; the empty name is the default package
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageRef {
	pub root: ResourcePath,
	pub name: String,
}

impl PackageRef {
	pub fn new(root: ResourcePath, name: &str) -> Self {
		Self { root, name: name.to_string() }
	}

	pub fn default_package(root: ResourcePath) -> Self {
		Self { root, name: String::new() }
	}

	pub fn is_default(&self) -> bool {
		self.name.is_empty()
	}

	pub fn segments(&self) -> impl Iterator<Item = &str> {
		self.name.split('.').filter(|s| !s.is_empty())
	}

	/// Backing folder: the root folder for the default package
	pub fn folder(&self) -> ResourcePath {
		self.root.join_all(self.segments())
	}

	pub fn simple_name(&self) -> &str {
		self.name.rsplit('.').next().unwrap_or("")
	}

	/// Enclosing package name; `None` for top-level and default packages
	pub fn parent_name(&self) -> Option<&str> {
		self.name.rfind('.').map(|dot| &self.name[..dot])
	}

	/// Fully qualified name of a type declared in this package
	pub fn qualify(&self, simple_name: &str) -> String {
		if self.is_default() {
			simple_name.to_string()
		} else {
			format!("{}.{}", self.name, simple_name)
		}
	}

	/// Strict sub-package in the same root
	pub fn is_sub_package_of(&self, other: &PackageRef) -> bool {
		self.root == other.root
			&& !other.is_default()
			&& self.name.len() > other.name.len()
			&& self.name.starts_with(&other.name)
			&& self.name.as_bytes()[other.name.len()] == b'.'
	}

	pub fn display_name(&self) -> &str {
		if self.is_default() {
			"(default package)"
		} else {
			&self.name
		}
	}
}

/// A source unit, named by its file name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitRef {
	pub package: PackageRef,
	pub name: String,
}

impl UnitRef {
	pub fn new(package: PackageRef, name: &str) -> Self {
		Self { package, name: name.to_string() }
	}

	pub fn file(&self) -> ResourcePath {
		self.package.folder().join(&self.name)
	}

	/// File name without its extension; the expected primary type name
	pub fn type_name(&self) -> &str {
		match self.name.rfind('.') {
			Some(dot) if dot > 0 => &self.name[..dot],
			_ => &self.name,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MemberKind {
	Type,
	Method,
	Field,
	Initializer,
}

impl MemberKind {
	pub fn element_kind(self) -> ElementKind {
		match self {
			MemberKind::Type => ElementKind::Type,
			MemberKind::Method => ElementKind::Method,
			MemberKind::Field => ElementKind::Field,
			MemberKind::Initializer => ElementKind::Initializer,
		}
	}
}

/// One step of a member path; `occurrence` tells apart overloads and initializers
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberSegment {
	pub kind: MemberKind,
	pub name: String,
	pub occurrence: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberRef {
	pub unit: UnitRef,
	pub path: Vec<MemberSegment>,
}

impl MemberRef {
	pub fn top_level_type(unit: UnitRef, name: &str) -> Self {
		Self {
			unit,
			path: vec![MemberSegment { kind: MemberKind::Type, name: name.to_string(), occurrence: 0 }],
		}
	}

	pub fn child(&self, kind: MemberKind, name: &str, occurrence: usize) -> Self {
		let mut path = self.path.clone();
		path.push(MemberSegment { kind, name: name.to_string(), occurrence });
		Self { unit: self.unit.clone(), path }
	}

	pub fn kind(&self) -> MemberKind {
		self.path.last().map(|s| s.kind).unwrap_or(MemberKind::Type)
	}

	pub fn name(&self) -> &str {
		self.path.last().map(|s| s.name.as_str()).unwrap_or("")
	}

	pub fn is_top_level(&self) -> bool {
		self.path.len() == 1
	}

	/// Declaring type; `None` for top-level types
	pub fn declaring_type(&self) -> Option<MemberRef> {
		if self.path.len() <= 1 {
			return None;
		}
		Some(Self { unit: self.unit.clone(), path: self.path[..self.path.len() - 1].to_vec() })
	}

	/// True if `self` is `other` or nested inside it
	pub fn is_within(&self, other: &MemberRef) -> bool {
		self.unit == other.unit
			&& self.path.len() >= other.path.len()
			&& self.path[..other.path.len()] == other.path[..]
	}

	/// Dotted display path such as `A.Inner.run`
	pub fn dotted(&self) -> String {
		self.path
			.iter()
			.map(|s| if s.kind == MemberKind::Initializer { "{...}" } else { s.name.as_str() })
			.collect::<Vec<_>>()
			.join(".")
	}
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImportRef {
	pub unit: UnitRef,
	/// Imported name as written, `.*` included for on-demand imports
	pub name: String,
	pub is_static: bool,
}

/// Any element the engine can select or target
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "handle", rename_all = "snake_case")]
pub enum Element {
	Project(String),
	Folder(ResourcePath),
	File(ResourcePath),
	SourceRoot(ResourcePath),
	Package(PackageRef),
	SourceUnit(UnitRef),
	Type(MemberRef),
	Method(MemberRef),
	Field(MemberRef),
	Initializer(MemberRef),
	ImportContainer(UnitRef),
	ImportDeclaration(ImportRef),
	PackageDeclaration(UnitRef),
}

impl Element {
	/// Wrap a member handle in the variant matching its kind
	pub fn member(member: MemberRef) -> Self {
		match member.kind() {
			MemberKind::Type => Element::Type(member),
			MemberKind::Method => Element::Method(member),
			MemberKind::Field => Element::Field(member),
			MemberKind::Initializer => Element::Initializer(member),
		}
	}

	pub fn kind(&self) -> ElementKind {
		match self {
			Element::Project(_) => ElementKind::Project,
			Element::Folder(_) => ElementKind::Folder,
			Element::File(_) => ElementKind::File,
			Element::SourceRoot(_) => ElementKind::SourceRoot,
			Element::Package(_) => ElementKind::Package,
			Element::SourceUnit(_) => ElementKind::SourceUnit,
			Element::Type(_) => ElementKind::Type,
			Element::Method(_) => ElementKind::Method,
			Element::Field(_) => ElementKind::Field,
			Element::Initializer(_) => ElementKind::Initializer,
			Element::ImportContainer(_) => ElementKind::ImportContainer,
			Element::ImportDeclaration(_) => ElementKind::ImportDeclaration,
			Element::PackageDeclaration(_) => ElementKind::PackageDeclaration,
		}
	}

	/// Simple name used for collision checks and display
	pub fn name(&self) -> String {
		match self {
			Element::Project(name) => name.clone(),
			Element::Folder(path) | Element::File(path) | Element::SourceRoot(path) => {
				path.name().unwrap_or_default().to_string()
			}
			Element::Package(package) => package.name.clone(),
			Element::SourceUnit(unit) => unit.name.clone(),
			Element::Type(m) | Element::Method(m) | Element::Field(m) | Element::Initializer(m) => {
				m.name().to_string()
			}
			Element::ImportContainer(_) => "imports".to_string(),
			Element::ImportDeclaration(import) => import.name.clone(),
			Element::PackageDeclaration(unit) => unit.package.name.clone(),
		}
	}

	pub fn as_member(&self) -> Option<&MemberRef> {
		match self {
			Element::Type(m) | Element::Method(m) | Element::Field(m) | Element::Initializer(m) => {
				Some(m)
			}
			_ => None,
		}
	}

	/// Unit whose text holds this element, for structural elements and units
	pub fn source_unit(&self) -> Option<&UnitRef> {
		match self {
			Element::SourceUnit(unit)
			| Element::ImportContainer(unit)
			| Element::PackageDeclaration(unit) => Some(unit),
			Element::Type(m) | Element::Method(m) | Element::Field(m) | Element::Initializer(m) => {
				Some(&m.unit)
			}
			Element::ImportDeclaration(import) => Some(&import.unit),
			_ => None,
		}
	}
}

impl fmt::Display for Element {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Element::Project(name) => write!(f, "/{name}"),
			Element::Folder(path) | Element::File(path) | Element::SourceRoot(path) => {
				write!(f, "{path}")
			}
			Element::Package(package) => write!(f, "{}[{}]", package.root, package.display_name()),
			Element::SourceUnit(unit) => write!(f, "{}", unit.file()),
			Element::Type(m) | Element::Method(m) | Element::Field(m) | Element::Initializer(m) => {
				write!(f, "{}#{}", m.unit.file(), m.dotted())
			}
			Element::ImportContainer(unit) => write!(f, "{}#imports", unit.file()),
			Element::ImportDeclaration(import) => {
				write!(f, "{}#import:{}", import.unit.file(), import.name)
			}
			Element::PackageDeclaration(unit) => write!(f, "{}#package", unit.file()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn root() -> ResourcePath {
		ResourcePath::parse("/P/src").unwrap()
	}

	#[test]
	fn test_package_folder_and_names() {
		let package = PackageRef::new(root(), "a.b.c");
		assert_eq!(package.folder().to_string(), "/P/src/a/b/c");
		assert_eq!(package.simple_name(), "c");
		assert_eq!(package.parent_name(), Some("a.b"));
		assert_eq!(package.qualify("A"), "a.b.c.A");

		let default = PackageRef::default_package(root());
		assert!(default.is_default());
		assert_eq!(default.folder(), root());
		assert_eq!(default.qualify("A"), "A");
		assert_eq!(default.parent_name(), None);
	}

	#[test]
	fn test_sub_package_relation() {
		let a = PackageRef::new(root(), "a");
		let ab = PackageRef::new(root(), "a.b");
		let abc = PackageRef::new(root(), "abc");
		assert!(ab.is_sub_package_of(&a));
		assert!(!abc.is_sub_package_of(&a));
		assert!(!a.is_sub_package_of(&a));
		assert!(!a.is_sub_package_of(&PackageRef::default_package(root())));
	}

	#[test]
	fn test_member_nesting() {
		let unit = UnitRef::new(PackageRef::new(root(), "p"), "A.java");
		assert_eq!(unit.type_name(), "A");
		let outer = MemberRef::top_level_type(unit.clone(), "A");
		let inner = outer.child(MemberKind::Type, "Inner", 0);
		let method = inner.child(MemberKind::Method, "run", 0);

		assert!(method.is_within(&outer));
		assert!(!outer.is_within(&method));
		assert_eq!(method.declaring_type(), Some(inner.clone()));
		assert_eq!(method.dotted(), "A.Inner.run");
		assert_eq!(Element::member(method).kind(), ElementKind::Method);
	}

	#[test]
	fn test_element_display() {
		let unit = UnitRef::new(PackageRef::new(root(), "p"), "A.java");
		assert_eq!(Element::SourceUnit(unit.clone()).to_string(), "/P/src/p/A.java");
		assert_eq!(Element::ImportContainer(unit).to_string(), "/P/src/p/A.java#imports");
		assert!(ElementKind::Method.is_structural());
		assert!(ElementKind::Folder.is_resource());
	}
}
